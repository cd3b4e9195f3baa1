//! Twin-page verify and repair

use tracing::{debug, info, warn};

use crate::device::PageDevice;
use crate::error::{ErrorKind, Layer, Result, StorError};
use crate::io::write_verify_page;
use crate::page::{
    is_valid_page_at, patch_crc, patch_subtype, refresh_crc, stored_crc, trailer_start,
    BufferId, ScratchPair, CRC_OFFSET, SUBTYPE_OFFSET,
};

/// Page indices and expected subtypes of one redundancy pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwinPair {
    pub origin: u32,
    pub backup: u32,
    pub origin_subtype: u8,
    pub backup_subtype: u8,
}

impl TwinPair {
    pub fn new(origin: u32, backup: u32, origin_subtype: u8, backup_subtype: u8) -> Self {
        Self {
            origin,
            backup,
            origin_subtype,
            backup_subtype,
        }
    }

    fn check(&self, total_pages: u32) -> Result<()> {
        if self.origin >= total_pages || self.backup >= total_pages {
            return Err(StorError::new(
                Layer::High,
                ErrorKind::BadParam(format!(
                    "twin pair ({}, {}) outside 0..{}",
                    self.origin, self.backup, total_pages
                )),
            ));
        }
        if self.origin == self.backup {
            return Err(StorError::new(
                Layer::High,
                ErrorKind::BadParam(format!("origin and backup are both page {}", self.origin)),
            ));
        }
        Ok(())
    }
}

/// Which page was rewritten by a recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    BackupFromOrigin,
    OriginFromBackup,
}

/// Outcome of [`verify_and_repair`]. Every variant is a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwinStatus {
    /// Both pages valid and identical, nothing written
    Ok,
    /// One page was rewritten from the other
    OkRecovered(Repair),
    /// Neither page is valid; the pair must be reformatted
    NotValid,
}

impl TwinStatus {
    /// True for `Ok` and `OkRecovered`
    pub fn is_usable(&self) -> bool {
        !matches!(self, TwinStatus::NotValid)
    }
}

/// Verify an origin/backup pair and repair whichever side is stale.
///
/// Uses scratch buffer A for origin and B for backup. On `Ok` and
/// `OkRecovered`, buffer A holds the origin page as it now exists on media.
pub fn verify_and_repair<D: PageDevice + ?Sized>(
    device: &mut D,
    scratch: &mut ScratchPair<'_>,
    pair: &TwinPair,
    total_pages: u32,
    retries: u32,
) -> Result<TwinStatus> {
    pair.check(total_pages)?;

    let (a, b) = scratch.with_sibling(BufferId::A);
    let origin_ok = slot_is_valid(device, a, pair.origin, pair.origin_subtype, retries)?;
    let backup_ok = slot_is_valid(device, b, pair.backup, pair.backup_subtype, retries)?;

    debug!(
        origin = pair.origin,
        backup = pair.backup,
        origin_ok,
        backup_ok,
        "twin pair checked"
    );

    let status = match (origin_ok, backup_ok) {
        (true, true) if same_content(a, b) => TwinStatus::Ok,
        (true, _) => {
            copy_into_slot(
                device,
                a,
                b,
                pair.backup,
                pair.origin_subtype,
                pair.backup_subtype,
                retries,
            )?;
            TwinStatus::OkRecovered(Repair::BackupFromOrigin)
        }
        (false, true) => {
            copy_into_slot(
                device,
                b,
                a,
                pair.origin,
                pair.backup_subtype,
                pair.origin_subtype,
                retries,
            )?;
            TwinStatus::OkRecovered(Repair::OriginFromBackup)
        }
        (false, false) => {
            warn!(origin = pair.origin, backup = pair.backup, "both twin pages invalid");
            TwinStatus::NotValid
        }
    };

    if let TwinStatus::OkRecovered(repair) = status {
        info!(origin = pair.origin, backup = pair.backup, ?repair, "twin pair recovered");
    }
    Ok(status)
}

/// Read `page` and check it is valid for a slot expecting `subtype`
fn slot_is_valid<D: PageDevice + ?Sized>(
    device: &mut D,
    buffer: &mut [u8],
    page: u32,
    subtype: u8,
    retries: u32,
) -> Result<bool> {
    if !is_valid_page_at(device, page, buffer, retries)? {
        return Ok(false);
    }

    let found = buffer[trailer_start(buffer.len()) + SUBTYPE_OFFSET];
    if found != subtype {
        warn!(page, expected = subtype, found, "valid page carries a foreign subtype");
        return Ok(false);
    }
    Ok(true)
}

/// Equal outside the subtype byte and the CRC field
fn same_content(a: &[u8], b: &[u8]) -> bool {
    let subtype_at = trailer_start(a.len()) + SUBTYPE_OFFSET;
    let crc_at = trailer_start(a.len()) + CRC_OFFSET;
    a.len() == b.len()
        && a[..subtype_at] == b[..subtype_at]
        && a[subtype_at + 1..crc_at] == b[subtype_at + 1..crc_at]
}

/// Write `src` into `page` re-labelled with `dst_subtype`, then put `src` back.
///
/// `readback` receives the verified copy of what is now on `page`.
fn copy_into_slot<D: PageDevice + ?Sized>(
    device: &mut D,
    src: &mut [u8],
    readback: &mut [u8],
    page: u32,
    src_subtype: u8,
    dst_subtype: u8,
    retries: u32,
) -> Result<()> {
    if src_subtype == dst_subtype {
        return write_verify_page(device, src, readback, page, retries);
    }

    let src_crc = stored_crc(src);
    patch_subtype(src, dst_subtype);
    let written = refresh_crc(src, device)
        .and_then(|_| write_verify_page(device, src, readback, page, retries));

    patch_subtype(src, src_subtype);
    patch_crc(src, src_crc);
    written
}
