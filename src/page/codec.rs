//! Page trailer codec
//!
//! One serialization routine for the whole trailer: [`PageMeta`] is encoded
//! with fixed-width little-endian integers, in declaration order, into the
//! last [`TRAILER_SIZE`] bytes of the page buffer.

use bincode::Options;
use tracing::warn;

use crate::crc::BASE_SEED;
use crate::device::PageDevice;
use crate::error::{CallbackOp, ErrorKind, Layer, Result, StorError};

use super::{
    trailer_start, PageMeta, CRC_OFFSET, CRC_SIZE, PAGE_MAGIC, SUBTYPE_OFFSET, TRAILER_SIZE,
};

/// Fixed-width, little-endian, exact-length encoding
fn trailer_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(TRAILER_SIZE as u64)
}

fn check_len(buffer: &[u8]) -> Result<()> {
    if buffer.len() <= TRAILER_SIZE {
        return Err(StorError::new(
            Layer::Low,
            ErrorKind::BadParam(format!(
                "page buffer of {} bytes cannot hold the {}-byte trailer",
                buffer.len(),
                TRAILER_SIZE
            )),
        ));
    }
    Ok(())
}

/// Encode `meta` into the trailer of `buffer` and seal it with a CRC.
///
/// The magic number is always stamped; `meta.magic` and `meta.crc` are
/// ignored. Returns the meta exactly as written.
pub fn encode_meta<D: PageDevice + ?Sized>(
    buffer: &mut [u8],
    meta: &PageMeta,
    device: &mut D,
) -> Result<PageMeta> {
    check_len(buffer)?;

    let mut sealed = PageMeta {
        magic: PAGE_MAGIC,
        crc: 0,
        ..*meta
    };

    let start = trailer_start(buffer.len());
    trailer_options()
        .serialize_into(&mut buffer[start..], &sealed)
        .map_err(|e| StorError::new(Layer::Low, ErrorKind::Codec(e.to_string())))?;

    sealed.crc = refresh_crc(buffer, device)?;
    Ok(sealed)
}

/// Unpack the trailer of `buffer`. No validation is performed.
pub fn decode_meta(buffer: &[u8]) -> Result<PageMeta> {
    check_len(buffer)?;
    let start = trailer_start(buffer.len());
    trailer_options()
        .deserialize(&buffer[start..])
        .map_err(|e| StorError::new(Layer::Low, ErrorKind::Codec(e.to_string())))
}

/// Rewrite only the trailing CRC field
pub fn patch_crc(buffer: &mut [u8], crc: u32) {
    let at = trailer_start(buffer.len()) + CRC_OFFSET;
    buffer[at..at + CRC_SIZE].copy_from_slice(&crc.to_le_bytes());
}

/// Rewrite only the subtype byte. The CRC is stale afterwards.
pub fn patch_subtype(buffer: &mut [u8], subtype: u8) {
    let at = trailer_start(buffer.len()) + SUBTYPE_OFFSET;
    buffer[at] = subtype;
}

/// CRC of everything in front of the CRC field, via the device callback
pub fn page_crc<D: PageDevice + ?Sized>(buffer: &[u8], device: &mut D) -> Result<u32> {
    let covered = &buffer[..buffer.len() - CRC_SIZE];
    device.crc32(BASE_SEED, covered).map_err(|fault| {
        warn!(%fault, "crc32 callback failed while sealing page");
        StorError::new(
            Layer::Low,
            ErrorKind::Callback { op: CallbackOp::Crc, page: None },
        )
    })
}

/// Recompute the CRC and patch it in place
pub fn refresh_crc<D: PageDevice + ?Sized>(buffer: &mut [u8], device: &mut D) -> Result<u32> {
    let crc = page_crc(buffer, device)?;
    patch_crc(buffer, crc);
    Ok(crc)
}
