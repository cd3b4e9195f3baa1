//! Medium level: CRC-in-buffer and per-page versioning
//!
//! Every page flushed through this level carries the configured page type
//! and version. Loading does not reject other types or versions; callers ask
//! [`MediumLevel::version_status`] and decide whether to migrate.

use tracing::debug;

use crate::config::StorageSettings;
use crate::crc::CrcDigest;
use crate::device::PageDevice;
use crate::error::{ErrorKind, Layer, Result, StorError};
use crate::page::{BufferId, PageMeta};

use super::context::{CtxState, SettingsRules};
use super::low::LowLevel;

/// How a loaded page's identity compares with the configured one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStatus {
    Current,
    /// Written by an older format version
    Older(u16),
    /// Written by a newer format version
    Newer(u16),
    /// Page type tag differs from the configured one
    ForeignType(u8),
}

pub struct MediumLevel<'buf, D> {
    low: LowLevel<'buf, D>,
}

impl<'buf, D: PageDevice> Default for MediumLevel<'buf, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'buf, D: PageDevice> MediumLevel<'buf, D> {
    pub fn new() -> Self {
        Self { low: LowLevel::new() }
    }

    pub fn init_ctx(
        &mut self,
        device: D,
        settings: StorageSettings,
        scratch: &'buf mut [u8],
    ) -> Result<()> {
        self.init_with_rules(device, settings, scratch, StorageSettings::validate)
    }

    pub(crate) fn init_with_rules(
        &mut self,
        device: D,
        settings: StorageSettings,
        scratch: &'buf mut [u8],
        rules: SettingsRules,
    ) -> Result<()> {
        self.low
            .init_with_rules(device, settings, scratch, rules)
            .map_err(StorError::surface(Layer::Medium))
    }

    pub fn is_init(&self) -> bool {
        self.low.is_init()
    }

    pub fn state(&self) -> CtxState {
        self.low.state()
    }

    pub fn settings(&self) -> Result<StorageSettings> {
        self.low.settings().map_err(StorError::surface(Layer::Medium))
    }

    pub fn device_mut(&mut self) -> Option<&mut D> {
        self.low.device_mut()
    }

    pub fn release(self) -> Option<(D, &'buf mut [u8], &'buf mut [u8])> {
        self.low.release()
    }

    /// The low level this level is built on
    pub fn low_mut(&mut self) -> &mut LowLevel<'buf, D> {
        &mut self.low
    }

    pub fn buffer(&mut self, which: BufferId) -> Result<&[u8]> {
        self.low.buffer(which).map_err(StorError::surface(Layer::Medium))
    }

    pub fn buffer_mut(&mut self, which: BufferId) -> Result<&mut [u8]> {
        self.low.buffer_mut(which).map_err(StorError::surface(Layer::Medium))
    }

    pub fn erase_page(&mut self, page: u32) -> Result<()> {
        self.low.erase_page(page).map_err(StorError::surface(Layer::Medium))
    }

    // =========================================================================
    // CRC In Buffer
    // =========================================================================

    /// CRC of the first `length` bytes of `which`, starting from `seed`
    pub fn calc_crc_in_buff(&mut self, which: BufferId, seed: u32, length: usize) -> Result<u32> {
        let parts = self
            .low
            .context_mut()
            .parts()
            .map_err(StorError::surface(Layer::Medium))?;

        let buffer = parts.scratch.get(which);
        if length == 0 || length > buffer.len() {
            return Err(StorError::new(
                Layer::Medium,
                ErrorKind::BadParam(format!(
                    "crc length {} outside 1..={}",
                    length,
                    buffer.len()
                )),
            ));
        }

        let device = parts.device;
        let mut digest = CrcDigest::new(seed, |s, data: &[u8]| device.crc32(s, data));
        digest
            .digest(&buffer[..length])
            .and_then(|_| digest.value())
            .map_err(StorError::surface(Layer::Medium))
    }

    // =========================================================================
    // Versioned Pages
    // =========================================================================

    /// Stamp the configured type and version onto `meta`, encode it into
    /// `which` and write-verify the page.
    pub fn flush_buff_in_page(
        &mut self,
        which: BufferId,
        page: u32,
        meta: &PageMeta,
    ) -> Result<PageMeta> {
        let settings = self.settings()?;
        let stamped = PageMeta {
            page_type: settings.page_type,
            version: settings.page_version,
            ..*meta
        };
        let sealed = self
            .low
            .flush_page(which, page, &stamped)
            .map_err(StorError::surface(Layer::Medium))?;
        debug!(page, subtype = sealed.subtype, crc = sealed.crc, "page flushed");
        Ok(sealed)
    }

    /// Read, validate and decode `page`; invalid content is `NotValidPage`
    pub fn load_page_in_buff(&mut self, which: BufferId, page: u32) -> Result<PageMeta> {
        self.low
            .load_page(which, page)
            .map_err(StorError::surface(Layer::Medium))
    }

    /// Compare a loaded page's type and version with the configured ones
    pub fn version_status(&self, meta: &PageMeta) -> Result<VersionStatus> {
        let settings = self.settings()?;
        let status = if meta.page_type != settings.page_type {
            VersionStatus::ForeignType(meta.page_type)
        } else if meta.version < settings.page_version {
            VersionStatus::Older(meta.version)
        } else if meta.version > settings.page_version {
            VersionStatus::Newer(meta.version)
        } else {
            VersionStatus::Current
        };
        Ok(status)
    }
}
