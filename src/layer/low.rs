//! Low level: retrying raw I/O and the page codec over a context
//!
//! Page transfers always go through a scratch buffer. A write is verified by
//! reading back into the sibling buffer, whose previous content is lost.

use crate::config::StorageSettings;
use crate::device::PageDevice;
use crate::error::{ErrorKind, Layer, Result, StorError};
use crate::io;
use crate::page::{self, BufferId, PageMeta};

use super::context::{Context, CtxState, SettingsRules};

/// Low-level page access
pub struct LowLevel<'buf, D> {
    ctx: Context<'buf, D>,
}

impl<'buf, D: PageDevice> Default for LowLevel<'buf, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'buf, D: PageDevice> LowLevel<'buf, D> {
    /// An uninitialized low level; call [`LowLevel::init_ctx`] before use
    pub fn new() -> Self {
        Self { ctx: Context::new() }
    }

    /// Validate and take the device, settings and scratch region
    pub fn init_ctx(
        &mut self,
        device: D,
        settings: StorageSettings,
        scratch: &'buf mut [u8],
    ) -> Result<()> {
        self.ctx.init(device, settings, scratch, StorageSettings::validate)
    }

    pub(crate) fn init_with_rules(
        &mut self,
        device: D,
        settings: StorageSettings,
        scratch: &'buf mut [u8],
        rules: SettingsRules,
    ) -> Result<()> {
        self.ctx.init(device, settings, scratch, rules)
    }

    pub fn is_init(&self) -> bool {
        self.ctx.is_init()
    }

    pub fn state(&self) -> CtxState {
        self.ctx.state()
    }

    pub fn settings(&self) -> Result<StorageSettings> {
        self.ctx.settings().copied()
    }

    pub fn device_mut(&mut self) -> Option<&mut D> {
        self.ctx.device_mut()
    }

    /// Hand the device and both buffers back to the caller
    pub fn release(self) -> Option<(D, &'buf mut [u8], &'buf mut [u8])> {
        self.ctx.release()
    }

    pub(crate) fn context_mut(&mut self) -> &mut Context<'buf, D> {
        &mut self.ctx
    }

    // =========================================================================
    // Buffers
    // =========================================================================

    /// Full page content of a scratch buffer
    pub fn buffer(&mut self, which: BufferId) -> Result<&[u8]> {
        let parts = self.ctx.parts()?;
        Ok(parts.scratch.get(which))
    }

    pub fn buffer_mut(&mut self, which: BufferId) -> Result<&mut [u8]> {
        let parts = self.ctx.parts()?;
        Ok(parts.scratch.get_mut(which))
    }

    // =========================================================================
    // Raw Page I/O
    // =========================================================================

    pub fn erase_page(&mut self, page: u32) -> Result<()> {
        let parts = self.ctx.parts()?;
        check_page(parts.settings, page)?;
        io::erase_page(parts.device, page, parts.settings.rw_retry_count)
    }

    /// Read `page` into `which` without validating it
    pub fn read_page(&mut self, which: BufferId, page: u32) -> Result<()> {
        let parts = self.ctx.parts()?;
        check_page(parts.settings, page)?;
        let buf = parts.scratch.get_mut(which);
        io::read_page(parts.device, page, buf, parts.settings.rw_retry_count)
    }

    /// Write-verify `which` into `page`, reading back into the sibling buffer
    pub fn write_page(&mut self, which: BufferId, page: u32) -> Result<()> {
        let parts = self.ctx.parts()?;
        check_page(parts.settings, page)?;
        let (src, readback) = parts.scratch.with_sibling(which);
        io::write_verify_page(parts.device, src, readback, page, parts.settings.rw_retry_count)
    }

    // =========================================================================
    // Codec
    // =========================================================================

    /// Encode `meta` into the trailer of `which` and seal it with a CRC
    pub fn encode_meta(&mut self, which: BufferId, meta: &PageMeta) -> Result<PageMeta> {
        let parts = self.ctx.parts()?;
        page::encode_meta(parts.scratch.get_mut(which), meta, parts.device)
    }

    /// Unpack the trailer of `which` without validating it
    pub fn decode_meta(&mut self, which: BufferId) -> Result<PageMeta> {
        let parts = self.ctx.parts()?;
        page::decode_meta(parts.scratch.get(which))
    }

    /// Recompute and patch only the CRC of `which`
    pub fn patch_crc(&mut self, which: BufferId) -> Result<u32> {
        let parts = self.ctx.parts()?;
        page::refresh_crc(parts.scratch.get_mut(which), parts.device)
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// CRC + magic check of the content already in `which`
    pub fn is_valid_buff(&mut self, which: BufferId) -> Result<bool> {
        let parts = self.ctx.parts()?;
        page::is_valid_page(parts.scratch.get(which), parts.device)
    }

    /// Read `page` into `which` and check it
    pub fn is_valid_page(&mut self, which: BufferId, page: u32) -> Result<bool> {
        let parts = self.ctx.parts()?;
        check_page(parts.settings, page)?;
        page::is_valid_page_at(
            parts.device,
            page,
            parts.scratch.get_mut(which),
            parts.settings.rw_retry_count,
        )
    }

    // =========================================================================
    // Composite Operations
    // =========================================================================

    /// Read, validate and decode `page` into `which`
    pub fn load_page(&mut self, which: BufferId, page: u32) -> Result<PageMeta> {
        if !self.is_valid_page(which, page)? {
            return Err(StorError::new(Layer::Low, ErrorKind::NotValidPage { page }));
        }
        self.decode_meta(which)
    }

    /// Encode `meta` into `which` and write-verify it into `page`
    pub fn flush_page(&mut self, which: BufferId, page: u32, meta: &PageMeta) -> Result<PageMeta> {
        let sealed = self.encode_meta(which, meta)?;
        self.write_page(which, page)?;
        Ok(sealed)
    }
}

fn check_page(settings: &StorageSettings, page: u32) -> Result<()> {
    if page >= settings.total_pages {
        return Err(StorError::new(
            Layer::Low,
            ErrorKind::BadParam(format!(
                "page {} outside 0..{}",
                page, settings.total_pages
            )),
        ));
    }
    Ok(())
}
