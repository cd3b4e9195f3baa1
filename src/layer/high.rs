//! High level: twin-page protocol and buffer/metadata accessors
//!
//! This is the surface consumed by log, blob and table modules. Each scratch
//! buffer has a staged [`PageMeta`]: loading a page refreshes it, flushing a
//! buffer encodes it.
//!
//! ## Page Pairs
//! Storage is laid out as origin/backup pairs, so `total_pages` must be even.
//! Write origin first, backup second ([`HighLevel::flush_twin`] does this);
//! [`HighLevel::verify_and_repair`] depends on that order.

use tracing::debug;

use crate::config::StorageSettings;
use crate::device::PageDevice;
use crate::error::{Layer, Result, StorError};
use crate::page::{self, BufferId, PageMeta, TRAILER_SIZE};
use crate::twin::{self, TwinPair, TwinStatus};

use super::context::CtxState;
use super::medium::{MediumLevel, VersionStatus};

/// User-data region of a scratch buffer together with its staged meta
pub struct BuffHandle<'h> {
    /// `page_length - TRAILER_SIZE` bytes of caller data
    pub data: &'h mut [u8],
    /// Meta that the next flush of this buffer will encode
    pub meta: &'h mut PageMeta,
}

impl BuffHandle<'_> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

pub struct HighLevel<'buf, D> {
    medium: MediumLevel<'buf, D>,
    /// Staged meta per scratch buffer, indexed by `BufferId::index`
    metas: [PageMeta; 2],
}

impl<'buf, D: PageDevice> Default for HighLevel<'buf, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'buf, D: PageDevice> HighLevel<'buf, D> {
    pub fn new() -> Self {
        Self {
            medium: MediumLevel::new(),
            metas: [PageMeta::default(); 2],
        }
    }

    /// Uninitialized level followed by [`HighLevel::init_ctx`]
    pub fn with_device(
        device: D,
        settings: StorageSettings,
        scratch: &'buf mut [u8],
    ) -> Result<Self> {
        let mut high = Self::new();
        high.init_ctx(device, settings, scratch)?;
        Ok(high)
    }

    /// Validate and take the device, settings and scratch region.
    ///
    /// On top of the lower-level checks, `total_pages` must be even.
    pub fn init_ctx(
        &mut self,
        device: D,
        settings: StorageSettings,
        scratch: &'buf mut [u8],
    ) -> Result<()> {
        self.medium
            .init_with_rules(device, settings, scratch, StorageSettings::validate_twin)
            .map_err(StorError::surface(Layer::High))?;

        let blank = PageMeta::new(settings.page_type, settings.page_version, 0);
        self.metas = [blank; 2];
        Ok(())
    }

    pub fn is_init(&self) -> bool {
        self.medium.is_init()
    }

    pub fn state(&self) -> CtxState {
        self.medium.state()
    }

    pub fn settings(&self) -> Result<StorageSettings> {
        self.medium.settings().map_err(StorError::surface(Layer::High))
    }

    pub fn device_mut(&mut self) -> Option<&mut D> {
        self.medium.device_mut()
    }

    pub fn release(self) -> Option<(D, &'buf mut [u8], &'buf mut [u8])> {
        self.medium.release()
    }

    /// The medium level this level is built on
    pub fn medium_mut(&mut self) -> &mut MediumLevel<'buf, D> {
        &mut self.medium
    }

    // =========================================================================
    // Buffer Accessors
    // =========================================================================

    /// User data and staged meta of `which`
    pub fn buff(&mut self, which: BufferId) -> Result<BuffHandle<'_>> {
        let page = self
            .medium
            .buffer_mut(which)
            .map_err(StorError::surface(Layer::High))?;
        let user_len = page.len() - TRAILER_SIZE;
        Ok(BuffHandle {
            data: &mut page[..user_len],
            meta: &mut self.metas[which.index()],
        })
    }

    /// Copy of the staged meta of `which`
    pub fn meta(&self, which: BufferId) -> PageMeta {
        self.metas[which.index()]
    }

    // =========================================================================
    // Page Transfer
    // =========================================================================

    /// Read, validate and decode `page` into `which`, refreshing its staged meta
    pub fn load_page_in_buff(&mut self, which: BufferId, page: u32) -> Result<PageMeta> {
        let meta = self
            .medium
            .load_page_in_buff(which, page)
            .map_err(StorError::surface(Layer::High))?;
        self.metas[which.index()] = meta;
        Ok(meta)
    }

    /// Encode the staged meta of `which` and write-verify it into `page`.
    ///
    /// The sibling buffer is used for read-back and loses its content.
    pub fn flush_buff_in_page(&mut self, which: BufferId, page: u32) -> Result<PageMeta> {
        let staged = self.metas[which.index()];
        let sealed = self
            .medium
            .flush_buff_in_page(which, page, &staged)
            .map_err(StorError::surface(Layer::High))?;
        self.metas[which.index()] = sealed;
        Ok(sealed)
    }

    /// Flush `which` into origin, then into backup, each with its own subtype.
    ///
    /// The staged meta keeps the origin subtype afterwards.
    pub fn flush_twin(&mut self, which: BufferId, pair: &TwinPair) -> Result<()> {
        let slot = which.index();

        self.metas[slot].subtype = pair.origin_subtype;
        self.flush_buff_in_page(which, pair.origin)?;

        self.metas[slot].subtype = pair.backup_subtype;
        let flushed = self.flush_buff_in_page(which, pair.backup);
        self.metas[slot].subtype = pair.origin_subtype;
        flushed?;

        debug!(origin = pair.origin, backup = pair.backup, "twin pair flushed");
        Ok(())
    }

    pub fn erase_page(&mut self, page: u32) -> Result<()> {
        self.medium.erase_page(page).map_err(StorError::surface(Layer::High))
    }

    pub fn calc_crc_in_buff(&mut self, which: BufferId, seed: u32, length: usize) -> Result<u32> {
        self.medium
            .calc_crc_in_buff(which, seed, length)
            .map_err(StorError::surface(Layer::High))
    }

    pub fn version_status(&self, meta: &PageMeta) -> Result<VersionStatus> {
        self.medium
            .version_status(meta)
            .map_err(StorError::surface(Layer::High))
    }

    // =========================================================================
    // Twin-Page Protocol
    // =========================================================================

    /// Verify a pair and repair the stale side.
    ///
    /// Uses both scratch buffers. On `Ok`/`OkRecovered`, buffer A holds the
    /// origin page and its staged meta is refreshed from it.
    pub fn verify_and_repair(
        &mut self,
        origin: u32,
        backup: u32,
        origin_subtype: u8,
        backup_subtype: u8,
    ) -> Result<TwinStatus> {
        let pair = TwinPair::new(origin, backup, origin_subtype, backup_subtype);
        self.verify_pair(&pair)
    }

    /// [`HighLevel::verify_and_repair`] taking a [`TwinPair`]
    pub fn verify_pair(&mut self, pair: &TwinPair) -> Result<TwinStatus> {
        let parts = self
            .medium
            .low_mut()
            .context_mut()
            .parts()
            .map_err(StorError::surface(Layer::High))?;

        let status = twin::verify_and_repair(
            parts.device,
            parts.scratch,
            pair,
            parts.settings.total_pages,
            parts.settings.rw_retry_count,
        )
        .map_err(StorError::surface(Layer::High))?;

        if status.is_usable() {
            let origin = page::decode_meta(parts.scratch.get(BufferId::A))
                .map_err(StorError::surface(Layer::High))?;
            self.metas[BufferId::A.index()] = origin;
        }
        Ok(status)
    }
}
