//! Configuration for twinstor
//!
//! Storage settings are fixed at context init and never change afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Layer, Result, StorError};
use crate::page::TRAILER_SIZE;

/// Device geometry and page identity for one storage context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------
    /// Number of pages the context may address (0..total_pages)
    pub total_pages: u32,

    /// Bytes per page, user data plus trailer. Must be even.
    pub page_length: usize,

    // -------------------------------------------------------------------------
    // I/O
    // -------------------------------------------------------------------------
    /// Extra attempts allowed after the first failing callback
    pub rw_retry_count: u32,

    // -------------------------------------------------------------------------
    // Page Identity
    // -------------------------------------------------------------------------
    /// Type tag stamped into every page trailer
    pub page_type: u8,

    /// Format version stamped into every page trailer
    pub page_version: u16,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            total_pages: 4,
            page_length: 256,
            rw_retry_count: 3,
            page_type: 0x01,
            page_version: 1,
        }
    }
}

impl StorageSettings {
    /// Create a new settings builder
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Bytes available to callers in front of the trailer
    pub fn user_data_len(&self) -> usize {
        self.page_length.saturating_sub(TRAILER_SIZE)
    }

    /// Scratch region size a context needs (two page buffers)
    pub fn scratch_len(&self) -> usize {
        self.page_length * 2
    }

    /// Range checks shared by every layer
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(StorError::new(Layer::Low, ErrorKind::BadParam(msg)));

        if self.total_pages < 2 {
            return bad(format!("total_pages must be >= 2, got {}", self.total_pages));
        }
        if self.page_length <= TRAILER_SIZE {
            return bad(format!(
                "page_length {} does not leave room for the {}-byte trailer",
                self.page_length, TRAILER_SIZE
            ));
        }
        if self.page_length % 2 != 0 {
            return bad(format!("page_length must be even, got {}", self.page_length));
        }
        if self.rw_retry_count == 0 {
            return bad("rw_retry_count must be >= 1".to_string());
        }
        Ok(())
    }

    /// Extra check for layers that lay pages out as origin/backup pairs
    pub fn validate_twin(&self) -> Result<()> {
        self.validate()?;
        if self.total_pages % 2 != 0 {
            return Err(StorError::new(
                Layer::High,
                ErrorKind::BadParam(format!(
                    "total_pages must be even for twin-page storage, got {}",
                    self.total_pages
                )),
            ));
        }
        Ok(())
    }
}

/// Builder for StorageSettings
#[derive(Default)]
pub struct SettingsBuilder {
    settings: StorageSettings,
}

impl SettingsBuilder {
    /// Set the number of addressable pages
    pub fn total_pages(mut self, count: u32) -> Self {
        self.settings.total_pages = count;
        self
    }

    /// Set the page length in bytes (trailer included)
    pub fn page_length(mut self, len: usize) -> Self {
        self.settings.page_length = len;
        self
    }

    /// Set the retry budget for every device callback
    pub fn rw_retry_count(mut self, retries: u32) -> Self {
        self.settings.rw_retry_count = retries;
        self
    }

    /// Set the page type tag
    pub fn page_type(mut self, tag: u8) -> Self {
        self.settings.page_type = tag;
        self
    }

    /// Set the page format version
    pub fn page_version(mut self, version: u16) -> Self {
        self.settings.page_version = version;
        self
    }

    pub fn build(self) -> StorageSettings {
        self.settings
    }
}
