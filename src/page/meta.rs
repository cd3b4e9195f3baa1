//! Page trailer metadata

use serde::{Deserialize, Serialize};

use super::{PAGE_MAGIC, USE_FIELD_COUNT};

/// Decoded page trailer
///
/// Field order is the on-media order; the codec serializes this struct
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageMeta {
    /// Caller-defined values (sequence numbers, indices, lengths, ...)
    pub use_fields: [u32; USE_FIELD_COUNT],
    /// Caller-defined page role (e.g. origin vs backup, data vs index)
    pub subtype: u8,
    pub page_type: u8,
    pub version: u16,
    pub magic: u32,
    pub crc: u32,
}

impl Default for PageMeta {
    fn default() -> Self {
        Self {
            use_fields: [0; USE_FIELD_COUNT],
            subtype: 0,
            page_type: 0,
            version: 0,
            magic: PAGE_MAGIC,
            crc: 0,
        }
    }
}

impl PageMeta {
    /// Meta for a page of the given identity, use fields zeroed
    pub fn new(page_type: u8, version: u16, subtype: u8) -> Self {
        Self {
            subtype,
            page_type,
            version,
            ..Self::default()
        }
    }

    /// Set one use field, returning self for chaining
    pub fn with_use_field(mut self, index: usize, value: u32) -> Self {
        self.use_fields[index] = value;
        self
    }
}
