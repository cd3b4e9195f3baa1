//! Page Module
//!
//! Binary layout of a storage page and the codec that reads and writes it.
//!
//! ## Page Format
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────────────┐
//! │ User Data                    │ Trailer (28 bytes)                       │
//! │ (page_length - 28 bytes)     │                                          │
//! └──────────────────────────────┴──────────────────────────────────────────┘
//!
//! Trailer (all integers little-endian):
//! ┌──────────────────┬─────────┬──────┬─────────┬───────────┬───────────┐
//! │ Use fields 4×u32 │ Subtype │ Type │ Version │ Magic     │ CRC32     │
//! │ (16)             │ u8 (1)  │ u8(1)│ u16 (2) │ u32 (4)   │ u32 (4)   │
//! └──────────────────┴─────────┴──────┴─────────┴───────────┴───────────┘
//!  offset 0           16        17     18        20          24
//! ```
//!
//! The CRC (CRC-32/MPEG-2, seed `0xFFFFFFFF`) covers every byte of the page
//! in front of it, user data included.

mod codec;
mod meta;
mod scratch;
mod validator;

pub use codec::{decode_meta, encode_meta, patch_crc, patch_subtype, page_crc, refresh_crc};
pub use meta::PageMeta;
pub use scratch::{BufferId, ScratchPair};
pub use validator::{is_valid_page, is_valid_page_at, stored_crc, stored_magic};

// =============================================================================
// Shared Constants (used by codec, validator, twin protocol)
// =============================================================================

/// Magic number identifying a twinstor page
pub const PAGE_MAGIC: u32 = 0x5AFE_9A6E;

/// Number of caller-defined u32 fields in the trailer
pub const USE_FIELD_COUNT: usize = 4;

/// Trailer size: UseFields (16) + Subtype (1) + Type (1) + Version (2) + Magic (4) + CRC (4)
pub const TRAILER_SIZE: usize = 28;

/// Size of the CRC field at the very end of the page
pub const CRC_SIZE: usize = 4;

/// Offsets inside the trailer
pub(crate) const SUBTYPE_OFFSET: usize = 16;
pub(crate) const MAGIC_OFFSET: usize = 20;
pub(crate) const CRC_OFFSET: usize = 24;

/// Start of the trailer within a page of `page_length` bytes
pub(crate) fn trailer_start(page_length: usize) -> usize {
    page_length - TRAILER_SIZE
}
