//! Page validation
//!
//! A page is valid when its stored CRC matches the recomputed CRC and its
//! magic number is [`PAGE_MAGIC`]. Type and version are not checked; see
//! [`MediumLevel::version_status`](crate::layer::MediumLevel::version_status).

use tracing::debug;

use crate::device::PageDevice;
use crate::error::Result;
use crate::io::read_page;

use super::{page_crc, trailer_start, CRC_OFFSET, MAGIC_OFFSET, PAGE_MAGIC, TRAILER_SIZE};

fn le_u32(buffer: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buffer[at..at + 4]);
    u32::from_le_bytes(word)
}

/// CRC field as stored in the trailer
pub fn stored_crc(buffer: &[u8]) -> u32 {
    le_u32(buffer, trailer_start(buffer.len()) + CRC_OFFSET)
}

/// Magic field as stored in the trailer
pub fn stored_magic(buffer: &[u8]) -> u32 {
    le_u32(buffer, trailer_start(buffer.len()) + MAGIC_OFFSET)
}

/// Check CRC and magic of a page already in memory.
///
/// Errors only when the crc32 callback fails; invalid content is `Ok(false)`.
pub fn is_valid_page<D: PageDevice + ?Sized>(buffer: &[u8], device: &mut D) -> Result<bool> {
    if buffer.len() <= TRAILER_SIZE {
        return Ok(false);
    }

    let magic = stored_magic(buffer);
    if magic != PAGE_MAGIC {
        debug!(magic = format_args!("{:#010x}", magic), "page magic mismatch");
        return Ok(false);
    }

    let expected = stored_crc(buffer);
    let actual = page_crc(buffer, device)?;
    if expected != actual {
        debug!(
            expected = format_args!("{:#010x}", expected),
            actual = format_args!("{:#010x}", actual),
            "page crc mismatch"
        );
        return Ok(false);
    }

    Ok(true)
}

/// Read `page` into `buffer` (with retries) and validate it.
///
/// A read that never succeeds is an error; content that fails the check is
/// `Ok(false)`.
pub fn is_valid_page_at<D: PageDevice + ?Sized>(
    device: &mut D,
    page: u32,
    buffer: &mut [u8],
    retries: u32,
) -> Result<bool> {
    read_page(device, page, buffer, retries)?;
    let valid = is_valid_page(buffer, device)?;
    debug!(page, valid, "validated page");
    Ok(valid)
}
