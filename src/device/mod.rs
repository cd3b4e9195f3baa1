//! Device Module
//!
//! The four primitives the page engine needs from the medium, and host-side
//! simulated devices.
//!
//! ## Responsibilities
//! - Erase one page back to its blank state
//! - Write a full page
//! - Read a full page
//! - Compute a seeded CRC-32/MPEG-2 (hardware CRC units may override)
//!
//! The engine never interprets a [`DeviceFault`]; it only counts it against
//! the retry budget and classifies it by callback.

mod file;
mod ram;

use thiserror::Error;

use crate::crc::crc32_seeded;

pub use file::FileFlash;
pub use ram::RamFlash;

/// Failure reported by a device primitive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("device fault: {0}")]
pub struct DeviceFault(pub String);

impl DeviceFault {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Result of a device primitive
pub type DeviceResult<T> = std::result::Result<T, DeviceFault>;

/// Page-granular erase/write/read device
///
/// Calls are synchronous and assumed to complete in bounded time.
pub trait PageDevice {
    /// Erase `page` to its blank state
    fn erase(&mut self, page: u32) -> DeviceResult<()>;

    /// Write `data` (exactly one page) to `page`
    fn write(&mut self, page: u32, data: &[u8]) -> DeviceResult<()>;

    /// Read `buf.len()` bytes (exactly one page) from `page`
    fn read(&mut self, page: u32, buf: &mut [u8]) -> DeviceResult<()>;

    /// CRC-32/MPEG-2 over `data` starting from `seed`
    fn crc32(&mut self, seed: u32, data: &[u8]) -> DeviceResult<u32> {
        Ok(crc32_seeded(data, seed))
    }
}

impl<T: PageDevice + ?Sized> PageDevice for &mut T {
    fn erase(&mut self, page: u32) -> DeviceResult<()> {
        (**self).erase(page)
    }

    fn write(&mut self, page: u32, data: &[u8]) -> DeviceResult<()> {
        (**self).write(page, data)
    }

    fn read(&mut self, page: u32, buf: &mut [u8]) -> DeviceResult<()> {
        (**self).read(page, buf)
    }

    fn crc32(&mut self, seed: u32, data: &[u8]) -> DeviceResult<u32> {
        (**self).crc32(seed, data)
    }
}

impl<T: PageDevice + ?Sized> PageDevice for Box<T> {
    fn erase(&mut self, page: u32) -> DeviceResult<()> {
        (**self).erase(page)
    }

    fn write(&mut self, page: u32, data: &[u8]) -> DeviceResult<()> {
        (**self).write(page, data)
    }

    fn read(&mut self, page: u32, buf: &mut [u8]) -> DeviceResult<()> {
        (**self).read(page, buf)
    }

    fn crc32(&mut self, seed: u32, data: &[u8]) -> DeviceResult<u32> {
        (**self).crc32(seed, data)
    }
}
