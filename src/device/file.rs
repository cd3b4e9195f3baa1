//! File-backed flash image
//!
//! Pages live at `page * page_length` in a single image file, so a storage
//! context can be dropped and rebuilt over the same media.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::ram::ERASED_BYTE;
use super::{DeviceFault, DeviceResult, PageDevice};

/// Flash image stored in a regular file
pub struct FileFlash {
    path: PathBuf,
    file: File,
    page_length: usize,
    total_pages: u32,
}

impl FileFlash {
    /// Create (or truncate) an image of `total_pages` blank pages
    pub fn create(path: &Path, total_pages: u32, page_length: usize) -> DeviceResult<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(io_fault)?;

        let blank = vec![ERASED_BYTE; page_length];
        for _ in 0..total_pages {
            file.write_all(&blank).map_err(io_fault)?;
        }
        file.sync_all().map_err(io_fault)?;

        debug!(path = %path.display(), total_pages, page_length, "created flash image");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            page_length,
            total_pages,
        })
    }

    /// Open an existing image; the page count is derived from its size
    pub fn open(path: &Path, page_length: usize) -> DeviceResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(io_fault)?;

        let size = file.metadata().map_err(io_fault)?.len();
        if page_length == 0 || size % page_length as u64 != 0 {
            return Err(DeviceFault::new(format!(
                "image size {} is not a multiple of page length {}",
                size, page_length
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            page_length,
            total_pages: (size / page_length as u64) as u32,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Seek to `page` after checking the range and transfer length
    fn seek_page(&mut self, page: u32, len: usize) -> DeviceResult<()> {
        if page >= self.total_pages {
            return Err(DeviceFault::new(format!(
                "page {} out of range ({} pages)",
                page, self.total_pages
            )));
        }
        if len != self.page_length {
            return Err(DeviceFault::new(format!(
                "transfer of {} bytes, page length is {}",
                len, self.page_length
            )));
        }
        let offset = page as u64 * self.page_length as u64;
        self.file.seek(SeekFrom::Start(offset)).map_err(io_fault)?;
        Ok(())
    }
}

fn io_fault(err: std::io::Error) -> DeviceFault {
    DeviceFault::new(err.to_string())
}

impl PageDevice for FileFlash {
    fn erase(&mut self, page: u32) -> DeviceResult<()> {
        let blank = vec![ERASED_BYTE; self.page_length];
        self.write(page, &blank)
    }

    fn write(&mut self, page: u32, data: &[u8]) -> DeviceResult<()> {
        self.seek_page(page, data.len())?;
        self.file.write_all(data).map_err(io_fault)?;
        self.file.sync_data().map_err(io_fault)
    }

    fn read(&mut self, page: u32, buf: &mut [u8]) -> DeviceResult<()> {
        self.seek_page(page, buf.len())?;
        self.file.read_exact(buf).map_err(io_fault)
    }
}
