//! In-memory flash simulator
//!
//! Blank pages read as `0xFF`. Faults can be armed per primitive to exercise
//! retry budgets, and a write can be torn part-way to simulate power loss.

use tracing::trace;

use crate::crc::crc32_seeded;
use crate::error::CallbackOp;

use super::{DeviceFault, DeviceResult, PageDevice};

/// Erased flash byte value
pub const ERASED_BYTE: u8 = 0xFF;

/// Simulated byte-erasable device held in RAM
#[derive(Debug, Clone)]
pub struct RamFlash {
    page_length: usize,
    pages: Vec<Vec<u8>>,

    /// Remaining injected failures, indexed by [`op_slot`]
    pending_faults: [u32; 4],

    /// Keep only this many bytes of the next write, then fail it
    tear_next_write: Option<usize>,

    /// Primitive call counters, indexed by [`op_slot`]
    calls: [u64; 4],
}

fn op_slot(op: CallbackOp) -> usize {
    match op {
        CallbackOp::Erase => 0,
        CallbackOp::Write => 1,
        CallbackOp::Read => 2,
        CallbackOp::Crc => 3,
    }
}

impl RamFlash {
    /// A device of `total_pages` blank pages of `page_length` bytes
    pub fn new(total_pages: u32, page_length: usize) -> Self {
        Self {
            page_length,
            pages: vec![vec![ERASED_BYTE; page_length]; total_pages as usize],
            pending_faults: [0; 4],
            tear_next_write: None,
            calls: [0; 4],
        }
    }

    pub fn total_pages(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn page_length(&self) -> usize {
        self.page_length
    }

    // =========================================================================
    // Direct Media Access (bypasses the primitives and fault injection)
    // =========================================================================

    /// Raw content of `page`
    pub fn page(&self, page: u32) -> &[u8] {
        &self.pages[page as usize]
    }

    /// Overwrite `page` with raw bytes
    pub fn set_page(&mut self, page: u32, data: &[u8]) {
        let slot = &mut self.pages[page as usize];
        slot.fill(ERASED_BYTE);
        let len = data.len().min(slot.len());
        slot[..len].copy_from_slice(&data[..len]);
    }

    /// Invert one byte of `page` in place
    pub fn corrupt_byte(&mut self, page: u32, offset: usize) {
        self.pages[page as usize][offset] ^= 0xFF;
    }

    /// True when every byte of `page` is in the erased state
    pub fn is_blank(&self, page: u32) -> bool {
        self.pages[page as usize].iter().all(|&b| b == ERASED_BYTE)
    }

    // =========================================================================
    // Fault Injection
    // =========================================================================

    /// Make the next `count` calls to `op` fail
    pub fn fail_next(&mut self, op: CallbackOp, count: u32) {
        self.pending_faults[op_slot(op)] = count;
    }

    /// Keep only the first `keep` bytes of the next write, then report failure
    pub fn tear_next_write(&mut self, keep: usize) {
        self.tear_next_write = Some(keep);
    }

    /// Number of calls made to `op`, including failed ones
    pub fn calls(&self, op: CallbackOp) -> u64 {
        self.calls[op_slot(op)]
    }

    pub fn reset_counters(&mut self) {
        self.calls = [0; 4];
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn enter(&mut self, op: CallbackOp) -> DeviceResult<()> {
        let slot = op_slot(op);
        self.calls[slot] += 1;
        if self.pending_faults[slot] > 0 {
            self.pending_faults[slot] -= 1;
            trace!(%op, "injected fault");
            return Err(DeviceFault::new(format!("injected {} fault", op)));
        }
        Ok(())
    }

    fn slot_mut(&mut self, page: u32) -> DeviceResult<&mut Vec<u8>> {
        let total = self.pages.len();
        self.pages
            .get_mut(page as usize)
            .ok_or_else(|| DeviceFault::new(format!("page {} out of range ({} pages)", page, total)))
    }

    fn check_len(&self, len: usize) -> DeviceResult<()> {
        if len != self.page_length {
            return Err(DeviceFault::new(format!(
                "transfer of {} bytes, page length is {}",
                len, self.page_length
            )));
        }
        Ok(())
    }
}

impl PageDevice for RamFlash {
    fn erase(&mut self, page: u32) -> DeviceResult<()> {
        self.enter(CallbackOp::Erase)?;
        self.slot_mut(page)?.fill(ERASED_BYTE);
        Ok(())
    }

    fn write(&mut self, page: u32, data: &[u8]) -> DeviceResult<()> {
        self.enter(CallbackOp::Write)?;
        self.check_len(data.len())?;
        let torn = self.tear_next_write.take();
        let slot = self.slot_mut(page)?;

        // Programming can only clear bits
        let keep = torn.unwrap_or(data.len()).min(data.len());
        for (dst, src) in slot.iter_mut().zip(&data[..keep]) {
            *dst &= *src;
        }

        match torn {
            Some(keep) => Err(DeviceFault::new(format!(
                "power lost after {} bytes of page {}",
                keep, page
            ))),
            None => Ok(()),
        }
    }

    fn read(&mut self, page: u32, buf: &mut [u8]) -> DeviceResult<()> {
        self.enter(CallbackOp::Read)?;
        self.check_len(buf.len())?;
        let slot = self.slot_mut(page)?;
        buf.copy_from_slice(&slot[..]);
        Ok(())
    }

    fn crc32(&mut self, seed: u32, data: &[u8]) -> DeviceResult<u32> {
        self.enter(CallbackOp::Crc)?;
        Ok(crc32_seeded(data, seed))
    }
}
