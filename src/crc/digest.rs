//! Incremental CRC digest
//!
//! Feeds a sequence of chunks through an injected crc32 callback, using the
//! result of each chunk as the seed for the next.

use tracing::warn;

use crate::device::DeviceFault;
use crate::error::{CallbackOp, ErrorKind, Layer, Result, StorError};

use super::crc32_seeded;

/// Software CRC callback, matching the device callback signature
pub type SoftCrc = fn(u32, &[u8]) -> std::result::Result<u32, DeviceFault>;

/// Running CRC over multiple chunks
pub struct CrcDigest<F> {
    /// Injected crc32(seed, data) callback
    crc: F,
    /// Seed for the first chunk after construction or `value()`
    seed: u32,
    /// Result of the last digested chunk
    value: u32,
    /// Chunks digested since the last reset
    count: u32,
}

impl CrcDigest<SoftCrc> {
    /// Digest backed by the built-in CRC-32/MPEG-2
    pub fn software(seed: u32) -> Self {
        fn soft(seed: u32, data: &[u8]) -> std::result::Result<u32, DeviceFault> {
            Ok(crc32_seeded(data, seed))
        }
        Self::new(seed, soft as SoftCrc)
    }
}

impl<F> CrcDigest<F>
where
    F: FnMut(u32, &[u8]) -> std::result::Result<u32, DeviceFault>,
{
    pub fn new(seed: u32, crc: F) -> Self {
        Self {
            crc,
            seed,
            value: seed,
            count: 0,
        }
    }

    /// Digest one chunk, chaining from the previous result
    pub fn digest(&mut self, chunk: &[u8]) -> Result<()> {
        if chunk.is_empty() {
            return Err(StorError::new(
                Layer::Crc,
                ErrorKind::BadParam("cannot digest an empty chunk".to_string()),
            ));
        }
        if self.count == u32::MAX {
            return Err(StorError::new(Layer::Crc, ErrorKind::DigestOverflow));
        }

        let seed = if self.count == 0 { self.seed } else { self.value };
        match (self.crc)(seed, chunk) {
            Ok(value) => {
                self.value = value;
                self.count += 1;
                Ok(())
            }
            Err(fault) => {
                warn!(chunk_len = chunk.len(), %fault, "crc32 callback failed");
                Err(StorError::new(
                    Layer::Crc,
                    ErrorKind::Callback { op: CallbackOp::Crc, page: None },
                ))
            }
        }
    }

    /// Take the accumulated CRC and reset to "nothing digested"
    pub fn value(&mut self) -> Result<u32> {
        if self.count == 0 {
            return Err(StorError::new(Layer::Crc, ErrorKind::DigestEmpty));
        }
        let value = self.value;
        self.value = self.seed;
        self.count = 0;
        Ok(value)
    }

    /// Chunks digested since the last reset
    pub fn count(&self) -> u32 {
        self.count
    }
}
