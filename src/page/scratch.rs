//! Scratch buffer pair
//!
//! A context owns two page-sized buffers carved out of one caller-provided
//! region. The split happens once, at init.

use crate::error::{ErrorKind, Layer, Result, StorError};

/// Selects one of the two scratch buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferId {
    A,
    B,
}

impl BufferId {
    /// The sibling buffer
    pub fn other(self) -> Self {
        match self {
            BufferId::A => BufferId::B,
            BufferId::B => BufferId::A,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            BufferId::A => 0,
            BufferId::B => 1,
        }
    }
}

/// Two disjoint page buffers borrowed from the caller
#[derive(Debug)]
pub struct ScratchPair<'buf> {
    a: &'buf mut [u8],
    b: &'buf mut [u8],
}

impl<'buf> ScratchPair<'buf> {
    /// Split `region` into two buffers of `page_length` bytes each
    pub fn split(region: &'buf mut [u8], page_length: usize) -> Result<Self> {
        if region.is_empty() {
            return Err(StorError::new(
                Layer::Low,
                ErrorKind::BadPointer("scratch region is empty"),
            ));
        }
        if page_length == 0 || region.len() != page_length * 2 {
            return Err(StorError::new(
                Layer::Low,
                ErrorKind::BadParam(format!(
                    "scratch region is {} bytes, expected 2 x {}",
                    region.len(),
                    page_length
                )),
            ));
        }
        let (a, b) = region.split_at_mut(page_length);
        Ok(Self { a, b })
    }

    pub fn get(&self, id: BufferId) -> &[u8] {
        match id {
            BufferId::A => &*self.a,
            BufferId::B => &*self.b,
        }
    }

    pub fn get_mut(&mut self, id: BufferId) -> &mut [u8] {
        match id {
            BufferId::A => &mut *self.a,
            BufferId::B => &mut *self.b,
        }
    }

    /// Borrow `id` and its sibling at the same time, in that order
    pub fn with_sibling(&mut self, id: BufferId) -> (&mut [u8], &mut [u8]) {
        match id {
            BufferId::A => (&mut *self.a, &mut *self.b),
            BufferId::B => (&mut *self.b, &mut *self.a),
        }
    }

    /// Length of each buffer
    pub fn page_length(&self) -> usize {
        self.a.len()
    }

    /// Both buffers still have the expected length
    pub fn is_coherent(&self, page_length: usize) -> bool {
        self.a.len() == page_length && self.b.len() == page_length
    }

    /// Release the buffers back to the caller
    pub fn into_inner(self) -> (&'buf mut [u8], &'buf mut [u8]) {
        (self.a, self.b)
    }
}
