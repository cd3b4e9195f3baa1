//! Error types for twinstor
//!
//! One internal taxonomy ([`ErrorKind`]) shared by every layer. The public
//! error ([`StorError`]) pairs a kind with the layer that surfaced it, so a
//! caller can match on the kind and still see where the fault crossed a
//! layer boundary.

use std::fmt;

use thiserror::Error;

/// Result type alias using StorError
pub type Result<T> = std::result::Result<T, StorError>;

// =============================================================================
// Layer
// =============================================================================

/// Layer at which an error crossed a public boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// CRC primitives and digest
    Crc,
    /// Retrying raw I/O and page codec
    Low,
    /// CRC-in-buffer and per-page versioning
    Medium,
    /// Twin-page protocol and buffer accessors
    High,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Crc => "crc",
            Layer::Low => "low",
            Layer::Medium => "medium",
            Layer::High => "high",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Callback Classification
// =============================================================================

/// Which injected device callback failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackOp {
    Erase,
    Write,
    Read,
    Crc,
}

impl fmt::Display for CallbackOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallbackOp::Erase => "erase",
            CallbackOp::Write => "write",
            CallbackOp::Read => "read",
            CallbackOp::Crc => "crc32",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Error Kind
// =============================================================================

/// Every failure the page engine can report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    // -------------------------------------------------------------------------
    // Argument / Context Errors
    // -------------------------------------------------------------------------
    /// A required buffer was absent (empty scratch region)
    #[error("bad pointer: {0}")]
    BadPointer(&'static str),

    #[error("bad parameter: {0}")]
    BadParam(String),

    #[error("context not initialized")]
    NoInit,

    #[error("context corrupted: {0}")]
    CorruptCtx(String),

    // -------------------------------------------------------------------------
    // Device Errors
    // -------------------------------------------------------------------------
    /// Device callback failed after exhausting the retry budget
    #[error("{op} callback failed{}", page_suffix(.page))]
    Callback { op: CallbackOp, page: Option<u32> },

    /// Write and read-back both succeeded but the content differs
    #[error("write verify mismatch on page {page}")]
    WriteVerifyMismatch { page: u32 },

    // -------------------------------------------------------------------------
    // Content Errors
    // -------------------------------------------------------------------------
    #[error("page {page} failed validation")]
    NotValidPage { page: u32 },

    #[error("serialization error: {0}")]
    Codec(String),

    // -------------------------------------------------------------------------
    // Digest Errors
    // -------------------------------------------------------------------------
    #[error("digest value requested before any chunk was digested")]
    DigestEmpty,

    #[error("digest operation count overflowed")]
    DigestOverflow,
}

fn page_suffix(page: &Option<u32>) -> String {
    match page {
        Some(p) => format!(" on page {}", p),
        None => String::new(),
    }
}

impl ErrorKind {
    /// Callback failure helper
    pub fn callback(op: CallbackOp, page: u32) -> Self {
        ErrorKind::Callback { op, page: Some(page) }
    }

    /// Which callback failed, if this is a callback error
    pub fn callback_op(&self) -> Option<CallbackOp> {
        match self {
            ErrorKind::Callback { op, .. } => Some(*op),
            _ => None,
        }
    }
}

// =============================================================================
// Public Error
// =============================================================================

/// Error returned by every public twinstor operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{layer} layer: {kind}")]
pub struct StorError {
    layer: Layer,
    #[source]
    kind: ErrorKind,
}

impl StorError {
    pub fn new(layer: Layer, kind: ErrorKind) -> Self {
        Self { layer, kind }
    }

    /// The failure kind
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The layer the error was last surfaced through
    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Boundary mapping: re-surface a lower-layer error at `layer`.
    ///
    /// The kind is preserved untouched. The layer only ever moves upwards;
    /// an error already tagged with a higher layer keeps its tag.
    pub fn surface(layer: Layer) -> impl Fn(StorError) -> StorError {
        move |err| {
            if rank(layer) > rank(err.layer) {
                StorError { layer, kind: err.kind }
            } else {
                err
            }
        }
    }

    pub fn is_callback(&self) -> bool {
        matches!(self.kind, ErrorKind::Callback { .. })
    }
}

fn rank(layer: Layer) -> u8 {
    match layer {
        Layer::Crc => 0,
        Layer::Low => 1,
        Layer::Medium => 2,
        Layer::High => 3,
    }
}
