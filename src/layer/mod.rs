//! Layer Module
//!
//! Three stacked views of one storage context.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ HighLevel   twin-page protocol, staged metas │ ← log / blob / table modules
//! ├──────────────────────────────────────────────┤
//! │ MediumLevel CRC-in-buffer, page versioning   │
//! ├──────────────────────────────────────────────┤
//! │ LowLevel    retrying I/O, page codec         │
//! ├──────────────────────────────────────────────┤
//! │ Context     init state, device, scratch pair │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Each level owns the one below it and re-surfaces its errors through
//! [`StorError::surface`](crate::error::StorError::surface).

mod context;
mod high;
mod low;
mod medium;

pub use context::{Context, CtxState};
pub use high::{BuffHandle, HighLevel};
pub use low::LowLevel;
pub use medium::{MediumLevel, VersionStatus};
