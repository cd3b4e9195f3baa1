//! # twinstor
//!
//! A fail-safe page engine for byte-erasable block devices (flash, EEPROM):
//! - CRC-32/MPEG-2 sealed pages with a fixed binary trailer
//! - Erase/write/read with bounded retries and read-back verification
//! - Twin-page verify/backup/recover protocol for power-loss safety
//! - Low/medium/high layers for log, blob and table modules to build on
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            Log / Blob / Table modules (external)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Layers (high → medium → low)                │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │  Twin Protocol  │───────────────▶│  Page Codec +   │
//!   │ (verify/repair) │                │   Validator     │
//!   └────────┬────────┘                └────────┬────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │  Retrying I/O   │                │  CRC32 / Digest │
//!   └────────┬────────┘                └─────────────────┘
//!            │
//!            ▼
//!   ┌─────────────────┐
//!   │   PageDevice    │
//!   │ (erase/write/   │
//!   │  read/crc32)    │
//!   └─────────────────┘
//! ```
//!
//! Everything is synchronous and single-owner: every operation takes
//! `&mut self` and runs to completion.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod crc;
pub mod device;
pub mod io;
pub mod page;
pub mod twin;
pub mod layer;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CallbackOp, ErrorKind, Layer, Result, StorError};
pub use config::StorageSettings;
pub use device::{DeviceFault, PageDevice, RamFlash};
pub use layer::{BuffHandle, CtxState, HighLevel, LowLevel, MediumLevel, VersionStatus};
pub use page::{BufferId, PageMeta};
pub use twin::{Repair, TwinPair, TwinStatus};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of twinstor
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
