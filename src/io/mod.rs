//! Retrying I/O Module
//!
//! Bounded-retry wrappers around the device primitives.
//!
//! ## Retry Budget
//! Every operation makes `1 + retries` attempts. The first success returns
//! immediately; when all attempts fail, the last failure is reported with the
//! callback that caused it. Nothing is retried across calls.
//!
//! ## Write-Verify Attempt
//! ```text
//! ┌───────┐   ┌───────┐   ┌───────────┐   ┌─────────┐
//! │ erase │ → │ write │ → │ read back │ → │ compare │
//! └───────┘   └───────┘   └───────────┘   └─────────┘
//!  Erase       Write       Read            WriteVerifyMismatch
//! ```
//! The four steps are retried as a unit.

mod retry;

pub use retry::{erase_page, read_page, write_verify_page};
