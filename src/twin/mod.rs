//! Twin-Page Module
//!
//! Verify/backup/recover protocol over an origin/backup page pair.
//!
//! ## Decision Table
//! ```text
//! ┌──────────┬──────────┬───────────────────────────┬──────────────┐
//! │ Origin   │ Backup   │ Action                    │ Status       │
//! ├──────────┼──────────┼───────────────────────────┼──────────────┤
//! │ valid    │ valid, = │ none                      │ Ok           │
//! │ valid    │ valid, ≠ │ origin → backup           │ OkRecovered  │
//! │ invalid  │ valid    │ backup → origin           │ OkRecovered  │
//! │ valid    │ invalid  │ origin → backup           │ OkRecovered  │
//! │ invalid  │ invalid  │ none                      │ NotValid     │
//! └──────────┴──────────┴───────────────────────────┴──────────────┘
//! ```
//!
//! Writers always commit origin before backup, so when both pages are valid
//! but differ, the backup write is the one that never happened and origin
//! holds the newer state.
//!
//! The protocol keeps no state between calls. Any failure leaves the pair in
//! a state the next call resolves, so it is safe to re-run after an error or
//! a power cut. Choosing between several independent pairs (newest log
//! block, current blob version) belongs to the layers above.

mod repair;

pub use repair::{verify_and_repair, Repair, TwinPair, TwinStatus};
