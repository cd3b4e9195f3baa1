//! CRC Module
//!
//! CRC-32/MPEG-2 primitives used for page integrity.
//!
//! ## Algorithm
//! ```text
//! ┌────────────┬────────────┬────────┬─────────┬────────┐
//! │ Poly       │ Init       │ RefIn  │ RefOut  │ XorOut │
//! ├────────────┼────────────┼────────┼─────────┼────────┤
//! │ 0x04C11DB7 │ seed       │ false  │ false   │ 0      │
//! └────────────┴────────────┴────────┴─────────┴────────┘
//! ```
//!
//! With no reflection and no final XOR, the output of one call is a valid
//! seed for the next, which is what [`CrcDigest`] relies on for chaining.

mod crc32;
mod digest;

pub use crc32::{crc32, crc32_seeded, BASE_SEED};
pub use digest::CrcDigest;
