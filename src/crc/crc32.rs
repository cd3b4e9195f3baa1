//! Stateless CRC-32/MPEG-2

use ::crc::{Crc, CRC_32_MPEG_2};

/// Seed used for every page CRC unless a caller chains its own
pub const BASE_SEED: u32 = 0xFFFF_FFFF;

const MPEG2: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// CRC-32/MPEG-2 over `data` with the base seed
pub fn crc32(data: &[u8]) -> u32 {
    crc32_seeded(data, BASE_SEED)
}

/// CRC-32/MPEG-2 over `data` starting from `seed`
pub fn crc32_seeded(data: &[u8], seed: u32) -> u32 {
    let mut digest = MPEG2.digest_with_initial(seed);
    digest.update(data);
    digest.finalize()
}
