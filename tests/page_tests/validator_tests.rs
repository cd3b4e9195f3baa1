//! Tests for page validation
//!
//! These tests verify:
//! - Encoded pages validate
//! - Any single-byte flip outside the CRC field invalidates the page
//! - Wrong magic invalidates even with a matching CRC
//! - Type/version are not part of validity
//! - Read failure is an error, bad content is `false`

use twinstor::crc::crc32;
use twinstor::device::RamFlash;
use twinstor::page::{
    encode_meta, is_valid_page, is_valid_page_at, patch_crc, PageMeta, TRAILER_SIZE,
};
use twinstor::CallbackOp;

const PAGE_LEN: usize = 48;

// =============================================================================
// Helper Functions
// =============================================================================

fn sealed_page(dev: &mut RamFlash, meta: &PageMeta) -> Vec<u8> {
    let mut page: Vec<u8> = (0..PAGE_LEN as u8).collect();
    encode_meta(&mut page, meta, dev).unwrap();
    page
}

// =============================================================================
// In-Memory Validation
// =============================================================================

#[test]
fn test_encoded_page_is_valid() {
    let mut dev = RamFlash::new(2, PAGE_LEN);
    let page = sealed_page(&mut dev, &PageMeta::new(1, 1, 0));
    assert!(is_valid_page(&page, &mut dev).unwrap());
}

#[test]
fn test_every_single_byte_flip_is_detected() {
    // CRC-32 detects all single-byte errors; this is exhaustive, not sampled
    let mut dev = RamFlash::new(2, PAGE_LEN);
    let page = sealed_page(&mut dev, &PageMeta::new(3, 2, 1).with_use_field(0, 42));

    for offset in 0..PAGE_LEN {
        let mut damaged = page.clone();
        damaged[offset] ^= 0x01;
        assert!(
            !is_valid_page(&damaged, &mut dev).unwrap(),
            "flip at offset {} went undetected",
            offset
        );
    }
}

#[test]
fn test_wrong_magic_with_matching_crc_is_invalid() {
    let mut dev = RamFlash::new(2, PAGE_LEN);
    let mut page = sealed_page(&mut dev, &PageMeta::new(1, 1, 0));

    let magic_at = PAGE_LEN - TRAILER_SIZE + 20;
    page[magic_at] ^= 0xFF;
    let crc = crc32(&page[..PAGE_LEN - 4]);
    patch_crc(&mut page, crc);

    assert!(!is_valid_page(&page, &mut dev).unwrap());
}

#[test]
fn test_blank_page_is_invalid() {
    let mut dev = RamFlash::new(2, PAGE_LEN);
    assert!(!is_valid_page(&vec![0xFF; PAGE_LEN], &mut dev).unwrap());
    assert!(!is_valid_page(&vec![0x00; PAGE_LEN], &mut dev).unwrap());
}

#[test]
fn test_type_and_version_do_not_affect_validity() {
    let mut dev = RamFlash::new(2, PAGE_LEN);
    let old = sealed_page(&mut dev, &PageMeta::new(9, 1, 0));
    let new = sealed_page(&mut dev, &PageMeta::new(2, 700, 0));
    assert!(is_valid_page(&old, &mut dev).unwrap());
    assert!(is_valid_page(&new, &mut dev).unwrap());
}

// =============================================================================
// Validation From Media
// =============================================================================

#[test]
fn test_valid_page_on_media() {
    let mut dev = RamFlash::new(2, PAGE_LEN);
    let page = sealed_page(&mut dev, &PageMeta::new(1, 1, 0));
    dev.set_page(1, &page);

    let mut buf = vec![0u8; PAGE_LEN];
    assert!(is_valid_page_at(&mut dev, 1, &mut buf, 1).unwrap());
    assert_eq!(buf, page);
}

#[test]
fn test_invalid_content_is_false_not_error() {
    let mut dev = RamFlash::new(2, PAGE_LEN);
    let mut buf = vec![0u8; PAGE_LEN];
    assert!(!is_valid_page_at(&mut dev, 0, &mut buf, 1).unwrap());
}

#[test]
fn test_read_failure_is_error_not_false() {
    let mut dev = RamFlash::new(2, PAGE_LEN);
    let page = sealed_page(&mut dev, &PageMeta::new(1, 1, 0));
    dev.set_page(0, &page);
    dev.fail_next(CallbackOp::Read, 2);

    let mut buf = vec![0u8; PAGE_LEN];
    let err = is_valid_page_at(&mut dev, 0, &mut buf, 1).unwrap_err();
    assert_eq!(err.kind().callback_op(), Some(CallbackOp::Read));
}
