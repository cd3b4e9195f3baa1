//! Tests for the simulated devices
//!
//! These tests verify:
//! - RamFlash blank state, fault injection and call accounting
//! - RamFlash range and transfer-length checks
//! - FileFlash persists pages across reopen
//! - A repaired twin pair survives a restart on a file-backed image

use tempfile::TempDir;

use twinstor::device::{FileFlash, RamFlash};
use twinstor::{
    BufferId, CallbackOp, HighLevel, PageDevice, Repair, StorageSettings, TwinPair, TwinStatus,
};

const PAGE_LEN: usize = 32;

// =============================================================================
// Helper Functions
// =============================================================================

fn settings(total_pages: u32) -> StorageSettings {
    StorageSettings::builder()
        .total_pages(total_pages)
        .page_length(PAGE_LEN)
        .rw_retry_count(1)
        .build()
}

// =============================================================================
// RamFlash
// =============================================================================

#[test]
fn test_ram_flash_starts_blank() {
    let flash = RamFlash::new(3, PAGE_LEN);
    assert_eq!(flash.total_pages(), 3);
    assert_eq!(flash.page_length(), PAGE_LEN);
    assert!((0..3).all(|p| flash.is_blank(p)));
}

#[test]
fn test_ram_flash_injected_faults_are_counted() {
    let mut flash = RamFlash::new(2, PAGE_LEN);
    flash.fail_next(CallbackOp::Erase, 2);

    assert!(flash.erase(0).is_err());
    assert!(flash.erase(0).is_err());
    assert!(flash.erase(0).is_ok());
    assert_eq!(flash.calls(CallbackOp::Erase), 3);

    flash.reset_counters();
    assert_eq!(flash.calls(CallbackOp::Erase), 0);
}

#[test]
fn test_ram_flash_crc_callback_can_fail() {
    let mut flash = RamFlash::new(2, PAGE_LEN);
    flash.fail_next(CallbackOp::Crc, 1);

    assert!(flash.crc32(0xFFFF_FFFF, b"123456789").is_err());
    assert_eq!(flash.crc32(0xFFFF_FFFF, b"123456789").unwrap(), 0x0376_E6E7);
}

#[test]
fn test_ram_flash_rejects_bad_transfers() {
    let mut flash = RamFlash::new(2, PAGE_LEN);
    let mut short = vec![0u8; PAGE_LEN - 1];

    assert!(flash.read(0, &mut short).is_err());
    assert!(flash.write(0, &short).is_err());
    assert!(flash.erase(2).is_err());
    assert!(flash.read(7, &mut vec![0u8; PAGE_LEN]).is_err());
}

#[test]
fn test_ram_flash_corrupt_byte_inverts() {
    let mut flash = RamFlash::new(1, PAGE_LEN);
    flash.set_page(0, &[0x0F; PAGE_LEN]);
    flash.corrupt_byte(0, 4);

    assert_eq!(flash.page(0)[4], 0xF0);
    assert_eq!(flash.page(0)[3], 0x0F);
}

// =============================================================================
// FileFlash
// =============================================================================

#[test]
fn test_file_flash_create_and_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("flash.img");

    {
        let mut flash = FileFlash::create(&path, 4, PAGE_LEN).unwrap();
        assert_eq!(flash.total_pages(), 4);
        flash.write(2, &[0x5A; PAGE_LEN]).unwrap();
    }

    let mut flash = FileFlash::open(&path, PAGE_LEN).unwrap();
    assert_eq!(flash.total_pages(), 4);
    assert_eq!(flash.path(), path.as_path());

    let mut buf = vec![0u8; PAGE_LEN];
    flash.read(2, &mut buf).unwrap();
    assert_eq!(buf, vec![0x5A; PAGE_LEN]);

    flash.read(1, &mut buf).unwrap();
    assert_eq!(buf, vec![0xFF; PAGE_LEN]);
}

#[test]
fn test_file_flash_erase_and_range() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("flash.img");
    let mut flash = FileFlash::create(&path, 2, PAGE_LEN).unwrap();

    flash.write(0, &[0u8; PAGE_LEN]).unwrap();
    flash.erase(0).unwrap();

    let mut buf = vec![0u8; PAGE_LEN];
    flash.read(0, &mut buf).unwrap();
    assert_eq!(buf, vec![0xFF; PAGE_LEN]);
    assert!(flash.read(2, &mut buf).is_err());
}

#[test]
fn test_file_flash_open_rejects_bad_geometry() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("flash.img");
    FileFlash::create(&path, 3, PAGE_LEN).unwrap();

    assert!(FileFlash::open(&path, PAGE_LEN + 2).is_err());
    assert!(FileFlash::open(&temp_dir.path().join("missing.img"), PAGE_LEN).is_err());
}

#[test]
fn test_repair_persists_across_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("flash.img");
    let pair = TwinPair::new(0, 1, 0, 0);

    // First boot: format the pair
    {
        let mut region = vec![0u8; PAGE_LEN * 2];
        let device = FileFlash::create(&path, 2, PAGE_LEN).unwrap();
        let mut high = HighLevel::with_device(device, settings(2), &mut region).unwrap();
        high.buff(BufferId::A).unwrap().data[..3].copy_from_slice(b"cfg");
        high.flush_twin(BufferId::A, &pair).unwrap();
    }

    // Simulate a half-finished backup write while powered off
    {
        let mut flash = FileFlash::open(&path, PAGE_LEN).unwrap();
        flash.write(1, &[0x00; PAGE_LEN]).unwrap();
    }

    // Second boot: repair
    {
        let mut region = vec![0u8; PAGE_LEN * 2];
        let device = FileFlash::open(&path, PAGE_LEN).unwrap();
        let mut high = HighLevel::with_device(device, settings(2), &mut region).unwrap();
        assert_eq!(
            high.verify_pair(&pair).unwrap(),
            TwinStatus::OkRecovered(Repair::BackupFromOrigin)
        );
    }

    // Third boot: nothing left to do
    let mut region = vec![0u8; PAGE_LEN * 2];
    let device = FileFlash::open(&path, PAGE_LEN).unwrap();
    let mut high = HighLevel::with_device(device, settings(2), &mut region).unwrap();
    assert_eq!(high.verify_pair(&pair).unwrap(), TwinStatus::Ok);
    assert_eq!(&high.buff(BufferId::A).unwrap().data[..3], b"cfg");
}
