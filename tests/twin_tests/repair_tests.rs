//! Tests for the twin-page verify/repair protocol
//!
//! These tests verify:
//! - Every row of the decision table
//! - Idempotence: a second call after a successful one returns `Ok`
//! - Unrecoverable pairs are left untouched
//! - Interrupted repairs (write failure, power loss) converge on re-run
//! - Subtype handling between origin and backup slots

use twinstor::device::RamFlash;
use twinstor::page::{decode_meta, encode_meta, BufferId, PageMeta, ScratchPair};
use twinstor::twin::{verify_and_repair, Repair, TwinPair, TwinStatus};
use twinstor::{CallbackOp, ErrorKind};

const PAGE_LEN: usize = 40;
const TOTAL_PAGES: u32 = 4;
const RETRIES: u32 = 1;

// =============================================================================
// Helper Functions
// =============================================================================

fn flash() -> RamFlash {
    RamFlash::new(TOTAL_PAGES, PAGE_LEN)
}

/// A sealed page whose user data is filled with `fill`
fn valid_page(dev: &mut RamFlash, fill: u8, subtype: u8) -> Vec<u8> {
    let mut page = vec![fill; PAGE_LEN];
    encode_meta(&mut page, &PageMeta::new(1, 1, subtype).with_use_field(0, fill as u32), dev)
        .unwrap();
    page
}

fn garbage_page() -> Vec<u8> {
    (0..PAGE_LEN).map(|i| (i * 7) as u8).collect()
}

fn run(dev: &mut RamFlash, pair: &TwinPair) -> twinstor::Result<TwinStatus> {
    let mut region = vec![0u8; PAGE_LEN * 2];
    let mut scratch = ScratchPair::split(&mut region, PAGE_LEN).unwrap();
    verify_and_repair(dev, &mut scratch, pair, TOTAL_PAGES, RETRIES)
}

fn pair_0_2() -> TwinPair {
    TwinPair::new(0, 2, 0, 0)
}

// =============================================================================
// Decision Table
// =============================================================================

#[test]
fn test_identical_valid_pages_need_no_write() {
    let mut dev = flash();
    let page = valid_page(&mut dev, 0x11, 0);
    dev.set_page(0, &page);
    dev.set_page(2, &page);
    dev.reset_counters();

    assert_eq!(run(&mut dev, &pair_0_2()).unwrap(), TwinStatus::Ok);
    assert_eq!(dev.calls(CallbackOp::Write), 0);
    assert_eq!(dev.calls(CallbackOp::Erase), 0);
}

#[test]
fn test_diverging_valid_pages_origin_wins() {
    let mut dev = flash();
    let v1 = valid_page(&mut dev, 0x01, 0);
    let v2 = valid_page(&mut dev, 0x02, 0);
    dev.set_page(0, &v1);
    dev.set_page(2, &v2);

    let status = run(&mut dev, &pair_0_2()).unwrap();

    assert_eq!(status, TwinStatus::OkRecovered(Repair::BackupFromOrigin));
    assert_eq!(dev.page(0), v1.as_slice());
    assert_eq!(dev.page(2), v1.as_slice());
}

#[test]
fn test_corrupted_origin_restored_from_backup() {
    let mut dev = flash();
    let v2 = valid_page(&mut dev, 0x22, 0);
    dev.set_page(0, &garbage_page());
    dev.set_page(2, &v2);

    let status = run(&mut dev, &pair_0_2()).unwrap();

    assert_eq!(status, TwinStatus::OkRecovered(Repair::OriginFromBackup));
    assert_eq!(dev.page(0), v2.as_slice());
    assert_eq!(dev.page(2), v2.as_slice());
}

#[test]
fn test_corrupted_backup_restored_from_origin() {
    let mut dev = flash();
    let v1 = valid_page(&mut dev, 0x33, 0);
    dev.set_page(0, &v1);
    // Backup left blank: never written

    let status = run(&mut dev, &pair_0_2()).unwrap();

    assert_eq!(status, TwinStatus::OkRecovered(Repair::BackupFromOrigin));
    assert_eq!(dev.page(2), v1.as_slice());
}

#[test]
fn test_both_invalid_is_not_valid_and_untouched() {
    let mut dev = flash();
    dev.set_page(0, &garbage_page());
    dev.reset_counters();

    let status = run(&mut dev, &pair_0_2()).unwrap();

    assert_eq!(status, TwinStatus::NotValid);
    assert!(!status.is_usable());
    assert_eq!(dev.calls(CallbackOp::Write), 0);
    assert_eq!(dev.calls(CallbackOp::Erase), 0);
    assert_eq!(dev.page(0), garbage_page().as_slice());
    assert!(dev.is_blank(2));
}

// =============================================================================
// Idempotence / Convergence
// =============================================================================

#[test]
fn test_second_call_after_recovery_is_ok() {
    let mut dev = flash();
    let v1 = valid_page(&mut dev, 0x44, 0);
    dev.set_page(0, &v1);
    dev.corrupt_byte(0, 3);
    dev.set_page(2, &v1);

    assert!(matches!(run(&mut dev, &pair_0_2()).unwrap(), TwinStatus::OkRecovered(_)));
    assert_eq!(run(&mut dev, &pair_0_2()).unwrap(), TwinStatus::Ok);
}

#[test]
fn test_repair_write_failure_surfaces_then_converges() {
    let mut dev = flash();
    let v1 = valid_page(&mut dev, 0x55, 0);
    dev.set_page(0, &v1);

    // Every write attempt of this call fails
    dev.fail_next(CallbackOp::Write, RETRIES + 1);
    let err = run(&mut dev, &pair_0_2()).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::callback(CallbackOp::Write, 2));

    assert_eq!(
        run(&mut dev, &pair_0_2()).unwrap(),
        TwinStatus::OkRecovered(Repair::BackupFromOrigin)
    );
    assert_eq!(run(&mut dev, &pair_0_2()).unwrap(), TwinStatus::Ok);
}

#[test]
fn test_power_loss_during_repair_converges() {
    let mut dev = flash();
    let v2 = valid_page(&mut dev, 0x66, 0);
    dev.set_page(0, &garbage_page());
    dev.set_page(2, &v2);

    // Power is cut half-way through rewriting origin, and stays off
    dev.tear_next_write(PAGE_LEN / 2);
    dev.fail_next(CallbackOp::Write, RETRIES);
    assert!(run(&mut dev, &pair_0_2()).is_err());
    assert_ne!(dev.page(0), v2.as_slice());

    // Next boot: backup still intact, origin rebuilt from it
    assert_eq!(
        run(&mut dev, &pair_0_2()).unwrap(),
        TwinStatus::OkRecovered(Repair::OriginFromBackup)
    );
    assert_eq!(dev.page(0), v2.as_slice());
}

#[test]
fn test_read_failure_is_error_not_invalid() {
    let mut dev = flash();
    dev.fail_next(CallbackOp::Read, RETRIES + 1);
    let err = run(&mut dev, &pair_0_2()).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::callback(CallbackOp::Read, 0));
}

#[test]
fn test_origin_and_backup_have_independent_read_budgets() {
    let mut dev = flash();
    let v1 = valid_page(&mut dev, 0x77, 0);
    dev.set_page(0, &v1);
    dev.set_page(2, &v1);

    // Origin consumes its whole retry; backup still gets a full budget
    dev.fail_next(CallbackOp::Read, RETRIES);
    assert_eq!(run(&mut dev, &pair_0_2()).unwrap(), TwinStatus::Ok);
}

// =============================================================================
// Subtypes
// =============================================================================

#[test]
fn test_pages_differing_only_in_subtype_are_identical() {
    let mut dev = flash();
    let origin = valid_page(&mut dev, 0x10, 0xA0);
    let backup = valid_page(&mut dev, 0x10, 0xB0);
    dev.set_page(1, &origin);
    dev.set_page(3, &backup);

    let pair = TwinPair::new(1, 3, 0xA0, 0xB0);
    assert_eq!(run(&mut dev, &pair).unwrap(), TwinStatus::Ok);
}

#[test]
fn test_copy_relabels_subtype_for_destination() {
    let mut dev = flash();
    let origin = valid_page(&mut dev, 0x20, 0xA0);
    dev.set_page(1, &origin);

    let pair = TwinPair::new(1, 3, 0xA0, 0xB0);
    assert_eq!(
        run(&mut dev, &pair).unwrap(),
        TwinStatus::OkRecovered(Repair::BackupFromOrigin)
    );

    let backup_meta = decode_meta(dev.page(3)).unwrap();
    assert_eq!(backup_meta.subtype, 0xB0);
    assert_eq!(&dev.page(3)[..8], &origin[..8]);
    // Origin untouched
    assert_eq!(dev.page(1), origin.as_slice());
    assert_eq!(run(&mut dev, &pair).unwrap(), TwinStatus::Ok);
}

#[test]
fn test_foreign_subtype_counts_as_invalid() {
    let mut dev = flash();
    let backup = valid_page(&mut dev, 0x30, 0xB0);
    // Origin slot holds a valid page that belongs to another role
    let stray = valid_page(&mut dev, 0x99, 0xEE);
    dev.set_page(1, &stray);
    dev.set_page(3, &backup);

    let pair = TwinPair::new(1, 3, 0xA0, 0xB0);
    assert_eq!(
        run(&mut dev, &pair).unwrap(),
        TwinStatus::OkRecovered(Repair::OriginFromBackup)
    );
    let origin_meta = decode_meta(dev.page(1)).unwrap();
    assert_eq!(origin_meta.subtype, 0xA0);
    assert_eq!(origin_meta.use_fields[0], 0x30);
}

// =============================================================================
// Buffers / Arguments
// =============================================================================

#[test]
fn test_buffer_a_holds_origin_after_repair() {
    let mut dev = flash();
    let v2 = valid_page(&mut dev, 0x42, 0x0B);
    dev.set_page(2, &v2);

    let mut region = vec![0u8; PAGE_LEN * 2];
    let mut scratch = ScratchPair::split(&mut region, PAGE_LEN).unwrap();
    let pair = TwinPair::new(0, 2, 0x0A, 0x0B);
    verify_and_repair(&mut dev, &mut scratch, &pair, TOTAL_PAGES, RETRIES).unwrap();

    assert_eq!(scratch.get(BufferId::A), dev.page(0));
    assert_eq!(decode_meta(scratch.get(BufferId::A)).unwrap().subtype, 0x0A);
}

#[test]
fn test_bad_pair_arguments() {
    let mut dev = flash();
    let err = run(&mut dev, &TwinPair::new(1, 1, 0, 0)).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::BadParam(_)));

    let err = run(&mut dev, &TwinPair::new(0, TOTAL_PAGES, 0, 0)).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::BadParam(_)));
    assert_eq!(dev.calls(CallbackOp::Read), 0);
}
