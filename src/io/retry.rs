//! Erase / write-verify / read with bounded retries

use tracing::{debug, error, warn};

use crate::device::{DeviceFault, PageDevice};
use crate::error::{CallbackOp, ErrorKind, Layer, Result, StorError};

/// Why a single write-verify attempt failed
enum AttemptFailure {
    Callback(CallbackOp, DeviceFault),
    Mismatch,
}

impl AttemptFailure {
    fn into_kind(self, page: u32) -> ErrorKind {
        match self {
            AttemptFailure::Callback(op, _) => ErrorKind::callback(op, page),
            AttemptFailure::Mismatch => ErrorKind::WriteVerifyMismatch { page },
        }
    }
}

/// Erase `page`, retrying up to `retries` extra times
pub fn erase_page<D: PageDevice + ?Sized>(device: &mut D, page: u32, retries: u32) -> Result<()> {
    for attempt in 0..=retries {
        match device.erase(page) {
            Ok(()) => {
                debug!(page, attempt, "erased page");
                return Ok(());
            }
            Err(fault) => warn!(page, attempt, %fault, "erase failed"),
        }
    }

    error!(page, retries, "erase retry budget exhausted");
    Err(StorError::new(Layer::Low, ErrorKind::callback(CallbackOp::Erase, page)))
}

/// Read `page` into `buf`, retrying up to `retries` extra times
pub fn read_page<D: PageDevice + ?Sized>(
    device: &mut D,
    page: u32,
    buf: &mut [u8],
    retries: u32,
) -> Result<()> {
    for attempt in 0..=retries {
        match device.read(page, buf) {
            Ok(()) => {
                debug!(page, attempt, "read page");
                return Ok(());
            }
            Err(fault) => warn!(page, attempt, %fault, "read failed"),
        }
    }

    error!(page, retries, "read retry budget exhausted");
    Err(StorError::new(Layer::Low, ErrorKind::callback(CallbackOp::Read, page)))
}

/// Erase, write, read back and compare, retried as a unit.
///
/// `read_buf` receives the read-back copy; its previous content is lost.
pub fn write_verify_page<D: PageDevice + ?Sized>(
    device: &mut D,
    write_buf: &[u8],
    read_buf: &mut [u8],
    page: u32,
    retries: u32,
) -> Result<()> {
    if write_buf.len() != read_buf.len() {
        return Err(StorError::new(
            Layer::Low,
            ErrorKind::BadParam(format!(
                "write buffer is {} bytes, read-back buffer is {}",
                write_buf.len(),
                read_buf.len()
            )),
        ));
    }

    let mut last = AttemptFailure::Mismatch;
    for attempt in 0..=retries {
        match write_verify_once(device, write_buf, read_buf, page) {
            Ok(()) => {
                debug!(page, attempt, "write verified");
                return Ok(());
            }
            Err(failure) => {
                match &failure {
                    AttemptFailure::Callback(op, fault) => {
                        warn!(page, attempt, %op, %fault, "write-verify step failed")
                    }
                    AttemptFailure::Mismatch => {
                        warn!(page, attempt, "read-back does not match written data")
                    }
                }
                last = failure;
            }
        }
    }

    let kind = last.into_kind(page);
    error!(page, retries, %kind, "write-verify retry budget exhausted");
    Err(StorError::new(Layer::Low, kind))
}

fn write_verify_once<D: PageDevice + ?Sized>(
    device: &mut D,
    write_buf: &[u8],
    read_buf: &mut [u8],
    page: u32,
) -> std::result::Result<(), AttemptFailure> {
    device
        .erase(page)
        .map_err(|f| AttemptFailure::Callback(CallbackOp::Erase, f))?;
    device
        .write(page, write_buf)
        .map_err(|f| AttemptFailure::Callback(CallbackOp::Write, f))?;
    device
        .read(page, read_buf)
        .map_err(|f| AttemptFailure::Callback(CallbackOp::Read, f))?;

    if read_buf != write_buf {
        return Err(AttemptFailure::Mismatch);
    }
    Ok(())
}
