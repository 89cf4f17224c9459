//! Slot reservation and the appointment lifecycle.
//!
//! These are the only services that change a doctor's booked slots or an appointment's
//! status. Each change that spans the doctor document and the appointment document runs
//! under [`DocumentStore::write_lock`](crate::store::DocumentStore::write_lock), and a failed
//! second write is compensated by undoing the first.

pub mod lifecycle;
pub mod reservation;

use crate::error::{BookingError, BookingResult};
use std::path::PathBuf;

/// Runs `undo` after `write_error`, folding both failures together if the undo also fails.
fn compensate(
    path: PathBuf,
    write_error: BookingError,
    undo: impl FnOnce() -> BookingResult<()>,
) -> BookingError {
    match undo() {
        Ok(()) => {
            tracing::warn!("write to {} failed and was rolled back: {}", path.display(), write_error);
            write_error
        }
        Err(rollback_error) => {
            tracing::error!(
                "write to {} failed and rollback failed: write={}; rollback={}",
                path.display(),
                write_error,
                rollback_error
            );
            BookingError::RollbackAfterWriteFailed {
                path,
                write_error: Box::new(write_error),
                rollback_error: Box::new(rollback_error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compensate_returns_write_error_when_undo_succeeds() {
        let err = compensate(
            PathBuf::from("doctor.yaml"),
            BookingError::FileWrite(std::io::Error::other("disk full")),
            || Ok(()),
        );
        assert!(matches!(err, BookingError::FileWrite(_)));
    }

    #[test]
    fn test_compensate_reports_both_failures() {
        let err = compensate(
            PathBuf::from("doctor.yaml"),
            BookingError::FileWrite(std::io::Error::other("disk full")),
            || Err(BookingError::FileRemove(std::io::Error::other("read-only"))),
        );

        match err {
            BookingError::RollbackAfterWriteFailed {
                write_error,
                rollback_error,
                ..
            } => {
                assert!(matches!(*write_error, BookingError::FileWrite(_)));
                assert!(matches!(*rollback_error, BookingError::FileRemove(_)));
            }
            other => panic!("expected RollbackAfterWriteFailed, got {other:?}"),
        }
    }
}
