//! Record identifiers and sharded-path utilities.
//!
//! Every DocPlus document (doctor, patient, appointment) is addressed by a [`RecordId`]: a
//! version 4 UUID held in a *canonical* representation of **32 lowercase hexadecimal
//! characters** with no hyphens, e.g. `550e8400e29b41d4a716446655440000`.
//!
//! Canonical form is required for identifiers supplied from outside the process (API bodies,
//! session tokens, CLI arguments). Hyphenated or uppercase forms are rejected rather than
//! normalised so that one record never has two spellings on disk.
//!
//! ## Sharded directory layout
//! For a canonical id `u`, documents live under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `booking_data/doctors/55/0e/550e8400e29b41d4a716446655440000/doctor.yaml`
//!
//! This keeps the fan-out of any one directory small as collections grow.

mod service;

pub use service::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("invalid record id: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
