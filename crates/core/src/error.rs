use crate::appointment::AppointmentStatus;
use std::fmt;

/// The kinds of document held in the booking store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Doctor,
    Patient,
    Appointment,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Doctor => "doctor",
            RecordKind::Patient => "patient",
            RecordKind::Appointment => "appointment",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0} not found")]
    NotFound(RecordKind),
    #[error("doctor is not available for booking")]
    Unavailable,
    #[error("slot {time} on {date} is already booked")]
    SlotTaken { date: String, time: String },
    #[error("payment verification failed")]
    PaymentVerificationFailed,
    #[error("not authorised: {0}")]
    Unauthorized(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("cannot {action} an appointment that is {from}")]
    InvalidTransition {
        from: AppointmentStatus,
        action: &'static str,
    },
    #[error("appointment must be paid before it can be completed")]
    PaymentRequired,
    #[error("email is already registered")]
    EmailTaken,
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("payment gateway error: {0}")]
    PaymentGateway(String),
    #[error("failed to hash password: {0}")]
    PasswordHash(String),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to lock the data directory: {0}")]
    StorageLock(std::io::Error),
    #[error("failed to write document: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read document: {0}")]
    FileRead(std::io::Error),
    #[error("failed to remove document: {0}")]
    FileRemove(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("document schema mismatch in {path} at {field}: {message}")]
    YamlDeserialization {
        path: String,
        field: String,
        message: String,
    },
    #[error(
        "write failed and rollback also failed (path: {path}): write={write_error}; rollback={rollback_error}",
        path = path.display()
    )]
    RollbackAfterWriteFailed {
        path: std::path::PathBuf,
        #[source]
        write_error: Box<BookingError>,
        rollback_error: Box<BookingError>,
    },

    #[error(transparent)]
    Uuid(#[from] docplus_uuid::UuidError),
    #[error(transparent)]
    Text(#[from] docplus_types::TextError),
}

impl BookingError {
    /// True for failures caused by the caller's request rather than by storage or a
    /// collaborator.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            BookingError::PaymentGateway(_)
                | BookingError::PasswordHash(_)
                | BookingError::StorageDirCreation(_)
                | BookingError::StorageLock(_)
                | BookingError::FileWrite(_)
                | BookingError::FileRead(_)
                | BookingError::FileRemove(_)
                | BookingError::YamlSerialization(_)
                | BookingError::YamlDeserialization { .. }
                | BookingError::RollbackAfterWriteFailed { .. }
        )
    }
}

pub type BookingResult<T> = std::result::Result<T, BookingError>;
