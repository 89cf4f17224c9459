//! Constants used throughout the DocPlus core crate.
//!
//! Storage layout names live here so that the store, the CLI, and tests agree on where each
//! document kind is kept.

/// Default directory for booking data when none is configured.
pub const DEFAULT_DATA_DIR: &str = "booking_data";

/// Collection directory for doctor documents.
pub const DOCTORS_DIR_NAME: &str = "doctors";

/// Collection directory for patient documents.
pub const PATIENTS_DIR_NAME: &str = "patients";

/// Collection directory for appointment documents.
pub const APPOINTMENTS_DIR_NAME: &str = "appointments";

/// Advisory lock file in the data directory, held by every process while it writes.
pub const WRITE_LOCK_FILENAME: &str = ".write.lock";

/// Filename of a doctor document inside its sharded directory.
pub const DOCTOR_FILENAME: &str = "doctor.yaml";

/// Filename of a patient document inside its sharded directory.
pub const PATIENT_FILENAME: &str = "patient.yaml";

/// Filename of an appointment document inside its sharded directory.
pub const APPOINTMENT_FILENAME: &str = "appointment.yaml";

/// Default settlement currency for payment orders.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Minor units per major currency unit (paise per rupee, cents per dollar).
pub const MINOR_UNITS_PER_MAJOR: u64 = 100;

/// Daily appointment times offered when no override is configured.
pub const DEFAULT_SLOT_TIMES: [&str; 8] = [
    "09:00 AM", "10:00 AM", "11:00 AM", "12:00 PM", "02:00 PM", "03:00 PM", "04:00 PM",
    "05:00 PM",
];

/// Wire format for slot dates.
pub const SLOT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Wire format for slot time labels.
pub const SLOT_TIME_FORMAT: &str = "%I:%M %p";

/// Minimum accepted password length for patient and doctor accounts.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Number of appointments shown in dashboard "latest" lists.
pub const LATEST_APPOINTMENTS_LIMIT: usize = 5;
