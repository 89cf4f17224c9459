//! # DocPlus Core
//!
//! Domain model, storage and services for the DocPlus appointment booking system.
//!
//! This crate contains pure data operations over the booking data directory:
//! - Doctor and patient directories with hashed credentials
//! - Slot reservation against each doctor's booked-slot set
//! - The appointment lifecycle (`Pending → Paid → Completed`, or `→ Cancelled`)
//! - The payment bridge used to open and verify gateway orders
//! - Dashboards and an offline slot audit
//!
//! **No API concerns**: session tokens, HTTP routing and request DTOs belong in `api-shared`
//! and `api-rest`.

pub mod actor;
pub mod appointment;
pub mod audit;
pub mod booking;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod dashboard;
pub mod doctor;
pub mod error;
pub mod patient;
pub mod payment;
pub mod repositories;
pub mod slot;
pub mod store;
pub mod validation;

pub use actor::Actor;
pub use appointment::{Appointment, AppointmentStatus, LifecycleEvent};
pub use audit::{audit_slots, SlotAuditReport, SlotFinding, SlotIssue};
pub use booking::lifecycle::{LifecycleService, PaymentConfirmation};
pub use booking::reservation::{ReservationRequest, ReservationService};
pub use config::CoreConfig;
pub use dashboard::{AdminDashboard, DashboardService, DoctorDashboard};
pub use doctor::{Address, Doctor, DoctorProfile, Fees};
pub use error::{BookingError, BookingResult, RecordKind};
pub use patient::{Patient, PatientProfileUpdate};
pub use payment::{PaymentGateway, PaymentOrder, PaymentSettings, SandboxGateway};
pub use repositories::appointments::AppointmentQueries;
pub use repositories::doctors::{DoctorProfilePatch, DoctorService};
pub use repositories::patients::PatientService;
pub use slot::{BookedSlots, OfferedSlots, SlotDate, SlotTime};
pub use store::DocumentStore;

pub use docplus_types::{EmailAddress, NonEmptyText, TextError};
pub use docplus_uuid::RecordId;
