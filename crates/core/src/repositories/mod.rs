//! Directory services for doctors and patients, and appointment read queries.
//!
//! Slot reservation and status changes live in [`crate::booking`]; nothing here mutates a
//! doctor's booked slots or an appointment's status.

pub mod appointments;
pub mod doctors;
pub mod patients;
