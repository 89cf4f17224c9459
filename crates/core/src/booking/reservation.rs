//! Slot reservation.
//!
//! `reserve` checks and claims a slot in one critical section:
//!
//! 1. the time must be one of the offered daily slots,
//! 2. the patient and doctor must exist,
//! 3. the doctor must be available,
//! 4. the slot must not already be in the doctor's booked set for that date.
//!
//! The appointment document is written first, then the doctor document with the slot added.
//! If the doctor write fails the appointment is removed again.

use super::compensate;
use crate::appointment::{Appointment, NewAppointment};
use crate::doctor::Doctor;
use crate::error::{BookingError, BookingResult};
use crate::patient::Patient;
use crate::slot::{SlotDate, SlotTime};
use crate::store::DocumentStore;
use docplus_uuid::RecordId;

/// A request to book `doctor_id` at `slot_date`/`slot_time` for `patient_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReservationRequest {
    pub doctor_id: RecordId,
    pub patient_id: RecordId,
    pub slot_date: SlotDate,
    pub slot_time: SlotTime,
}

#[derive(Clone, Debug)]
pub struct ReservationService {
    store: DocumentStore,
}

impl ReservationService {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Books a slot, returning the new `Pending` appointment.
    ///
    /// The appointment amount is the doctor's fee at this moment and never changes later.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidInput`] if the time is not an offered slot.
    /// - [`BookingError::NotFound`] if the patient or doctor does not exist.
    /// - [`BookingError::Unavailable`] if the doctor is not taking bookings.
    /// - [`BookingError::SlotTaken`] if the slot is already booked. Nothing is written.
    pub fn reserve(&self, request: ReservationRequest) -> BookingResult<Appointment> {
        let ReservationRequest {
            doctor_id,
            patient_id,
            slot_date,
            slot_time,
        } = request;

        if !self.store.config().offered_slots().contains(&slot_time) {
            return Err(BookingError::InvalidInput(format!(
                "{slot_time} is not an offered appointment time"
            )));
        }

        let _guard = self.store.write_lock()?;

        let patient: Patient = self.store.load(&patient_id)?;
        let mut doctor: Doctor = self.store.load(&doctor_id)?;

        if !doctor.available {
            return Err(BookingError::Unavailable);
        }

        if !doctor.reserve_slot(slot_date, slot_time) {
            return Err(BookingError::SlotTaken {
                date: slot_date.to_string(),
                time: slot_time.to_string(),
            });
        }

        let appointment = Appointment::pending(NewAppointment {
            doctor_id,
            patient_id,
            doctor_name: doctor.name.as_str().to_string(),
            patient_name: patient.name.as_str().to_string(),
            slot_date,
            slot_time,
            amount: doctor.fees.amount(),
        });

        self.store.save(&appointment)?;

        if let Err(write_error) = self.store.save(&doctor) {
            let path = self.store.document_path::<Doctor>(&doctor_id);
            return Err(compensate(path, write_error, || {
                self.store.remove::<Appointment>(&appointment.id)
            }));
        }

        tracing::info!(
            appointment_id = %appointment.id,
            doctor_id = %doctor_id,
            slot = %format_args!("{} {}", slot_date, slot_time),
            "slot reserved"
        );

        Ok(appointment)
    }
}
