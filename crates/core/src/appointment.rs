//! Appointment records and their lifecycle state machine.
//!
//! ```text
//!   Pending ──pay──▶ Paid ──complete──▶ Completed
//!      │               │
//!      └────cancel─────┴──▶ Cancelled
//! ```
//!
//! `Completed` and `Cancelled` are terminal. Repeating the event that produced the current
//! state (paying a paid appointment, completing a completed one, cancelling a cancelled one)
//! is accepted as a no-op so that retried requests never double-release a slot.

use crate::error::{BookingError, BookingResult};
use crate::slot::{SlotDate, SlotTime};
use chrono::{DateTime, Utc};
use docplus_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an appointment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Paid,
    Completed,
    Cancelled,
}

/// Events that drive [`AppointmentStatus`] transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    PaymentConfirmed,
    Complete,
    Cancel,
}

impl LifecycleEvent {
    fn verb(self) -> &'static str {
        match self {
            LifecycleEvent::PaymentConfirmed => "pay for",
            LifecycleEvent::Complete => "complete",
            LifecycleEvent::Cancel => "cancel",
        }
    }
}

impl AppointmentStatus {
    /// Applies `event`, returning the next state or the reason the edge is illegal.
    pub fn apply(self, event: LifecycleEvent) -> BookingResult<AppointmentStatus> {
        use AppointmentStatus::*;
        use LifecycleEvent::*;

        match (self, event) {
            (Pending, PaymentConfirmed) | (Paid, PaymentConfirmed) => Ok(Paid),
            (Pending, Complete) => Err(BookingError::PaymentRequired),
            (Paid, Complete) | (Completed, Complete) => Ok(Completed),
            (Pending, Cancel) | (Paid, Cancel) | (Cancelled, Cancel) => Ok(Cancelled),
            (from, event) => Err(BookingError::InvalidTransition {
                from,
                action: event.verb(),
            }),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    /// Whether the appointment still holds its slot.
    pub fn holds_slot(self) -> bool {
        self != AppointmentStatus::Cancelled
    }

    /// Whether money has been collected for the appointment.
    pub fn is_paid(self) -> bool {
        matches!(self, AppointmentStatus::Paid | AppointmentStatus::Completed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Paid => "paid",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A booked appointment.
///
/// `amount` is copied from the doctor's fees when the slot is reserved and never changes
/// afterwards. `status` is only changed through the lifecycle service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Appointment {
    pub id: RecordId,
    pub doctor_id: RecordId,
    pub patient_id: RecordId,
    pub doctor_name: String,
    pub patient_name: String,
    pub slot_date: SlotDate,
    pub slot_time: SlotTime,
    pub amount: u64,
    status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) struct NewAppointment {
    pub doctor_id: RecordId,
    pub patient_id: RecordId,
    pub doctor_name: String,
    pub patient_name: String,
    pub slot_date: SlotDate,
    pub slot_time: SlotTime,
    pub amount: u64,
}

impl Appointment {
    pub(crate) fn pending(new: NewAppointment) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::new(),
            doctor_id: new.doctor_id,
            patient_id: new.patient_id,
            doctor_name: new.doctor_name,
            patient_name: new.patient_name,
            slot_date: new.slot_date,
            slot_time: new.slot_time,
            amount: new.amount,
            status: AppointmentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    /// Applies `event` to this appointment. Returns `true` if the status changed.
    pub(crate) fn transition(&mut self, event: LifecycleEvent) -> BookingResult<bool> {
        let next = self.status.apply(event)?;
        if next == self.status {
            return Ok(false);
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;
    use LifecycleEvent::*;

    #[test]
    fn test_happy_path_transitions() {
        assert_eq!(Pending.apply(PaymentConfirmed).unwrap(), Paid);
        assert_eq!(Paid.apply(Complete).unwrap(), Completed);
        assert_eq!(Pending.apply(Cancel).unwrap(), Cancelled);
        assert_eq!(Paid.apply(Cancel).unwrap(), Cancelled);
    }

    #[test]
    fn test_repeated_events_are_no_ops() {
        assert_eq!(Paid.apply(PaymentConfirmed).unwrap(), Paid);
        assert_eq!(Completed.apply(Complete).unwrap(), Completed);
        assert_eq!(Cancelled.apply(Cancel).unwrap(), Cancelled);
    }

    #[test]
    fn test_complete_requires_payment() {
        assert!(matches!(
            Pending.apply(Complete),
            Err(BookingError::PaymentRequired)
        ));
    }

    #[test]
    fn test_terminal_states_reject_other_edges() {
        let illegal = [
            (Completed, PaymentConfirmed),
            (Completed, Cancel),
            (Cancelled, PaymentConfirmed),
            (Cancelled, Complete),
        ];

        for (from, event) in illegal {
            match from.apply(event) {
                Err(BookingError::InvalidTransition { from: f, .. }) => assert_eq!(f, from),
                other => panic!("expected {from:?} + {event:?} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_status_predicates() {
        assert!(Pending.holds_slot() && Paid.holds_slot() && Completed.holds_slot());
        assert!(!Cancelled.holds_slot());
        assert!(Paid.is_paid() && Completed.is_paid());
        assert!(!Pending.is_paid() && !Cancelled.is_paid());
        assert!(Completed.is_terminal() && Cancelled.is_terminal());
    }

    #[test]
    fn test_transition_reports_change_and_touches_updated_at() {
        let mut appointment = Appointment::pending(NewAppointment {
            doctor_id: RecordId::new(),
            patient_id: RecordId::new(),
            doctor_name: "Dr. Rao".into(),
            patient_name: "Asha".into(),
            slot_date: SlotDate::parse("2024-01-10").unwrap(),
            slot_time: SlotTime::parse("10:00 AM").unwrap(),
            amount: 500,
        });
        let created = appointment.updated_at;

        assert!(appointment.transition(Cancel).unwrap());
        assert_eq!(appointment.status(), Cancelled);
        assert!(appointment.updated_at >= created);

        assert!(!appointment.transition(Cancel).unwrap());
    }

    #[test]
    fn test_error_message_names_state_and_action() {
        let err = Completed.apply(Cancel).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot cancel an appointment that is completed"
        );
    }
}
