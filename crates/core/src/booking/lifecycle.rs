//! Appointment lifecycle manager.
//!
//! Owns every status change of an appointment:
//!
//! - `initiate_payment` opens a gateway order for a `Pending` appointment.
//! - `confirm_payment` verifies the checkout callback and moves `Pending` to `Paid`.
//! - `complete` moves `Paid` to `Completed`.
//! - `cancel` moves `Pending` or `Paid` to `Cancelled` and releases the doctor's slot.
//!
//! Gateway calls are awaited before the store write lock is taken; the lock is only held
//! inside the synchronous load-transition-save helpers.

use super::compensate;
use crate::actor::Actor;
use crate::appointment::{Appointment, AppointmentStatus, LifecycleEvent};
use crate::constants::MINOR_UNITS_PER_MAJOR;
use crate::doctor::Doctor;
use crate::error::{BookingError, BookingResult};
use crate::payment::{PaymentGateway, PaymentOrder};
use crate::store::DocumentStore;
use docplus_uuid::RecordId;
use std::sync::Arc;

/// Checkout callback values returned by the client after paying.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Clone)]
pub struct LifecycleService {
    store: DocumentStore,
    gateway: Arc<dyn PaymentGateway>,
}

impl LifecycleService {
    pub fn new(store: DocumentStore, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    /// Opens a payment order for the caller's own `Pending` appointment.
    ///
    /// The order amount is the locked appointment amount in minor units and the receipt is the
    /// appointment id. The appointment itself is not modified.
    pub async fn initiate_payment(
        &self,
        actor: Actor,
        appointment_id: &RecordId,
    ) -> BookingResult<PaymentOrder> {
        let appointment: Appointment = self.store.load(appointment_id)?;
        if !actor.is_patient(&appointment.patient_id) {
            return Err(BookingError::Unauthorized(
                "only the booking patient can pay for this appointment".into(),
            ));
        }

        if appointment.status() != AppointmentStatus::Pending {
            return Err(BookingError::InvalidTransition {
                from: appointment.status(),
                action: "pay for",
            });
        }

        let minor_units = appointment
            .amount
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .ok_or_else(|| BookingError::InvalidInput("appointment amount is too large".into()))?;

        let order = self
            .gateway
            .create_order(
                minor_units,
                self.store.config().currency(),
                &appointment.id.to_string(),
            )
            .await?;

        tracing::info!(
            appointment_id = %appointment.id,
            order_id = %order.id,
            gateway = self.gateway.name(),
            "payment order created"
        );
        Ok(order)
    }

    /// Verifies a checkout callback and marks the appointment paid.
    ///
    /// # Errors
    ///
    /// - [`BookingError::PaymentVerificationFailed`] if the signature is wrong or the order was
    ///   opened for a different appointment. The appointment is left unchanged.
    /// - [`BookingError::InvalidTransition`] if the appointment is cancelled or completed.
    pub async fn confirm_payment(
        &self,
        actor: Actor,
        appointment_id: &RecordId,
        confirmation: PaymentConfirmation,
    ) -> BookingResult<Appointment> {
        let appointment: Appointment = self.store.load(appointment_id)?;
        if !actor.is_patient(&appointment.patient_id) {
            return Err(BookingError::Unauthorized(
                "only the booking patient can confirm this payment".into(),
            ));
        }

        if !self.gateway.verify(
            &confirmation.order_id,
            &confirmation.payment_id,
            &confirmation.signature,
        ) {
            tracing::warn!(appointment_id = %appointment_id, "payment signature rejected");
            return Err(BookingError::PaymentVerificationFailed);
        }

        let order = self.gateway.fetch_order(&confirmation.order_id).await?;
        if order.receipt != appointment_id.to_string() {
            tracing::warn!(
                appointment_id = %appointment_id,
                order_id = %order.id,
                "payment order belongs to another appointment"
            );
            return Err(BookingError::PaymentVerificationFailed);
        }

        self.mark_paid(actor, appointment_id, &confirmation.payment_id)
    }

    /// Verifies a checkout callback that names only the order, resolving the appointment
    /// from the order receipt.
    pub async fn confirm_order_payment(
        &self,
        actor: Actor,
        confirmation: PaymentConfirmation,
    ) -> BookingResult<Appointment> {
        if !self.gateway.verify(
            &confirmation.order_id,
            &confirmation.payment_id,
            &confirmation.signature,
        ) {
            tracing::warn!(order_id = %confirmation.order_id, "payment signature rejected");
            return Err(BookingError::PaymentVerificationFailed);
        }

        let order = self.gateway.fetch_order(&confirmation.order_id).await?;
        let appointment_id = RecordId::parse(&order.receipt)
            .map_err(|_| BookingError::PaymentVerificationFailed)?;

        self.mark_paid(actor, &appointment_id, &confirmation.payment_id)
    }

    fn mark_paid(
        &self,
        actor: Actor,
        appointment_id: &RecordId,
        payment_id: &str,
    ) -> BookingResult<Appointment> {
        let paid = self.transition(appointment_id, LifecycleEvent::PaymentConfirmed, |appointment| {
            if actor.is_patient(&appointment.patient_id) {
                Ok(())
            } else {
                Err(BookingError::Unauthorized(
                    "only the booking patient can confirm this payment".into(),
                ))
            }
        })?;
        tracing::info!(appointment_id = %appointment_id, payment_id = %payment_id, "payment confirmed");
        Ok(paid)
    }

    /// Marks a paid appointment completed. Allowed for the assigned doctor or an admin.
    pub fn complete(&self, actor: Actor, appointment_id: &RecordId) -> BookingResult<Appointment> {
        self.transition(appointment_id, LifecycleEvent::Complete, |appointment| {
            if actor.is_admin() || actor.is_doctor(&appointment.doctor_id) {
                Ok(())
            } else {
                Err(BookingError::Unauthorized(
                    "only the assigned doctor or an admin can complete this appointment".into(),
                ))
            }
        })
    }

    /// Cancels an appointment and releases its slot.
    ///
    /// Allowed for the booking patient, the assigned doctor or an admin. Cancelling an
    /// already cancelled appointment returns it unchanged and releases nothing.
    pub fn cancel(&self, actor: Actor, appointment_id: &RecordId) -> BookingResult<Appointment> {
        let _guard = self.store.write_lock()?;

        let original: Appointment = self.store.load(appointment_id)?;
        if !(actor.is_admin()
            || actor.is_patient(&original.patient_id)
            || actor.is_doctor(&original.doctor_id))
        {
            return Err(BookingError::Unauthorized(
                "not a party to this appointment".into(),
            ));
        }

        let mut cancelled = original.clone();
        if !cancelled.transition(LifecycleEvent::Cancel)? {
            return Ok(cancelled);
        }

        let mut doctor: Doctor = self.store.load(&original.doctor_id)?;
        if !doctor.release_slot(&original.slot_date, &original.slot_time) {
            tracing::warn!(
                appointment_id = %original.id,
                doctor_id = %doctor.id,
                "cancelled appointment held no booked slot"
            );
        }

        self.store.save(&cancelled)?;

        if let Err(write_error) = self.store.save(&doctor) {
            let path = self.store.document_path::<Doctor>(&doctor.id);
            return Err(compensate(path, write_error, || self.store.save(&original)));
        }

        tracing::info!(
            appointment_id = %cancelled.id,
            by = ?actor,
            "appointment cancelled"
        );
        Ok(cancelled)
    }

    /// Applies a single-document status change under the write lock.
    fn transition(
        &self,
        appointment_id: &RecordId,
        event: LifecycleEvent,
        authorise: impl FnOnce(&Appointment) -> BookingResult<()>,
    ) -> BookingResult<Appointment> {
        let _guard = self.store.write_lock()?;

        let mut appointment: Appointment = self.store.load(appointment_id)?;
        authorise(&appointment)?;

        if appointment.transition(event)? {
            self.store.save(&appointment)?;
        }
        Ok(appointment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::reservation::{ReservationRequest, ReservationService};
    use crate::patient::Patient;
    use crate::payment::SandboxGateway;
    use crate::slot::{SlotDate, SlotTime};
    use crate::store::test_support::*;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        store: DocumentStore,
        gateway: Arc<SandboxGateway>,
        lifecycle: LifecycleService,
        reservations: ReservationService,
        doctor: Doctor,
        patient: Patient,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        let gateway = Arc::new(SandboxGateway::new("sandbox-secret"));
        let lifecycle = LifecycleService::new(store.clone(), gateway.clone());
        let reservations = ReservationService::new(store.clone());
        let doctor = seed_doctor(&store, "Dr Life", 500);
        let patient = seed_patient(&store, "Asha");

        Fixture {
            _temp_dir: temp_dir,
            store,
            gateway,
            lifecycle,
            reservations,
            doctor,
            patient,
        }
    }

    fn slot(date: &str, time: &str) -> (SlotDate, SlotTime) {
        (SlotDate::parse(date).unwrap(), SlotTime::parse(time).unwrap())
    }

    impl Fixture {
        fn book(&self, patient: &Patient, date: &str, time: &str) -> BookingResult<Appointment> {
            let (slot_date, slot_time) = slot(date, time);
            self.reservations.reserve(ReservationRequest {
                doctor_id: self.doctor.id,
                patient_id: patient.id,
                slot_date,
                slot_time,
            })
        }

        fn booked_on(&self, date: &str) -> Vec<SlotTime> {
            let doctor: Doctor = self.store.load(&self.doctor.id).unwrap();
            doctor.booked_slots().on(&SlotDate::parse(date).unwrap())
        }

        async fn pay(&self, appointment: &Appointment) -> BookingResult<Appointment> {
            let patient = Actor::Patient(appointment.patient_id);
            let order = self.lifecycle.initiate_payment(patient, &appointment.id).await?;
            let (payment_id, signature) = self.gateway.checkout(&order.id)?;
            self.lifecycle
                .confirm_payment(
                    patient,
                    &appointment.id,
                    PaymentConfirmation {
                        order_id: order.id,
                        payment_id,
                        signature,
                    },
                )
                .await
        }
    }

    #[test]
    fn test_booking_scenario_cancel_frees_slot_for_rebooking() {
        let fx = fixture();
        let patient_b = seed_patient(&fx.store, "Bilal");

        let first = fx.book(&fx.patient, "2024-01-10", "10:00 AM").unwrap();
        assert_eq!(first.amount, 500);
        assert_eq!(fx.booked_on("2024-01-10"), vec![SlotTime::parse("10:00 AM").unwrap()]);

        assert!(matches!(
            fx.book(&patient_b, "2024-01-10", "10:00 AM"),
            Err(BookingError::SlotTaken { .. })
        ));

        let cancelled = fx
            .lifecycle
            .cancel(Actor::Patient(fx.patient.id), &first.id)
            .unwrap();
        assert_eq!(cancelled.status(), AppointmentStatus::Cancelled);
        assert!(fx.booked_on("2024-01-10").is_empty());

        let doctor: Doctor = fx.store.load(&fx.doctor.id).unwrap();
        assert!(
            doctor.booked_slots().iter().any(|(d, times)| d.to_string() == "2024-01-10" && times.is_empty()),
            "emptied date entry should remain"
        );

        let second = fx.book(&patient_b, "2024-01-10", "10:00 AM").unwrap();
        assert_eq!(second.patient_id, patient_b.id);
    }

    #[test]
    fn test_cancel_twice_is_a_no_op() {
        let fx = fixture();
        let appointment = fx.book(&fx.patient, "2024-01-11", "09:00 AM").unwrap();
        let admin = Actor::Admin;

        let first = fx.lifecycle.cancel(admin, &appointment.id).unwrap();
        let rebooked = fx.book(&seed_patient(&fx.store, "Chen"), "2024-01-11", "09:00 AM").unwrap();

        let second = fx.lifecycle.cancel(admin, &appointment.id).unwrap();
        assert_eq!(second, first);
        assert_eq!(
            fx.booked_on("2024-01-11"),
            vec![rebooked.slot_time],
            "a repeated cancel must not release the rebooked slot"
        );
    }

    #[test]
    fn test_failed_doctor_write_restores_the_appointment() {
        let fx = fixture();
        let appointment = fx.book(&fx.patient, "2024-01-12", "11:00 AM").unwrap();

        let blocker = fx
            .store
            .document_path::<Doctor>(&fx.doctor.id)
            .with_extension("yaml.tmp");
        std::fs::create_dir_all(&blocker).unwrap();

        let err = fx
            .lifecycle
            .cancel(Actor::Admin, &appointment.id)
            .expect_err("doctor write should fail");
        assert!(matches!(err, BookingError::FileWrite(_)), "got {err:?}");

        let stored: Appointment = fx.store.load(&appointment.id).unwrap();
        assert_eq!(stored.status(), AppointmentStatus::Pending);
        assert_eq!(fx.booked_on("2024-01-12"), vec![appointment.slot_time]);
        assert!(crate::audit::audit_slots(&fx.store).is_consistent());

        std::fs::remove_dir(&blocker).unwrap();
        let cancelled = fx.lifecycle.cancel(Actor::Admin, &appointment.id).unwrap();
        assert_eq!(cancelled.status(), AppointmentStatus::Cancelled);
        assert!(fx.booked_on("2024-01-12").is_empty());
    }

    #[test]
    fn test_cancel_requires_a_party_to_the_appointment() {
        let fx = fixture();
        let appointment = fx.book(&fx.patient, "2024-01-12", "09:00 AM").unwrap();

        let stranger = Actor::Patient(RecordId::new());
        assert!(matches!(
            fx.lifecycle.cancel(stranger, &appointment.id),
            Err(BookingError::Unauthorized(_))
        ));
        assert!(matches!(
            fx.lifecycle.cancel(Actor::Doctor(RecordId::new()), &appointment.id),
            Err(BookingError::Unauthorized(_))
        ));

        let by_doctor = fx
            .lifecycle
            .cancel(Actor::Doctor(fx.doctor.id), &appointment.id)
            .unwrap();
        assert_eq!(by_doctor.status(), AppointmentStatus::Cancelled);
    }

    #[test]
    fn test_complete_requires_payment() {
        let fx = fixture();
        let appointment = fx.book(&fx.patient, "2024-01-13", "02:00 PM").unwrap();

        assert!(matches!(
            fx.lifecycle.complete(Actor::Doctor(fx.doctor.id), &appointment.id),
            Err(BookingError::PaymentRequired)
        ));
        let stored: Appointment = fx.store.load(&appointment.id).unwrap();
        assert_eq!(stored.status(), AppointmentStatus::Pending);
    }

    #[tokio::test]
    async fn test_pay_then_complete_then_reject_cancel() {
        let fx = fixture();
        let appointment = fx.book(&fx.patient, "2024-01-14", "03:00 PM").unwrap();

        let paid = fx.pay(&appointment).await.unwrap();
        assert_eq!(paid.status(), AppointmentStatus::Paid);

        assert!(matches!(
            fx.lifecycle.complete(Actor::Patient(fx.patient.id), &appointment.id),
            Err(BookingError::Unauthorized(_))
        ));

        let completed = fx
            .lifecycle
            .complete(Actor::Doctor(fx.doctor.id), &appointment.id)
            .unwrap();
        assert_eq!(completed.status(), AppointmentStatus::Completed);

        let again = fx.lifecycle.complete(Actor::Admin, &appointment.id).unwrap();
        assert_eq!(again, completed);

        assert!(matches!(
            fx.lifecycle.cancel(Actor::Admin, &appointment.id),
            Err(BookingError::InvalidTransition { from: AppointmentStatus::Completed, .. })
        ));
        assert_eq!(fx.booked_on("2024-01-14").len(), 1, "completed appointment keeps its slot");
    }

    #[tokio::test]
    async fn test_initiate_payment_uses_locked_amount_in_minor_units() {
        let fx = fixture();
        let appointment = fx.book(&fx.patient, "2024-01-15", "04:00 PM").unwrap();

        let mut doctor: Doctor = fx.store.load(&fx.doctor.id).unwrap();
        doctor.fees = crate::doctor::Fees::new(900).unwrap();
        fx.store.save(&doctor).unwrap();

        let order = fx
            .lifecycle
            .initiate_payment(Actor::Patient(fx.patient.id), &appointment.id)
            .await
            .unwrap();
        assert_eq!(order.amount, 50_000);
        assert_eq!(order.currency, "INR");
        assert_eq!(order.receipt, appointment.id.to_string());

        assert!(matches!(
            fx.lifecycle
                .initiate_payment(Actor::Patient(RecordId::new()), &appointment.id)
                .await,
            Err(BookingError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_initiate_payment_only_from_pending() {
        let fx = fixture();
        let appointment = fx.book(&fx.patient, "2024-01-16", "05:00 PM").unwrap();
        fx.pay(&appointment).await.unwrap();

        assert!(matches!(
            fx.lifecycle
                .initiate_payment(Actor::Patient(fx.patient.id), &appointment.id)
                .await,
            Err(BookingError::InvalidTransition { from: AppointmentStatus::Paid, .. })
        ));
    }

    #[tokio::test]
    async fn test_confirm_payment_rejects_bad_signature_and_foreign_order() {
        let fx = fixture();
        let patient = Actor::Patient(fx.patient.id);
        let appointment = fx.book(&fx.patient, "2024-01-17", "09:00 AM").unwrap();
        let other = fx.book(&fx.patient, "2024-01-17", "10:00 AM").unwrap();

        let order = fx.lifecycle.initiate_payment(patient, &appointment.id).await.unwrap();
        let (payment_id, _) = fx.gateway.checkout(&order.id).unwrap();
        let forged = PaymentConfirmation {
            order_id: order.id.clone(),
            payment_id: payment_id.clone(),
            signature: "deadbeef".into(),
        };
        assert!(matches!(
            fx.lifecycle.confirm_payment(patient, &appointment.id, forged).await,
            Err(BookingError::PaymentVerificationFailed)
        ));

        let other_order = fx.lifecycle.initiate_payment(patient, &other.id).await.unwrap();
        let (other_payment, other_signature) = fx.gateway.checkout(&other_order.id).unwrap();
        let wrong_receipt = PaymentConfirmation {
            order_id: other_order.id,
            payment_id: other_payment,
            signature: other_signature,
        };
        assert!(matches!(
            fx.lifecycle
                .confirm_payment(patient, &appointment.id, wrong_receipt)
                .await,
            Err(BookingError::PaymentVerificationFailed)
        ));

        let stored: Appointment = fx.store.load(&appointment.id).unwrap();
        assert_eq!(stored.status(), AppointmentStatus::Pending);
    }

    #[tokio::test]
    async fn test_confirm_order_payment_resolves_appointment_from_receipt() {
        let fx = fixture();
        let patient = Actor::Patient(fx.patient.id);
        let appointment = fx.book(&fx.patient, "2024-01-20", "02:00 PM").unwrap();

        let order = fx.lifecycle.initiate_payment(patient, &appointment.id).await.unwrap();
        let (payment_id, signature) = fx.gateway.checkout(&order.id).unwrap();
        let confirmation = PaymentConfirmation {
            order_id: order.id,
            payment_id,
            signature,
        };

        assert!(matches!(
            fx.lifecycle
                .confirm_order_payment(Actor::Patient(RecordId::new()), confirmation.clone())
                .await,
            Err(BookingError::Unauthorized(_))
        ));

        let paid = fx
            .lifecycle
            .confirm_order_payment(patient, confirmation.clone())
            .await
            .unwrap();
        assert_eq!(paid.id, appointment.id);
        assert_eq!(paid.status(), AppointmentStatus::Paid);

        let again = fx
            .lifecycle
            .confirm_order_payment(patient, confirmation)
            .await
            .unwrap();
        assert_eq!(again, paid, "repeated confirmation is a no-op");
    }

    #[tokio::test]
    async fn test_confirm_payment_after_cancel_is_rejected() {
        let fx = fixture();
        let patient = Actor::Patient(fx.patient.id);
        let appointment = fx.book(&fx.patient, "2024-01-18", "11:00 AM").unwrap();

        let order = fx.lifecycle.initiate_payment(patient, &appointment.id).await.unwrap();
        fx.lifecycle.cancel(patient, &appointment.id).unwrap();

        let (payment_id, signature) = fx.gateway.checkout(&order.id).unwrap();
        let result = fx
            .lifecycle
            .confirm_payment(
                patient,
                &appointment.id,
                PaymentConfirmation {
                    order_id: order.id,
                    payment_id,
                    signature,
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(BookingError::InvalidTransition { from: AppointmentStatus::Cancelled, .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelling_paid_appointment_releases_slot() {
        let fx = fixture();
        let appointment = fx.book(&fx.patient, "2024-01-19", "12:00 PM").unwrap();
        fx.pay(&appointment).await.unwrap();

        let cancelled = fx
            .lifecycle
            .cancel(Actor::Patient(fx.patient.id), &appointment.id)
            .unwrap();
        assert_eq!(cancelled.status(), AppointmentStatus::Cancelled);
        assert!(fx.booked_on("2024-01-19").is_empty());
    }
}
