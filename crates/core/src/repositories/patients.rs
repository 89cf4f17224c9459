//! Patient directory: registration, login and profile maintenance.

use crate::credentials::{hash_password, verify_password};
use crate::error::{BookingError, BookingResult};
use crate::patient::{Patient, PatientProfileUpdate};
use crate::store::DocumentStore;
use docplus_types::{EmailAddress, NonEmptyText};
use docplus_uuid::RecordId;

#[derive(Clone, Debug)]
pub struct PatientService {
    store: DocumentStore,
}

impl PatientService {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Creates a patient account.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidInput`] if the password is too short.
    /// - [`BookingError::EmailTaken`] if the email is already registered.
    pub fn register(
        &self,
        name: NonEmptyText,
        email: EmailAddress,
        password: &str,
    ) -> BookingResult<Patient> {
        let password_hash = hash_password(password)?;

        let _guard = self.store.write_lock()?;
        if self.find_by_email(&email).is_some() {
            return Err(BookingError::EmailTaken);
        }

        let patient = Patient::new(name, email, password_hash);
        self.store.save(&patient)?;

        tracing::info!(patient_id = %patient.id, "patient registered");
        Ok(patient)
    }

    pub fn login(&self, email: &EmailAddress, password: &str) -> BookingResult<Patient> {
        match self.find_by_email(email) {
            Some(patient) if verify_password(password, patient.password_hash()) => Ok(patient),
            _ => Err(BookingError::InvalidCredentials),
        }
    }

    pub fn profile(&self, id: &RecordId) -> BookingResult<Patient> {
        self.store.load(id)
    }

    pub fn update_profile(
        &self,
        id: &RecordId,
        update: PatientProfileUpdate,
    ) -> BookingResult<Patient> {
        let _guard = self.store.write_lock()?;
        let mut patient: Patient = self.store.load(id)?;
        patient.apply_update(update);
        self.store.save(&patient)?;
        Ok(patient)
    }

    /// Number of registered patients.
    pub fn count(&self) -> usize {
        self.store.list::<Patient>().len()
    }

    fn find_by_email(&self, email: &EmailAddress) -> Option<Patient> {
        self.store
            .list::<Patient>()
            .into_iter()
            .find(|p| p.email == *email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctor::Address;
    use crate::store::test_support::test_store;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn text(s: &str) -> NonEmptyText {
        NonEmptyText::new(s).unwrap()
    }

    fn email(s: &str) -> EmailAddress {
        EmailAddress::parse(s).unwrap()
    }

    #[test]
    fn test_register_then_login() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = PatientService::new(test_store(temp_dir.path()));

        let patient = service
            .register(text("Asha Rao"), email("asha@mail.io"), "asha-password")
            .expect("register should succeed");

        let again = service.login(&email("ASHA@mail.io"), "asha-password").unwrap();
        assert_eq!(again.id, patient.id);
        assert!(matches!(
            service.login(&email("asha@mail.io"), "nope-nope"),
            Err(BookingError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_register_rejects_taken_email_and_weak_password() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = PatientService::new(test_store(temp_dir.path()));

        service
            .register(text("First"), email("same@mail.io"), "password-1")
            .unwrap();
        assert!(matches!(
            service.register(text("Second"), email("same@mail.io"), "password-2"),
            Err(BookingError::EmailTaken)
        ));
        assert!(matches!(
            service.register(text("Third"), email("third@mail.io"), "short"),
            Err(BookingError::InvalidInput(_))
        ));
        assert_eq!(service.count(), 1);
    }

    #[test]
    fn test_update_profile_replaces_fields() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = PatientService::new(test_store(temp_dir.path()));
        let patient = service
            .register(text("Bilal"), email("bilal@mail.io"), "bilal-password")
            .unwrap();

        let updated = service
            .update_profile(
                &patient.id,
                PatientProfileUpdate {
                    name: text("Bilal Khan"),
                    phone: text("9000000000"),
                    address: Address {
                        line1: "12 Park Street".into(),
                        line2: String::new(),
                    },
                    dob: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
                    gender: text("Male"),
                    image: None,
                },
            )
            .unwrap();

        assert_eq!(updated.name.as_str(), "Bilal Khan");
        assert_eq!(updated.phone.as_deref(), Some("9000000000"));
        assert_eq!(service.profile(&patient.id).unwrap(), updated);
    }
}
