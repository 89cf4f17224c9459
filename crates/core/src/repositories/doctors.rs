//! Doctor directory.
//!
//! Admins add doctors and toggle their availability; doctors log in and edit the mutable part
//! of their profile; everyone can browse the public listing.
//!
//! Booked slots are never touched here. Profile updates load the doctor under the store write
//! lock and write back the same document, so a concurrent reservation cannot be lost.

use crate::credentials::{hash_password, verify_password};
use crate::doctor::{Address, Doctor, DoctorProfile, Fees};
use crate::error::{BookingError, BookingResult};
use crate::store::DocumentStore;
use docplus_types::EmailAddress;
use docplus_uuid::RecordId;

/// Optional changes a doctor can make to their own profile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DoctorProfilePatch {
    pub fees: Option<Fees>,
    pub address: Option<Address>,
    pub available: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct DoctorService {
    store: DocumentStore,
}

impl DoctorService {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Adds a doctor account.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidInput`] if the password is too short.
    /// - [`BookingError::EmailTaken`] if another doctor already uses `email`.
    pub fn add(
        &self,
        profile: DoctorProfile,
        email: EmailAddress,
        password: &str,
    ) -> BookingResult<Doctor> {
        let password_hash = hash_password(password)?;

        let _guard = self.store.write_lock()?;
        if self.find_by_email(&email).is_some() {
            return Err(BookingError::EmailTaken);
        }

        let doctor = Doctor::new(profile, email, password_hash);
        self.store.save(&doctor)?;

        tracing::info!(doctor_id = %doctor.id, "doctor added");
        Ok(doctor)
    }

    /// Public listing, optionally restricted to one speciality (case-insensitive).
    pub fn list(&self, speciality: Option<&str>) -> Vec<Doctor> {
        let wanted = speciality
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut doctors: Vec<Doctor> = self
            .store
            .list::<Doctor>()
            .into_iter()
            .filter(|d| match &wanted {
                Some(w) => d.speciality.as_str().to_lowercase() == *w,
                None => true,
            })
            .collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        doctors
    }

    /// Every doctor, oldest first.
    pub fn all(&self) -> Vec<Doctor> {
        let mut doctors = self.store.list::<Doctor>();
        doctors.sort_by_key(|d| d.created_at);
        doctors
    }

    pub fn get(&self, id: &RecordId) -> BookingResult<Doctor> {
        self.store.load(id)
    }

    /// Checks doctor credentials.
    pub fn login(&self, email: &EmailAddress, password: &str) -> BookingResult<Doctor> {
        match self.find_by_email(email) {
            Some(doctor) if verify_password(password, doctor.password_hash()) => Ok(doctor),
            _ => Err(BookingError::InvalidCredentials),
        }
    }

    /// Flips the doctor's availability flag and returns the updated record.
    pub fn change_availability(&self, id: &RecordId) -> BookingResult<Doctor> {
        let _guard = self.store.write_lock()?;
        let mut doctor: Doctor = self.store.load(id)?;
        doctor.available = !doctor.available;
        self.store.save(&doctor)?;

        tracing::info!(doctor_id = %doctor.id, available = doctor.available, "availability changed");
        Ok(doctor)
    }

    /// Applies a profile patch.
    ///
    /// A fee change only affects appointments booked afterwards.
    pub fn update_profile(
        &self,
        id: &RecordId,
        patch: DoctorProfilePatch,
    ) -> BookingResult<Doctor> {
        let _guard = self.store.write_lock()?;
        let mut doctor: Doctor = self.store.load(id)?;

        if let Some(fees) = patch.fees {
            doctor.fees = fees;
        }
        if let Some(address) = patch.address {
            doctor.address = address;
        }
        if let Some(available) = patch.available {
            doctor.available = available;
        }

        self.store.save(&doctor)?;
        Ok(doctor)
    }

    fn find_by_email(&self, email: &EmailAddress) -> Option<Doctor> {
        self.store
            .list::<Doctor>()
            .into_iter()
            .find(|d| d.email == *email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::*;
    use tempfile::TempDir;

    fn email(s: &str) -> EmailAddress {
        EmailAddress::parse(s).unwrap()
    }

    #[test]
    fn test_add_doctor_starts_available_with_no_bookings() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = DoctorService::new(test_store(temp_dir.path()));

        let doctor = service
            .add(doctor_profile("Dr Sarah Patel", 600), email("sarah@clinic.io"), "s3cure-pass")
            .expect("add should succeed");

        assert!(doctor.available);
        assert!(doctor.booked_slots().is_empty());
        assert_eq!(service.get(&doctor.id).unwrap(), doctor);
    }

    #[test]
    fn test_add_doctor_rejects_duplicate_email() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = DoctorService::new(test_store(temp_dir.path()));

        service
            .add(doctor_profile("Dr A", 100), email("dup@clinic.io"), "password-1")
            .unwrap();
        let err = service
            .add(doctor_profile("Dr B", 100), email("DUP@clinic.io"), "password-2")
            .unwrap_err();

        assert!(matches!(err, BookingError::EmailTaken));
        assert_eq!(service.all().len(), 1);
    }

    #[test]
    fn test_list_filters_by_speciality_case_insensitively() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        let service = DoctorService::new(store.clone());

        seed_doctor(&store, "Dr Gp", 300);
        let mut profile = doctor_profile("Dr Skin", 400);
        profile.speciality = docplus_types::NonEmptyText::new("Dermatologist").unwrap();
        service
            .add(profile, email("skin@clinic.io"), "password-1")
            .unwrap();

        assert_eq!(service.list(None).len(), 2);
        let derm = service.list(Some("dermatologist"));
        assert_eq!(derm.len(), 1);
        assert_eq!(derm[0].name.as_str(), "Dr Skin");
        assert_eq!(service.list(Some("  ")).len(), 2);
    }

    #[test]
    fn test_login_checks_password() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = DoctorService::new(test_store(temp_dir.path()));
        let added = service
            .add(doctor_profile("Dr Login", 250), email("login@clinic.io"), "right-password")
            .unwrap();

        let logged_in = service
            .login(&email("login@clinic.io"), "right-password")
            .unwrap();
        assert_eq!(logged_in.id, added.id);

        assert!(matches!(
            service.login(&email("login@clinic.io"), "wrong-password"),
            Err(BookingError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login(&email("nobody@clinic.io"), "right-password"),
            Err(BookingError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_change_availability_toggles() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        let service = DoctorService::new(store.clone());
        let doctor = seed_doctor(&store, "Dr Toggle", 300);

        assert!(!service.change_availability(&doctor.id).unwrap().available);
        assert!(service.change_availability(&doctor.id).unwrap().available);
        assert!(matches!(
            service.change_availability(&RecordId::new()),
            Err(BookingError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_profile_applies_only_given_fields() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        let service = DoctorService::new(store.clone());
        let doctor = seed_doctor(&store, "Dr Patch", 300);

        let updated = service
            .update_profile(
                &doctor.id,
                DoctorProfilePatch {
                    fees: Some(Fees::new(450).unwrap()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.fees.amount(), 450);
        assert_eq!(updated.address, doctor.address);
        assert!(updated.available);
    }
}
