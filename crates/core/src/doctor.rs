//! The doctor aggregate.
//!
//! A doctor owns its [`BookedSlots`]. Code outside this crate can read the booked set but
//! cannot change it; inside the crate only the reservation and lifecycle services call the
//! slot mutators.

use crate::slot::{BookedSlots, SlotDate, SlotTime};
use chrono::{DateTime, Utc};
use docplus_types::{EmailAddress, NonEmptyText};
use docplus_uuid::RecordId;
use serde::{Deserialize, Serialize};

/// Postal address shared by doctor and patient records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
}

/// Consultation fee in major currency units. Always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Fees(u64);

impl Fees {
    pub fn new(amount: u64) -> crate::BookingResult<Self> {
        if amount == 0 {
            return Err(crate::BookingError::InvalidInput(
                "fees must be a positive amount".into(),
            ));
        }
        Ok(Self(amount))
    }

    pub fn amount(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for Fees {
    type Error = crate::BookingError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Fees::new(value)
    }
}

impl From<Fees> for u64 {
    fn from(fees: Fees) -> Self {
        fees.0
    }
}

/// Public profile fields of a doctor, supplied when an admin adds one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoctorProfile {
    pub name: NonEmptyText,
    pub speciality: NonEmptyText,
    pub degree: NonEmptyText,
    pub experience: NonEmptyText,
    pub about: NonEmptyText,
    pub fees: Fees,
    pub address: Address,
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Doctor {
    pub id: RecordId,
    pub name: NonEmptyText,
    pub email: EmailAddress,
    password_hash: String,
    #[serde(default)]
    pub image: Option<String>,
    pub speciality: NonEmptyText,
    pub degree: NonEmptyText,
    pub experience: NonEmptyText,
    pub about: NonEmptyText,
    pub available: bool,
    pub fees: Fees,
    #[serde(default)]
    pub address: Address,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    booked_slots: BookedSlots,
}

impl Doctor {
    pub(crate) fn new(profile: DoctorProfile, email: EmailAddress, password_hash: String) -> Self {
        Self {
            id: RecordId::new(),
            name: profile.name,
            email,
            password_hash,
            image: profile.image,
            speciality: profile.speciality,
            degree: profile.degree,
            experience: profile.experience,
            about: profile.about,
            available: true,
            fees: profile.fees,
            address: profile.address,
            created_at: Utc::now(),
            booked_slots: BookedSlots::default(),
        }
    }

    pub fn booked_slots(&self) -> &BookedSlots {
        &self.booked_slots
    }

    pub(crate) fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub(crate) fn reserve_slot(&mut self, date: SlotDate, time: SlotTime) -> bool {
        self.booked_slots.reserve(date, time)
    }

    pub(crate) fn release_slot(&mut self, date: &SlotDate, time: &SlotTime) -> bool {
        self.booked_slots.release(date, time)
    }
}
