//! Patient account records.

use crate::doctor::Address;
use chrono::{DateTime, NaiveDate, Utc};
use docplus_types::{EmailAddress, NonEmptyText};
use docplus_uuid::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Patient {
    pub id: RecordId,
    pub name: NonEmptyText,
    pub email: EmailAddress,
    password_hash: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Replacement values for the editable part of a patient profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientProfileUpdate {
    pub name: NonEmptyText,
    pub phone: NonEmptyText,
    pub address: Address,
    pub dob: NaiveDate,
    pub gender: NonEmptyText,
    pub image: Option<String>,
}

impl Patient {
    pub(crate) fn new(name: NonEmptyText, email: EmailAddress, password_hash: String) -> Self {
        Self {
            id: RecordId::new(),
            name,
            email,
            password_hash,
            image: None,
            phone: None,
            address: Address::default(),
            gender: None,
            dob: None,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub(crate) fn apply_update(&mut self, update: PatientProfileUpdate) {
        self.name = update.name;
        self.phone = Some(update.phone.into_string());
        self.address = update.address;
        self.dob = Some(update.dob);
        self.gender = Some(update.gender.into_string());
        if update.image.is_some() {
            self.image = update.image;
        }
    }
}
