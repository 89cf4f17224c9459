//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into services as
//! `Arc<CoreConfig>`. Request handling never reads environment variables.

use crate::constants::{
    APPOINTMENTS_DIR_NAME, DEFAULT_CURRENCY, DOCTORS_DIR_NAME, PATIENTS_DIR_NAME,
};
use crate::error::{BookingError, BookingResult};
use crate::slot::OfferedSlots;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    currency: String,
    offered_slots: OfferedSlots,
}

impl CoreConfig {
    pub fn new(
        data_dir: PathBuf,
        currency: String,
        offered_slots: OfferedSlots,
    ) -> BookingResult<Self> {
        let currency = currency.trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(BookingError::InvalidInput(format!(
                "currency must be a three-letter ISO 4217 code, got '{}'",
                currency
            )));
        }

        Ok(Self {
            data_dir,
            currency,
            offered_slots,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn doctors_dir(&self) -> PathBuf {
        self.data_dir.join(DOCTORS_DIR_NAME)
    }

    pub fn patients_dir(&self) -> PathBuf {
        self.data_dir.join(PATIENTS_DIR_NAME)
    }

    pub fn appointments_dir(&self) -> PathBuf {
        self.data_dir.join(APPOINTMENTS_DIR_NAME)
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn offered_slots(&self) -> &OfferedSlots {
        &self.offered_slots
    }
}

/// Parse the offered slot list from an optional comma-separated value.
///
/// `None` or a blank value yields the default daily slots.
pub fn offered_slots_from_env_value(value: Option<String>) -> BookingResult<OfferedSlots> {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(list) => OfferedSlots::new(list.split(',').map(str::trim)),
        None => Ok(OfferedSlots::default()),
    }
}

/// Parse the settlement currency, defaulting to [`DEFAULT_CURRENCY`].
pub fn currency_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotTime;

    #[test]
    fn test_currency_is_normalised() {
        let cfg = CoreConfig::new("data".into(), " usd ".into(), OfferedSlots::default()).unwrap();
        assert_eq!(cfg.currency(), "USD");
    }

    #[test]
    fn test_currency_must_be_three_letters() {
        assert!(CoreConfig::new("data".into(), "RUPEE".into(), OfferedSlots::default()).is_err());
        assert!(CoreConfig::new("data".into(), "I1R".into(), OfferedSlots::default()).is_err());
    }

    #[test]
    fn test_collection_dirs_hang_off_data_dir() {
        let cfg = CoreConfig::new("/srv/data".into(), "INR".into(), OfferedSlots::default())
            .unwrap();
        assert_eq!(cfg.doctors_dir(), PathBuf::from("/srv/data/doctors"));
        assert_eq!(cfg.patients_dir(), PathBuf::from("/srv/data/patients"));
        assert_eq!(cfg.appointments_dir(), PathBuf::from("/srv/data/appointments"));
    }

    #[test]
    fn test_offered_slots_from_env_value() {
        assert_eq!(
            offered_slots_from_env_value(None).unwrap(),
            OfferedSlots::default()
        );
        assert_eq!(
            offered_slots_from_env_value(Some("   ".into())).unwrap(),
            OfferedSlots::default()
        );

        let custom = offered_slots_from_env_value(Some("08:30 AM, 06:00 PM".into())).unwrap();
        assert_eq!(custom.times().len(), 2);
        assert!(custom.contains(&SlotTime::parse("06:00 PM").unwrap()));

        assert!(offered_slots_from_env_value(Some("noon".into())).is_err());
    }

    #[test]
    fn test_currency_from_env_value_defaults() {
        assert_eq!(currency_from_env_value(None), "INR");
        assert_eq!(currency_from_env_value(Some(" ".into())), "INR");
        assert_eq!(currency_from_env_value(Some("eur".into())), "eur");
    }
}
