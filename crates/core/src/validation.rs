//! Input validation helpers.
//!
//! Services receive raw strings from the API and CLI layers. These helpers turn them into
//! validated types while naming the offending field in the error message.

use crate::error::{BookingError, BookingResult};
use chrono::NaiveDate;
use docplus_types::{EmailAddress, NonEmptyText, TextError};
use docplus_uuid::RecordId;

/// Requires a non-blank value for `field`.
pub fn required_text(field: &str, value: &str) -> BookingResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|_| BookingError::InvalidInput(format!("{field} is required")))
}

/// Parses an email address for `field`.
pub fn email(field: &str, value: &str) -> BookingResult<EmailAddress> {
    EmailAddress::parse(value).map_err(|e| match e {
        TextError::Empty => BookingError::InvalidInput(format!("{field} is required")),
        other => BookingError::InvalidInput(other.to_string()),
    })
}

/// Parses a record id for `field`.
pub fn record_id(field: &str, value: &str) -> BookingResult<RecordId> {
    RecordId::parse(value.trim())
        .map_err(|_| BookingError::InvalidInput(format!("{field} is not a valid id")))
}

/// Parses an ISO `YYYY-MM-DD` date for `field`.
pub fn iso_date(field: &str, value: &str) -> BookingResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| BookingError::InvalidInput(format!("{field} must be formatted YYYY-MM-DD")))
}

/// Treats blank optional strings as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_names_field() {
        let err = required_text("speciality", "  ").unwrap_err();
        assert_eq!(err.to_string(), "invalid input: speciality is required");
    }

    #[test]
    fn test_email_errors() {
        assert_eq!(
            email("email", "").unwrap_err().to_string(),
            "invalid input: email is required"
        );
        assert!(email("email", "nobody").is_err());
        assert_eq!(email("email", "A@B.io").unwrap().as_str(), "a@b.io");
    }

    #[test]
    fn test_record_id_trims_and_validates() {
        assert!(record_id("docId", " 550e8400e29b41d4a716446655440000 ").is_ok());
        assert_eq!(
            record_id("docId", "42").unwrap_err().to_string(),
            "invalid input: docId is not a valid id"
        );
    }

    #[test]
    fn test_optional_text_drops_blank() {
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(Some(" x ".into())), Some("x".into()));
        assert_eq!(optional_text(None), None);
    }
}
