//! Appointment slots and the per-doctor booked-slot set.
//!
//! A slot is a (date, time-label) pair. Dates use `YYYY-MM-DD`; time labels use the
//! 12-hour `hh:mm AM|PM` form that clients display, e.g. `10:00 AM`.
//!
//! [`BookedSlots`] is owned by the doctor aggregate. Its mutators are crate-private: only the
//! reservation and lifecycle services add or release slots.

use crate::constants::{DEFAULT_SLOT_TIMES, SLOT_DATE_FORMAT, SLOT_TIME_FORMAT};
use crate::error::{BookingError, BookingResult};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Calendar date of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotDate(NaiveDate);

impl SlotDate {
    /// Parses a `YYYY-MM-DD` date.
    pub fn parse(input: &str) -> BookingResult<Self> {
        NaiveDate::parse_from_str(input.trim(), SLOT_DATE_FORMAT)
            .map(Self)
            .map_err(|_| {
                BookingError::InvalidInput(format!(
                    "slot date must be formatted YYYY-MM-DD, got '{}'",
                    input
                ))
            })
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for SlotDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for SlotDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(SLOT_DATE_FORMAT))
    }
}

impl FromStr for SlotDate {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SlotDate::parse(s)
    }
}

/// Time label of a slot, ordered chronologically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotTime(NaiveTime);

impl SlotTime {
    /// Parses an `hh:mm AM|PM` label. Parsing is case-insensitive on the meridiem; the
    /// rendered label is always upper case with a zero-padded hour.
    pub fn parse(input: &str) -> BookingResult<Self> {
        let normalised = input.trim().to_ascii_uppercase();
        NaiveTime::parse_from_str(&normalised, SLOT_TIME_FORMAT)
            .map(Self)
            .map_err(|_| {
                BookingError::InvalidInput(format!(
                    "slot time must be formatted like '10:00 AM', got '{}'",
                    input
                ))
            })
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(SLOT_TIME_FORMAT))
    }
}

impl FromStr for SlotTime {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SlotTime::parse(s)
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                <$ty>::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(SlotDate);
string_serde!(SlotTime);

/// The fixed daily set of times a doctor can be booked at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfferedSlots(Vec<SlotTime>);

impl OfferedSlots {
    /// Builds the offered set from labels, rejecting empty lists and duplicates.
    pub fn new<I, S>(labels: I) -> BookingResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut times = Vec::new();
        for label in labels {
            let time = SlotTime::parse(label.as_ref())?;
            if times.contains(&time) {
                return Err(BookingError::InvalidInput(format!(
                    "slot time '{}' is listed twice",
                    time
                )));
            }
            times.push(time);
        }

        if times.is_empty() {
            return Err(BookingError::InvalidInput(
                "at least one slot time must be offered".into(),
            ));
        }

        times.sort();
        Ok(Self(times))
    }

    pub fn contains(&self, time: &SlotTime) -> bool {
        self.0.contains(time)
    }

    pub fn times(&self) -> &[SlotTime] {
        &self.0
    }
}

impl Default for OfferedSlots {
    fn default() -> Self {
        // The default labels are compile-time constants in the accepted format.
        Self(
            DEFAULT_SLOT_TIMES
                .iter()
                .filter_map(|label| SlotTime::parse(label).ok())
                .collect(),
        )
    }
}

/// Per-date sets of booked times for one doctor.
///
/// A date whose last slot is released keeps an empty entry; lookups treat a missing date and
/// an empty date identically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookedSlots(BTreeMap<SlotDate, BTreeSet<SlotTime>>);

impl BookedSlots {
    pub fn is_booked(&self, date: &SlotDate, time: &SlotTime) -> bool {
        self.0.get(date).is_some_and(|times| times.contains(time))
    }

    /// Booked times on `date`, in chronological order.
    pub fn on(&self, date: &SlotDate) -> Vec<SlotTime> {
        self.0
            .get(date)
            .map(|times| times.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Iterates every date entry, including emptied ones.
    pub fn iter(&self) -> impl Iterator<Item = (&SlotDate, &BTreeSet<SlotTime>)> {
        self.0.iter()
    }

    /// Total number of booked slots across all dates.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds a slot. Returns `false` if it was already booked.
    pub(crate) fn reserve(&mut self, date: SlotDate, time: SlotTime) -> bool {
        self.0.entry(date).or_default().insert(time)
    }

    /// Removes a slot. Returns `false` if it was not booked.
    pub(crate) fn release(&mut self, date: &SlotDate, time: &SlotTime) -> bool {
        self.0
            .get_mut(date)
            .is_some_and(|times| times.remove(time))
    }
}
