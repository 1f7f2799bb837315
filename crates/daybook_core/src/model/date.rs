//! Calendar day value used as the note grouping key.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar day, serialized as `YYYY-MM-DD`.
///
/// Ordering is chronological, which keeps date-keyed maps in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

/// Rejected calendar date text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDateError {
    pub value: String,
}

impl Display for InvalidDateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid calendar date `{}`; expected YYYY-MM-DD", self.value)
    }
}

impl Error for InvalidDateError {}

impl CalendarDate {
    /// Builds a date from year/month/day, `None` when it does not exist.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn parse(value: &str) -> Result<Self, InvalidDateError> {
        let trimmed = value.trim();
        // chrono accepts unpadded fields; the wire format does not.
        if trimmed.len() != 10 {
            return Err(InvalidDateError {
                value: value.to_string(),
            });
        }
        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(Self)
            .map_err(|_| InvalidDateError {
                value: value.to_string(),
            })
    }
}

impl Display for CalendarDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for CalendarDate {
    type Err = InvalidDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
