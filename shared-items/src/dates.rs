//! Calendar-day helpers shared by the activity counter and the entities.
//!
//! Persisted day keys use the `Mon Jan 01 2024` form. ISO dates and RFC 3339
//! timestamps are accepted on input and normalised to their calendar day.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ItemError, Result};

const DAY_KEY_FORMAT: &str = "%a %b %d %Y";
const ISO_FORMAT: &str = "%Y-%m-%d";

/// Parse any accepted day representation into a calendar day
pub fn parse_day(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();

    if let Ok(day) = NaiveDate::parse_from_str(trimmed, DAY_KEY_FORMAT) {
        return Ok(day);
    }
    if let Ok(day) = NaiveDate::parse_from_str(trimmed, ISO_FORMAT) {
        return Ok(day);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.date_naive());
    }

    Err(ItemError::InvalidDate(input.to_string()))
}

/// Render the persisted day key
pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_KEY_FORMAT).to_string()
}

/// Midnight UTC at the start of `day`
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Whole days from `start` to `end`; negative when `end` is earlier
pub fn elapsed_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Window unit of a goal or rolling aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrame {
    Day,
    Week,
    Month,
    Year,
}

impl TimeFrame {
    pub fn days(&self) -> u32 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl FromStr for TimeFrame {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "days" => Ok(Self::Day),
            "week" | "weeks" => Ok(Self::Week),
            "month" | "months" => Ok(Self::Month),
            "year" | "years" => Ok(Self::Year),
            _ => Err(ItemError::InvalidTimeFrame(s.to_string())),
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an aggregate is a plain sum or a per-day average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateMode {
    #[default]
    Total,
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}


/// Serde helpers for timestamps stored by different clients: RFC 3339
/// strings, epoch milliseconds, or `{ seconds, nanoseconds }` objects.
pub mod timestamp {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        Millis(i64),
        Parts {
            seconds: i64,
            #[serde(default)]
            nanoseconds: u32,
        },
    }

    fn resolve(raw: RawTimestamp) -> Result<DateTime<Utc>, String> {
        match raw {
            RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|ts| ts.with_timezone(&Utc))
                .or_else(|_| super::parse_day(&text).map(super::start_of_day))
                .map_err(|_| format!("invalid timestamp: {text}")),
            RawTimestamp::Millis(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| format!("timestamp out of range: {ms}")),
            RawTimestamp::Parts { seconds, nanoseconds } => Utc
                .timestamp_opt(seconds, nanoseconds)
                .single()
                .ok_or_else(|| format!("timestamp out of range: {seconds}")),
        }
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = RawTimestamp::deserialize(deserializer)?;
        resolve(raw).map_err(D::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => serializer.serialize_some(&ts.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
            raw.map(resolve).transpose().map_err(D::Error::custom)
        }
    }

}
