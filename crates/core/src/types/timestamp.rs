use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

// Integers above this are treated as milliseconds rather than seconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// A leniently parsed point in time.
///
/// Platform payloads disagree on how they encode time: RFC 3339 strings, naive
/// date-times, Unix seconds as numbers or as strings. Anything that cannot be
/// understood deserializes to an absent value instead of failing the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamp(Option<DateTime<Utc>>);

impl Timestamp {
    pub fn new(value: DateTime<Utc>) -> Self {
        Self(Some(value))
    }

    pub fn from_unix(value: i64) -> Self {
        let parsed = if value.abs() >= MILLIS_THRESHOLD {
            DateTime::from_timestamp_millis(value)
        } else {
            DateTime::from_timestamp(value, 0)
        };
        Self(parsed)
    }

    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Self(None);
        }
        if let Ok(seconds) = trimmed.parse::<i64>() {
            return Self::from_unix(seconds);
        }
        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Self::new(parsed.with_timezone(&Utc));
        }
        if let Ok(parsed) = DateTime::parse_from_rfc2822(trimmed) {
            return Self::new(parsed.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Self::new(parsed.and_utc());
            }
        }
        let midnight = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
        Self(midnight)
    }

    pub fn get(self) -> Option<DateTime<Utc>> {
        self.0
    }

    pub fn is_present(self) -> bool {
        self.0.is_some()
    }

    /// `self` when it holds a time, otherwise `other`.
    pub fn or(self, other: Timestamp) -> Timestamp {
        if self.is_present() { self } else { other }
    }

    pub fn or_epoch(self) -> DateTime<Utc> {
        self.0.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Text(String),
            Other(IgnoredAny),
        }

        let parsed = match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Int(value)) => Timestamp::from_unix(value),
            Some(Raw::Float(value)) if value.is_finite() => Timestamp::from_unix(value as i64),
            Some(Raw::Text(value)) => Timestamp::parse(&value),
            Some(Raw::Float(_)) | Some(Raw::Other(_)) | None => Timestamp::default(),
        };
        Ok(parsed)
    }
}
