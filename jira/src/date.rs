//! Conversion between UTC instants and the timestamp strings Jira reads and writes.
//!
//! Jira accepts most ISO 8601 variants when reading, but the worklog write endpoints only
//! accept `2025-03-10T09:05:00.000+0000`: milliseconds present and a numeric offset
//! without colon. A bare `Z` is rejected.
use chrono::{DateTime, FixedOffset, Utc};
use thiserror::Error;

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000%z";
const JIRA_READ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unable to parse '{0}' as a timestamp")]
pub struct TimestampError(pub String);

/// Formats an instant the way the Jira worklog write endpoints require it.
/// Sub-second precision is dropped.
#[must_use]
pub fn to_wire(instant: DateTime<Utc>) -> String {
    instant.format(WIRE_FORMAT).to_string()
}

/// Parses RFC 3339 timestamps as well as the Jira wire format.
///
/// # Errors
/// Returns [`TimestampError`] if neither format matches
pub fn parse_flexible(s: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = s.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::<FixedOffset>::parse_from_str(trimmed, JIRA_READ_FORMAT))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| TimestampError(s.to_string()))
}

/// Serde adapter for fields holding Jira timestamps
pub mod wire {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[allow(clippy::missing_errors_doc)]
    pub fn serialize<S>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_wire(*instant))
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_flexible(&s).map_err(de::Error::custom)
    }
}
