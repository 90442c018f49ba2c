//! Lenient timestamp (de)serialization for backend listings.
//!
//! The backend emits ISO-8601 timestamps.  Depending on its database they
//! either carry an offset (RFC 3339) or are naive; naive values are read
//! as UTC.

use serde::{Deserialize, Deserializer, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Parse a backend timestamp.
pub fn parse(s: &str) -> Option<OffsetDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(dt);
    }
    let naive_t = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    let naive_space = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    PrimitiveDateTime::parse(s, naive_t)
        .or_else(|_| PrimitiveDateTime::parse(s, naive_space))
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// Deserialize a backend timestamp into an OffsetDateTime.
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}")))
}

/// Serialize an OffsetDateTime into an RFC 3339 formatted string.
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = datetime
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn rfc3339_with_offset() {
        assert_eq!(
            parse("2024-05-01T12:30:00.250000+00:00"),
            Some(datetime!(2024-05-01 12:30:00.25 UTC))
        );
    }

    #[test]
    fn naive_is_utc() {
        assert_eq!(
            parse("2024-05-01T12:30:00"),
            Some(datetime!(2024-05-01 12:30:00 UTC))
        );
        assert_eq!(
            parse("2024-05-01 12:30:00.5"),
            Some(datetime!(2024-05-01 12:30:00.5 UTC))
        );
    }

    #[test]
    fn garbage() {
        assert_eq!(parse("yesterday"), None);
    }
}
