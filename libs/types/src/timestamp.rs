//! ISO-8601 timestamp serialization helpers
//!
//! The mobile clients historically emitted timestamps both with and
//! without fractional seconds, so the decoder accepts both forms (and a
//! naive offset-free fallback, treated as UTC). Serialization always
//! emits milliseconds with a `Z` suffix.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Parse an ISO-8601 timestamp, accepting fractional and
/// non-fractional seconds, with or without an explicit offset.
pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
        })
}

/// Format a timestamp the way the wire protocol expects it.
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde codec for `DateTime<Utc>` fields; use with
/// `#[serde(with = "types::timestamp::iso8601")]`.
pub mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse(&raw).map_err(de::Error::custom)
    }

    /// Codec for `Option<DateTime<Utc>>` fields.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(ts: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match ts {
                Some(ts) => serializer.serialize_some(&super::super::format(ts)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = Option::<String>::deserialize(deserializer)?;
            match raw {
                Some(raw) => super::super::parse(&raw)
                    .map(Some)
                    .map_err(de::Error::custom),
                None => Ok(None),
            }
        }
    }
}
