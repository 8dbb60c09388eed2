//! Document identifiers.
//!
//! An [`ObjectId`] is 12 bytes: a big-endian 4 byte creation time in seconds,
//! 5 random bytes and a 3 byte per-process counter. It is rendered as 24
//! lowercase hex characters, which is also how it is stored.

use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU32, Ordering},
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

static COUNTER: AtomicU32 = AtomicU32::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generate a fresh id for a document created now.
    pub fn new() -> Self {
        Self::with_time(Utc::now())
    }

    pub fn with_time(created_at: DateTime<Utc>) -> Self {
        let secs = u32::try_from(created_at.timestamp()).unwrap_or(u32::MAX);
        let random = Uuid::new_v4();
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&random.as_bytes()[..5]);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Parse the 24 hex characters form, labelling the error with `label`.
    pub fn parse_labeled(value: &str, label: &str) -> ResultEngine<Self> {
        value
            .parse()
            .map_err(|_| EngineError::InvalidId(format!("invalid {label} id: {value}")))
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for ObjectId {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidId(value.to_string());
        if value.len() != 24 || !value.is_ascii() {
            return Err(invalid());
        }

        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&value[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn display_and_parse_round_trip() {
        let raw = "5b6d42132c8884b302632182";
        let id: ObjectId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn parse_accepts_uppercase_and_renders_lowercase() {
        let id: ObjectId = "5B6D42132C8884B302632182".parse().unwrap();
        assert_eq!(id.to_string(), "5b6d42132c8884b302632182");
    }

    #[test]
    fn timestamp_is_encoded_in_prefix() {
        let created = Utc.with_ymd_and_hms(2018, 8, 10, 7, 55, 31).unwrap();
        let id = ObjectId::with_time(created);
        let secs = u32::from_be_bytes([id.0[0], id.0[1], id.0[2], id.0[3]]);
        assert_eq!(i64::from(secs), created.timestamp());
    }

    #[test]
    fn consecutive_ids_differ() {
        assert_ne!(ObjectId::new(), ObjectId::new());
    }

    #[test]
    fn rejects_bad_input() {
        assert!("".parse::<ObjectId>().is_err());
        assert!("5b6d42132c8884b30263218".parse::<ObjectId>().is_err());
        assert!("zz6d42132c8884b302632182".parse::<ObjectId>().is_err());
        assert!("5b6d42132c8884b3026321é".parse::<ObjectId>().is_err());
    }

    #[test]
    #[should_panic(expected = "InvalidId(\"invalid category id: nope\")")]
    fn parse_labeled_reports_label() {
        ObjectId::parse_labeled("nope", "category").unwrap();
    }
}
