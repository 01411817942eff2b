/// Receipt number generation
///
/// Receipt numbers are `R` followed by the issue time as `YYYYMMDDHHMMSS`.
use crate::error::{GymError, GymResult};
use chrono::{DateTime, Duration, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

const PREFIX: char = 'R';
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// A validated receipt number
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReceiptNumber {
    raw: String,
    issued_at: NaiveDateTime,
}

impl ReceiptNumber {
    /// Build a receipt number for a timestamp (sub-second precision is dropped)
    pub fn from_timestamp(at: NaiveDateTime) -> Self {
        let issued_at = at.with_nanosecond(0).unwrap_or(at);
        Self {
            raw: format!("{}{}", PREFIX, issued_at.format(TIMESTAMP_FORMAT)),
            issued_at,
        }
    }

    /// Parse and validate a receipt number
    pub fn parse(raw: &str) -> GymResult<Self> {
        let invalid = || GymError::Validation(format!("Invalid receipt number: {}", raw));

        let digits = raw.strip_prefix(PREFIX).ok_or_else(invalid)?;
        if digits.len() != 14 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let issued_at =
            NaiveDateTime::parse_from_str(digits, TIMESTAMP_FORMAT).map_err(|_| invalid())?;

        Ok(Self {
            raw: raw.to_string(),
            issued_at,
        })
    }

    /// The timestamp encoded in the receipt number
    pub fn timestamp(&self) -> NaiveDateTime {
        self.issued_at
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ReceiptNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for ReceiptNumber {
    type Error = GymError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReceiptNumber> for String {
    fn from(value: ReceiptNumber) -> Self {
        value.raw
    }
}

/// Source of receipt numbers for new payments
pub trait ReceiptNumberGenerator: Send + Sync {
    /// Issue the next receipt number for a payment recorded at `now`
    fn next(&self, now: DateTime<Utc>) -> ReceiptNumber;
}

/// Issues strictly increasing timestamp receipt numbers
///
/// When two payments land in the same second the later one is moved to the
/// next free second, so numbers stay unique within the process.
#[derive(Debug, Default)]
pub struct MonotonicReceiptNumbers {
    last_issued: Mutex<Option<NaiveDateTime>>,
}

impl MonotonicReceiptNumbers {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReceiptNumberGenerator for MonotonicReceiptNumbers {
    fn next(&self, now: DateTime<Utc>) -> ReceiptNumber {
        let now = now.naive_utc();
        let now = now.with_nanosecond(0).unwrap_or(now);

        let mut last = self
            .last_issued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let issued = match *last {
            Some(previous) if previous >= now => previous + Duration::seconds(1),
            _ => now,
        };
        *last = Some(issued);

        ReceiptNumber::from_timestamp(issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_format_round_trips() {
        let generator = MonotonicReceiptNumbers::new();
        let number = generator.next(at(9, 5, 7));

        assert_eq!(number.as_str(), "R20240101090507");
        assert_eq!(number.as_str().len(), 15);
        assert_eq!(number.timestamp(), at(9, 5, 7).naive_utc());
        assert_eq!(ReceiptNumber::parse(number.as_str()).unwrap(), number);
    }

    #[test]
    fn test_same_second_moves_forward() {
        let generator = MonotonicReceiptNumbers::new();

        let first = generator.next(at(10, 0, 0));
        let second = generator.next(at(10, 0, 0));
        let third = generator.next(at(9, 59, 59));

        assert_eq!(first.as_str(), "R20240101100000");
        assert_eq!(second.as_str(), "R20240101100001");
        assert_eq!(third.as_str(), "R20240101100002");
    }

    #[test]
    fn test_later_clock_wins() {
        let generator = MonotonicReceiptNumbers::new();
        generator.next(at(10, 0, 0));
        assert_eq!(generator.next(at(11, 0, 0)).as_str(), "R20240101110000");
    }

    #[test]
    fn test_subsecond_precision_dropped() {
        let generator = MonotonicReceiptNumbers::new();
        let now = at(10, 0, 0) + Duration::milliseconds(750);
        assert_eq!(generator.next(now).as_str(), "R20240101100000");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["20240101100000", "R2024010110000", "R2024010110000X", "R20241301100000", "X20240101100000"] {
            assert!(ReceiptNumber::parse(raw).is_err(), "{} should be rejected", raw);
        }
    }
}
