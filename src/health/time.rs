//! Timestamp parsing for backend records.
//!
//! Backends mix encodings: UTC with a `Z` suffix, naive local wall-clock
//! time written by heartbeat jobs, and full ISO 8601 with an offset.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::health::types::TimeParseError;

const UTC_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.fZ",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
];

/// Parse a record timestamp into an absolute instant.
///
/// A trailing `Z` means UTC; no zone at all means `local`.
pub fn parse_timestamp(raw: &str, local: FixedOffset) -> Result<DateTime<FixedOffset>, TimeParseError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(TimeParseError(raw.to_string()));
    }

    if value.ends_with('Z') {
        for fmt in UTC_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
                return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
            }
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            // Fixed offsets have no gaps or folds, so this is always Single.
            if let Some(dt) = local.from_local_datetime(&naive).single() {
                return Ok(dt);
            }
        }
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Ok(dt);
        }
    }

    DateTime::parse_from_rfc3339(value).map_err(|_| {
        tracing::warn!(timestamp = %raw, "Failed to parse timestamp");
        TimeParseError(raw.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_utc_with_fraction() {
        let dt = parse_timestamp("2026-02-08 09:59:47.957Z", kst()).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 0);
        assert_eq!(dt.with_timezone(&Utc), utc("2026-02-08T09:59:47.957Z"));
    }

    #[test]
    fn test_utc_without_fraction() {
        let dt = parse_timestamp("2026-02-08 09:59:47Z", kst()).unwrap();
        assert_eq!(dt.with_timezone(&Utc), utc("2026-02-08T09:59:47Z"));
    }

    #[test]
    fn test_naive_is_local_time() {
        let dt = parse_timestamp("2026-02-08 19:01:33", kst()).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(dt.with_timezone(&Utc), utc("2026-02-08T10:01:33Z"));

        let frac = parse_timestamp("2026-02-08 19:01:33.250", kst()).unwrap();
        assert_eq!(frac.with_timezone(&Utc), utc("2026-02-08T10:01:33.250Z"));
    }

    #[test]
    fn test_iso_with_offset() {
        let dt = parse_timestamp("2026-02-08T19:01:33+09:00", kst()).unwrap();
        assert_eq!(dt.with_timezone(&Utc), utc("2026-02-08T10:01:33Z"));

        let compact = parse_timestamp("2026-02-08T12:01:33.5+0200", kst()).unwrap();
        assert_eq!(compact.with_timezone(&Utc), utc("2026-02-08T10:01:33.5Z"));
    }

    #[test]
    fn test_unparseable() {
        assert!(parse_timestamp("", kst()).is_err());
        assert!(parse_timestamp("last tuesday", kst()).is_err());
        assert_eq!(
            parse_timestamp("08/02/2026", kst()).unwrap_err(),
            TimeParseError("08/02/2026".into())
        );
    }
}
