//! Text codecs for SQLite columns.
//!
//! Decimals, timestamps and dates are stored as TEXT. Decimals keep their
//! exact scale; timestamps are RFC 3339 in UTC with a fixed number of
//! fractional digits, so that text order matches time order.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use log::warn;
use rust_decimal::Decimal;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Lenient decode; a malformed value is logged and read as the Unix epoch.
pub fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Invalid stored timestamp '{}': {}", s, e);
            DateTime::<Utc>::default()
        })
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap_or_else(|e| {
        warn!("Invalid stored date '{}': {}", s, e);
        DateTime::<Utc>::default().date_naive()
    })
}

/// Lenient decode; a malformed value is logged and read as zero.
pub fn parse_decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap_or_else(|e| {
        warn!("Invalid stored decimal '{}': {}", s, e);
        Decimal::ZERO
    })
}

pub fn parse_optional_decimal(s: Option<&str>) -> Option<Decimal> {
    s.map(parse_decimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decimal_text_keeps_scale() {
        let value = dec!(64777.777777777777777777);
        assert_eq!(parse_decimal(&value.to_string()), value);
        assert_eq!(parse_decimal("1.2000000000").to_string(), "1.2000000000");
    }

    #[test]
    fn test_timestamps_sort_as_text() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let later = earlier + chrono::Duration::milliseconds(5);
        let a = format_timestamp(&earlier);
        let b = format_timestamp(&later);
        assert!(a < b);
        assert_eq!(parse_timestamp(&b), later);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        assert_eq!(parse_decimal("abc"), Decimal::ZERO);
        assert_eq!(parse_timestamp("yesterday"), DateTime::<Utc>::default());
        assert_eq!(parse_date("2024-02-30"), DateTime::<Utc>::default().date_naive());
    }
}
