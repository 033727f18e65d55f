//! Parsers for the numbers and dates captured by extraction rules.
//!
//! Captured amounts may carry thousands separators and stray whitespace
//! inside the decimal (`27. 59`); all helpers tolerate both.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

lazy_static! {
    static ref DATE_PREFIX: Regex = Regex::new(r"^(\d{4}-\d{2}-\d{2})").unwrap();
}

const MONTH_FORMATS: [&str; 4] = ["%B %d, %Y", "%B %d,%Y", "%b %d, %Y", "%b %d,%Y"];

fn strip_separators(s: &str) -> String {
    s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect()
}

/// Parse a monetary amount, rounded to cents.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    Decimal::from_str(&strip_separators(s))
        .ok()
        .map(|d| d.round_dp(2))
}

/// Parse a decimal quantity such as `1,234.56`.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(&strip_separators(s)).ok()
}

/// Parse a whole-number count such as `1,234`.
pub fn parse_count(s: &str) -> Option<u64> {
    strip_separators(s).parse().ok()
}

/// Parse `MM/DD/YY` or `MM/DD/YYYY`; the year's digit count picks the format.
pub fn parse_slash_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let year = s.rsplit('/').next()?;
    let format = match year.len() {
        4 => "%m/%d/%Y",
        2 => "%m/%d/%y",
        _ => return None,
    };
    NaiveDate::parse_from_str(s, format).ok()
}

/// Parse `Month D, YYYY` with a full or abbreviated month and an optional
/// space after the comma.
pub fn parse_month_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    MONTH_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}

/// Statement date from a `YYYY-MM-DD` filename prefix.
pub fn date_prefix(file_name: &str) -> Option<NaiveDate> {
    let caps = DATE_PREFIX.captures(file_name)?;
    NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()
}

/// Order two dates so the earlier one comes first.
pub fn ordered(a: NaiveDate, b: NaiveDate) -> (NaiveDate, NaiveDate) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Round half-to-even to a whole count; negative values are rejected.
pub fn round_to_count(value: Decimal) -> Option<u64> {
    value.round().to_u64()
}

/// Drop the fractional part.
pub fn truncate_to_count(value: Decimal) -> Option<u64> {
    value.trunc().to_u64()
}
