//! Per-family rule tables.
//!
//! Each vendor family contributes its own label vocabulary; the cascade
//! engine and the derivation step are shared.

mod electric;
mod gas;
mod water;

use chrono::NaiveDate;
use regex::Captures;
use rust_decimal::Decimal;

use super::cascade::Cascade;
use super::values;
use crate::models::{config::ExtractionConfig, UtilityFamily};

/// Everything the extractors need to know about one document family.
pub struct FamilyProfile {
    pub family: UtilityFamily,

    /// Keywords whose absence marks the default text as garbled. Empty
    /// disables detection.
    pub garble_keywords: &'static [&'static str],

    pub period: Cascade<(NaiveDate, NaiveDate)>,
    pub quantity: Cascade<u64>,

    /// Water or supply charge.
    pub charge_a: Cascade<Decimal>,

    /// Sewer or delivery charge.
    pub charge_b: Cascade<Decimal>,

    /// Statement total, used to derive a single missing charge. Empty when
    /// the family has no usable total line.
    pub total: Cascade<Decimal>,

    pub limits: ExtractionConfig,
}

impl FamilyProfile {
    /// Rule tables for `family` with the given plausibility bounds.
    pub fn for_family(family: UtilityFamily, limits: ExtractionConfig) -> Self {
        match family {
            UtilityFamily::Water => water::profile(limits),
            UtilityFamily::Gas => gas::profile(limits),
            UtilityFamily::Electric => electric::profile(limits),
            UtilityFamily::ElectricNh => electric::nh_profile(limits),
        }
    }

    /// True when a missing charge may be derived from the statement total.
    pub fn derives_from_total(&self) -> bool {
        !self.total.is_empty()
    }
}

// Capture extractors shared by the family tables. Each reads group 1
// (and group 2 for date pairs).

fn amount(caps: &Captures<'_>, _: &ExtractionConfig) -> Option<Decimal> {
    values::parse_amount(&caps[1])
}

fn count(caps: &Captures<'_>, _: &ExtractionConfig) -> Option<u64> {
    values::parse_count(&caps[1])
}

/// Like `count`, but a zero reading is no reading.
fn nonzero_count(caps: &Captures<'_>, limits: &ExtractionConfig) -> Option<u64> {
    count(caps, limits).filter(|n| *n > 0)
}

fn slash_pair(caps: &Captures<'_>, _: &ExtractionConfig) -> Option<(NaiveDate, NaiveDate)> {
    let start = values::parse_slash_date(&caps[1])?;
    let end = values::parse_slash_date(&caps[2])?;
    Some(values::ordered(start, end))
}

fn month_pair(caps: &Captures<'_>, _: &ExtractionConfig) -> Option<(NaiveDate, NaiveDate)> {
    let start = values::parse_month_date(&caps[1])?;
    let end = values::parse_month_date(&caps[2])?;
    Some(values::ordered(start, end))
}
