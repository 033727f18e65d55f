//! Water and sewer statements.
//!
//! Three layout generations are covered: the 2009-2019 header with
//! `NN DAYS` and slash dates, the OCR'd scans where amounts drift in
//! front of their labels, and the 2019+ layout with labeled bill dates.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use rust_decimal::Decimal;

use super::{amount, count, FamilyProfile};
use crate::models::{config::ExtractionConfig, UtilityFamily};
use crate::statement::cascade::{Cascade, Rule};
use crate::statement::values;

lazy_static! {
    static ref PREVIOUS_BILL_DATE: Regex =
        Regex::new(r"Previous\s+Bill\s+Date\s+(\d{2}/\d{2}/\d{4})").unwrap();
    static ref CURRENT_BILL_DATE: Regex =
        Regex::new(r"Current\s+Bill\s+Date\s+(\d{2}/\d{2}/\d{4})").unwrap();
    static ref DATES_BEFORE_DAYS: Regex =
        Regex::new(r"(\d{2}/\d{2}/\d{2,4})\s+.*?(\d{2}/\d{2}/\d{2,4})\s+.*?(\d+)\s+DAYS").unwrap();
    static ref DAYS_BEFORE_DATES: Regex =
        Regex::new(r"(\d+)\s+DAYS\s+(\d{2}/\d{2}/\d{2,4})\s+.*?(\d{2}/\d{2}/\d{2,4})").unwrap();

    static ref SERVICE_PERIOD_CF: Regex =
        Regex::new(r"Current\s+Service\s+Period\s*\(\d+\s*Days?\)\s+(\d[\d,]*)\s*CF").unwrap();
    // `cubicfeet`, and the OCR misreading `cubic feel`
    static ref CUBIC_FEET: Regex = Regex::new(r"(?i)cubic\s*fee[tl]\s+(\d[\d,]*)").unwrap();
    static ref GALLONS: Regex = Regex::new(r"(?i)gallons\s+([\d,]+\.\d+)").unwrap();
    static ref METER_READ: Regex = Regex::new(r"(?:^|\s)(\d{5})(?:\s|$)").unwrap();

    static ref WATER_FORWARD: Regex =
        Regex::new(r"WATER\s+\$?\s*(\d[\d,]*\s*\.\s*\d{2})").unwrap();
    static ref WATER_REVERSED: Regex = Regex::new(r"(\d[\d,]*\.\d{2})\s+[^A-Z]*WATER").unwrap();
    static ref WATER_DOLLAR: Regex = Regex::new(r"Water\s+[^$\d]*\$\s*([\d,]+\.\d{2})").unwrap();
    static ref SEWER_FORWARD: Regex =
        Regex::new(r"SEWER\s+\$?\s*(\d[\d,]*\s*\.\s*\d{2})").unwrap();
    static ref SEWER_REVERSED: Regex = Regex::new(r"(\d[\d,]*\.\d{2})\s+[^A-Z]*SEWER").unwrap();
    static ref SEWER_DOLLAR: Regex = Regex::new(r"Sewer\s+[^$\d]*\$\s*([\d,]+\.\d{2})").unwrap();

    static ref TOTAL_CHARGES: Regex = Regex::new(
        r"TOTAL\s+(?:CURRENT\s+CHARGES|SERVICE\s+CHARGES).*?\$\s*([\d,]+\s*\.\s*\d{2})"
    )
    .unwrap();
    static ref TOTAL_AMOUNT_DUE: Regex =
        Regex::new(r"TOTAL\s+AMOUNT\s*DUE.*?\$\s*([\d,]+\s*\.\s*\d{2})").unwrap();
}

pub(super) fn profile(limits: ExtractionConfig) -> FamilyProfile {
    FamilyProfile {
        family: UtilityFamily::Water,
        garble_keywords: &[],
        period: Cascade::new(
            "period",
            vec![
                Rule::pair("bill-dates", &PREVIOUS_BILL_DATE, &CURRENT_BILL_DATE, bill_dates),
                Rule::first("dates-before-days", &DATES_BEFORE_DAYS, dates_before_days)
                    .final_on_match(),
                Rule::first("days-before-dates", &DAYS_BEFORE_DATES, days_before_dates),
            ],
        ),
        quantity: Cascade::new(
            "quantity",
            vec![
                Rule::first("service-period-cf", &SERVICE_PERIOD_CF, count),
                Rule::first("cubic-feet", &CUBIC_FEET, count),
                Rule::first("gallons", &GALLONS, gallons),
                Rule::every("meter-read-delta", &METER_READ, meter_read_delta),
            ],
        ),
        charge_a: Cascade::new(
            "water",
            vec![
                Rule::first("water-forward", &WATER_FORWARD, amount),
                Rule::first("water-reversed", &WATER_REVERSED, reversed_amount),
                Rule::first("water-dollar", &WATER_DOLLAR, amount),
            ],
        ),
        charge_b: Cascade::new(
            "sewer",
            vec![
                Rule::first("sewer-forward", &SEWER_FORWARD, amount),
                Rule::first("sewer-reversed", &SEWER_REVERSED, reversed_amount),
                Rule::first("sewer-dollar", &SEWER_DOLLAR, amount),
            ],
        ),
        total: Cascade::new(
            "total",
            vec![
                Rule::first("total-charges", &TOTAL_CHARGES, amount),
                Rule::first("total-amount-due", &TOTAL_AMOUNT_DUE, amount),
            ],
        ),
        limits,
    }
}

fn bill_dates(
    previous: &Captures<'_>,
    current: &Captures<'_>,
    _: &ExtractionConfig,
) -> Option<(NaiveDate, NaiveDate)> {
    sorted_dates(&previous[1], &current[1])
}

/// Two unordered slash dates ahead of the day count.
fn dates_before_days(
    caps: &Captures<'_>,
    _: &ExtractionConfig,
) -> Option<(NaiveDate, NaiveDate)> {
    sorted_dates(&caps[1], &caps[2])
}

/// Two unordered slash dates after the day count.
fn days_before_dates(
    caps: &Captures<'_>,
    _: &ExtractionConfig,
) -> Option<(NaiveDate, NaiveDate)> {
    sorted_dates(&caps[2], &caps[3])
}

fn sorted_dates(a: &str, b: &str) -> Option<(NaiveDate, NaiveDate)> {
    let first = values::parse_slash_date(a)?;
    let second = values::parse_slash_date(b)?;
    Some(values::ordered(first, second))
}

fn gallons(caps: &Captures<'_>, limits: &ExtractionConfig) -> Option<u64> {
    let gallons = values::parse_decimal(&caps[1])?;
    let cubic_feet = gallons.checked_div(limits.gallons_per_cubic_foot)?;
    values::round_to_count(cubic_feet)
}

/// Difference of the first two five-digit meter reads.
fn meter_read_delta(reads: &[Captures<'_>], limits: &ExtractionConfig) -> Option<u64> {
    let [first, second, ..] = reads else {
        return None;
    };
    let first: u64 = first[1].parse().ok()?;
    let second: u64 = second[1].parse().ok()?;
    let delta = first.abs_diff(second);

    (delta > 0 && delta < limits.max_meter_read_delta).then_some(delta)
}

/// Amounts printed ahead of their label are only trusted below the ceiling.
fn reversed_amount(caps: &Captures<'_>, limits: &ExtractionConfig) -> Option<Decimal> {
    values::parse_amount(&caps[1]).filter(|value| *value < limits.reversed_charge_ceiling)
}
