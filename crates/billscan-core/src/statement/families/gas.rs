//! Natural gas statements.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::{amount, count, month_pair, FamilyProfile};
use crate::models::{config::ExtractionConfig, UtilityFamily};
use crate::statement::cascade::{Cascade, Rule};
use crate::statement::values;

const GARBLE_KEYWORDS: &[&str] = &["therm", "Therm", "THERM", "Delivery", "DELIVERY"];

lazy_static! {
    static ref MONTH_RANGE: Regex =
        Regex::new(r"(\w+ \d{1,2},?\s*\d{4})\s+to\s+(\w+ \d{1,2},?\s*\d{4})").unwrap();
    static ref READING_DATE: Regex = Regex::new(r"(\d{2}/\d{2}/\d{4})\s+reading").unwrap();

    static ref DAYS_USED: Regex =
        Regex::new(r"In\s+\d+\s+days\s+you\s+used\s+(\d+)\s+therms").unwrap();
    static ref TOTAL_THERMS: Regex = Regex::new(r"Total\s+therms\s+used\s+(\d+)").unwrap();
    static ref THERMS_LINE: Regex = Regex::new(r"x\s+([\d.]+)\s+therms").unwrap();
    static ref THERM_FACTOR: Regex = Regex::new(r"Therm\s*Factor\s*=?\s*[\d.]+\s+(\d+)").unwrap();

    static ref DELIVERY_CHARGE: Regex =
        Regex::new(r"GAS\s+DELIVERY\s+CHARGE\s+\$?([\d,]+\.\d{2})").unwrap();
    static ref DELIVERY_TOTAL: Regex =
        Regex::new(r"Total\s+Delivery\s+Services\s+\$?\s*([\d,]+\.\d{2})").unwrap();
    // the rate (`@ .6123/therm`) may sit between label and amount
    static ref SUPPLY_CHARGE: Regex =
        Regex::new(r"GAS\s+SUPPLY\s+CHARGE.*?(?:@.*?/therm\s+)?\$?([\d,]+\.\d{2})").unwrap();
    static ref SUPPLY_TOTAL: Regex =
        Regex::new(r"Total\s+Supply\s+Services\s+\$?\s*([\d,]+\.\d{2})").unwrap();
}

pub(super) fn profile(limits: ExtractionConfig) -> FamilyProfile {
    FamilyProfile {
        family: UtilityFamily::Gas,
        garble_keywords: GARBLE_KEYWORDS,
        period: Cascade::new(
            "period",
            vec![
                Rule::first("month-range", &MONTH_RANGE, month_pair),
                Rule::every("reading-dates", &READING_DATE, reading_dates),
            ],
        ),
        quantity: Cascade::new(
            "quantity",
            vec![
                Rule::first("days-used", &DAYS_USED, count),
                Rule::first("total-therms", &TOTAL_THERMS, count),
                Rule::first("therms-line", &THERMS_LINE, rounded_therms),
                Rule::first("therm-factor", &THERM_FACTOR, count),
            ],
        ),
        charge_a: Cascade::new(
            "supply",
            vec![
                Rule::first("supply-charge", &SUPPLY_CHARGE, amount),
                Rule::first("supply-total", &SUPPLY_TOTAL, amount),
            ],
        ),
        charge_b: Cascade::new(
            "delivery",
            vec![
                Rule::first("delivery-charge", &DELIVERY_CHARGE, amount),
                Rule::first("delivery-total", &DELIVERY_TOTAL, amount),
            ],
        ),
        total: Cascade::empty("total"),
        limits,
    }
}

/// First two meter reading dates, in whichever order they were printed.
fn reading_dates(reads: &[Captures<'_>], _: &ExtractionConfig) -> Option<(NaiveDate, NaiveDate)> {
    let [first, second, ..] = reads else {
        return None;
    };
    let first = values::parse_slash_date(&first[1])?;
    let second = values::parse_slash_date(&second[1])?;
    Some(values::ordered(first, second))
}

fn rounded_therms(caps: &Captures<'_>, _: &ExtractionConfig) -> Option<u64> {
    values::parse_decimal(&caps[1]).and_then(values::round_to_count)
}
