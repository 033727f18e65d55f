//! Electric statements: the MA utility (2009 onwards, several layouts)
//! and the NH utility.
//!
//! Period and charge labels are matched against the text as extracted,
//! so a label broken across lines does not match. Usage is matched on
//! the joined view. A `$0.00` charge line (third-party supplier) is kept
//! only when no later layout's label carries an amount.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use rust_decimal::Decimal;

use super::{amount, month_pair, nonzero_count, slash_pair, FamilyProfile};
use crate::models::{config::ExtractionConfig, UtilityFamily};
use crate::statement::cascade::{Cascade, Rule};
use crate::statement::values;

const GARBLE_KEYWORDS: &[&str] = &["kWh", "KWH", "Delivery"];

lazy_static! {
    static ref MONTH_RANGE: Regex =
        Regex::new(r"(\w+ \d{1,2}, \d{4})\s+to\s+(\w+ \d{1,2}, \d{4})").unwrap();
    static ref SERVICE_FROM: Regex =
        Regex::new(r"Service from (\d{2}/\d{2}/\d{2})\s*-\s*(\d{2}/\d{2}/\d{2})").unwrap();

    static ref TOTAL_USE: Regex =
        Regex::new(r"Total\s+Electricity\s+Use\s*\(kWh\)\s+(\d[\d,]*)").unwrap();
    static ref DAY_BILLED_USE: Regex = Regex::new(r"\d+\s+Day\s+Billed\s+Use\s+(\d[\d,]*)").unwrap();
    static ref CURRENT_USAGE: Regex = Regex::new(r"Current\s+Usage.*?(\d[\d,]+)\s+Actual").unwrap();
    static ref BILLED_USE: Regex = Regex::new(r"Billed\s+Use\s+(\d[\d,]+)\s+Generation").unwrap();
    static ref GENERATION_KWH: Regex =
        Regex::new(r"(?i)Generation\s+(?:Service\s+)?Charge.*?(\d[\d,]+)\s*kWh\s*X").unwrap();
    static ref KWH_BEFORE_DELIVERY: Regex =
        Regex::new(r"(\d[\d,]+)\s+KWH\s+.*?Delivery\s+Services").unwrap();
    static ref KWH_LINE_ITEM: Regex = Regex::new(r"(\d[\d,]*)\s+KWH\s+(\d[\d,]*\.\d{2})").unwrap();

    static ref DELIVERY_TOTAL: Regex =
        Regex::new(r"Delivery\s*(?:Charges\s*)?Total[\s.]*\$?([\d,]+\.\d{2})").unwrap();
    static ref SUBTOTAL_DELIVERY: Regex =
        Regex::new(r"Subtotal Delivery Services\s*\$?([\d,]+\.\d{2})").unwrap();
    static ref DELIVERY_SERVICES: Regex =
        Regex::new(r"Delivery Services\s*\$?([\d,]+\.\d{2})").unwrap();

    static ref GENERATION_TOTAL: Regex =
        Regex::new(r"Generation\s*(?:Charges|Total)[\s.]*\$?([\d,]+\.\d{2})").unwrap();
    static ref SUBTOTAL_SUPPLIER: Regex =
        Regex::new(r"Subtotal Supplier Services\s*\$?([\d,]+\.\d{2})").unwrap();
    static ref SUPPLY_SERVICES: Regex =
        Regex::new(r"Electric Supply Services\s*\$?([\d,]+\.\d{2})").unwrap();
    static ref GENERATION_LINE: Regex = Regex::new(
        r"Generation Service Charge\s+\d[\d,]* kWh X \.\d+\s*\$?([\d,]+\.\d{2})"
    )
    .unwrap();
    static ref BASIC_SERVICE: Regex =
        Regex::new(r"Basic Svc Fixed\s+\.?\d+\s*X?\s*\d+\s*KWH\s+([\d,]+\.\d{2})").unwrap();

    static ref ENERGY_CHARGE: Regex =
        Regex::new(r"(?i)Energy\s+Chrg.*?(\d[\d,.]+)\s*kWh\s*X").unwrap();
    static ref GENERATION_SRVC: Regex =
        Regex::new(r"(?i)Generation\s+Srvc\s+Chrg\S*\s+(\d[\d,.]+)\s*kWh\s*X").unwrap();
}

/// MA statements.
pub(super) fn profile(limits: ExtractionConfig) -> FamilyProfile {
    FamilyProfile {
        family: UtilityFamily::Electric,
        garble_keywords: GARBLE_KEYWORDS,
        period: Cascade::new(
            "period",
            vec![
                Rule::first("month-range", &MONTH_RANGE, month_pair).on_raw_text(),
                Rule::first("service-from", &SERVICE_FROM, slash_pair).on_raw_text(),
            ],
        ),
        quantity: Cascade::new(
            "quantity",
            vec![
                Rule::first("total-use", &TOTAL_USE, nonzero_count),
                Rule::first("day-billed-use", &DAY_BILLED_USE, nonzero_count),
                Rule::first("current-usage", &CURRENT_USAGE, nonzero_count),
                Rule::first("billed-use", &BILLED_USE, nonzero_count),
                Rule::first("generation-kwh", &GENERATION_KWH, nonzero_count),
                Rule::first("kwh-before-delivery", &KWH_BEFORE_DELIVERY, nonzero_count),
                Rule::first("kwh-line-item", &KWH_LINE_ITEM, nonzero_count),
            ],
        ),
        charge_a: Cascade::new(
            "supply",
            vec![
                charge("generation-total", &GENERATION_TOTAL),
                charge("subtotal-supplier", &SUBTOTAL_SUPPLIER),
                charge("supply-services", &SUPPLY_SERVICES),
                charge("generation-line", &GENERATION_LINE),
                charge("basic-service", &BASIC_SERVICE),
            ],
        ),
        charge_b: Cascade::new(
            "delivery",
            vec![
                charge("delivery-total", &DELIVERY_TOTAL),
                charge("subtotal-delivery", &SUBTOTAL_DELIVERY),
                charge("delivery-services", &DELIVERY_SERVICES),
            ],
        ),
        total: Cascade::empty("total"),
        limits,
    }
}

/// NH statements.
pub(super) fn nh_profile(limits: ExtractionConfig) -> FamilyProfile {
    FamilyProfile {
        family: UtilityFamily::ElectricNh,
        garble_keywords: &[],
        period: Cascade::new(
            "period",
            vec![Rule::first("service-from", &SERVICE_FROM, slash_pair).on_raw_text()],
        ),
        quantity: Cascade::new(
            "quantity",
            vec![
                Rule::first("energy-charge", &ENERGY_CHARGE, truncated_kwh),
                Rule::every("generation-srvc", &GENERATION_SRVC, summed_kwh),
                Rule::first("current-usage", &CURRENT_USAGE, nonzero_count),
                Rule::first("total-use", &TOTAL_USE, nonzero_count),
            ],
        ),
        charge_a: Cascade::new(
            "supply",
            vec![
                charge("subtotal-supplier", &SUBTOTAL_SUPPLIER),
                charge("supply-services", &SUPPLY_SERVICES),
            ],
        ),
        charge_b: Cascade::new(
            "delivery",
            vec![
                charge("subtotal-delivery", &SUBTOTAL_DELIVERY),
                charge("delivery-services", &DELIVERY_SERVICES),
            ],
        ),
        total: Cascade::empty("total"),
        limits,
    }
}

/// Charge rule on the text as extracted. A zero amount is held back in
/// case a later rule finds the real figure.
fn charge(name: &'static str, pattern: &'static Regex) -> Rule<Decimal> {
    Rule::first(name, pattern, amount)
        .on_raw_text()
        .defer_when(Decimal::is_zero)
}

/// Fractional kWh (`512.96kWh X`), fraction dropped.
fn truncated_kwh(caps: &Captures<'_>, _: &ExtractionConfig) -> Option<u64> {
    values::parse_decimal(&caps[1])
        .and_then(values::truncate_to_count)
        .filter(|kwh| *kwh > 0)
}

/// Split generation lines (rate changes mid-period) add up to the usage.
fn summed_kwh(lines: &[Captures<'_>], _: &ExtractionConfig) -> Option<u64> {
    let total = lines
        .iter()
        .map(|caps| values::parse_decimal(&caps[1]))
        .sum::<Option<Decimal>>()?;

    values::truncate_to_count(total).filter(|kwh| *kwh > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::StatementText;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn run<T>(cascade: &Cascade<T>, text: &str) -> Option<(T, &'static str)> {
        cascade
            .run(&StatementText::new(text), &ExtractionConfig::default())
            .map(|m| (m.value, m.rule))
    }

    fn ma() -> FamilyProfile {
        profile(ExtractionConfig::default())
    }

    fn nh() -> FamilyProfile {
        nh_profile(ExtractionConfig::default())
    }

    #[test]
    fn test_ma_periods() {
        assert_eq!(
            run(&ma().period, "Billing Period: January 20, 2015 to February 17, 2015"),
            Some(((date(2015, 1, 20), date(2015, 2, 17)), "month-range"))
        );
        assert_eq!(
            run(&ma().period, "Service from 04/17/20 - 05/18/20 31 Days"),
            Some(((date(2020, 4, 17), date(2020, 5, 18)), "service-from"))
        );
    }

    #[test]
    fn test_period_requires_both_month_dates() {
        assert_eq!(run(&ma().period, "Foo 40, 2015 to March 3, 2015"), None);
    }

    #[test]
    fn test_ma_kwh_cascade() {
        let q = ma().quantity;
        assert_eq!(
            run(&q, "Total Electricity Use (kWh) 1,204"),
            Some((1204, "total-use"))
        );
        assert_eq!(run(&q, "30 Day Billed Use 512"), Some((512, "day-billed-use")));
        assert_eq!(
            run(&q, "Current Usage\n12345 12857\n512 Actual"),
            Some((512, "current-usage"))
        );
        assert_eq!(
            run(&q, "Generation Service Charge 498 kWh X .10870"),
            Some((498, "generation-kwh"))
        );
        assert_eq!(run(&q, "412 KWH 38.21"), Some((412, "kwh-line-item")));
    }

    #[test]
    fn test_zero_kwh_falls_through() {
        let text = "Total Electricity Use (kWh) 0\n30 Day Billed Use 512";
        assert_eq!(run(&ma().quantity, text), Some((512, "day-billed-use")));
    }

    #[test]
    fn test_ma_charges_on_raw_text() {
        let text = "Delivery Charges Total $41.18\nGeneration Charges ..... $52.70\n";
        let profile = ma();
        assert_eq!(
            run(&profile.charge_b, text),
            Some((Decimal::new(4118, 2), "delivery-total"))
        );
        assert_eq!(
            run(&profile.charge_a, text),
            Some((Decimal::new(5270, 2), "generation-total"))
        );

        let text = "Basic Svc Fixed .10870 X 498 KWH 54.13";
        assert_eq!(
            run(&profile.charge_a, text),
            Some((Decimal::new(5413, 2), "basic-service"))
        );
    }

    #[test]
    fn test_zero_charge_line_defers_to_later_layout() {
        let text = "Generation Charges $0.00\nSubtotal Supplier Services $52.70\n\
                    Delivery Charges Total $0.00\nSubtotal Delivery Services $41.18";
        let profile = ma();
        assert_eq!(
            run(&profile.charge_a, text),
            Some((Decimal::new(5270, 2), "subtotal-supplier"))
        );
        assert_eq!(
            run(&profile.charge_b, text),
            Some((Decimal::new(4118, 2), "subtotal-delivery"))
        );
    }

    #[test]
    fn test_zero_charge_kept_when_no_later_rule_matches() {
        let profile = ma();
        assert_eq!(
            run(&profile.charge_a, "Generation Charges $0.00"),
            Some((Decimal::ZERO, "generation-total"))
        );
        assert_eq!(
            run(&profile.charge_b, "Delivery Services $0.00"),
            Some((Decimal::ZERO, "delivery-services"))
        );
        assert_eq!(
            run(&nh().charge_a, "Subtotal Supplier Services $0.00\nElectric Supply Services $0.00"),
            Some((Decimal::ZERO, "subtotal-supplier"))
        );
    }

    #[test]
    fn test_charge_label_split_across_lines_is_no_match() {
        assert_eq!(run(&ma().charge_b, "Subtotal Delivery\nServices $41.18"), None);
    }

    #[test]
    fn test_nh_kwh() {
        let q = nh().quantity;
        assert_eq!(
            run(&q, "Energy Chrg - Rate R 512.96kWh X $0.05"),
            Some((512, "energy-charge"))
        );
        assert_eq!(
            run(&q, "Generation Srvc Chrg 200.50 kWh X $0.1\nGeneration Srvc Chrg* 312.75kWh X $0.1"),
            Some((513, "generation-srvc"))
        );
        assert_eq!(
            run(&q, "Total Electricity Use (kWh) 640"),
            Some((640, "total-use"))
        );
    }

    #[test]
    fn test_nh_charges() {
        let text = "Subtotal Delivery Services $61.04\nElectric Supply Services $48.00";
        let profile = nh();
        assert_eq!(
            run(&profile.charge_b, text),
            Some((Decimal::new(6104, 2), "subtotal-delivery"))
        );
        assert_eq!(
            run(&profile.charge_a, text),
            Some((Decimal::new(4800, 2), "supply-services"))
        );
        assert_eq!(
            run(&profile.period, "Service from 12/19/25 - 01/20/26"),
            Some(((date(2025, 12, 19), date(2026, 1, 20)), "service-from"))
        );
    }
}
