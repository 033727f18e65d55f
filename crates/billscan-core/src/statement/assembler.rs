//! Record assembly: run every extractor over one statement's text.

use std::time::Instant;

use tracing::{debug, info};

use super::{
    charges::extract_charges, period::extract_period, quantity::extract_quantity, values,
    FamilyProfile, StatementText,
};
use crate::models::{config::ExtractionConfig, BillingRecord, MissingField, UtilityFamily};

/// Result of parsing one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Assembled record; fields that no rule filled stay `None`.
    pub record: BillingRecord,
    /// Fields left empty, in reporting order.
    pub missing: Vec<MissingField>,
    /// `field=rule` for every field that was filled.
    pub matched_rules: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Turns statement text into a billing record.
pub trait StatementParser {
    /// Family whose rules this parser runs.
    fn family(&self) -> UtilityFamily;

    /// Keywords for garbled-text detection; empty disables it.
    fn garble_keywords(&self) -> &'static [&'static str];

    /// Parse `text` taken from the document named `source_id`. Never fails;
    /// unmatched fields are reported in [`ExtractionResult::missing`].
    fn assemble(&self, source_id: &str, text: &str) -> ExtractionResult;
}

/// Parser driven by a family's rule cascades.
pub struct CascadeParser {
    profile: FamilyProfile,
}

impl CascadeParser {
    /// Create a parser with default extraction bounds.
    pub fn new(family: UtilityFamily) -> Self {
        Self::with_limits(family, ExtractionConfig::default())
    }

    /// Create a parser with explicit conversion constants and bounds.
    pub fn with_limits(family: UtilityFamily, limits: ExtractionConfig) -> Self {
        Self {
            profile: FamilyProfile::for_family(family, limits),
        }
    }

    pub fn profile(&self) -> &FamilyProfile {
        &self.profile
    }
}

impl StatementParser for CascadeParser {
    fn family(&self) -> UtilityFamily {
        self.profile.family
    }

    fn garble_keywords(&self) -> &'static [&'static str] {
        self.profile.garble_keywords
    }

    fn assemble(&self, source_id: &str, text: &str) -> ExtractionResult {
        let start = Instant::now();
        let family = self.profile.family;
        let text = StatementText::new(text);
        let mut matched_rules = Vec::new();

        debug!("Parsing {} ({} chars) as {}", source_id, text.raw().len(), family);

        let mut record = BillingRecord::new(family, source_id);
        record.statement_date = values::date_prefix(source_id);

        if let Some(period) = extract_period(&self.profile, &text) {
            record.period_start = Some(period.value.start);
            record.period_end = Some(period.value.end);
            matched_rules.push(format!("period={}", period.rule));
        }

        if let Some(quantity) = extract_quantity(&self.profile, &text) {
            record.quantity = Some(quantity.value);
            matched_rules.push(format!("{}={}", family.quantity_key(), quantity.rule));
        }

        let charges = extract_charges(&self.profile, &text);
        let (key_a, key_b) = family.charge_keys();
        if let Some(charge) = charges.a {
            record.charge_a = Some(charge.value);
            matched_rules.push(format!("{}={}", key_a, charge.rule));
        }
        if let Some(charge) = charges.b {
            record.charge_b = Some(charge.value);
            matched_rules.push(format!("{}={}", key_b, charge.rule));
        }

        let missing = record.missing_fields();
        info!(
            "Parsed {}: {} fields matched, {} missing",
            source_id,
            matched_rules.len(),
            missing.len()
        );

        ExtractionResult {
            record,
            missing,
            matched_rules,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    const WATER_2012: &str = "\
BOSTON WATER AND SEWER COMMISSION
READ DATES 02/13/12 FROM 01/12/12 BILLED 32 DAYS
METER 01200 READ 01500
Current Service Period (30 Days) 450 CF
WATER 27. 59
TOTAL CURRENT CHARGES ..... $ 41.23
";

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_assemble_water_statement() {
        let parser = CascadeParser::new(UtilityFamily::Water);
        let result = parser.assemble("2012-03-14 Statement.pdf", WATER_2012);

        assert_eq!(
            result.record,
            BillingRecord {
                family: UtilityFamily::Water,
                source_id: "2012-03-14 Statement.pdf".to_string(),
                statement_date: date(2012, 3, 14),
                period_start: date(2012, 1, 12),
                period_end: date(2012, 2, 13),
                quantity: Some(450),
                charge_a: Some(Decimal::new(2759, 2)),
                charge_b: Some(Decimal::new(1364, 2)),
            }
        );
        assert!(result.missing.is_empty());
        assert_eq!(
            result.matched_rules,
            vec![
                "period=dates-before-days",
                "cf=service-period-cf",
                "water=water-forward",
                "sewer=total-minus-known",
            ]
        );
    }

    #[test]
    fn test_assemble_is_idempotent() {
        let parser = CascadeParser::new(UtilityFamily::Water);
        let first = parser.assemble("2012-03-14 Statement.pdf", WATER_2012);
        let second = parser.assemble("2012-03-14 Statement.pdf", WATER_2012);

        assert_eq!(first.record, second.record);
        assert_eq!(first.missing, second.missing);
        assert_eq!(first.matched_rules, second.matched_rules);
    }

    #[test]
    fn test_nothing_matched_keeps_identity_only() {
        let parser = CascadeParser::new(UtilityFamily::Gas);
        let result = parser.assemble("2010-01-05 Statement.pdf", "lorem ipsum");

        let mut expected = BillingRecord::new(UtilityFamily::Gas, "2010-01-05 Statement.pdf");
        expected.statement_date = date(2010, 1, 5);

        assert_eq!(result.record, expected);
        assert_eq!(
            result.missing,
            vec![
                MissingField::Period,
                MissingField::Quantity,
                MissingField::ChargeA,
                MissingField::ChargeB,
            ]
        );
        assert!(result.matched_rules.is_empty());
    }

    #[test]
    fn test_filename_without_date_prefix() {
        let parser = CascadeParser::new(UtilityFamily::ElectricNh);
        let result = parser.assemble("Statement.pdf", "Service from 04/17/20 - 05/18/20");

        assert_eq!(result.record.statement_date, None);
        assert_eq!(result.record.period_start, date(2020, 4, 17));
        assert_eq!(parser.family(), UtilityFamily::ElectricNh);
        assert!(parser.garble_keywords().is_empty());
    }

    #[test]
    fn test_assemble_electric_statement() {
        let text = "\
Service from 04/17/20 - 05/18/20 31 Days
Total Electricity Use (kWh) 512
Subtotal Delivery Services $61.04
Subtotal Supplier Services $48.00
";
        let parser = CascadeParser::new(UtilityFamily::Electric);
        let record = parser.assemble("2020-05-22 Statement.pdf", text).record;

        assert_eq!(record.quantity, Some(512));
        assert_eq!(record.charge_a, Some(Decimal::new(4800, 2)));
        assert_eq!(record.charge_b, Some(Decimal::new(6104, 2)));
        assert!(record.is_complete());
    }
}
