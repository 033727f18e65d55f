//! Billing record model.
//!
//! Records serialize with family-specific field names (`cf`/`water`/`sewer`,
//! `therms`/`supply`/`delivery`, `kwh`/`supply`/`delivery`), so the
//! `Serialize` impl is written by hand and loading goes through
//! [`BillingRecord::from_value`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::family::UtilityFamily;

/// Billing facts extracted from one statement document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingRecord {
    /// Document family; decides the serialized field names.
    pub family: UtilityFamily,

    /// Source document name; unique key for deduplication.
    pub source_id: String,

    /// Date taken from the `YYYY-MM-DD` filename prefix.
    pub statement_date: Option<NaiveDate>,

    /// First day of the service period.
    pub period_start: Option<NaiveDate>,

    /// Last day of the service period.
    pub period_end: Option<NaiveDate>,

    /// Consumption in the family's unit (cubic feet, therms, kWh).
    pub quantity: Option<u64>,

    /// First charge component (water or supply).
    pub charge_a: Option<Decimal>,

    /// Second charge component (sewer or delivery).
    pub charge_b: Option<Decimal>,
}

/// A field the extraction cascade could not fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Period,
    Quantity,
    ChargeA,
    ChargeB,
}

impl MissingField {
    /// Operator-facing description, e.g. "no consumption (CF) found".
    pub fn describe(&self, family: UtilityFamily) -> String {
        let (charge_a, charge_b) = family.charge_keys();
        match (self, family) {
            (Self::Period, _) => "no billing period found".to_string(),
            (Self::Quantity, UtilityFamily::Water) => "no consumption (CF) found".to_string(),
            (Self::Quantity, _) => format!("no {} found", family.unit_label()),
            (Self::ChargeA, UtilityFamily::Water) => format!("no {} charge found", charge_a),
            (Self::ChargeB, UtilityFamily::Water) => format!("no {} charge found", charge_b),
            (Self::ChargeA, _) => format!("no {} found", charge_a),
            (Self::ChargeB, _) => format!("no {} found", charge_b),
        }
    }
}

impl BillingRecord {
    /// Create an empty record for a document.
    pub fn new(family: UtilityFamily, source_id: impl Into<String>) -> Self {
        Self {
            family,
            source_id: source_id.into(),
            statement_date: None,
            period_start: None,
            period_end: None,
            quantity: None,
            charge_a: None,
            charge_b: None,
        }
    }

    /// Fields left empty after extraction, in reporting order.
    pub fn missing_fields(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();

        if self.period_start.is_none() || self.period_end.is_none() {
            missing.push(MissingField::Period);
        }
        if self.quantity.is_none() {
            missing.push(MissingField::Quantity);
        }
        if self.charge_a.is_none() {
            missing.push(MissingField::ChargeA);
        }
        if self.charge_b.is_none() {
            missing.push(MissingField::ChargeB);
        }

        missing
    }

    /// True when quantity and both charges were recovered.
    pub fn is_complete(&self) -> bool {
        self.quantity.is_some() && self.charge_a.is_some() && self.charge_b.is_some()
    }

    /// Rebuild a record from its persisted JSON form.
    ///
    /// Fails when the family's fields hold values a record cannot carry
    /// (a fractional quantity, a non-numeric charge) or when the record
    /// belongs to another family, so a later save never drops them.
    pub fn from_value(
        family: UtilityFamily,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let stored: StoredRecord = serde_json::from_value(value)?;
        let (charge_a_key, charge_b_key) = family.charge_keys();
        let quantity_key = family.quantity_key();

        if !stored.fields.contains_key(quantity_key) {
            if let Some(other) = UtilityFamily::ALL
                .iter()
                .map(UtilityFamily::quantity_key)
                .find(|key| stored.fields.contains_key(*key))
            {
                return Err(serde_json::Error::custom(format!(
                    "{}: has '{}' but no '{}'; not a {} record",
                    stored.filename, other, quantity_key, family
                )));
            }
        }

        let quantity = match stored.fields.get(quantity_key) {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(value.as_u64().ok_or_else(|| {
                serde_json::Error::custom(format!(
                    "{}: '{}' is not a whole number: {}",
                    stored.filename, quantity_key, value
                ))
            })?),
        };

        let amount = |key: &str| match stored.fields.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => value
                .as_f64()
                .and_then(Decimal::from_f64)
                .map(|d| Some(d.round_dp(2)))
                .ok_or_else(|| {
                    serde_json::Error::custom(format!(
                        "{}: '{}' is not an amount: {}",
                        stored.filename, key, value
                    ))
                }),
        };

        let charge_a = amount(charge_a_key)?;
        let charge_b = amount(charge_b_key)?;

        Ok(Self {
            family,
            quantity,
            charge_a,
            charge_b,
            source_id: stored.filename,
            statement_date: stored.statement_date,
            period_start: stored.period_start,
            period_end: stored.period_end,
        })
    }
}

/// Persisted shape; the family-specific keys land in `fields`.
#[derive(Deserialize)]
struct StoredRecord {
    filename: String,
    #[serde(default)]
    statement_date: Option<NaiveDate>,
    #[serde(default)]
    period_start: Option<NaiveDate>,
    #[serde(default)]
    period_end: Option<NaiveDate>,
    #[serde(flatten)]
    fields: serde_json::Map<String, serde_json::Value>,
}

impl Serialize for BillingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (charge_a_key, charge_b_key) = self.family.charge_keys();
        let mut map = serializer.serialize_map(Some(7))?;

        map.serialize_entry("filename", &self.source_id)?;
        map.serialize_entry(self.family.quantity_key(), &self.quantity)?;
        map.serialize_entry(charge_a_key, &self.charge_a.and_then(|d| d.to_f64()))?;
        map.serialize_entry(charge_b_key, &self.charge_b.and_then(|d| d.to_f64()))?;
        map.serialize_entry("period_start", &self.period_start)?;
        map.serialize_entry("period_end", &self.period_end)?;
        map.serialize_entry("statement_date", &self.statement_date)?;

        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn water_record() -> BillingRecord {
        BillingRecord {
            family: UtilityFamily::Water,
            source_id: "2012-03-14 Statement.pdf".to_string(),
            statement_date: NaiveDate::from_ymd_opt(2012, 3, 14),
            period_start: NaiveDate::from_ymd_opt(2012, 1, 12),
            period_end: NaiveDate::from_ymd_opt(2012, 2, 13),
            quantity: Some(600),
            charge_a: Some(Decimal::new(2759, 2)),
            charge_b: Some(Decimal::new(1364, 2)),
        }
    }

    #[test]
    fn test_serialize_uses_family_keys() {
        let value = serde_json::to_value(water_record()).unwrap();

        assert_eq!(
            value,
            json!({
                "filename": "2012-03-14 Statement.pdf",
                "cf": 600,
                "water": 27.59,
                "sewer": 13.64,
                "period_start": "2012-01-12",
                "period_end": "2012-02-13",
                "statement_date": "2012-03-14",
            })
        );
    }

    #[test]
    fn test_serialize_absent_fields_as_null() {
        let record = BillingRecord::new(UtilityFamily::Gas, "2010-01-05 Statement.pdf");
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["therms"], serde_json::Value::Null);
        assert_eq!(value["supply"], serde_json::Value::Null);
        assert_eq!(value["delivery"], serde_json::Value::Null);
        assert_eq!(value["statement_date"], serde_json::Value::Null);
    }

    #[test]
    fn test_from_value_reads_family_keys() {
        let value = json!({
            "filename": "2021-07-02 Statement.pdf",
            "kwh": 512,
            "supply": 61.4,
            "delivery": null,
            "period_start": "2021-05-28",
            "period_end": null,
        });

        let record = BillingRecord::from_value(UtilityFamily::Electric, value).unwrap();

        assert_eq!(record.source_id, "2021-07-02 Statement.pdf");
        assert_eq!(record.quantity, Some(512));
        assert_eq!(record.charge_a, Some(Decimal::new(6140, 2)));
        assert_eq!(record.charge_b, None);
        assert_eq!(record.period_end, None);
        assert_eq!(record.statement_date, None);
    }

    #[test]
    fn test_from_value_rejects_fractional_quantity() {
        let value = json!({ "filename": "2021-07-02 Statement.pdf", "kwh": 512.0 });

        let err = BillingRecord::from_value(UtilityFamily::Electric, value).unwrap_err();
        assert!(err.to_string().contains("'kwh' is not a whole number"));
    }

    #[test]
    fn test_from_value_rejects_other_family() {
        let value = json!({ "filename": "2012-03-14 Statement.pdf", "cf": 600, "water": 27.59 });

        let err = BillingRecord::from_value(UtilityFamily::Gas, value).unwrap_err();
        assert!(err.to_string().contains("not a gas record"));
    }

    #[test]
    fn test_from_value_rejects_text_amount() {
        let value = json!({ "filename": "2010-01-05 Statement.pdf", "therms": 87, "supply": "n/a" });

        assert!(BillingRecord::from_value(UtilityFamily::Gas, value).is_err());
    }

    #[test]
    fn test_missing_fields_descriptions() {
        let record = BillingRecord::new(UtilityFamily::Water, "x.pdf");
        let described: Vec<String> = record
            .missing_fields()
            .iter()
            .map(|m| m.describe(UtilityFamily::Water))
            .collect();

        assert_eq!(
            described,
            vec![
                "no billing period found",
                "no consumption (CF) found",
                "no water charge found",
                "no sewer charge found",
            ]
        );
        assert_eq!(MissingField::Quantity.describe(UtilityFamily::Gas), "no therms found");
        assert_eq!(MissingField::ChargeB.describe(UtilityFamily::Electric), "no delivery found");
        assert!(!record.is_complete());
        assert!(water_record().is_complete());
    }
}
