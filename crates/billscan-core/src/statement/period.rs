//! Service period extraction.

use chrono::NaiveDate;

use super::{values, ExtractionMatch, FamilyProfile, StatementText};

/// A service period; `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BillingPeriod {
    /// Build a period from two dates in either order.
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        let (start, end) = values::ordered(a, b);
        Self { start, end }
    }

    /// Inclusive length in days.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Run the family's date-pair grammars; the first that yields two valid
/// dates wins.
pub fn extract_period(
    profile: &FamilyProfile,
    text: &StatementText<'_>,
) -> Option<ExtractionMatch<BillingPeriod>> {
    let found = profile.period.run(text, &profile.limits)?;
    let (a, b) = found.value;
    Some(ExtractionMatch::new(BillingPeriod::new(a, b), found.rule))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{config::ExtractionConfig, UtilityFamily};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_orders_dates() {
        let period = BillingPeriod::new(date(2009, 7, 6), date(2009, 6, 1));
        assert_eq!(period.start, date(2009, 6, 1));
        assert_eq!(period.end, date(2009, 7, 6));
        assert_eq!(period.days(), 36);
    }

    #[test]
    fn test_extract_period_for_each_family() {
        let limits = ExtractionConfig::default();
        let cases = [
            (UtilityFamily::Water, "Previous Bill Date 10/02/2019 Current Bill Date 09/03/2019"),
            (UtilityFamily::Gas, "07/06/2009 reading 06/01/2009 reading"),
            (UtilityFamily::Electric, "June 10, 2009 to June 18, 2009"),
            (UtilityFamily::ElectricNh, "Service from 04/17/20 - 05/18/20"),
        ];

        for (family, text) in cases {
            let profile = FamilyProfile::for_family(family, limits);
            let period = extract_period(&profile, &StatementText::new(text))
                .unwrap_or_else(|| panic!("no period for {family}"))
                .value;
            assert!(period.start < period.end, "{family}: {period:?}");
        }
    }

    #[test]
    fn test_no_period() {
        let profile = FamilyProfile::for_family(UtilityFamily::Gas, ExtractionConfig::default());
        assert_eq!(extract_period(&profile, &StatementText::new("no dates here")), None);
    }
}
