//! Charge extraction and total-minus-known derivation.

use rust_decimal::Decimal;
use tracing::debug;

use super::{ExtractionMatch, FamilyProfile, StatementText};

/// Rule name reported for a charge derived from the statement total.
pub const DERIVED_FROM_TOTAL: &str = "total-minus-known";

/// Both charge components of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Charges {
    /// Water or supply.
    pub a: Option<ExtractionMatch<Decimal>>,
    /// Sewer or delivery.
    pub b: Option<ExtractionMatch<Decimal>>,
}

/// Extract both charges independently, then derive a single missing one
/// from the statement total when the family prints a usable total.
pub fn extract_charges(profile: &FamilyProfile, text: &StatementText<'_>) -> Charges {
    let mut charges = Charges {
        a: profile.charge_a.run(text, &profile.limits),
        b: profile.charge_b.run(text, &profile.limits),
    };

    match (&charges.a, &charges.b) {
        (Some(known), None) => charges.b = derive_missing(profile, text, known.value),
        (None, Some(known)) => charges.a = derive_missing(profile, text, known.value),
        _ => {}
    }

    charges
}

/// `total - known`, rounded to cents, accepted only when positive.
fn derive_missing(
    profile: &FamilyProfile,
    text: &StatementText<'_>,
    known: Decimal,
) -> Option<ExtractionMatch<Decimal>> {
    if !profile.derives_from_total() {
        return None;
    }

    let total = profile.total.run(text, &profile.limits)?;
    let derived = (total.value - known).round_dp(2);

    if derived <= Decimal::ZERO {
        debug!(
            "Rejected derived charge {} (total {} via '{}', known {})",
            derived, total.value, total.rule, known
        );
        return None;
    }

    debug!("Derived charge {} from total {}", derived, total.value);
    Some(ExtractionMatch::new(derived, DERIVED_FROM_TOTAL))
}
