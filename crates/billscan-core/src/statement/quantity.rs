//! Consumption quantity extraction.

use super::{ExtractionMatch, FamilyProfile, StatementText};

/// Consumption in the family's unit, from the highest-priority rule that
/// yields a plausible value.
pub fn extract_quantity(
    profile: &FamilyProfile,
    text: &StatementText<'_>,
) -> Option<ExtractionMatch<u64>> {
    profile.quantity.run(text, &profile.limits)
}
