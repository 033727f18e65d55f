//! Statement parsing engine.
//!
//! Every billing field is filled by a [`Cascade`]: an ordered list of
//! named rules evaluated until one yields a value. The rule tables differ
//! per document family (see [`families`]); the engine does not.

pub mod cascade;
pub mod families;
pub mod values;

mod assembler;
mod charges;
mod period;
mod quantity;

pub use assembler::{CascadeParser, ExtractionResult, StatementParser};
pub use cascade::{Cascade, Matcher, Rule, Scope};
pub use charges::{extract_charges, Charges};
pub use families::FamilyProfile;
pub use period::{extract_period, BillingPeriod};
pub use quantity::extract_quantity;

/// Statement text in the two shapes the rules match against.
#[derive(Debug, Clone)]
pub struct StatementText<'a> {
    raw: &'a str,
    joined: String,
}

impl<'a> StatementText<'a> {
    /// Wrap extracted text; the joined view has every newline replaced by a
    /// space so that labels and values split across lines still match.
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            joined: raw.replace('\n', " "),
        }
    }

    /// Text exactly as extracted.
    pub fn raw(&self) -> &str {
        self.raw
    }

    /// Text with line breaks flattened to spaces.
    pub fn joined(&self) -> &str {
        &self.joined
    }

    /// The view a rule of the given scope matches against.
    pub fn view(&self, scope: Scope) -> &str {
        match scope {
            Scope::Joined => self.joined(),
            Scope::Raw => self.raw(),
        }
    }
}

/// A value produced by a cascade, with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Name of the rule that matched (or of the derivation).
    pub rule: &'static str,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, rule: &'static str) -> Self {
        Self { value, rule }
    }
}
