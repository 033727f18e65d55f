//! Text recovery: pick between the default text stream and the decoded
//! raw character codes of a statement.

pub mod decoder;
pub mod detector;

pub use decoder::{decode, garble, shift_code};
pub use detector::is_garbled;

use tracing::{debug, info};

use crate::pdf::{self, StatementSource};

/// Which text stream the extractors were given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextVariant {
    /// Default text extraction.
    Default,
    /// Raw character codes run through the shift decoder.
    Decoded,
}

/// Statement text after garbling detection.
#[derive(Debug, Clone)]
pub struct RecoveredText {
    pub text: String,
    pub variant: TextVariant,
}

/// Read a document's text, decoding the raw character codes when the
/// default text carries none of the family's `keywords`.
pub fn recover_text<S>(source: &S, keywords: &[&str]) -> pdf::Result<RecoveredText>
where
    S: StatementSource + ?Sized,
{
    let text = source.text()?;

    if !is_garbled(&text, keywords) {
        debug!("Using default text ({} chars)", text.len());
        return Ok(RecoveredText {
            text,
            variant: TextVariant::Default,
        });
    }

    let pages = (1..=source.page_count())
        .map(|page| source.page_raw_spans(page))
        .collect::<pdf::Result<Vec<_>>>()?;
    let decoded = decode(&pages);

    info!(
        "Text looks garbled, decoded {} pages into {} chars",
        pages.len(),
        decoded.len()
    );

    Ok(RecoveredText {
        text: decoded,
        variant: TextVariant::Decoded,
    })
}
