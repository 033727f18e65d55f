//! PDF processing module.
//!
//! Documents are consumed through [`StatementSource`]: the default
//! (position-ordered) page text, and the raw character codes as they
//! appear in the content stream, grouped into blocks, lines and spans.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// One glyph as stored in the content stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChar {
    /// Character as the document reports it (the code itself when the font
    /// carries no usable mapping).
    pub c: char,
    /// Numeric character code.
    pub code: u32,
}

impl RawChar {
    /// Build a raw char from a character code.
    pub fn from_code(code: u32) -> Self {
        Self {
            c: char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
            code,
        }
    }
}

/// A run of glyphs shown by one text operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSpan {
    pub chars: Vec<RawChar>,
}

/// Spans sharing one text line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLine {
    pub spans: Vec<RawSpan>,
}

/// A text object (`BT` .. `ET`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBlock {
    pub lines: Vec<RawLine>,
}

/// Raw character layout of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPage {
    pub blocks: Vec<RawBlock>,
}

impl RawLine {
    /// Iterate over every glyph of the line in stream order.
    pub fn chars(&self) -> impl Iterator<Item = &RawChar> {
        self.spans.iter().flat_map(|span| span.chars.iter())
    }
}

/// Text access to a statement document.
pub trait StatementSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Default text of a page (1-indexed).
    fn page_text(&self, page: u32) -> Result<String>;

    /// Raw character codes of a page (1-indexed).
    fn page_raw_spans(&self, page: u32) -> Result<RawPage>;

    /// Default text of the whole document.
    fn text(&self) -> Result<String> {
        let mut text = String::new();
        for page in 1..=self.page_count() {
            text.push_str(&self.page_text(page)?);
        }
        Ok(text)
    }
}
