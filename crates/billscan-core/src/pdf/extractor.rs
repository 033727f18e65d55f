//! PDF text and raw glyph extraction using lopdf and pdf-extract.

use std::collections::HashSet;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{RawBlock, RawChar, RawLine, RawPage, RawSpan, Result, StatementSource};
use crate::error::PdfError;

/// PDF statement reader using lopdf for structure and pdf-extract for text.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Read and load a PDF file, trying `passwords` if it is encrypted.
    pub fn open(path: &Path, passwords: &[String]) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| PdfError::Parse(e.to_string()))?;
        let mut extractor = Self::new();
        extractor.load(&data, passwords)?;
        Ok(extractor)
    }

    /// Load a PDF from bytes. Encrypted documents are tried with the empty
    /// password first, then with each of `passwords` in order.
    pub fn load(&mut self, data: &[u8], passwords: &[String]) -> Result<()> {
        let doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let doc = if doc.is_encrypted() {
            let mut doc = Self::decrypt(data, passwords)?;

            // Save decrypted document to raw_data for pdf_extract
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
            doc
        } else {
            self.raw_data = data.to_vec();
            doc
        };

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn decrypt(data: &[u8], passwords: &[String]) -> Result<Document> {
        let candidates = std::iter::once("").chain(passwords.iter().map(String::as_str));

        for (attempt, password) in candidates.enumerate() {
            // A failed attempt can leave the document half-decrypted, so each
            // password starts from a fresh parse.
            let mut doc =
                Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
            if doc.decrypt(password).is_ok() {
                debug!("Decrypted PDF with password #{}", attempt);
                return Ok(doc);
            }
        }

        Err(PdfError::Encrypted)
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))
    }

    /// Default text of every page, in page order.
    pub fn pages_text(&self) -> Result<Vec<String>> {
        self.document()?;
        pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Names of the page's fonts that use two-byte character codes.
    fn two_byte_fonts(&self, doc: &Document, page_id: ObjectId) -> HashSet<Vec<u8>> {
        let mut fonts = HashSet::new();

        let Some(resources) = self.get_page_resources(doc, page_id) else {
            return fonts;
        };
        let Ok(font_entry) = resources.get(b"Font") else {
            return fonts;
        };
        let Ok((_, Object::Dictionary(font_dict))) = doc.dereference(font_entry) else {
            return fonts;
        };

        for (name, font_ref) in font_dict.iter() {
            if let Ok((_, Object::Dictionary(font))) = doc.dereference(font_ref) {
                let subtype = font.get(b"Subtype").ok().and_then(|o| o.as_name().ok());
                if subtype == Some(b"Type0".as_slice()) {
                    fonts.insert(name.clone());
                }
            }
        }

        trace!("Page {:?} has {} two-byte fonts", page_id, fonts.len());
        fonts
    }

    /// Get resources dictionary for a page, handling inheritance
    fn get_page_resources(&self, doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
        let page = doc.get_object(page_id).ok()?;
        if let Object::Dictionary(dict) = page {
            if let Ok(resources) = dict.get(b"Resources") {
                if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
                    return Some(res_dict.clone());
                }
            }

            if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") {
                return self.get_page_resources(doc, *parent_id);
            }
        }
        None
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSource for PdfExtractor {
    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn page_text(&self, page: u32) -> Result<String> {
        let pages = self.pages_text()?;
        let index = page.checked_sub(1).ok_or(PdfError::InvalidPage(page))? as usize;
        pages.into_iter().nth(index).ok_or(PdfError::InvalidPage(page))
    }

    fn page_raw_spans(&self, page: u32) -> Result<RawPage> {
        let doc = self.document()?;
        let pages = doc.get_pages();
        let page_id = *pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let wide_fonts = self.two_byte_fonts(doc, page_id);
        let data = doc
            .get_page_content(page_id)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        let content =
            Content::decode(&data).map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        let mut layout = LayoutBuilder::default();
        let mut wide = false;

        for op in &content.operations {
            match op.operator.as_str() {
                "BT" => layout.begin_block(),
                "ET" => layout.end_block(),
                "Tf" => {
                    wide = op
                        .operands
                        .first()
                        .and_then(|o| o.as_name().ok())
                        .is_some_and(|name| wide_fonts.contains(name));
                }
                "Td" | "TD" => {
                    let ty = op.operands.get(1).and_then(number).unwrap_or(0.0);
                    layout.move_by(ty);
                }
                "Tm" => {
                    if let Some(y) = op.operands.get(5).and_then(number) {
                        layout.move_to(y);
                    }
                }
                "T*" => layout.break_line(),
                "Tj" => {
                    if let Some(operand) = op.operands.first() {
                        layout.push_span(codes(operand, wide));
                    }
                }
                "'" | "\"" => {
                    layout.break_line();
                    if let Some(operand) = op.operands.last() {
                        layout.push_span(codes(operand, wide));
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        let span = items.iter().flat_map(|item| codes(item, wide)).collect();
                        layout.push_span(span);
                    }
                }
                _ => {}
            }
        }

        let raw = layout.finish();
        trace!("Page {} raw layout: {} blocks", page, raw.blocks.len());
        Ok(raw)
    }

    fn text(&self) -> Result<String> {
        Ok(self.pages_text()?.concat())
    }
}

/// Character codes of a string operand; non-strings yield nothing.
fn codes(operand: &Object, wide: bool) -> Vec<RawChar> {
    let Object::String(bytes, _) = operand else {
        return Vec::new();
    };

    if wide {
        bytes
            .chunks(2)
            .map(|pair| {
                let code = match pair {
                    [hi, lo] => u32::from(u16::from_be_bytes([*hi, *lo])),
                    [single] => u32::from(*single),
                    _ => 0,
                };
                RawChar::from_code(code)
            })
            .collect()
    } else {
        bytes.iter().map(|&b| RawChar::from_code(u32::from(b))).collect()
    }
}

fn number(operand: &Object) -> Option<f64> {
    match operand {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Groups shown strings into blocks and lines as the text position moves.
#[derive(Default)]
struct LayoutBuilder {
    page: RawPage,
    block: RawBlock,
    line: RawLine,
    y: f64,
}

impl LayoutBuilder {
    fn begin_block(&mut self) {
        self.end_block();
        self.y = 0.0;
    }

    fn end_block(&mut self) {
        self.break_line();
        if !self.block.lines.is_empty() {
            self.page.blocks.push(std::mem::take(&mut self.block));
        }
    }

    fn break_line(&mut self) {
        if !self.line.spans.is_empty() {
            self.block.lines.push(std::mem::take(&mut self.line));
        }
    }

    fn move_by(&mut self, dy: f64) {
        if dy.abs() > f64::EPSILON {
            self.y += dy;
            self.break_line();
        }
    }

    fn move_to(&mut self, y: f64) {
        if (y - self.y).abs() > f64::EPSILON {
            self.y = y;
            self.break_line();
        }
    }

    fn push_span(&mut self, chars: Vec<RawChar>) {
        if !chars.is_empty() {
            self.line.spans.push(RawSpan { chars });
        }
    }

    fn finish(mut self) -> RawPage {
        self.end_block();
        self.page
    }
}
