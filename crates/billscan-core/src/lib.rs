//! Core library for utility statement extraction.
//!
//! This crate provides:
//! - PDF processing (default text and raw character codes, encrypted files)
//! - Recovery of statements whose text was stored through a shifted encoding
//! - Per-family rule cascades for billing period, consumption and charges
//! - Record storage with incremental merge, and batch orchestration

pub mod batch;
pub mod error;
pub mod models;
pub mod pdf;
pub mod recovery;
pub mod statement;
pub mod store;

#[cfg(test)]
mod test_support;

pub use batch::{Batch, BatchPlan, BatchReport, DocumentOutcome};
pub use error::{BillscanError, Result};
pub use models::{BillingRecord, BillscanConfig, MissingField, UtilityFamily};
pub use pdf::{PdfExtractor, StatementSource};
pub use recovery::{recover_text, RecoveredText, TextVariant};
pub use statement::{CascadeParser, ExtractionResult, StatementParser};
pub use store::{JsonRecordStore, RecordStore};
