//! Batch extraction over a directory of statements.
//!
//! Documents are processed one at a time in lexicographic filename order.
//! Each produces a [`DocumentOutcome`]; nothing below the directory listing
//! and the final save aborts the run.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{BillscanError, Result};
use crate::models::{BillingRecord, BillscanConfig, UtilityFamily};
use crate::pdf::PdfExtractor;
use crate::recovery::{recover_text, TextVariant};
use crate::statement::{CascadeParser, ExtractionResult, StatementParser};
use crate::store::{self, RecordStore};

/// What happened to one document.
#[derive(Debug, Clone)]
pub enum DocumentOutcome {
    /// Text was read and a record assembled (possibly with missing fields).
    Parsed {
        result: ExtractionResult,
        variant: TextVariant,
    },
    /// The document could not be opened, decrypted or read.
    Unreadable { source_id: String, reason: String },
    /// Processing failed unexpectedly; the batch carried on.
    Fault { source_id: String, message: String },
}

impl DocumentOutcome {
    pub fn source_id(&self) -> &str {
        match self {
            Self::Parsed { result, .. } => &result.record.source_id,
            Self::Unreadable { source_id, .. } | Self::Fault { source_id, .. } => source_id,
        }
    }

    pub fn record(&self) -> Option<&BillingRecord> {
        match self {
            Self::Parsed { result, .. } => Some(&result.record),
            _ => None,
        }
    }

    /// Warning lines for the console report.
    pub fn warnings(&self, family: UtilityFamily) -> Vec<String> {
        match self {
            Self::Parsed { result, .. } => result
                .missing
                .iter()
                .map(|field| format!("  {}: {}", result.record.source_id, field.describe(family)))
                .collect(),
            Self::Unreadable { source_id, reason } => {
                vec![format!("  {}: could not read ({})", source_id, reason)]
            }
            Self::Fault { source_id, message } => vec![format!("  {}: ERROR {}", source_id, message)],
        }
    }
}

/// Documents still to process, plus what earlier runs stored.
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    pub existing: Vec<BillingRecord>,
    pub pending: Vec<PathBuf>,
}

/// Outcome of a whole batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub family: UtilityFamily,
    pub incremental: bool,
    /// One entry per document processed in this run.
    pub outcomes: Vec<DocumentOutcome>,
    /// The collection as saved: previous records plus this run's.
    pub records: Vec<BillingRecord>,
    /// Nothing was pending, so the output was left untouched.
    pub nothing_new: bool,
    pub processing_time_ms: u64,
}

impl BatchReport {
    /// Every warning line, in document order.
    pub fn warnings(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .flat_map(|outcome| outcome.warnings(self.family))
            .collect()
    }

    /// Records assembled in this run.
    pub fn new_records(&self) -> usize {
        self.outcomes.iter().filter(|o| o.record().is_some()).count()
    }

    pub fn with_quantity(&self) -> usize {
        self.records.iter().filter(|r| r.quantity.is_some()).count()
    }

    pub fn with_charge_a(&self) -> usize {
        self.records.iter().filter(|r| r.charge_a.is_some()).count()
    }

    pub fn with_charge_b(&self) -> usize {
        self.records.iter().filter(|r| r.charge_b.is_some()).count()
    }
}

/// Runs extraction over the configured input directory.
pub struct Batch<S: RecordStore> {
    config: BillscanConfig,
    parser: CascadeParser,
    store: S,
}

impl<S: RecordStore> Batch<S> {
    pub fn new(config: BillscanConfig, store: S) -> Self {
        let parser = CascadeParser::with_limits(config.family, config.extraction);
        Self {
            config,
            parser,
            store,
        }
    }

    pub fn config(&self) -> &BillscanConfig {
        &self.config
    }

    /// List statement files and, in incremental mode, drop the ones already
    /// stored.
    pub fn plan(&self) -> Result<BatchPlan> {
        if !self.config.input.dir.is_dir() {
            return Err(BillscanError::Config(format!(
                "input directory not found: {}",
                self.config.input.dir.display()
            )));
        }

        let existing = if self.config.output.incremental {
            self.store.load_existing()?
        } else {
            Vec::new()
        };

        let known = store::known_sources(&existing);
        let mut names: Vec<String> = fs::read_dir(&self.config.input.dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| self.config.is_statement_file(name))
            .filter(|name| !known.contains(name.as_str()))
            .collect();
        names.sort();

        debug!(
            "Found {} pending statements in {} ({} already stored)",
            names.len(),
            self.config.input.dir.display(),
            existing.len()
        );

        let pending = names
            .into_iter()
            .map(|name| self.config.input.dir.join(name))
            .collect();

        Ok(BatchPlan { existing, pending })
    }

    /// Read and parse one document. Never fails and never panics.
    pub fn process(&self, path: &Path) -> DocumentOutcome {
        let source_id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!("Processing {}", source_id);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.read_and_parse(path, &source_id)));

        match outcome {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("Fault while processing {}: {}", source_id, message);
                DocumentOutcome::Fault { source_id, message }
            }
        }
    }

    fn read_and_parse(&self, path: &Path, source_id: &str) -> DocumentOutcome {
        let unreadable = |reason: String| {
            warn!("Could not read {}: {}", source_id, reason);
            DocumentOutcome::Unreadable {
                source_id: source_id.to_string(),
                reason,
            }
        };

        let source = match PdfExtractor::open(path, &self.config.pdf.passwords) {
            Ok(source) => source,
            Err(e) => return unreadable(e.to_string()),
        };

        let recovered = match recover_text(&source, self.parser.garble_keywords()) {
            Ok(recovered) => recovered,
            Err(e) => return unreadable(e.to_string()),
        };

        DocumentOutcome::Parsed {
            result: self.parser.assemble(source_id, &recovered.text),
            variant: recovered.variant,
        }
    }

    /// Merge this run's records into the stored collection and save it.
    pub fn finish(
        &self,
        plan: BatchPlan,
        outcomes: Vec<DocumentOutcome>,
        started: Instant,
    ) -> Result<BatchReport> {
        let incremental = self.config.output.incremental;
        let nothing_new = incremental && plan.pending.is_empty();

        let new_records: Vec<BillingRecord> = outcomes
            .iter()
            .filter_map(|outcome| outcome.record().cloned())
            .collect();
        let records = store::merge(plan.existing, new_records);

        if !nothing_new {
            self.store.save(&records)?;
        }

        Ok(BatchReport {
            family: self.config.family,
            incremental,
            outcomes,
            records,
            nothing_new,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Plan, process every pending document, and save. `on_document` is
    /// called after each document.
    pub fn run<F>(&self, mut on_document: F) -> Result<BatchReport>
    where
        F: FnMut(&DocumentOutcome),
    {
        let started = Instant::now();
        let plan = self.plan()?;

        let outcomes = plan
            .pending
            .iter()
            .map(|path| {
                let outcome = self.process(path);
                on_document(&outcome);
                outcome
            })
            .collect();

        self.finish(plan, outcomes, started)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic during processing".to_string()
    }
}
