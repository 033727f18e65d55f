//! Persisted record collection.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::{BillingRecord, UtilityFamily};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Where assembled records are kept between runs.
pub trait RecordStore {
    /// Records persisted by earlier runs; empty when nothing was saved yet.
    fn load_existing(&self) -> Result<Vec<BillingRecord>>;

    /// Replace the persisted collection with `records`.
    fn save(&self, records: &[BillingRecord]) -> Result<()>;
}

/// Pretty-printed JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonRecordStore {
    path: PathBuf,
    family: UtilityFamily,
}

impl JsonRecordStore {
    pub fn new(path: impl Into<PathBuf>, family: UtilityFamily) -> Self {
        Self {
            path: path.into(),
            family,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn malformed(&self, reason: impl ToString) -> StoreError {
        StoreError::Malformed {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl RecordStore for JsonRecordStore {
    fn load_existing(&self) -> Result<Vec<BillingRecord>> {
        if !self.path.exists() {
            debug!("No existing records at {}", self.path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let values: Vec<serde_json::Value> =
            serde_json::from_str(&content).map_err(|e| self.malformed(e))?;

        let records = values
            .into_iter()
            .map(|value| BillingRecord::from_value(self.family, value))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| self.malformed(e))?;

        info!("Loaded {} existing records from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn save(&self, records: &[BillingRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let content = serde_json::to_string_pretty(records).map_err(|e| self.malformed(e))?;
        fs::write(&self.path, content).map_err(|e| self.io_error(e))?;

        info!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Source ids already present in a collection.
pub fn known_sources(records: &[BillingRecord]) -> HashSet<&str> {
    records.iter().map(|r| r.source_id.as_str()).collect()
}

/// Append `new` to `existing`, skipping records whose source id is already
/// present. Existing records are never replaced.
pub fn merge(existing: Vec<BillingRecord>, new: Vec<BillingRecord>) -> Vec<BillingRecord> {
    let mut seen: HashSet<String> = existing.iter().map(|r| r.source_id.clone()).collect();
    let mut merged = existing;

    for record in new {
        if seen.insert(record.source_id.clone()) {
            merged.push(record);
        } else {
            debug!("Skipping duplicate record for {}", record.source_id);
        }
    }

    merged
}
