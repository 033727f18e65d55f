//! Configuration structures for the extraction pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::family::UtilityFamily;

/// Main configuration for a billscan run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BillscanConfig {
    /// Document family selector.
    pub family: UtilityFamily,

    /// Where statements are read from.
    pub input: InputConfig,

    /// Where records are written.
    pub output: OutputConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Statement discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory holding the statement documents.
    pub dir: PathBuf,

    /// Token a filename must contain to be treated as a statement.
    pub marker: String,

    /// File extension of statement documents (without the dot).
    pub extension: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("statements"),
            marker: "Statement".to_string(),
            extension: "pdf".to_string(),
        }
    }
}

/// Record output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON file holding the record array.
    pub path: PathBuf,

    /// Merge into the existing file by filename instead of replacing it.
    pub incremental: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("billing_data.json"),
            incremental: false,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Passwords tried, in order, after the empty password.
    pub passwords: Vec<String>,
}

/// Field extraction configuration: conversion constants and plausibility
/// bounds for derived values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Gallons in one cubic foot, for volumes billed in gallons.
    #[serde(with = "rust_decimal::serde::float")]
    pub gallons_per_cubic_foot: Decimal,

    /// Largest meter-read difference accepted as real consumption (exclusive).
    pub max_meter_read_delta: u64,

    /// Amounts found before their label are rejected at or above this value.
    #[serde(with = "rust_decimal::serde::float")]
    pub reversed_charge_ceiling: Decimal,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            gallons_per_cubic_foot: Decimal::new(7481, 3),
            max_meter_read_delta: 5000,
            reversed_charge_ceiling: Decimal::new(200, 0),
        }
    }
}

impl BillscanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// True when a filename matches the configured marker and extension.
    pub fn is_statement_file(&self, file_name: &str) -> bool {
        let suffix = format!(".{}", self.input.extension);
        file_name.contains(&self.input.marker) && file_name.ends_with(&suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: BillscanConfig = serde_json::from_str(
            r#"{ "family": "gas", "pdf": { "passwords": ["02127"] } }"#,
        )
        .unwrap();

        assert_eq!(config.family, UtilityFamily::Gas);
        assert_eq!(config.pdf.passwords, vec!["02127".to_string()]);
        assert_eq!(config.input.marker, "Statement");
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BillscanConfig::default();
        config.family = UtilityFamily::ElectricNh;
        config.output.incremental = true;
        config.save(&path).unwrap();

        let loaded = BillscanConfig::from_file(&path).unwrap();
        assert_eq!(loaded.family, UtilityFamily::ElectricNh);
        assert!(loaded.output.incremental);
        assert_eq!(loaded.extraction.max_meter_read_delta, 5000);
    }

    #[test]
    fn test_is_statement_file() {
        let config = BillscanConfig::default();
        assert!(config.is_statement_file("2019-10-02 Statement.pdf"));
        assert!(!config.is_statement_file("2019-10-02 Notice.pdf"));
        assert!(!config.is_statement_file("2019-10-02 Statement.pdf.bak"));
    }
}
