//! Data models: billing records, document families and configuration.

pub mod config;
pub mod family;
pub mod record;

pub use config::BillscanConfig;
pub use family::UtilityFamily;
pub use record::{BillingRecord, MissingField};
