//! panlink Report - Result storage and reporting
//!
//! Persists the three artifacts of a run (relation table, entity inventory,
//! statistics record) and renders them back as human-readable reports.

use std::path::PathBuf;

use thiserror::Error;

use panlink_core::PanlinkError;

pub mod report;
pub mod store;

pub use report::{ConfidenceDistribution, IdentifierValidation, Report, RunSummary};
pub use store::{
    store_for, CsvStore, JsonStore, ResultStore, StoredResults, ENTITIES_CSV, ENTITIES_JSON,
    RELATIONS_CSV, RELATIONS_JSON, STATISTICS_JSON,
};

/// Result store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<StoreError> for PanlinkError {
    fn from(e: StoreError) -> Self {
        Self::StorageError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
