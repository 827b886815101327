//! Result store
//!
//! Writes run artifacts to an output directory as CSV or JSON tables plus
//! a pretty-printed statistics record, and reads them back for reporting.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use panlink_core::{InventoryRow, OutputConfig, OutputFormat, RelationRecord, RunArtifacts, RunStatistics};

use crate::{Result, StoreError};

pub const RELATIONS_CSV: &str = "extracted_relations.csv";
pub const ENTITIES_CSV: &str = "extracted_entities.csv";
pub const RELATIONS_JSON: &str = "extracted_relations.json";
pub const ENTITIES_JSON: &str = "extracted_entities.json";
pub const STATISTICS_JSON: &str = "extraction_statistics.json";

const RELATION_COLUMNS: [&str; 5] = ["identifier", "relation", "entity", "confidence", "method"];
const ENTITY_COLUMNS: [&str; 3] = ["entity_type", "value", "method"];

/// Artifacts read back from an output directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredResults {
    /// Relations in stored order (confidence descending)
    pub relations: Vec<RelationRecord>,
    pub entities: Vec<InventoryRow>,
    /// `None` when no statistics record exists
    pub statistics: Option<RunStatistics>,
}

/// Persistence for run artifacts
pub trait ResultStore: Send + Sync {
    /// Write all artifacts, returning the paths written
    fn save(&self, artifacts: &RunArtifacts) -> Result<Vec<PathBuf>>;

    /// Read artifacts back. Missing files load as empty.
    fn load(&self) -> Result<StoredResults>;

    /// Output directory
    fn dir(&self) -> &Path;
}

/// Select the store for the configured format
pub fn store_for(config: &OutputConfig) -> Box<dyn ResultStore> {
    match config.format {
        OutputFormat::Csv => Box::new(CsvStore::new(&config.dir)),
        OutputFormat::Json => Box::new(JsonStore::new(&config.dir)),
    }
}

// ============================================================================
// CSV Store
// ============================================================================

/// Tables as CSV with a header row
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ResultStore for CsvStore {
    fn save(&self, artifacts: &RunArtifacts) -> Result<Vec<PathBuf>> {
        ensure_dir(&self.dir)?;

        let relations_path = self.dir.join(RELATIONS_CSV);
        write_csv(&relations_path, &RELATION_COLUMNS, &sorted_relations(&artifacts.relations))?;
        tracing::info!("Relations saved to {}", relations_path.display());

        let entities_path = self.dir.join(ENTITIES_CSV);
        write_csv(&entities_path, &ENTITY_COLUMNS, &artifacts.entities)?;
        tracing::info!("Entities saved to {}", entities_path.display());

        let stats_path = write_statistics(&self.dir, &artifacts.statistics)?;

        Ok(vec![relations_path, entities_path, stats_path])
    }

    fn load(&self) -> Result<StoredResults> {
        Ok(StoredResults {
            relations: read_csv(&self.dir.join(RELATIONS_CSV))?,
            entities: read_csv(&self.dir.join(ENTITIES_CSV))?,
            statistics: read_statistics(&self.dir)?,
        })
    }

    fn dir(&self) -> &Path {
        &self.dir
    }
}

fn write_csv<T: Serialize>(path: &Path, columns: &[&str], rows: &[T]) -> Result<()> {
    let csv_err = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };

    // Header written by hand so empty tables still carry one
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;

    writer.write_record(columns).map_err(csv_err)?;
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }

    writer.flush().map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        tracing::warn!("{} not found, treating as empty", path.display());
        return Ok(Vec::new());
    }

    let csv_err = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(csv_err)
}

// ============================================================================
// JSON Store
// ============================================================================

/// Tables as pretty-printed JSON arrays
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ResultStore for JsonStore {
    fn save(&self, artifacts: &RunArtifacts) -> Result<Vec<PathBuf>> {
        ensure_dir(&self.dir)?;

        let relations_path = self.dir.join(RELATIONS_JSON);
        write_json(&relations_path, &sorted_relations(&artifacts.relations))?;
        tracing::info!("Relations saved to {}", relations_path.display());

        let entities_path = self.dir.join(ENTITIES_JSON);
        write_json(&entities_path, &artifacts.entities)?;
        tracing::info!("Entities saved to {}", entities_path.display());

        let stats_path = write_statistics(&self.dir, &artifacts.statistics)?;

        Ok(vec![relations_path, entities_path, stats_path])
    }

    fn load(&self) -> Result<StoredResults> {
        Ok(StoredResults {
            relations: read_json(&self.dir.join(RELATIONS_JSON))?.unwrap_or_default(),
            entities: read_json(&self.dir.join(ENTITIES_JSON))?.unwrap_or_default(),
            statistics: read_statistics(&self.dir)?,
        })
    }

    fn dir(&self) -> &Path {
        &self.dir
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    fs::write(path, content).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        tracing::warn!("{} not found, treating as empty", path.display());
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
}

// ============================================================================
// Shared helpers
// ============================================================================

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Relations ordered by confidence, highest first; ties keep discovery order
fn sorted_relations(relations: &[RelationRecord]) -> Vec<RelationRecord> {
    let mut sorted = relations.to_vec();
    sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    sorted
}

fn write_statistics(dir: &Path, statistics: &RunStatistics) -> Result<PathBuf> {
    let path = dir.join(STATISTICS_JSON);
    write_json(&path, statistics)?;
    tracing::info!("Statistics saved to {}", path.display());
    Ok(path)
}

fn read_statistics(dir: &Path) -> Result<Option<RunStatistics>> {
    read_json(&dir.join(STATISTICS_JSON))
}
