//! panlink Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout panlink:
//! - Extraction records (identifier matches, named entities, relations)
//! - Run statistics and the entity inventory
//! - The page source seam consumed by the extraction orchestrator
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, ExtractionConfig, LoggingConfig, OutputConfig, OutputFormat,
    TaggerConfig,
};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for panlink operations
#[derive(Error, Debug)]
pub enum PanlinkError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Tagger unavailable: {0}")]
    TaggerUnavailable(String),

    #[error("Tagger error: {0}")]
    TaggerError(String),

    #[error("Tagger timed out after {0}s")]
    TaggerTimeout(u64),

    #[error("Invalid pattern: {0}")]
    PatternError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PanlinkError {
    /// Whether this error aborts a whole run rather than a single page
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_) | Self::ConfigError(_))
    }
}

pub type Result<T> = std::result::Result<T, PanlinkError>;

// ============================================================================
// Source Pages
// ============================================================================

/// One page of raw document text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page number, starting at 1
    pub number: u32,

    /// Raw extracted text
    pub text: String,

    /// Number of characters in `text`
    pub char_count: usize,
}

impl Page {
    /// Create a page, deriving its character count
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        let text = text.into();
        let char_count = text.chars().count();
        Self {
            number,
            text,
            char_count,
        }
    }
}

/// Anything that can yield the ordered pages of a document.
///
/// Implementations must return pages in document order. A source that
/// cannot be opened or parsed returns [`PanlinkError::SourceUnavailable`].
pub trait PageSource: Send + Sync {
    /// Read every page of the source
    fn read_pages(&self) -> Result<Vec<Page>>;

    /// Human-readable description for logging
    fn describe(&self) -> String;
}

/// Page source backed by pages already held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pages: Vec<Page>,
}

impl MemorySource {
    /// Create a source from pre-built pages
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Create a source from page texts, numbering them from 1
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = texts
            .into_iter()
            .zip(1u32..)
            .map(|(text, number)| Page::new(number, text))
            .collect();
        Self { pages }
    }
}

impl PageSource for MemorySource {
    fn read_pages(&self) -> Result<Vec<Page>> {
        Ok(self.pages.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory source ({} pages)", self.pages.len())
    }
}

// ============================================================================
// Entity Models
// ============================================================================

/// Category of an extracted entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityCategory {
    Identifier,
    Person,
    Organization,
}

impl EntityCategory {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identifier => "Identifier",
            Self::Person => "Person",
            Self::Organization => "Organization",
        }
    }
}

impl std::fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityCategory {
    type Err = PanlinkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "identifier" => Ok(Self::Identifier),
            "person" => Ok(Self::Person),
            "organization" => Ok(Self::Organization),
            _ => Err(PanlinkError::ValidationError(format!(
                "unknown entity category: {s}"
            ))),
        }
    }
}

/// How an entity was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Regular-expression pattern matching
    Regex,
    /// Named-entity tagger output
    Ner,
    /// Name found next to an identifier by the proximity linker
    ContextProximity,
    /// Observed by more than one method
    Multiple,
}

impl DetectionMethod {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regex => "regex",
            Self::Ner => "ner",
            Self::ContextProximity => "context_proximity",
            Self::Multiple => "multiple",
        }
    }

    /// Combine the method already on record with a newly observed one
    pub fn merge(self, other: Self) -> Self {
        if self == other {
            self
        } else {
            Self::Multiple
        }
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An identifier code located in page text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierMatch {
    /// The matched code, e.g. `ABCDE1234F`
    pub code: String,

    /// Byte offset of the match in the page text
    pub offset: usize,

    /// Text surrounding the match, used for proximity linking
    pub context: String,

    /// Detection method (always regex today)
    pub method: DetectionMethod,
}

/// A person or organization surface form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedEntity {
    pub text: String,
    pub category: EntityCategory,
    pub method: DetectionMethod,
}

impl NamedEntity {
    /// Create a new named entity
    pub fn new(text: impl Into<String>, category: EntityCategory, method: DetectionMethod) -> Self {
        Self {
            text: text.into(),
            category,
            method,
        }
    }
}

// ============================================================================
// Relation Models
// ============================================================================

/// Kind of relation between an identifier and a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    #[serde(rename = "identifier-of")]
    IdentifierOf,
}

impl RelationKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentifierOf => "identifier-of",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a relation was linked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMethod {
    /// Name found by lexical templates around the identifier
    ContextProximity,
    /// Name taken from the page's tagger output
    NerFallback,
}

impl LinkMethod {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContextProximity => "context_proximity",
            Self::NerFallback => "ner_fallback",
        }
    }

    /// Fixed confidence assigned to every relation linked this way
    pub fn confidence(&self) -> f32 {
        match self {
            Self::ContextProximity => 0.9,
            Self::NerFallback => 0.6,
        }
    }
}

impl std::fmt::Display for LinkMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A discovered association between an identifier and a name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    /// Identifier code
    pub identifier: String,

    /// Relation kind
    pub relation: RelationKind,

    /// Linked person/organization surface text
    pub entity: String,

    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,

    /// Linking method
    pub method: LinkMethod,
}

impl RelationRecord {
    /// Create a relation, taking its confidence from the link method
    pub fn new(identifier: impl Into<String>, entity: impl Into<String>, method: LinkMethod) -> Self {
        Self {
            identifier: identifier.into(),
            relation: RelationKind::IdentifierOf,
            entity: entity.into(),
            confidence: method.confidence(),
            method,
        }
    }
}

/// Confidence band used when summarising relations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    /// Classify a confidence score: >= 0.8 high, [0.6, 0.8) medium, < 0.6 low
    pub fn of(confidence: f32) -> Self {
        if confidence >= 0.8 {
            Self::High
        } else if confidence >= 0.6 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

// ============================================================================
// Inventory and Statistics
// ============================================================================

/// One row of the entity inventory table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryRow {
    pub entity_type: EntityCategory,
    pub value: String,
    pub method: DetectionMethod,
}

impl InventoryRow {
    /// Create a new inventory row
    pub fn new(entity_type: EntityCategory, value: impl Into<String>, method: DetectionMethod) -> Self {
        Self {
            entity_type,
            value: value.into(),
            method,
        }
    }
}

/// Counters accumulated over one extraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Unique run identifier
    pub run_id: Uuid,

    /// Number of pages read from the source
    pub total_pages: usize,

    /// Size of the union of identifier, person and organization sets
    pub entities_found: usize,

    /// Number of relation records emitted
    pub relations_found: usize,

    /// Detection counts keyed by method name
    pub extraction_methods: BTreeMap<String, usize>,

    /// Whether a model-backed tagger was active for the run
    pub tagger_available: bool,

    /// Pages whose tagger invocation failed or timed out
    pub pages_degraded: usize,

    /// Run start timestamp
    pub started_at: DateTime<Utc>,

    /// Run completion timestamp, set when statistics are finalized
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunStatistics {
    /// Create empty statistics for a new run
    pub fn new(tagger_available: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            total_pages: 0,
            entities_found: 0,
            relations_found: 0,
            extraction_methods: BTreeMap::new(),
            tagger_available,
            pages_degraded: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Increment the counter for a detection method
    pub fn record_method(&mut self, method: &str) {
        *self.extraction_methods.entry(method.to_string()).or_insert(0) += 1;
    }

    /// Count recorded for a detection method
    pub fn method_count(&self, method: &str) -> usize {
        self.extraction_methods.get(method).copied().unwrap_or(0)
    }
}

impl Default for RunStatistics {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Everything a finished run hands to the result store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunArtifacts {
    /// Relation table, in discovery order
    pub relations: Vec<RelationRecord>,

    /// Entity inventory table
    pub entities: Vec<InventoryRow>,

    /// Finalized run statistics
    pub statistics: RunStatistics,
}

impl RunArtifacts {
    /// Inventory values of one entity type
    pub fn values_of(&self, entity_type: EntityCategory) -> impl Iterator<Item = &str> {
        self.entities
            .iter()
            .filter(move |row| row.entity_type == entity_type)
            .map(|row| row.value.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
