//! panlink Extractor - Identifier and relation extraction pipeline
//!
//! Locates identifier codes with pattern matching, finds person and
//! organization names with a pluggable named-entity tagger, and links each
//! identifier to the most plausible nearby names.

use async_trait::async_trait;
use panlink_core::Result;

/// Category assigned by a named-entity tagger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagLabel {
    Person,
    Organization,
    /// Any other category (locations, misc); ignored downstream
    Other,
}

impl TagLabel {
    /// Map a model label such as `PER`, `B-ORG` or `PERSON`
    pub fn from_model_label(label: &str) -> Self {
        let label = label
            .strip_prefix("B-")
            .or_else(|| label.strip_prefix("I-"))
            .unwrap_or(label);

        match label.to_uppercase().as_str() {
            "PER" | "PERSON" => Self::Person,
            "ORG" | "ORGANIZATION" | "ORGANISATION" => Self::Organization,
            _ => Self::Other,
        }
    }
}

/// A span of text classified by a tagger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedSpan {
    pub text: String,
    pub label: TagLabel,
}

impl TaggedSpan {
    pub fn new(text: impl Into<String>, label: TagLabel) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Trait for named-entity taggers
///
/// Callers never branch on which implementation they hold: an absent model
/// is represented by a tagger that returns nothing.
#[async_trait]
pub trait NerTagger: Send + Sync {
    /// Classify spans of one chunk of text (at most one chunk's worth of characters)
    async fn tag(&self, chunk: &str) -> Result<Vec<TaggedSpan>>;

    /// Get tagger name for logging
    fn name(&self) -> &str;

    /// Whether a model actually backs this tagger
    fn is_available(&self) -> bool {
        true
    }
}

pub mod aggregate;
pub mod linker;
pub mod ner;
pub mod patterns;
pub mod pipeline;
pub mod relation;

pub use aggregate::RunAggregate;
pub use linker::ContextLinker;
pub use ner::{build_tagger, HttpNerTagger, NoopTagger, PageTagger, PageTagging};
pub use patterns::{is_valid_identifier, PatternMatcher};
pub use pipeline::{ExtractionPipeline, PageExtraction, RunState};
pub use relation::RelationBuilder;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_label_mapping() {
        assert_eq!(TagLabel::from_model_label("PER"), TagLabel::Person);
        assert_eq!(TagLabel::from_model_label("B-PER"), TagLabel::Person);
        assert_eq!(TagLabel::from_model_label("I-ORG"), TagLabel::Organization);
        assert_eq!(TagLabel::from_model_label("organization"), TagLabel::Organization);
        assert_eq!(TagLabel::from_model_label("LOC"), TagLabel::Other);
        assert_eq!(TagLabel::from_model_label("MISC"), TagLabel::Other);
    }
}
