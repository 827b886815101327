//! Extraction orchestrator
//!
//! Drives one run over a page source:
//! `Idle -> ReadingSource -> PerPageExtraction -> Aggregating -> Done`,
//! or `ReadingSource -> Failed` when the source cannot be read. A page whose
//! tagger call fails is logged and degraded; it never fails the run.

use std::time::Duration;

use panlink_core::{
    AppConfig, DetectionMethod, EntityCategory, ExtractionConfig, IdentifierMatch, LinkMethod,
    NamedEntity, Page, PageSource, PanlinkError, Result, RunArtifacts,
};

use crate::aggregate::RunAggregate;
use crate::ner::{build_tagger, PageTagger, PageTagging};
use crate::patterns::PatternMatcher;
use crate::relation::RelationBuilder;
use crate::NerTagger;

/// Pages between progress log lines
const PROGRESS_INTERVAL: u32 = 10;

/// Lifecycle state of an extraction run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    ReadingSource,
    PerPageExtraction,
    Aggregating,
    Done,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ReadingSource => "reading_source",
            Self::PerPageExtraction => "per_page_extraction",
            Self::Aggregating => "aggregating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of extracting a single page
#[derive(Debug)]
pub struct PageExtraction {
    /// Page number
    pub page: u32,
    /// Identifier matches, in text order
    pub identifiers: Vec<IdentifierMatch>,
    /// Pattern-matched organizations, one per accepted template match
    pub organizations: Vec<String>,
    /// Tagger output, or the reason it is missing for this page
    pub tagging: Result<PageTagging>,
}

/// Runs pattern matching, tagging and linking over every page of a source
pub struct ExtractionPipeline {
    matcher: PatternMatcher,
    relations: RelationBuilder,
    tagger: PageTagger,
    state: RunState,
}

impl ExtractionPipeline {
    /// Create a pipeline around an already-selected tagger
    pub fn new(
        config: &ExtractionConfig,
        tagger: Box<dyn NerTagger>,
        tagger_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            matcher: PatternMatcher::new(config.context_radius)?,
            relations: RelationBuilder::new(config.fallback_limit)?,
            tagger: PageTagger::new(tagger, config, tagger_timeout),
            state: RunState::Idle,
        })
    }

    /// Create a pipeline from application config, selecting the tagger once
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let tagger = build_tagger(&config.tagger).await;
        Self::new(
            &config.extraction,
            tagger,
            Duration::from_secs(config.tagger.timeout_secs),
        )
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Whether a model-backed tagger is in use
    pub fn tagger_available(&self) -> bool {
        self.tagger.is_available()
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!("Run state {} -> {}", self.state, next);
        self.state = next;
    }

    /// Run extraction over every page of the source.
    ///
    /// Fails only when the source cannot be read or holds no pages.
    pub async fn run(&mut self, source: &dyn PageSource) -> Result<RunArtifacts> {
        self.transition(RunState::ReadingSource);
        tracing::info!("Reading {}", source.describe());

        let pages = match source.read_pages() {
            Ok(pages) if pages.is_empty() => {
                self.transition(RunState::Failed);
                return Err(PanlinkError::SourceUnavailable(format!(
                    "{} contains no pages",
                    source.describe()
                )));
            }
            Ok(pages) => pages,
            Err(e) => {
                self.transition(RunState::Failed);
                tracing::error!("Failed to read source: {}", e);
                return Err(match e {
                    PanlinkError::SourceUnavailable(_) => e,
                    other => PanlinkError::SourceUnavailable(other.to_string()),
                });
            }
        };

        let total = pages.len();
        tracing::info!(
            "Analyzing {} pages (tagger: {})",
            total,
            self.tagger.name()
        );

        let mut aggregate = RunAggregate::new(self.tagger.is_available());
        aggregate.set_total_pages(total);

        self.transition(RunState::PerPageExtraction);
        for page in &pages {
            let extraction = self.extract_page(page).await;
            self.apply(&mut aggregate, extraction);

            if page.number % PROGRESS_INTERVAL == 0 {
                tracing::info!("Analyzed page {}/{}", page.number, total);
            }
        }

        self.transition(RunState::Aggregating);
        let artifacts = aggregate.finalize();

        self.transition(RunState::Done);
        tracing::info!(
            "Extraction complete: {} entities, {} relations, {} degraded pages",
            artifacts.statistics.entities_found,
            artifacts.statistics.relations_found,
            artifacts.statistics.pages_degraded
        );

        Ok(artifacts)
    }

    /// Pattern matching and tagging for one page
    pub async fn extract_page(&self, page: &Page) -> PageExtraction {
        let identifiers = self.matcher.find_identifiers(&page.text);
        let organizations = self.matcher.find_organizations(&page.text);

        let tagging = self.tagger.tag_page(&page.text).await;

        tracing::debug!(
            "Page {}: {} identifiers, {} organizations",
            page.number,
            identifiers.len(),
            organizations.len()
        );

        PageExtraction {
            page: page.number,
            identifiers,
            organizations,
            tagging,
        }
    }

    /// Fold one page's output into the run aggregate and link its identifiers
    fn apply(&self, aggregate: &mut RunAggregate, extraction: PageExtraction) {
        let PageExtraction {
            page,
            identifiers,
            organizations,
            tagging,
        } = extraction;

        for identifier in &identifiers {
            aggregate.add_identifier(identifier);
        }
        for organization in organizations {
            aggregate.add_entity(&NamedEntity::new(
                organization,
                EntityCategory::Organization,
                DetectionMethod::Regex,
            ));
        }

        let persons = match tagging {
            Ok(tagging) => {
                for entity in tagging.entities() {
                    aggregate.add_entity(&entity);
                }
                tagging.persons
            }
            Err(e) => {
                tracing::warn!("NER extraction failed on page {}: {}", page, e);
                aggregate.record_degraded_page();
                Vec::new()
            }
        };

        for relation in self.relations.build(&identifiers, &persons) {
            if relation.method == LinkMethod::ContextProximity {
                aggregate.add_entity(&NamedEntity::new(
                    relation.entity.as_str(),
                    EntityCategory::Person,
                    DetectionMethod::ContextProximity,
                ));
            }
            aggregate.add_relation(relation);
        }
    }
}
