//! Named Entity Recognition (NER) tagger module
//!
//! Provides two tagger variants behind the `NerTagger` trait:
//! - Model-backed: a token-classification inference service over HTTP
//! - No-op: returns nothing, used when no model is configured or the model
//!   fails to initialize
//!
//! `PageTagger` applies a tagger to a whole page: it splits the page into
//! fixed-size chunks, bounds every call with a timeout, drops short noise
//! spans, and collects persons and organizations in emission order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use panlink_core::{
    DetectionMethod, EntityCategory, ExtractionConfig, NamedEntity, PanlinkError, Result,
    TaggerConfig,
};

use crate::{NerTagger, TagLabel, TaggedSpan};

/// Text sent to the inference service when checking it is reachable
const HEALTH_CHECK_TEXT: &str = "Health check mentioning John Smith of Acme Corporation.";

// ============================================================================
// No-op Tagger
// ============================================================================

/// Tagger used when no model is available
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTagger;

#[async_trait]
impl NerTagger for NoopTagger {
    async fn tag(&self, _chunk: &str) -> Result<Vec<TaggedSpan>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "noop"
    }

    fn is_available(&self) -> bool {
        false
    }
}

// ============================================================================
// HTTP Tagger
// ============================================================================

/// Tagger backed by a token-classification inference endpoint
///
/// Speaks the HuggingFace inference request/response shape:
/// `{"inputs": "..."}` in, `[{"entity_group": "PER", "word": "..."}]` out.
pub struct HttpNerTagger {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
struct NerRequest<'a> {
    inputs: &'a str,
    parameters: NerParameters,
}

#[derive(Debug, Serialize)]
struct NerParameters {
    aggregation_strategy: &'static str,
}

#[derive(Debug, Deserialize)]
struct NerEntity {
    /// Aggregated label (`PER`, `ORG`, ...)
    entity_group: Option<String>,
    /// Per-token label (`B-PER`, `I-ORG`, ...) when aggregation is off
    entity: Option<String>,
    word: String,
}

impl HttpNerTagger {
    /// Create a tagger without checking the endpoint
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PanlinkError::TaggerUnavailable(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_token: None,
            model: model.into(),
        })
    }

    /// Set the bearer token
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Create from config and verify the endpoint answers a health-check request
    pub async fn connect(config: &TaggerConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_ref()
            .ok_or_else(|| PanlinkError::TaggerUnavailable("no endpoint configured".to_string()))?;

        let mut tagger = Self::new(
            endpoint.clone(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        if let Some(token) = &config.api_token {
            tagger = tagger.with_api_token(token.clone());
        }

        tagger
            .tag(HEALTH_CHECK_TEXT)
            .await
            .map_err(|e| PanlinkError::TaggerUnavailable(e.to_string()))?;

        Ok(tagger)
    }

    /// Parse an inference response body into tagged spans
    pub fn parse_response(body: &str) -> Result<Vec<TaggedSpan>> {
        let entities: Vec<NerEntity> = serde_json::from_str(body)
            .map_err(|e| PanlinkError::TaggerError(format!("Failed to parse response: {e}")))?;

        Ok(entities
            .into_iter()
            .map(|e| {
                let label = e
                    .entity_group
                    .as_deref()
                    .or(e.entity.as_deref())
                    .map_or(TagLabel::Other, TagLabel::from_model_label);
                TaggedSpan::new(e.word.trim(), label)
            })
            .collect())
    }
}

#[async_trait]
impl NerTagger for HttpNerTagger {
    async fn tag(&self, chunk: &str) -> Result<Vec<TaggedSpan>> {
        let request = NerRequest {
            inputs: chunk,
            parameters: NerParameters {
                aggregation_strategy: "simple",
            },
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PanlinkError::TaggerError(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PanlinkError::TaggerError(format!(
                "NER service returned {status}: {error_text}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PanlinkError::TaggerError(format!("Failed to read response: {e}")))?;

        Self::parse_response(&body)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Select the tagger variant once, at startup.
///
/// A disabled or unconfigured tagger, or one whose health check fails, yields a
/// `NoopTagger`; the run then proceeds regex-only.
pub async fn build_tagger(config: &TaggerConfig) -> Box<dyn NerTagger> {
    if !config.enabled {
        tracing::info!("NER tagger disabled, using regex-based extraction only");
        return Box::new(NoopTagger);
    }

    if config.endpoint.is_none() {
        tracing::info!("No NER endpoint configured, using regex-based extraction only");
        return Box::new(NoopTagger);
    }

    tracing::info!("Loading NER model {}", config.model);
    match HttpNerTagger::connect(config).await {
        Ok(tagger) => {
            tracing::info!("NER model {} ready", config.model);
            Box::new(tagger)
        }
        Err(e) => {
            tracing::warn!("Could not load NER model: {}. Continuing with regex-based extraction only", e);
            Box::new(NoopTagger)
        }
    }
}

// ============================================================================
// Page Tagging
// ============================================================================

/// Persons and organizations a tagger found on one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageTagging {
    /// Person names in tagger emission order, without repeats
    pub persons: Vec<String>,
    /// Organization names in tagger emission order, without repeats
    pub organizations: Vec<String>,
}

impl PageTagging {
    /// Persons then organizations, as tagger-detected entities
    pub fn entities(&self) -> impl Iterator<Item = NamedEntity> + '_ {
        let persons = self
            .persons
            .iter()
            .map(|name| NamedEntity::new(name.as_str(), EntityCategory::Person, DetectionMethod::Ner));
        let organizations = self.organizations.iter().map(|name| {
            NamedEntity::new(name.as_str(), EntityCategory::Organization, DetectionMethod::Ner)
        });
        persons.chain(organizations)
    }

    fn push(&mut self, span: TaggedSpan) {
        let target = match span.label {
            TagLabel::Person => &mut self.persons,
            TagLabel::Organization => &mut self.organizations,
            TagLabel::Other => return,
        };
        if !target.contains(&span.text) {
            target.push(span.text);
        }
    }
}

/// Split text into contiguous chunks of at most `size` characters.
///
/// Splits ignore word and sentence boundaries.
pub fn chunk_text(text: &str, size: usize) -> Vec<&str> {
    if size == 0 || text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == size {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&text[start..]);

    chunks
}

/// Applies a tagger to whole pages
pub struct PageTagger {
    tagger: Box<dyn NerTagger>,
    chunk_size: usize,
    min_chunk_chars: usize,
    min_entity_chars: usize,
    timeout: Duration,
}

impl PageTagger {
    /// Wrap a tagger with chunking and filtering settings
    pub fn new(tagger: Box<dyn NerTagger>, config: &ExtractionConfig, timeout: Duration) -> Self {
        Self {
            tagger,
            chunk_size: config.chunk_size,
            min_chunk_chars: config.min_chunk_chars,
            min_entity_chars: config.min_entity_chars,
            timeout,
        }
    }

    /// Whether a model backs the wrapped tagger
    pub fn is_available(&self) -> bool {
        self.tagger.is_available()
    }

    /// Name of the wrapped tagger
    pub fn name(&self) -> &str {
        self.tagger.name()
    }

    /// Tag one page. Any chunk failure or timeout fails the whole page.
    pub async fn tag_page(&self, text: &str) -> Result<PageTagging> {
        let mut tagging = PageTagging::default();

        for chunk in chunk_text(text, self.chunk_size) {
            if chunk.trim().chars().count() < self.min_chunk_chars {
                continue;
            }

            let spans = tokio::time::timeout(self.timeout, self.tagger.tag(chunk))
                .await
                .map_err(|_| PanlinkError::TaggerTimeout(self.timeout.as_secs()))??;

            for span in spans {
                let text = span.text.trim();
                if text.chars().count() < self.min_entity_chars {
                    continue;
                }
                tagging.push(TaggedSpan::new(text, span.label));
            }
        }

        Ok(tagging)
    }
}

// ============================================================================
// Tests
// ============================================================================
