//! Human-readable reports over run artifacts

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

use panlink_core::{
    ConfidenceBand, EntityCategory, InventoryRow, PanlinkError, RelationRecord, RunArtifacts,
};

use crate::store::StoredResults;

/// Relations shown in the sample section
const SAMPLE_SIZE: usize = 10;

/// Anchored identifier grammar used to re-check stored values
const IDENTIFIER_GRAMMAR: &str = r"^[A-Z]{5}[0-9]{4}[A-Z]$";

const RULE: &str = "======================================================================";
const THIN_RULE: &str = "----------------------------------------------------------------------";

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

// ============================================================================
// Confidence distribution
// ============================================================================

/// Relation counts per confidence band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfidenceDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl ConfidenceDistribution {
    pub fn from_relations(relations: &[RelationRecord]) -> Self {
        relations.iter().fold(Self::default(), |mut dist, r| {
            match ConfidenceBand::of(r.confidence) {
                ConfidenceBand::High => dist.high += 1,
                ConfidenceBand::Medium => dist.medium += 1,
                ConfidenceBand::Low => dist.low += 1,
            }
            dist
        })
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

impl fmt::Display for ConfidenceDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total();
        writeln!(f, "CONFIDENCE DISTRIBUTION:")?;
        writeln!(
            f,
            "   High Confidence (>=0.8): {} ({:.1}%)",
            self.high,
            percent(self.high, total)
        )?;
        writeln!(
            f,
            "   Medium Confidence (0.6-0.8): {} ({:.1}%)",
            self.medium,
            percent(self.medium, total)
        )?;
        writeln!(
            f,
            "   Low Confidence (<0.6): {} ({:.1}%)",
            self.low,
            percent(self.low, total)
        )
    }
}

// ============================================================================
// Report
// ============================================================================

/// Viewer over stored results
#[derive(Debug, Clone)]
pub struct Report {
    results: StoredResults,
}

impl Report {
    pub fn new(results: StoredResults) -> Self {
        Self { results }
    }

    pub fn confidence_distribution(&self) -> ConfidenceDistribution {
        ConfidenceDistribution::from_relations(&self.results.relations)
    }

    /// Inventory row counts per entity type
    pub fn counts_by_type(&self) -> BTreeMap<EntityCategory, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.results.entities {
            *counts.entry(row.entity_type).or_insert(0) += 1;
        }
        counts
    }

    /// First relations in stored order
    pub fn sample_relations(&self) -> &[RelationRecord] {
        let end = self.results.relations.len().min(SAMPLE_SIZE);
        &self.results.relations[..end]
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "{:^70}", "EXTRACTION RESULTS VIEWER")?;
        writeln!(f, "{RULE}")?;

        if let Some(stats) = &self.results.statistics {
            writeln!(f)?;
            writeln!(f, "OVERALL STATISTICS:")?;
            writeln!(f, "   Total Pages Processed: {}", stats.total_pages)?;
            writeln!(f, "   Total Entities Found: {}", stats.entities_found)?;
            writeln!(f, "   Total Relations Found: {}", stats.relations_found)?;
            if stats.pages_degraded > 0 {
                writeln!(f, "   Pages Without Tagger Output: {}", stats.pages_degraded)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "EXTRACTED RELATIONS:")?;
        writeln!(f, "   Total Relations: {}", self.results.relations.len())?;

        if self.results.relations.is_empty() {
            writeln!(f, "   No relations found.")?;
        } else {
            writeln!(f)?;
            writeln!(f, "   Sample Relations (Top {SAMPLE_SIZE}):")?;
            writeln!(f, "{THIN_RULE}")?;
            for r in self.sample_relations() {
                writeln!(f, "   {} -> {} -> {}", r.identifier, r.relation, r.entity)?;
                writeln!(f, "      Confidence: {:.2} | Method: {}", r.confidence, r.method)?;
                writeln!(f)?;
            }

            writeln!(f)?;
            write!(f, "{}", self.confidence_distribution())?;
        }

        writeln!(f)?;
        writeln!(f, "EXTRACTED ENTITIES BY TYPE:")?;
        let counts = self.counts_by_type();
        if counts.is_empty() {
            writeln!(f, "   No entities found.")?;
        }
        for (entity_type, count) in counts {
            writeln!(f, "   {entity_type}: {count}")?;
        }

        writeln!(f)?;
        writeln!(f, "{RULE}")
    }
}

// ============================================================================
// Identifier validation
// ============================================================================

/// Re-check of every stored identifier against the anchored grammar
#[derive(Debug, Clone, Default)]
pub struct IdentifierValidation {
    /// (value, is_valid) in inventory order
    pub entries: Vec<(String, bool)>,
}

impl IdentifierValidation {
    pub fn run(entities: &[InventoryRow]) -> panlink_core::Result<Self> {
        let grammar =
            Regex::new(IDENTIFIER_GRAMMAR).map_err(|e| PanlinkError::PatternError(e.to_string()))?;

        let entries = entities
            .iter()
            .filter(|row| row.entity_type == EntityCategory::Identifier)
            .map(|row| (row.value.clone(), grammar.is_match(&row.value)))
            .collect();

        Ok(Self { entries })
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn valid(&self) -> usize {
        self.entries.iter().filter(|(_, ok)| *ok).count()
    }

    pub fn invalid(&self) -> usize {
        self.total() - self.valid()
    }
}

impl fmt::Display for IdentifierValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IDENTIFIER FORMAT VALIDATION:")?;
        writeln!(f, "{RULE}")?;

        for (value, ok) in &self.entries {
            let status = if *ok { "VALID" } else { "INVALID" };
            writeln!(f, "   {value}: {status}")?;
        }

        writeln!(f)?;
        writeln!(f, "Validation Summary:")?;
        writeln!(f, "   Total Identifiers: {}", self.total())?;
        writeln!(
            f,
            "   Valid Identifiers: {} ({:.1}%)",
            self.valid(),
            percent(self.valid(), self.total())
        )?;
        writeln!(f, "   Invalid Identifiers: {}", self.invalid())?;
        writeln!(f, "{RULE}")
    }
}

// ============================================================================
// Run summary
// ============================================================================

/// Console summary printed after an extraction run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total_pages: usize,
    pub identifiers: usize,
    pub persons: usize,
    pub organizations: usize,
    pub relations: usize,
    pub total_entities: usize,
    pub methods: BTreeMap<String, usize>,
    pub tagger_available: bool,
    pub pages_degraded: usize,
}

impl RunSummary {
    pub fn from_artifacts(artifacts: &RunArtifacts) -> Self {
        let stats = &artifacts.statistics;
        Self {
            total_pages: stats.total_pages,
            identifiers: artifacts.values_of(EntityCategory::Identifier).count(),
            persons: artifacts.values_of(EntityCategory::Person).count(),
            organizations: artifacts.values_of(EntityCategory::Organization).count(),
            relations: stats.relations_found,
            total_entities: stats.entities_found,
            methods: stats.extraction_methods.clone(),
            tagger_available: stats.tagger_available,
            pages_degraded: stats.pages_degraded,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "EXTRACTION COMPLETE - SUMMARY")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Total Pages Processed: {}", self.total_pages)?;
        writeln!(f, "Identifiers Found: {}", self.identifiers)?;
        writeln!(f, "Persons Found: {}", self.persons)?;
        writeln!(f, "Organizations Found: {}", self.organizations)?;
        writeln!(f, "Relations Created: {}", self.relations)?;
        writeln!(f, "Total Entities: {}", self.total_entities)?;
        if !self.tagger_available {
            writeln!(f, "NER tagger: unavailable (regex-only run)")?;
        } else if self.pages_degraded > 0 {
            writeln!(f, "Pages without tagger output: {}", self.pages_degraded)?;
        }

        writeln!(f)?;
        writeln!(f, "Extraction Methods Used:")?;
        for (method, count) in &self.methods {
            writeln!(f, "   - {method}: {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panlink_core::{DetectionMethod, LinkMethod, RunStatistics};

    fn results() -> StoredResults {
        let mut relations: Vec<RelationRecord> = (0..12)
            .map(|i| {
                RelationRecord::new(
                    "ABCDE1234F",
                    format!("Person Number{i}"),
                    LinkMethod::NerFallback,
                )
            })
            .collect();
        relations.insert(
            0,
            RelationRecord::new("ABCDE1234F", "Priya Sharma", LinkMethod::ContextProximity),
        );
        let mut low = RelationRecord::new("ABCDE1234F", "Ravi Kumar", LinkMethod::NerFallback);
        low.confidence = 0.4;
        relations.push(low);

        StoredResults {
            relations,
            entities: vec![
                InventoryRow::new(EntityCategory::Identifier, "ABCDE1234F", DetectionMethod::Regex),
                InventoryRow::new(EntityCategory::Identifier, "ABCDE1234", DetectionMethod::Regex),
                InventoryRow::new(EntityCategory::Person, "Priya Sharma", DetectionMethod::Ner),
            ],
            statistics: Some(RunStatistics::new(true)),
        }
    }

    #[test]
    fn test_confidence_distribution() {
        let report = Report::new(results());
        let dist = report.confidence_distribution();

        assert_eq!(dist, ConfidenceDistribution { high: 1, medium: 12, low: 1 });
        assert_eq!(dist.total(), 14);

        let rendered = dist.to_string();
        assert!(rendered.contains("High Confidence (>=0.8): 1 (7.1%)"));
        assert!(rendered.contains("Low Confidence (<0.6): 1 (7.1%)"));
    }

    #[test]
    fn test_sample_capped_at_ten() {
        let report = Report::new(results());
        assert_eq!(report.sample_relations().len(), 10);
        assert_eq!(report.sample_relations()[0].entity, "Priya Sharma");

        let rendered = report.to_string();
        assert!(rendered.contains("ABCDE1234F -> identifier-of -> Priya Sharma"));
        assert!(rendered.contains("Confidence: 0.90 | Method: context_proximity"));
        assert!(!rendered.contains("Person Number10"));
    }

    #[test]
    fn test_counts_by_type() {
        let counts = Report::new(results()).counts_by_type();
        assert_eq!(counts[&EntityCategory::Identifier], 2);
        assert_eq!(counts[&EntityCategory::Person], 1);
        assert!(!counts.contains_key(&EntityCategory::Organization));
    }

    #[test]
    fn test_empty_results_render() {
        let rendered = Report::new(StoredResults::default()).to_string();
        assert!(rendered.contains("Total Relations: 0"));
        assert!(rendered.contains("No relations found."));
        assert!(rendered.contains("No entities found."));
        assert!(!rendered.contains("OVERALL STATISTICS"));
    }

    #[test]
    fn test_identifier_validation() {
        let validation = IdentifierValidation::run(&results().entities).unwrap();

        assert_eq!(validation.total(), 2);
        assert_eq!(validation.valid(), 1);
        assert_eq!(validation.invalid(), 1);

        let rendered = validation.to_string();
        assert!(rendered.contains("ABCDE1234F: VALID"));
        assert!(rendered.contains("ABCDE1234: INVALID"));
        assert!(rendered.contains("Valid Identifiers: 1 (50.0%)"));
    }

    #[test]
    fn test_validation_without_identifiers() {
        let validation = IdentifierValidation::run(&[]).unwrap();
        assert_eq!(validation.total(), 0);
        assert!(validation.to_string().contains("Valid Identifiers: 0 (0.0%)"));
    }

    #[test]
    fn test_run_summary() {
        let mut statistics = RunStatistics::new(false);
        statistics.total_pages = 2;
        statistics.entities_found = 2;
        statistics.relations_found = 1;
        statistics.record_method("regex_identifier");

        let artifacts = RunArtifacts {
            relations: vec![RelationRecord::new(
                "ABCDE1234F",
                "Priya Sharma",
                LinkMethod::ContextProximity,
            )],
            entities: vec![
                InventoryRow::new(EntityCategory::Identifier, "ABCDE1234F", DetectionMethod::Regex),
                InventoryRow::new(
                    EntityCategory::Person,
                    "Priya Sharma",
                    DetectionMethod::ContextProximity,
                ),
            ],
            statistics,
        };

        let summary = RunSummary::from_artifacts(&artifacts);
        assert_eq!(summary.identifiers, 1);
        assert_eq!(summary.persons, 1);
        assert_eq!(summary.organizations, 0);

        let rendered = summary.to_string();
        assert!(rendered.contains("Relations Created: 1"));
        assert!(rendered.contains("regex-only run"));
        assert!(rendered.contains("   - regex_identifier: 1"));
    }
}
