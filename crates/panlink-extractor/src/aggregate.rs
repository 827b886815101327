//! Run-scoped aggregation
//!
//! Collects the entity sets, relation list and counters of a single
//! extraction run. Created at run start, finalized into `RunArtifacts`
//! at run end.

use std::collections::BTreeMap;

use chrono::Utc;

use panlink_core::{
    DetectionMethod, EntityCategory, IdentifierMatch, InventoryRow, NamedEntity, RelationRecord,
    RunArtifacts, RunStatistics,
};

/// Statistics counter names
pub const REGEX_IDENTIFIER: &str = "regex_identifier";
pub const REGEX_ORG: &str = "regex_org";
pub const NER_PERSON: &str = "ner_person";
pub const NER_ORG: &str = "ner_org";

/// Accumulated state of one extraction run
#[derive(Debug)]
pub struct RunAggregate {
    /// Entity sets keyed by exact surface text, with the detection method on record
    identifiers: BTreeMap<String, DetectionMethod>,
    persons: BTreeMap<String, DetectionMethod>,
    organizations: BTreeMap<String, DetectionMethod>,
    /// Append-only relation list, in discovery order
    relations: Vec<RelationRecord>,
    statistics: RunStatistics,
}

impl RunAggregate {
    /// Start a new run
    pub fn new(tagger_available: bool) -> Self {
        Self {
            identifiers: BTreeMap::new(),
            persons: BTreeMap::new(),
            organizations: BTreeMap::new(),
            relations: Vec::new(),
            statistics: RunStatistics::new(tagger_available),
        }
    }

    /// Record the number of pages read from the source
    pub fn set_total_pages(&mut self, total_pages: usize) {
        self.statistics.total_pages = total_pages;
    }

    /// Record an identifier match
    pub fn add_identifier(&mut self, identifier: &IdentifierMatch) {
        insert(&mut self.identifiers, &identifier.code, identifier.method);
        self.statistics.record_method(REGEX_IDENTIFIER);
    }

    /// Record a named entity in the set for its category
    pub fn add_entity(&mut self, entity: &NamedEntity) {
        let set = match entity.category {
            EntityCategory::Identifier => &mut self.identifiers,
            EntityCategory::Person => &mut self.persons,
            EntityCategory::Organization => &mut self.organizations,
        };
        insert(set, &entity.text, entity.method);

        match (entity.category, entity.method) {
            (EntityCategory::Organization, DetectionMethod::Regex) => {
                self.statistics.record_method(REGEX_ORG)
            }
            (EntityCategory::Organization, DetectionMethod::Ner) => {
                self.statistics.record_method(NER_ORG)
            }
            (EntityCategory::Person, DetectionMethod::Ner) => {
                self.statistics.record_method(NER_PERSON)
            }
            _ => {}
        }
    }

    /// Append a relation record
    pub fn add_relation(&mut self, relation: RelationRecord) {
        self.relations.push(relation);
        self.statistics.relations_found += 1;
    }

    /// Count a page whose tagger output was discarded
    pub fn record_degraded_page(&mut self) {
        self.statistics.pages_degraded += 1;
    }

    pub fn identifier_count(&self) -> usize {
        self.identifiers.len()
    }

    pub fn organization_count(&self) -> usize {
        self.organizations.len()
    }

    /// Current statistics (not yet finalized)
    pub fn statistics(&self) -> &RunStatistics {
        &self.statistics
    }

    /// Finalize the run: compute the entity total from the sets and build
    /// the inventory (identifiers, then persons, then organizations).
    pub fn finalize(self) -> RunArtifacts {
        let Self {
            identifiers,
            persons,
            organizations,
            relations,
            mut statistics,
        } = self;

        statistics.entities_found = identifiers.len() + persons.len() + organizations.len();
        statistics.finished_at = Some(Utc::now());

        let entities = [
            (EntityCategory::Identifier, identifiers),
            (EntityCategory::Person, persons),
            (EntityCategory::Organization, organizations),
        ]
        .into_iter()
        .flat_map(|(category, set)| {
            set.into_iter()
                .map(move |(value, method)| InventoryRow::new(category, value, method))
        })
        .collect();

        RunArtifacts {
            relations,
            entities,
            statistics,
        }
    }
}

fn insert(set: &mut BTreeMap<String, DetectionMethod>, text: &str, method: DetectionMethod) {
    set.entry(text.to_string())
        .and_modify(|existing| *existing = existing.merge(method))
        .or_insert(method);
}

#[cfg(test)]
mod tests {
    use super::*;
    use panlink_core::LinkMethod;

    fn person(name: &str, method: DetectionMethod) -> NamedEntity {
        NamedEntity::new(name, EntityCategory::Person, method)
    }

    fn organization(name: &str, method: DetectionMethod) -> NamedEntity {
        NamedEntity::new(name, EntityCategory::Organization, method)
    }

    fn identifier(code: &str) -> IdentifierMatch {
        IdentifierMatch {
            code: code.to_string(),
            offset: 0,
            context: code.to_string(),
            method: DetectionMethod::Regex,
        }
    }

    #[test]
    fn test_sets_collapse_exact_spellings() {
        let mut aggregate = RunAggregate::new(false);
        aggregate.add_identifier(&identifier("ABCDE1234F"));
        aggregate.add_identifier(&identifier("ABCDE1234F"));
        aggregate.add_entity(&organization("Acme Bank", DetectionMethod::Regex));
        aggregate.add_entity(&organization("Acme Bank", DetectionMethod::Regex));

        assert_eq!(aggregate.identifier_count(), 1);
        assert_eq!(aggregate.organization_count(), 1);
        // Counters count observations, not distinct values
        assert_eq!(aggregate.statistics().method_count(REGEX_IDENTIFIER), 2);
        assert_eq!(aggregate.statistics().method_count(REGEX_ORG), 2);
    }

    #[test]
    fn test_method_merge_in_inventory() {
        let mut aggregate = RunAggregate::new(true);
        aggregate.add_entity(&person("Priya Sharma", DetectionMethod::ContextProximity));
        aggregate.add_entity(&person("Priya Sharma", DetectionMethod::Ner));
        aggregate.add_entity(&person("Ravi Kumar", DetectionMethod::Ner));

        let artifacts = aggregate.finalize();
        let priya = artifacts
            .entities
            .iter()
            .find(|row| row.value == "Priya Sharma")
            .unwrap();
        assert_eq!(priya.method, DetectionMethod::Multiple);
        assert_eq!(artifacts.statistics.method_count(NER_PERSON), 2);
    }

    #[test]
    fn test_finalize_counts_and_order() {
        let mut aggregate = RunAggregate::new(false);
        aggregate.set_total_pages(2);
        aggregate.add_entity(&organization("Acme Technologies Ltd", DetectionMethod::Regex));
        aggregate.add_entity(&person("John Smith", DetectionMethod::ContextProximity));
        aggregate.add_identifier(&identifier("PQRST6789Z"));
        aggregate.add_identifier(&identifier("ABCDE1234F"));
        aggregate.add_relation(RelationRecord::new(
            "ABCDE1234F",
            "John Smith",
            LinkMethod::ContextProximity,
        ));
        aggregate.record_degraded_page();

        let artifacts = aggregate.finalize();
        let stats = &artifacts.statistics;

        assert_eq!(stats.total_pages, 2);
        assert_eq!(stats.entities_found, 4);
        assert_eq!(stats.relations_found, 1);
        assert_eq!(stats.pages_degraded, 1);
        assert!(stats.finished_at.is_some());

        let types: Vec<EntityCategory> = artifacts.entities.iter().map(|r| r.entity_type).collect();
        assert_eq!(
            types,
            vec![
                EntityCategory::Identifier,
                EntityCategory::Identifier,
                EntityCategory::Person,
                EntityCategory::Organization,
            ]
        );
        assert_eq!(artifacts.entities[0].value, "ABCDE1234F");
    }

    #[test]
    fn test_same_text_in_two_categories() {
        let mut aggregate = RunAggregate::new(true);
        aggregate.add_entity(&person("Tata Sons", DetectionMethod::Ner));
        aggregate.add_entity(&organization("Tata Sons", DetectionMethod::Ner));

        let artifacts = aggregate.finalize();
        assert_eq!(artifacts.statistics.entities_found, 2);
    }
}
