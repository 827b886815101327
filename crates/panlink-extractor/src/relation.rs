//! Relation building module
//!
//! Turns the identifiers found on a page into `identifier-of` relations.
//! Proximity links come first; tagger persons are a fallback used only
//! when the context window yields no candidate.

use panlink_core::{IdentifierMatch, LinkMethod, RelationRecord, Result};

use crate::linker::ContextLinker;

/// Builds relation records for one page at a time
pub struct RelationBuilder {
    linker: ContextLinker,
    /// Maximum fallback persons linked per identifier
    fallback_limit: usize,
}

impl RelationBuilder {
    /// Create a builder with the standard linker
    pub fn new(fallback_limit: usize) -> Result<Self> {
        Ok(Self {
            linker: ContextLinker::new()?,
            fallback_limit,
        })
    }

    /// Relations for one identifier.
    ///
    /// Every proximity candidate yields a 0.9 record. Without candidates, the
    /// first `fallback_limit` page persons yield 0.6 records each; they are
    /// taken in tagger emission order regardless of distance to the code.
    pub fn link(&self, identifier: &IdentifierMatch, page_persons: &[String]) -> Vec<RelationRecord> {
        let candidates = self.linker.candidates(identifier);

        if !candidates.is_empty() {
            return candidates
                .into_iter()
                .map(|name| {
                    RelationRecord::new(identifier.code.as_str(), name, LinkMethod::ContextProximity)
                })
                .collect();
        }

        page_persons
            .iter()
            .take(self.fallback_limit)
            .map(|name| {
                RelationRecord::new(identifier.code.as_str(), name.as_str(), LinkMethod::NerFallback)
            })
            .collect()
    }

    /// Relations for every identifier on a page, in identifier order
    pub fn build(&self, identifiers: &[IdentifierMatch], page_persons: &[String]) -> Vec<RelationRecord> {
        identifiers
            .iter()
            .flat_map(|identifier| self.link(identifier, page_persons))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panlink_core::DetectionMethod;

    fn identifier(code: &str, context: &str) -> IdentifierMatch {
        IdentifierMatch {
            code: code.to_string(),
            offset: 0,
            context: context.to_string(),
            method: DetectionMethod::Regex,
        }
    }

    fn persons(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_proximity_link() {
        let builder = RelationBuilder::new(3).unwrap();
        let m = identifier("ABCDE1234F", "Ms. Priya Sharma, PAN: ABCDE1234F");

        let relations = builder.link(&m, &persons(&["Someone Else"]));
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].entity, "Priya Sharma");
        assert_eq!(relations[0].confidence, 0.9);
        assert_eq!(relations[0].method, LinkMethod::ContextProximity);
    }

    #[test]
    fn test_fallback_capped() {
        let builder = RelationBuilder::new(3).unwrap();
        let m = identifier("ABCDE1234F", "reference ABCDE1234F on file");
        let page = persons(&["Anil Kapoor", "Bina Shah", "Chetan Rao", "Divya Iyer"]);

        let relations = builder.link(&m, &page);
        assert_eq!(relations.len(), 3);
        let linked: Vec<&str> = relations.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(linked, vec!["Anil Kapoor", "Bina Shah", "Chetan Rao"]);
        assert!(relations
            .iter()
            .all(|r| r.confidence == 0.6 && r.method == LinkMethod::NerFallback));
    }

    #[test]
    fn test_no_candidates_no_persons() {
        let builder = RelationBuilder::new(3).unwrap();
        let m = identifier("ABCDE1234F", "reference ABCDE1234F on file");
        assert!(builder.link(&m, &[]).is_empty());
    }

    #[test]
    fn test_build_per_identifier() {
        let builder = RelationBuilder::new(1).unwrap();
        let identifiers = vec![
            identifier("ABCDE1234F", "Mr. John Smith ABCDE1234F"),
            identifier("PQRST6789Z", "unlabelled PQRST6789Z"),
        ];

        let relations = builder.build(&identifiers, &persons(&["Meena Joshi", "Ravi Kumar"]));
        assert_eq!(relations.len(), 2);
        assert_eq!(relations[0].identifier, "ABCDE1234F");
        assert_eq!(relations[0].entity, "John Smith");
        assert_eq!(relations[1].identifier, "PQRST6789Z");
        assert_eq!(relations[1].entity, "Meena Joshi");
    }
}
