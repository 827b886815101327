//! Context-proximity linker
//!
//! Searches the context window around an identifier for a person name using
//! four lexical templates. All templates are tried; every accepted candidate
//! is equally valid.

use regex::Regex;

use panlink_core::{IdentifierMatch, Result};

use crate::patterns::compile;

/// Title followed by one to three capitalized words
const HONORIFIC_TEMPLATE: &str =
    r"\b(?i:Mrs|Mr|Ms|Dr|Prof|Shri|Smt)\.?\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2})";

/// "Name:" labeled field with two to four capitalized words
const LABELED_TEMPLATE: &str = r"\b(?i:name)[:\s]+([A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,3})";

/// Two capitalized words, a dash, then an identifier
const NAME_THEN_CODE_TEMPLATE: &str =
    r"([A-Z][a-z]+\s+[A-Z][a-z]+)\s*[-–—]\s*([A-Z]{5}[0-9]{4}[A-Z])";

/// An identifier, a dash, then two capitalized words
const CODE_THEN_NAME_TEMPLATE: &str =
    r"([A-Z]{5}[0-9]{4}[A-Z])\s*[-–—]\s*([A-Z][a-z]+\s+[A-Z][a-z]+)";

const MIN_NAME_CHARS: usize = 4;
const MAX_NAME_CHARS: usize = 50;

/// Which capture groups of a template hold the name and (optionally) the code
struct Template {
    regex: Regex,
    name_group: usize,
    code_group: Option<usize>,
}

/// Finds person names near an identifier
pub struct ContextLinker {
    templates: Vec<Template>,
}

impl ContextLinker {
    /// Create a linker with the standard templates
    pub fn new() -> Result<Self> {
        Ok(Self {
            templates: vec![
                Template {
                    regex: compile(HONORIFIC_TEMPLATE)?,
                    name_group: 1,
                    code_group: None,
                },
                Template {
                    regex: compile(LABELED_TEMPLATE)?,
                    name_group: 1,
                    code_group: None,
                },
                Template {
                    regex: compile(NAME_THEN_CODE_TEMPLATE)?,
                    name_group: 1,
                    code_group: Some(2),
                },
                Template {
                    regex: compile(CODE_THEN_NAME_TEMPLATE)?,
                    name_group: 2,
                    code_group: Some(1),
                },
            ],
        })
    }

    /// Candidate names for an identifier, deduplicated in first-seen order
    pub fn candidates(&self, identifier: &IdentifierMatch) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();

        for template in &self.templates {
            for caps in template.regex.captures_iter(&identifier.context) {
                // Separator templates must point at this identifier, not a neighbour
                if let Some(code_group) = template.code_group {
                    if caps.get(code_group).map(|c| c.as_str()) != Some(identifier.code.as_str()) {
                        continue;
                    }
                }

                let Some(name) = caps.get(template.name_group) else {
                    continue;
                };
                let name = name.as_str().trim();

                if is_plausible_name(name) && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }

        names
    }
}

/// At least two whitespace-separated tokens and 4-50 characters
fn is_plausible_name(name: &str) -> bool {
    let len = name.chars().count();
    name.split_whitespace().count() >= 2 && (MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&len)
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

    #[test]
    fn test_honorific_template() {
        let linker = ContextLinker::new().unwrap();
        let m = identifier("ABCDE1234F", "Mr. John Smith ABCDE1234F");

        let names = linker.candidates(&m);
        assert_eq!(names, vec!["John Smith".to_string()]);

        // Idempotent
        assert_eq!(linker.candidates(&m), names);
    }

    #[test]
    fn test_honorific_variants() {
        let linker = ContextLinker::new().unwrap();

        let m = identifier("ABCDE1234F", "Smt Lakshmi Devi Rao, ABCDE1234F");
        assert_eq!(linker.candidates(&m), vec!["Lakshmi Devi Rao".to_string()]);

        let m = identifier("ABCDE1234F", "MRS. Anita Desai ABCDE1234F");
        assert_eq!(linker.candidates(&m), vec!["Anita Desai".to_string()]);
    }

    #[test]
    fn test_single_word_rejected() {
        let linker = ContextLinker::new().unwrap();
        let m = identifier("ABCDE1234F", "Dr. Smith holds ABCDE1234F");
        assert!(linker.candidates(&m).is_empty());
    }

    #[test]
    fn test_labeled_template() {
        let linker = ContextLinker::new().unwrap();
        let m = identifier("ABCDE1234F", "Name: Ravi Kumar\nPAN: ABCDE1234F");
        assert_eq!(linker.candidates(&m), vec!["Ravi Kumar".to_string()]);
    }

    #[test]
    fn test_separator_templates() {
        let linker = ContextLinker::new().unwrap();

        let m = identifier("ABCDE1234F", "Sunil Mehta - ABCDE1234F");
        assert_eq!(linker.candidates(&m), vec!["Sunil Mehta".to_string()]);

        let m = identifier("ABCDE1234F", "ABCDE1234F — Kavita Nair");
        assert_eq!(linker.candidates(&m), vec!["Kavita Nair".to_string()]);
    }

    #[test]
    fn test_separator_ignores_other_identifiers() {
        let linker = ContextLinker::new().unwrap();
        let m = identifier(
            "ABCDE1234F",
            "Sunil Mehta - PQRST6789Z; ABCDE1234F – Kavita Nair",
        );
        assert_eq!(linker.candidates(&m), vec!["Kavita Nair".to_string()]);
    }

    #[test]
    fn test_candidates_deduplicated_across_templates() {
        let linker = ContextLinker::new().unwrap();
        let m = identifier("ABCDE1234F", "Mr. Arjun Rao - ABCDE1234F");
        assert_eq!(linker.candidates(&m), vec!["Arjun Rao".to_string()]);
    }

    #[test]
    fn test_name_length_bounds() {
        assert!(is_plausible_name("Al Bo"));
        assert!(!is_plausible_name("Al"));
        assert!(!is_plausible_name(&format!("{} {}", "A".repeat(30), "B".repeat(30))));
    }
}
