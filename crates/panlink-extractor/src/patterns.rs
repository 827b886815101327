//! Pattern matchers for identifier codes and organization names
//!
//! Identifier codes follow a fixed grammar: five uppercase letters, four
//! digits, one uppercase letter, as a whole-word token. Organizations are
//! detected with two independent lexical templates (legal-entity suffixes
//! and industry keywords); a string matching both is reported twice.

use regex::Regex;

use panlink_core::{DetectionMethod, IdentifierMatch, PanlinkError, Result};

/// Whole-word identifier grammar
const IDENTIFIER_PATTERN: &str = r"\b[A-Z]{5}[0-9]{4}[A-Z]\b";

/// Capitalized words ending in a legal-entity suffix
const LEGAL_SUFFIX_PATTERN: &str =
    r"\b([A-Z][A-Za-z&\s]+(?:Ltd|Limited|Pvt|Private|Corporation|Corp|Inc|LLC|LLP|Company|Co\.))";

/// Capitalized words ending in an industry keyword
const INDUSTRY_SUFFIX_PATTERN: &str =
    r"\b([A-Z][A-Za-z\s]+(?:Bank|Insurance|Industries|Systems|Solutions|Technologies|Services))";

/// Accepted organization length range, in characters
const MIN_ORG_CHARS: usize = 5;
const MAX_ORG_CHARS: usize = 100;

pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| PanlinkError::PatternError(e.to_string()))
}

/// Check a string against the identifier grammar (the whole string, no surrounding text)
pub fn is_valid_identifier(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 10
        && bytes[..5].iter().all(u8::is_ascii_uppercase)
        && bytes[5..9].iter().all(u8::is_ascii_digit)
        && bytes[9].is_ascii_uppercase()
}

/// Regex-based detector for identifiers and organization names
pub struct PatternMatcher {
    identifier: Regex,
    organization_templates: Vec<Regex>,
    /// Characters captured on each side of an identifier
    context_radius: usize,
}

impl PatternMatcher {
    /// Create a matcher with the given context radius
    pub fn new(context_radius: usize) -> Result<Self> {
        Ok(Self {
            identifier: compile(IDENTIFIER_PATTERN)?,
            organization_templates: vec![
                compile(LEGAL_SUFFIX_PATTERN)?,
                compile(INDUSTRY_SUFFIX_PATTERN)?,
            ],
            context_radius,
        })
    }

    /// Find every identifier in the text, with its context window
    pub fn find_identifiers(&self, text: &str) -> Vec<IdentifierMatch> {
        self.identifier
            .find_iter(text)
            .map(|mat| IdentifierMatch {
                code: mat.as_str().to_string(),
                offset: mat.start(),
                context: self.context_window(text, mat.start(), mat.end()).to_string(),
                method: DetectionMethod::Regex,
            })
            .collect()
    }

    /// Find organization names, one entry per accepted template match
    pub fn find_organizations(&self, text: &str) -> Vec<String> {
        let mut organizations = Vec::new();

        for template in &self.organization_templates {
            for caps in template.captures_iter(text) {
                let Some(group) = caps.get(1) else { continue };
                let name = group.as_str().trim();
                let len = name.chars().count();

                if (MIN_ORG_CHARS..=MAX_ORG_CHARS).contains(&len) {
                    organizations.push(name.to_string());
                }
            }
        }

        organizations
    }

    /// Slice `context_radius` characters either side of `start..end`,
    /// clipped to the text bounds.
    ///
    /// The trailing side is counted from the match end, not its start, so the
    /// window always holds the whole code plus a full radius after it.
    fn context_window<'a>(&self, text: &'a str, start: usize, end: usize) -> &'a str {
        let window_start = text[..start]
            .char_indices()
            .rev()
            .take(self.context_radius)
            .last()
            .map_or(start, |(i, _)| i);

        let window_end = text[end..]
            .char_indices()
            .nth(self.context_radius)
            .map_or(text.len(), |(i, _)| end + i);

        &text[window_start..window_end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn matcher() -> PatternMatcher {
        PatternMatcher::new(100).unwrap()
    }

    #[test]
    fn test_identifier_whole_word() {
        let m = matcher();

        let found = m.find_identifiers("PAN: ABCDE1234F, issued 2019");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, "ABCDE1234F");
        assert_eq!(found[0].offset, 5);
        assert_eq!(found[0].method, DetectionMethod::Regex);

        assert!(m.find_identifiers("XABCDE1234F").is_empty());
        assert!(m.find_identifiers("ABCDE1234F9").is_empty());
        assert!(m.find_identifiers("ABCDE1234f").is_empty());
        assert!(m.find_identifiers("ABCD1234F").is_empty());
    }

    #[test]
    fn test_multiple_identifiers() {
        let found = matcher().find_identifiers("ABCDE1234F and PQRST6789Z");
        let codes: Vec<&str> = found.iter().map(|m| m.code.as_str()).collect();
        assert_eq!(codes, vec!["ABCDE1234F", "PQRST6789Z"]);
    }

    #[test]
    fn test_context_window_is_clipped() {
        let m = PatternMatcher::new(5).unwrap();
        let found = m.find_identifiers("Holder Name - ABCDE1234F - remainder");

        assert_eq!(found[0].context, "me - ABCDE1234F - re");

        let short = m.find_identifiers("ABCDE1234F");
        assert_eq!(short[0].context, "ABCDE1234F");
    }

    #[test]
    fn test_context_window_trails_match_end() {
        let m = PatternMatcher::new(14).unwrap();
        let found = m.find_identifiers("PAN ABCDE1234F - Kavita Nair, resident");

        assert_eq!(found[0].context, "PAN ABCDE1234F - Kavita Nair");
    }

    #[test]
    fn test_context_window_multibyte() {
        let m = PatternMatcher::new(3).unwrap();
        let found = m.find_identifiers("Śrī—ABCDE1234F—ñé");
        assert_eq!(found[0].context, "rī—ABCDE1234F—ñé");
    }

    #[test]
    fn test_organization_templates() {
        let orgs = matcher().find_organizations("Employer: Acme Technologies Ltd. in Pune.");

        assert!(orgs.contains(&"Acme Technologies Ltd".to_string()));
        assert!(orgs.contains(&"Acme Technologies".to_string()));
    }

    #[test]
    fn test_organization_capture_is_greedy() {
        // Lowercase words are part of the template, so the capture runs from
        // the first capitalized word
        let orgs = matcher().find_organizations("He works at Acme Corp");
        assert_eq!(orgs, vec!["He works at Acme Corp".to_string()]);
    }

    #[test]
    fn test_organization_length_filter() {
        let m = matcher();

        assert!(m.find_organizations("Bank").is_empty());
        assert_eq!(m.find_organizations("State Bank"), vec!["State Bank".to_string()]);

        let long_name = format!("{} Limited", "Alpha ".repeat(20).trim());
        assert!(long_name.chars().count() > 100);
        assert!(m.find_organizations(&long_name).is_empty());
    }

    #[test]
    fn test_valid_identifier() {
        assert!(is_valid_identifier("ABCDE1234F"));
        assert!(!is_valid_identifier("ABCDE1234"));
        assert!(!is_valid_identifier("abcde1234f"));
        assert!(!is_valid_identifier("ABCDE12345"));
        assert!(!is_valid_identifier(" ABCDE1234F"));
    }

    proptest! {
        #[test]
        fn prop_identifier_found_as_whole_word(
            code in "[A-Z]{5}[0-9]{4}[A-Z]",
            before in "[ ,.;:()\n-]{0,3}[a-z ]{0,20}",
            after in "[ ,.;:()\n-]{1,3}[a-z ]{0,20}",
        ) {
            let prefix = if before.is_empty() { String::new() } else { format!("{before} ") };
            let text = format!("{prefix}{code}{after}");
            let found = matcher().find_identifiers(&text);

            prop_assert!(found.iter().any(|m| m.code == code));
        }

        #[test]
        fn prop_identifier_rejected_next_to_alphanumerics(
            code in "[A-Z]{5}[0-9]{4}[A-Z]",
            glue in "[A-Za-z0-9]",
        ) {
            let text = format!("{code}{glue}");
            prop_assert!(matcher().find_identifiers(&text).is_empty());

            let text = format!("{glue}{code}");
            prop_assert!(matcher().find_identifiers(&text).is_empty());
        }

        #[test]
        fn prop_matched_identifiers_are_valid(text in "[A-Z0-9 ]{0,80}") {
            for found in matcher().find_identifiers(&text) {
                prop_assert!(is_valid_identifier(&found.code));
            }
        }

        #[test]
        fn prop_organization_length_bounds(text in "[A-Za-z& .]{0,200}") {
            for org in matcher().find_organizations(&text) {
                let len = org.chars().count();
                prop_assert!((5..=100).contains(&len));
            }
        }
    }
}
