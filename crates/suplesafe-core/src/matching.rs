//! Free-text term matching against curated alias sets.
//!
//! Patient-entered medications and conditions are matched against alias
//! lists from the rule tables. Both sides go through [`normalize_term`]
//! (lowercase, accents folded, whitespace collapsed) before comparison, so
//! "Omeprazól 20mg" matches the alias "omeprazol".
//!
//! Matching sits behind [`TermMatcher`] so evaluators never depend on the
//! strategy. The default, [`SubstringMatcher`], is deliberately conservative:
//! an alias matches when it appears inside the patient's term.

/// Fold a single accented character to its ASCII base letter.
fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        _ => c,
    }
}

/// Normalize a term for comparison: lowercase, strip accents, collapse
/// whitespace and treat `_`, `-` and `/` as spaces.
pub fn normalize_term(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(fold_char)
        .map(|c| if matches!(c, '_' | '-' | '/') { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strategy for deciding whether a patient term refers to an alias.
pub trait TermMatcher: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Does `patient_term` refer to `alias`?
    fn matches(&self, patient_term: &str, alias: &str) -> bool;

    /// First patient term matching any alias, if any.
    fn find_match<'a>(&self, patient_terms: &'a [String], aliases: &[String]) -> Option<&'a str> {
        patient_terms
            .iter()
            .find(|term| aliases.iter().any(|alias| self.matches(term, alias)))
            .map(String::as_str)
    }
}

/// Case- and accent-insensitive substring matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl SubstringMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl TermMatcher for SubstringMatcher {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn matches(&self, patient_term: &str, alias: &str) -> bool {
        let alias = normalize_term(alias);
        if alias.is_empty() {
            return false;
        }
        normalize_term(patient_term).contains(&alias)
    }
}
