//! Keyword fast path: trigger phrases that resolve straight to a catalog entry.

use serde::{Deserialize, Serialize};

/// A set of trigger phrases pointing at one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Lowercase phrases; any one contained in the query fires the rule.
    pub triggers: Vec<String>,
    /// Position of the target entry in the catalog.
    pub target: usize,
}

impl KeywordRule {
    pub fn new<I, S>(triggers: I, target: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            triggers: triggers.into_iter().map(Into::into).collect(),
            target,
        }
    }

    /// Substring containment, not whole-word: "lookups" fires inside "lookupsx".
    /// `query` must already be lowercased.
    pub fn matches(&self, query: &str) -> bool {
        self.triggers.iter().any(|t| query.contains(t.as_str()))
    }
}

/// First-match-wins lookup over rules in declaration order.
pub struct KeywordIndex;

impl KeywordIndex {
    /// Returns the target of the first rule whose triggers appear in `query`.
    /// `None` means "no keyword match", not an error.
    pub fn lookup(rules: &[KeywordRule], query: &str) -> Option<usize> {
        rules.iter().find(|r| r.matches(query)).map(|r| r.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<KeywordRule> {
        vec![
            KeywordRule::new(["core principle", "data integrity"], 3),
            KeywordRule::new(["what is data integrity"], 15),
            KeywordRule::new(["500 error", "internal server"], 14),
        ]
    }

    #[test]
    fn any_trigger_fires() {
        assert_eq!(KeywordIndex::lookup(&rules(), "got an internal server fault"), Some(14));
        assert_eq!(KeywordIndex::lookup(&rules(), "why do i get a 500 error"), Some(14));
    }

    #[test]
    fn earliest_rule_wins() {
        // Both rule 0 ("data integrity") and rule 1 match; declaration order decides.
        assert_eq!(KeywordIndex::lookup(&rules(), "what is data integrity in eci?"), Some(3));
    }

    #[test]
    fn partial_word_counts() {
        assert_eq!(KeywordIndex::lookup(&rules(), "a 500 errors page"), Some(14));
    }

    #[test]
    fn no_match_is_none() {
        assert_eq!(KeywordIndex::lookup(&rules(), "hello there"), None);
        assert_eq!(KeywordIndex::lookup(&rules(), ""), None);
        assert_eq!(KeywordIndex::lookup(&[], "500 error"), None);
    }
}
