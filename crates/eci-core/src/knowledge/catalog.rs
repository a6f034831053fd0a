//! Immutable question/answer catalog and its keyword rule table.

use super::eci;
use super::keywords::KeywordRule;
use crate::shared::CoreConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Returned when nothing in the catalog is a close enough match.
pub const DEFAULT_CLARIFICATION: &str = "I'm not sure about that specific question. Could you please rephrase or ask about ECI overview, data integrity, PartyIdentification API, error handling, identity resolution, or troubleshooting?";

/// One canonical question and the answer returned verbatim when it is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,
}

impl KnowledgeEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Errors raised while building or loading a catalog.
#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// The catalog has no entries.
    Empty,
    /// A rule declares no triggers at all.
    EmptyTriggers { rule: usize },
    /// A trigger is empty after trimming; it would match every query.
    BlankTrigger { rule: usize },
    TargetOutOfRange { rule: usize, target: usize, len: usize },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "catalog read failed: {}", e),
            Self::Parse(e) => write!(f, "catalog parse failed: {}", e),
            Self::Empty => write!(f, "catalog has no entries"),
            Self::EmptyTriggers { rule } => write!(f, "keyword rule {} has no triggers", rule),
            Self::BlankTrigger { rule } => write!(f, "keyword rule {} has a blank trigger", rule),
            Self::TargetOutOfRange { rule, target, len } => write!(
                f,
                "keyword rule {} targets entry {} but the catalog has {} entries",
                rule, target, len
            ),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

/// On-disk shape of a replacement catalog.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    entries: Vec<KnowledgeEntry>,
    #[serde(default)]
    rules: Vec<KeywordRule>,
    #[serde(default)]
    clarification: Option<String>,
}

/// Ordered catalog plus the keyword rules that index into it.
///
/// Built once at startup and never mutated; an entry's identity is its position.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
    rules: Vec<KeywordRule>,
    clarification: String,
}

impl KnowledgeBase {
    /// Validates rule alignment against the entries. Triggers are trimmed and lowercased.
    pub fn new(
        entries: Vec<KnowledgeEntry>,
        rules: Vec<KeywordRule>,
        clarification: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut normalized = Vec::with_capacity(rules.len());
        for (i, rule) in rules.into_iter().enumerate() {
            if rule.triggers.is_empty() {
                return Err(CatalogError::EmptyTriggers { rule: i });
            }
            if rule.target >= entries.len() {
                return Err(CatalogError::TargetOutOfRange {
                    rule: i,
                    target: rule.target,
                    len: entries.len(),
                });
            }
            let mut triggers = Vec::with_capacity(rule.triggers.len());
            for t in &rule.triggers {
                let t = t.trim().to_lowercase();
                if t.is_empty() {
                    return Err(CatalogError::BlankTrigger { rule: i });
                }
                triggers.push(t);
            }
            normalized.push(KeywordRule {
                triggers,
                target: rule.target,
            });
        }
        Ok(Self {
            entries,
            rules: normalized,
            clarification: clarification.into(),
        })
    }

    /// The built-in ECI support catalog.
    pub fn eci() -> Self {
        let entries = eci::ENTRIES
            .iter()
            .map(|(q, a)| KnowledgeEntry::new(*q, *a))
            .collect();
        let rules = eci::RULES
            .iter()
            .map(|(triggers, target)| KeywordRule::new(triggers.iter().copied(), *target))
            .collect();
        Self {
            entries,
            rules,
            clarification: DEFAULT_CLARIFICATION.to_string(),
        }
    }

    /// Loads a JSON catalog: `{ "entries": [...], "rules": [...], "clarification"?: "..." }`.
    pub fn load_json_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let file: CatalogFile = serde_json::from_str(&raw)?;
        let kb = Self::new(
            file.entries,
            file.rules,
            file.clarification
                .unwrap_or_else(|| DEFAULT_CLARIFICATION.to_string()),
        )?;
        tracing::info!(
            target: "eci::knowledge",
            path = %path.display(),
            entries = kb.len(),
            rules = kb.rules.len(),
            "Loaded knowledge catalog"
        );
        Ok(kb)
    }

    /// `catalog_path` from config when set, otherwise the built-in catalog.
    pub fn from_config(config: &CoreConfig) -> Result<Self, CatalogError> {
        match config.catalog_path.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(path) => Self::load_json_path(path),
            None => Ok(Self::eci()),
        }
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn entry(&self, index: usize) -> Option<&KnowledgeEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clarification(&self) -> &str {
        &self.clarification
    }

    /// Catalog questions in order, for topic listings.
    pub fn topics(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.question.as_str()).collect()
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::eci()
    }
}
