//! Answer Resolver: keyword fast path, optional word-overlap stage, similarity scan,
//! then the clarification fallback.

use super::catalog::KnowledgeBase;
use super::keywords::KeywordIndex;
use super::similarity::similarity;
use crate::shared::CoreConfig;
use serde::Serialize;
use std::sync::Arc;

/// Best similarity scores below this are rejected.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Share of query words that must appear in a question for the word-overlap stage.
const WORD_OVERLAP_RATIO: f64 = 0.4;
/// Query words this short are ignored by the word-overlap stage.
const WORD_OVERLAP_MIN_LEN: usize = 3;

/// How a query was resolved. Entry values are catalog positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    Keyword { entry: usize },
    WordOverlap { entry: usize },
    Similarity { entry: usize, score: f64 },
    NoMatch { best_score: f64 },
}

impl Resolution {
    /// Selected catalog position, `None` for [`Resolution::NoMatch`].
    pub fn entry(&self) -> Option<usize> {
        match *self {
            Self::Keyword { entry } | Self::WordOverlap { entry } | Self::Similarity { entry, .. } => {
                Some(entry)
            }
            Self::NoMatch { .. } => None,
        }
    }
}

/// Per-query outcome; holds no state across requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Trimmed, lowercased input.
    pub query: String,
    pub resolution: Resolution,
}

/// Tunables for the resolution pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverOptions {
    /// Minimum accepted similarity score.
    pub threshold: f64,
    /// Runs the word-overlap stage between keyword and similarity matching.
    pub word_overlap: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            word_overlap: false,
        }
    }
}

impl ResolverOptions {
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            threshold: config.similarity_threshold,
            word_overlap: config.word_overlap_fallback,
        }
    }
}

/// Picks the single best answer for free-text input. Pure: reads only the catalog.
#[derive(Debug, Clone)]
pub struct AnswerResolver {
    knowledge: Arc<KnowledgeBase>,
    options: ResolverOptions,
}

impl AnswerResolver {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self::with_options(knowledge, ResolverOptions::default())
    }

    pub fn with_options(knowledge: Arc<KnowledgeBase>, options: ResolverOptions) -> Self {
        Self { knowledge, options }
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Runs the pipeline and reports which stage decided.
    pub fn resolve(&self, user_query: &str) -> MatchResult {
        let query = user_query.trim().to_lowercase();

        let resolution = if let Some(entry) = KeywordIndex::lookup(self.knowledge.rules(), &query) {
            Resolution::Keyword { entry }
        } else if let Some(entry) = self.word_overlap(&query) {
            Resolution::WordOverlap { entry }
        } else {
            self.best_similarity(&query)
        };

        tracing::debug!(
            target: "eci::knowledge",
            query_len = query.len(),
            resolution = ?resolution,
            "Query resolved"
        );
        MatchResult { query, resolution }
    }

    /// Answer text for a resolved query; the clarification message for no match.
    pub fn answer_for(&self, result: &MatchResult) -> &str {
        result
            .resolution
            .entry()
            .and_then(|i| self.knowledge.entry(i))
            .map(|e| e.answer.as_str())
            .unwrap_or_else(|| self.knowledge.clarification())
    }

    /// Text in, text out. Never fails: empty or nonsense input yields the clarification.
    pub fn find_answer(&self, user_query: &str) -> String {
        let result = self.resolve(user_query);
        self.answer_for(&result).to_string()
    }

    fn word_overlap(&self, query: &str) -> Option<usize> {
        if !self.options.word_overlap {
            return None;
        }
        let query_words: Vec<&str> = query.split(' ').collect();
        self.knowledge.entries().iter().position(|entry| {
            let question = entry.question.to_lowercase();
            let question_words: Vec<&str> = question.split(' ').collect();
            let matched = query_words
                .iter()
                .filter(|qw| qw.chars().count() > WORD_OVERLAP_MIN_LEN)
                .filter(|qw| question_words.iter().any(|w| w.contains(**qw) || qw.contains(*w)))
                .count();
            matched > 0 && matched as f64 / query_words.len() as f64 > WORD_OVERLAP_RATIO
        })
    }

    fn best_similarity(&self, query: &str) -> Resolution {
        let mut best: Option<(usize, f64)> = None;
        for (i, entry) in self.knowledge.entries().iter().enumerate() {
            let score = similarity(query, &entry.question.to_lowercase());
            // Strict: the first entry seen keeps a tie.
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((i, score));
            }
        }
        match best {
            Some((entry, score)) if score >= self.options.threshold => {
                Resolution::Similarity { entry, score }
            }
            Some((_, score)) => Resolution::NoMatch { best_score: score },
            None => Resolution::NoMatch { best_score: 0.0 },
        }
    }
}
