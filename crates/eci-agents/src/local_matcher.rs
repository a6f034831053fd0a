//! Offline backend: the rule-based resolver over the static catalog.

use eci_core::{AnswerResolver, AnswerSource, KnowledgeBase, ResolverOptions, SourceError};
use std::sync::Arc;

const SOURCE_NAME: &str = "local";

/// Answers from the in-process catalog. Never fails.
pub struct LocalMatcher {
    resolver: AnswerResolver,
}

impl LocalMatcher {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self {
            resolver: AnswerResolver::new(knowledge),
        }
    }

    pub fn with_options(knowledge: Arc<KnowledgeBase>, options: ResolverOptions) -> Self {
        Self {
            resolver: AnswerResolver::with_options(knowledge, options),
        }
    }

    pub fn resolver(&self) -> &AnswerResolver {
        &self.resolver
    }
}

#[async_trait::async_trait]
impl AnswerSource for LocalMatcher {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn answer(&self, session_id: &str, prompt: &str) -> Result<String, SourceError> {
        let result = self.resolver.resolve(prompt);
        tracing::info!(
            target: "eci::chat",
            session_id = session_id,
            resolution = ?result.resolution,
            "Local matcher answered"
        );
        Ok(self.resolver.answer_for(&result).to_string())
    }
}
