//! Chooses the answer backend from config: offline matcher or managed agent.

use crate::{LocalMatcher, RemoteAgent};
use eci_core::{AnswerSource, CoreConfig, KnowledgeBase, ResolverOptions, SourceError};
use std::sync::Arc;

/// Which backend answers chat messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnswerMode {
    #[default]
    Local,
    Agent,
}

impl AnswerMode {
    /// "agent" selects the managed agent; anything else is local.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "agent" => AnswerMode::Agent,
            _ => AnswerMode::Local,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerMode::Local => "local",
            AnswerMode::Agent => "agent",
        }
    }
}

/// Routes every message to the configured backend.
pub struct AnswerRouter {
    mode: AnswerMode,
    source: Arc<dyn AnswerSource>,
}

impl AnswerRouter {
    pub fn new(mode: AnswerMode, source: Arc<dyn AnswerSource>) -> Self {
        Self { mode, source }
    }

    /// Local matcher over `knowledge`, or the remote agent when `answer_mode = "agent"`
    /// and an endpoint is configured. A missing endpoint falls back to local.
    pub fn from_config(config: &CoreConfig, knowledge: Arc<KnowledgeBase>) -> Self {
        let local = || -> Arc<dyn AnswerSource> {
            Arc::new(LocalMatcher::with_options(
                Arc::clone(&knowledge),
                ResolverOptions::from_config(config),
            ))
        };
        match AnswerMode::parse(&config.answer_mode) {
            AnswerMode::Agent => match config.agent_endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
                Some(endpoint) => {
                    tracing::info!(target: "eci::agent", endpoint = endpoint, "Answer mode: managed agent");
                    Self::new(
                        AnswerMode::Agent,
                        Arc::new(RemoteAgent::new(endpoint, config.agent_token.clone())),
                    )
                }
                None => {
                    tracing::warn!(
                        target: "eci::agent",
                        "answer_mode = agent but no agent_endpoint configured; using local matcher"
                    );
                    Self::new(AnswerMode::Local, local())
                }
            },
            AnswerMode::Local => {
                tracing::info!(target: "eci::agent", entries = knowledge.len(), "Answer mode: local matcher");
                Self::new(AnswerMode::Local, local())
            }
        }
    }

    pub fn mode(&self) -> AnswerMode {
        self.mode
    }
}

#[async_trait::async_trait]
impl AnswerSource for AnswerRouter {
    fn name(&self) -> &str {
        self.source.name()
    }

    async fn answer(&self, session_id: &str, prompt: &str) -> Result<String, SourceError> {
        self.source.answer(session_id, prompt).await
    }
}
