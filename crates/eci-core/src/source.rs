//! Strategy seam shared by the offline matcher and the managed agent.

/// Boxed error returned by answer backends.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Anything that turns a user message into answer text.
#[async_trait::async_trait]
pub trait AnswerSource: Send + Sync {
    /// Backend name reported to clients (e.g. "local", "agent").
    fn name(&self) -> &str;

    /// Answers `prompt` within the conversation identified by `session_id`.
    async fn answer(&self, session_id: &str, prompt: &str) -> Result<String, SourceError>;
}
