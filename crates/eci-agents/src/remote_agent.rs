//! Managed-agent backend: forwards the message to a hosted conversational agent over HTTP.

use eci_core::{AnswerSource, SourceError};
use std::time::Duration;

const SOURCE_NAME: &str = "agent";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const EMPTY_REPLY: &str = "No response received from the agent.";

/// Fields checked, in order, for the answer text in the agent's JSON reply.
const ANSWER_FIELDS: [&str; 3] = ["completion", "output", "response"];

/// Posts `{ "prompt", "session_id" }` to the agent endpoint and returns its text.
pub struct RemoteAgent {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl RemoteAgent {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Pulls the answer out of a reply body: first string among [`ANSWER_FIELDS`],
    /// the JSON itself when none is present, or the raw body when it is not JSON.
    fn extract_answer(body: &str) -> String {
        let text = match serde_json::from_str::<serde_json::Value>(body) {
            Ok(json) => ANSWER_FIELDS
                .iter()
                .find_map(|f| json.get(f).and_then(|v| v.as_str()))
                .map(str::to_string)
                .unwrap_or_else(|| json.to_string()),
            Err(_) => body.to_string(),
        };
        if text.trim().is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            text
        }
    }
}

#[async_trait::async_trait]
impl AnswerSource for RemoteAgent {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn answer(&self, session_id: &str, prompt: &str) -> Result<String, SourceError> {
        let mut request = self.client.post(&self.endpoint).json(&serde_json::json!({
            "prompt": prompt,
            "session_id": session_id,
        }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!(
                target: "eci::agent",
                status = status.as_u16(),
                session_id = session_id,
                "Agent invocation failed"
            );
            return Err(format!("agent returned {}: {}", status, body).into());
        }

        tracing::info!(
            target: "eci::agent",
            session_id = session_id,
            bytes = body.len(),
            "Agent answered"
        );
        Ok(Self::extract_answer(&body))
    }
}
