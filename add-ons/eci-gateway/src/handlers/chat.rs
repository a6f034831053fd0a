//! Chat handler: the `{ input | message | prompt, sessionId? }` -> `{ sessionId, output }`
//! contract shared by the offline matcher and the managed agent.
//!
//! Inputs over [`MAX_INPUT_CHARS`] are refused with 413 before any matching runs.
//! Every answered exchange is appended to the conversation log. With `stream: true`
//! the answer is sent word by word, `stream_delay_ms` apart, as `text/plain`.

use crate::AppState;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use eci_core::{word_chunks, AnswerSource, ConversationStore, DEFAULT_SESSION_PREFIX};
use futures_util::stream::StreamExt;
use std::time::Duration;

pub(crate) const MISSING_INPUT: &str = "Missing input. Provide {\"input\":\"...\"}";

/// Request body cap for `POST /api/v1/chat`.
pub(crate) const MAX_BODY_BYTES: usize = 64 * 1024;
/// Longest message the matcher will score; the similarity scan is quadratic in length.
pub(crate) const MAX_INPUT_CHARS: usize = 4000;

/// Chat request from the widget. The message may arrive under any of three names.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct ChatRequest {
    #[serde(default)]
    input: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default, rename = "sessionId", alias = "session_id")]
    session_id: Option<String>,
    #[serde(default)]
    stream: bool,
}

impl ChatRequest {
    /// First of input/message/prompt that is non-empty after trimming.
    fn text(&self) -> Option<&str> {
        [&self.input, &self.message, &self.prompt]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    fn session_id(&self) -> String {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", DEFAULT_SESSION_PREFIX, uuid::Uuid::new_v4().simple()))
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// POST /api/v1/chat
pub(crate) async fn chat(State(state): State<AppState>, body: Bytes) -> Response {
    // An empty body is treated as `{}` and fails on the missing input below.
    let req: ChatRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ChatRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(target: "eci::chat", "Rejected chat body: {}", e);
                return error_response(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e));
            }
        }
    };

    let Some(prompt) = req.text().map(str::to_string) else {
        return error_response(StatusCode::BAD_REQUEST, MISSING_INPUT);
    };
    let input_chars = prompt.chars().count();
    if input_chars > MAX_INPUT_CHARS {
        tracing::warn!(target: "eci::chat", chars = input_chars, "Rejected oversized chat input");
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Input too long. Limit is {} characters.", MAX_INPUT_CHARS),
        );
    }
    let session_id = req.session_id();

    tracing::info!(
        target: "eci::chat",
        session_id = %session_id,
        stream = req.stream,
        "Chat request received: {} chars",
        prompt.len()
    );

    let output = match state.answers.answer(&session_id, &prompt).await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(target: "eci::chat", session_id = %session_id, "Chat error: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let source = state.answers.name().to_string();
    save_exchange(&state.conversations, &session_id, &prompt, &output, &source);

    if req.stream {
        stream_words(
            session_id,
            source,
            output,
            Duration::from_millis(state.config.stream_delay_ms),
        )
    } else {
        Json(serde_json::json!({
            "sessionId": session_id,
            "output": output,
            "source": source,
        }))
        .into_response()
    }
}

/// Sends `output` chunk by chunk with a fixed delay between chunks.
fn stream_words(session_id: String, source: String, output: String, delay: Duration) -> Response {
    use async_stream::stream;

    let chunks = word_chunks(&output);
    let stream = stream! {
        for (i, chunk) in chunks.into_iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            yield chunk;
        }
    };
    let body = Body::from_stream(stream.map(Ok::<_, std::convert::Infallible>));

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));
    if let Ok(v) = header::HeaderValue::from_str(&session_id) {
        headers.insert("x-session-id", v);
    }
    if let Ok(v) = header::HeaderValue::from_str(&source) {
        headers.insert("x-answer-source", v);
    }
    response
}

/// Appends the exchange to the conversation log. Failures are logged, never surfaced.
fn save_exchange(store: &ConversationStore, session_id: &str, prompt: &str, output: &str, source: &str) {
    if let Err(e) = store.append(session_id, prompt, output, source) {
        tracing::warn!(
            target: "eci::chat",
            "[Chat] Failed to save exchange for session {}: {}",
            session_id,
            e
        );
    }
}
