//! Live assistant activity: `eci::*` tracing events (chat requests, resolutions,
//! agent calls, conversation writes) fanned out to `GET /api/v1/activity` as SSE.
//!
//! Each event is sent as JSON with the SSE event name set to the target suffix
//! (`chat`, `agent`, `knowledge`, `conversation`). Events from other crates are dropped.

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::Context;

pub(crate) const TARGET_PREFIX: &str = "eci::";

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ActivityEvent {
    pub(crate) level: String,
    pub(crate) target: String,
    pub(crate) message: String,
    pub(crate) fields: serde_json::Map<String, serde_json::Value>,
}

impl ActivityEvent {
    fn kind(&self) -> &str {
        self.target.strip_prefix(TARGET_PREFIX).unwrap_or(&self.target)
    }
}

/// Splits an event into its message and structured fields.
struct FieldCollector<'a> {
    message: &'a mut String,
    fields: &'a mut serde_json::Map<String, serde_json::Value>,
}

impl FieldCollector<'_> {
    fn put(&mut self, field: &Field, value: serde_json::Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldCollector<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = value.to_string();
        } else {
            self.put(field, value.into());
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.into());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, value.into());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = format!("{:?}", value);
        } else {
            self.put(field, format!("{:?}", value).into());
        }
    }
}

/// Publishes `eci::*` events while at least one feed is connected.
#[derive(Clone)]
pub(crate) struct ActivityLayer {
    tx: broadcast::Sender<ActivityEvent>,
}

impl ActivityLayer {
    pub(crate) fn new(tx: broadcast::Sender<ActivityEvent>) -> Self {
        Self { tx }
    }
}

impl<S> tracing_subscriber::Layer<S> for ActivityLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !meta.target().starts_with(TARGET_PREFIX) || self.tx.receiver_count() == 0 {
            return;
        }
        let mut message = String::new();
        let mut fields = serde_json::Map::new();
        event.record(&mut FieldCollector {
            message: &mut message,
            fields: &mut fields,
        });
        let _ = self.tx.send(ActivityEvent {
            level: meta.level().to_string(),
            target: meta.target().to_string(),
            message,
            fields,
        });
    }
}

/// GET /api/v1/activity
pub(crate) async fn activity_stream(
    State(state): State<AppState>,
) -> Sse<impl futures_util::Stream<Item = Result<Event, std::convert::Infallible>> + Send + 'static> {
    use async_stream::stream;
    let mut rx = state.activity.subscribe();
    let stream = stream! {
        loop {
            match rx.recv().await {
                Ok(activity) => match Event::default().event(activity.kind()).json_data(&activity) {
                    Ok(event) => yield Ok(event),
                    Err(e) => tracing::warn!("Dropping unserializable activity event: {}", e),
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    yield Ok(Event::default().event("lagged").data(n.to_string()));
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
