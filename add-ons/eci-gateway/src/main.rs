//! Axum-based gateway for the ECI Knowledge Assistant. Config-driven via CoreConfig.

mod activity;
mod handlers;

use activity::{ActivityEvent, ActivityLayer};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::Method,
    routing::{get, post},
    Json, Router,
};
use eci_agents::AnswerRouter;
use eci_core::{AnswerSource, ConversationStore, CoreConfig, KnowledgeBase};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pre-flight check: config, catalog, conversation log and port.
fn run_verify() -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;

    print!("Checking knowledge catalog... ");
    let kb = KnowledgeBase::from_config(&config).map_err(|e| format!("Catalog invalid: {}", e))?;
    println!("OK ({} entries, {} keyword rules)", kb.len(), kb.rules().len());

    print!("Checking conversation log... ");
    let store = ConversationStore::open_path(config.conversation_path())
        .map_err(|e| format!("eci_conversations LOCKED or inaccessible: {}", e))?;
    store.verify_readable().map_err(|e| format!("eci_conversations unreadable: {}", e))?;
    drop(store);
    println!("OK");

    let port = config.port;
    print!("Checking port {}... ", port);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    match std::net::TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => return Err(format!("Port {} BLOCKED: {}", port, e)),
    }

    println!("\nAll checks passed. Ready to start gateway.");
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[eci-gateway] .env not loaded: {} (using system environment)", e);
    }

    if std::env::args().any(|a| a == "--verify") {
        match run_verify() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }

    let (activity_tx, _) = broadcast::channel(1000);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(ActivityLayer::new(activity_tx.clone()))
        .init();

    if let Err(e) = run(activity_tx).await {
        tracing::error!("eci-gateway stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(activity: broadcast::Sender<ActivityEvent>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Arc::new(CoreConfig::load()?);
    let knowledge = Arc::new(KnowledgeBase::from_config(&config)?);
    tracing::info!(
        target: "eci::knowledge",
        entries = knowledge.len(),
        rules = knowledge.rules().len(),
        word_overlap = config.word_overlap_fallback,
        "Knowledge base ready"
    );
    let conversations = Arc::new(ConversationStore::open_path(config.conversation_path())?);
    let answers = Arc::new(AnswerRouter::from_config(&config, Arc::clone(&knowledge)));

    let app = build_app(AppState {
        config: Arc::clone(&config),
        knowledge,
        answers,
        conversations,
        activity,
    });

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("{} listening on {}", config.app_name, addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|o| axum::http::HeaderValue::from_str(o.trim()).ok()),
        )
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS, Method::DELETE])
        .allow_headers(Any)
        .expose_headers(Any)
}

fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/status", get(status))
        .route("/api/v1/knowledge", get(knowledge_topics))
        .route("/api/v1/activity", get(activity::activity_stream))
        .route(
            "/api/v1/chat",
            post(handlers::chat::chat).layer(DefaultBodyLimit::max(handlers::chat::MAX_BODY_BYTES)),
        )
        .route("/api/v1/conversations", get(handlers::conversations::list_sessions))
        .route(
            "/api/v1/conversations/:session_id",
            get(handlers::conversations::get_history).delete(handlers::conversations::clear_history),
        )
        .with_state(state)
        .layer(cors)
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) knowledge: Arc<KnowledgeBase>,
    pub(crate) answers: Arc<AnswerRouter>,
    pub(crate) conversations: Arc<ConversationStore>,
    pub(crate) activity: broadcast::Sender<ActivityEvent>,
}

/// GET /api/v1/health – liveness check for the widget and scripts.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/v1/status – app identity and answer backend.
async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "app_name": state.config.app_name,
        "port": state.config.port,
        "mode": state.answers.mode().as_str(),
        "source": state.answers.name(),
        "entries": state.knowledge.len(),
        "rules": state.knowledge.rules().len(),
        "word_overlap": state.config.word_overlap_fallback,
        "threshold": state.config.similarity_threshold,
    }))
}

/// GET /api/v1/knowledge – the questions the assistant knows, in catalog order.
async fn knowledge_topics(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "topics": state.knowledge.topics(),
        "clarification": state.knowledge.clarification(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use eci_agents::{AnswerMode, SourceError};
    use eci_core::DEFAULT_CLARIFICATION;
    use tower::ServiceExt;

    struct FailingAgent;

    #[async_trait::async_trait]
    impl AnswerSource for FailingAgent {
        fn name(&self) -> &str {
            "agent"
        }

        async fn answer(&self, _session_id: &str, _prompt: &str) -> Result<String, SourceError> {
            Err("agent returned 502 Bad Gateway: upstream down".into())
        }
    }

    fn test_config() -> CoreConfig {
        CoreConfig {
            app_name: "Test Assistant".to_string(),
            port: 4000,
            stream_delay_ms: 0,
            ..CoreConfig::default()
        }
    }

    fn test_state_with(config: CoreConfig, answers: Option<AnswerRouter>) -> AppState {
        let knowledge = Arc::new(KnowledgeBase::eci());
        let answers = answers.unwrap_or_else(|| AnswerRouter::from_config(&config, Arc::clone(&knowledge)));
        let (activity, _) = broadcast::channel(16);
        AppState {
            config: Arc::new(config),
            knowledge,
            answers: Arc::new(answers),
            conversations: Arc::new(ConversationStore::open_temporary().unwrap()),
            activity,
        }
    }

    fn test_state() -> AppState {
        test_state_with(test_config(), None)
    }

    fn post_chat(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_chat_keyword_answer() {
        let app = build_app(test_state());
        let res = app
            .oneshot(post_chat(r#"{"input":"What is ECI?","sessionId":"sess-a"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        assert_eq!(json["sessionId"], "sess-a");
        assert_eq!(json["source"], "local");
        assert!(json["output"]
            .as_str()
            .unwrap()
            .starts_with("ECI stands for Enriched Customer Information"));
    }

    #[tokio::test]
    async fn test_chat_accepts_message_and_prompt_fields() {
        let state = test_state();
        let app = build_app(state.clone());

        let res = app
            .clone()
            .oneshot(post_chat(r#"{"message":"why do I get a 500 error"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        assert!(json["output"].as_str().unwrap().contains("Internal Server Error"));
        assert!(json["sessionId"].as_str().unwrap().starts_with("sess-"));

        let res = app.oneshot(post_chat(r#"{"prompt":"bulk queries"}"#)).await.unwrap();
        let json = json_body(res).await;
        assert!(json["output"].as_str().unwrap().contains("batch APIs"));
    }

    #[tokio::test]
    async fn test_chat_unknown_question_gets_clarification() {
        let app = build_app(test_state());
        let res = app
            .oneshot(post_chat(r#"{"input":"asdkjqwe zzz nonsense"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["output"], DEFAULT_CLARIFICATION);
    }

    #[tokio::test]
    async fn test_chat_missing_input_is_400() {
        for body in [r#"{}"#, r#"{"input":"   "}"#, ""] {
            let app = build_app(test_state());
            let res = app.oneshot(post_chat(body)).await.unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "body {body:?}");
            let json = json_body(res).await;
            assert_eq!(json["error"], handlers::chat::MISSING_INPUT);
        }
    }

    #[tokio::test]
    async fn test_chat_malformed_body_is_400() {
        let app = build_app(test_state());
        let res = app.oneshot(post_chat("{ not json")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(res).await["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_chat_upstream_failure_is_500() {
        let answers = AnswerRouter::new(AnswerMode::Agent, Arc::new(FailingAgent));
        let state = test_state_with(test_config(), Some(answers));
        let conversations = Arc::clone(&state.conversations);
        let app = build_app(state);
        let res = app
            .oneshot(post_chat(r#"{"input":"What is ECI?","sessionId":"s-fail"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json_body(res).await["error"].as_str().unwrap().contains("upstream down"));
        assert!(conversations.history("s-fail", 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chat_streams_words() {
        let app = build_app(test_state());
        let res = app
            .oneshot(post_chat(r#"{"input":"Is ECI a master system?","sessionId":"s-stream","stream":true}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["x-session-id"], "s-stream");
        assert_eq!(res.headers()["x-answer-source"], "local");
        assert!(res.headers()["content-type"].to_str().unwrap().starts_with("text/plain"));
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            String::from_utf8(bytes.to_vec()).unwrap(),
            KnowledgeBase::eci().entry(26).unwrap().answer
        );
    }

    #[tokio::test]
    async fn test_conversation_history_round_trip() {
        let app = build_app(test_state());
        for q in ["What is ECI?", "bulk queries"] {
            let body = serde_json::json!({ "input": q, "sessionId": "s-hist" }).to_string();
            let res = app.clone().oneshot(post_chat(&body)).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
        }

        let req = Request::builder()
            .uri("/api/v1/conversations/s-hist")
            .body(Body::empty())
            .unwrap();
        let json = json_body(app.clone().oneshot(req).await.unwrap()).await;
        assert_eq!(json["sessionId"], "s-hist");
        let exchanges = json["exchanges"].as_array().unwrap();
        assert_eq!(exchanges.len(), 2);
        assert_eq!(exchanges[0]["prompt"], "What is ECI?");
        assert_eq!(exchanges[1]["prompt"], "bulk queries");
        assert_eq!(exchanges[1]["source"], "local");

        let req = Request::builder()
            .uri("/api/v1/conversations/s-hist?limit=1")
            .body(Body::empty())
            .unwrap();
        let json = json_body(app.clone().oneshot(req).await.unwrap()).await;
        assert_eq!(json["exchanges"].as_array().unwrap().len(), 1);

        let req = Request::builder()
            .uri("/api/v1/conversations")
            .body(Body::empty())
            .unwrap();
        let json = json_body(app.clone().oneshot(req).await.unwrap()).await;
        assert_eq!(json["sessions"], serde_json::json!(["s-hist"]));

        let req = Request::builder()
            .method("DELETE")
            .uri("/api/v1/conversations/s-hist")
            .body(Body::empty())
            .unwrap();
        let json = json_body(app.clone().oneshot(req).await.unwrap()).await;
        assert_eq!(json["removed"], 2);

        let req = Request::builder()
            .uri("/api/v1/conversations/s-hist")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_status_reports_identity_and_backend() {
        let config = CoreConfig {
            word_overlap_fallback: true,
            ..test_config()
        };
        let app = build_app(test_state_with(config, None));
        let req = Request::builder()
            .uri("/api/v1/status")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        assert_eq!(json["app_name"], "Test Assistant");
        assert_eq!(json["port"], 4000);
        assert_eq!(json["mode"], "local");
        assert_eq!(json["entries"], 27);
        assert_eq!(json["rules"], 27);
        assert_eq!(json["word_overlap"], true);
    }

    #[tokio::test]
    async fn test_knowledge_lists_topics_in_order() {
        let app = build_app(test_state());
        let req = Request::builder()
            .uri("/api/v1/knowledge")
            .body(Body::empty())
            .unwrap();
        let json = json_body(app.oneshot(req).await.unwrap()).await;
        let topics = json["topics"].as_array().unwrap();
        assert_eq!(topics.len(), 27);
        assert_eq!(topics[0], "What is ECI?");
        assert_eq!(topics[26], "Is ECI a master system?");
        assert_eq!(json["clarification"], DEFAULT_CLARIFICATION);
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_app(test_state());
        let req = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();
        let json = json_body(app.oneshot(req).await.unwrap()).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let config = CoreConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            ..test_config()
        };
        let app = build_app(test_state_with(config, None));
        let req = Request::builder()
            .uri("/api/v1/health")
            .header("origin", "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(
            res.headers()["access-control-allow-origin"],
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn test_history_limit_zero_on_known_session() {
        let app = build_app(test_state());
        let body = r#"{"input":"What is ECI?","sessionId":"s-zero"}"#;
        let res = app.clone().oneshot(post_chat(body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let req = Request::builder()
            .uri("/api/v1/conversations/s-zero?limit=0")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        assert_eq!(json["sessionId"], "s-zero");
        assert_eq!(json["exchanges"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_chat_rejects_oversized_input() {
        let app = build_app(test_state());
        let long = "a".repeat(handlers::chat::MAX_INPUT_CHARS + 1);
        let body = serde_json::json!({ "input": long, "sessionId": "s-big" }).to_string();
        let res = app.clone().oneshot(post_chat(&body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(json_body(res).await["error"].as_str().unwrap().starts_with("Input too long"));

        let at_limit = "a".repeat(handlers::chat::MAX_INPUT_CHARS);
        let body = serde_json::json!({ "input": at_limit }).to_string();
        let res = app.clone().oneshot(post_chat(&body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let huge = " ".repeat(handlers::chat::MAX_BODY_BYTES + 1);
        let res = app.oneshot(post_chat(&huge)).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_chat_publishes_activity() {
        let state = test_state();
        let mut rx = state.activity.subscribe();
        let subscriber = tracing_subscriber::registry().with(ActivityLayer::new(state.activity.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = build_app(state);
        let res = app
            .oneshot(post_chat(r#"{"input":"bulk queries","sessionId":"s-feed"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        let request = seen
            .iter()
            .find(|e| e.target == "eci::chat" && e.message.starts_with("Chat request received"))
            .expect("chat request event");
        assert_eq!(request.fields["session_id"], "s-feed");
        assert!(seen.iter().all(|e| e.target.starts_with("eci::")));
    }

    #[tokio::test]
    async fn test_activity_stream_sends_json_events() {
        use futures_util::StreamExt;

        let state = test_state();
        let tx = state.activity.clone();
        let app = build_app(state);
        let req = Request::builder()
            .uri("/api/v1/activity")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        let mut fields = serde_json::Map::new();
        fields.insert("session_id".to_string(), "s-live".into());
        tx.send(ActivityEvent {
            level: "INFO".to_string(),
            target: "eci::agent".to_string(),
            message: "Agent answered".to_string(),
            fields,
        })
        .unwrap();

        let mut body = res.into_body().into_data_stream();
        let frame = body.next().await.unwrap().unwrap();
        let text = String::from_utf8(frame.to_vec()).unwrap();
        assert!(text.contains("event: agent"), "{text}");
        let data = text
            .lines()
            .find_map(|l| l.strip_prefix("data: "))
            .expect("data line");
        let json: serde_json::Value = serde_json::from_str(data).unwrap();
        assert_eq!(json["message"], "Agent answered");
        assert_eq!(json["fields"]["session_id"], "s-live");
    }
}
