use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    http::{Request, StatusCode},
};
use gemini_chat::config::Config;
use gemini_chat::error::ApiErrorResponse;
use gemini_chat::router::{ChatState, chat_router};
use gemini_chat::service::generation::{GenerationClient, GenerationConfig, NO_CREDENTIAL_REPLY};
use gemini_chat::types::chat::{ClearStatus, HealthStatus};
use gemini_chat::{GenerationOutcome, Message, MessageRole, MessageStore, TextGenerator};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Replies with `echo: <message>` and records the credential it was given.
#[derive(Default)]
struct EchoGenerator {
    credentials: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    fn is_configured(&self) -> bool {
        true
    }

    async fn generate(&self, message: &str, credential: Option<&str>) -> GenerationOutcome {
        self.credentials
            .lock()
            .unwrap()
            .push(credential.map(str::to_string));
        GenerationOutcome::Success(format!("echo: {message}"))
    }
}

fn test_config() -> Config {
    Config {
        static_dir: "does/not/exist".into(),
        ..Config::default()
    }
}

async fn memory_store() -> MessageStore {
    let store = MessageStore::connect_lazy("sqlite::memory:").expect("valid sqlite url");
    store.init_schema().await.expect("schema init failed");
    store
}

fn app_with(store: MessageStore, generator: Arc<dyn TextGenerator>) -> Router {
    chat_router(ChatState::new(store, generator), &test_config())
}

fn unconfigured_generator() -> Arc<dyn TextGenerator> {
    let cfg = GenerationConfig::from(&test_config());
    Arc::new(GenerationClient::new(cfg).expect("client builds"))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let resp = app.clone().oneshot(request).await.expect("request failed");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    (status, body)
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> T {
    serde_json::from_slice(body).expect("unexpected response body")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

fn post_json(uri: &str, json: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .expect("failed to build request")
}

fn summary(messages: &[Message]) -> Vec<(MessageRole, &str)> {
    messages
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect()
}

#[tokio::test]
async fn health_reports_generation_status() {
    let app = app_with(memory_store().await, unconfigured_generator());
    let (status, body) = send(&app, get("/api")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        parse::<HealthStatus>(&body),
        HealthStatus {
            status: "online".to_string(),
            service: "AI Chat API".to_string(),
            ai_enabled: false,
        }
    );

    let app = app_with(memory_store().await, Arc::new(EchoGenerator::default()));
    let (_, body) = send(&app, get("/api")).await;
    assert!(parse::<HealthStatus>(&body).ai_enabled);
}

#[tokio::test]
async fn hello_without_any_key_stores_setup_hint() {
    let app = app_with(memory_store().await, unconfigured_generator());

    let (status, body) = send(
        &app,
        post_json("/api/messages", serde_json::json!({"content": "Hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let messages: Vec<Message> = parse(&body);
    assert_eq!(
        summary(&messages),
        vec![
            (MessageRole::User, "Hello"),
            (MessageRole::Assistant, NO_CREDENTIAL_REPLY),
        ]
    );
    assert_eq!(
        NO_CREDENTIAL_REPLY,
        "Please provide a Gemini API Key in Settings to chat!"
    );

    let raw: serde_json::Value = parse(&body);
    assert!(raw[0]["message_id"].is_i64());
    assert!(raw[0]["timestamp"].is_string());
}

#[tokio::test]
async fn blank_content_is_rejected_without_touching_the_store() {
    let store = memory_store().await;
    let generator = Arc::new(EchoGenerator::default());
    let app = app_with(store.clone(), generator.clone());

    for content in ["", "   ", "\n\t "] {
        let (status, body) = send(
            &app,
            post_json("/api/messages", serde_json::json!({"content": content})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            parse::<ApiErrorResponse>(&body).detail,
            "Message content cannot be empty"
        );
    }

    assert!(store.list_all().await.unwrap().is_empty());
    assert!(generator.credentials.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_content_field_is_a_client_error() {
    let app = app_with(memory_store().await, Arc::new(EchoGenerator::default()));
    let (status, body) = send(
        &app,
        post_json("/api/messages", serde_json::json!({"text": "hi"})),
    )
    .await;
    assert!(status.is_client_error());
    assert!(!parse::<ApiErrorResponse>(&body).detail.is_empty());
}

#[tokio::test]
async fn sequential_appends_keep_chronological_pairs() {
    let store = memory_store().await;
    let app = app_with(store.clone(), Arc::new(EchoGenerator::default()));

    let (_, first) = send(
        &app,
        post_json("/api/messages", serde_json::json!({"content": "A"})),
    )
    .await;
    assert_eq!(parse::<Vec<Message>>(&first).len(), 2);

    let (_, second) = send(
        &app,
        post_json("/api/messages", serde_json::json!({"content": "B"})),
    )
    .await;
    let after: Vec<Message> = parse(&second);
    assert_eq!(
        summary(&after),
        vec![
            (MessageRole::User, "A"),
            (MessageRole::Assistant, "echo: A"),
            (MessageRole::User, "B"),
            (MessageRole::Assistant, "echo: B"),
        ]
    );
    assert!(after.windows(2).all(|w| w[0].id < w[1].id));
    assert!(after.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    let (status, listed) = send(&app, get("/api/messages")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<Vec<Message>>(&listed), after);
}

#[tokio::test]
async fn clear_empties_the_conversation() {
    let app = app_with(memory_store().await, Arc::new(EchoGenerator::default()));
    send(
        &app,
        post_json("/api/messages", serde_json::json!({"content": "hi"})),
    )
    .await;

    let (status, body) = send(&app, delete("/api/messages")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        parse::<ClearStatus>(&body),
        ClearStatus {
            status: "success".to_string(),
            message: "All messages cleared".to_string(),
        }
    );

    let (_, listed) = send(&app, get("/api/messages")).await;
    assert!(parse::<Vec<Message>>(&listed).is_empty());

    // Clearing an empty log is still a success.
    let (status, _) = send(&app, delete("/api/messages")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn credential_is_taken_from_body_then_headers() {
    let generator = Arc::new(EchoGenerator::default());
    let app = app_with(memory_store().await, generator.clone());

    send(
        &app,
        post_json(
            "/api/messages",
            serde_json::json!({"content": "one", "credential": "body-key"}),
        ),
    )
    .await;

    let with_header = Request::builder()
        .method("POST")
        .uri("/api/messages")
        .header("content-type", "application/json")
        .header("x-goog-api-key", "header-key")
        .body(Body::from(r#"{"content":"two"}"#))
        .unwrap();
    send(&app, with_header).await;

    let both = Request::builder()
        .method("POST")
        .uri("/api/messages?key=query-key")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"content":"three","credential":"body-wins"}"#))
        .unwrap();
    send(&app, both).await;

    send(
        &app,
        post_json("/api/messages", serde_json::json!({"content": "four"})),
    )
    .await;

    assert_eq!(
        *generator.credentials.lock().unwrap(),
        vec![
            Some("body-key".to_string()),
            Some("header-key".to_string()),
            Some("body-wins".to_string()),
            None,
        ]
    );
}

#[tokio::test]
async fn failed_reply_write_is_replaced_by_fallback_message() {
    let store = memory_store().await;
    sqlx::query(
        "CREATE TRIGGER reject_poison BEFORE INSERT ON messages \
         WHEN NEW.role = 'assistant' AND NEW.content LIKE 'echo: poison%' \
         BEGIN SELECT RAISE(ABORT, 'poisoned reply'); END",
    )
    .execute(store.pool())
    .await
    .unwrap();
    let app = app_with(store.clone(), Arc::new(EchoGenerator::default()));

    let (status, body) = send(
        &app,
        post_json("/api/messages", serde_json::json!({"content": "poison pill"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let messages: Vec<Message> = parse(&body);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "poison pill");
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert!(
        messages[1]
            .content
            .starts_with("I apologize, but I encountered an error. Error details:")
    );
    assert!(messages[1].content.contains("poisoned reply"));
}

#[tokio::test]
async fn failed_fallback_write_is_a_server_error() {
    let store = memory_store().await;
    sqlx::query(
        "CREATE TRIGGER reject_assistant BEFORE INSERT ON messages \
         WHEN NEW.role = 'assistant' \
         BEGIN SELECT RAISE(ABORT, 'assistant writes disabled'); END",
    )
    .execute(store.pool())
    .await
    .unwrap();
    let app = app_with(store.clone(), Arc::new(EchoGenerator::default()));

    let (status, body) = send(
        &app,
        post_json("/api/messages", serde_json::json!({"content": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = parse::<ApiErrorResponse>(&body).detail;
    assert!(detail.starts_with("Error processing message:"));

    let remaining = store.list_all().await.unwrap();
    assert_eq!(summary(&remaining), vec![(MessageRole::User, "hello")]);
}

#[tokio::test]
async fn storage_failures_surface_as_server_errors() {
    let store = memory_store().await;
    let app = app_with(store.clone(), Arc::new(EchoGenerator::default()));
    store.close().await;

    let (status, body) = send(&app, get("/api/messages")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        parse::<ApiErrorResponse>(&body)
            .detail
            .starts_with("Database error:")
    );

    let (status, body) = send(&app, delete("/api/messages")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        parse::<ApiErrorResponse>(&body)
            .detail
            .starts_with("Error clearing messages:")
    );
}

#[tokio::test]
async fn oversized_body_is_rejected_with_413() {
    let app = chat_router(
        ChatState::new(memory_store().await, Arc::new(EchoGenerator::default())),
        &Config {
            body_limit: 1024,
            ..test_config()
        },
    );
    let big = "a".repeat(4096);
    let (status, body) = send(
        &app,
        post_json("/api/messages", serde_json::json!({"content": big})),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!parse::<ApiErrorResponse>(&body).detail.is_empty());
}
