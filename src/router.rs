use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::get,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::Config;
use crate::db::MessageStore;
use crate::handlers::messages::{clear_messages, create_message, health, list_messages};
use crate::service::TextGenerator;

#[derive(Clone)]
pub struct ChatState {
    pub store: MessageStore,
    pub generator: Arc<dyn TextGenerator>,
}

impl ChatState {
    pub fn new(store: MessageStore, generator: Arc<dyn TextGenerator>) -> Self {
        Self { store, generator }
    }
}

pub fn chat_router(state: ChatState, cfg: &Config) -> Router {
    let api = Router::new()
        .route("/api", get(health))
        .route(
            "/api/messages",
            get(list_messages)
                .post(create_message)
                .delete(clear_messages),
        )
        .layer(DefaultBodyLimit::max(cfg.body_limit))
        .with_state(state);

    let router = if cfg.static_dir.is_dir() {
        info!(path = %cfg.static_dir.display(), "serving frontend bundle");
        let index = cfg.static_dir.join("index.html");
        api.fallback_service(ServeDir::new(&cfg.static_dir).fallback(ServeFile::new(index)))
    } else {
        api
    };

    router
        .layer(cors_layer(&cfg.cors_origin_list()))
        .layer(TraceLayer::new_for_http())
}

/// Explicit origins are echoed back; `*` or an unparseable list allows any.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| o.parse().ok())
        .collect();

    let layer = CorsLayer::new().allow_headers(Any).allow_methods(Any);
    if parsed.is_empty() || origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(parsed)
    }
}
