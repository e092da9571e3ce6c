use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gemini_chat::config::Config;
use gemini_chat::router::{ChatState, chat_router};
use gemini_chat::service::generation::{GenerationClient, GenerationConfig};
use gemini_chat::{MessageStore, shutdown::shutdown_signal};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        model = %cfg.gemini_model,
        ai_enabled = cfg.ai_enabled(),
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.loglevel,
    );
    if !cfg.ai_enabled() {
        info!("GEMINI_API_KEY not set; replies need a per-request key");
    }

    let store = MessageStore::connect_lazy(&cfg.database_url)?;
    store.init_schema().await?;
    info!("database tables created/verified");

    let generator = GenerationClient::new(GenerationConfig::from(&cfg))?;
    let state = ChatState::new(store.clone(), Arc::new(generator));
    let app = chat_router(state, &cfg);

    let addr = cfg.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("database connection closed; bye");
    Ok(())
}
