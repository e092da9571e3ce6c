//! Diagnostic: list the Gemini models usable for chat and try one reply.

use mimalloc::MiMalloc;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use gemini_chat::ChatError;
use gemini_chat::api::GeminiApi;
use gemini_chat::config::Config;
use gemini_chat::service::generation::{
    CredentialStrategy, GenerationClient, GenerationConfig, TextGenerator,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode, ChatError> {
    let cfg = Config::load()?;
    let client = GenerationClient::new(GenerationConfig::from(&cfg))?;

    let Some(handle) = CredentialStrategy::ServerConfigured.resolve(client.config()) else {
        eprintln!("No API Key found");
        return Ok(ExitCode::FAILURE);
    };

    println!("Listing available models...");
    let mut page_token: Option<String> = None;
    loop {
        let page = GeminiApi::list_models(
            client.http_client(),
            &client.config().base_url,
            handle.api_key(),
            page_token.as_deref(),
        )
        .await?;
        for model in page.models.iter().filter(|m| m.supports_generate_content()) {
            println!("- {}", model.name);
        }
        match page.next_page_token.filter(|t| !t.is_empty()) {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    println!("\nTesting {}...", client.config().model);
    let outcome = client.generate("Hello", None).await;
    if outcome.is_success() {
        println!("Success! Response: {}", outcome.into_content());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{}", outcome.into_content());
        Ok(ExitCode::FAILURE)
    }
}
