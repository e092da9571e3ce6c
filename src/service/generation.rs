use crate::api::gemini_api::GeminiApi;
use crate::config::Config;
use crate::error::ChatError;
use crate::types::gemini::GenerateContentRequest;
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Reply stored when neither the caller nor the server supplies a key.
pub const NO_CREDENTIAL_REPLY: &str = "Please provide a Gemini API Key in Settings to chat!";

/// Render any generation failure as assistant-facing text.
pub fn render_failure(detail: impl fmt::Display) -> String {
    format!("I apologize, but I encountered an error. Error details: {detail}")
}

/// Result of one generation attempt. Both variants are persistable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(String),
    Failure(String),
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success(_))
    }

    pub fn into_content(self) -> String {
        match self {
            GenerationOutcome::Success(text) | GenerationOutcome::Failure(text) => text,
        }
    }
}

/// Anything able to turn a user message into assistant text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Whether a server-wide credential is available without caller input.
    fn is_configured(&self) -> bool;

    async fn generate(&self, message: &str, credential: Option<&str>) -> GenerationOutcome;
}

/// Provider settings fixed at construction.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Url,
    pub proxy: Option<Url>,
}

impl From<&Config> for GenerationConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            api_key: cfg.server_key().map(str::to_string),
            model: cfg.gemini_model.clone(),
            base_url: cfg.gemini_base_url.clone(),
            proxy: cfg.proxy.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Caller,
    Server,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Caller => f.write_str("caller"),
            CredentialSource::Server => f.write_str("server"),
        }
    }
}

/// A key validated for use on exactly one outbound call.
#[derive(Debug, Clone)]
pub struct ProviderHandle {
    pub source: CredentialSource,
    api_key: HeaderValue,
}

impl ProviderHandle {
    fn configure(source: CredentialSource, key: &str) -> Result<Self, ChatError> {
        let mut api_key = HeaderValue::from_str(key.trim())
            .map_err(|e| ChatError::InvalidCredential(e.to_string()))?;
        api_key.set_sensitive(true);
        Ok(Self { source, api_key })
    }

    pub fn api_key(&self) -> &HeaderValue {
        &self.api_key
    }
}

/// One step of the credential fallback chain.
#[derive(Debug, Clone, Copy)]
pub enum CredentialStrategy<'a> {
    CallerSupplied(Option<&'a str>),
    ServerConfigured,
}

impl CredentialStrategy<'_> {
    /// A usable handle, or `None` when this step does not apply.
    pub fn resolve(&self, config: &GenerationConfig) -> Option<ProviderHandle> {
        let (source, key) = match self {
            CredentialStrategy::CallerSupplied(key) => (CredentialSource::Caller, *key),
            CredentialStrategy::ServerConfigured => {
                (CredentialSource::Server, config.api_key.as_deref())
            }
        };
        let key = key.map(str::trim).filter(|k| !k.is_empty())?;
        ProviderHandle::configure(source, key)
            .inspect_err(|e| warn!(%source, error = %e, "credential rejected; trying next source"))
            .ok()
    }
}

/// Gemini-backed generator: one `generateContent` call per message.
#[derive(Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    config: GenerationConfig,
}

impl GenerationClient {
    pub fn new(config: GenerationConfig) -> Result<Self, ChatError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("gemini-chat/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10));
        if let Some(proxy_url) = config.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }
        let http = builder.build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Walk the fallback chain; the first usable handle wins.
    pub fn resolve_handle(&self, credential: Option<&str>) -> Option<ProviderHandle> {
        [
            CredentialStrategy::CallerSupplied(credential),
            CredentialStrategy::ServerConfigured,
        ]
        .iter()
        .find_map(|strategy| strategy.resolve(&self.config))
    }

    async fn call(&self, handle: &ProviderHandle, message: &str) -> Result<String, ChatError> {
        let body = GenerateContentRequest::from_user_text(message);
        let resp = GeminiApi::generate_content(
            &self.http,
            &self.config.base_url,
            &self.config.model,
            handle.api_key(),
            &body,
        )
        .await?;
        resp.text()
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    async fn generate(&self, message: &str, credential: Option<&str>) -> GenerationOutcome {
        let Some(handle) = self.resolve_handle(credential) else {
            info!("no Gemini API key available; replying with setup hint");
            return GenerationOutcome::Success(NO_CREDENTIAL_REPLY.to_string());
        };

        match self.call(&handle, message).await {
            Ok(text) => {
                debug!(source = %handle.source, model = %self.config.model, "generation succeeded");
                GenerationOutcome::Success(text)
            }
            Err(e) => {
                error!(source = %handle.source, model = %self.config.model, error = %e, "AI generation error");
                GenerationOutcome::Failure(render_failure(e))
            }
        }
    }
}
