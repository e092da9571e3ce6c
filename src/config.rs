use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::error::ChatError;

/// Default Gemini model used for chat replies.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Public Generative Language API endpoint (API-key authenticated).
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const ENV_KEYS: &[&str] = &[
    "host",
    "port",
    "database_url",
    "loglevel",
    "gemini_api_key",
    "gemini_model",
    "gemini_base_url",
    "proxy",
    "static_dir",
    "cors_origins",
    "body_limit",
];

/// Process-wide settings, layered as defaults < `config.toml` < environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub loglevel: String,
    /// Server-wide Gemini key. Absent or blank disables server-side generation.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: Url,
    pub proxy: Option<Url>,
    /// Prebuilt frontend bundle; served at `/` only when the directory exists.
    pub static_dir: PathBuf,
    /// Comma-separated list of allowed CORS origins. `*` allows any origin.
    pub cors_origins: String,
    pub body_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_url: "sqlite:chat.db".to_string(),
            loglevel: "info".to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_base_url: Url::parse(DEFAULT_GEMINI_BASE_URL)
                .expect("default Gemini base URL is valid"),
            proxy: None,
            static_dir: PathBuf::from("frontend/dist"),
            cors_origins: "http://localhost:5173,http://localhost:3000".to_string(),
            body_limit: 1024 * 1024,
        }
    }
}

impl Config {
    /// Build the configuration from defaults, an optional `config.toml` in the
    /// working directory, and the process environment.
    pub fn load() -> Result<Self, ChatError> {
        Self::figment().extract().map_err(ChatError::from)
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::raw().only(ENV_KEYS))
    }

    /// Server key with blank values treated as unset.
    pub fn server_key(&self) -> Option<&str> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn ai_enabled(&self) -> bool {
        self.server_key().is_some()
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
