use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::Error as SqlxError;
use std::collections::HashMap;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Invalid API key: {0}")]
    InvalidCredential(String),

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("Gemini API error: {0}")]
    GeminiServerError(GeminiError),

    #[error("Gemini returned no text: {0}")]
    EmptyCompletion(String),

    #[error("{0}")]
    Internal(String),
}

impl From<figment::Error> for ChatError {
    fn from(e: figment::Error) -> Self {
        ChatError::Config(Box::new(e))
    }
}

impl ChatError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::Validation(_) => StatusCode::BAD_REQUEST,
            ChatError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            ChatError::Reqwest(_) | ChatError::UrlParse(_) | ChatError::EmptyCompletion(_) => {
                StatusCode::BAD_GATEWAY
            }
            ChatError::UpstreamStatus(code) => *code,
            ChatError::GeminiServerError(gemini_err) => {
                StatusCode::from_u16(gemini_err.error.code as u16)
                    .unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ChatError::DatabaseError(_)
            | ChatError::Json(_)
            | ChatError::Io(_)
            | ChatError::Config(_)
            | ChatError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ApiErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Error body shared by every non-2xx response.
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiErrorResponse {
    pub detail: String,
}

/// Gemini API error response structure
#[derive(Deserialize, Debug, Clone)]
pub struct GeminiError {
    pub error: GeminiErrorBody,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeminiErrorBody {
    pub code: u32,
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl std::fmt::Display for GeminiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.error.status.is_empty() {
            write!(f, "{} {}", self.error.code, self.error.message)
        } else {
            write!(
                f,
                "{} {}: {}",
                self.error.code, self.error.status, self.error.message
            )
        }
    }
}
