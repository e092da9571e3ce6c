use serde::{Deserialize, Serialize};

/// Body of `POST /api/messages`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewMessage {
    pub content: String,
    /// Per-request Gemini API key, overriding the server key for this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Body of `GET /api`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub ai_enabled: bool,
}

/// Body of `DELETE /api/messages`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClearStatus {
    pub status: String,
    pub message: String,
}
