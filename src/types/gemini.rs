use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ChatError;

/// Finish reasons returned by the Generative Language API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum FinishReason {
    FINISH_REASON_UNSPECIFIED,
    STOP,
    MAX_TOKENS,
    SAFETY,
    RECITATION,
    LANGUAGE,
    BLOCKLIST,
    PROHIBITED_CONTENT,
    SPII,
    MALFORMED_FUNCTION_CALL,
    IMAGE_SAFETY,
    #[serde(other)]
    OTHER,
}

/// A single content part. Only text parts are produced or consumed here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Set on reasoning parts emitted by thinking models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

/// Chat content payload, used both in requests and candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Body of `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Chat>,
}

impl GenerateContentRequest {
    /// One user turn carrying the raw message text.
    pub fn from_user_text(text: impl Into<String>) -> Self {
        Self {
            contents: vec![Chat {
                role: "user".to_string(),
                parts: vec![Part {
                    text: Some(text.into()),
                    thought: None,
                }],
            }],
        }
    }
}

/// Candidate wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Chat>,
    #[serde(default)]
    pub finishReason: Option<FinishReason>,
}

/// Final `generateContent` response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usageMetadata: Value,
    #[serde(default)]
    pub modelVersion: Option<String>,
    #[serde(default)]
    pub promptFeedback: Option<Value>,
}

impl GeminiResponse {
    /// Concatenated non-thought text of the first candidate.
    ///
    /// Errors when the prompt was blocked or the candidate carries no text,
    /// naming the block or finish reason when the API reported one.
    pub fn text(&self) -> Result<String, ChatError> {
        let Some(candidate) = self.candidates.first() else {
            let reason = self
                .promptFeedback
                .as_ref()
                .and_then(|f| f.get("blockReason"))
                .and_then(Value::as_str)
                .unwrap_or("no candidates returned");
            return Err(ChatError::EmptyCompletion(format!("prompt blocked: {reason}")));
        };

        let text: String = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter(|p| p.thought != Some(true))
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.is_empty() {
            let reason = candidate
                .finishReason
                .as_ref()
                .map(|r| format!("{r:?}"))
                .unwrap_or_else(|| "unknown".to_string());
            return Err(ChatError::EmptyCompletion(format!(
                "candidate has no text (finish reason: {reason})"
            )));
        }
        Ok(text)
    }
}
