use axum::{Json, extract::State};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::db::{Message, MessageRole};
use crate::middleware::ChatRequest;
use crate::service::generation::render_failure;
use crate::types::chat::{ClearStatus, HealthStatus};
use crate::{ChatError, router::ChatState};

pub const SERVICE_NAME: &str = "AI Chat API";

/// GET /api
pub async fn health(State(state): State<ChatState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "online".to_string(),
        service: SERVICE_NAME.to_string(),
        ai_enabled: state.generator.is_configured(),
    })
}

/// GET /api/messages -> whole conversation, oldest first.
pub async fn list_messages(
    State(state): State<ChatState>,
) -> Result<Json<Vec<Message>>, ChatError> {
    Ok(Json(state.store.list_all().await?))
}

/// POST /api/messages -> store the user turn, generate and store the reply,
/// return the updated conversation.
pub async fn create_message(
    State(state): State<ChatState>,
    request: ChatRequest,
) -> Result<Json<Vec<Message>>, ChatError> {
    let ChatRequest {
        content,
        credential,
    } = request;

    if content.trim().is_empty() {
        return Err(ChatError::Validation(
            "Message content cannot be empty".to_string(),
        ));
    }

    state
        .store
        .append(MessageRole::User, &content, Utc::now())
        .await
        .map_err(processing_error)?;

    match reply_and_list(&state, &content, credential.as_deref()).await {
        Ok(messages) => Ok(Json(messages)),
        Err(e) => {
            warn!(error = %e, "reply could not be stored; recording fallback reply");
            state
                .store
                .append(MessageRole::Assistant, &render_failure(&e), Utc::now())
                .await
                .map_err(|fallback_err| {
                    error!(error = %fallback_err, "fallback reply could not be stored");
                    processing_error(fallback_err)
                })?;
            Ok(Json(state.store.list_all().await.map_err(processing_error)?))
        }
    }
}

/// DELETE /api/messages
pub async fn clear_messages(
    State(state): State<ChatState>,
) -> Result<Json<ClearStatus>, ChatError> {
    let removed = state
        .store
        .clear()
        .await
        .map_err(|e| ChatError::Internal(format!("Error clearing messages: {e}")))?;
    info!(removed, "all messages cleared");
    Ok(Json(ClearStatus {
        status: "success".to_string(),
        message: "All messages cleared".to_string(),
    }))
}

// Generation never fails; only the two store calls can.
async fn reply_and_list(
    state: &ChatState,
    content: &str,
    credential: Option<&str>,
) -> Result<Vec<Message>, ChatError> {
    let reply = state.generator.generate(content, credential).await;
    state
        .store
        .append(MessageRole::Assistant, &reply.into_content(), Utc::now())
        .await?;
    state.store.list_all().await
}

fn processing_error(e: ChatError) -> ChatError {
    ChatError::Internal(format!("Error processing message: {e}"))
}
