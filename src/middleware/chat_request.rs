use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    response::{IntoResponse, Response},
};

use crate::error::ApiErrorResponse;
use crate::middleware::credential::caller_credential;
use crate::types::chat::NewMessage;

/// Parsed body of `POST /api/messages` with the effective caller credential.
///
/// A `credential` field in the body wins over one carried in headers or the
/// query string. Rejections use the `{"detail": ...}` error body.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub content: String,
    pub credential: Option<String>,
}

impl<S> FromRequest<S> for ChatRequest
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let from_headers = caller_credential(&parts.headers, parts.uri.query());
        let req = Request::from_parts(parts, body);

        let Json(body) = Json::<NewMessage>::from_request(req, state)
            .await
            .map_err(reject)?;

        let credential = body
            .credential
            .filter(|c| !c.trim().is_empty())
            .or(from_headers);

        Ok(ChatRequest {
            content: body.content,
            credential,
        })
    }
}

fn reject(rejection: JsonRejection) -> Response {
    (
        rejection.status(),
        Json(ApiErrorResponse {
            detail: rejection.body_text(),
        }),
    )
        .into_response()
}
