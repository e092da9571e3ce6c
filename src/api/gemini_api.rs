use crate::error::{ChatError, GeminiError};
use crate::types::gemini::{GenerateContentRequest, GeminiResponse};
use crate::types::gemini_models::GeminiModelList;
use reqwest::header::HeaderValue;
use tracing::{debug, error};
use url::Url;

pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Stateless calls against the Generative Language REST API.
pub struct GeminiApi;

impl GeminiApi {
    /// One `generateContent` call. No retries: the first outcome is final.
    pub async fn generate_content(
        client: &reqwest::Client,
        base_url: &Url,
        model: &str,
        api_key: &HeaderValue,
        body: &GenerateContentRequest,
    ) -> Result<GeminiResponse, ChatError> {
        let url = generate_url(base_url, model)?;
        debug!(model, "calling Gemini generateContent");

        let resp = client
            .post(url)
            .header(API_KEY_HEADER, api_key.clone())
            .json(body)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json::<GeminiResponse>().await?)
    }

    /// One page of the model catalogue visible to `api_key`.
    pub async fn list_models(
        client: &reqwest::Client,
        base_url: &Url,
        api_key: &HeaderValue,
        page_token: Option<&str>,
    ) -> Result<GeminiModelList, ChatError> {
        let mut url = api_root(base_url)?.join("v1beta/models")?;
        if let Some(token) = page_token {
            url.query_pairs_mut().append_pair("pageToken", token);
        }

        let resp = client
            .get(url)
            .header(API_KEY_HEADER, api_key.clone())
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json::<GeminiModelList>().await?)
    }
}

/// `{base}/v1beta/models/{model}:generateContent`, accepting `models/`-prefixed names.
pub fn generate_url(base_url: &Url, model: &str) -> Result<Url, ChatError> {
    let model = model.strip_prefix("models/").unwrap_or(model);
    Ok(api_root(base_url)?.join(&format!("v1beta/models/{model}:generateContent"))?)
}

// `Url::join` replaces the last path segment unless the base ends in `/`.
fn api_root(base_url: &Url) -> Result<Url, ChatError> {
    if base_url.path().ends_with('/') {
        return Ok(base_url.clone());
    }
    Ok(Url::parse(&format!("{}/", base_url.as_str()))?)
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ChatError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.unwrap_or_default();
    match serde_json::from_slice::<GeminiError>(&body) {
        Ok(gemini_err) => {
            error!(%status, error = %gemini_err, "Gemini API returned an error");
            Err(ChatError::GeminiServerError(gemini_err))
        }
        Err(_) => {
            error!(%status, "Gemini API returned a non-JSON error");
            Err(ChatError::UpstreamStatus(status))
        }
    }
}
