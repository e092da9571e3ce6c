use axum::http::HeaderMap;

use crate::api::gemini_api::API_KEY_HEADER;

/// Pull a caller-supplied Gemini key out of the request, if any.
/// Accepts, in order:
/// - Header: `x-goog-api-key: ...`
/// - Header: `Authorization: Bearer ...`
/// - Query string: `?key=...`
///
/// Blank values are ignored. Nothing is verified here; the key is only
/// passed through to the provider.
pub fn caller_credential(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    // 1) header: x-goog-api-key
    if let Some(hv) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok())
        && !hv.trim().is_empty()
    {
        return Some(hv.trim().to_string());
    }

    // 2) header: Authorization: Bearer <key>
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        let auth = auth.trim();
        if let Some(token) = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            && !token.trim().is_empty()
        {
            return Some(token.trim().to_string());
        }
    }

    // 3) query: key=...
    query.and_then(|qs| {
        url::form_urlencoded::parse(qs.as_bytes())
            .find(|(k, v)| k == "key" && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
    })
}
