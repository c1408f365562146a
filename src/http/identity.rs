//! Caller identity as supplied by the upstream authentication layer.

use axum::http::HeaderMap;

/// Header carrying the authenticated user's identity.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller's identity, if the request carries a usable one.
pub fn caller_identity(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
