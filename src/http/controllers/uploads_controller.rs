use crate::access::AuthError;
use crate::http::error::ApiError;
use crate::http::identity::caller_identity;
use crate::http::models::{UploadParams, UploadResponse};
use crate::AnalysisEngine;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

/// Maximum upload size: 64MB
pub const MAX_UPLOAD_SIZE: usize = 64 * 1024 * 1024;

/// Handler for POST /v1/uploads - Upload a dataset and open a session
#[tracing::instrument(
    name = "handler_upload_file",
    skip(engine, headers, params, body),
    fields(
        tabsight.filename = tracing::field::Empty,
        tabsight.size_bytes = body.len(),
        tabsight.session_id = tracing::field::Empty,
    )
)]
pub async fn upload_file(
    State(engine): State<Arc<AnalysisEngine>>,
    headers: HeaderMap,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let caller = caller_identity(&headers);
    if caller.is_none() {
        return Err(AuthError::Unauthenticated.into());
    }

    let filename = params
        .filename
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::bad_request("No file selected"))?;
    tracing::Span::current().record("tabsight.filename", filename.as_str());

    if body.is_empty() {
        return Err(ApiError::bad_request("Upload cannot be empty"));
    }

    if body.len() > MAX_UPLOAD_SIZE {
        return Err(ApiError::payload_too_large(format!(
            "Upload exceeds maximum size of {} bytes",
            MAX_UPLOAD_SIZE
        )));
    }

    let profile = tokio::task::spawn_blocking(move || {
        engine.ingest(caller.as_deref(), &filename, &body)
    })
    .await??;

    tracing::Span::current().record("tabsight.session_id", profile.session_id.as_str());

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            success: true,
            profile,
        }),
    ))
}
