use crate::access::AuthError;
use crate::http::error::ApiError;
use crate::http::identity::caller_identity;
use crate::http::models::{AnalyzeRequest, AnalyzeResponse};
use crate::AnalysisEngine;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

/// Handler for POST /v1/analyze - Run one analysis over an uploaded session
///
/// The body is decoded by hand so an anonymous caller always gets the login
/// redirect, whatever they sent.
#[tracing::instrument(
    name = "handler_analyze",
    skip(engine, headers, body),
    fields(
        tabsight.session_id = tracing::field::Empty,
        tabsight.analysis_type = tracing::field::Empty,
    )
)]
pub async fn analyze_handler(
    State(engine): State<Arc<AnalysisEngine>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<AnalyzeResponse>), ApiError> {
    let caller = caller_identity(&headers).ok_or(AuthError::Unauthenticated)?;

    let request: AnalyzeRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?;
    tracing::Span::current()
        .record("tabsight.session_id", request.session_id.as_str())
        .record("tabsight.analysis_type", request.analysis_type.as_str());

    let result = tokio::task::spawn_blocking(move || {
        engine.authorize_and_analyze(
            Some(&caller),
            &request.session_id,
            &request.analysis_type,
            &request.params,
        )
    })
    .await??;

    Ok((
        StatusCode::OK,
        Json(AnalyzeResponse {
            success: true,
            result,
        }),
    ))
}
