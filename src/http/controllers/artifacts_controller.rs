use crate::http::error::ApiError;
use crate::storage::is_valid_artifact_name;
use crate::AnalysisEngine;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

/// Handler for GET /static/images/{file} - Serve a rendered chart
#[tracing::instrument(name = "handler_get_artifact", skip(engine))]
pub async fn get_artifact(
    State(engine): State<Arc<AnalysisEngine>>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_valid_artifact_name(&file) {
        return Err(ApiError::bad_request(format!(
            "Invalid image name '{}'",
            file
        )));
    }

    let bytes = engine
        .artifacts()
        .read(&file)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Image '{}' not found", file)))?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], bytes))
}
