use crate::analysis::AnalysisResult;
use crate::datasets::Profile;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query parameters for POST /v1/uploads
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub filename: Option<String>,
}

/// Response body for POST /v1/uploads
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Request body for POST /v1/analyze
///
/// Analysis parameters (`column`, `category_column`, `chart_type`, ...) sit
/// next to the two fixed fields and are validated per analysis type.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub analysis_type: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// Response body for POST /v1/analyze
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: AnalysisResult,
}
