use crate::http::controllers::{
    analyze_handler, get_artifact, health_handler, upload_file, MAX_UPLOAD_SIZE,
};
use crate::AnalysisEngine;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub struct AppServer {
    pub router: Router,
    pub engine: Arc<AnalysisEngine>,
}

pub const PATH_HEALTH: &str = "/health";
pub const PATH_UPLOADS: &str = "/v1/uploads";
pub const PATH_ANALYZE: &str = "/v1/analyze";
pub const PATH_IMAGE: &str = "/static/images/{file}";

impl AppServer {
    pub fn new(engine: AnalysisEngine) -> Self {
        let engine = Arc::new(engine);
        AppServer {
            router: Router::new()
                .route(PATH_HEALTH, get(health_handler))
                .route(
                    PATH_UPLOADS,
                    // One byte over the limit so the handler reports the size error itself
                    post(upload_file).layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + 1)),
                )
                .route(PATH_ANALYZE, post(analyze_handler))
                .route(PATH_IMAGE, get(get_artifact))
                .with_state(engine.clone()),
            engine,
        }
    }
}
