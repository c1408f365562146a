use crate::access::AccessGate;
use crate::analysis::{self, AnalysisError, AnalysisRequest, AnalysisResult, ChartJob, Computed};
use crate::chart::{ChartRenderer, PlottersRenderer};
use crate::datasets::{parse_dataset, FileFormat, IngestError, Profile};
use crate::id::generate_session_id;
use crate::storage::{ArtifactStorage, FilesystemArtifacts};
use crate::store::{SessionRecord, SessionStore, DEFAULT_MAX_SESSIONS};
use anyhow::Result;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default directory for rendered chart images.
const DEFAULT_IMAGES_DIR: &str = "static/images";

/// The analysis service: session store, access gate, routines and chart output.
///
/// All operations are synchronous and CPU-bound; async callers should run them
/// on a blocking thread.
#[derive(Debug)]
pub struct AnalysisEngine {
    store: Arc<SessionStore>,
    gate: AccessGate,
    renderer: Arc<dyn ChartRenderer>,
    artifacts: Arc<dyn ArtifactStorage>,
}

impl AnalysisEngine {
    /// Create a builder for more control over engine configuration.
    pub fn builder() -> AnalysisEngineBuilder {
        AnalysisEngineBuilder::new()
    }

    /// Create a new engine from application configuration.
    pub fn from_config(config: &crate::config::AppConfig) -> Result<Self> {
        Self::builder()
            .images_dir(&config.paths.images_dir)
            .max_sessions(config.store.max_sessions)
            .build()
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn artifacts(&self) -> &Arc<dyn ArtifactStorage> {
        &self.artifacts
    }

    /// Parse an upload, register it as a new session owned by the caller, and
    /// profile it.
    #[tracing::instrument(
        name = "ingest",
        skip(self, caller, filename, bytes),
        fields(
            tabsight.filename = %filename,
            tabsight.bytes = bytes.len(),
            tabsight.session_id = tracing::field::Empty,
        )
    )]
    pub fn ingest(
        &self,
        caller: Option<&str>,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Profile, IngestError> {
        let owner = self.gate.authenticate(caller)?;
        let format = FileFormat::from_filename(filename)?;
        if bytes.is_empty() {
            return Err(IngestError::ParseFailure("Upload cannot be empty".to_string()));
        }

        let start = Instant::now();
        let dataset = parse_dataset(bytes, format)?;

        // Profile before registering so a failed profile leaves no session behind
        let session_id = generate_session_id();
        let profile = Profile::build(&session_id, filename, &dataset)?;

        let inserted = self
            .store
            .put(session_id, dataset, owner, filename, bytes.len())
            .ok_or_else(|| IngestError::Unexpected("Session ID collision".to_string()))?;
        tracing::Span::current().record("tabsight.session_id", profile.session_id.as_str());
        self.discard_artifacts(&inserted.evicted);

        info!(
            rows = profile.stats.rows,
            columns = profile.stats.columns,
            "Ingested upload in {:?}",
            start.elapsed()
        );
        Ok(profile)
    }

    /// Delete chart images of sessions that left the store.
    fn discard_artifacts(&self, session_ids: &[String]) {
        for session_id in session_ids {
            match self.artifacts.remove_session_artifacts(session_id) {
                Ok(removed) => debug!(
                    tabsight.session_id = %session_id,
                    removed,
                    "Removed artifacts of evicted session"
                ),
                Err(e) => warn!(
                    tabsight.session_id = %session_id,
                    error = %e,
                    "Failed to remove artifacts of evicted session"
                ),
            }
        }
    }

    /// Authorize the caller, then parse and run a loosely typed request.
    ///
    /// Authorization always happens first: an unauthorized caller learns nothing
    /// about whether the request itself was valid.
    pub fn authorize_and_analyze(
        &self,
        caller: Option<&str>,
        session_id: &str,
        analysis_type: &str,
        params: &Map<String, Value>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let record = self.gate.authorize(caller, session_id)?;
        let request = AnalysisRequest::parse(analysis_type, params)?;
        self.run(&record, &request)
    }

    /// Authorize the caller and run a typed request.
    pub fn analyze(
        &self,
        caller: Option<&str>,
        session_id: &str,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, AnalysisError> {
        let record = self.gate.authorize(caller, session_id)?;
        self.run(&record, request)
    }

    #[tracing::instrument(
        name = "analyze",
        skip(self, record, request),
        fields(
            tabsight.session_id = %record.session_id,
            tabsight.analysis_type = request.kind(),
            tabsight.plot_url = tracing::field::Empty,
        )
    )]
    fn run(
        &self,
        record: &SessionRecord,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, AnalysisError> {
        let start = Instant::now();
        let Computed { mut result, chart } = analysis::compute(&record.dataset, request)?;

        if let Some(job) = chart {
            let url = self.publish_chart(&record.session_id, &job)?;
            tracing::Span::current().record("tabsight.plot_url", url.as_str());
            result.set_plot_url(url);
        }

        info!("Analysis completed in {:?}", start.elapsed());
        Ok(result)
    }

    /// Render to a private temp file, then move it over the (session, kind) artifact.
    fn publish_chart(&self, session_id: &str, job: &ChartJob) -> Result<String, AnalysisError> {
        let path = self
            .artifacts
            .prepare_artifact_write(session_id, job.kind)
            .map_err(|e| AnalysisError::Unexpected(format!("{:#}", e)))?;

        if let Err(e) = self.renderer.render(&job.spec, &path) {
            warn!(error = %e, "Chart rendering failed");
            self.artifacts.abort_artifact_write(&path);
            return Err(e.into());
        }

        self.artifacts
            .finalize_artifact_write(&path, session_id, job.kind)
            .map_err(|e| AnalysisError::Unexpected(format!("{:#}", e)))
    }
}

/// Builder for [`AnalysisEngine`].
pub struct AnalysisEngineBuilder {
    images_dir: Option<PathBuf>,
    max_sessions: usize,
    store: Option<Arc<SessionStore>>,
    renderer: Option<Arc<dyn ChartRenderer>>,
    artifacts: Option<Arc<dyn ArtifactStorage>>,
}

impl Default for AnalysisEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisEngineBuilder {
    pub fn new() -> Self {
        Self {
            images_dir: None,
            max_sessions: DEFAULT_MAX_SESSIONS,
            store: None,
            renderer: None,
            artifacts: None,
        }
    }

    /// Set the directory chart images are written to.
    /// Defaults to `static/images` if not set. Ignored when custom artifact
    /// storage is supplied.
    pub fn images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.images_dir = Some(dir.into());
        self
    }

    /// Set the number of sessions kept before the oldest is evicted.
    /// Values less than 1 are clamped to 1.
    pub fn max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// Use an existing session store instead of creating one.
    pub fn store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set a custom chart renderer.
    /// If not set, charts are drawn as PNG with plotters.
    pub fn renderer(mut self, renderer: Arc<dyn ChartRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Set custom artifact storage.
    /// If not set, uses filesystem storage at the images directory.
    pub fn artifacts(mut self, artifacts: Arc<dyn ArtifactStorage>) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    pub fn build(self) -> Result<AnalysisEngine> {
        let artifacts: Arc<dyn ArtifactStorage> = match self.artifacts {
            Some(a) => a,
            None => {
                let images_dir = self
                    .images_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_DIR));
                std::fs::create_dir_all(&images_dir).map_err(|e| {
                    anyhow::anyhow!(
                        "Failed to create images directory {}: {}",
                        images_dir.display(),
                        e
                    )
                })?;
                Arc::new(FilesystemArtifacts::new(images_dir))
            }
        };

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(SessionStore::new(self.max_sessions)));
        let renderer = self
            .renderer
            .unwrap_or_else(|| Arc::new(PlottersRenderer::new()));

        info!(
            max_sessions = store.capacity(),
            "Analysis engine initialized"
        );

        Ok(AnalysisEngine {
            gate: AccessGate::new(store.clone()),
            store,
            renderer,
            artifacts,
        })
    }
}
