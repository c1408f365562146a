//! Mock renderer for testing.
//!
//! Records every specification it is asked to draw and writes the spec as JSON
//! to the output path, so tests can assert on artifacts without rasterizing.

use super::{ChartRenderer, ChartSpec, RenderError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MockRenderer {
    rendered: Mutex<Vec<(ChartSpec, PathBuf)>>,
    fail_render: AtomicBool,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure whether render calls should fail.
    pub fn set_fail_render(&self, fail: bool) {
        self.fail_render.store(fail, Ordering::SeqCst);
    }

    /// Specifications rendered so far, oldest first.
    pub fn rendered_specs(&self) -> Vec<ChartSpec> {
        self.rendered
            .lock()
            .unwrap()
            .iter()
            .map(|(spec, _)| spec.clone())
            .collect()
    }

    pub fn render_count(&self) -> usize {
        self.rendered.lock().unwrap().len()
    }

    pub fn last_spec(&self) -> Option<ChartSpec> {
        self.rendered
            .lock()
            .unwrap()
            .last()
            .map(|(spec, _)| spec.clone())
    }
}

impl ChartRenderer for MockRenderer {
    fn render(&self, spec: &ChartSpec, path: &Path) -> Result<(), RenderError> {
        if self.fail_render.load(Ordering::SeqCst) {
            return Err(RenderError::Backend("mock render failure".to_string()));
        }
        spec.validate()?;

        let body = serde_json::to_vec_pretty(spec)
            .map_err(|e| RenderError::Backend(e.to_string()))?;
        std::fs::write(path, body).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.rendered
            .lock()
            .unwrap()
            .push((spec.clone(), path.to_path_buf()));
        Ok(())
    }
}
