use plotters::drawing::DrawingAreaErrorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The chart specification cannot be drawn as given.
    #[error("Invalid chart specification: {0}")]
    InvalidSpec(String),

    /// The drawing backend failed while rasterizing or encoding.
    #[error("Chart backend error: {0}")]
    Backend(String),

    #[error("Failed to write chart to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl<E> From<DrawingAreaErrorKind<E>> for RenderError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Backend(err.to_string())
    }
}
