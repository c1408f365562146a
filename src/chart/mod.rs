//! Chart specifications and the renderers that turn them into images.

mod error;
mod mock_renderer;
mod plotters_renderer;
mod spec;

pub use error::RenderError;
pub use mock_renderer::MockRenderer;
pub use plotters_renderer::PlottersRenderer;
pub use spec::{coolwarm, purple_gradient, ChartSpec, ChartStyle, Rgb};

use std::path::Path;

/// Draws a [`ChartSpec`] to an image file.
///
/// Implementations must write a complete file at `path` or return an error;
/// they never inspect or return pixels.
pub trait ChartRenderer: Send + Sync + std::fmt::Debug {
    fn render(&self, spec: &ChartSpec, path: &Path) -> Result<(), RenderError>;
}

/// The image artifact produced by a chart-producing analysis.
///
/// Each kind maps to a fixed file-name suffix, so a session has at most one
/// artifact per kind and repeat requests overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Correlation,
    Histogram,
    BarChart,
    PieChart,
    LineChart,
    Scatter,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        Self::Correlation,
        Self::Histogram,
        Self::BarChart,
        Self::PieChart,
        Self::LineChart,
        Self::Scatter,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Correlation => "_correlation",
            Self::Histogram => "_histogram",
            Self::BarChart => "_bar_chart",
            Self::PieChart => "_pie_chart",
            Self::LineChart => "_line_chart",
            Self::Scatter => "_scatter",
        }
    }

    pub fn for_style(style: ChartStyle) -> Self {
        match style {
            ChartStyle::Bar => Self::BarChart,
            ChartStyle::Pie => Self::PieChart,
            ChartStyle::Line => Self::LineChart,
        }
    }

    /// `{session_id}{suffix}.png`
    pub fn file_name(&self, session_id: &str) -> String {
        format!("{}{}.png", session_id, self.suffix())
    }
}
