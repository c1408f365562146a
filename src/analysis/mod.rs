//! Analysis requests, their results, and the routines that compute them.
//!
//! Routines read a [`Dataset`] in place and never mutate it. Chart-producing
//! routines return a [`ChartSpec`] alongside their numbers; drawing and
//! storing the image is left to the caller.

pub mod category;
pub mod correlation;
mod error;
pub mod histogram;
pub mod scatter;
pub mod stats;
pub mod summary;

pub use category::{format_value_label, CategoryChartResult};
pub use correlation::CorrelationResult;
pub use error::AnalysisError;
pub use histogram::HistogramResult;
pub use scatter::ScatterResult;
pub use summary::SummaryResult;

use crate::chart::{ArtifactKind, ChartSpec, ChartStyle};
use crate::datasets::{float_values, Dataset};
use serde::Serialize;
use serde_json::{Map, Value};

/// A validated analysis request. Each variant carries only the parameters
/// its routine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisRequest {
    Summary,
    Correlation,
    Histogram {
        column: String,
    },
    CategoryChart {
        category_column: String,
        value_column: String,
        style: ChartStyle,
    },
    Scatter {
        x_column: String,
        y_column: String,
    },
}

impl AnalysisRequest {
    /// Build a request from an analysis kind and loose JSON parameters.
    ///
    /// `chart_type` is optional for `bar`: a missing or unknown style is drawn
    /// as a bar chart rather than rejected.
    pub fn parse(kind: &str, params: &Map<String, Value>) -> Result<Self, AnalysisError> {
        let required = |name: &'static str| -> Result<String, AnalysisError> {
            params
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(AnalysisError::MissingParameter(name))
        };

        match kind {
            "summary" => Ok(Self::Summary),
            "correlation" => Ok(Self::Correlation),
            "histogram" => Ok(Self::Histogram {
                column: required("column")?,
            }),
            "bar" => Ok(Self::CategoryChart {
                category_column: required("category_column")?,
                value_column: required("value_column")?,
                style: ChartStyle::resolve(params.get("chart_type").and_then(Value::as_str)),
            }),
            "scatter" => Ok(Self::Scatter {
                x_column: required("x_column")?,
                y_column: required("y_column")?,
            }),
            other => Err(AnalysisError::InvalidAnalysisType(other.to_string())),
        }
    }

    /// Wire name of the analysis kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Correlation => "correlation",
            Self::Histogram { .. } => "histogram",
            Self::CategoryChart { .. } => "bar",
            Self::Scatter { .. } => "scatter",
        }
    }
}

/// Outcome of one analysis, tagged by `analysis_type` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "analysis_type", rename_all = "snake_case")]
pub enum AnalysisResult {
    Summary(SummaryResult),
    Correlation(CorrelationResult),
    Histogram(HistogramResult),
    #[serde(rename = "bar")]
    CategoryChart(CategoryChartResult),
    Scatter(ScatterResult),
}

impl AnalysisResult {
    pub fn plot_url(&self) -> Option<&str> {
        match self {
            Self::Summary(_) => None,
            Self::Correlation(r) => r.plot_url.as_deref(),
            Self::Histogram(r) => r.plot_url.as_deref(),
            Self::CategoryChart(r) => r.plot_url.as_deref(),
            Self::Scatter(r) => r.plot_url.as_deref(),
        }
    }

    pub(crate) fn set_plot_url(&mut self, url: String) {
        match self {
            Self::Summary(_) => {}
            Self::Correlation(r) => r.plot_url = Some(url),
            Self::Histogram(r) => r.plot_url = Some(url),
            Self::CategoryChart(r) => r.plot_url = Some(url),
            Self::Scatter(r) => r.plot_url = Some(url),
        }
    }
}

/// A chart a routine wants drawn, and the artifact slot it belongs in.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartJob {
    pub kind: ArtifactKind,
    pub spec: ChartSpec,
}

/// Routine output before rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Computed {
    pub result: AnalysisResult,
    pub chart: Option<ChartJob>,
}

/// Run the routine for `request` against `dataset`.
pub fn compute(dataset: &Dataset, request: &AnalysisRequest) -> Result<Computed, AnalysisError> {
    let (result, chart) = match request {
        AnalysisRequest::Summary => (AnalysisResult::Summary(summary::run(dataset)?), None),
        AnalysisRequest::Correlation => {
            let (result, spec) = correlation::run(dataset)?;
            (
                AnalysisResult::Correlation(result),
                Some(ChartJob {
                    kind: ArtifactKind::Correlation,
                    spec,
                }),
            )
        }
        AnalysisRequest::Histogram { column } => {
            let (result, spec) = histogram::run(dataset, column)?;
            (
                AnalysisResult::Histogram(result),
                Some(ChartJob {
                    kind: ArtifactKind::Histogram,
                    spec,
                }),
            )
        }
        AnalysisRequest::CategoryChart {
            category_column,
            value_column,
            style,
        } => {
            let (result, spec) = category::run(dataset, category_column, value_column, *style)?;
            (
                AnalysisResult::CategoryChart(result),
                Some(ChartJob {
                    kind: ArtifactKind::for_style(*style),
                    spec,
                }),
            )
        }
        AnalysisRequest::Scatter { x_column, y_column } => {
            let (result, spec) = scatter::run(dataset, x_column, y_column)?;
            (
                AnalysisResult::Scatter(result),
                Some(ChartJob {
                    kind: ArtifactKind::Scatter,
                    spec,
                }),
            )
        }
    };
    Ok(Computed { result, chart })
}

/// Fail with [`AnalysisError::ColumnNotFound`] unless every name is a column.
pub(crate) fn require_columns(dataset: &Dataset, names: &[&str]) -> Result<(), AnalysisError> {
    let missing: Vec<String> = names
        .iter()
        .filter(|name| !dataset.has_column(name))
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::ColumnNotFound {
            missing,
            available: dataset.column_names(),
        })
    }
}

/// Values of a numeric column, or [`AnalysisError::NotNumeric`].
pub(crate) fn numeric_values(
    dataset: &Dataset,
    column: &str,
    purpose: &'static str,
) -> Result<Vec<Option<f64>>, AnalysisError> {
    let array = dataset.column(column).ok_or_else(|| AnalysisError::ColumnNotFound {
        missing: vec![column.to_string()],
        available: dataset.column_names(),
    })?;
    if !dataset.column_kind(column).is_some_and(|k| k.is_numeric()) {
        return Err(AnalysisError::NotNumeric {
            column: column.to_string(),
            purpose,
        });
    }
    Ok(float_values(array)?)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::datasets::{parse_dataset, Dataset, FileFormat};

    pub fn csv(text: &str) -> Dataset {
        parse_dataset(text.as_bytes(), FileFormat::Csv).unwrap()
    }
}
