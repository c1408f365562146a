use super::{numeric_values, require_columns, AnalysisError};
use crate::chart::{ChartSpec, Rgb};
use crate::datasets::Dataset;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterResult {
    pub x_column: String,
    pub y_column: String,
    /// Number of rows where both values are present.
    pub points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_url: Option<String>,
}

/// Pair two numeric columns row by row. Every complete pair is plotted; there
/// is no sampling or aggregation.
pub fn run(
    dataset: &Dataset,
    x_column: &str,
    y_column: &str,
) -> Result<(ScatterResult, ChartSpec), AnalysisError> {
    require_columns(dataset, &[x_column, y_column])?;
    let xs = numeric_values(dataset, x_column, "scatter plot")?;
    let ys = numeric_values(dataset, y_column, "scatter plot")?;

    let points: Vec<(f64, f64)> = xs
        .into_iter()
        .zip(ys)
        .filter_map(|(x, y)| Some((x?, y?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();

    let result = ScatterResult {
        x_column: x_column.to_string(),
        y_column: y_column.to_string(),
        points: points.len(),
        plot_url: None,
    };
    let spec = ChartSpec::Scatter {
        title: format!("Scatter Plot: {} vs {}", x_column, y_column),
        x_label: x_column.to_string(),
        y_label: y_column.to_string(),
        points,
        color: Rgb::PRIMARY,
    };
    Ok((result, spec))
}
