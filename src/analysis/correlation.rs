use super::stats::{descending_defined_first, pearson, present, sample_variance};
use super::{numeric_values, AnalysisError};
use crate::chart::ChartSpec;
use crate::datasets::{ColumnMap, Dataset};
use serde::Serialize;

/// More numeric columns than this is refused outright.
pub const MAX_NUMERIC_COLUMNS: usize = 50;
/// Above this many numeric columns only the most varying are kept.
pub const MATRIX_COLUMN_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    /// `correlation[a][b]`; `null` where the coefficient is undefined.
    pub correlation: ColumnMap<ColumnMap<Option<f64>>>,
    pub columns: Vec<String>,
    pub limited_columns: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_url: Option<String>,
}

pub fn run(dataset: &Dataset) -> Result<(CorrelationResult, ChartSpec), AnalysisError> {
    let numeric = dataset.numeric_column_names();
    if numeric.len() > MAX_NUMERIC_COLUMNS {
        return Err(AnalysisError::TooManyColumns {
            found: numeric.len(),
            limit: MAX_NUMERIC_COLUMNS,
        });
    }
    if numeric.len() < 2 {
        return Err(AnalysisError::InsufficientColumns {
            found: numeric.len(),
        });
    }

    let mut series = numeric
        .into_iter()
        .map(|name| {
            let values = numeric_values(dataset, &name, "correlation")?;
            Ok((name, values))
        })
        .collect::<Result<Vec<_>, AnalysisError>>()?;

    let original_count = series.len();
    let limited_columns = original_count > MATRIX_COLUMN_LIMIT;
    let mut message = None;
    if limited_columns {
        let mut ranked: Vec<_> = series
            .into_iter()
            .map(|(name, values)| (sample_variance(&present(&values)), name, values))
            .collect();
        // Stable: equal variances keep dataset order
        ranked.sort_by(|a, b| descending_defined_first(a.0, b.0));
        series = ranked
            .into_iter()
            .take(MATRIX_COLUMN_LIMIT)
            .map(|(_, name, values)| (name, values))
            .collect();
        message = Some(format!(
            "Matrix limited to top {} numeric columns (out of {}) for performance.",
            MATRIX_COLUMN_LIMIT, original_count
        ));
    }

    let n = series.len();
    let mut matrix = vec![vec![None; n]; n];
    for i in 0..n {
        matrix[i][i] = Some(1.0);
        for j in 0..i {
            let r = pearson(&series[i].1, &series[j].1);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }

    let columns: Vec<String> = series.into_iter().map(|(name, _)| name).collect();
    let correlation = columns
        .iter()
        .zip(&matrix)
        .map(|(name, row)| {
            let inner: ColumnMap<Option<f64>> =
                columns.iter().cloned().zip(row.iter().copied()).collect();
            (name.clone(), inner)
        })
        .collect();

    let spec = ChartSpec::Heatmap {
        title: "Correlation Matrix".to_string(),
        labels: columns.clone(),
        values: matrix,
        mask_upper: true,
        annotation_decimals: 2,
    };

    Ok((
        CorrelationResult {
            correlation,
            columns,
            limited_columns,
            message,
            plot_url: None,
        },
        spec,
    ))
}
