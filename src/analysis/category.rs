use super::stats::descending_defined_first;
use super::{numeric_values, require_columns, AnalysisError};
use crate::chart::{purple_gradient, ChartSpec, ChartStyle, Rgb};
use crate::datasets::{display_values, Dataset};
use serde::Serialize;
use std::collections::HashMap;

/// Number of groups kept after ranking.
pub const TOP_CATEGORIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryChartResult {
    pub chart_type: ChartStyle,
    pub category_column: String,
    pub value_column: String,
    /// Group keys, highest mean first.
    pub categories: Vec<String>,
    pub means: Vec<Option<f64>>,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_url: Option<String>,
}

/// Compact annotation for a chart value: `1.5K`, `2.5M`, `3.0B`, or one decimal.
pub fn format_value_label(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if magnitude >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if magnitude >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{:.1}", value)
    }
}

struct Group {
    key: String,
    sum: f64,
    count: usize,
}

impl Group {
    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

pub fn run(
    dataset: &Dataset,
    category_column: &str,
    value_column: &str,
    style: ChartStyle,
) -> Result<(CategoryChartResult, ChartSpec), AnalysisError> {
    require_columns(dataset, &[category_column, value_column])?;
    let values = numeric_values(dataset, value_column, "charts")?;
    if dataset.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }

    let category_array = dataset.column(category_column).ok_or_else(|| {
        AnalysisError::Unexpected(format!("column '{}' disappeared", category_column))
    })?;
    let keys = display_values(category_array)?;

    // Groups in first-seen order; rows without a category are dropped
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (key, value) in keys.into_iter().zip(values) {
        let Some(key) = key else { continue };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(Group {
                key,
                sum: 0.0,
                count: 0,
            });
            groups.len() - 1
        });
        if let Some(v) = value {
            groups[slot].sum += v;
            groups[slot].count += 1;
        }
    }
    if groups.is_empty() {
        return Err(AnalysisError::NoDataAfterGrouping);
    }

    groups.sort_by(|a, b| descending_defined_first(a.mean(), b.mean()));
    groups.truncate(TOP_CATEGORIES);

    let categories: Vec<String> = groups.iter().map(|g| g.key.clone()).collect();
    let means: Vec<Option<f64>> = groups.iter().map(Group::mean).collect();
    let labels: Vec<String> = means
        .iter()
        .map(|m| m.map(format_value_label).unwrap_or_else(|| "n/a".to_string()))
        .collect();

    let spec = ChartSpec::Category {
        style,
        title: format!(
            "{}: {} by {} (Top {})",
            style.title_prefix(),
            value_column,
            category_column,
            TOP_CATEGORIES
        ),
        x_label: category_column.to_string(),
        y_label: value_column.to_string(),
        categories: categories.clone(),
        values: means.clone(),
        value_labels: labels.clone(),
        colors: purple_gradient(categories.len()),
        accent: Rgb::ACCENT,
        background: Rgb::BACKGROUND,
    };

    Ok((
        CategoryChartResult {
            chart_type: style,
            category_column: category_column.to_string(),
            value_column: value_column.to_string(),
            categories,
            means,
            labels,
            plot_url: None,
        },
        spec,
    ))
}
