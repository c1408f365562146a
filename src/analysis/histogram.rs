use super::stats::present;
use super::{numeric_values, require_columns, AnalysisError};
use crate::chart::{ChartSpec, Rgb};
use crate::datasets::Dataset;
use serde::Serialize;

pub const HISTOGRAM_BINS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramResult {
    pub column: String,
    pub bins: usize,
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_url: Option<String>,
}

pub fn run(dataset: &Dataset, column: &str) -> Result<(HistogramResult, ChartSpec), AnalysisError> {
    require_columns(dataset, &[column])?;
    let values = present(&numeric_values(dataset, column, "histogram")?);
    let (edges, counts) = bin_values(&values, HISTOGRAM_BINS);

    let spec = ChartSpec::Histogram {
        title: format!("Histogram of {}", column),
        x_label: column.to_string(),
        y_label: "Frequency".to_string(),
        edges: edges.clone(),
        counts: counts.clone(),
        color: Rgb::PRIMARY,
    };

    Ok((
        HistogramResult {
            column: column.to_string(),
            bins: HISTOGRAM_BINS,
            edges,
            counts,
            plot_url: None,
        },
        spec,
    ))
}

/// Equal-width bins over `[min, max]`; the last bin includes `max`.
///
/// A single distinct value `v` is binned over `[v - 0.5, v + 0.5]` and no
/// values at all over `[0, 1]`. When the range is too narrow for the bins to
/// get distinct edges, it is widened around its midpoint by a pad that scales
/// with magnitude.
pub fn bin_values(values: &[f64], bins: usize) -> (Vec<f64>, Vec<u64>) {
    let bins = bins.max(1);
    let (lo, hi) = bin_range(values, bins);
    let width = hi - lo;
    let edges = bin_edges(lo, hi, bins);

    let mut counts = vec![0u64; bins];
    for &v in values {
        let idx = (((v - lo) / width) * bins as f64).floor() as usize;
        counts[idx.min(bins - 1)] += 1;
    }
    (edges, counts)
}

fn bin_range(values: &[f64], bins: usize) -> (f64, f64) {
    let Some((lo, hi)) = values
        .iter()
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    else {
        return (0.0, 1.0);
    };

    if lo < hi && is_strictly_ascending(&bin_edges(lo, hi, bins)) {
        return (lo, hi);
    }
    let mid = lo / 2.0 + hi / 2.0;
    let pad = 0.5f64.max(mid.abs() * 1e-9);
    (mid - pad, mid + pad)
}

fn bin_edges(lo: f64, hi: f64, bins: usize) -> Vec<f64> {
    let width = hi - lo;
    (0..=bins)
        .map(|i| {
            if i == bins {
                hi
            } else {
                lo + width * i as f64 / bins as f64
            }
        })
        .collect()
}

fn is_strictly_ascending(edges: &[f64]) -> bool {
    edges.windows(2).all(|w| w[0] < w[1])
}
