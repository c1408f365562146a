//! Backend-independent chart descriptions.

use super::RenderError;
use serde::{Serialize, Serializer};

/// An sRGB color; serializes as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const PRIMARY: Rgb = Rgb(0x6b, 0x21, 0xa8);
    pub const ACCENT: Rgb = Rgb(0xec, 0x48, 0x99);
    pub const BACKGROUND: Rgb = Rgb(0xf8, 0xf9, 0xfa);

    /// Linear blend from `self` (t = 0) to `other` (t = 1).
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Sequential purple palette, `n` shades from medium to dark.
pub fn purple_gradient(n: usize) -> Vec<Rgb> {
    let light = Rgb(0x9e, 0x9a, 0xc8);
    let dark = Rgb(0x54, 0x27, 0x8f);
    match n {
        0 => Vec::new(),
        1 => vec![light],
        _ => (0..n)
            .map(|i| light.lerp(dark, i as f64 / (n - 1) as f64))
            .collect(),
    }
}

/// Diverging blue-white-red map for values in [-1, 1].
pub fn coolwarm(value: f64) -> Rgb {
    let cold = Rgb(0x3b, 0x4c, 0xc0);
    let neutral = Rgb(0xdd, 0xdd, 0xdd);
    let warm = Rgb(0xb4, 0x04, 0x26);
    let v = value.clamp(-1.0, 1.0);
    if v < 0.0 {
        neutral.lerp(cold, -v)
    } else {
        neutral.lerp(warm, v)
    }
}

/// Presentation of a category aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartStyle {
    #[default]
    Bar,
    Pie,
    Line,
}

impl ChartStyle {
    /// Resolve a requested style name.
    ///
    /// Missing, empty or unrecognized names fall back to [`ChartStyle::Bar`];
    /// this is product behavior, not a validation gap.
    pub fn resolve(name: Option<&str>) -> Self {
        match name {
            Some("pie") => Self::Pie,
            Some("line") => Self::Line,
            _ => Self::Bar,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Pie => "pie",
            Self::Line => "line",
        }
    }

    /// Title prefix used for charts of this style.
    pub fn title_prefix(&self) -> &'static str {
        match self {
            Self::Bar => "Bar Graph",
            Self::Pie => "Pie Chart",
            Self::Line => "Line Chart",
        }
    }
}

impl std::fmt::Display for ChartStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved chart: data, labels and styling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "chart", rename_all = "snake_case")]
pub enum ChartSpec {
    /// Square matrix of coefficients in [-1, 1]; `None` cells are undefined.
    Heatmap {
        title: String,
        labels: Vec<String>,
        values: Vec<Vec<Option<f64>>>,
        /// Hide the upper triangle including the diagonal.
        mask_upper: bool,
        annotation_decimals: usize,
    },
    Histogram {
        title: String,
        x_label: String,
        y_label: String,
        /// `counts.len() + 1` ascending bin edges.
        edges: Vec<f64>,
        counts: Vec<u64>,
        color: Rgb,
    },
    Category {
        style: ChartStyle,
        title: String,
        x_label: String,
        y_label: String,
        categories: Vec<String>,
        values: Vec<Option<f64>>,
        /// Annotation text per category.
        value_labels: Vec<String>,
        colors: Vec<Rgb>,
        accent: Rgb,
        background: Rgb,
    },
    Scatter {
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
        color: Rgb,
    },
}

impl ChartSpec {
    pub fn title(&self) -> &str {
        match self {
            Self::Heatmap { title, .. }
            | Self::Histogram { title, .. }
            | Self::Category { title, .. }
            | Self::Scatter { title, .. } => title,
        }
    }

    /// Check that the data arrays are mutually consistent.
    pub fn validate(&self) -> Result<(), RenderError> {
        match self {
            Self::Heatmap { labels, values, .. } => {
                if values.len() != labels.len() || values.iter().any(|r| r.len() != labels.len())
                {
                    return Err(RenderError::InvalidSpec(format!(
                        "heatmap must be {n}x{n}",
                        n = labels.len()
                    )));
                }
            }
            Self::Histogram { edges, counts, .. } => {
                if counts.is_empty() || edges.len() != counts.len() + 1 {
                    return Err(RenderError::InvalidSpec(format!(
                        "histogram has {} edges for {} bins",
                        edges.len(),
                        counts.len()
                    )));
                }
                if edges
                    .windows(2)
                    .any(|w| w[1].partial_cmp(&w[0]) != Some(std::cmp::Ordering::Greater))
                {
                    return Err(RenderError::InvalidSpec(
                        "histogram edges must be strictly ascending".to_string(),
                    ));
                }
            }
            Self::Category {
                categories,
                values,
                value_labels,
                colors,
                ..
            } => {
                let n = categories.len();
                if values.len() != n || value_labels.len() != n || colors.len() != n {
                    return Err(RenderError::InvalidSpec(format!(
                        "category chart arrays disagree on length ({} categories)",
                        n
                    )));
                }
            }
            Self::Scatter { points, .. } => {
                if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
                    return Err(RenderError::InvalidSpec(
                        "scatter points must be finite".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}
