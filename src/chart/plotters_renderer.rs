//! PNG rendering through the `plotters` bitmap backend.

use super::{coolwarm, ChartRenderer, ChartSpec, ChartStyle, RenderError, Rgb};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::Path;

const FONT: &str = "sans-serif";
const MAX_TICK_LABEL_CHARS: usize = 14;
const UNDEFINED_CELL: RGBColor = RGBColor(0xee, 0xee, 0xee);

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Renders charts to PNG files. The output format follows the path extension,
/// so callers must pass a `.png` path.
#[derive(Debug, Clone)]
pub struct PlottersRenderer {
    heatmap_size: (u32, u32),
    chart_size: (u32, u32),
}

impl Default for PlottersRenderer {
    fn default() -> Self {
        Self {
            heatmap_size: (1000, 800),
            chart_size: (1000, 600),
        }
    }
}

impl PlottersRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(&self, spec: &ChartSpec, path: &Path) -> Result<(), RenderError> {
        spec.validate()?;

        let size = match spec {
            ChartSpec::Heatmap { .. } => self.heatmap_size,
            _ => self.chart_size,
        };
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        match spec {
            ChartSpec::Heatmap {
                title,
                labels,
                values,
                mask_upper,
                annotation_decimals,
            } => draw_heatmap(&root, title, labels, values, *mask_upper, *annotation_decimals)?,
            ChartSpec::Histogram {
                title,
                x_label,
                y_label,
                edges,
                counts,
                color,
            } => draw_histogram(&root, title, x_label, y_label, edges, counts, *color)?,
            ChartSpec::Category {
                style: ChartStyle::Pie,
                title,
                categories,
                values,
                colors,
                ..
            } => draw_pie(&root, title, categories, values, colors)?,
            ChartSpec::Category { .. } => draw_category(&root, spec)?,
            ChartSpec::Scatter {
                title,
                x_label,
                y_label,
                points,
                color,
            } => draw_scatter(&root, title, x_label, y_label, points, *color)?,
        }

        root.present()?;
        Ok(())
    }
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

fn tick_label(label: &str) -> String {
    if label.chars().count() <= MAX_TICK_LABEL_CHARS {
        return label.to_string();
    }
    let mut short: String = label.chars().take(MAX_TICK_LABEL_CHARS - 1).collect();
    short.push('…');
    short
}

fn text_style(size: u32, color: &RGBColor, h: HPos, v: VPos) -> TextStyle<'static> {
    (FONT, size).into_font().color(color).pos(Pos::new(h, v))
}

/// Axis range covering `values`, padded by 10% and optionally including zero.
fn padded_range(values: impl Iterator<Item = f64>, include_zero: bool) -> Range<f64> {
    let (mut lo, mut hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if lo == hi {
        return (lo - 0.5)..(hi + 0.5);
    }
    let pad = (hi - lo) * 0.1;
    let lo = if include_zero && lo == 0.0 { 0.0 } else { lo - pad };
    let hi = if include_zero && hi == 0.0 { 0.0 } else { hi + pad };
    lo..hi
}

fn draw_heatmap(
    root: &Area<'_>,
    title: &str,
    labels: &[String],
    values: &[Vec<Option<f64>>],
    mask_upper: bool,
    decimals: usize,
) -> Result<(), RenderError> {
    let n = labels.len();
    if n == 0 {
        return Err(RenderError::InvalidSpec("heatmap has no columns".to_string()));
    }
    let side = n as f64;

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 28))
        .margin(20)
        .x_label_area_size(90)
        .y_label_area_size(140)
        .build_cartesian_2d(0f64..side, 0f64..side)?;

    let annotation = text_style(14, &BLACK, HPos::Center, VPos::Center);
    for (i, row) in values.iter().enumerate() {
        // First row is drawn at the top
        let y = (n - i - 1) as f64;
        for (j, value) in row.iter().enumerate() {
            if mask_upper && j >= i {
                continue;
            }
            let x = j as f64;
            let fill = value.map(|v| rgb(coolwarm(v))).unwrap_or(UNDEFINED_CELL);
            let mut cell = Rectangle::new([(x, y), (x + 1.0, y + 1.0)], fill.filled());
            cell.set_margin(1, 1, 1, 1);
            chart.draw_series(std::iter::once(cell))?;

            if let Some(v) = value {
                chart.draw_series(std::iter::once(Text::new(
                    format!("{:.*}", decimals, v),
                    (x + 0.5, y + 0.5),
                    annotation.clone(),
                )))?;
            }
        }
    }

    let x_tick = text_style(13, &BLACK, HPos::Center, VPos::Top);
    let y_tick = text_style(13, &BLACK, HPos::Right, VPos::Center);
    for (k, label) in labels.iter().enumerate() {
        let (px, py) = chart.backend_coord(&(k as f64 + 0.5, 0.0));
        root.draw(&Text::new(tick_label(label), (px, py + 8), x_tick.clone()))?;

        let (px, py) = chart.backend_coord(&(0.0, side - k as f64 - 0.5));
        root.draw(&Text::new(tick_label(label), (px - 8, py), y_tick.clone()))?;
    }
    Ok(())
}

fn draw_histogram(
    root: &Area<'_>,
    title: &str,
    x_label: &str,
    y_label: &str,
    edges: &[f64],
    counts: &[u64],
    color: Rgb,
) -> Result<(), RenderError> {
    let x_range = edges[0]..edges[edges.len() - 1];
    let y_range = padded_range(counts.iter().map(|&c| c as f64), true);

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()?;

    let fill = rgb(color).mix(0.7).filled();
    chart.draw_series(
        edges
            .windows(2)
            .zip(counts)
            .map(|(bin, &count)| Rectangle::new([(bin[0], 0.0), (bin[1], count as f64)], fill)),
    )?;
    Ok(())
}

fn draw_category(root: &Area<'_>, spec: &ChartSpec) -> Result<(), RenderError> {
    let ChartSpec::Category {
        style,
        title,
        x_label,
        y_label,
        categories,
        values,
        value_labels,
        colors,
        accent,
        background,
    } = spec
    else {
        return Err(RenderError::InvalidSpec("expected a category chart".to_string()));
    };

    let n = categories.len().max(1);
    let y_range = padded_range(values.iter().flatten().copied(), true);

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 24))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..n as f64, y_range)?;
    chart.plotting_area().fill(&rgb(*background))?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_: &f64| String::new())
        .x_desc(x_label.as_str())
        .y_desc(y_label.as_str())
        .draw()?;

    let points: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();

    match style {
        ChartStyle::Line => {
            let line: Vec<(f64, f64)> = points.iter().map(|&(i, v)| (i as f64 + 0.5, v)).collect();
            chart.draw_series(LineSeries::new(
                line.clone(),
                rgb(Rgb::PRIMARY).stroke_width(3),
            ))?;
            chart.draw_series(
                line.iter()
                    .map(|&p| Circle::new(p, 7, rgb(*accent).filled())),
            )?;
        }
        _ => {
            chart.draw_series(points.iter().map(|&(i, v)| {
                Rectangle::new(
                    [(i as f64 + 0.2, 0.0), (i as f64 + 0.8, v)],
                    rgb(colors[i]).filled(),
                )
            }))?;
        }
    }

    let value_style = text_style(13, &BLACK, HPos::Center, VPos::Bottom);
    for &(i, v) in &points {
        chart.draw_series(std::iter::once(Text::new(
            value_labels[i].clone(),
            (i as f64 + 0.5, v),
            value_style.clone(),
        )))?;
    }

    let tick = text_style(13, &BLACK, HPos::Center, VPos::Top);
    let baseline = chart.y_range().start;
    for (i, category) in categories.iter().enumerate() {
        let (px, py) = chart.backend_coord(&(i as f64 + 0.5, baseline));
        root.draw(&Text::new(tick_label(category), (px, py + 8), tick.clone()))?;
    }
    Ok(())
}

fn draw_pie(
    root: &Area<'_>,
    title: &str,
    categories: &[String],
    values: &[Option<f64>],
    colors: &[Rgb],
) -> Result<(), RenderError> {
    // Slices need non-negative sizes; undefined means get no slice
    let sizes: Vec<f64> = values.iter().map(|v| v.unwrap_or(0.0).max(0.0)).collect();
    if sizes.iter().sum::<f64>() <= 0.0 {
        return Err(RenderError::InvalidSpec(
            "pie chart needs at least one positive value".to_string(),
        ));
    }
    let colors: Vec<RGBColor> = colors.iter().copied().map(rgb).collect();

    let area = root.titled(title, (FONT, 24))?;
    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, categories);
    pie.start_angle(90.0);
    pie.label_style((FONT, 14).into_font().color(&BLACK));
    pie.percentages((FONT, 13).into_font().color(&WHITE));
    area.draw(&pie)?;
    Ok(())
}

fn draw_scatter(
    root: &Area<'_>,
    title: &str,
    x_label: &str,
    y_label: &str,
    points: &[(f64, f64)],
    color: Rgb,
) -> Result<(), RenderError> {
    let x_range = padded_range(points.iter().map(|p| p.0), false);
    let y_range = padded_range(points.iter().map(|p| p.1), false);

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;
    chart.configure_mesh().x_desc(x_label).y_desc(y_label).draw()?;

    let fill = rgb(color).mix(0.7).filled();
    chart.draw_series(points.iter().map(|&p| Circle::new(p, 5, fill)))?;
    Ok(())
}
