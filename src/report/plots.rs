//! SVG charts for the analysis views
//!
//! Every chart is a standalone SVG file written with the plotters SVG
//! backend. Categorical axes use segmented coordinates so each category owns
//! one slot.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::full_palette::{BLUE_600, GREEN_600, GREY_500, ORANGE_600, RED_600, TEAL_600};

use crate::model::metrics::{CalibrationCurve, RocCurve};
use crate::pipeline::eda::BoxStats;
use crate::pipeline::CorrelationMatrix;

const CHART_SIZE: (u32, u32) = (1000, 700);
const TALL_CHART_SIZE: (u32, u32) = (1000, 900);
const CAPTION_FONT: (&str, u32) = ("sans-serif", 24);
const LABEL_FONT: (&str, u32) = ("sans-serif", 13);

/// Renders charts into one directory and records every file written
///
/// A disabled writer skips rendering entirely.
#[derive(Debug)]
pub struct PlotWriter {
    dir: PathBuf,
    enabled: bool,
    written: Vec<PathBuf>,
}

impl PlotWriter {
    pub fn new(dir: &Path, enabled: bool) -> Self {
        Self {
            dir: dir.to_path_buf(),
            enabled,
            written: Vec::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Render `file_name` inside the output directory with `render`
    pub fn draw(&mut self, file_name: &str, render: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let path = self.dir.join(file_name);
        render(&path).with_context(|| format!("Failed to render chart: {}", path.display()))?;
        self.written.push(path);
        Ok(())
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

fn segment_label(labels: &[String], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

/// `(min, max)` of the finite values, padded by 5% of the span
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1e-6);
    (lo - pad, hi + pad)
}

/// Vertical bar per category
pub fn bar_chart(
    path: &Path,
    title: &str,
    x_label: &str,
    y_label: &str,
    bars: &[(String, f64)],
) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    if bars.is_empty() {
        root.present()?;
        return Ok(());
    }

    let labels: Vec<String> = bars.iter().map(|(l, _)| l.clone()).collect();
    let y_max = bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max).max(1e-6) * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(15)
        .x_label_area_size(70)
        .y_label_area_size(60)
        .build_cartesian_2d((0..bars.len()).into_segmented(), 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len().max(1))
        .x_label_formatter(&|v| segment_label(&labels, v))
        .x_label_style(LABEL_FONT)
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, (_, v))| {
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
            TEAL_600.filled(),
        );
        bar.set_margin(0, 0, 8, 8);
        bar
    }))?;

    root.present()?;
    Ok(())
}

/// Horizontal bar per feature, first entry on top; negative values extend left
pub fn horizontal_bars(path: &Path, title: &str, x_label: &str, bars: &[(String, f64)]) -> Result<()> {
    let root = SVGBackend::new(path, TALL_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    if bars.is_empty() {
        root.present()?;
        return Ok(());
    }

    let n = bars.len();
    // Reverse so the first entry is drawn at the top
    let labels: Vec<String> = bars.iter().rev().map(|(l, _)| l.clone()).collect();
    let (lo, hi) = padded_range(bars.iter().map(|(_, v)| *v).chain(std::iter::once(0.0)));

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(230)
        .build_cartesian_2d(lo..hi, (0..n).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n.max(1))
        .y_label_formatter(&|v| segment_label(&labels, v))
        .y_label_style(LABEL_FONT)
        .x_desc(x_label)
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, (_, v))| {
        let slot = n - 1 - i;
        let color = if *v >= 0.0 { BLUE_600 } else { RED_600 };
        let mut bar = Rectangle::new(
            [(0.0, SegmentValue::Exact(slot)), (*v, SegmentValue::Exact(slot + 1))],
            color.filled(),
        );
        bar.set_margin(3, 3, 0, 0);
        bar
    }))?;

    root.present()?;
    Ok(())
}

/// Two histograms side by side in each bin
pub fn dodged_histogram(
    path: &Path,
    title: &str,
    x_label: &str,
    series: [(&str, &[f64]); 2],
    bins: usize,
) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let all = series.iter().flat_map(|(_, v)| v.iter().copied());
    let (lo, hi) = all
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || bins == 0 {
        root.present()?;
        return Ok(());
    }
    let width = ((hi - lo) / bins as f64).max(1e-9);
    let bin_of = |v: f64| (((v - lo) / width) as usize).min(bins - 1);

    let counts: Vec<Vec<usize>> = series
        .iter()
        .map(|(_, values)| {
            let mut counts = vec![0usize; bins];
            for &v in values.iter().filter(|v| v.is_finite()) {
                counts[bin_of(v)] += 1;
            }
            counts
        })
        .collect();
    let y_max = counts.iter().flatten().copied().max().unwrap_or(1).max(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(lo..(lo + width * bins as f64), 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_label)
        .y_desc("Count")
        .draw()?;

    let colors = [BLUE_600, ORANGE_600];
    for (s, ((name, _), counts)) in series.iter().zip(counts.iter()).enumerate() {
        let color = colors[s];
        let offset = width / 2.0 * s as f64;
        chart
            .draw_series(counts.iter().enumerate().map(move |(b, &c)| {
                let x0 = lo + b as f64 * width + offset;
                Rectangle::new([(x0, 0.0), (x0 + width / 2.0, c as f64)], color.mix(0.85).filled())
            }))?
            .label(*name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Box and whiskers per group from precomputed five-number summaries
pub fn box_plot(path: &Path, title: &str, y_label: &str, groups: &[(String, BoxStats)]) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    if groups.is_empty() {
        root.present()?;
        return Ok(());
    }

    let labels: Vec<String> = groups.iter().map(|(l, _)| l.clone()).collect();
    let (lo, hi) = padded_range(groups.iter().flat_map(|(_, b)| [b.min, b.max]));

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d((0..groups.len()).into_segmented(), lo..hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(groups.len().max(1))
        .x_label_formatter(&|v| segment_label(&labels, v))
        .y_desc(y_label)
        .draw()?;

    for (i, (_, b)) in groups.iter().enumerate() {
        let mut body = Rectangle::new(
            [(SegmentValue::Exact(i), b.q1), (SegmentValue::Exact(i + 1), b.q3)],
            TEAL_600.mix(0.4).filled(),
        );
        body.set_margin(0, 0, 40, 40);
        chart.draw_series(std::iter::once(body))?;

        let center = SegmentValue::CenterOf(i);
        chart.draw_series([
            PathElement::new(vec![(center.clone(), b.min), (center.clone(), b.q1)], BLACK),
            PathElement::new(vec![(center.clone(), b.q3), (center, b.max)], BLACK),
            PathElement::new(
                vec![(SegmentValue::Exact(i), b.median), (SegmentValue::Exact(i + 1), b.median)],
                BLACK.stroke_width(2),
            ),
        ])?;
    }

    root.present()?;
    Ok(())
}

/// Blue-white-red color for a correlation in [-1, 1]
fn diverging_color(value: f64) -> RGBColor {
    let t = value.clamp(-1.0, 1.0);
    let (from, to, w) = if t < 0.0 {
        ((59.0, 76.0, 192.0), (255.0, 255.0, 255.0), t + 1.0)
    } else {
        ((255.0, 255.0, 255.0), (180.0, 4.0, 38.0), t)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * w).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

/// Lower-triangle correlation heatmap
pub fn correlation_heatmap(path: &Path, title: &str, matrix: &CorrelationMatrix) -> Result<()> {
    let root = SVGBackend::new(path, (1400, 1300)).into_drawing_area();
    root.fill(&WHITE)?;
    if matrix.names.is_empty() {
        root.present()?;
        return Ok(());
    }

    let n = matrix.names.len();
    let labels = matrix.names.clone();
    let flipped: Vec<String> = matrix.names.iter().rev().cloned().collect();

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(15)
        .x_label_area_size(200)
        .y_label_area_size(220)
        .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n.max(1))
        .y_labels(n.max(1))
        .x_label_formatter(&|v| segment_label(&labels, v))
        .y_label_formatter(&|v| segment_label(&flipped, v))
        .x_label_style(
            ("sans-serif", 11)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_label_style(("sans-serif", 11))
        .draw()?;

    chart.draw_series((0..n).flat_map(|i| (0..=i).map(move |j| (i, j))).map(|(i, j)| {
        let row = n - 1 - i;
        Rectangle::new(
            [
                (SegmentValue::Exact(j), SegmentValue::Exact(row)),
                (SegmentValue::Exact(j + 1), SegmentValue::Exact(row + 1)),
            ],
            diverging_color(matrix.values[[i, j]]).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

/// ROC curve per model with the chance diagonal
pub fn roc_curves(path: &Path, title: &str, curves: &[(String, f64, &RocCurve)]) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..1.0, 0.0..1.0)?;

    chart
        .configure_mesh()
        .x_desc("False Positive Rate")
        .y_desc("True Positive Rate")
        .draw()?;

    chart.draw_series(LineSeries::new(vec![(0.0, 0.0), (1.0, 1.0)], GREY_500))?;

    for (i, (name, auc, curve)) in curves.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(
                curve.fpr.iter().copied().zip(curve.tpr.iter().copied()),
                color.stroke_width(2),
            ))?
            .label(format!("{} (AUC = {:.4})", name, auc))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Observed vs predicted probability per bin
pub fn calibration_plot(path: &Path, title: &str, curve: &CalibrationCurve) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..1.0, 0.0..1.0)?;

    chart
        .configure_mesh()
        .x_desc("Predicted Probability")
        .y_desc("True Probability")
        .draw()?;

    chart.draw_series(LineSeries::new(vec![(0.0, 0.0), (1.0, 1.0)], GREY_500))?;

    let points: Vec<(f64, f64)> = curve
        .prob_pred
        .iter()
        .copied()
        .zip(curve.prob_true.iter().copied())
        .collect();
    chart.draw_series(LineSeries::new(points.clone(), BLUE_600.stroke_width(2)))?;
    chart.draw_series(points.iter().map(|&p| Circle::new(p, 4, BLUE_600.filled())))?;

    root.present()?;
    Ok(())
}

/// Scatter of `(x, y)` points in one color
pub fn scatter(path: &Path, title: &str, x_label: &str, y_label: &str, points: &[(f64, f64)]) -> Result<()> {
    grouped_scatter(path, title, x_label, y_label, &[(String::new(), points.to_vec(), 3)])
}

/// Scatter with one colored series per group; each series has its own
/// marker radius
pub fn grouped_scatter(
    path: &Path,
    title: &str,
    x_label: &str,
    y_label: &str,
    series: &[(String, Vec<(f64, f64)>, u32)],
) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_lo, x_hi) = padded_range(series.iter().flat_map(|(_, p, _)| p.iter().map(|q| q.0)));
    let (y_lo, y_hi) = padded_range(series.iter().flat_map(|(_, p, _)| p.iter().map(|q| q.1)));

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart.configure_mesh().x_desc(x_label).y_desc(y_label).draw()?;

    let colors = [GREEN_600, ORANGE_600, RED_600, BLUE_600];
    let labelled = series.iter().any(|(name, _, _)| !name.is_empty());
    for (i, (name, points, radius)) in series.iter().enumerate() {
        let color = colors[i % colors.len()];
        let radius = *radius as i32;
        let anno = chart.draw_series(
            points
                .iter()
                .map(move |&p| Circle::new(p, radius, color.mix(0.6).filled())),
        )?;
        if !name.is_empty() {
            anno.label(name.as_str())
                .legend(move |(x, y)| Circle::new((x + 6, y), 5, color.filled()));
        }
    }

    if labelled {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Stacked count bars per category; `stacks[s]` holds one value per category
pub fn stacked_bars(
    path: &Path,
    title: &str,
    x_label: &str,
    y_label: &str,
    categories: &[String],
    stacks: &[(&str, Vec<f64>)],
) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    if categories.is_empty() {
        root.present()?;
        return Ok(());
    }

    let totals: Vec<f64> = (0..categories.len())
        .map(|c| stacks.iter().map(|(_, v)| v.get(c).copied().unwrap_or(0.0)).sum())
        .collect();
    let y_max = totals.iter().copied().fold(0.0_f64, f64::max).max(1.0) * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((0..categories.len()).into_segmented(), 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len().max(1))
        .x_label_formatter(&|v| segment_label(categories, v))
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()?;

    let colors = [TEAL_600, ORANGE_600, RED_600];
    let mut base = vec![0.0; categories.len()];
    for (s, (name, values)) in stacks.iter().enumerate() {
        let color = colors[s % colors.len()];
        let bars: Vec<Rectangle<(SegmentValue<usize>, f64)>> = values
            .iter()
            .enumerate()
            .take(categories.len())
            .map(|(c, v)| {
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(c), base[c]), (SegmentValue::Exact(c + 1), base[c] + v)],
                    color.filled(),
                );
                bar.set_margin(0, 0, 15, 15);
                base[c] += v;
                bar
            })
            .collect();
        chart
            .draw_series(bars)?
            .label(*name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
