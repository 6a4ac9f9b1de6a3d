//! SVG charts over a [`ResultMatrix`] or a set of [`Distribution`]s.
//!
//! This module only maps cells to colors, positions and labels; every number
//! it draws was computed upstream.

use crate::matrix::{Distribution, ResultMatrix};
use crate::protocol::{Phase, Protocol};
use crate::stats::{format_sig_figs, median};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fmt::Display;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

const CHART_SIZE: (u32, u32) = (1600, 800);
const GROUP_WIDTH: f64 = 0.8;
const HEADROOM: f64 = 1.10;
const FONT: &str = "sans-serif";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("nothing to plot: every requested series is empty")]
    NoData,

    #[error("failed to prepare output directory for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to draw {path}: {reason}")]
    Draw { path: String, reason: String },
}

/// Bar color for one (protocol, phase) series.
pub fn series_color(protocol: Protocol, phase: Phase) -> RGBColor {
    match (protocol, phase) {
        (Protocol::Frost, Phase::Initiation) => RGBColor(0, 0, 139),
        (Protocol::Frost, Phase::Signing) => RGBColor(135, 206, 235),
        (Protocol::Frost, Phase::Aggregation) => RGBColor(100, 149, 237),
        (Protocol::Frost, _) => RGBColor(0, 0, 255),
        (Protocol::Multisig, Phase::Initiation) => RGBColor(139, 0, 0),
        (Protocol::Multisig, Phase::Signing) => RGBColor(240, 128, 128),
        (Protocol::Multisig, Phase::ViewLatency) => RGBColor(205, 92, 92),
        (Protocol::Multisig, _) => RGBColor(255, 0, 0),
        (Protocol::Roast, _) => RGBColor(70, 130, 180),
    }
}

/// Median line and label color in distribution plots.
pub fn protocol_color(protocol: Protocol) -> RGBColor {
    match protocol {
        Protocol::Frost => BLUE,
        Protocol::Multisig => RED,
        Protocol::Roast => RGBColor(70, 130, 180),
    }
}

/// Center offset of series `index` out of `count` bars sharing one group.
pub fn bar_offset(index: usize, count: usize) -> f64 {
    let width = bar_width(count);
    width * index as f64 - width * (count.saturating_sub(1)) as f64 / 2.0
}

pub fn bar_width(count: usize) -> f64 {
    GROUP_WIDTH / count.max(1) as f64
}

/// Top of the value axis: the largest value plus headroom.
pub fn upper_bound(values: impl IntoIterator<Item = f64>) -> f64 {
    let max = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    if max > 0.0 { max * HEADROOM } else { 1.0 }
}

pub struct BarChart<'a> {
    pub title: &'a str,
    pub phases: &'a [Phase],
    pub y_desc: &'a str,
    pub annotate: bool,
}

/// One group of bars per scale, one bar per (protocol, phase) series.
/// Missing cells leave a gap.
pub fn render_grouped_bars(matrix: &ResultMatrix, chart: &BarChart, path: &Path) -> Result<(), RenderError> {
    let rows: Vec<_> = matrix
        .series_keys(chart.phases)
        .into_iter()
        .filter_map(|(protocol, phase)| Some((protocol, phase, matrix.row(protocol, phase)?)))
        .collect();
    if rows.iter().all(|(_, _, values)| values.iter().all(Option::is_none)) {
        return Err(RenderError::NoData);
    }
    prepare(path)?;
    let fail = |e| draw_error(path, e);

    let scales = matrix.scales();
    let y_max = upper_bound(rows.iter().flat_map(|(_, _, values)| values.iter().flatten().copied()));
    let width = bar_width(rows.len());

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(fail)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(chart.title, (FONT, 28))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(90)
        .build_cartesian_2d(-0.5f64..(scales.len() as f64 - 0.5), 0f64..y_max)
        .map_err(fail)?;

    ctx.configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .x_desc("Threshold/System Size")
        .y_desc(format!("{} ({})", chart.y_desc, matrix.unit()))
        .axis_desc_style((FONT, 20))
        .draw()
        .map_err(fail)?;

    let tick_style = (FONT, 18)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    for (x, scale) in scales.iter().enumerate() {
        let (px, py) = ctx.backend_coord(&(x as f64, 0.0));
        root.draw(&Text::new(scale.to_string(), (px, py + 8), tick_style.clone()))
            .map_err(fail)?;
    }

    for (index, (protocol, phase, values)) in rows.iter().enumerate() {
        let color = series_color(*protocol, *phase);
        let offset = bar_offset(index, rows.len());
        let bars = values.iter().enumerate().filter_map(|(x, value)| {
            let left = x as f64 + offset - width / 2.0;
            value.map(|y| Rectangle::new([(left, 0.0), (left + width, y)], color.filled()))
        });
        ctx.draw_series(bars)
            .map_err(fail)?
            .label(format!("{} {}", protocol.label(), phase.label()))
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled()));

        if chart.annotate {
            let label_style = (FONT, 13)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            let labels = values.iter().enumerate().filter_map(|(x, value)| {
                value.map(|y| Text::new(format_sig_figs(y), (x as f64 + offset, y), label_style.clone()))
            });
            ctx.draw_series(labels).map_err(fail)?;
        }
    }

    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font((FONT, 20))
        .draw()
        .map_err(fail)?;

    root.present().map_err(fail)?;
    info!(path = %path.display(), series = rows.len(), "rendered bar chart");
    Ok(())
}

/// Box plot of every series measured at one scale, medians annotated.
pub fn render_distributions(distributions: &[Distribution], title: &str, path: &Path) -> Result<(), RenderError> {
    let Some(first) = distributions.first() else {
        return Err(RenderError::NoData);
    };
    prepare(path)?;
    let fail = |e| draw_error(path, e);

    let unit = first.series.unit;
    let labels: Vec<String> = distributions.iter().map(|d| d.cell.series_label()).collect();
    let y_max = upper_bound(distributions.iter().flat_map(|d| d.series.values.iter().copied())) as f32;

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(fail)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(title, (FONT, 28))
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(90)
        .build_cartesian_2d((0..distributions.len()).into_segmented(), 0f32..y_max)
        .map_err(fail)?;

    let x_label = |value: &SegmentValue<usize>| match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => labels.get(*i).cloned().unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&x_label)
        .y_desc(format!("Time ({unit})"))
        .axis_desc_style((FONT, 20))
        .draw()
        .map_err(fail)?;

    ctx.draw_series(distributions.iter().enumerate().map(|(i, d)| {
        let quartiles = Quartiles::new(&d.series.values);
        Boxplot::new_vertical(SegmentValue::CenterOf(i), &quartiles)
            .width(40)
            .whisker_width(0.5)
            .style(protocol_color(d.cell.protocol))
    }))
    .map_err(fail)?;

    let medians = distributions.iter().enumerate().filter_map(|(i, d)| {
        let value = median(&d.series.values).value()?;
        let style = (FONT, 13)
            .into_font()
            .color(&protocol_color(d.cell.protocol))
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        Some(Text::new(
            format_sig_figs(value),
            (SegmentValue::CenterOf(i), value as f32),
            style,
        ))
    });
    ctx.draw_series(medians).map_err(fail)?;

    root.present().map_err(fail)?;
    info!(path = %path.display(), series = distributions.len(), "rendered distribution plot");
    Ok(())
}

fn prepare(path: &Path) -> Result<(), RenderError> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent).map_err(|source| RenderError::Io {
            path: path.display().to_string(),
            source,
        }),
        None => Ok(()),
    }
}

fn draw_error<E: Display>(path: &Path, error: E) -> RenderError {
    RenderError::Draw {
        path: path.display().to_string(),
        reason: error.to_string(),
    }
}
