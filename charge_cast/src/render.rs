//! SVG rendering of chart specifications with plotters

use crate::error::Result;
use crate::visualization::{histogram_bins, AxisValues, Chart, ChartKind, Trace};
use chrono::{Duration, NaiveDateTime};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

/// Default canvas size in pixels
pub const DEFAULT_SIZE: (u32, u32) = (1000, 600);

/// Bins used when a histogram chart does not name a count
const DEFAULT_BINS: usize = 50;

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

const PALETTE: [RGBColor; 4] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(148, 103, 189),
];

fn trace_color(trace: &Trace, index: usize) -> RGBColor {
    match trace.color.as_deref() {
        Some("blue") => BLUE,
        Some("red") => RED,
        Some("green") => GREEN,
        _ => PALETTE[index % PALETTE.len()],
    }
}

/// Draw `chart` to an SVG file
pub fn render_svg<P: AsRef<Path>>(chart: &Chart, path: P, size: (u32, u32)) -> Result<()> {
    let root = SVGBackend::new(path.as_ref(), size).into_drawing_area();
    root.fill(&WHITE)?;

    match chart.kind {
        ChartKind::Line => draw_lines(&root, chart)?,
        ChartKind::Bar => draw_bars(&root, chart, false)?,
        ChartKind::HorizontalBar => draw_bars(&root, chart, true)?,
        ChartKind::Histogram => draw_histogram(&root, chart)?,
        ChartKind::Heatmap => draw_heatmap(&root, chart)?,
    }

    root.present()?;
    Ok(())
}

/// Axis range with a 5% margin; a flat range is widened by one unit
fn padded(min: f64, max: f64) -> Range<f64> {
    let span = max - min;
    if span <= f64::EPSILON {
        return (min - 1.0)..(max + 1.0);
    }
    (min - span * 0.05)..(max + span * 0.05)
}

fn bounds(points: impl Iterator<Item = (f64, f64)>) -> Option<(Range<f64>, Range<f64>)> {
    let mut any = false;
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for (x, y) in points.filter(|(x, y)| x.is_finite() && y.is_finite()) {
        any = true;
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    any.then(|| (padded(x_min, x_max), padded(y_min, y_max)))
}

/// Earliest timestamp over every time-valued trace
fn time_origin(chart: &Chart) -> Option<NaiveDateTime> {
    chart
        .traces
        .iter()
        .filter_map(|trace| match &trace.x {
            AxisValues::Time(ts) => ts.iter().min().copied(),
            _ => None,
        })
        .min()
}

/// Numeric x positions; time is hours since `origin`, categories are indices
fn x_positions(x: &AxisValues, origin: Option<NaiveDateTime>) -> Vec<f64> {
    match x {
        AxisValues::Time(ts) => {
            let origin = origin.map_or(0, |o| o.and_utc().timestamp());
            ts.iter()
                .map(|t| (t.and_utc().timestamp() - origin) as f64 / 3600.0)
                .collect()
        }
        AxisValues::Category(labels) => (0..labels.len()).map(|i| i as f64).collect(),
        AxisValues::Number(values) => values.clone(),
    }
}

fn category_label(labels: &[String], position: f64) -> String {
    if position < -0.5 {
        return String::new();
    }
    labels
        .get(position.round() as usize)
        .cloned()
        .unwrap_or_default()
}

fn draw_lines(root: &Area<'_>, chart: &Chart) -> Result<()> {
    let origin = time_origin(chart);
    let series: Vec<(Vec<(f64, f64)>, &Trace)> = chart
        .traces
        .iter()
        .map(|trace| {
            let xs = x_positions(&trace.x, origin);
            (xs.into_iter().zip(trace.y.iter().copied()).collect(), trace)
        })
        .collect();

    let Some((x_range, y_range)) = bounds(series.iter().flat_map(|(p, _)| p.iter().copied()))
    else {
        return Ok(());
    };

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 24).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    let time_label = |v: &f64| match origin {
        Some(o) => (o + Duration::minutes((v * 60.0) as i64))
            .format("%m-%d %H:%M")
            .to_string(),
        None => format!("{:.1}", v),
    };
    ctx.configure_mesh()
        .x_desc(&chart.x_title)
        .y_desc(&chart.y_title)
        .x_label_formatter(&time_label)
        .draw()?;

    for (index, (points, trace)) in series.into_iter().enumerate() {
        let color = trace_color(trace, index);
        let anno = if trace.dashed {
            ctx.draw_series(
                points
                    .windows(2)
                    .step_by(2)
                    .map(|w| PathElement::new(vec![w[0], w[1]], color.stroke_width(2))),
            )?
        } else {
            ctx.draw_series(LineSeries::new(points, color.stroke_width(2)))?
        };
        anno.label(trace.name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    ctx.configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_bars(root: &Area<'_>, chart: &Chart, horizontal: bool) -> Result<()> {
    let Some(trace) = chart.traces.first() else {
        return Ok(());
    };
    if trace.y.is_empty() {
        return Ok(());
    }

    let positions = x_positions(&trace.x, None);
    let mut labels: Vec<String> = match &trace.x {
        AxisValues::Category(labels) => labels.clone(),
        _ => positions.iter().map(|v| format!("{}", v)).collect(),
    };
    if horizontal {
        labels.reverse();
    }

    let low = trace.y.iter().copied().fold(0.0, f64::min);
    let high = trace.y.iter().copied().fold(0.0, f64::max);
    let value_range = if high > low { low..high * 1.1 } else { low..(low + 1.0) };
    let slot_range = -0.5..(positions.len() as f64 - 0.5);
    let color = trace_color(trace, 0);
    let slot_label = |v: &f64| category_label(&labels, *v);

    let builder = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 24).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(if horizontal { 140 } else { 60 })
        .build_cartesian_2d(
            if horizontal { value_range.clone() } else { slot_range.clone() },
            if horizontal { slot_range } else { value_range },
        );
    let mut ctx = builder?;

    let mut mesh = ctx.configure_mesh();
    mesh.x_desc(&chart.x_title).y_desc(&chart.y_title);
    if horizontal {
        mesh.y_labels(labels.len()).y_label_formatter(&slot_label);
    } else {
        mesh.x_labels(labels.len()).x_label_formatter(&slot_label);
    }
    mesh.draw()?;

    // rank 0 at the top for horizontal bars
    let count = trace.y.len() as f64;
    ctx.draw_series(trace.y.iter().enumerate().map(|(i, &v)| {
        let slot = if horizontal { count - 1.0 - i as f64 } else { i as f64 };
        let corners = if horizontal {
            [(0.0, slot - 0.4), (v, slot + 0.4)]
        } else {
            [(slot - 0.4, 0.0), (slot + 0.4, v)]
        };
        Rectangle::new(corners, color.filled())
    }))?;
    Ok(())
}

fn draw_histogram(root: &Area<'_>, chart: &Chart) -> Result<()> {
    let samples = match chart.traces.first().map(|t| &t.x) {
        Some(AxisValues::Number(values)) => values,
        _ => return Ok(()),
    };
    let bins = histogram_bins(samples, chart.bins.unwrap_or(DEFAULT_BINS));
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Ok(());
    };
    let tallest = bins.iter().map(|b| b.2).max().unwrap_or(1) as f64;

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 24).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(first.0..last.1, 0.0..tallest * 1.1)?;
    ctx.configure_mesh()
        .x_desc(&chart.x_title)
        .y_desc(&chart.y_title)
        .draw()?;

    let color = PALETTE[0];
    ctx.draw_series(bins.iter().map(|&(lower, upper, count)| {
        Rectangle::new([(lower, 0.0), (upper, count as f64)], color.filled())
    }))?;
    Ok(())
}

fn draw_heatmap(root: &Area<'_>, chart: &Chart) -> Result<()> {
    let Some(grid) = &chart.heatmap else {
        return Ok(());
    };
    let values: Vec<f64> = grid.z.iter().flatten().flatten().copied().collect();
    if values.is_empty() {
        return Ok(());
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };

    let rows = grid.y_labels.len();
    let cols = grid.x_labels.len();
    let x_labels: Vec<String> = grid.x_labels.iter().map(|h| h.to_string()).collect();
    let x_label = |v: &f64| category_label(&x_labels, *v - 0.5);
    let y_label = |v: &f64| category_label(&grid.y_labels, *v - 0.5);

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 24).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..cols as f64, 0.0..rows as f64)?;
    ctx.configure_mesh()
        .disable_mesh()
        .x_desc(&chart.x_title)
        .y_desc(&chart.y_title)
        .x_labels(cols)
        .y_labels(rows)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .draw()?;

    ctx.draw_series(grid.z.iter().enumerate().flat_map(|(row, cells)| {
        cells.iter().enumerate().filter_map(move |(col, cell)| {
            cell.map(|v| {
                let t = (v - min) / span;
                let shade = RGBColor(
                    (247.0 - t * 239.0) as u8,
                    (251.0 - t * 203.0) as u8,
                    (255.0 - t * 148.0) as u8,
                );
                Rectangle::new(
                    [(col as f64, row as f64), (col as f64 + 1.0, row as f64 + 1.0)],
                    shade.filled(),
                )
            })
        })
    }))?;
    Ok(())
}
