//! PNG charts: distributions, monthly activity, topic terms, topic preference
//! densities and the user network.

use crate::date::{iter_year_months, YearMonth};
use crate::graph::{CentralityRecord, ProjectedGraph};
use crate::lda::LdaModel;
use crate::models::Thread;
use anyhow::Result;
use petgraph::visit::EdgeRef;
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

pub const NETWORK_SIZE: (u32, u32) = (1600, 1200);

const FONT: &str = "sans-serif";

/// Equal-width histogram over `[min, max]`: (min, bin width, counts).
/// A constant sample gets one bin of width 1.
pub fn histogram(values: &[f64], bins: usize) -> (f64, f64, Vec<usize>) {
    if values.is_empty() || bins == 0 {
        return (0.0, 1.0, Vec::new());
    }
    let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if hi <= lo {
        return (lo, 1.0, vec![values.len()]);
    }
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let b = (((v - lo) / width) as usize).min(bins - 1);
        counts[b] += 1;
    }
    (lo, width, counts)
}

/// Gaussian kernel density of `values` evaluated at `grid`, Silverman bandwidth.
pub fn density(values: &[f64], grid: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return vec![0.0; grid.len()];
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n.max(2) - 1) as f64;
    let mut bw = 1.06 * var.sqrt() * (n as f64).powf(-0.2);
    if bw.is_nan() || bw <= 1e-6 {
        bw = 0.05;
    }
    let norm = 1.0 / (n as f64 * bw * (2.0 * std::f64::consts::PI).sqrt());
    grid.iter()
        .map(|&x| values.iter().map(|&v| (-0.5 * ((x - v) / bw).powi(2)).exp()).sum::<f64>() * norm)
        .collect()
}

fn topic_color(topic: Option<usize>) -> RGBAColor {
    match topic {
        Some(t) => Palette99::pick(t.saturating_sub(1)).to_rgba(),
        None => RGBAColor(160, 160, 160, 1.0),
    }
}

fn histogram_chart(path: &Path, caption: &str, x_desc: &str, values: &[f64], bins: usize) -> Result<()> {
    let (lo, width, counts) = histogram(values, bins);
    let top = counts.iter().copied().max().unwrap_or(0).max(1) as f64;
    let hi = lo + width * counts.len().max(1) as f64;

    let root = BitMapBackend::new(path, (1000, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, (FONT, 28))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(lo..hi, 0f64..top * 1.05)?;
    chart.configure_mesh().x_desc(x_desc).y_desc("Threads").draw()?;
    chart.draw_series(counts.iter().enumerate().map(|(i, &c)| {
        let x0 = lo + i as f64 * width;
        Rectangle::new([(x0, 0.0), (x0 + width, c as f64)], BLUE.mix(0.7).filled())
    }))?;
    root.present()?;
    tracing::info!(path = %path.display(), "wrote plot");
    Ok(())
}

pub fn upvote_distribution(path: &Path, threads: &[Thread]) -> Result<()> {
    let ups: Vec<f64> = threads.iter().map(|t| t.ups as f64).collect();
    histogram_chart(path, "Thread upvotes", "Upvotes", &ups, 40)
}

pub fn commenter_distribution(path: &Path, threads: &[Thread]) -> Result<()> {
    let n: Vec<f64> = threads.iter().map(|t| t.unique_commenters as f64).collect();
    histogram_chart(path, "Unique commenters per thread", "Unique commenters", &n, 40)
}

/// Threads per calendar month, months without threads drawn as zero.
pub fn monthly_activity(path: &Path, threads: &[Thread]) -> Result<()> {
    let mut per_month: BTreeMap<YearMonth, usize> = BTreeMap::new();
    for t in threads {
        *per_month.entry(t.date().year_month()).or_insert(0) += 1;
    }
    let (Some(&first), Some(&last)) = (per_month.keys().next(), per_month.keys().next_back()) else {
        return Ok(());
    };
    let series: Vec<(i32, usize)> = iter_year_months(first, last)
        .enumerate()
        .map(|(i, ym)| (i as i32, per_month.get(&ym).copied().unwrap_or(0)))
        .collect();
    let months: Vec<YearMonth> = iter_year_months(first, last).collect();
    let top = series.iter().map(|&(_, c)| c).max().unwrap_or(0).max(1) as f64;

    let root = BitMapBackend::new(path, (1000, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Debate threads per month", (FONT, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0i32..(series.len() as i32).max(1), 0f64..top * 1.05)?;
    chart
        .configure_mesh()
        .x_labels(12)
        .x_label_formatter(&|i| months.get(*i as usize).map(|m| m.to_string()).unwrap_or_default())
        .y_desc("Threads")
        .draw()?;
    chart.draw_series(LineSeries::new(series.iter().map(|&(i, c)| (i, c as f64)), &RED))?;
    root.present()?;
    tracing::info!(path = %path.display(), "wrote plot");
    Ok(())
}

/// One panel per topic with horizontal bars of its top terms.
pub fn topic_terms(path: &Path, model: &LdaModel, n: usize) -> Result<()> {
    let k = model.num_topics();
    let cols = 2usize;
    let rows = k.div_ceil(cols).max(1);
    let root = BitMapBackend::new(path, (1400, 320 * rows as u32)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((rows, cols));
    for (t, panel) in panels.iter().enumerate().take(k) {
        let terms = model.top_terms(t, n);
        let max_w = terms.iter().map(|(_, w)| *w).fold(0.0f64, f64::max).max(1e-9);
        let len = terms.len().max(1) as f64;
        let mut chart = ChartBuilder::on(panel)
            .caption(format!("Topic {}", t + 1), (FONT, 20))
            .margin(10)
            .x_label_area_size(25)
            .y_label_area_size(10)
            .build_cartesian_2d(0f64..max_w * 1.1, 0f64..len)?;
        chart.configure_mesh().disable_y_mesh().y_labels(0).x_labels(4).draw()?;
        let color = topic_color(Some(t + 1));
        chart.draw_series(terms.iter().enumerate().map(|(r, (_, w))| {
            let y = len - 1.0 - r as f64;
            Rectangle::new([(0.0, y + 0.1), (*w, y + 0.9)], color.mix(0.6).filled())
        }))?;
        chart.draw_series(terms.iter().enumerate().map(|(r, (term, _))| {
            let y = len - 1.0 - r as f64;
            Text::new(term.clone(), (0.0, y + 0.75), (FONT, 13))
        }))?;
    }
    root.present()?;
    tracing::info!(path = %path.display(), topics = k, "wrote plot");
    Ok(())
}

/// Density of document membership for every topic, one curve per topic.
pub fn topic_preference_density(path: &Path, model: &LdaModel) -> Result<()> {
    let grid: Vec<f64> = (0..=200).map(|i| i as f64 / 200.0).collect();
    let curves: Vec<Vec<f64>> = (0..model.num_topics())
        .map(|t| density(&model.gamma.iter().map(|g| g[t]).collect::<Vec<_>>(), &grid))
        .collect();
    let top = curves.iter().flatten().cloned().fold(0.0f64, f64::max).max(1e-9);

    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Topic preference density", (FONT, 28))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..1f64, 0f64..top * 1.05)?;
    chart.configure_mesh().x_desc("Document membership").y_desc("Density").draw()?;
    for (t, curve) in curves.iter().enumerate() {
        let color = topic_color(Some(t + 1));
        chart
            .draw_series(LineSeries::new(grid.iter().cloned().zip(curve.iter().cloned()), color.stroke_width(2)))?
            .label(format!("Topic {}", t + 1))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;
    root.present()?;
    tracing::info!(path = %path.display(), "wrote plot");
    Ok(())
}

/// The user graph at `positions` (unit square), nodes colored by dominant topic and
/// sized by eigenvector centrality.
pub fn user_network(
    path: &Path,
    pg: &ProjectedGraph,
    positions: &[(f64, f64)],
    centrality: &[CentralityRecord],
) -> Result<()> {
    let g = &pg.graph;
    let max_w = g.edge_references().map(|e| *e.weight()).max().unwrap_or(1).max(1) as f64;

    let root = BitMapBackend::new(path, NETWORK_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Commenter network by dominant topic", (FONT, 30))
        .margin(30)
        .build_cartesian_2d(0f64..1f64, 0f64..1f64)?;

    chart.draw_series(g.edge_references().map(|e| {
        let (a, b) = (positions[e.source().index()], positions[e.target().index()]);
        let w = *e.weight() as f64 / max_w;
        PathElement::new(vec![a, b], BLACK.mix(0.08 + 0.4 * w).stroke_width(1 + (3.0 * w) as u32))
    }))?;
    chart.draw_series(centrality.iter().zip(positions).map(|(rec, &p)| {
        let size = 4 + (18.0 * rec.eigenvector) as u32;
        Circle::new(p, size, topic_color(rec.dominant_topic).filled())
    }))?;
    chart.draw_series(
        centrality
            .iter()
            .zip(positions)
            .filter(|(rec, _)| rec.eigenvector >= 0.5)
            .map(|(rec, &(x, y))| Text::new(rec.user.clone(), (x + 0.008, y + 0.008), (FONT, 14))),
    )?;

    let mut topics: Vec<usize> = centrality.iter().filter_map(|r| r.dominant_topic).collect();
    topics.sort_unstable();
    topics.dedup();
    for t in topics {
        let color = topic_color(Some(t));
        chart
            .draw_series(std::iter::empty::<Circle<(f64, f64), u32>>())?
            .label(format!("Topic {}", t))
            .legend(move |(x, y)| Circle::new((x + 10, y), 6, color.filled()));
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;
    root.present()?;
    tracing::info!(path = %path.display(), users = g.node_count(), "wrote plot");
    Ok(())
}
