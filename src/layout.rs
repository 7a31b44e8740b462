//! Force-directed (Fruchterman-Reingold) layout for the user graph.

use crate::graph::ProjectedGraph;
use crate::progress::ProgressScope;
use petgraph::visit::EdgeRef;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Clone, Copy, Debug)]
pub struct LayoutConfig {
    pub seed: u64,
    pub iterations: usize,
    pub progress: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { seed: 42, iterations: 500, progress: false }
    }
}

/// Node positions in the unit square, indexed like the graph's nodes.
/// Identical inputs and seed give identical positions.
pub fn fruchterman_reingold(pg: &ProjectedGraph, cfg: &LayoutConfig) -> Vec<(f64, f64)> {
    let g = &pg.graph;
    let n = g.node_count();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![(0.5, 0.5)];
    }

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut pos: Vec<(f64, f64)> = (0..n).map(|_| (rng.random_range(0.0..1.0), rng.random_range(0.0..1.0))).collect();
    let k = (1.0 / n as f64).sqrt();
    let max_w = g.edge_references().map(|e| *e.weight()).max().unwrap_or(1).max(1) as f64;
    let mut temp = 0.1f64;
    let cooling = temp / (cfg.iterations.max(1) as f64 + 1.0);

    let pb = if cfg.progress { Some(ProgressScope::count("layout", cfg.iterations as u64)) } else { None };
    for _ in 0..cfg.iterations {
        let mut disp = vec![(0.0f64, 0.0f64); n];
        for i in 0..n {
            for j in (i + 1)..n {
                let (dx, dy) = (pos[i].0 - pos[j].0, pos[i].1 - pos[j].1);
                let d = (dx * dx + dy * dy).sqrt().max(1e-9);
                let f = k * k / d;
                disp[i].0 += dx / d * f;
                disp[i].1 += dy / d * f;
                disp[j].0 -= dx / d * f;
                disp[j].1 -= dy / d * f;
            }
        }
        for e in g.edge_references() {
            let (a, b) = (e.source().index(), e.target().index());
            let (dx, dy) = (pos[a].0 - pos[b].0, pos[a].1 - pos[b].1);
            let d = (dx * dx + dy * dy).sqrt().max(1e-9);
            let f = d * d / k * (*e.weight() as f64 / max_w);
            disp[a].0 -= dx / d * f;
            disp[a].1 -= dy / d * f;
            disp[b].0 += dx / d * f;
            disp[b].1 += dy / d * f;
        }
        for (p, (dx, dy)) in pos.iter_mut().zip(disp) {
            let len = (dx * dx + dy * dy).sqrt().max(1e-9);
            let step = len.min(temp);
            p.0 = (p.0 + dx / len * step).clamp(0.0, 1.0);
            p.1 = (p.1 + dy / len * step).clamp(0.0, 1.0);
        }
        temp = (temp - cooling).max(1e-4);
        if let Some(pb) = &pb {
            pb.inc_items(1);
        }
    }
    if let Some(pb) = &pb {
        pb.finish("layout done");
    }
    rescale(pos)
}

/// Stretch positions to fill [0.05, 0.95] on both axes.
fn rescale(pos: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    let (mut x0, mut x1, mut y0, mut y1) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for &(x, y) in &pos {
        x0 = x0.min(x);
        x1 = x1.max(x);
        y0 = y0.min(y);
        y1 = y1.max(y);
    }
    let sx = if x1 > x0 { x1 - x0 } else { 1.0 };
    let sy = if y1 > y0 { y1 - y0 } else { 1.0 };
    pos.into_iter().map(|(x, y)| (0.05 + 0.9 * (x - x0) / sx, 0.05 + 0.9 * (y - y0) / sy)).collect()
}
