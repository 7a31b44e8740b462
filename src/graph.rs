//! Affiliation graph: users x threads, projected onto users by shared-thread counts,
//! plus per-user centrality.

use crate::lda::LdaModel;
use crate::models::{Comment, Thread};
use crate::util::normalize_author;
use anyhow::{bail, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};

/// One (user, thread) membership, with the comment's year.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Affiliation {
    pub user: String,
    pub thread: String,
    pub year: i32,
}

/// Users are kept when their yearly affiliation count lies strictly inside the band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivityBand {
    pub min_exclusive: usize,
    pub max_exclusive: usize,
}

impl Default for ActivityBand {
    fn default() -> Self {
        Self { min_exclusive: 6, max_exclusive: 16 }
    }
}

impl ActivityBand {
    #[inline]
    pub fn contains(&self, n: usize) -> bool {
        n > self.min_exclusive && n < self.max_exclusive
    }
}

/// (user, thread) pairs from deduplicated comments on sampled threads.
pub fn affiliations(comments: &[Comment], sampled: &[Thread]) -> Vec<Affiliation> {
    let docs: HashSet<&str> = sampled.iter().map(|t| t.id.as_str()).collect();
    let mut seen = HashSet::new();
    comments
        .iter()
        .filter(|c| docs.contains(c.thread.as_str()))
        .map(|c| Affiliation { user: normalize_author(&c.author), thread: c.thread.clone(), year: c.year })
        .filter(|a| seen.insert((a.user.clone(), a.thread.clone())))
        .collect()
}

/// Year with the most affiliations; the earliest such year on ties.
pub fn busiest_year(aff: &[Affiliation]) -> Option<i32> {
    let mut per_year: BTreeMap<i32, usize> = BTreeMap::new();
    for a in aff {
        *per_year.entry(a.year).or_insert(0) += 1;
    }
    let mut best: Option<(i32, usize)> = None;
    for (&y, &n) in &per_year {
        if best.map(|(_, bn)| n > bn).unwrap_or(true) {
            best = Some((y, n));
        }
    }
    best.map(|(y, _)| y)
}

/// Affiliations in `year` whose user's count in that year falls inside `band`.
pub fn select_active(aff: &[Affiliation], year: i32, band: ActivityBand) -> Vec<Affiliation> {
    let in_year: Vec<&Affiliation> = aff.iter().filter(|a| a.year == year).collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for a in &in_year {
        *counts.entry(a.user.as_str()).or_insert(0) += 1;
    }
    in_year
        .into_iter()
        .filter(|a| counts.get(a.user.as_str()).map(|&n| band.contains(n)).unwrap_or(false))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DominantTopic {
    /// 1-based topic id.
    pub topic: usize,
    /// Mean membership weight of that topic over the user's threads.
    pub weight: f64,
}

/// Per user, the topic with the highest mean membership over their modelled threads.
/// Ties go to the lowest topic id. Users with no modelled thread are absent.
pub fn dominant_topics(aff: &[Affiliation], model: &LdaModel) -> BTreeMap<String, DominantTopic> {
    let k = model.num_topics();
    let mut sums: BTreeMap<&str, (Vec<f64>, usize)> = BTreeMap::new();
    for a in aff {
        if let Some(g) = model.membership(&a.thread) {
            let e = sums.entry(a.user.as_str()).or_insert_with(|| (vec![0.0; k], 0));
            for (t, w) in g.iter().enumerate() {
                e.0[t] += w;
            }
            e.1 += 1;
        }
    }
    sums.into_iter()
        .filter_map(|(user, (s, n))| {
            let mut best: Option<(usize, f64)> = None;
            for (t, total) in s.iter().enumerate() {
                let mean = total / n as f64;
                if best.map(|(_, bw)| mean > bw).unwrap_or(true) {
                    best = Some((t, mean));
                }
            }
            best.map(|(t, w)| (user.to_string(), DominantTopic { topic: t + 1, weight: w }))
        })
        .collect()
}

/// Node of the users x threads graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffiliationNode {
    User(String),
    Thread(String),
}

/// Undirected bipartite graph plus its user x thread incidence lists.
#[derive(Debug, Clone)]
pub struct BipartiteGraph {
    pub graph: UnGraph<AffiliationNode, ()>,
    pub users: Vec<String>,
    pub threads: Vec<String>,
    /// Per user (same order as `users`), sorted thread indices.
    pub incidence: Vec<Vec<usize>>,
}

impl BipartiteGraph {
    pub fn build(aff: &[Affiliation]) -> Self {
        let mut users: Vec<String> = aff.iter().map(|a| a.user.clone()).collect();
        users.sort();
        users.dedup();
        let mut threads: Vec<String> = aff.iter().map(|a| a.thread.clone()).collect();
        threads.sort();
        threads.dedup();

        let mut graph = UnGraph::new_undirected();
        let user_nodes: Vec<NodeIndex> = users.iter().map(|u| graph.add_node(AffiliationNode::User(u.clone()))).collect();
        let thread_nodes: Vec<NodeIndex> =
            threads.iter().map(|t| graph.add_node(AffiliationNode::Thread(t.clone()))).collect();

        let mut incidence = vec![Vec::new(); users.len()];
        for a in aff {
            // both lookups succeed: the lists were built from `aff`
            if let (Ok(u), Ok(t)) = (users.binary_search(&a.user), threads.binary_search(&a.thread)) {
                incidence[u].push(t);
            }
        }
        for (u, row) in incidence.iter_mut().enumerate() {
            row.sort_unstable();
            row.dedup();
            for &t in row.iter() {
                graph.add_edge(user_nodes[u], thread_nodes[t], ());
            }
        }
        Self { graph, users, threads, incidence }
    }

    /// `B * B^T` over the incidence matrix: entry [i][j] counts threads shared by users i and j.
    pub fn co_membership(&self) -> Vec<Vec<u32>> {
        let n = self.users.len();
        let mut m = vec![vec![0u32; n]; n];
        for i in 0..n {
            for j in i..n {
                let shared = sorted_intersection_len(&self.incidence[i], &self.incidence[j]) as u32;
                m[i][j] = shared;
                m[j][i] = shared;
            }
        }
        m
    }

    /// Project onto users: zero the diagonal of `B * B^T`, one weighted edge per non-zero pair.
    pub fn project(&self, dominant: &BTreeMap<String, DominantTopic>) -> ProjectedGraph {
        let mut m = self.co_membership();
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = 0;
        }
        let mut graph: UnGraph<UserNode, u32> = UnGraph::with_capacity(self.users.len(), 0);
        let mut index = HashMap::with_capacity(self.users.len());
        for u in &self.users {
            let node = graph.add_node(UserNode { name: u.clone(), dominant_topic: dominant.get(u).copied() });
            index.insert(u.clone(), node);
        }
        for i in 0..self.users.len() {
            for j in (i + 1)..self.users.len() {
                if m[i][j] > 0 {
                    graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), m[i][j]);
                }
            }
        }
        tracing::info!(users = graph.node_count(), edges = graph.edge_count(), "projected user graph");
        ProjectedGraph { graph, index, matrix: m }
    }
}

fn sorted_intersection_len(a: &[usize], b: &[usize]) -> usize {
    let (mut i, mut j, mut n) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                n += 1;
                i += 1;
                j += 1;
            }
        }
    }
    n
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserNode {
    pub name: String,
    pub dominant_topic: Option<DominantTopic>,
}

/// Weighted user-user graph.
#[derive(Debug, Clone)]
pub struct ProjectedGraph {
    pub graph: UnGraph<UserNode, u32>,
    pub index: HashMap<String, NodeIndex>,
    /// Co-membership matrix with a zero diagonal, indexed like the graph's nodes.
    pub matrix: Vec<Vec<u32>>,
}

impl ProjectedGraph {
    /// Shared-thread count between two users; `None` when they share none.
    pub fn weight(&self, a: &str, b: &str) -> Option<u32> {
        let (ia, ib) = (*self.index.get(a)?, *self.index.get(b)?);
        self.graph.find_edge(ia, ib).map(|e| self.graph[e])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

/// Build the projected graph for the users active in the chosen year.
pub fn build_user_graph(
    comments: &[Comment],
    sampled: &[Thread],
    model: &LdaModel,
    year: Option<i32>,
    band: ActivityBand,
) -> Result<(ProjectedGraph, i32)> {
    let aff = affiliations(comments, sampled);
    let Some(year) = year.or_else(|| busiest_year(&aff)) else {
        bail!("no affiliations on sampled threads; cannot build the user graph");
    };
    let active = select_active(&aff, year, band);
    if active.is_empty() {
        bail!(
            "no user has between {} and {} (exclusive) sampled threads in {}",
            band.min_exclusive,
            band.max_exclusive,
            year
        );
    }
    tracing::info!(year, affiliations = active.len(), "selected active users");
    let dominant = dominant_topics(&active, model);
    let bip = BipartiteGraph::build(&active);
    Ok((bip.project(&dominant), year))
}

// ----------------------------- Centrality ----------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralityRecord {
    pub user: String,
    pub degree: usize,
    pub strength: u64,
    pub betweenness: f64,
    pub closeness: f64,
    pub eigenvector: f64,
    pub dominant_topic: Option<usize>,
}

/// Degree, strength, betweenness, closeness and eigenvector centrality for every user.
/// Shortest paths use distance = 1 / weight.
pub fn centrality(pg: &ProjectedGraph) -> Vec<CentralityRecord> {
    let g = &pg.graph;
    let n = g.node_count();
    let (betweenness, closeness) = path_centralities(pg);
    let eigen = eigenvector_centrality(pg, 1000, 1e-10);
    (0..n)
        .map(|i| {
            let node = NodeIndex::new(i);
            CentralityRecord {
                user: g[node].name.clone(),
                degree: g.neighbors(node).count(),
                strength: g.edges(node).map(|e| *e.weight() as u64).sum(),
                betweenness: betweenness[i],
                closeness: closeness[i],
                eigenvector: eigen[i],
                dominant_topic: g[node].dominant_topic.map(|d| d.topic),
            }
        })
        .collect()
}

#[derive(Copy, Clone, PartialEq)]
struct MinScored(f64, usize);

impl Eq for MinScored {}
impl PartialOrd for MinScored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for MinScored {
    // reversed: BinaryHeap pops the smallest distance first
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.partial_cmp(&self.0).unwrap_or(Ordering::Equal).then_with(|| other.1.cmp(&self.1))
    }
}

const DIST_EPS: f64 = 1e-12;

/// Brandes betweenness (undirected, each pair counted once) and closeness
/// (reachable others / sum of distances; 0 for isolated users), from one Dijkstra per source.
fn path_centralities(pg: &ProjectedGraph) -> (Vec<f64>, Vec<f64>) {
    let g = &pg.graph;
    let n = g.node_count();
    let adj: Vec<Vec<(usize, f64)>> = (0..n)
        .map(|i| {
            g.edges(NodeIndex::new(i))
                .map(|e| {
                    let other = if e.source().index() == i { e.target().index() } else { e.source().index() };
                    (other, 1.0 / *e.weight() as f64)
                })
                .collect()
        })
        .collect();

    let mut betweenness = vec![0.0; n];
    let mut closeness = vec![0.0; n];
    for s in 0..n {
        let mut dist = vec![f64::INFINITY; n];
        let mut sigma = vec![0.0f64; n];
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut order: Vec<usize> = Vec::with_capacity(n);
        let mut done = vec![false; n];
        let mut heap = BinaryHeap::new();

        dist[s] = 0.0;
        sigma[s] = 1.0;
        heap.push(MinScored(0.0, s));
        while let Some(MinScored(d, v)) = heap.pop() {
            if done[v] {
                continue;
            }
            done[v] = true;
            order.push(v);
            for &(w, len) in &adj[v] {
                let alt = d + len;
                if alt < dist[w] - DIST_EPS {
                    dist[w] = alt;
                    sigma[w] = sigma[v];
                    preds[w].clear();
                    preds[w].push(v);
                    heap.push(MinScored(alt, w));
                } else if (alt - dist[w]).abs() <= DIST_EPS && !done[w] {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let reachable = order.len().saturating_sub(1);
        let total: f64 = order.iter().map(|&v| dist[v]).sum();
        closeness[s] = if reachable > 0 && total > 0.0 { reachable as f64 / total } else { 0.0 };

        let mut delta = vec![0.0f64; n];
        for &w in order.iter().rev() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                betweenness[w] += delta[w];
            }
        }
    }
    for b in betweenness.iter_mut() {
        *b /= 2.0;
    }
    (betweenness, closeness)
}

/// Principal eigenvector of the weighted adjacency matrix by power iteration on
/// `A + I`, scaled so the largest entry is 1. All zeros for a graph without edges.
pub fn eigenvector_centrality(pg: &ProjectedGraph, max_iter: usize, tol: f64) -> Vec<f64> {
    let g = &pg.graph;
    let n = g.node_count();
    if g.edge_count() == 0 {
        return vec![0.0; n];
    }
    let mut x = vec![1.0f64; n];
    for _ in 0..max_iter {
        let mut next = x.clone();
        for e in g.edge_references() {
            let (a, b, w) = (e.source().index(), e.target().index(), *e.weight() as f64);
            next[a] += w * x[b];
            next[b] += w * x[a];
        }
        let max = next.iter().cloned().fold(0.0f64, f64::max);
        if max <= 0.0 {
            return vec![0.0; n];
        }
        next.iter_mut().for_each(|v| *v /= max);
        let diff = next.iter().zip(&x).map(|(a, b)| (a - b).abs()).fold(0.0f64, f64::max);
        x = next;
        if diff < tol {
            break;
        }
    }
    x
}
