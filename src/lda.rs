//! Latent Dirichlet allocation fitted by variational EM.
//!
//! E-step: per-document variational Dirichlet (`gamma`) and multinomials (`phi`).
//! M-step: topic-word distributions from expected counts, plus a Newton update of the
//! symmetric Dirichlet `alpha` when `estimate_alpha` is on.

use crate::progress::ProgressScope;
use crate::special::{digamma, log_gamma, log_sum, trigamma};
use crate::tokenize::TokenTable;
use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Stand-in for log(0) in topic-word log probabilities.
const LOG_ZERO: f64 = -100.0;
const NEWTON_THRESH: f64 = 1e-5;
const MAX_ALPHA_ITER: usize = 1000;

#[derive(Clone, Debug)]
pub struct LdaConfig {
    pub num_topics: usize,
    pub seed: u64,
    pub em_max_iter: usize,
    pub em_tol: f64,
    pub var_max_iter: usize,
    pub var_tol: f64,
    /// Starting alpha; `None` means 50 / k.
    pub initial_alpha: Option<f64>,
    pub estimate_alpha: bool,
    pub progress: bool,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self {
            num_topics: 10,
            seed: 1234,
            em_max_iter: 200,
            em_tol: 1e-4,
            var_max_iter: 50,
            var_tol: 1e-6,
            initial_alpha: None,
            estimate_alpha: true,
            progress: true,
        }
    }
}

/// Document-term count matrix over documents with at least one token.
#[derive(Debug, Clone)]
pub struct DocTermMatrix {
    pub doc_ids: Vec<String>,
    pub vocabulary: Vec<String>,
    /// Per document: (word index, count), word indices unique.
    pub rows: Vec<Vec<(usize, u32)>>,
}

impl DocTermMatrix {
    pub fn from_tokens(table: &TokenTable) -> Result<Self> {
        if table.vocabulary.is_empty() || table.is_empty() {
            bail!("no vocabulary survived token filtering; the document-term matrix is empty");
        }
        let (doc_ids, rows): (Vec<String>, Vec<Vec<(usize, u32)>>) = table
            .doc_ids
            .iter()
            .cloned()
            .zip(table.rows())
            .filter(|(_, row)| !row.is_empty())
            .unzip();
        Ok(Self { doc_ids, vocabulary: table.vocabulary.clone(), rows })
    }

    pub fn num_docs(&self) -> usize {
        self.rows.len()
    }
    pub fn num_terms(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Fitted model: `beta` is topics x words, `gamma` is documents x topics, rows sum to 1.
#[derive(Debug, Clone)]
pub struct LdaModel {
    pub doc_ids: Vec<String>,
    pub vocabulary: Vec<String>,
    pub beta: Vec<Vec<f64>>,
    pub gamma: Vec<Vec<f64>>,
    pub alpha: f64,
    pub log_likelihood: f64,
    pub iterations: usize,
    doc_index: HashMap<String, usize>,
}

impl LdaModel {
    pub fn num_topics(&self) -> usize {
        self.beta.len()
    }

    /// Topic membership of a document, if it was part of the fitted matrix.
    pub fn membership(&self, doc_id: &str) -> Option<&[f64]> {
        self.doc_index.get(doc_id).map(|&i| self.gamma[i].as_slice())
    }

    /// Highest-weight words of `topic` (0-based), ties broken by vocabulary order.
    pub fn top_terms(&self, topic: usize, n: usize) -> Vec<(String, f64)> {
        let mut idx: Vec<usize> = (0..self.vocabulary.len()).collect();
        let row = &self.beta[topic];
        idx.sort_by(|&a, &b| row[b].partial_cmp(&row[a]).unwrap_or(std::cmp::Ordering::Equal).then(a.cmp(&b)));
        idx.into_iter().take(n).map(|w| (self.vocabulary[w].clone(), row[w])).collect()
    }
}

struct SuffStats {
    class_word: Vec<Vec<f64>>,
    class_total: Vec<f64>,
    alpha_ss: f64,
}

impl SuffStats {
    fn zeroed(k: usize, v: usize) -> Self {
        Self { class_word: vec![vec![0.0; v]; k], class_total: vec![0.0; k], alpha_ss: 0.0 }
    }
}

/// Variational state reused across documents.
struct DocWorkspace {
    phi: Vec<Vec<f64>>,
    var_gamma: Vec<f64>,
}

pub fn fit(dtm: &DocTermMatrix, cfg: &LdaConfig) -> Result<LdaModel> {
    let k = cfg.num_topics;
    let v = dtm.num_terms();
    let d = dtm.num_docs();
    if k == 0 {
        bail!("number of topics must be positive");
    }
    if d == 0 || v == 0 {
        bail!("cannot fit a topic model on an empty document-term matrix");
    }
    tracing::info!(docs = d, terms = v, topics = k, seed = cfg.seed, "fitting LDA");

    let mut alpha = cfg.initial_alpha.unwrap_or(50.0 / k as f64);
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut log_prob_w = mle(&seeded_init(dtm, k, &mut rng));

    let max_len = dtm.rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut ws = DocWorkspace { phi: vec![vec![0.0; k]; max_len], var_gamma: vec![0.0; k] };
    let mut gammas = vec![vec![0.0; k]; d];

    let pb = if cfg.progress { Some(ProgressScope::count("LDA: EM iterations", cfg.em_max_iter as u64)) } else { None };

    let mut var_max_iter = cfg.var_max_iter;
    let mut likelihood_old = 0.0;
    let mut likelihood = 0.0;
    let mut converged = 1.0f64;
    let mut iter = 0usize;
    while (iter < 2 || converged.abs() > cfg.em_tol) && iter < cfg.em_max_iter {
        iter += 1;
        let mut ss = SuffStats::zeroed(k, v);
        likelihood = 0.0;
        for (di, row) in dtm.rows.iter().enumerate() {
            likelihood += doc_e_step(row, alpha, &log_prob_w, &mut ws, var_max_iter, cfg.var_tol, &mut ss);
            gammas[di].copy_from_slice(&ws.var_gamma);
        }
        log_prob_w = mle(&ss);
        if cfg.estimate_alpha {
            let a = opt_alpha(ss.alpha_ss, d, k);
            if a.is_finite() && a > 0.0 {
                alpha = a;
            }
        }

        converged = if likelihood_old != 0.0 { (likelihood_old - likelihood) / likelihood_old } else { 1.0 };
        if converged < 0.0 {
            // likelihood went down: the E-step did not converge, give it more room
            var_max_iter = var_max_iter.saturating_mul(2);
        }
        likelihood_old = likelihood;
        tracing::debug!(iter, likelihood, converged, alpha, "EM iteration");
        if let Some(pb) = &pb {
            pb.inc_items(1);
        }
    }
    if let Some(pb) = &pb {
        pb.finish(format!("LDA converged after {} iterations", iter));
    }
    tracing::info!(iterations = iter, log_likelihood = likelihood, alpha, "LDA fitted");

    let beta = log_prob_w.iter().map(|row| normalize(row.iter().map(|&lp| lp.exp()).collect())).collect();
    let gamma = gammas.into_iter().map(normalize).collect();
    let doc_index = dtm.doc_ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();
    Ok(LdaModel {
        doc_ids: dtm.doc_ids.clone(),
        vocabulary: dtm.vocabulary.clone(),
        beta,
        gamma,
        alpha,
        log_likelihood: likelihood,
        iterations: iter,
        doc_index,
    })
}

/// Each topic starts from the counts of one randomly chosen document (distinct
/// documents when there are at least `k`), plus one pseudo-count per word.
fn seeded_init(dtm: &DocTermMatrix, k: usize, rng: &mut StdRng) -> SuffStats {
    let v = dtm.num_terms();
    let d = dtm.num_docs();
    let picks: Vec<usize> = if d >= k {
        rand::seq::index::sample(rng, d, k).into_vec()
    } else {
        (0..k).map(|_| rng.random_range(0..d)).collect()
    };
    let mut ss = SuffStats::zeroed(k, v);
    for (topic, &doc) in picks.iter().enumerate() {
        for &(w, c) in &dtm.rows[doc] {
            ss.class_word[topic][w] += c as f64;
        }
        for w in 0..v {
            ss.class_word[topic][w] += 1.0;
        }
        ss.class_total[topic] = ss.class_word[topic].iter().sum();
    }
    ss
}

fn mle(ss: &SuffStats) -> Vec<Vec<f64>> {
    ss.class_word
        .iter()
        .zip(&ss.class_total)
        .map(|(row, &total)| {
            row.iter()
                .map(|&c| if c > 0.0 && total > 0.0 { c.ln() - total.ln() } else { LOG_ZERO })
                .collect()
        })
        .collect()
}

/// Variational inference for one document; accumulates expected counts into `ss`
/// and returns the document's likelihood bound.
fn doc_e_step(
    row: &[(usize, u32)],
    alpha: f64,
    log_prob_w: &[Vec<f64>],
    ws: &mut DocWorkspace,
    var_max_iter: usize,
    var_tol: f64,
    ss: &mut SuffStats,
) -> f64 {
    let k = log_prob_w.len();
    let total: f64 = row.iter().map(|&(_, c)| c as f64).sum();
    let mut digamma_gam = vec![0.0; k];
    let mut old_phi = vec![0.0; k];

    for t in 0..k {
        ws.var_gamma[t] = alpha + total / k as f64;
        digamma_gam[t] = digamma(ws.var_gamma[t]);
    }
    for n in 0..row.len() {
        ws.phi[n].iter_mut().for_each(|p| *p = 1.0 / k as f64);
    }

    let mut likelihood_old = 0.0;
    let mut likelihood = 0.0;
    let mut converged = 1.0f64;
    let mut iter = 0usize;
    while converged > var_tol && (iter < var_max_iter || var_max_iter == 0) {
        iter += 1;
        for (n, &(w, c)) in row.iter().enumerate() {
            let phi = &mut ws.phi[n];
            let mut phisum = 0.0;
            for t in 0..k {
                old_phi[t] = phi[t];
                phi[t] = digamma_gam[t] + log_prob_w[t][w];
                phisum = if t > 0 { log_sum(phisum, phi[t]) } else { phi[t] };
            }
            for t in 0..k {
                phi[t] = (phi[t] - phisum).exp();
                ws.var_gamma[t] += c as f64 * (phi[t] - old_phi[t]);
                digamma_gam[t] = digamma(ws.var_gamma[t]);
            }
        }
        likelihood = doc_likelihood(row, alpha, log_prob_w, ws);
        converged = if likelihood_old != 0.0 { ((likelihood_old - likelihood) / likelihood_old).abs() } else { 1.0 };
        likelihood_old = likelihood;
    }

    let gamma_sum: f64 = ws.var_gamma.iter().sum();
    ss.alpha_ss += ws.var_gamma.iter().map(|&g| digamma(g)).sum::<f64>() - k as f64 * digamma(gamma_sum);
    for (n, &(w, c)) in row.iter().enumerate() {
        for t in 0..k {
            let e = c as f64 * ws.phi[n][t];
            ss.class_word[t][w] += e;
            ss.class_total[t] += e;
        }
    }
    likelihood
}

fn doc_likelihood(row: &[(usize, u32)], alpha: f64, log_prob_w: &[Vec<f64>], ws: &DocWorkspace) -> f64 {
    let k = log_prob_w.len();
    let gamma_sum: f64 = ws.var_gamma.iter().sum();
    let dig_sum = digamma(gamma_sum);
    let mut l = log_gamma(alpha * k as f64) - k as f64 * log_gamma(alpha) - log_gamma(gamma_sum);
    for t in 0..k {
        let g = ws.var_gamma[t];
        let e_log_theta = digamma(g) - dig_sum;
        l += (alpha - 1.0) * e_log_theta + log_gamma(g) - (g - 1.0) * e_log_theta;
        for (n, &(w, c)) in row.iter().enumerate() {
            let p = ws.phi[n][t];
            if p > 0.0 {
                l += c as f64 * p * (e_log_theta - p.ln() + log_prob_w[t][w]);
            }
        }
    }
    l
}

/// Newton's method in log space for the symmetric Dirichlet parameter.
fn opt_alpha(alpha_ss: f64, d: usize, k: usize) -> f64 {
    let (d, kf) = (d as f64, k as f64);
    let mut init_a = 100.0f64;
    let mut log_a = init_a.ln();
    for _ in 0..MAX_ALPHA_ITER {
        let mut a = log_a.exp();
        if a.is_nan() {
            init_a *= 10.0;
            a = init_a;
            log_a = a.ln();
        }
        let df = d * (kf * digamma(kf * a) - kf * digamma(a)) + alpha_ss;
        let d2f = d * (kf * kf * trigamma(kf * a) - kf * trigamma(a));
        log_a -= df / (d2f * a + df);
        if df.abs() <= NEWTON_THRESH {
            break;
        }
    }
    log_a.exp()
}

fn normalize(mut row: Vec<f64>) -> Vec<f64> {
    let s: f64 = row.iter().sum();
    if s > 0.0 && s.is_finite() {
        row.iter_mut().for_each(|x| *x /= s);
    } else {
        let n = row.len().max(1) as f64;
        row.iter_mut().for_each(|x| *x = 1.0 / n);
    }
    row
}
