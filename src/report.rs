//! Tabular reports: top terms and documents per topic, vocabulary, centrality,
//! plus the JSON run summary.

use crate::filters::CleanStats;
use crate::lda::LdaModel;
use crate::models::Thread;
use crate::tokenize::TokenTable;
use crate::util::{create_with_backoff, replace_file_atomic_backoff};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicTerm {
    /// 1-based topic id.
    pub topic: usize,
    pub rank: usize,
    pub term: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicDocument {
    pub topic: usize,
    pub rank: usize,
    pub thread: String,
    pub title: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VocabularyEntry {
    pub term: String,
    pub doc_frequency: usize,
    pub total_count: u64,
}

/// The `n` highest-weight terms of every topic, topic-major.
pub fn top_terms(model: &LdaModel, n: usize) -> Vec<TopicTerm> {
    (0..model.num_topics())
        .flat_map(|t| {
            model.top_terms(t, n).into_iter().enumerate().map(move |(r, (term, weight))| TopicTerm {
                topic: t + 1,
                rank: r + 1,
                term,
                weight,
            })
        })
        .collect()
}

/// The `n` documents with the highest membership in every topic, joined to thread titles.
/// Ties are broken by the model's document order.
pub fn top_documents(model: &LdaModel, threads: &[Thread], n: usize) -> Vec<TopicDocument> {
    let titles: HashMap<&str, &str> = threads.iter().map(|t| (t.id.as_str(), t.title.as_str())).collect();
    let mut out = Vec::new();
    for t in 0..model.num_topics() {
        let mut idx: Vec<usize> = (0..model.doc_ids.len()).collect();
        idx.sort_by(|&a, &b| {
            model.gamma[b][t].partial_cmp(&model.gamma[a][t]).unwrap_or(std::cmp::Ordering::Equal).then(a.cmp(&b))
        });
        for (r, d) in idx.into_iter().take(n).enumerate() {
            let id = &model.doc_ids[d];
            out.push(TopicDocument {
                topic: t + 1,
                rank: r + 1,
                thread: id.clone(),
                title: titles.get(id.as_str()).map(|s| s.to_string()).unwrap_or_default(),
                weight: model.gamma[d][t],
            });
        }
    }
    out
}

/// Vocabulary with document frequency and corpus-wide count, alphabetical.
pub fn vocabulary(table: &TokenTable) -> Vec<VocabularyEntry> {
    let df = table.document_frequencies();
    let mut totals = vec![0u64; table.vocabulary.len()];
    for &(_, w, c) in &table.entries {
        totals[w] += c as u64;
    }
    table
        .vocabulary
        .iter()
        .zip(df)
        .zip(totals)
        .map(|((term, doc_frequency), total_count)| VocabularyEntry { term: term.clone(), doc_frequency, total_count })
        .collect()
}

fn tmp_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|s| s.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    dest.with_file_name(name)
}

/// Serialize `rows` as CSV with a header row; written to a temp file, then moved into place.
pub fn write_csv<T: Serialize>(dest: &Path, rows: &[T]) -> Result<()> {
    let tmp = tmp_path(dest);
    {
        let f = create_with_backoff(&tmp, 20, 50).with_context(|| format!("create {}", tmp.display()))?;
        let mut w = csv::Writer::from_writer(BufWriter::new(f));
        for row in rows {
            w.serialize(row).with_context(|| format!("write {}", tmp.display()))?;
        }
        w.flush().with_context(|| format!("flush {}", tmp.display()))?;
    }
    replace_file_atomic_backoff(&tmp, dest)?;
    tracing::info!(path = %dest.display(), rows = rows.len(), "wrote report");
    Ok(())
}

/// Everything a run produced, in one JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub cleaning: CleanStats,
    pub sampled_threads: usize,
    pub vocabulary_size: usize,
    pub modelled_documents: usize,
    pub num_topics: usize,
    pub alpha: f64,
    pub log_likelihood: f64,
    pub em_iterations: usize,
    pub activity_year: i32,
    pub graph_users: usize,
    pub graph_edges: usize,
    pub artifacts: Vec<String>,
}

pub fn write_summary(dest: &Path, summary: &RunSummary) -> Result<()> {
    let tmp = tmp_path(dest);
    {
        let f = create_with_backoff(&tmp, 20, 50).with_context(|| format!("create {}", tmp.display()))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, summary).context("serialize run summary")?;
        w.write_all(b"\n")?;
        w.flush()?;
    }
    replace_file_atomic_backoff(&tmp, dest)
}
