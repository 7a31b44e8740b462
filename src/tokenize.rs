//! Tokenizer: thread title + body into a sparse (document, word) -> count table.

use crate::lexicon::Lexicon;
use crate::models::Thread;
use ahash::{AHashMap, AHashSet};
use regex::Regex;
use std::sync::OnceLock;

/// Minimum number of characters a token keeps after extraction, exclusive.
pub const MIN_TOKEN_LEN_EXCLUSIVE: usize = 2;

/// Sparse token counts. `entries` is sorted by (doc, word); documents without any
/// surviving token have no entries but keep their slot in `doc_ids`.
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    pub doc_ids: Vec<String>,
    /// Sorted, unique.
    pub vocabulary: Vec<String>,
    /// (doc index, word index, in-document count)
    pub entries: Vec<(usize, usize, u32)>,
}

impl TokenTable {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-document (word index, count) lists, indexed like `doc_ids`.
    pub fn rows(&self) -> Vec<Vec<(usize, u32)>> {
        let mut rows = vec![Vec::new(); self.doc_ids.len()];
        for &(d, w, c) in &self.entries {
            rows[d].push((w, c));
        }
        rows
    }

    /// Number of distinct documents every vocabulary word appears in.
    pub fn document_frequencies(&self) -> Vec<usize> {
        let mut df = vec![0usize; self.vocabulary.len()];
        for &(_, w, _) in &self.entries {
            df[w] += 1;
        }
        df
    }
}

fn word_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z']+").expect("static regex"))
}

/// Split into lowercase tokens on anything that is not alphanumeric or an apostrophe.
pub fn split_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase().replace('\u{2019}', "'"))
}

/// Longest run of `[a-z']` in `token`; the first one wins ties.
pub fn longest_word_run(token: &str) -> Option<&str> {
    let mut best: Option<&str> = None;
    for m in word_run_re().find_iter(token) {
        if best.map(|b| m.as_str().len() > b.len()).unwrap_or(true) {
            best = Some(m.as_str());
        }
    }
    best
}

/// Tokens of one document after stop-word removal, run extraction and length filter.
pub fn document_tokens(text: &str, lex: &Lexicon) -> Vec<String> {
    split_words(text)
        .filter(|w| !lex.is_stop_word(w))
        .filter_map(|w| longest_word_run(&w).map(str::to_string))
        .filter(|w| w.chars().count() > MIN_TOKEN_LEN_EXCLUSIVE && !lex.is_stop_word(w))
        .collect()
}

/// Tokenize sampled threads and drop words whose document-frequency ratio is
/// at most `min_doc_ratio`.
pub fn tokenize_threads(docs: &[Thread], lex: &Lexicon, min_doc_ratio: f64) -> TokenTable {
    let doc_ids: Vec<String> = docs.iter().map(|t| t.id.clone()).collect();
    let per_doc: Vec<AHashMap<String, u32>> = docs
        .iter()
        .map(|t| {
            let mut counts: AHashMap<String, u32> = AHashMap::new();
            for w in document_tokens(&format!("{} {}", t.title, t.text), lex) {
                *counts.entry(w).or_insert(0) += 1;
            }
            counts
        })
        .collect();
    build_table(doc_ids, per_doc, min_doc_ratio)
}

/// Assemble a [`TokenTable`] from per-document counts, applying the document-frequency filter.
pub fn build_table(doc_ids: Vec<String>, per_doc: Vec<AHashMap<String, u32>>, min_doc_ratio: f64) -> TokenTable {
    let n_docs = doc_ids.len().max(1) as f64;
    let mut df: AHashMap<&str, usize> = AHashMap::new();
    for counts in &per_doc {
        for w in counts.keys() {
            *df.entry(w.as_str()).or_insert(0) += 1;
        }
    }
    let kept: AHashSet<&str> = df
        .iter()
        .filter(|(_, &n)| n as f64 / n_docs > min_doc_ratio)
        .map(|(w, _)| *w)
        .collect();

    let mut vocabulary: Vec<String> = kept.iter().map(|w| w.to_string()).collect();
    vocabulary.sort_unstable();
    let index: AHashMap<&str, usize> = vocabulary.iter().enumerate().map(|(i, w)| (w.as_str(), i)).collect();

    let mut entries = Vec::new();
    let mut empty_docs = 0usize;
    for (d, counts) in per_doc.iter().enumerate() {
        let mut row: Vec<(usize, usize, u32)> = counts
            .iter()
            .filter_map(|(w, &c)| index.get(w.as_str()).map(|&wi| (d, wi, c)))
            .collect();
        if row.is_empty() {
            empty_docs += 1;
        }
        row.sort_unstable();
        entries.extend(row);
    }

    tracing::info!(
        vocabulary = vocabulary.len(),
        docs = doc_ids.len(),
        entries = entries.len(),
        "token table built"
    );
    if empty_docs > 0 {
        tracing::debug!(empty_docs, "documents without surviving tokens");
    }

    TokenTable { doc_ids, vocabulary, entries }
}
