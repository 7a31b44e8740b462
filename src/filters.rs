//! Debate-thread filtering, author exclusion, (author, thread) dedupe and text cleanup.
//!
//! The steps run in a fixed order; see [`clean_corpus`].

use crate::lexicon::Lexicon;
use crate::loader::restrict_to_known_threads;
use crate::models::{Comment, Corpus, Thread};
use crate::util::normalize_author;
use anyhow::{bail, Result};
use std::collections::{HashMap, HashSet};

/// Row counts after each cleaning step, for logging and the run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CleanStats {
    pub threads_in: usize,
    pub comments_in: usize,
    pub debate_threads: usize,
    pub comments_on_debates: usize,
    pub comments_after_author_filter: usize,
    pub threads_with_comments: usize,
    pub unique_pairs: usize,
}

/// Run the full cleaner:
/// (a) drop non-debate threads, (b) restrict comments to surviving threads,
/// (c) drop unwanted comment authors, (d) keep threads with at least one comment,
/// (e) dedupe comments to unique (author, thread), then clean title and body text
/// and fill in `unique_commenters`.
pub fn clean_corpus(corpus: Corpus, lex: &Lexicon) -> Result<(Corpus, CleanStats)> {
    let mut stats = CleanStats { threads_in: corpus.threads.len(), comments_in: corpus.comments.len(), ..Default::default() };

    let corpus = keep_debate_threads(corpus, lex);
    stats.debate_threads = corpus.threads.len();

    let corpus = restrict_to_known_threads(corpus);
    stats.comments_on_debates = corpus.comments.len();

    let corpus = drop_unwanted_authors(corpus, lex);
    stats.comments_after_author_filter = corpus.comments.len();

    let corpus = keep_commented_threads(corpus);
    stats.threads_with_comments = corpus.threads.len();

    let Corpus { mut threads, comments } = corpus;
    let comments = dedupe_author_thread(comments);
    stats.unique_pairs = comments.len();

    for t in threads.iter_mut() {
        t.title = clean_text(&t.title, lex);
        t.text = clean_text(&t.text, lex);
    }
    fill_unique_commenters(&mut threads, &comments);

    if threads.is_empty() {
        bail!("no debate threads with surviving comments remain after cleaning");
    }
    tracing::info!(
        threads = stats.threads_with_comments,
        pairs = stats.unique_pairs,
        "cleaned corpus"
    );
    Ok((Corpus { threads, comments }, stats))
}

pub fn keep_debate_threads(corpus: Corpus, lex: &Lexicon) -> Corpus {
    let Corpus { threads, comments } = corpus;
    let threads = threads.into_iter().filter(|t| lex.is_debate_title(&t.title)).collect();
    Corpus { threads, comments }
}

/// Drops comments by the owning thread's author, bots and deleted accounts.
pub fn drop_unwanted_authors(corpus: Corpus, lex: &Lexicon) -> Corpus {
    let Corpus { threads, comments } = corpus;
    let op_of: HashMap<&str, String> = threads.iter().map(|t| (t.id.as_str(), normalize_author(&t.author))).collect();
    let comments = comments
        .into_iter()
        .filter(|c| {
            if lex.is_excluded_author(&c.author) {
                return false;
            }
            match op_of.get(c.thread.as_str()) {
                Some(op) if !op.is_empty() => *op != normalize_author(&c.author),
                _ => true,
            }
        })
        .collect();
    Corpus { threads, comments }
}

pub fn keep_commented_threads(corpus: Corpus) -> Corpus {
    let Corpus { threads, comments } = corpus;
    let commented: HashSet<&str> = comments.iter().map(|c| c.thread.as_str()).collect();
    let threads = threads.into_iter().filter(|t| commented.contains(t.id.as_str())).collect();
    Corpus { threads, comments }
}

/// One comment per (author, thread): the earliest by timestamp, then by input order.
pub fn dedupe_author_thread(mut comments: Vec<Comment>) -> Vec<Comment> {
    // stable sort keeps input order among equal timestamps
    comments.sort_by_key(|c| c.timestamp);
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(comments.len());
    comments.retain(|c| seen.insert((normalize_author(&c.author), c.thread.clone())));
    comments
}

/// Apply the lexicon's cleanup rules in order, then strip the literal marker until none is left.
pub fn clean_text(text: &str, lex: &Lexicon) -> String {
    let mut s = text.to_string();
    for rule in &lex.cleanup {
        s = rule.pattern.replace_all(&s, rule.replacement.as_str()).into_owned();
    }
    s = collapse_whitespace(&s);
    if lex.debate_marker.trim().is_empty() {
        return s;
    }
    // stripping one marker can splice its neighbours into another
    while lex.marker_pattern.is_match(&s) {
        s = collapse_whitespace(&lex.marker_pattern.replace_all(&s, ""));
    }
    s
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn fill_unique_commenters(threads: &mut [Thread], comments: &[Comment]) {
    let mut per_thread: HashMap<&str, HashSet<String>> = HashMap::new();
    for c in comments {
        per_thread.entry(c.thread.as_str()).or_default().insert(normalize_author(&c.author));
    }
    for t in threads.iter_mut() {
        t.unique_commenters = per_thread.get(t.id.as_str()).map(|s| s.len()).unwrap_or(0);
    }
}
