//! Load the threads and comments tables, validate their columns, coerce types and
//! restrict comments to threads that exist.

use crate::date::{parse_timestamp, PostDate};
use crate::models::{Comment, Corpus, RawComment, RawThread, Thread};
use crate::source::open_table;
use anyhow::{anyhow, bail, Context, Result};
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

pub const THREAD_COLUMNS: &[&str] = &["id", "title", "text", "timestamp", "ups", "downs", "author"];
pub const COMMENT_COLUMNS: &[&str] = &["id", "thread", "author", "timestamp"];

pub fn load_corpus(threads_path: &Path, comments_path: &Path, read_buf_bytes: usize) -> Result<Corpus> {
    let threads = load_threads(threads_path, read_buf_bytes)?;
    let comments = load_comments(comments_path, read_buf_bytes)?;
    tracing::info!(threads = threads.len(), comments = comments.len(), "loaded input tables");
    Ok(restrict_to_known_threads(Corpus { threads, comments }))
}

pub fn load_threads(path: &Path, read_buf_bytes: usize) -> Result<Vec<Thread>> {
    let rdr = open_table(path, read_buf_bytes)?;
    read_threads(rdr).with_context(|| format!("loading threads from {}", path.display()))
}

pub fn load_comments(path: &Path, read_buf_bytes: usize) -> Result<Vec<Comment>> {
    let rdr = open_table(path, read_buf_bytes)?;
    read_comments(rdr).with_context(|| format!("loading comments from {}", path.display()))
}

pub fn read_threads<R: Read>(rdr: R) -> Result<Vec<Thread>> {
    let raw: Vec<RawThread> = read_rows(rdr, THREAD_COLUMNS)?;
    let mut seen = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());
    for (i, r) in raw.into_iter().enumerate() {
        let row = i + 2; // header is line 1
        if !seen.insert(r.id.clone()) {
            tracing::warn!(id = %r.id, row, "duplicate thread id; keeping the first row");
            continue;
        }
        let timestamp = parse_timestamp(&r.timestamp).with_context(|| format!("row {}: timestamp", row))?;
        let date = PostDate::from_epoch(timestamp).with_context(|| format!("row {}: timestamp", row))?;
        out.push(Thread {
            ups: parse_count(&r.ups).with_context(|| format!("row {}: ups", row))?,
            downs: parse_count(&r.downs).with_context(|| format!("row {}: downs", row))?,
            id: r.id,
            title: r.title,
            text: r.text,
            timestamp,
            year: date.year,
            month: date.month,
            week: date.week,
            author: r.author,
            unique_commenters: 0,
        });
    }
    Ok(out)
}

pub fn read_comments<R: Read>(rdr: R) -> Result<Vec<Comment>> {
    let raw: Vec<RawComment> = read_rows(rdr, COMMENT_COLUMNS)?;
    raw.into_iter()
        .enumerate()
        .map(|(i, r)| -> Result<Comment> {
            let row = i + 2;
            let timestamp = parse_timestamp(&r.timestamp).with_context(|| format!("row {}: timestamp", row))?;
            let date = PostDate::from_epoch(timestamp).with_context(|| format!("row {}: timestamp", row))?;
            Ok(Comment { id: r.id, thread: r.thread, author: r.author, timestamp, year: date.year })
        })
        .collect()
}

/// Keep only comments whose `thread` references a loaded thread.
pub fn restrict_to_known_threads(corpus: Corpus) -> Corpus {
    let Corpus { threads, comments } = corpus;
    let known: HashSet<&str> = threads.iter().map(|t| t.id.as_str()).collect();
    let before = comments.len();
    let comments: Vec<Comment> = comments.into_iter().filter(|c| known.contains(c.thread.as_str())).collect();
    if comments.len() < before {
        tracing::info!(dropped = before - comments.len(), "comments referencing unknown threads dropped");
    }
    Corpus { threads, comments }
}

fn read_rows<R: Read, T: DeserializeOwned>(rdr: R, required: &[&str]) -> Result<Vec<T>> {
    let mut csv_rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(rdr);
    let headers = csv_rdr.headers().context("reading header row")?.clone();
    let present: HashSet<&str> = headers.iter().map(|h| h.trim()).collect();
    let missing: Vec<&str> = required.iter().copied().filter(|c| !present.contains(c)).collect();
    if !missing.is_empty() {
        bail!("missing required column(s): {}", missing.join(", "));
    }
    let mut out = Vec::new();
    for (i, rec) in csv_rdr.deserialize::<T>().enumerate() {
        out.push(rec.with_context(|| format!("row {}", i + 2))?);
    }
    Ok(out)
}

/// Vote counts: integers, tolerating a trailing `.0` as written by some exporters.
fn parse_count(raw: &str) -> Result<i64> {
    let s = raw.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(anyhow!("not an integer: {:?}", raw)),
    }
}
