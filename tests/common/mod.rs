#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const THREAD_HEADER: &str = "id,title,text,timestamp,ups,downs,author";
pub const COMMENT_HEADER: &str = "id,thread,author,timestamp";

/// 2015-04-25T22:13:20Z
pub const TS_2015: i64 = 1_430_000_000;
/// 2016-05-28, a later year for activity-year tests.
pub const TS_2016: i64 = 1_464_400_000;

/// One thread row, CSV-quoted.
#[derive(Clone, Debug)]
pub struct T<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub text: &'a str,
    pub ts: i64,
    pub ups: i64,
    pub author: &'a str,
}

/// One comment row.
#[derive(Clone, Debug)]
pub struct C<'a> {
    pub id: String,
    pub thread: &'a str,
    pub author: &'a str,
    pub ts: i64,
}

pub fn c<'a>(id: impl Into<String>, thread: &'a str, author: &'a str, ts: i64) -> C<'a> {
    C { id: id.into(), thread, author, ts }
}

/// Write any CSV table through the `csv` writer so quoting matches what the loader reads.
pub fn write_table(path: &Path, header: &str, rows: &[Vec<String>]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut w = csv::Writer::from_path(path).unwrap();
    w.write_record(header.split(',')).unwrap();
    for r in rows {
        w.write_record(r).unwrap();
    }
    w.flush().unwrap();
}

pub fn write_threads(path: &Path, threads: &[T]) {
    let rows: Vec<Vec<String>> = threads
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.title.to_string(),
                t.text.to_string(),
                t.ts.to_string(),
                t.ups.to_string(),
                "0".to_string(),
                t.author.to_string(),
            ]
        })
        .collect();
    write_table(path, THREAD_HEADER, &rows);
}

pub fn write_comments(path: &Path, comments: &[C]) {
    let rows: Vec<Vec<String>> = comments
        .iter()
        .map(|c| vec![c.id.clone(), c.thread.to_string(), c.author.to_string(), c.ts.to_string()])
        .collect();
    write_table(path, COMMENT_HEADER, &rows);
}

/// Write a data dir with `threads.csv` and `comments.csv`.
pub fn make_data_dir(threads: &[T], comments: &[C]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_threads(&dir.path().join("threads.csv"), threads);
    write_comments(&dir.path().join("comments.csv"), comments);
    dir
}

/// Compress `src` into `src.zst` and return the new path.
pub fn zstd_copy(src: &Path) -> PathBuf {
    let mut name = src.file_name().unwrap().to_os_string();
    name.push(".zst");
    let dest = src.with_file_name(name);
    let data = fs::read(src).unwrap();
    let f = File::create(&dest).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    enc.write_all(&data).unwrap();
    enc.finish().unwrap();
    dest
}

/// Build a tiny corpus for the cleaner:
/// - t1 "CMV: ..." by op_one, t2 "cmv: ..." by op_two, t3 without the marker (dropped).
/// - 5 comments: alice->t1, carol->t1, bob->t2, op_one->t1 (thread author, dropped),
///   [deleted]->t2 (sentinel, dropped).
/// Cleaning keeps 2 threads and 3 (author, thread) pairs.
pub fn make_cleaning_corpus() -> TempDir {
    let threads = [
        T {
            id: "t1",
            title: "CMV: Cities should ban cars downtown",
            text: "See https://example.com/traffic for data. **Traffic** kills.",
            ts: TS_2015,
            ups: 40,
            author: "op_one",
        },
        T {
            id: "t2",
            title: "cmv: [Nuclear power](http://power.example.org) is underrated",
            text: "Reactors are safe.&amp; www.energy.example.net has numbers",
            ts: TS_2015 + 60,
            ups: 15,
            author: "op_two",
        },
        T { id: "t3", title: "Meta: subreddit rules", text: "please read", ts: TS_2015 + 120, ups: 3, author: "mod" },
    ];
    let comments = [
        c("c1", "t1", "alice", TS_2015 + 10),
        c("c2", "t1", "carol", TS_2015 + 20),
        c("c3", "t2", "bob", TS_2015 + 70),
        c("c4", "t1", "OP_One", TS_2015 + 30),
        c("c5", "t2", "[deleted]", TS_2015 + 80),
    ];
    make_data_dir(&threads, &comments)
}

pub const ECONOMY_TEXT: &str = "Taxes on wages distort markets. Higher taxes reduce wages and raise prices; \
     markets respond to taxes, wages and prices with inflation and unemployment.";
pub const HEALTH_TEXT: &str = "Vaccines protect children. Doctors recommend vaccines because hospitals see \
     fewer infections; vaccines, doctors and hospitals together prevent disease outbreaks.";

pub fn commenter_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("user{:02}", i)).collect()
}

/// A corpus that survives the whole pipeline with default thresholds:
/// - 8 debate threads in 2015 with 50 upvotes each, four on economics and four on health.
/// - 14 regular commenters, each commenting once on every thread (8 threads, inside (6, 16)).
/// - a light user on 2 threads (outside the band), an AutoModerator comment, and
///   each thread's author commenting on their own thread.
pub fn make_pipeline_corpus() -> TempDir {
    let ids = ["e1", "e2", "e3", "e4", "h1", "h2", "h3", "h4"];
    let authors = ["ann", "ben", "cat", "dan", "eve", "fay", "gus", "hal"];
    let threads: Vec<T> = ids
        .iter()
        .zip(authors.iter())
        .enumerate()
        .map(|(i, (&id, &author))| T {
            id,
            title: if id.starts_with('e') { "CMV: Taxes on wages hurt markets" } else { "CMV: Vaccines should be mandatory" },
            text: if id.starts_with('e') { ECONOMY_TEXT } else { HEALTH_TEXT },
            ts: TS_2015 + i as i64 * 3600,
            ups: 50,
            author,
        })
        .collect();

    let names = commenter_names(14);
    let mut comments = Vec::new();
    let mut n = 0usize;
    for (i, &id) in ids.iter().enumerate() {
        for name in &names {
            n += 1;
            comments.push(c(format!("c{}", n), id, name.as_str(), TS_2015 + i as i64 * 3600 + n as i64));
        }
        n += 1;
        comments.push(c(format!("c{}", n), id, authors[i], TS_2015 + i as i64 * 3600 + n as i64));
        n += 1;
        comments.push(c(format!("c{}", n), id, "AutoModerator", TS_2015 + i as i64 * 3600 + n as i64));
    }
    comments.push(c("light1", "e1", "lurker", TS_2015 + 9000));
    comments.push(c("light2", "h1", "lurker", TS_2015 + 9100));
    make_data_dir(&threads, &comments)
}
