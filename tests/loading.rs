#[path = "common/mod.rs"]
mod common;

use common::*;
use debatenet::{load_corpus, load_threads, parse_timestamp, read_comments, read_threads};

/// Reads a threads table with an extra column and quoted commas in the body:
/// - extra columns are ignored, types are coerced, calendar fields are derived.
/// Outcome: one thread in April 2015, ISO week 17, with its counts parsed.
#[test]
fn threads_table_is_typed_and_dated() {
    let csv = "id,title,text,timestamp,ups,downs,author,flair\n\
               t1,\"CMV: Hello, world\",\"body, with commas\",1430000000,12,3.0,alice,none\n";
    let threads = read_threads(csv.as_bytes()).unwrap();
    assert_eq!(threads.len(), 1);
    let t = &threads[0];
    assert_eq!(t.title, "CMV: Hello, world");
    assert_eq!(t.text, "body, with commas");
    assert_eq!((t.ups, t.downs), (12, 3));
    assert_eq!((t.year, t.month, t.week), (2015, 4, 17));
    assert_eq!(t.unique_commenters, 0);
}

/// A table missing `ups` fails to load.
/// Outcome: the error names the missing column and the file it came from.
#[test]
fn missing_column_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("threads.csv");
    write_table(
        &path,
        "id,title,text,timestamp,downs,author",
        &[vec!["t1".into(), "CMV: x".into(), "".into(), "1430000000".into(), "0".into(), "a".into()]],
    );
    let err = load_threads(&path, 64 * 1024).unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("missing required column(s): ups"), "got: {msg}");
    assert!(msg.contains("threads.csv"), "got: {msg}");
}

/// A non-numeric vote count aborts the load with the offending row number.
#[test]
fn bad_number_reports_row() {
    let csv = "id,title,text,timestamp,ups,downs,author\n\
               t1,CMV: a,,1430000000,5,0,x\n\
               t2,CMV: b,,1430000000,lots,0,y\n";
    let err = read_threads(csv.as_bytes()).unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("row 3"), "got: {msg}");
    assert!(msg.contains("ups"), "got: {msg}");
}

/// A row missing its trailing author field is rejected with its row number
/// instead of loading with an empty author.
#[test]
fn short_row_is_a_load_error() {
    let csv = "id,title,text,timestamp,ups,downs,author\n\
               t1,CMV: a,,1430000000,5,0,x\n\
               t2,CMV: b,,1430000000,5,0\n";
    let err = read_threads(csv.as_bytes()).unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("row 3"), "got: {msg}");
}

/// Timestamps may be integer seconds, fractional seconds or RFC 3339.
#[test]
fn timestamp_formats() {
    assert_eq!(parse_timestamp("1430000000").unwrap(), TS_2015);
    assert_eq!(parse_timestamp("1430000000.75").unwrap(), TS_2015);
    assert_eq!(parse_timestamp("2015-04-25T22:13:20Z").unwrap(), TS_2015);
    assert!(parse_timestamp("yesterday").is_err());

    let csv = "id,thread,author,timestamp\nc1,t1,bob,2016-05-28T01:46:40+00:00\n";
    let comments = read_comments(csv.as_bytes()).unwrap();
    assert_eq!(comments[0].timestamp, TS_2016);
    assert_eq!(comments[0].year, 2016);
}

/// A repeated thread id keeps only its first row.
#[test]
fn duplicate_thread_ids_keep_first() {
    let csv = "id,title,text,timestamp,ups,downs,author\n\
               t1,CMV: first,,1430000000,5,0,x\n\
               t1,CMV: second,,1430000000,9,0,y\n";
    let threads = read_threads(csv.as_bytes()).unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].title, "CMV: first");
}

/// Loading the same tables from plain CSV and from `.zst` copies:
/// - comments on unknown threads are dropped on load.
/// Outcome: both inputs give identical corpora.
#[test]
fn zstd_inputs_load_like_plain_ones() {
    let threads = [T { id: "t1", title: "CMV: a", text: "b", ts: TS_2015, ups: 20, author: "op" }];
    let comments = [c("c1", "t1", "alice", TS_2015 + 5), c("c2", "missing", "bob", TS_2015 + 6)];
    let dir = make_data_dir(&threads, &comments);
    let tp = dir.path().join("threads.csv");
    let cp = dir.path().join("comments.csv");

    let plain = load_corpus(&tp, &cp, 64 * 1024).unwrap();
    let packed = load_corpus(&zstd_copy(&tp), &zstd_copy(&cp), 64 * 1024).unwrap();

    assert_eq!(plain.threads, packed.threads);
    assert_eq!(plain.comments, packed.comments);
    assert_eq!(plain.comments.len(), 1);
    assert_eq!(plain.comments[0].author, "alice");
}
