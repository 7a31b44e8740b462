use anyhow::{Context, Result};
use std::fs;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

/// Author names compare case-insensitively and ignore surrounding whitespace.
#[inline]
pub fn normalize_author(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Merge extra author exclusions from env/file into the provided vector (in-place).
/// - DEBATENET_EXCLUDE_AUTHORS: comma/semicolon/space separated names
/// - DEBATENET_EXCLUDE_AUTHORS_FILE: path to newline-separated file of names
/// All entries are normalized (lowercase), then the list is sort+dedup.
pub fn merge_extra_exclusions(target: &mut Vec<String>) {
    if let Ok(s) = std::env::var("DEBATENET_EXCLUDE_AUTHORS") {
        for raw in s.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
            let n = normalize_author(raw);
            if !n.is_empty() {
                target.push(n);
            }
        }
    }

    if let Ok(path) = std::env::var("DEBATENET_EXCLUDE_AUTHORS_FILE") {
        if !path.trim().is_empty() {
            if let Ok(f) = File::open(&path) {
                let r = BufReader::new(f);
                for line in r.lines().map_while(|l| l.ok()) {
                    let n = normalize_author(&line);
                    if !n.is_empty() {
                        target.push(n);
                    }
                }
            } else {
                tracing::warn!("DEBATENET_EXCLUDE_AUTHORS_FILE is set but cannot be opened: {}", path);
            }
        }
    }

    for s in target.iter_mut() {
        *s = normalize_author(s);
    }
    target.sort();
    target.dedup();
}

// -------- file operations with retry on transient errors --------

/// Raw OS codes of transient failures: sharing/lock violations, scanners holding
/// the file, devices not ready (Windows), and EBUSY/EAGAIN elsewhere.
fn is_retriable_io_error(e: &io::Error) -> bool {
    if cfg!(windows) {
        matches!(e.raw_os_error(), Some(5 | 21 | 32 | 33 | 225 | 433 | 1006 | 1117 | 1224))
    } else {
        matches!(e.raw_os_error(), Some(11 | 16))
    }
}

/// Run `op` up to `tries` times, sleeping a linearly growing delay after each
/// retriable failure. Non-retriable errors return immediately.
fn retry<T>(tries: usize, delay_ms: u64, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err = None;
    for i in 0..tries.max(1) {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul(i as u64 + 1)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::other("retries exhausted")))
}

pub fn open_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    retry(tries, delay_ms, || File::open(path))
}

pub fn create_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    retry(tries, delay_ms, || File::create(path))
}

/// Remove a file; a file that is already gone counts as removed.
pub fn remove_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> Result<()> {
    retry(tries, delay_ms, || match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    })
    .with_context(|| format!("remove {}", path.display()))
}

/// Move `tmp` over `dest`. Falls back to copy + remove when the rename is refused
/// (e.g. across devices).
pub fn replace_file_atomic_backoff(tmp: &Path, dest: &Path) -> Result<()> {
    let (tries, delay_ms) = (20usize, 50u64);
    if retry(tries, delay_ms, || fs::rename(tmp, dest)).is_ok() {
        return Ok(());
    }
    remove_with_backoff(dest, tries, delay_ms)?;
    retry(tries, delay_ms, || fs::copy(tmp, dest))
        .with_context(|| format!("copy {} -> {}", tmp.display(), dest.display()))?;
    remove_with_backoff(tmp, tries, delay_ms)
}
