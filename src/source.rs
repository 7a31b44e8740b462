//! Input sources: plain or zstd-compressed delimited text.

use crate::util::open_with_backoff;
use anyhow::{Context, Result};
use std::io::{BufReader, Read};
use std::path::Path;
use zstd::stream::read::Decoder;

pub fn is_zst(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("zst"))
        .unwrap_or(false)
}

/// Open `path` for reading, decompressing `.zst` files on the fly.
///
/// We request `window_log_max(31)` up front to avoid "Frame requires too much memory"
/// on large frames.
pub fn open_table(path: &Path, read_buf_bytes: usize) -> Result<Box<dyn Read>> {
    let file = open_with_backoff(path, 16, 50).with_context(|| format!("open {}", path.display()))?;
    let cap = read_buf_bytes.max(8 * 1024);
    if is_zst(path) {
        let mut decoder = Decoder::new(file).with_context(|| format!("zstd decoder {}", path.display()))?;
        decoder.window_log_max(31)?;
        Ok(Box::new(BufReader::with_capacity(cap, decoder)))
    } else {
        Ok(Box::new(BufReader::with_capacity(cap, file)))
    }
}
