//! Popularity sampling that bounds the topic-model input.

use crate::models::Thread;
use anyhow::{bail, Result};

/// Threads must exceed both thresholds to be sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleThresholds {
    pub min_ups_exclusive: i64,
    pub min_commenters_exclusive: usize,
}

impl Default for SampleThresholds {
    fn default() -> Self {
        Self { min_ups_exclusive: 11, min_commenters_exclusive: 11 }
    }
}

impl SampleThresholds {
    #[inline]
    pub fn accepts(&self, t: &Thread) -> bool {
        t.ups > self.min_ups_exclusive && t.unique_commenters > self.min_commenters_exclusive
    }
}

/// Keep the threads passing `thresholds`. Order is preserved.
pub fn sample_threads(threads: &[Thread], thresholds: SampleThresholds) -> Result<Vec<Thread>> {
    let sampled: Vec<Thread> = threads.iter().filter(|t| thresholds.accepts(t)).cloned().collect();
    if sampled.is_empty() {
        bail!(
            "no thread has ups > {} and unique commenters > {}; nothing to model",
            thresholds.min_ups_exclusive,
            thresholds.min_commenters_exclusive
        );
    }
    tracing::info!(sampled = sampled.len(), of = threads.len(), "sampled documents");
    Ok(sampled)
}
