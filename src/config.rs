use crate::graph::ActivityBand;
use crate::lda::LdaConfig;
use crate::sample::SampleThresholds;
use std::path::{Path, PathBuf};

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    pub threads_path: PathBuf,
    pub comments_path: PathBuf,
    pub output_dir: PathBuf,
    pub lexicon_path: Option<PathBuf>, // None uses the built-in lexicon
    pub sample: SampleThresholds,
    pub min_doc_ratio: f64,            // document-frequency ratio a word must exceed
    pub lda: LdaConfig,
    pub top_terms: usize,
    pub top_documents: usize,
    pub activity_year: Option<i32>,    // None picks the busiest year
    pub activity_band: ActivityBand,
    pub layout_seed: u64,
    pub layout_iterations: usize,
    pub plots: bool,                   // render PNG charts
    pub progress: bool,                // show progress bars

    // IO tuning
    pub read_buffer_bytes: usize,      // BufReader capacity
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        let data = PathBuf::from("./data");
        Self {
            threads_path: data.join("threads.csv"),
            comments_path: data.join("comments.csv"),
            output_dir: PathBuf::from("./output"),
            lexicon_path: None,
            sample: SampleThresholds::default(),
            min_doc_ratio: 0.01,
            lda: LdaConfig::default(),
            top_terms: 10,
            top_documents: 5,
            activity_year: None,
            activity_band: ActivityBand::default(),
            layout_seed: 42,
            layout_iterations: 500,
            plots: true,
            progress: true,
            read_buffer_bytes: 256 * 1024,
        }
    }
}

impl AnalysisOptions {
    /// Expect `threads.csv` and `comments.csv` under `dir`.
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.threads_path = dir.join("threads.csv");
        self.comments_path = dir.join("comments.csv");
        self
    }
    pub fn with_threads_path(mut self, path: impl AsRef<Path>) -> Self {
        self.threads_path = path.as_ref().to_path_buf();
        self
    }
    pub fn with_comments_path(mut self, path: impl AsRef<Path>) -> Self {
        self.comments_path = path.as_ref().to_path_buf();
        self
    }
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_lexicon(mut self, path: impl AsRef<Path>) -> Self {
        self.lexicon_path = Some(path.as_ref().to_path_buf());
        self
    }
    pub fn with_sample_thresholds(mut self, min_ups_exclusive: i64, min_commenters_exclusive: usize) -> Self {
        self.sample = SampleThresholds { min_ups_exclusive, min_commenters_exclusive };
        self
    }
    pub fn with_min_doc_ratio(mut self, ratio: f64) -> Self {
        self.min_doc_ratio = ratio.max(0.0);
        self
    }
    pub fn with_topics(mut self, k: usize) -> Self {
        self.lda.num_topics = k;
        self
    }
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.lda.seed = seed;
        self
    }
    pub fn with_lda(mut self, lda: LdaConfig) -> Self {
        self.lda = lda;
        self
    }
    pub fn with_top_n(mut self, terms: usize, documents: usize) -> Self {
        self.top_terms = terms.max(1);
        self.top_documents = documents.max(1);
        self
    }
    pub fn with_activity_year(mut self, year: i32) -> Self {
        self.activity_year = Some(year);
        self
    }
    pub fn with_activity_band(mut self, min_exclusive: usize, max_exclusive: usize) -> Self {
        self.activity_band = ActivityBand { min_exclusive, max_exclusive };
        self
    }
    pub fn with_layout(mut self, seed: u64, iterations: usize) -> Self {
        self.layout_seed = seed;
        self.layout_iterations = iterations;
        self
    }
    pub fn with_plots(mut self, yes: bool) -> Self {
        self.plots = yes;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }

    // IO buffers tuning
    pub fn with_io_read_buffer(mut self, bytes: usize) -> Self {
        self.read_buffer_bytes = bytes.max(8 * 1024);
        self
    }
}
