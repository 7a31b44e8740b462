use crate::config::AnalysisOptions;
use crate::filters::{clean_corpus, CleanStats};
use crate::graph::{build_user_graph, centrality, CentralityRecord, ProjectedGraph};
use crate::layout::{fruchterman_reingold, LayoutConfig};
use crate::lda::{fit, DocTermMatrix, LdaModel};
use crate::lexicon::Lexicon;
use crate::loader::load_corpus;
use crate::models::{Corpus, Thread};
use crate::plots;
use crate::report::{self, RunSummary};
use crate::sample::sample_threads;
use crate::tokenize::{tokenize_threads, TokenTable};
use crate::util::init_tracing_once;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// One end-to-end run: load, clean, sample, model, report, graph, render.
#[derive(Clone)]
pub struct DebateAnalysis {
    pub(crate) opts: AnalysisOptions,
}

/// Everything a run computed, for callers that want more than the files.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub corpus: Corpus,
    pub clean_stats: CleanStats,
    pub sampled: Vec<Thread>,
    pub tokens: TokenTable,
    pub model: LdaModel,
    pub graph: ProjectedGraph,
    pub activity_year: i32,
    pub centrality: Vec<CentralityRecord>,
    pub artifacts: Vec<PathBuf>,
}

impl Default for DebateAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

impl DebateAnalysis {
    pub fn new() -> Self {
        Self { opts: AnalysisOptions::default() }
    }

    pub fn with_options(opts: AnalysisOptions) -> Self {
        Self { opts }
    }

    // -------- Builder methods --------
    pub fn data_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_data_dir(dir); self }
    pub fn threads_path(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_threads_path(path); self }
    pub fn comments_path(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_comments_path(path); self }
    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_output_dir(dir); self }
    pub fn lexicon(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_lexicon(path); self }
    pub fn sample_thresholds(mut self, min_ups: i64, min_commenters: usize) -> Self { self.opts = self.opts.with_sample_thresholds(min_ups, min_commenters); self }
    pub fn min_doc_ratio(mut self, ratio: f64) -> Self { self.opts = self.opts.with_min_doc_ratio(ratio); self }
    pub fn topics(mut self, k: usize) -> Self { self.opts = self.opts.with_topics(k); self }
    pub fn seed(mut self, seed: u64) -> Self { self.opts = self.opts.with_seed(seed); self }
    pub fn top_n(mut self, terms: usize, documents: usize) -> Self { self.opts = self.opts.with_top_n(terms, documents); self }
    pub fn activity_year(mut self, year: i32) -> Self { self.opts = self.opts.with_activity_year(year); self }
    pub fn activity_band(mut self, min_exclusive: usize, max_exclusive: usize) -> Self { self.opts = self.opts.with_activity_band(min_exclusive, max_exclusive); self }
    pub fn layout(mut self, seed: u64, iterations: usize) -> Self { self.opts = self.opts.with_layout(seed, iterations); self }
    pub fn plots(mut self, yes: bool) -> Self { self.opts = self.opts.with_plots(yes); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn io_read_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_io_read_buffer(bytes); self }

    pub fn options(&self) -> &AnalysisOptions {
        &self.opts
    }

    fn load_lexicon(&self) -> Result<Lexicon> {
        match &self.opts.lexicon_path {
            Some(p) => Lexicon::from_path(p),
            None => Lexicon::builtin(),
        }
    }

    /// Load and clean only; no output is written.
    pub fn prepare(&self) -> Result<(Corpus, CleanStats)> {
        init_tracing_once();
        let lex = self.load_lexicon()?;
        let corpus = load_corpus(&self.opts.threads_path, &self.opts.comments_path, self.opts.read_buffer_bytes)?;
        clean_corpus(corpus, &lex)
    }

    pub fn run(self) -> Result<AnalysisOutcome> {
        init_tracing_once();
        let opts = &self.opts;
        let lex = self.load_lexicon()?;
        let out = opts.output_dir.clone();
        fs::create_dir_all(&out).with_context(|| format!("create output dir {}", out.display()))?;
        let mut artifacts: Vec<PathBuf> = Vec::new();

        // 1-2. load + clean
        let corpus = load_corpus(&opts.threads_path, &opts.comments_path, opts.read_buffer_bytes)?;
        let (corpus, clean_stats) = clean_corpus(corpus, &lex)?;

        if opts.plots {
            let p = out.join("upvote_distribution.png");
            plots::upvote_distribution(&p, &corpus.threads)?;
            artifacts.push(p);
            let p = out.join("commenter_distribution.png");
            plots::commenter_distribution(&p, &corpus.threads)?;
            artifacts.push(p);
            let p = out.join("thread_activity.png");
            plots::monthly_activity(&p, &corpus.threads)?;
            artifacts.push(p);
        }

        // 3-5. sample, tokenize, model
        let sampled = sample_threads(&corpus.threads, opts.sample)?;
        let tokens = tokenize_threads(&sampled, &lex, opts.min_doc_ratio);
        let p = out.join("vocabulary.csv");
        report::write_csv(&p, &report::vocabulary(&tokens))?;
        artifacts.push(p);

        let dtm = DocTermMatrix::from_tokens(&tokens)?;
        let mut lda = opts.lda.clone();
        lda.progress = lda.progress && opts.progress;
        let model = fit(&dtm, &lda)?;

        // 6. topic reports
        let p = out.join("topic_terms.csv");
        report::write_csv(&p, &report::top_terms(&model, opts.top_terms))?;
        artifacts.push(p);
        let p = out.join("topic_documents.csv");
        report::write_csv(&p, &report::top_documents(&model, &sampled, opts.top_documents))?;
        artifacts.push(p);
        if opts.plots {
            let p = out.join("topic_terms.png");
            plots::topic_terms(&p, &model, opts.top_terms)?;
            artifacts.push(p);
            let p = out.join("topic_preference_density.png");
            plots::topic_preference_density(&p, &model)?;
            artifacts.push(p);
        }

        // 7. affiliation graph + centrality
        let (graph, activity_year) =
            build_user_graph(&corpus.comments, &sampled, &model, opts.activity_year, opts.activity_band)?;
        let centrality = centrality(&graph);
        let p = out.join("centrality.csv");
        report::write_csv(&p, &centrality)?;
        artifacts.push(p);

        // 8. network image
        if opts.plots {
            let layout = LayoutConfig { seed: opts.layout_seed, iterations: opts.layout_iterations, progress: opts.progress };
            let positions = fruchterman_reingold(&graph, &layout);
            let p = out.join("user_network.png");
            plots::user_network(&p, &graph, &positions, &centrality)?;
            artifacts.push(p);
        }

        let summary_path = out.join("summary.json");
        artifacts.push(summary_path.clone());
        let summary = RunSummary {
            cleaning: clean_stats.clone(),
            sampled_threads: sampled.len(),
            vocabulary_size: tokens.vocabulary.len(),
            modelled_documents: model.doc_ids.len(),
            num_topics: model.num_topics(),
            alpha: model.alpha,
            log_likelihood: model.log_likelihood,
            em_iterations: model.iterations,
            activity_year,
            graph_users: graph.node_count(),
            graph_edges: graph.graph.edge_count(),
            artifacts: artifacts
                .iter()
                .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .collect(),
        };
        report::write_summary(&summary_path, &summary)?;
        tracing::info!(output = %out.display(), files = artifacts.len(), "analysis complete");

        Ok(AnalysisOutcome {
            corpus,
            clean_stats,
            sampled,
            tokens,
            model,
            graph,
            activity_year,
            centrality,
            artifacts,
        })
    }
}
