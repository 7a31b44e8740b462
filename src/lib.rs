mod config;
mod date;
mod lexicon;
mod models;
mod source;
mod loader;

mod filters;
mod sample;
mod tokenize;
mod special;
mod lda;
mod report;

mod graph;
mod layout;
mod plots;
mod progress;
mod util;
mod pipeline;

pub use crate::config::AnalysisOptions;
pub use crate::date::{iter_year_months, parse_timestamp, PostDate, YearMonth};
pub use crate::pipeline::{AnalysisOutcome, DebateAnalysis};

pub use crate::lexicon::{CleanupRule, Lexicon};
pub use crate::models::{Comment, Corpus, Thread};
pub use crate::loader::{load_comments, load_corpus, load_threads, read_comments, read_threads, restrict_to_known_threads};

// cleaning + sampling
pub use crate::filters::{clean_corpus, clean_text, dedupe_author_thread, CleanStats};
pub use crate::sample::{sample_threads, SampleThresholds};

// tokens + topic model
pub use crate::tokenize::{document_tokens, longest_word_run, tokenize_threads, TokenTable};
pub use crate::lda::{fit as fit_lda, DocTermMatrix, LdaConfig, LdaModel};
pub use crate::report::{top_documents, top_terms, vocabulary, write_csv, RunSummary, TopicDocument, TopicTerm, VocabularyEntry};

// affiliation graph
pub use crate::graph::{
    affiliations, build_user_graph, busiest_year, centrality, dominant_topics, eigenvector_centrality, select_active,
    ActivityBand, Affiliation, BipartiteGraph, CentralityRecord, DominantTopic, ProjectedGraph, UserNode,
};
pub use crate::layout::{fruchterman_reingold, LayoutConfig};
pub use crate::plots::{density, histogram};

pub use crate::progress::{make_count_progress, ProgressScope};

//export robust file ops from util so binaries can import from crate root.
pub use crate::util::{create_with_backoff, init_tracing_once, open_with_backoff, remove_with_backoff, replace_file_atomic_backoff};
