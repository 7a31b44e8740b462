//! Domain word lists and text cleanup rules, loaded from TOML.
//!
//! The default lexicon ships in `config/lexicon.toml` and is embedded at build time.

use crate::util::{merge_extra_exclusions, normalize_author};
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const DEFAULT_LEXICON: &str = include_str!("../config/lexicon.toml");

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct LexiconFile {
    debate_marker: String,
    deleted_sentinels: Vec<String>,
    bot_accounts: Vec<String>,
    cleanup: Vec<CleanupEntry>,
    stop_words: Vec<String>,
    domain_stop_words: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct CleanupEntry {
    name: String,
    pattern: String,
    #[serde(default)]
    replacement: String,
}

/// One ordered regex substitution.
#[derive(Debug, Clone)]
pub struct CleanupRule {
    pub name: String,
    pub pattern: Regex,
    pub replacement: String,
}

/// Compiled lexicon: marker, excluded authors, cleanup rules and stop words.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub debate_marker: String,
    /// Case-insensitive literal match of `debate_marker`, stripped after the cleanup rules.
    pub marker_pattern: Regex,
    /// Normalized (lowercase), sorted, deduplicated.
    pub excluded_authors: Vec<String>,
    pub cleanup: Vec<CleanupRule>,
    /// Generic and domain stop words, lowercase.
    pub stop_words: HashSet<String>,
}

impl Lexicon {
    /// The embedded default lexicon, extended by `DEBATENET_EXCLUDE_AUTHORS[_FILE]`.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(DEFAULT_LEXICON).context("parse embedded lexicon")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse lexicon file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: LexiconFile = toml::from_str(content)?;

        let cleanup = file
            .cleanup
            .into_iter()
            .map(|e| -> Result<CleanupRule> {
                let pattern = Regex::new(&e.pattern)
                    .with_context(|| format!("cleanup rule {:?}: invalid pattern", e.name))?;
                Ok(CleanupRule { name: e.name, pattern, replacement: e.replacement })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut excluded: Vec<String> = file
            .deleted_sentinels
            .iter()
            .chain(file.bot_accounts.iter())
            .map(|s| normalize_author(s))
            .collect();
        merge_extra_exclusions(&mut excluded);

        let stop_words = file
            .stop_words
            .iter()
            .chain(file.domain_stop_words.iter())
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let marker_pattern = Regex::new(&format!("(?i){}", regex::escape(file.debate_marker.trim())))
            .context("debate marker")?;

        Ok(Self {
            debate_marker: file.debate_marker,
            marker_pattern,
            excluded_authors: excluded,
            cleanup,
            stop_words,
        })
    }

    /// True when the author is a bot, a deleted-account sentinel, or empty.
    pub fn is_excluded_author(&self, author: &str) -> bool {
        let a = normalize_author(author);
        a.is_empty() || self.excluded_authors.binary_search(&a).is_ok()
    }

    /// Debate threads carry the marker at the start of their raw title.
    pub fn is_debate_title(&self, title: &str) -> bool {
        let marker = self.debate_marker.trim().to_lowercase();
        !marker.is_empty() && title.trim_start().to_lowercase().starts_with(&marker)
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }
}
