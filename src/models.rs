use crate::date::PostDate;
use serde::{Deserialize, Serialize};

/// Thread row as it appears on disk. Extra columns are ignored by serde;
/// every field is a required column, so a short row fails to deserialize.
#[derive(Debug, Clone, Deserialize)]
pub struct RawThread {
    pub id: String,
    pub title: String,
    pub text: String,
    pub timestamp: String,
    pub ups: String,
    pub downs: String,
    pub author: String,
}

/// Comment row as it appears on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    pub id: String,
    pub thread: String,
    pub author: String,
    pub timestamp: String,
}

/// A top-level debate post with its derived calendar and activity columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thread {
    pub id: String,
    pub title: String,
    pub text: String,
    pub timestamp: i64,
    pub year: i32,
    pub month: u8,
    pub week: u8,
    pub ups: i64,
    pub downs: i64,
    pub author: String,
    /// Distinct surviving commenters; zero until the cleaner fills it in.
    pub unique_commenters: usize,
}

impl Thread {
    pub fn date(&self) -> PostDate {
        PostDate { year: self.year, month: self.month, week: self.week }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: String,
    pub thread: String,
    pub author: String,
    pub timestamp: i64,
    pub year: i32,
}

/// Threads plus the comments referencing them.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub threads: Vec<Thread>,
    pub comments: Vec<Comment>,
}
