//! Shared domain types and the storage capability interface

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "python")]
use pyo3::pyclass;

/// Word entry in the vocabulary corpus
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub word: String,
    pub mean: String,
    #[serde(default)]
    pub level: Option<i64>,
}

/// Unsaved corpus row; the backend assigns the id on insert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWord {
    pub word: String,
    pub mean: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
}

/// One row of the miss ranking
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissEntry {
    pub word: String,
    pub mean: String,
    pub miss_count: i64,
}

/// Answer statistics over the full record log
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Debug, Clone)]
pub struct AttemptStats {
    pub total_attempts: i64,
    pub correct_count: i64,
    pub incorrect_count: i64,
    pub accuracy_percent: f64,
}

/// Which words are eligible for the next question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizMode {
    /// Every word in the corpus
    All,
    /// Distinct words with at least one missed record
    Review,
}

impl std::str::FromStr for QuizMode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(QuizMode::All),
            "review" => Ok(QuizMode::Review),
            other => Err(StoreError::Mode(other.to_string())),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("unexpected api response: {0}")]
    Protocol(String),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("missing configuration: {0}")]
    Config(String),
    #[error("unknown quiz mode: {0}")]
    Mode(String),
    #[error("import error: {0}")]
    Import(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Capability interface over the word corpus and the attempt log.
///
/// Both backends implement the whole surface, so the composer and the
/// presentation layer never depend on which one is active.
pub trait VocabStore {
    /// Words eligible for the given mode. Empty when nothing matches.
    fn fetch_pool(&self, mode: QuizMode) -> Result<Vec<Word>>;

    /// Every meaning in the corpus, duplicates included.
    fn fetch_all_meanings(&self) -> Result<Vec<String>>;

    /// Append one quiz outcome. `word_id` is not validated here.
    fn append_record(&self, word_id: i64, is_correct: bool) -> Result<()>;

    /// Most-missed words, miss count descending, at most `limit` rows.
    fn rank_misses(&self, limit: usize) -> Result<Vec<MissEntry>>;

    /// Number of words in the corpus.
    fn word_count(&self) -> Result<i64>;

    /// Insert one batch of corpus rows, returning how many were written.
    fn insert_words(&self, words: &[NewWord]) -> Result<usize>;

    /// Aggregate statistics over the full record log.
    fn stats(&self) -> Result<AttemptStats>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_mode_parses_known_values() {
        assert_eq!("all".parse::<QuizMode>().unwrap(), QuizMode::All);
        assert_eq!("Review".parse::<QuizMode>().unwrap(), QuizMode::Review);
        assert_eq!(" ALL ".parse::<QuizMode>().unwrap(), QuizMode::All);
    }

    #[test]
    fn quiz_mode_rejects_unknown_values() {
        let err = "cram".parse::<QuizMode>().unwrap_err();
        assert!(matches!(err, StoreError::Mode(m) if m == "cram"));
    }
}
