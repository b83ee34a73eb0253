//! Remote Supabase (PostgREST) backend

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use log::debug;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;

use crate::store::{
    AttemptStats, MissEntry, NewWord, QuizMode, Result, StoreError, VocabStore, Word,
};

/// Hosted table-oriented store reached over the PostgREST API.
///
/// The REST layer cannot express a distinct join, so review-pool dedupe
/// and miss counting happen in memory after fetching the embedded rows.
#[derive(Debug)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Embedded word row returned when selecting through the records table.
#[derive(Debug, Deserialize)]
struct ReviewRow {
    words: Option<Word>,
}

#[derive(Debug, Deserialize)]
struct MeaningRow {
    mean: String,
}

#[derive(Debug, Deserialize)]
struct CorrectnessRow {
    is_correct: i64,
}

#[derive(Debug, Deserialize)]
struct MissRow {
    words: Option<MissWord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
struct MissWord {
    word: String,
    mean: String,
}

impl SupabaseStore {
    /// Create a client for the given project URL and API key.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(StoreError::Config(format!(
                "invalid Supabase URL: {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// Create a client from the `SUPABASE_URL` and `SUPABASE_KEY` env vars.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| StoreError::Config("SUPABASE_URL not set".to_string()))?;
        let key = std::env::var("SUPABASE_KEY")
            .map_err(|_| StoreError::Config("SUPABASE_KEY not set".to_string()))?;
        Self::new(&url, &key)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn get(&self, table: &str, query: &[(&str, &str)]) -> Result<Response> {
        let resp = self
            .client
            .get(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()?;
        check_status(resp)
    }

    fn post(&self, table: &str, body: &impl serde::Serialize) -> Result<()> {
        let resp = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(body)
            .send()?;
        check_status(resp)?;
        Ok(())
    }
}

fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        let body = resp.text().unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

/// `Content-Range: 0-0/42` → 42 (`*/0` for an empty table).
fn parse_total(content_range: &str) -> Option<i64> {
    content_range.rsplit('/').next()?.trim().parse().ok()
}

/// Drop embed-less rows and repeated words, keeping first-seen order.
fn dedupe_pool(rows: Vec<ReviewRow>) -> Vec<Word> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter_map(|r| r.words)
        .filter(|w| seen.insert(w.id))
        .collect()
}

/// Count misses per word and rank descending. The sort is stable, so
/// tied words keep the response order.
fn rank_from_rows(rows: Vec<MissRow>, limit: usize) -> Vec<MissEntry> {
    let mut index: HashMap<MissWord, usize> = HashMap::new();
    let mut counts: Vec<(MissWord, i64)> = Vec::new();

    for word in rows.into_iter().filter_map(|r| r.words) {
        match index.get(&word) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(word.clone(), counts.len());
                counts.push((word, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(limit)
        .map(|(w, n)| MissEntry {
            word: w.word,
            mean: w.mean,
            miss_count: n,
        })
        .collect()
}

impl VocabStore for SupabaseStore {
    fn fetch_pool(&self, mode: QuizMode) -> Result<Vec<Word>> {
        let words = match mode {
            QuizMode::All => self
                .get("words", &[("select", "id,word,mean,level")])?
                .json::<Vec<Word>>()?,
            QuizMode::Review => {
                let rows: Vec<ReviewRow> = self
                    .get(
                        "records",
                        &[
                            ("select", "word_id,words(id,word,mean,level)"),
                            ("is_correct", "eq.0"),
                        ],
                    )?
                    .json()?;
                dedupe_pool(rows)
            }
        };
        debug!("fetched pool of {} words ({:?})", words.len(), mode);
        Ok(words)
    }

    fn fetch_all_meanings(&self) -> Result<Vec<String>> {
        let rows: Vec<MeaningRow> = self.get("words", &[("select", "mean")])?.json()?;
        Ok(rows.into_iter().map(|r| r.mean).collect())
    }

    fn append_record(&self, word_id: i64, is_correct: bool) -> Result<()> {
        let body = serde_json::json!({
            "word_id": word_id,
            "is_correct": i64::from(is_correct),
        });
        self.post("records", &body)
    }

    fn rank_misses(&self, limit: usize) -> Result<Vec<MissEntry>> {
        let rows: Vec<MissRow> = self
            .get(
                "records",
                &[
                    ("select", "is_correct,words(word,mean)"),
                    ("is_correct", "eq.0"),
                ],
            )?
            .json()?;
        Ok(rank_from_rows(rows, limit))
    }

    fn word_count(&self) -> Result<i64> {
        let resp = self
            .client
            .get(self.table_url("words"))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "count=exact")
            .query(&[("select", "id"), ("limit", "1")])
            .send()?;
        let resp = check_status(resp)?;

        let range = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| StoreError::Protocol("missing content-range header".to_string()))?;
        parse_total(range)
            .ok_or_else(|| StoreError::Protocol(format!("bad content-range: {range}")))
    }

    fn insert_words(&self, words: &[NewWord]) -> Result<usize> {
        if words.is_empty() {
            return Ok(0);
        }
        self.post("words", &words)?;
        Ok(words.len())
    }

    fn stats(&self) -> Result<AttemptStats> {
        let rows: Vec<CorrectnessRow> = self.get("records", &[("select", "is_correct")])?.json()?;

        let total = rows.len() as i64;
        let correct = rows.iter().filter(|r| r.is_correct != 0).count() as i64;
        let accuracy = if total > 0 {
            correct as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Ok(AttemptStats {
            total_attempts: total,
            correct_count: correct,
            incorrect_count: total - correct,
            accuracy_percent: accuracy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miss_row(word: &str, mean: &str) -> MissRow {
        MissRow {
            words: Some(MissWord {
                word: word.to_string(),
                mean: mean.to_string(),
            }),
        }
    }

    #[test]
    fn rejects_non_http_url() {
        let err = SupabaseStore::new("ftp://example.com", "key").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let store = SupabaseStore::new("https://example.supabase.co/", "key").unwrap();
        assert_eq!(
            store.table_url("words"),
            "https://example.supabase.co/rest/v1/words"
        );
    }

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_total("0-0/42"), Some(42));
        assert_eq!(parse_total("*/0"), Some(0));
        assert_eq!(parse_total("garbage"), None);
    }

    #[test]
    fn review_rows_dedupe_by_word_id() {
        let word = |id| {
            Some(Word {
                id,
                word: format!("w{id}"),
                mean: format!("m{id}"),
                level: None,
            })
        };
        let rows = vec![
            ReviewRow { words: word(2) },
            ReviewRow { words: word(1) },
            ReviewRow { words: None },
            ReviewRow { words: word(2) },
        ];

        let pool = dedupe_pool(rows);
        let ids: Vec<i64> = pool.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn miss_counts_rank_descending() {
        let rows = vec![
            miss_row("eat", "食べる"),
            miss_row("go", "行く"),
            miss_row("eat", "食べる"),
            miss_row("eat", "食べる"),
        ];

        let ranking = rank_from_rows(rows, 2);
        assert_eq!(
            ranking,
            vec![
                MissEntry {
                    word: "eat".to_string(),
                    mean: "食べる".to_string(),
                    miss_count: 3,
                },
                MissEntry {
                    word: "go".to_string(),
                    mean: "行く".to_string(),
                    miss_count: 1,
                },
            ]
        );
    }

    #[test]
    fn miss_ranking_truncates_to_limit() {
        let rows = vec![
            miss_row("a", "1"),
            miss_row("b", "2"),
            miss_row("c", "3"),
        ];
        assert_eq!(rank_from_rows(rows, 2).len(), 2);
    }

    #[test]
    fn embedded_review_rows_decode() {
        let body = r#"[
            {"word_id": 2, "words": {"id": 2, "word": "eat", "mean": "食べる", "level": 600}},
            {"word_id": 9, "words": null}
        ]"#;
        let rows: Vec<ReviewRow> = serde_json::from_str(body).unwrap();

        let pool = dedupe_pool(rows);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].word, "eat");
        assert_eq!(pool[0].level, Some(600));
    }
}
