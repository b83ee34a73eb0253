//! Embedded SQLite backend

use std::path::Path;

use log::debug;
use rusqlite::{params, Connection};

use crate::store::{AttemptStats, MissEntry, NewWord, QuizMode, Result, VocabStore, Word};

/// Local file-backed store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS words (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            word TEXT NOT NULL,
            mean TEXT NOT NULL,
            level INTEGER,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            word_id INTEGER REFERENCES words(id),
            is_correct INTEGER NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

fn word_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Word> {
    Ok(Word {
        id: row.get(0)?,
        word: row.get(1)?,
        mean: row.get(2)?,
        level: row.get(3)?,
    })
}

impl VocabStore for SqliteStore {
    fn fetch_pool(&self, mode: QuizMode) -> Result<Vec<Word>> {
        let sql = match mode {
            QuizMode::All => "SELECT id, word, mean, level FROM words",
            QuizMode::Review => {
                "SELECT DISTINCT w.id, w.word, w.mean, w.level
                 FROM words w
                 JOIN records r ON r.word_id = w.id
                 WHERE r.is_correct = 0"
            }
        };

        let mut stmt = self.conn.prepare(sql)?;
        let words = stmt
            .query_map([], word_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!("fetched pool of {} words ({:?})", words.len(), mode);
        Ok(words)
    }

    fn fetch_all_meanings(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT mean FROM words")?;
        let meanings = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(meanings)
    }

    fn append_record(&self, word_id: i64, is_correct: bool) -> Result<()> {
        self.conn.execute(
            "INSERT INTO records (word_id, is_correct) VALUES (?1, ?2)",
            params![word_id, is_correct as i32],
        )?;
        Ok(())
    }

    fn rank_misses(&self, limit: usize) -> Result<Vec<MissEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT w.word, w.mean, COUNT(*) AS miss_count
             FROM words w
             JOIN records r ON r.word_id = w.id
             WHERE r.is_correct = 0
             GROUP BY w.id
             ORDER BY miss_count DESC
             LIMIT ?1",
        )?;

        let entries = stmt
            .query_map(params![limit as i64], |row| {
                Ok(MissEntry {
                    word: row.get(0)?,
                    mean: row.get(1)?,
                    miss_count: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn word_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))?;
        Ok(count)
    }

    fn insert_words(&self, words: &[NewWord]) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare("INSERT INTO words (word, mean, level) VALUES (?1, ?2, ?3)")?;
        for w in words {
            stmt.execute(params![w.word, w.mean, w.level])?;
        }
        Ok(words.len())
    }

    fn stats(&self) -> Result<AttemptStats> {
        let stats = self
            .conn
            .query_row("SELECT COUNT(*), SUM(is_correct) FROM records", [], |row| {
                let total: i64 = row.get(0)?;
                let correct: i64 = row.get::<_, Option<i64>>(1)?.unwrap_or(0);
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
            })?;
        Ok(stats)
    }
}
