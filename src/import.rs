//! Corpus bootstrap - one-time seeding from a CSV or Excel file

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use csv::ReaderBuilder;
use log::info;

use crate::store::{NewWord, Result, StoreError, VocabStore};

/// Rows per insert batch.
const BATCH_SIZE: usize = 500;

/// Column index mapping detected from the header row.
#[derive(Debug, Clone)]
struct ColumnMapping {
    word: usize,
    mean: usize,
    level: Option<usize>,
}

fn detect_columns(headers: &[String]) -> Result<ColumnMapping> {
    let mut word = None;
    let mut mean = None;
    let mut level = None;

    for (i, header) in headers.iter().enumerate() {
        match header.to_lowercase().trim() {
            "word" | "words" => word = Some(i),
            "mean" | "meaning" | "meanings" => mean = Some(i),
            "level" => level = Some(i),
            _ => {} // id and unknown columns ignored
        }
    }

    match (word, mean) {
        (Some(word), Some(mean)) => Ok(ColumnMapping { word, mean, level }),
        (None, _) => Err(StoreError::Import(
            "missing required 'word' column in header".to_string(),
        )),
        (_, None) => Err(StoreError::Import(
            "missing required 'mean' column in header".to_string(),
        )),
    }
}

/// Seed the store from a corpus file, once.
///
/// A non-empty store is left untouched and the call returns 0. Rows are
/// inserted in bounded batches.
pub fn seed_corpus(store: &dyn VocabStore, file_path: &str) -> Result<usize> {
    if store.word_count()? > 0 {
        return Ok(0);
    }

    let words = parse_corpus(file_path)?;
    let mut inserted = 0;
    for batch in words.chunks(BATCH_SIZE) {
        inserted += store.insert_words(batch)?;
    }

    info!("seeded {inserted} words from {file_path}");
    Ok(inserted)
}

/// Parse a corpus file, dispatching on the extension.
pub fn parse_corpus(file_path: &str) -> Result<Vec<NewWord>> {
    let extension = Path::new(file_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => parse_csv(file_path),
        "xlsx" | "xls" => parse_excel(file_path),
        _ => Err(StoreError::Import(format!(
            "unsupported corpus format: .{extension}"
        ))),
    }
}

fn parse_csv(file_path: &str) -> Result<Vec<NewWord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(file_path)
        .map_err(|e| StoreError::Import(format!("failed to open CSV file: {e}")))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| StoreError::Import(format!("failed to read CSV header: {e}")))?
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mapping = detect_columns(&headers)?;

    let mut words = Vec::new();
    for result in reader.records() {
        let record =
            result.map_err(|e| StoreError::Import(format!("failed to read CSV row: {e}")))?;

        let word = record.get(mapping.word).unwrap_or("").trim().to_string();
        let mean = record.get(mapping.mean).unwrap_or("").trim().to_string();
        let level = mapping
            .level
            .and_then(|i| record.get(i))
            .and_then(|v| v.trim().parse::<i64>().ok());

        if !word.is_empty() {
            words.push(NewWord { word, mean, level });
        }
    }

    Ok(words)
}

fn parse_excel(file_path: &str) -> Result<Vec<NewWord>> {
    let mut workbook: Xlsx<_> = open_workbook(file_path)
        .map_err(|e| StoreError::Import(format!("failed to open Excel file: {e}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .ok_or_else(|| StoreError::Import("no sheets found in Excel file".to_string()))?
        .clone();

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| StoreError::Import(format!("failed to read sheet: {e}")))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| StoreError::Import("empty file - no header row".to_string()))?;
    let headers: Vec<String> = header_row.iter().map(cell_string).collect();
    let mapping = detect_columns(&headers)?;

    let mut words = Vec::new();
    for row in rows {
        let word = row.get(mapping.word).map(cell_string).unwrap_or_default();
        let mean = row.get(mapping.mean).map(cell_string).unwrap_or_default();
        let level = mapping.level.and_then(|i| row.get(i)).and_then(cell_level);

        if !word.is_empty() {
            words.push(NewWord { word, mean, level });
        }
    }

    Ok(words)
}

/// Extract a trimmed string from an Excel cell.
fn cell_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

fn cell_level(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        Data::Float(f) => Some(*f as i64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::store::QuizMode;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_corpus(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn csv_rows_map_to_words() {
        let dir = tempdir().unwrap();
        let path = write_corpus(
            dir.path(),
            "corpus.csv",
            "id,word,mean,level\n1,run,走る,600\n2,eat,食べる,\n,go,行く,600\n",
        );

        let words = parse_corpus(path.to_str().unwrap()).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(words[0].word, "run");
        assert_eq!(words[0].mean, "走る");
        assert_eq!(words[0].level, Some(600));
        assert_eq!(words[1].level, None);
        assert_eq!(words[2].word, "go");
    }

    #[test]
    fn rows_without_a_term_are_skipped() {
        let dir = tempdir().unwrap();
        let path = write_corpus(
            dir.path(),
            "corpus.csv",
            "word,mean\nrun,走る\n,orphan meaning\n  ,another\n",
        );

        let words = parse_corpus(path.to_str().unwrap()).unwrap();
        assert_eq!(words.len(), 1);
    }

    #[test]
    fn meaning_header_alias_is_accepted() {
        let dir = tempdir().unwrap();
        let path = write_corpus(dir.path(), "corpus.csv", "Word,Meaning\nrun,走る\n");

        let words = parse_corpus(path.to_str().unwrap()).unwrap();
        assert_eq!(words[0].mean, "走る");
    }

    #[test]
    fn missing_mean_column_is_an_error() {
        let dir = tempdir().unwrap();
        let path = write_corpus(dir.path(), "corpus.csv", "word,level\nrun,600\n");

        let err = parse_corpus(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, StoreError::Import(_)));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = parse_corpus("corpus.txt").unwrap_err();
        assert!(matches!(err, StoreError::Import(_)));
    }

    #[test]
    fn seeding_fills_an_empty_store() {
        let dir = tempdir().unwrap();
        let path = write_corpus(
            dir.path(),
            "corpus.csv",
            "word,mean\nrun,走る\neat,食べる\n",
        );
        let store = SqliteStore::open_in_memory().unwrap();

        let inserted = seed_corpus(&store, path.to_str().unwrap()).unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(store.fetch_pool(QuizMode::All).unwrap().len(), 2);
    }

    #[test]
    fn seeding_twice_does_not_duplicate_rows() {
        let dir = tempdir().unwrap();
        let path = write_corpus(
            dir.path(),
            "corpus.csv",
            "word,mean\nrun,走る\neat,食べる\n",
        );
        let store = SqliteStore::open_in_memory().unwrap();

        seed_corpus(&store, path.to_str().unwrap()).unwrap();
        let second = seed_corpus(&store, path.to_str().unwrap()).unwrap();

        assert_eq!(second, 0);
        assert_eq!(store.word_count().unwrap(), 2);
    }
}
