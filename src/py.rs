//! Python bindings for the quiz core

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

use crate::db::SqliteStore;
use crate::import;
use crate::questions::{self, Question};
use crate::store::{AttemptStats, MissEntry, QuizMode, StoreError, VocabStore, Word};
use crate::supabase::SupabaseStore;

fn to_py_err(e: StoreError) -> PyErr {
    PyRuntimeError::new_err(e.to_string())
}

fn parse_mode(mode: &str) -> PyResult<QuizMode> {
    mode.parse::<QuizMode>().map_err(to_py_err)
}

fn open(db_path: &str) -> PyResult<SqliteStore> {
    SqliteStore::open(db_path).map_err(to_py_err)
}

fn connect(url: &str, key: &str) -> PyResult<SupabaseStore> {
    SupabaseStore::new(url, key).map_err(to_py_err)
}

#[pymethods]
impl Word {
    fn __repr__(&self) -> String {
        format!("Word(id={}, word='{}')", self.id, self.word)
    }
}

#[pymethods]
impl Question {
    fn __repr__(&self) -> String {
        format!(
            "Question(word='{}', options={})",
            self.word,
            self.options.len()
        )
    }
}

#[pymethods]
impl MissEntry {
    fn __repr__(&self) -> String {
        format!(
            "MissEntry(word='{}', miss_count={})",
            self.word, self.miss_count
        )
    }
}

#[pymethods]
impl AttemptStats {
    fn __repr__(&self) -> String {
        format!(
            "AttemptStats(total={}, correct={}, accuracy={:.1}%)",
            self.total_attempts, self.correct_count, self.accuracy_percent
        )
    }
}

// ============= Local (SQLite) backend =============

#[pyfunction]
fn init_database(db_path: &str) -> PyResult<()> {
    open(db_path).map(|_| ())
}

#[pyfunction]
#[pyo3(name = "seed_corpus")]
fn py_seed_corpus(db_path: &str, file_path: &str) -> PyResult<usize> {
    let store = open(db_path)?;
    import::seed_corpus(&store, file_path).map_err(to_py_err)
}

#[pyfunction]
fn fetch_pool(db_path: &str, mode: &str) -> PyResult<Vec<Word>> {
    open(db_path)?.fetch_pool(parse_mode(mode)?).map_err(to_py_err)
}

#[pyfunction]
fn next_question(db_path: &str, mode: &str) -> PyResult<Option<Question>> {
    let store = open(db_path)?;
    questions::next_question(&store, parse_mode(mode)?).map_err(to_py_err)
}

#[pyfunction]
fn append_record(db_path: &str, word_id: i64, is_correct: bool) -> PyResult<()> {
    open(db_path)?
        .append_record(word_id, is_correct)
        .map_err(to_py_err)
}

#[pyfunction]
fn rank_misses(db_path: &str, limit: usize) -> PyResult<Vec<MissEntry>> {
    open(db_path)?.rank_misses(limit).map_err(to_py_err)
}

#[pyfunction]
fn get_stats(db_path: &str) -> PyResult<AttemptStats> {
    open(db_path)?.stats().map_err(to_py_err)
}

// ============= Remote (Supabase) backend =============

#[pyfunction]
fn supabase_seed_corpus(url: &str, key: &str, file_path: &str) -> PyResult<usize> {
    let store = connect(url, key)?;
    import::seed_corpus(&store, file_path).map_err(to_py_err)
}

#[pyfunction]
fn supabase_fetch_pool(url: &str, key: &str, mode: &str) -> PyResult<Vec<Word>> {
    connect(url, key)?
        .fetch_pool(parse_mode(mode)?)
        .map_err(to_py_err)
}

#[pyfunction]
fn supabase_next_question(url: &str, key: &str, mode: &str) -> PyResult<Option<Question>> {
    let store = connect(url, key)?;
    questions::next_question(&store, parse_mode(mode)?).map_err(to_py_err)
}

#[pyfunction]
fn supabase_append_record(url: &str, key: &str, word_id: i64, is_correct: bool) -> PyResult<()> {
    connect(url, key)?
        .append_record(word_id, is_correct)
        .map_err(to_py_err)
}

#[pyfunction]
fn supabase_rank_misses(url: &str, key: &str, limit: usize) -> PyResult<Vec<MissEntry>> {
    connect(url, key)?.rank_misses(limit).map_err(to_py_err)
}

#[pyfunction]
fn supabase_get_stats(url: &str, key: &str) -> PyResult<AttemptStats> {
    connect(url, key)?.stats().map_err(to_py_err)
}

/// Tango Core Python Module
#[pymodule]
fn tango_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Local backend
    m.add_function(wrap_pyfunction!(init_database, m)?)?;
    m.add_function(wrap_pyfunction!(py_seed_corpus, m)?)?;
    m.add_function(wrap_pyfunction!(fetch_pool, m)?)?;
    m.add_function(wrap_pyfunction!(next_question, m)?)?;
    m.add_function(wrap_pyfunction!(append_record, m)?)?;
    m.add_function(wrap_pyfunction!(rank_misses, m)?)?;
    m.add_function(wrap_pyfunction!(get_stats, m)?)?;

    // Remote backend
    m.add_function(wrap_pyfunction!(supabase_seed_corpus, m)?)?;
    m.add_function(wrap_pyfunction!(supabase_fetch_pool, m)?)?;
    m.add_function(wrap_pyfunction!(supabase_next_question, m)?)?;
    m.add_function(wrap_pyfunction!(supabase_append_record, m)?)?;
    m.add_function(wrap_pyfunction!(supabase_rank_misses, m)?)?;
    m.add_function(wrap_pyfunction!(supabase_get_stats, m)?)?;

    // Register classes
    m.add_class::<Word>()?;
    m.add_class::<Question>()?;
    m.add_class::<MissEntry>()?;
    m.add_class::<AttemptStats>()?;

    Ok(())
}
