//! Tango Core - Rust core for a single-user four-option vocabulary quiz
//!
//! Provides the word/record storage backends (embedded SQLite and hosted
//! Supabase), question composition, corpus import, and the mistake ranking.

mod db;
mod import;
#[cfg(feature = "python")]
mod py;
mod questions;
mod store;
mod supabase;

pub use db::SqliteStore;
pub use import::{parse_corpus, seed_corpus};
pub use questions::{compose_question, next_question, Question};
pub use store::{
    AttemptStats, MissEntry, NewWord, QuizMode, Result, StoreError, VocabStore, Word,
};
pub use supabase::SupabaseStore;
