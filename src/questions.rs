//! Four-option question composition

use std::collections::HashSet;

use rand::seq::SliceRandom;

use crate::store::{QuizMode, Result, VocabStore, Word};

#[cfg(feature = "python")]
use pyo3::pyclass;

/// One multiple-choice question. Transient; never persisted.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Debug, Clone)]
pub struct Question {
    pub word_id: i64,
    pub word: String,
    pub answer: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// Compose one question from the given pool.
///
/// Picks the correct word uniformly at random, then samples up to three
/// distinct distractor meanings from `all_meanings` with every occurrence
/// of the correct meaning removed. With fewer than three distinct
/// distractors the question forms with fewer options. Returns `None` for
/// an empty pool.
pub fn compose_question(pool: &[Word], all_meanings: &[String]) -> Option<Question> {
    let mut rng = rand::thread_rng();
    let target = pool.choose(&mut rng)?;

    let mut seen = HashSet::new();
    let universe: Vec<&String> = all_meanings
        .iter()
        .filter(|m| m.as_str() != target.mean && seen.insert(m.as_str()))
        .collect();

    let mut options: Vec<String> = universe
        .choose_multiple(&mut rng, 3)
        .map(|m| (*m).clone())
        .collect();
    options.push(target.mean.clone());
    options.shuffle(&mut rng);

    let correct_index = options.iter().position(|o| *o == target.mean)?;

    Some(Question {
        word_id: target.id,
        word: target.word.clone(),
        answer: target.mean.clone(),
        options,
        correct_index,
    })
}

/// Fetch the pool and meaning universe for `mode` and compose a question.
///
/// `Ok(None)` is the "nothing to quiz" state: an empty corpus in ALL mode
/// or no missed words in REVIEW mode.
pub fn next_question(store: &dyn VocabStore, mode: QuizMode) -> Result<Option<Question>> {
    let pool = store.fetch_pool(mode)?;
    let meanings = store.fetch_all_meanings()?;
    Ok(compose_question(&pool, &meanings))
}
