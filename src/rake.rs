//! RAKE keyword scoring
//!
//! Rapid Automatic Keyword Extraction: text is cut into candidate phrases at
//! punctuation and stop words, each word is scored by degree / frequency over
//! the candidates, and a phrase scores the sum of its words.
//!
//! Stop-word tables come from a [`StopWordSource`]; the bundled one wraps the
//! `stop-words` crate.

use crate::types::ScoredKeyword;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use stop_words::LANGUAGE;

/// A language's stop words, lower-cased
pub type StopWordSet = Arc<HashSet<String>>;

/// Provides stop-word tables by ISO 639-1 code
pub trait StopWordSource: Send + Sync {
    /// Stop words for `language`, or None if the language is unknown
    fn stop_words(&self, language: &str) -> Option<StopWordSet>;
}

/// Languages the bundled tables cover
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "da", "de", "en", "es", "fi", "fr", "it", "nl", "no", "pt", "ru", "sv",
];

fn bundled_language(code: &str) -> Option<LANGUAGE> {
    let language = match code {
        "da" => LANGUAGE::Danish,
        "de" => LANGUAGE::German,
        "en" => LANGUAGE::English,
        "es" => LANGUAGE::Spanish,
        "fi" => LANGUAGE::Finnish,
        "fr" => LANGUAGE::French,
        "it" => LANGUAGE::Italian,
        "nl" => LANGUAGE::Dutch,
        "no" | "nb" | "nn" => LANGUAGE::Norwegian,
        "pt" => LANGUAGE::Portuguese,
        "ru" => LANGUAGE::Russian,
        "sv" => LANGUAGE::Swedish,
        _ => return None,
    };
    Some(language)
}

/// Stop words from the `stop-words` crate, cached per language
#[derive(Default)]
pub struct BundledStopWords {
    cache: Mutex<HashMap<String, StopWordSet>>,
}

impl BundledStopWords {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StopWordSource for BundledStopWords {
    fn stop_words(&self, language: &str) -> Option<StopWordSet> {
        let language = language.to_lowercase();
        let bundled = bundled_language(&language)?;

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        let set = cache.entry(language).or_insert_with(|| {
            Arc::new(
                stop_words::get(bundled)
                    .into_iter()
                    .map(|w| w.to_string().to_lowercase())
                    .collect(),
            )
        });
        Some(Arc::clone(set))
    }
}

/// Characters and sequences that end a sentence fragment
static FRAGMENT_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.!?,;:\t"“”()\[\]{}<>|/\\\u{2013}\u{2014}]|\s-\s|\n\s*\n"#)
        .expect("fragment pattern is valid")
});

/// RAKE scorer bound to one stop-word table
#[derive(Debug, Clone)]
pub struct Rake {
    stop_words: StopWordSet,
}

impl Rake {
    pub fn new(stop_words: StopWordSet) -> Self {
        Self { stop_words }
    }

    /// Score every candidate phrase of at most `max_words` words.
    ///
    /// Results are ordered by descending score; equal scores keep the order
    /// in which the phrases first appear in the text.
    pub fn run(&self, text: &str, max_words: usize) -> Vec<ScoredKeyword> {
        if max_words == 0 || text.trim().is_empty() {
            return Vec::new();
        }

        let candidates = self.candidate_phrases(text, max_words);
        if candidates.is_empty() {
            return Vec::new();
        }

        let word_scores = word_scores(&candidates);

        let mut phrases: IndexMap<String, f64> = IndexMap::new();
        for words in &candidates {
            let phrase = words.join(" ");
            if phrases.contains_key(&phrase) {
                continue;
            }
            let score = words
                .iter()
                .map(|w| word_scores.get(w.as_str()).copied().unwrap_or(0.0))
                .sum();
            phrases.insert(phrase, score);
        }

        let mut scored: Vec<ScoredKeyword> = phrases
            .into_iter()
            .map(|(phrase, score)| ScoredKeyword { phrase, score })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    /// Split text into candidate phrases, dropping those longer than `max_words`
    fn candidate_phrases(&self, text: &str, max_words: usize) -> Vec<Vec<String>> {
        let mut candidates = Vec::new();

        for fragment in FRAGMENT_SPLIT.split(text) {
            let mut current: Vec<String> = Vec::new();

            for token in fragment.split_whitespace() {
                match self.normalize(token) {
                    Some(word) => current.push(word),
                    None => flush(&mut current, &mut candidates, max_words),
                }
            }
            flush(&mut current, &mut candidates, max_words);
        }

        candidates
    }

    /// Lower-case a token and trim surrounding punctuation. None means the
    /// token breaks a phrase (stop word, number, stray symbol).
    fn normalize(&self, token: &str) -> Option<String> {
        let word = token
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();

        if word.chars().count() < 2 {
            return None;
        }
        if !word.chars().any(char::is_alphabetic) {
            return None;
        }
        if self.stop_words.contains(&word) {
            return None;
        }
        Some(word)
    }
}

fn flush(current: &mut Vec<String>, candidates: &mut Vec<Vec<String>>, max_words: usize) {
    if current.is_empty() {
        return;
    }
    let phrase = std::mem::take(current);
    if phrase.len() <= max_words {
        candidates.push(phrase);
    }
}

/// degree(w) / frequency(w) for every word in the candidates
fn word_scores(candidates: &[Vec<String>]) -> HashMap<&str, f64> {
    let mut frequency: HashMap<&str, usize> = HashMap::new();
    let mut degree: HashMap<&str, usize> = HashMap::new();

    for words in candidates {
        for word in words {
            *frequency.entry(word.as_str()).or_default() += 1;
            *degree.entry(word.as_str()).or_default() += words.len();
        }
    }

    frequency
        .into_iter()
        .map(|(word, freq)| {
            let deg = degree.get(word).copied().unwrap_or(0);
            (word, deg as f64 / freq as f64)
        })
        .collect()
}
