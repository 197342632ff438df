//! Keyword reducer
//!
//! Runs RAKE at n-gram widths 1, 2 and 3 over the same text and merges the
//! three rankings into one ordered keyword set. When the combined candidate
//! count is large, only the top of each ranking is kept.

use crate::config::{KeywordConfig, MergeStrategy};
use crate::rake::{BundledStopWords, Rake, StopWordSource};
use crate::types::ScoredKeyword;
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Maximum phrase lengths scored, in merge priority order
pub const NGRAM_WIDTHS: [usize; 3] = [1, 2, 3];

/// Above this many candidates (summed over all widths) each ranking is cut
pub const OVERFLOW_THRESHOLD: usize = 100;

/// Entries kept from each ranking when over the threshold
pub const PER_WIDTH_LIMIT: usize = 30;

/// A merged keyword and the pass it came from
#[derive(Debug, Clone, PartialEq)]
pub struct MergedKeyword {
    pub score: f64,
    /// n-gram width of the pass that supplied this entry
    pub width: usize,
}

/// Result of reducing one text
#[derive(Debug, Clone)]
pub struct Reduction {
    /// Language whose stop words were actually used
    pub language: String,
    /// Candidates summed over the three passes, before truncation
    pub candidate_count: usize,
    /// Whether the per-width limit was applied
    pub truncated: bool,
    pub keywords: IndexMap<String, MergedKeyword>,
}

impl Reduction {
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Phrases in merge order
    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.keywords.keys().map(String::as_str)
    }

    /// Leading phrases whose space-joined length stays within `capacity`
    /// characters
    pub fn bounded_phrases(&self, capacity: usize) -> Vec<&str> {
        fit_within(self.phrases(), capacity)
    }
}

/// Reduces text to RAKE keywords with a language-aware stop-word table
pub struct KeywordReducer {
    stop_words: Arc<dyn StopWordSource>,
    fallback_language: String,
    strategy: MergeStrategy,
}

impl KeywordReducer {
    pub fn new(
        stop_words: Arc<dyn StopWordSource>,
        fallback_language: impl Into<String>,
        strategy: MergeStrategy,
    ) -> Self {
        Self {
            stop_words,
            fallback_language: fallback_language.into(),
            strategy,
        }
    }

    /// Reducer with the bundled stop-word tables
    pub fn from_config(config: &KeywordConfig) -> Self {
        Self::new(
            Arc::new(BundledStopWords::new()),
            config.fallback_language.clone(),
            config.merge_strategy,
        )
    }

    /// Build the scorer for `language`, falling back when it has no table.
    ///
    /// Returns the scorer and the language actually used.
    fn rake_for(&self, language: &str) -> (Rake, String) {
        if let Some(set) = self.stop_words.stop_words(language) {
            return (Rake::new(set), language.to_string());
        }

        if let Some(set) = self.stop_words.stop_words(&self.fallback_language) {
            warn!(
                language,
                fallback = %self.fallback_language,
                "No stop words for language, using fallback"
            );
            return (Rake::new(set), self.fallback_language.clone());
        }

        warn!(
            language,
            fallback = %self.fallback_language,
            "No stop words for language or fallback, scoring without stop words"
        );
        (Rake::new(Arc::new(HashSet::new())), language.to_string())
    }

    /// Score, truncate and merge
    pub fn reduce(&self, text: &str, language: &str) -> Reduction {
        let (rake, used_language) = self.rake_for(language);
        let passes = score_widths(&rake, text);

        let candidate_count: usize = passes.iter().map(|(_, ranked)| ranked.len()).sum();
        let truncated = candidate_count > OVERFLOW_THRESHOLD;
        let limit = truncated.then_some(PER_WIDTH_LIMIT);

        Reduction {
            language: used_language,
            candidate_count,
            truncated,
            keywords: merge(&passes, limit, self.strategy),
        }
    }
}

/// Rankings for each width in [`NGRAM_WIDTHS`]
fn score_widths(rake: &Rake, text: &str) -> Vec<(usize, Vec<ScoredKeyword>)> {
    NGRAM_WIDTHS
        .iter()
        .map(|&width| (width, rake.run(text, width)))
        .collect()
}

/// Merge rankings in the order given, taking at most `limit` entries from each.
///
/// A phrase already present keeps its position; with
/// [`MergeStrategy::FirstWins`] the later entry is dropped, with
/// [`MergeStrategy::HighestScore`] the higher score (and its width) is kept.
pub fn merge(
    passes: &[(usize, Vec<ScoredKeyword>)],
    limit: Option<usize>,
    strategy: MergeStrategy,
) -> IndexMap<String, MergedKeyword> {
    let mut merged: IndexMap<String, MergedKeyword> = IndexMap::new();

    for (width, ranked) in passes {
        let take = limit.unwrap_or(ranked.len());
        for keyword in ranked.iter().take(take) {
            let incoming = MergedKeyword {
                score: keyword.score,
                width: *width,
            };
            match merged.entry(keyword.phrase.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(incoming);
                }
                Entry::Occupied(mut slot) => {
                    let higher = incoming.score > slot.get().score;
                    if strategy == MergeStrategy::HighestScore && higher {
                        slot.insert(incoming);
                    }
                }
            }
        }
    }

    merged
}

/// Longest prefix of `phrases` that joins to at most `capacity` characters
pub fn fit_within<'a>(phrases: impl Iterator<Item = &'a str>, capacity: usize) -> Vec<&'a str> {
    let mut kept = Vec::new();
    let mut used = 0usize;

    for phrase in phrases {
        let len = phrase.chars().count();
        let needed = if kept.is_empty() { len } else { len + 1 };
        if used + needed > capacity {
            break;
        }
        kept.push(phrase);
        used += needed;
    }

    kept
}
