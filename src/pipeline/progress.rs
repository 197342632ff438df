//! Progress tracker for batch keyword extraction
//!
//! Counts outcomes as documents go through the pipeline and prints a short
//! summary to stderr.

use super::Outcome;
use std::io::{self, Write};

/// Tracks and displays progress during a batch run
pub struct ProgressTracker {
    /// Total number of documents to process
    total_docs: usize,
    /// Number of documents processed
    processed_docs: usize,
    /// Documents stored as raw text
    raw_docs: usize,
    /// Documents reduced to keywords
    keyword_docs: usize,
    /// Documents skipped (gate, no text)
    skipped_docs: usize,
    /// Whether to show output (false for tests/quiet mode)
    show_output: bool,
    /// Set once the run has ended, successfully or not
    finished: bool,
}

impl ProgressTracker {
    /// Create a new progress tracker
    pub fn new(total_docs: usize) -> Self {
        Self {
            total_docs,
            processed_docs: 0,
            raw_docs: 0,
            keyword_docs: 0,
            skipped_docs: 0,
            show_output: true,
            finished: false,
        }
    }

    /// Create a quiet progress tracker (no output)
    pub fn quiet(total_docs: usize) -> Self {
        Self {
            show_output: false,
            ..Self::new(total_docs)
        }
    }

    /// Record the outcome of one document
    pub fn record(&mut self, id: &str, outcome: &Outcome) {
        self.processed_docs += 1;
        match outcome {
            Outcome::Raw { .. } => self.raw_docs += 1,
            Outcome::Keywords { .. } => self.keyword_docs += 1,
            Outcome::Skipped(_) => self.skipped_docs += 1,
        }

        if self.show_output {
            eprint!("\r  [{}/{}] {}", self.processed_docs, self.total_docs, id);
            let _ = io::stderr().flush();
        }
    }

    /// Get the number of processed documents
    pub fn docs_processed(&self) -> usize {
        self.processed_docs
    }

    pub fn raw(&self) -> usize {
        self.raw_docs
    }

    pub fn keywords(&self) -> usize {
        self.keyword_docs
    }

    pub fn skipped(&self) -> usize {
        self.skipped_docs
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Display final completion message
    pub fn complete(&mut self) {
        self.finished = true;
        if self.show_output {
            eprintln!();
            eprintln!(
                "  Completed: {} docs ({} raw, {} keywords, {} skipped)",
                self.processed_docs, self.raw_docs, self.keyword_docs, self.skipped_docs
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SkipReason;

    #[test]
    fn test_progress_tracker() {
        let mut tracker = ProgressTracker::quiet(3);

        tracker.record("a", &Outcome::Raw { text: "x".to_string() });
        tracker.record("b", &Outcome::Skipped(SkipReason::NoText));
        tracker.record(
            "c",
            &Outcome::Keywords {
                text: "alpha".to_string(),
                count: 1,
                language: "en".to_string(),
            },
        );

        assert_eq!(tracker.docs_processed(), 3);
        assert_eq!(tracker.raw(), 1);
        assert_eq!(tracker.skipped(), 1);
        assert_eq!(tracker.keywords(), 1);
        assert!(!tracker.is_finished());

        tracker.complete();
        assert!(tracker.is_finished());
    }
}
