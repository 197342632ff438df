//! Batch processing
//!
//! Runs many documents through one pipeline. A document that cannot be
//! processed is recorded as skipped; only a configuration error stops the
//! batch.

use super::{KeywordPipeline, Outcome, ProgressTracker};
use crate::error::Result;
use crate::types::Document;
use serde::Serialize;
use tracing::{info, warn};

/// Outcome for one document of a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub id: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Outcomes for every document of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Documents that produced indexable text
    pub fn indexed(&self) -> usize {
        self.entries.iter().filter(|e| !e.outcome.is_skipped()).count()
    }

    pub fn skipped(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_skipped()).count()
    }
}

impl KeywordPipeline {
    /// Process documents one after another
    pub async fn run_batch(
        &self,
        documents: &[Document],
        progress: &mut ProgressTracker,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for document in documents {
            let outcome = match self.process(document).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    progress.complete();
                    warn!(
                        asset_id = %document.id,
                        processed = report.len(),
                        error = %e,
                        "Batch stopped"
                    );
                    return Err(e);
                }
            };
            progress.record(&document.id, &outcome);
            report.entries.push(BatchEntry {
                id: document.id.clone(),
                outcome,
            });
        }

        progress.complete();
        info!(
            total = report.len(),
            indexed = report.indexed(),
            skipped = report.skipped(),
            "Batch finished"
        );
        Ok(report)
    }
}
