//! Eligibility gate
//!
//! Decides whether a document should be processed at all, before any
//! extraction work happens.

use crate::config::IndexingPolicy;
use crate::types::Document;
use tracing::info;

/// Outcome of the eligibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Index,
    /// Document's volume is not in the allow-list
    VolumeExcluded,
    /// Document is larger than the configured ceiling
    TooLarge { size: u64, max: u64 },
}

impl GateDecision {
    pub fn allows(&self) -> bool {
        matches!(self, Self::Index)
    }
}

/// Check a document against the policy.
///
/// Volume exclusion is silent; the size skip is logged.
pub fn check(document: &Document, policy: &IndexingPolicy) -> GateDecision {
    if !policy.index_volumes.contains(&document.volume_id) {
        return GateDecision::VolumeExcluded;
    }

    let max = policy.maximum_document_bytes();
    if document.size > max {
        info!(
            asset_id = %document.id,
            size = document.size,
            maximum_document_size = policy.maximum_document_size,
            "Skipping asset because it exceeds maximum_document_size"
        );
        return GateDecision::TooLarge {
            size: document.size,
            max,
        };
    }

    GateDecision::Index
}

/// Whether the document should be indexed
pub fn should_index(document: &Document, policy: &IndexingPolicy) -> bool {
    check(document, policy).allows()
}
