//! Keyword pipeline
//!
//! Sequences the eligibility gate, text extraction, language detection, the
//! storage-capacity check and keyword reduction for one document:
//!
//! ```text
//! gate -> extract -> (no text: skip) -> capacity -> raw text | reduce
//! ```
//!
//! Only configuration problems are returned as errors; every per-document
//! failure ends in a skip.

mod batch;
mod progress;

pub use batch::{BatchEntry, BatchReport};
pub use progress::ProgressTracker;

use crate::capacity::CapacityPolicy;
use crate::config::{Config, IndexingPolicy};
use crate::error::{Error, Result};
use crate::extract::{local_copy, ExtractionBackend, PdfToText};
use crate::gate::{self, GateDecision};
use crate::language::detect_language;
use crate::reducer::KeywordReducer;
use crate::types::{Document, KeywordResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a document produced no keywords
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Volume not in the allow-list
    VolumeExcluded,
    /// Larger than the size ceiling
    TooLarge { size: u64, max: u64 },
    /// Unsupported kind, failed extraction or nothing left after reduction
    NoText,
}

/// What the pipeline did with one document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Skipped(SkipReason),
    /// Text fit the destination and is stored verbatim
    Raw { text: String },
    /// Text was reduced to keywords
    Keywords {
        text: String,
        count: usize,
        language: String,
    },
}

impl Outcome {
    /// The string handed to the search index, if any
    pub fn keywords(&self) -> Option<&str> {
        match self {
            Self::Skipped(_) => None,
            Self::Raw { text } | Self::Keywords { text, .. } => Some(text),
        }
    }

    pub fn into_keywords(self) -> KeywordResult {
        match self {
            Self::Skipped(_) => None,
            Self::Raw { text } | Self::Keywords { text, .. } => Some(text),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Turns documents into indexable keyword strings
pub struct KeywordPipeline {
    policy: IndexingPolicy,
    backend: Arc<dyn ExtractionBackend>,
    reducer: KeywordReducer,
    capacity: CapacityPolicy,
}

impl KeywordPipeline {
    pub fn new(
        policy: IndexingPolicy,
        backend: Arc<dyn ExtractionBackend>,
        reducer: KeywordReducer,
        capacity: CapacityPolicy,
    ) -> Self {
        Self {
            policy,
            backend,
            reducer,
            capacity,
        }
    }

    /// Build the pipeline with the `pdftotext` backend.
    ///
    /// Fails with [`Error::Config`] when the executable or working directory
    /// cannot be resolved.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let backend = PdfToText::from_policy(&config.policy)?;
        Ok(Self::new(
            config.policy.clone(),
            Arc::new(backend),
            KeywordReducer::from_config(&config.keywords),
            CapacityPolicy::from_config(&config.storage),
        ))
    }

    pub fn policy(&self) -> &IndexingPolicy {
        &self.policy
    }

    pub fn capacity(&self) -> &CapacityPolicy {
        &self.capacity
    }

    /// Keyword string for a document, or None when it is skipped
    pub async fn get_keywords(&self, document: &Document) -> Result<KeywordResult> {
        Ok(self.process(document).await?.into_keywords())
    }

    /// Run one document through the pipeline
    pub async fn process(&self, document: &Document) -> Result<Outcome> {
        match gate::check(document, &self.policy) {
            GateDecision::Index => {}
            GateDecision::VolumeExcluded => {
                return Ok(Outcome::Skipped(SkipReason::VolumeExcluded));
            }
            GateDecision::TooLarge { size, max } => {
                return Ok(Outcome::Skipped(SkipReason::TooLarge { size, max }));
            }
        }

        let Some(text) = self.extract(document).await? else {
            info!(asset_id = %document.id, "No text found");
            return Ok(Outcome::Skipped(SkipReason::NoText));
        };

        let language = detect_language(document);

        if self.capacity.fits(&text) {
            debug!(
                asset_id = %document.id,
                chars = text.chars().count(),
                capacity = self.capacity.capacity(),
                "Text fits destination, storing verbatim"
            );
            return Ok(Outcome::Raw { text });
        }

        let reduction = self.reducer.reduce(&text, &language);
        let kept = reduction.bounded_phrases(self.capacity.capacity());
        if kept.is_empty() {
            info!(asset_id = %document.id, "No text found");
            return Ok(Outcome::Skipped(SkipReason::NoText));
        }

        let count = kept.len();
        let keywords = kept.join(" ");
        info!(
            asset_id = %document.id,
            count,
            language = %reduction.language,
            truncated = reduction.truncated,
            "Extracted keywords"
        );

        Ok(Outcome::Keywords {
            text: keywords,
            count,
            language: reduction.language,
        })
    }

    /// Extract text, folding every per-document failure into `None`
    async fn extract(&self, document: &Document) -> Result<Option<String>> {
        if !self.backend.supports(document.kind) {
            debug!(
                asset_id = %document.id,
                kind = document.kind.name(),
                "No extraction backend for kind"
            );
            return Ok(None);
        }

        let local = match local_copy(&document.source, document.kind) {
            Ok(local) => local,
            Err(e) => {
                warn!(
                    asset_id = %document.id,
                    error = %e,
                    "Could not get a local copy of the document"
                );
                return Ok(None);
            }
        };

        match self.backend.extract_text(local.path()).await {
            Ok(text) if text.trim().is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(e) if e.is_config() => Err(Error::Config(e.to_string())),
            Err(e) => {
                warn!(
                    asset_id = %document.id,
                    backend = self.backend.name(),
                    error = %e,
                    "Extraction failed"
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeywordConfig, MergeStrategy, StorageEngine};
    use crate::error::ExtractError;
    use crate::rake::{BundledStopWords, StopWordSet, StopWordSource};
    use crate::types::AssetKind;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ABSTRACT: &str = "Criteria of compatibility of a system of linear Diophantine \
        equations, strict inequations, and nonstrict inequations are considered. Upper \
        bounds for components of a minimal set of solutions and algorithms of construction \
        of minimal generating sets of solutions for all types of systems are given.";

    enum Reply {
        Text(String),
        Fail,
        Misconfigured,
    }

    struct FakeBackend {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl FakeBackend {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExtractionBackend for FakeBackend {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn supports(&self, kind: AssetKind) -> bool {
            kind == AssetKind::Pdf
        }

        async fn extract_text(&self, path: &Path) -> std::result::Result<String, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(path.exists(), "backend must receive a readable local file");
            match &self.reply {
                Reply::Text(text) => Ok(text.clone()),
                Reply::Fail => Err(ExtractError::Timeout { secs: 30 }),
                Reply::Misconfigured => Err(ExtractError::Misconfigured("no workdir".to_string())),
            }
        }
    }

    /// Counts stop-word lookups, i.e. reducer invocations
    #[derive(Default)]
    struct CountingStopWords {
        inner: BundledStopWords,
        lookups: AtomicUsize,
    }

    impl StopWordSource for CountingStopWords {
        fn stop_words(&self, language: &str) -> Option<StopWordSet> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.stop_words(language)
        }
    }

    fn policy() -> IndexingPolicy {
        IndexingPolicy {
            index_volumes: vec![1, 2, 3],
            maximum_document_size: 64,
            ..IndexingPolicy::default()
        }
    }

    fn pipeline(backend: Arc<FakeBackend>, capacity: usize) -> KeywordPipeline {
        KeywordPipeline::new(
            policy(),
            backend,
            KeywordReducer::from_config(&KeywordConfig::default()),
            CapacityPolicy::with_capacity(StorageEngine::Mysql, capacity),
        )
    }

    fn pdf(volume_id: u32) -> Document {
        Document::from_bytes("asset-1", volume_id, AssetKind::Pdf, b"%PDF-1.4".to_vec())
            .with_locale("en-US")
    }

    #[tokio::test]
    async fn test_excluded_volume_never_extracts() {
        let backend = FakeBackend::new(Reply::Text(ABSTRACT.to_string()));
        let pipeline = pipeline(backend.clone(), 65_535);

        let outcome = pipeline.process(&pdf(7)).await.unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::VolumeExcluded));
        assert_eq!(pipeline.get_keywords(&pdf(7)).await.unwrap(), None);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_oversized_document_never_extracts() {
        let backend = FakeBackend::new(Reply::Text(ABSTRACT.to_string()));
        let pipeline = pipeline(backend.clone(), 65_535);
        let doc = Document::from_bytes("big", 1, AssetKind::Pdf, vec![0u8; 64 * 1024 + 1]);

        let outcome = pipeline.process(&doc).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Skipped(SkipReason::TooLarge {
                size: 64 * 1024 + 1,
                max: 64 * 1024
            })
        );
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_pdf_has_no_text() {
        let backend = FakeBackend::new(Reply::Text(ABSTRACT.to_string()));
        let pipeline = pipeline(backend.clone(), 65_535);
        let doc = Document::from_bytes("img", 1, AssetKind::Image, vec![1, 2, 3]);

        assert_eq!(pipeline.get_keywords(&doc).await.unwrap(), None);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_text_is_null() {
        let backend = FakeBackend::new(Reply::Text(String::new()));
        let pipeline = pipeline(backend.clone(), 65_535);

        let outcome = pipeline.process(&pdf(1)).await.unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::NoText));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_extraction_failure_is_not_fatal() {
        let backend = FakeBackend::new(Reply::Fail);
        let pipeline = pipeline(backend, 65_535);

        assert_eq!(pipeline.get_keywords(&pdf(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_misconfigured_backend_is_fatal() {
        let backend = FakeBackend::new(Reply::Misconfigured);
        let pipeline = pipeline(backend, 65_535);

        let err = pipeline.get_keywords(&pdf(1)).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_small_text_is_stored_verbatim_without_reduction() {
        let text = "plain words in a short document\n".repeat(160);
        assert!(text.len() >= 5 * 1024);

        let stop_words = Arc::new(CountingStopWords::default());
        let pipeline = KeywordPipeline::new(
            policy(),
            FakeBackend::new(Reply::Text(text.clone())),
            KeywordReducer::new(stop_words.clone(), "en", MergeStrategy::FirstWins),
            CapacityPolicy::new(StorageEngine::Mysql),
        );

        assert_eq!(pipeline.get_keywords(&pdf(2)).await.unwrap(), Some(text));
        assert_eq!(stop_words.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_large_text_is_reduced_within_capacity() {
        let capacity = 120;
        let backend = FakeBackend::new(Reply::Text(ABSTRACT.to_string()));
        let pipeline = pipeline(backend, capacity);

        let outcome = pipeline.process(&pdf(3)).await.unwrap();
        match &outcome {
            Outcome::Keywords { text, count, language } => {
                assert!(text.chars().count() <= capacity);
                assert_ne!(text, ABSTRACT);
                assert!(!text.contains('\n'));
                assert!(*count > 0 && *count <= 100);
                assert_eq!(language, "en");
            }
            other => panic!("expected keywords, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reduction_is_deterministic() {
        let first = pipeline(FakeBackend::new(Reply::Text(ABSTRACT.to_string())), 100)
            .get_keywords(&pdf(1))
            .await
            .unwrap();
        let second = pipeline(FakeBackend::new(Reply::Text(ABSTRACT.to_string())), 100)
            .get_keywords(&pdf(1))
            .await
            .unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_batch_continues_past_skips() {
        let backend = FakeBackend::new(Reply::Text(ABSTRACT.to_string()));
        let pipeline = pipeline(backend.clone(), 65_535);
        let docs = vec![
            pdf(1),
            pdf(9),
            Document::from_bytes("txt", 1, AssetKind::Text, b"hello".to_vec()),
            pdf(2),
        ];

        let mut progress = ProgressTracker::quiet(docs.len());
        let report = pipeline.run_batch(&docs, &mut progress).await.unwrap();

        assert_eq!(report.len(), 4);
        assert_eq!(report.indexed(), 2);
        assert_eq!(report.skipped(), 2);
        assert_eq!(progress.raw(), 2);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_batch_stops_on_config_error() {
        let pipeline = pipeline(FakeBackend::new(Reply::Misconfigured), 65_535);
        let docs = vec![pdf(9), pdf(1), pdf(2)];

        let mut progress = ProgressTracker::quiet(docs.len());
        let result = pipeline.run_batch(&docs, &mut progress).await;
        assert!(matches!(result, Err(Error::Config(_))));
        // the excluded document was recorded before the failure
        assert_eq!(progress.docs_processed(), 1);
        assert_eq!(progress.skipped(), 1);
        assert!(progress.is_finished());
    }

    #[test]
    fn test_outcome_serializes_with_tags() {
        let json = serde_json::to_value(Outcome::Skipped(SkipReason::NoText)).unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["reason"], "no_text");

        let entry = BatchEntry {
            id: "a".to_string(),
            outcome: Outcome::Raw { text: "body".to_string() },
        };
        let json = serde_json::to_value(entry).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["outcome"], "raw");
        assert_eq!(json["text"], "body");
    }
}
