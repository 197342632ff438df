//! docsearch - document text to search-index keywords
//!
//! Extracts text from uploaded documents and, when the text is too large to
//! store verbatim, reduces it to a bounded, language-aware RAKE keyword
//! string for the search index.

pub mod capacity;
pub mod config;
pub mod error;
pub mod extract;
pub mod gate;
pub mod language;
pub mod pipeline;
pub mod rake;
pub mod reducer;
pub mod types;

pub use capacity::CapacityPolicy;
pub use config::{
    Config, IndexingPolicy, KeywordConfig, MergeStrategy, StorageConfig, StorageEngine,
};
pub use error::{Error, ExtractError, Result};
pub use extract::{ExtractionBackend, PdfToText};
pub use language::detect_language;
pub use pipeline::{
    BatchEntry, BatchReport, KeywordPipeline, Outcome, ProgressTracker, SkipReason,
};
pub use rake::{BundledStopWords, Rake, StopWordSource};
pub use reducer::{KeywordReducer, Reduction};
pub use types::{AssetKind, Document, DocumentSource, KeywordResult, ScoredKeyword, VolumeId};
