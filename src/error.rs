//! Error types for docsearch
//!
//! Only [`Error::Config`] is fatal to a request. Extraction failures are
//! recovered by the pipeline and treated as "no text".

use thiserror::Error;

/// Crate-level error
#[derive(Error, Debug)]
pub enum Error {
    /// Deployment problem: bad executable path, missing working directory, ...
    #[error("config error: {0}")]
    Config(String),

    /// Backend could not produce text
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),
}

/// Per-document extraction failures
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("extraction backend not found: {0}")]
    NotFound(String),

    #[error("failed to spawn extraction backend: {0}")]
    Spawn(String),

    #[error("extraction backend exited with status {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("extraction timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("extraction produced no text")]
    EmptyOutput,

    /// Backend setup is broken (e.g. working directory vanished)
    #[error("extraction backend misconfigured: {0}")]
    Misconfigured(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Whether this failure points at the deployment rather than the document
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Misconfigured(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = ExtractError::Timeout { secs: 30 };
        assert_eq!(err.to_string(), "extraction timed out after 30s");
    }

    #[test]
    fn test_extract_error_converts() {
        let err: Error = ExtractError::EmptyOutput.into();
        assert!(matches!(err, Error::Extraction(ExtractError::EmptyOutput)));
        assert_eq!(err.to_string(), "extraction error: extraction produced no text");
    }

    #[test]
    fn test_only_misconfigured_is_config() {
        assert!(ExtractError::Misconfigured("gone".to_string()).is_config());
        assert!(!ExtractError::NotFound("pdftotext".to_string()).is_config());
        assert!(!ExtractError::Timeout { secs: 1 }.is_config());
    }

    #[test]
    fn test_non_zero_exit_display() {
        let err = ExtractError::NonZeroExit {
            code: Some(1),
            stderr: "Syntax Error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "extraction backend exited with status Some(1): Syntax Error"
        );
    }
}
