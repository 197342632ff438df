//! Text extraction backends
//!
//! The PDF backend shells out to poppler's `pdftotext`. The child process is
//! given its working directory explicitly, so the host process never changes
//! its own current directory and concurrent extractions do not interfere.

use crate::config::IndexingPolicy;
use crate::error::{ExtractError, Result as DocResult};
use crate::types::{AssetKind, DocumentSource};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info};

/// Turns a local file into plain text
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Whether documents of this kind can be extracted
    fn supports(&self, kind: AssetKind) -> bool;

    /// Extract the text of the file at `path`
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError>;
}

/// `pdftotext` invoked as an external process
#[derive(Debug, Clone)]
pub struct PdfToText {
    executable: PathBuf,
    working_dir: PathBuf,
    timeout: Duration,
}

impl PdfToText {
    pub fn new(
        executable: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            executable: executable.into(),
            working_dir: working_dir.into(),
            timeout,
        }
    }

    /// Build from the indexing policy, resolving the executable and working directory.
    pub fn from_policy(policy: &IndexingPolicy) -> DocResult<Self> {
        Ok(Self::new(
            policy.executable_path()?,
            policy.working_dir()?,
            Duration::from_secs(policy.extraction_timeout_secs),
        ))
    }
}

#[async_trait]
impl ExtractionBackend for PdfToText {
    fn name(&self) -> &'static str {
        "pdftotext"
    }

    fn supports(&self, kind: AssetKind) -> bool {
        kind == AssetKind::Pdf
    }

    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        info!(path = %path.display(), "Extracting PDF content");

        if !self.working_dir.is_dir() {
            return Err(ExtractError::Misconfigured(format!(
                "working directory {} is not available",
                self.working_dir.display()
            )));
        }

        let child = Command::new(&self.executable)
            .arg("-enc")
            .arg("UTF-8")
            .arg(path)
            .arg("-")
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ExtractError::NotFound(self.executable.display().to_string())
                }
                _ => ExtractError::Spawn(e.to_string()),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExtractError::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        if !output.status.success() {
            return Err(ExtractError::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = clean_output(&String::from_utf8_lossy(&output.stdout));
        debug!(path = %path.display(), chars = text.chars().count(), "pdftotext finished");

        if text.is_empty() {
            return Err(ExtractError::EmptyOutput);
        }
        Ok(text)
    }
}

/// Trim surrounding whitespace and form feeds (pdftotext page breaks)
fn clean_output(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{0C}' || c == '\0')
        .to_string()
}

/// A local file the backend can read; temp copies are removed on drop
#[derive(Debug)]
pub struct LocalFile {
    path: PathBuf,
    _temp: Option<NamedTempFile>,
}

impl LocalFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Get a local file for a document source, spilling in-memory bytes to a
/// named temp file.
pub fn local_copy(source: &DocumentSource, kind: AssetKind) -> std::io::Result<LocalFile> {
    match source {
        DocumentSource::Path(path) => Ok(LocalFile {
            path: path.clone(),
            _temp: None,
        }),
        DocumentSource::Bytes(bytes) => {
            let suffix = format!(".{}", kind.name());
            let mut temp = tempfile::Builder::new()
                .prefix("docsearch-")
                .suffix(&suffix)
                .tempfile()?;
            temp.write_all(bytes)?;
            temp.flush()?;
            Ok(LocalFile {
                path: temp.path().to_path_buf(),
                _temp: Some(temp),
            })
        }
    }
}
