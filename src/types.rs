//! Shared types for the keyword pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identifier of the storage volume a document lives in
pub type VolumeId = u32;

/// Final pipeline output: `None` when the document is skipped or has no text
pub type KeywordResult = Option<String>;

/// Coarse content classification of a document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Pdf,
    Text,
    Image,
    #[default]
    Other,
}

impl AssetKind {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "text",
            Self::Image => "image",
            Self::Other => "other",
        }
    }

    /// Classify by file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("pdf") => Self::Pdf,
            Some("txt" | "md" | "csv" | "rtf") => Self::Text,
            Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "tif" | "tiff") => Self::Image,
            _ => Self::Other,
        }
    }
}

/// Where the document's bytes come from
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A file already on local disk
    Path(PathBuf),
    /// In-memory content (spilled to a temp file before extraction)
    Bytes(Vec<u8>),
}

/// A document handed to the pipeline by the asset system. Read-only.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    /// Size in bytes
    pub size: u64,
    pub volume_id: VolumeId,
    pub kind: AssetKind,
    /// Locale of the owning site, e.g. "en-US"
    pub locale: Option<String>,
    pub source: DocumentSource,
}

impl Document {
    /// Build a document from a file on disk, reading its size and kind.
    pub fn from_path(
        id: impl Into<String>,
        volume_id: VolumeId,
        path: impl Into<PathBuf>,
    ) -> std::io::Result<Self> {
        let path = path.into();
        let size = std::fs::metadata(&path)?.len();
        Ok(Self {
            id: id.into(),
            size,
            volume_id,
            kind: AssetKind::from_path(&path),
            locale: None,
            source: DocumentSource::Path(path),
        })
    }

    /// Build a document from in-memory bytes
    pub fn from_bytes(
        id: impl Into<String>,
        volume_id: VolumeId,
        kind: AssetKind,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            id: id.into(),
            size: bytes.len() as u64,
            volume_id,
            kind,
            locale: None,
            source: DocumentSource::Bytes(bytes),
        }
    }

    /// Set the site locale
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

/// A keyword phrase and its RAKE score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredKeyword {
    pub phrase: String,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(AssetKind::from_path(Path::new("report.PDF")), AssetKind::Pdf);
        assert_eq!(AssetKind::from_path(Path::new("notes.txt")), AssetKind::Text);
        assert_eq!(AssetKind::from_path(Path::new("logo.png")), AssetKind::Image);
        assert_eq!(AssetKind::from_path(Path::new("archive")), AssetKind::Other);
    }

    #[test]
    fn test_from_bytes_sets_size() {
        let doc = Document::from_bytes("a1", 3, AssetKind::Pdf, vec![0u8; 42]).with_locale("de-AT");
        assert_eq!(doc.size, 42);
        assert_eq!(doc.volume_id, 3);
        assert_eq!(doc.locale.as_deref(), Some("de-AT"));
    }

    #[test]
    fn test_from_path_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.4 test").unwrap();

        let doc = Document::from_path("p1", 1, &path).unwrap();
        assert_eq!(doc.size, 13);
        assert_eq!(doc.kind, AssetKind::Pdf);
    }
}
