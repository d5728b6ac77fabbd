//! Document and ranking structures

use crate::error::StageError;
use crate::input::file_detector::DocumentFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A submitted resume: raw bytes tagged with the format declared at upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    bytes: Vec<u8>,
    format: DocumentFormat,
    display_name: String,
}

impl Document {
    pub fn new(bytes: Vec<u8>, format: DocumentFormat, display_name: impl Into<String>) -> Self {
        Self {
            bytes,
            format,
            display_name: display_name.into(),
        }
    }

    /// Build a document whose format is taken from the display name's extension.
    pub fn from_named_bytes(bytes: Vec<u8>, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        let format = DocumentFormat::from_path(std::path::Path::new(&display_name));
        Self::new(bytes, format, display_name)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> &DocumentFormat {
        &self.format
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn has_valid_name(&self) -> bool {
        !self.display_name.trim().is_empty()
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub name: String,
    pub score: f32,
}

impl ScoredCandidate {
    pub fn new(name: impl Into<String>, score: f32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ArtifactStatus {
    Written(PathBuf),
    Failed(String),
}

impl ArtifactStatus {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ArtifactStatus::Written(path) => Some(path),
            ArtifactStatus::Failed(_) => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            ArtifactStatus::Written(_) => None,
            ArtifactStatus::Failed(message) => Some(message),
        }
    }
}

/// Candidates ordered by score, highest first, plus where the table was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub candidates: Vec<ScoredCandidate>,
    pub artifact: ArtifactStatus,
}

impl RankedResult {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn top(&self, n: usize) -> &[ScoredCandidate] {
        &self.candidates[..n.min(self.candidates.len())]
    }
}

/// Per-document record of how a score was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDiagnostic {
    pub name: String,
    pub format: DocumentFormat,
    pub score: f32,
    pub text_chars: usize,
    pub failure: Option<StageError>,
}

impl DocumentDiagnostic {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_format_from_name() {
        let doc = Document::from_named_bytes(b"hello".to_vec(), "alice.TXT");
        assert_eq!(doc.format(), &DocumentFormat::Text);
        assert_eq!(doc.display_name(), "alice.TXT");
        assert!(doc.has_valid_name());
    }

    #[test]
    fn test_blank_name_is_invalid() {
        let doc = Document::new(Vec::new(), DocumentFormat::Text, "   ");
        assert!(!doc.has_valid_name());
    }

    #[test]
    fn test_ranked_result_top_is_bounded() {
        let result = RankedResult {
            candidates: vec![ScoredCandidate::new("a", 0.5)],
            artifact: ArtifactStatus::Failed("read-only".to_string()),
        };
        assert_eq!(result.top(3).len(), 1);
        assert_eq!(result.artifact.warning(), Some("read-only"));
        assert!(result.artifact.path().is_none());
    }
}
