//! Input manager: turns files on disk into documents for a batch

use crate::error::{RankerError, Result};
use crate::input::file_detector::DocumentFormat;
use crate::processing::document::Document;
use log::{info, warn};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Default)]
pub struct InputManager {
    skipped: Vec<PathBuf>,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a job description. Only plain text is accepted.
    pub async fn read_job_description(&self, path: &Path) -> Result<String> {
        if DocumentFormat::from_path(path) != DocumentFormat::Text {
            return Err(RankerError::InvalidInput(format!(
                "Job description must be a TXT file: {}",
                path.display()
            )));
        }

        let bytes = fs::read(path).await?;
        let text = String::from_utf8(bytes).map_err(|e| {
            RankerError::InvalidInput(format!(
                "Job description is not valid UTF-8 ({}): {}",
                path.display(),
                e
            ))
        })?;
        info!("Read job description: {} ({} characters)", path.display(), text.len());
        Ok(text)
    }

    /// Load one resume file; the display name is its file name.
    pub async fn load_document(&self, path: &Path) -> Result<Document> {
        if !path.exists() {
            return Err(RankerError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let bytes = fs::read(path).await?;

        Ok(Document::new(bytes, DocumentFormat::from_path(path), display_name))
    }

    /// Load resumes, skipping files whose extension is outside the upload allow-list.
    pub async fn load_documents(&mut self, paths: &[PathBuf]) -> Result<Vec<Document>> {
        let mut documents = Vec::with_capacity(paths.len());

        for path in paths {
            if !DocumentFormat::from_path(path).is_supported() {
                warn!(
                    "Skipping {}: allowed extensions are {}",
                    path.display(),
                    DocumentFormat::ALLOWED_EXTENSIONS.join(", ")
                );
                self.skipped.push(path.clone());
                continue;
            }
            documents.push(self.load_document(path).await?);
        }

        info!("Loaded {} resume(s), skipped {}", documents.len(), self.skipped.len());
        Ok(documents)
    }

    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_documents_skips_disallowed_extensions() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("alice.txt");
        let md = dir.path().join("bob.md");
        std::fs::write(&txt, "Alice, SQL analyst").unwrap();
        std::fs::write(&md, "# Bob").unwrap();

        let mut manager = InputManager::new();
        let docs = manager.load_documents(&[txt, md.clone()]).await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].display_name(), "alice.txt");
        assert_eq!(docs[0].format(), &DocumentFormat::Text);
        assert_eq!(manager.skipped(), &[md]);
    }

    #[tokio::test]
    async fn test_job_description_must_be_txt() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("job.pdf");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();

        let manager = InputManager::new();
        assert!(matches!(
            manager.read_job_description(&pdf).await,
            Err(RankerError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_input_error() {
        let manager = InputManager::new();
        let result = manager.load_document(Path::new("/nonexistent/resume.pdf")).await;
        assert!(matches!(result, Err(RankerError::InvalidInput(_))));
    }
}
