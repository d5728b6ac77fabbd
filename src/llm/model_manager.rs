//! Local chat model management for the offline summarizer

use crate::error::{RankerError, Result};
use hf_hub::api::tokio::Api;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Information about an available chat model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmModelInfo {
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub description: String,
}

const REQUIRED_FILES: [&str; 2] = ["config.json", "tokenizer.json"];
const OPTIONAL_FILES: [&str; 2] = ["tokenizer_config.json", "generation_config.json"];
const WEIGHTS_FILE: &str = "model.safetensors";

/// Chat models live under `<models_dir>/llm/<id>`.
pub struct LlmModelManager {
    models_dir: PathBuf,
    available_models: BTreeMap<String, LlmModelInfo>,
    downloaded_models: HashSet<String>,
}

impl LlmModelManager {
    pub async fn new(models_dir: &Path) -> Result<Self> {
        let models_dir = models_dir.join("llm");
        fs::create_dir_all(&models_dir).await.map_err(|e| {
            RankerError::ModelLoading(format!("Failed to create models directory: {}", e))
        })?;

        let mut manager = Self {
            models_dir,
            available_models: Self::catalog(),
            downloaded_models: HashSet::new(),
        };
        manager.scan_downloaded_models().await?;
        Ok(manager)
    }

    fn catalog() -> BTreeMap<String, LlmModelInfo> {
        let mut models = BTreeMap::new();
        models.insert(
            "tinyllama".to_string(),
            LlmModelInfo {
                name: "TinyLlama-1.1B-Chat".to_string(),
                repo_id: "TinyLlama/TinyLlama-1.1B-Chat-v1.0".to_string(),
                size_mb: 2200,
                description: "Small chat model for offline candidate summaries".to_string(),
            },
        );
        models
    }

    async fn scan_downloaded_models(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() && Self::is_complete(&entry.path()).await {
                self.downloaded_models
                    .insert(entry.file_name().to_string_lossy().to_string());
            }
        }
        Ok(())
    }

    async fn is_complete(path: &Path) -> bool {
        for file in REQUIRED_FILES.iter().chain(std::iter::once(&WEIGHTS_FILE)) {
            if fs::metadata(path.join(file)).await.is_err() {
                return false;
            }
        }
        true
    }

    pub async fn download_model(&mut self, model_id: &str, force: bool) -> Result<PathBuf> {
        let model_info = self
            .available_models
            .get(model_id)
            .cloned()
            .ok_or_else(|| RankerError::ModelLoading(format!("Unknown chat model: {}", model_id)))?;

        let model_dir = self.models_dir.join(model_id);
        if self.downloaded_models.contains(model_id) && !force {
            return Ok(model_dir);
        }

        info!(
            "Downloading chat model {} ({} MB) from {}",
            model_info.name, model_info.size_mb, model_info.repo_id
        );
        fs::create_dir_all(&model_dir).await?;

        let api = Api::new()
            .map_err(|e| RankerError::Network(format!("Failed to initialize HF API: {}", e)))?;
        let repo = api.model(model_info.repo_id.clone());

        for file in REQUIRED_FILES.iter().chain(std::iter::once(&WEIGHTS_FILE)) {
            let cached = repo.get(file).await.map_err(|e| {
                RankerError::Network(format!("Failed to download {}: {}", file, e))
            })?;
            fs::copy(&cached, model_dir.join(file)).await?;
            info!("  downloaded {}", file);
        }
        for file in OPTIONAL_FILES {
            if let Ok(cached) = repo.get(file).await {
                fs::copy(&cached, model_dir.join(file)).await?;
            }
        }

        self.downloaded_models.insert(model_id.to_string());
        info!("Chat model {} ready at {}", model_id, model_dir.display());
        Ok(model_dir)
    }

    pub fn get_model_path(&self, model_id: &str) -> Option<PathBuf> {
        self.downloaded_models
            .contains(model_id)
            .then(|| self.models_dir.join(model_id))
    }

    pub async fn ensure_model_available(&mut self, model_id: &str) -> Result<PathBuf> {
        match self.get_model_path(model_id) {
            Some(path) => Ok(path),
            None => self.download_model(model_id, false).await,
        }
    }

    pub fn list_available_models(&self) -> Vec<(&String, &LlmModelInfo)> {
        self.available_models.iter().collect()
    }

    pub fn get_model_info(&self, model_id: &str) -> Option<&LlmModelInfo> {
        self.available_models.get(model_id)
    }

    pub fn is_model_downloaded(&self, model_id: &str) -> bool {
        self.downloaded_models.contains(model_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_catalog_includes_default_chat_model() {
        let temp_dir = TempDir::new().unwrap();
        let manager = LlmModelManager::new(temp_dir.path()).await.unwrap();

        assert!(manager.get_model_info(crate::config::DEFAULT_LLM_MODEL).is_some());
        assert!(!manager.is_model_downloaded("tinyllama"));
        assert!(temp_dir.path().join("llm").is_dir());
    }

    #[tokio::test]
    async fn test_weights_required_for_completeness() {
        let temp_dir = TempDir::new().unwrap();
        let model_dir = temp_dir.path().join("llm").join("tinyllama");
        std::fs::create_dir_all(&model_dir).unwrap();
        for file in REQUIRED_FILES {
            std::fs::write(model_dir.join(file), b"{}").unwrap();
        }

        let manager = LlmModelManager::new(temp_dir.path()).await.unwrap();
        assert!(manager.get_model_path("tinyllama").is_none());

        std::fs::write(model_dir.join(WEIGHTS_FILE), b"").unwrap();
        let manager = LlmModelManager::new(temp_dir.path()).await.unwrap();
        assert_eq!(manager.get_model_path("tinyllama"), Some(model_dir));
    }
}
