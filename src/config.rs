//! Configuration management for the resume ranker

use crate::error::{RankerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Embedding model used when the config does not name one.
pub const DEFAULT_EMBEDDING_MODEL: &str = "potion-base-8M";

/// Local chat model used by the offline summarizer.
pub const DEFAULT_LLM_MODEL: &str = "tinyllama";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub ranking: RankingConfig,
    pub summary: SummaryConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub embedding_model: String,
    pub llm_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    pub output_dir: PathBuf,
    pub artifact_name: String,
    /// Write one artifact per batch instead of overwriting the shared one.
    pub isolate_runs: bool,
    pub max_concurrency: usize,
    pub document_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    pub provider: SummaryProvider,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub api_key_env: String,
    pub role_label: String,
    pub timeout_secs: u64,
    pub max_input_chars: usize,
    pub max_new_tokens: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryProvider {
    Gemini,
    Local,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-ranker")
            .join("models");

        Self {
            models: ModelConfig {
                models_dir,
                embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
                llm_model: DEFAULT_LLM_MODEL.to_string(),
            },
            ranking: RankingConfig {
                output_dir: PathBuf::from("output"),
                artifact_name: "ranked_candidates.csv".to_string(),
                isolate_runs: false,
                max_concurrency: 4,
                document_timeout_secs: None,
            },
            summary: SummaryConfig {
                provider: SummaryProvider::Gemini,
                gemini_model: "gemini-2.0-flash".to_string(),
                gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
                api_key_env: "GEMINI_API_KEY".to_string(),
                role_label: "Data Analyst".to_string(),
                timeout_secs: 60,
                max_input_chars: 1500,
                max_new_tokens: 200,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| RankerError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| RankerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-ranker")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        if self.ranking.max_concurrency == 0 {
            return Err(RankerError::Configuration(
                "ranking.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.ranking.artifact_name.trim().is_empty() {
            return Err(RankerError::Configuration(
                "ranking.artifact_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.models.models_dir
    }

    pub fn ensure_models_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.models.models_dir)?;
        Ok(())
    }

    /// API key for the hosted summarizer, read from the configured variable.
    pub fn gemini_api_key(&self) -> Option<String> {
        std::env::var(&self.summary.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}
