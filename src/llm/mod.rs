//! Candidate summaries from a hosted or local language model
//!
//! [`SummaryService`] never fails: every problem becomes a message that can
//! be shown to a reviewer in place of the summary.

pub mod gemini;
pub mod inference;
pub mod model_manager;
pub mod prompts;

use crate::config::{Config, SummaryProvider};
use crate::error::SummaryError;
use crate::processing::session::BatchContext;
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

pub use prompts::{PromptParams, SummaryKind};

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, kind: SummaryKind, params: &PromptParams) -> std::result::Result<String, SummaryError>;

    fn name(&self) -> &str;
}

pub const EMPTY_OUTPUT_MESSAGE: &str = "Unable to generate summary. Please try again.";
pub const RATE_LIMIT_MESSAGE: &str =
    "Error generating summary: the summarization quota is exhausted. Please try again later.";

pub struct SummaryService {
    backend: Option<Arc<dyn Summarizer>>,
    unavailable_reason: String,
    role_label: String,
}

impl SummaryService {
    pub fn new(backend: Arc<dyn Summarizer>, role_label: &str) -> Self {
        Self {
            backend: Some(backend),
            unavailable_reason: String::new(),
            role_label: role_label.to_string(),
        }
    }

    /// A service that answers every request with `reason`.
    pub fn unavailable(reason: impl Into<String>, role_label: &str) -> Self {
        Self {
            backend: None,
            unavailable_reason: reason.into(),
            role_label: role_label.to_string(),
        }
    }

    /// Build the configured backend. Missing credentials or a model that fails
    /// to load leave the service in its unavailable state instead of erroring.
    pub async fn from_config(config: &Config) -> Self {
        let role = &config.summary.role_label;
        match config.summary.provider {
            SummaryProvider::Disabled => Self::unavailable("Candidate summaries are disabled in the configuration.", role),
            SummaryProvider::Gemini => {
                let Some(api_key) = config.gemini_api_key() else {
                    return Self::unavailable(
                        format!(
                            "Candidate summaries need an API key in the {} environment variable.",
                            config.summary.api_key_env
                        ),
                        role,
                    );
                };
                match gemini::GeminiSummarizer::new(api_key, &config.summary) {
                    Ok(backend) => Self::new(Arc::new(backend), role),
                    Err(e) => Self::unavailable(format!("Error generating summary: {}", e), role),
                }
            }
            SummaryProvider::Local => match inference::LocalSummarizer::from_config(config).await {
                Ok(backend) => Self::new(Arc::new(backend), role),
                Err(e) => {
                    warn!("Local summarizer unavailable: {}", e);
                    Self::unavailable(
                        "Error: Unable to load the local summary model. Check the model download and try again.",
                        role,
                    )
                }
            },
        }
    }

    pub fn with_role(mut self, role_label: &str) -> Self {
        self.role_label = role_label.to_string();
        self
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn role_label(&self) -> &str {
        &self.role_label
    }

    /// Summarize one resume against a job description. Always returns text.
    pub async fn summarize(&self, kind: SummaryKind, resume_text: &str, job_text: &str) -> String {
        if resume_text.trim().is_empty() {
            return "No resume text is available for this candidate, so a summary cannot be generated.".to_string();
        }
        if kind == SummaryKind::Full && job_text.trim().is_empty() {
            return "No job description text is available, so a summary cannot be generated.".to_string();
        }
        let Some(backend) = &self.backend else {
            return self.unavailable_reason.clone();
        };

        let start_time = Instant::now();
        let params = PromptParams::new(resume_text, job_text, &self.role_label);
        match backend.summarize(kind, &params).await {
            Ok(summary) if summary.trim().is_empty() => EMPTY_OUTPUT_MESSAGE.to_string(),
            Ok(summary) => {
                info!(
                    "Generated summary with {} in {:.2} seconds",
                    backend.name(),
                    start_time.elapsed().as_secs_f64()
                );
                summary
            }
            Err(SummaryError::EmptyResponse) => EMPTY_OUTPUT_MESSAGE.to_string(),
            Err(SummaryError::RateLimited(detail)) => {
                warn!("Summary backend {} is rate limited: {}", backend.name(), detail);
                RATE_LIMIT_MESSAGE.to_string()
            }
            Err(e) => {
                warn!("Summary backend {} failed: {}", backend.name(), e);
                format!("Error generating summary: {}", e)
            }
        }
    }

    /// Look `candidate` up in a finished batch and summarize it.
    pub async fn summarize_candidate(&self, context: &BatchContext, candidate: &str) -> String {
        match context.resume_text(candidate) {
            Some(resume_text) => {
                self.summarize(SummaryKind::Full, resume_text, context.job_text())
                    .await
            }
            None => format!("Candidate '{}' is not part of this ranking batch.", candidate),
        }
    }
}
