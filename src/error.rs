//! Error handling for the resume ranker
//!
//! `RankerError` covers failures that end a request. The per-stage kinds
//! (`ExtractionError`, `EmbeddingError`, `ScoringError`) describe why a single
//! document scored 0.0; the orchestrator records them but never propagates them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No valid resume documents in batch")]
    NoValidDocuments,

    #[error("Job description could not be embedded: {0}")]
    JobEmbedding(String),

    #[error("Model loading error: {0}")]
    ModelLoading(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, RankerError>;

/// Convert anyhow errors (raised by model2vec) to our custom error type
impl From<anyhow::Error> for RankerError {
    fn from(err: anyhow::Error) -> Self {
        RankerError::ModelLoading(err.to_string())
    }
}

/// Convert candle core errors to our custom error type
impl From<candle_core::Error> for RankerError {
    fn from(err: candle_core::Error) -> Self {
        RankerError::ModelError(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),

    #[error("text is not valid UTF-8: {0}")]
    Encoding(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("embedding inference failed: {0}")]
    Inference(String),

    #[error("embedding has dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding contains non-finite values")]
    NonFinite,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("vector dimensions don't match: {0} vs {1}")]
    DimensionMismatch(usize, usize),

    #[error("cannot score zero-dimension vectors")]
    Empty,

    #[error("cannot score a zero-norm vector")]
    ZeroNorm,
}

/// The stage at which a single document dropped to the fallback score.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("extraction: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("extracted text was empty after normalization")]
    EmptyText,

    #[error("embedding: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("scoring: {0}")]
    Scoring(#[from] ScoringError),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("worker task failed: {0}")]
    TaskFailed(String),
}

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited or quota exhausted: {0}")]
    RateLimited(String),

    #[error("model returned empty content")]
    EmptyResponse,

    #[error("summarizer unavailable: {0}")]
    Unavailable(String),

    #[error("local inference failed: {0}")]
    Inference(String),
}

impl From<candle_core::Error> for SummaryError {
    fn from(err: candle_core::Error) -> Self {
        SummaryError::Inference(err.to_string())
    }
}
