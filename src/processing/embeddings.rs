//! Embeddings generation using Model2Vec
//!
//! The model is loaded once per process through [`EmbeddingEngine::initialize`],
//! which callers should invoke at startup so cold-start cost is paid up front.

use crate::config::Config;
use crate::error::{EmbeddingError, RankerError, Result};
use crate::processing::embedding_manager::EmbeddingModelManager;
use log::info;
use model2vec_rs::model::StaticModel;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

static GLOBAL_ENGINE: OnceCell<Arc<EmbeddingEngine>> = OnceCell::const_new();

/// Maps text to a fixed-dimension vector.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError>;

    /// Length of every vector this embedder produces.
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

pub struct EmbeddingEngine {
    model: StaticModel,
    dimension: usize,
    model_name: String,
}

impl EmbeddingEngine {
    /// Load a Model2Vec model from a local folder.
    pub fn load(model_path: &Path, model_name: &str) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading embedding model from: {}", model_path.display());

        let model = StaticModel::from_pretrained(model_path, None, None, None)
            .map_err(|e| RankerError::ModelLoading(format!("Failed to load model: {}", e)))?;

        // Probe once to learn the output width.
        let dimension = model.encode_single("dimension probe").len();
        if dimension == 0 {
            return Err(RankerError::ModelLoading(format!(
                "Model {} produced zero-length embeddings",
                model_name
            )));
        }

        info!(
            "Embedding model {} loaded in {:.2?} ({} dimensions)",
            model_name,
            start_time.elapsed(),
            dimension
        );

        Ok(Self {
            model,
            dimension,
            model_name: model_name.to_string(),
        })
    }

    /// Resolve the configured model (downloading it if needed) and load it.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let mut manager = EmbeddingModelManager::new(config.models_dir().clone()).await?;
        let model_path = manager
            .ensure_model_available(&config.models.embedding_model)
            .await?;
        let model_name = config.models.embedding_model.clone();

        tokio::task::spawn_blocking(move || Self::load(&model_path, &model_name))
            .await
            .map_err(|e| RankerError::ModelLoading(format!("Model loading task failed: {}", e)))?
    }

    /// Startup hook: load the process-wide model exactly once.
    ///
    /// Concurrent callers wait on the same load; later calls return the cached
    /// instance and ignore `config`.
    pub async fn initialize(config: &Config) -> Result<Arc<EmbeddingEngine>> {
        GLOBAL_ENGINE
            .get_or_try_init(|| async { Self::from_config(config).await.map(Arc::new) })
            .await
            .cloned()
    }

    /// The process-wide model, if [`EmbeddingEngine::initialize`] has completed.
    pub fn global() -> Option<Arc<EmbeddingEngine>> {
        GLOBAL_ENGINE.get().cloned()
    }
}

impl Embedder for EmbeddingEngine {
    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        // The tokenizer path inside model2vec panics instead of returning errors.
        let embedding = panic::catch_unwind(AssertUnwindSafe(|| self.model.encode_single(text)))
            .map_err(|_| EmbeddingError::Inference("model panicked during encoding".to_string()))?;

        validate_embedding(embedding, self.dimension)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Reject vectors that would make cosine scores meaningless.
pub fn validate_embedding(
    embedding: Vec<f32>,
    expected: usize,
) -> std::result::Result<Vec<f32>, EmbeddingError> {
    if embedding.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        });
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(EmbeddingError::NonFinite);
    }
    Ok(embedding)
}
