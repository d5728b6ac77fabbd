//! Normalize, embed, score and rank resumes

pub mod document;
pub mod text_processor;
pub mod embeddings;
pub mod embedding_manager;
pub mod similarity;
pub mod ranker;
pub mod orchestrator;
pub mod session;

pub use document::{Document, RankedResult, ScoredCandidate};
pub use embeddings::{Embedder, EmbeddingEngine};
pub use orchestrator::{BatchOrchestrator, BatchOutcome};
pub use ranker::Ranker;
pub use session::{BatchContext, BatchId, SessionStore};
