//! Batch orchestration: one job description against many resumes
//!
//! Each resume is extracted, normalized, embedded and scored on the blocking
//! pool, independently of its siblings. Whatever goes wrong for one document
//! turns into a 0.0 score for that document alone; only an unusable job
//! description or an empty batch fails the whole request.

use crate::config::Config;
use crate::error::{RankerError, Result, StageError};
use crate::input::text_extractor::TextExtractor;
use crate::processing::document::{Document, DocumentDiagnostic, RankedResult};
use crate::processing::embeddings::Embedder;
use crate::processing::ranker::Ranker;
use crate::processing::session::{BatchContext, BatchId};
use crate::processing::similarity::cosine_similarity;
use crate::processing::text_processor::normalize;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Score given to any document that could not be scored.
pub const FALLBACK_SCORE: f32 = 0.0;

pub struct BatchOrchestrator {
    embedder: Arc<dyn Embedder>,
    extractor: TextExtractor,
    ranker: Ranker,
    max_concurrency: usize,
    document_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub batch_id: BatchId,
    pub ranking: RankedResult,
    /// One entry per scored document, in submission order.
    pub diagnostics: Vec<DocumentDiagnostic>,
    pub context: BatchContext,
    pub elapsed_ms: u64,
}

impl BatchOutcome {
    pub fn failures(&self) -> impl Iterator<Item = &DocumentDiagnostic> {
        self.diagnostics.iter().filter(|d| !d.succeeded())
    }
}

struct DocumentRun {
    raw_text: String,
    text_chars: usize,
    outcome: std::result::Result<f32, StageError>,
}

impl DocumentRun {
    fn failed(error: StageError) -> Self {
        Self {
            raw_text: String::new(),
            text_chars: 0,
            outcome: Err(error),
        }
    }
}

impl BatchOrchestrator {
    pub fn new(embedder: Arc<dyn Embedder>, ranker: Ranker) -> Self {
        Self {
            embedder,
            extractor: TextExtractor::new(),
            ranker,
            max_concurrency: 1,
            document_timeout: None,
        }
    }

    pub fn from_config(embedder: Arc<dyn Embedder>, config: &Config) -> Self {
        Self::new(embedder, Ranker::from_config(&config.ranking))
            .with_concurrency(config.ranking.max_concurrency)
            .with_document_timeout(config.ranking.document_timeout_secs.map(Duration::from_secs))
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_document_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.document_timeout = timeout;
        self
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Rank `documents` against `job_text`.
    pub async fn process(&self, job_text: &str, documents: Vec<Document>) -> Result<BatchOutcome> {
        let start_time = Instant::now();

        if job_text.trim().is_empty() {
            return Err(RankerError::InvalidInput("job description is empty".to_string()));
        }
        if documents.is_empty() {
            return Err(RankerError::InvalidInput("no resume documents submitted".to_string()));
        }

        let submitted = documents.len();
        let documents: Vec<Document> = documents
            .into_iter()
            .filter(|doc| {
                if !doc.has_valid_name() {
                    warn!("Dropping a {} document with no display name", doc.format());
                }
                doc.has_valid_name()
            })
            .collect();
        if documents.is_empty() {
            return Err(RankerError::NoValidDocuments);
        }
        let documents = with_unique_names(documents);

        let batch_id = BatchId::new();
        info!(
            "Batch {}: ranking {} of {} submitted resumes",
            batch_id,
            documents.len(),
            submitted
        );

        let job_vector = Arc::new(self.embed_job(job_text).await?);

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut pending = Vec::with_capacity(documents.len());
        for document in documents {
            let name = document.display_name().to_string();
            let format = document.format().clone();
            let task = tokio::spawn(run_isolated(
                document,
                self.extractor,
                Arc::clone(&self.embedder),
                Arc::clone(&job_vector),
                Arc::clone(&semaphore),
                self.document_timeout,
            ));
            pending.push((name, format, task));
        }

        let mut context = BatchContext::new(job_text);
        let mut diagnostics = Vec::with_capacity(pending.len());
        for (name, format, task) in pending {
            let run = task
                .await
                .unwrap_or_else(|e| DocumentRun::failed(StageError::TaskFailed(e.to_string())));

            let (score, failure) = match run.outcome {
                Ok(score) => {
                    debug!("{} scored {:.4}", name, score);
                    (score, None)
                }
                Err(error) => {
                    warn!("{} falls back to {}: {}", name, FALLBACK_SCORE, error);
                    (FALLBACK_SCORE, Some(error))
                }
            };

            context.insert_resume(name.clone(), run.raw_text);
            diagnostics.push(DocumentDiagnostic {
                name,
                format,
                score,
                text_chars: run.text_chars,
                failure,
            });
        }

        let names = diagnostics.iter().map(|d| d.name.clone()).collect();
        let scores = diagnostics.iter().map(|d| d.score).collect();
        let ranking = self.ranker.rank_for_batch(names, scores, &batch_id);

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Processed {} candidates in {:.2} seconds",
            ranking.len(),
            elapsed_ms as f64 / 1000.0
        );

        Ok(BatchOutcome {
            batch_id,
            ranking,
            diagnostics,
            context,
            elapsed_ms,
        })
    }

    /// Any failure here aborts the batch: nothing can be scored without the job vector.
    async fn embed_job(&self, job_text: &str) -> Result<Vec<f32>> {
        let normalized = normalize(job_text);
        if normalized.is_empty() {
            return Err(RankerError::JobEmbedding(
                "job description has no letters left after normalization".to_string(),
            ));
        }

        let embedder = Arc::clone(&self.embedder);
        tokio::task::spawn_blocking(move || embedder.embed(&normalized))
            .await
            .map_err(|e| RankerError::JobEmbedding(format!("embedding task failed: {}", e)))?
            .map_err(|e| RankerError::JobEmbedding(e.to_string()))
    }
}

/// Rename repeated display names to `name (2).ext`, `name (3).ext`, ... in submission order.
///
/// Rows, diagnostics and summaries are all looked up by display name, so
/// names must be unique within a batch.
fn with_unique_names(documents: Vec<Document>) -> Vec<Document> {
    let mut taken: HashSet<String> = documents.iter().map(|d| d.display_name().to_string()).collect();
    let mut seen = HashSet::new();

    documents
        .into_iter()
        .map(|document| {
            let name = document.display_name().to_string();
            if seen.insert(name.clone()) {
                return document;
            }
            let unique = (2..)
                .map(|n| numbered_name(&name, n))
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or_else(|| name.clone());
            debug!("Renaming duplicate {} to {}", name, unique);
            taken.insert(unique.clone());
            seen.insert(unique.clone());
            document.with_display_name(unique)
        })
        .collect()
}

fn numbered_name(name: &str, n: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", name, n),
    }
}

async fn run_isolated(
    document: Document,
    extractor: TextExtractor,
    embedder: Arc<dyn Embedder>,
    job_vector: Arc<Vec<f32>>,
    semaphore: Arc<Semaphore>,
    timeout: Option<Duration>,
) -> DocumentRun {
    // The semaphore is never closed, so acquisition only waits.
    let permit = semaphore.acquire_owned().await.ok();
    let work = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        score_document(&extractor, embedder.as_ref(), &job_vector, &document)
    });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(joined) => joined,
            Err(_) => return DocumentRun::failed(StageError::Timeout(limit)),
        },
        None => work.await,
    };

    joined.unwrap_or_else(|e| DocumentRun::failed(StageError::TaskFailed(e.to_string())))
}

/// extract → normalize → embed → score for a single document.
fn score_document(
    extractor: &TextExtractor,
    embedder: &dyn Embedder,
    job_vector: &[f32],
    document: &Document,
) -> DocumentRun {
    let raw_text = match extractor.extract(document) {
        Ok(text) => text,
        Err(e) => return DocumentRun::failed(e.into()),
    };
    let text_chars = raw_text.chars().count();

    let outcome = (|| {
        let normalized = normalize(&raw_text);
        if normalized.is_empty() {
            return Err(StageError::EmptyText);
        }
        let embedding = embedder.embed(&normalized)?;
        Ok(cosine_similarity(&embedding, job_vector)?)
    })();

    DocumentRun {
        raw_text,
        text_chars,
        outcome,
    }
}
