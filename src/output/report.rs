//! Ranking report structures and the persisted CSV artifact

use crate::config::RankingConfig;
use crate::processing::document::{ArtifactStatus, DocumentDiagnostic, ScoredCandidate};
use crate::processing::session::BatchId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Serializes every artifact write in the process.
static ARTIFACT_LOCK: Mutex<()> = Mutex::new(());

pub const CSV_HEADER: [&str; 2] = ["Candidate", "Similarity Score"];

/// Where and how the ranking table is written.
#[derive(Debug, Clone)]
pub struct RankingArtifact {
    output_dir: PathBuf,
    artifact_name: String,
    isolate_runs: bool,
}

impl RankingArtifact {
    pub fn new(output_dir: impl Into<PathBuf>, artifact_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            artifact_name: artifact_name.into(),
            isolate_runs: false,
        }
    }

    pub fn from_config(config: &RankingConfig) -> Self {
        Self::new(&config.output_dir, &config.artifact_name).isolated(config.isolate_runs)
    }

    pub fn isolated(mut self, isolate_runs: bool) -> Self {
        self.isolate_runs = isolate_runs;
        self
    }

    /// Shared path, or `<stem>-<batch id>.<ext>` when runs are isolated.
    pub fn path_for(&self, batch_id: &BatchId) -> PathBuf {
        if !self.isolate_runs {
            return self.output_dir.join(&self.artifact_name);
        }

        let name = Path::new(&self.artifact_name);
        let stem = name
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "ranked_candidates".to_string());
        let file_name = match name.extension() {
            Some(ext) => format!("{}-{}.{}", stem, batch_id, ext.to_string_lossy()),
            None => format!("{}-{}", stem, batch_id),
        };
        self.output_dir.join(file_name)
    }

    /// Replace the artifact with `candidates`.
    ///
    /// Rows go to a temp file in the same directory which is then renamed over
    /// the target, so readers see either the old table or the new one.
    pub fn write(&self, candidates: &[ScoredCandidate], batch_id: &BatchId) -> io::Result<PathBuf> {
        let path = self.path_for(batch_id);
        let _guard = ARTIFACT_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        std::fs::create_dir_all(&self.output_dir)?;
        let mut file = NamedTempFile::new_in(&self.output_dir)?;
        file.write_all(render_csv(candidates).as_bytes())?;
        file.flush()?;
        file.persist(&path).map_err(|e| e.error)?;

        Ok(path)
    }
}

/// Header plus one `name,score` row per candidate, in the given order.
pub fn render_csv(candidates: &[ScoredCandidate]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_HEADER.join(","));
    out.push('\n');
    for candidate in candidates {
        out.push_str(&csv_field(&candidate.name));
        out.push(',');
        out.push_str(&candidate.score.to_string());
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Serializable view of a finished batch, used by the JSON formatter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingReport {
    pub batch_id: BatchId,
    pub generated_at: DateTime<Utc>,
    pub embedding_model: String,
    pub candidates: Vec<ReportRow>,
    pub artifact: ArtifactStatus,
    pub processing_time_ms: u64,
    pub summaries: Vec<CandidateSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub rank: usize,
    pub candidate: String,
    pub score: f32,
    /// Why the candidate fell back to 0.0, if it did.
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub candidate: String,
    pub summary: String,
}

impl RankingReport {
    pub fn new(
        batch_id: BatchId,
        embedding_model: &str,
        candidates: &[ScoredCandidate],
        diagnostics: &[DocumentDiagnostic],
        artifact: ArtifactStatus,
        processing_time_ms: u64,
    ) -> Self {
        let rows = candidates
            .iter()
            .enumerate()
            .map(|(idx, candidate)| ReportRow {
                rank: idx + 1,
                candidate: candidate.name.clone(),
                score: candidate.score,
                failure: diagnostics
                    .iter()
                    .find(|d| d.name == candidate.name)
                    .and_then(|d| d.failure.as_ref())
                    .map(|f| f.to_string()),
            })
            .collect();

        Self {
            batch_id,
            generated_at: Utc::now(),
            embedding_model: embedding_model.to_string(),
            candidates: rows,
            artifact,
            processing_time_ms,
            summaries: Vec::new(),
        }
    }

    pub fn with_summaries(mut self, summaries: Vec<CandidateSummary>) -> Self {
        self.summaries = summaries;
        self
    }
}
