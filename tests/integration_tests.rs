//! Integration tests for the resume ranker

use async_trait::async_trait;
use resume_ranker::error::{EmbeddingError, RankerError, StageError, SummaryError};
use resume_ranker::input::file_detector::DocumentFormat;
use resume_ranker::input::manager::InputManager;
use resume_ranker::llm::{PromptParams, SummaryKind, SummaryService, Summarizer};
use resume_ranker::output::report::{RankingArtifact, RankingReport};
use resume_ranker::processing::document::Document;
use resume_ranker::processing::embeddings::Embedder;
use resume_ranker::processing::orchestrator::BatchOrchestrator;
use resume_ranker::processing::ranker::Ranker;
use resume_ranker::processing::session::SessionStore;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const DIMENSION: usize = 64;

/// Hashed bag-of-words vectors: texts sharing words score higher.
struct WordHashEmbedder {
    calls: AtomicUsize,
}

impl WordHashEmbedder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for WordHashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.split_whitespace().any(|w| w == "slow") {
            std::thread::sleep(Duration::from_millis(500));
        }
        let mut vector = vec![0.0f32; DIMENSION];
        for word in text.split_whitespace() {
            let hash = word
                .bytes()
                .fold(2166136261u32, |h, b| (h ^ b as u32).wrapping_mul(16777619));
            vector[hash as usize % DIMENSION] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        "word-hash"
    }
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn orchestrator(output_dir: &Path, embedder: Arc<WordHashEmbedder>) -> BatchOrchestrator {
    let ranker = Ranker::new(RankingArtifact::new(output_dir, "ranked_candidates.csv"));
    BatchOrchestrator::new(embedder, ranker).with_concurrency(4)
}

fn text_doc(name: &str, body: &str) -> Document {
    Document::new(body.as_bytes().to_vec(), DocumentFormat::Text, name)
}

fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let mut body = String::new();
    for paragraph in paragraphs {
        body.push_str(&format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", paragraph));
    }
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

fn artifact_lines(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("ranked_candidates.csv"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_rank_fixtures_from_disk() {
    let out = TempDir::new().unwrap();
    let input_manager = InputManager::new();
    let job_text = input_manager
        .read_job_description(&fixture("data_analyst_job.txt"))
        .await
        .unwrap();

    let mut input_manager = InputManager::new();
    let mut documents = input_manager
        .load_documents(&[
            fixture("chef_resume.txt"),
            fixture("analyst_resume.txt"),
            fixture("analyst_resume.pdf"),
            fixture("notes.md"),
        ])
        .await
        .unwrap();
    assert_eq!(input_manager.skipped(), &[fixture("notes.md")]);
    documents.push(Document::new(
        docx_bytes(&["Data analyst", "SQL, Python, Tableau dashboards and A/B testing"]),
        DocumentFormat::Docx,
        "analyst.docx",
    ));

    let outcome = orchestrator(out.path(), WordHashEmbedder::new())
        .process(&job_text, documents)
        .await
        .unwrap();

    assert_eq!(outcome.ranking.len(), 4);
    assert_eq!(outcome.ranking.candidates.last().unwrap().name, "chef_resume.txt");
    assert!(outcome.failures().next().is_none());

    let pdf = outcome
        .ranking
        .candidates
        .iter()
        .find(|c| c.name == "analyst_resume.pdf")
        .unwrap();
    assert!(pdf.score > 0.0);
    assert!(outcome
        .context
        .resume_text("analyst_resume.pdf")
        .unwrap()
        .contains("Tableau dashboards"));
    assert_eq!(
        outcome.context.resume_text("analyst.docx"),
        Some("Data analyst\nSQL, Python, Tableau dashboards and A/B testing")
    );

    let lines = artifact_lines(out.path());
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "Candidate,Similarity Score");
    assert!(lines[4].starts_with("chef_resume.txt,"));
}

#[tokio::test]
async fn test_unsupported_and_malformed_documents_score_zero() {
    let out = TempDir::new().unwrap();
    let documents = vec![
        text_doc("a.txt", "sql python analyst"),
        Document::new(b"# notes".to_vec(), DocumentFormat::from_extension("md"), "b.md"),
        Document::new(b"definitely not a pdf".to_vec(), DocumentFormat::Pdf, "c.pdf"),
    ];

    let outcome = orchestrator(out.path(), WordHashEmbedder::new())
        .process("sql python analyst", documents)
        .await
        .unwrap();

    assert_eq!(outcome.ranking.len(), 3);
    assert_eq!(outcome.ranking.candidates[0].name, "a.txt");
    for name in ["b.md", "c.pdf"] {
        let row = outcome.ranking.candidates.iter().find(|c| c.name == name).unwrap();
        assert_eq!(row.score, 0.0);
    }
    assert!(matches!(outcome.diagnostics[1].failure, Some(StageError::Extraction(_))));
    assert!(matches!(outcome.diagnostics[2].failure, Some(StageError::Extraction(_))));
    assert_eq!(artifact_lines(out.path()).len(), 4);
}

#[tokio::test]
async fn test_empty_batch_is_rejected_before_any_work() {
    let out = TempDir::new().unwrap();
    let embedder = WordHashEmbedder::new();

    let result = orchestrator(out.path(), embedder.clone())
        .process("sql analyst", Vec::new())
        .await;

    assert!(matches!(result, Err(RankerError::InvalidInput(_))));
    assert_eq!(embedder.calls(), 0);
    assert!(!out.path().join("ranked_candidates.csv").exists());
}

#[tokio::test]
async fn test_rerun_replaces_previous_artifact() {
    let out = TempDir::new().unwrap();
    let orchestrator = orchestrator(out.path(), WordHashEmbedder::new());

    orchestrator
        .process(
            "sql analyst",
            vec![
                text_doc("one.txt", "sql"),
                text_doc("two.txt", "analyst"),
                text_doc("three.txt", "chef"),
            ],
        )
        .await
        .unwrap();
    assert_eq!(artifact_lines(out.path()).len(), 4);

    orchestrator
        .process("sql analyst", vec![text_doc("solo.txt", "sql analyst")])
        .await
        .unwrap();
    let lines = artifact_lines(out.path());
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("solo.txt,"));
}

#[tokio::test]
async fn test_isolated_runs_write_separate_artifacts() {
    let out = TempDir::new().unwrap();
    let artifact = RankingArtifact::new(out.path(), "ranked_candidates.csv").isolated(true);
    let orchestrator = BatchOrchestrator::new(WordHashEmbedder::new(), Ranker::new(artifact));

    let (first, second) = tokio::join!(
        orchestrator.process("sql", vec![text_doc("a.txt", "sql")]),
        orchestrator.process("sql", vec![text_doc("b.txt", "sql"), text_doc("c.txt", "chef")]),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    let first_path = first.ranking.artifact.path().unwrap();
    let second_path = second.ranking.artifact.path().unwrap();
    assert_ne!(first_path, second_path);
    assert_eq!(std::fs::read_to_string(first_path).unwrap().lines().count(), 2);
    assert_eq!(std::fs::read_to_string(second_path).unwrap().lines().count(), 3);
}

#[tokio::test]
async fn test_slow_document_times_out_alone() {
    let out = TempDir::new().unwrap();
    let orchestrator = orchestrator(out.path(), WordHashEmbedder::new())
        .with_document_timeout(Some(Duration::from_millis(50)));

    let outcome = orchestrator
        .process(
            "sql analyst",
            vec![text_doc("slow.txt", "slow sql"), text_doc("fast.txt", "sql analyst")],
        )
        .await
        .unwrap();

    assert_eq!(outcome.ranking.candidates[0].name, "fast.txt");
    let failure = outcome.diagnostics[0].failure.as_ref().unwrap();
    assert_eq!(failure, &StageError::Timeout(Duration::from_millis(50)));
    assert_eq!(failure.to_string(), "timed out after 50ms");
    assert_eq!(outcome.diagnostics[0].score, 0.0);
}

struct EchoSummarizer;

#[async_trait]
impl Summarizer for EchoSummarizer {
    async fn summarize(&self, kind: SummaryKind, params: &PromptParams) -> Result<String, SummaryError> {
        Ok(format!("{:?} summary of {} chars", kind, params.resume_content.len()))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

#[tokio::test]
async fn test_summaries_follow_a_stored_batch() {
    let out = TempDir::new().unwrap();
    let outcome = orchestrator(out.path(), WordHashEmbedder::new())
        .process(
            "sql analyst",
            vec![text_doc("alice.txt", "sql analyst"), text_doc("empty.txt", "")],
        )
        .await
        .unwrap();

    let store = SessionStore::new();
    store.insert(outcome.batch_id, outcome.context.clone());
    let context = store.get(&outcome.batch_id).unwrap();

    let service = SummaryService::new(Arc::new(EchoSummarizer), "Data Analyst");
    assert_eq!(
        service.summarize_candidate(&context, "alice.txt").await,
        "Full summary of 11 chars"
    );

    let empty = service.summarize_candidate(&context, "empty.txt").await;
    assert!(!empty.is_empty());
    assert!(empty.contains("No resume text"));
}

#[tokio::test]
async fn test_same_file_name_from_two_folders() {
    let out = TempDir::new().unwrap();
    let documents = vec![
        text_doc("resume.txt", "sql analyst"),
        Document::new(vec![0xff, 0xfe, 0xfd], DocumentFormat::Text, "resume.txt"),
    ];

    let outcome = orchestrator(out.path(), WordHashEmbedder::new())
        .process("sql analyst", documents)
        .await
        .unwrap();

    let report = RankingReport::new(
        outcome.batch_id,
        "word-hash",
        &outcome.ranking.candidates,
        &outcome.diagnostics,
        outcome.ranking.artifact.clone(),
        outcome.elapsed_ms,
    );
    assert_eq!(report.candidates[0].candidate, "resume.txt");
    assert!(report.candidates[0].score > 0.99);
    assert_eq!(report.candidates[0].failure, None);
    assert_eq!(report.candidates[1].candidate, "resume (2).txt");
    assert!(report.candidates[1].failure.is_some());

    let service = SummaryService::new(Arc::new(EchoSummarizer), "Data Analyst");
    assert_eq!(
        service.summarize_candidate(&outcome.context, "resume.txt").await,
        "Full summary of 11 chars"
    );
    assert!(service
        .summarize_candidate(&outcome.context, "resume (2).txt")
        .await
        .contains("No resume text"));
}
