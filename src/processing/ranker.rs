//! Orders scored candidates and persists the ranking table

use crate::config::RankingConfig;
use crate::output::report::RankingArtifact;
use crate::processing::document::{ArtifactStatus, RankedResult, ScoredCandidate};
use crate::processing::session::BatchId;
use log::{info, warn};

#[derive(Debug, Clone)]
pub struct Ranker {
    artifact: RankingArtifact,
}

impl Ranker {
    pub fn new(artifact: RankingArtifact) -> Self {
        Self { artifact }
    }

    pub fn from_config(config: &RankingConfig) -> Self {
        Self::new(RankingArtifact::from_config(config))
    }

    /// Sort `names`/`scores` (parallel sequences) by score and persist them.
    ///
    /// # Panics
    /// If `names` and `scores` differ in length.
    pub fn rank(&self, names: Vec<String>, scores: Vec<f32>) -> RankedResult {
        self.rank_for_batch(names, scores, &BatchId::new())
    }

    /// As [`Ranker::rank`], naming the artifact after `batch_id` when runs are isolated.
    pub fn rank_for_batch(&self, names: Vec<String>, scores: Vec<f32>, batch_id: &BatchId) -> RankedResult {
        assert_eq!(
            names.len(),
            scores.len(),
            "rank called with {} names but {} scores",
            names.len(),
            scores.len()
        );

        let candidates = sort_candidates(
            names
                .into_iter()
                .zip(scores)
                .map(|(name, score)| ScoredCandidate::new(name, score))
                .collect(),
        );

        let artifact = match self.artifact.write(&candidates, batch_id) {
            Ok(path) => {
                info!("Ranked {} candidates saved to {}", candidates.len(), path.display());
                ArtifactStatus::Written(path)
            }
            Err(e) => {
                let path = self.artifact.path_for(batch_id);
                warn!("Could not write ranking to {}: {}", path.display(), e);
                ArtifactStatus::Failed(format!("{}: {}", path.display(), e))
            }
        };

        RankedResult { candidates, artifact }
    }
}

/// Stable descending sort; equal scores keep submission order.
pub fn sort_candidates(mut candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rank_sorts_descending_and_persists() {
        let dir = TempDir::new().unwrap();
        let ranker = Ranker::new(RankingArtifact::new(dir.path(), "ranked_candidates.csv"));

        let result = ranker.rank(names(&["x", "y"]), vec![0.2, 0.9]);

        assert_eq!(
            result.candidates,
            vec![ScoredCandidate::new("y", 0.9), ScoredCandidate::new("x", 0.2)]
        );
        let path = result.artifact.path().unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("Candidate,Similarity Score"));
        assert_eq!(lines.next(), Some("y,0.9"));
        assert_eq!(lines.next(), Some("x,0.2"));
    }

    #[test]
    fn test_ties_keep_submission_order() {
        let sorted = sort_candidates(vec![
            ScoredCandidate::new("first", 0.0),
            ScoredCandidate::new("best", 0.8),
            ScoredCandidate::new("second", 0.0),
            ScoredCandidate::new("third", 0.0),
        ]);
        let order: Vec<&str> = sorted.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, vec!["best", "first", "second", "third"]);
    }

    #[test]
    fn test_persistence_failure_still_returns_ranking() {
        let dir = TempDir::new().unwrap();
        // A regular file where the output directory should be.
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"occupied").unwrap();
        let ranker = Ranker::new(RankingArtifact::new(&blocker, "ranked_candidates.csv"));

        let result = ranker.rank(names(&["a", "b"]), vec![0.1, 0.3]);

        assert_eq!(result.candidates[0].name, "b");
        assert!(matches!(result.artifact, ArtifactStatus::Failed(_)));
    }

    #[test]
    #[should_panic(expected = "rank called with 2 names but 1 scores")]
    fn test_mismatched_lengths_panic() {
        let dir = TempDir::new().unwrap();
        let ranker = Ranker::new(RankingArtifact::new(dir.path(), "r.csv"));
        ranker.rank(names(&["a", "b"]), vec![0.5]);
    }
}
