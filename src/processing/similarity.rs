//! Cosine similarity between embedding vectors

use crate::error::ScoringError;

/// dot(a, b) / (|a| * |b|), clamped to [-1, 1].
///
/// Vectors are used as given; callers must not pass a missing embedding.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, ScoringError> {
    if a.len() != b.len() {
        return Err(ScoringError::DimensionMismatch(a.len(), b.len()));
    }
    if a.is_empty() {
        return Err(ScoringError::Empty);
    }

    // Accumulate in f64 so long vectors don't drift past the bounds.
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(ScoringError::ZeroNorm);
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    Ok(score.clamp(-1.0, 1.0) as f32)
}
