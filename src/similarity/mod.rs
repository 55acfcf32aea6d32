//! Vector similarity math shared by the retrieval and matching pipelines.
//!
//! Cosine scores land in [-1.0, 1.0]; in practice the text embeddings this
//! crate works with score non-negative, and callers treat anything below
//! their configured threshold as "not similar".


use crate::{MatchError, Result};

/// Cosine similarity between two vectors, computed as dot(a,b) / (‖a‖·‖b‖).
///
/// Vectors of mismatched dimensionality are a `DimensionMismatch` error,
/// never silently truncated or padded. A zero-magnitude vector yields 0.0.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(MatchError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot = x.mul_add(*y, dot);
        norm_a = x.mul_add(*x, norm_a);
        norm_b = y.mul_add(*y, norm_b);
    }

    let magnitude = norm_a.sqrt() * norm_b.sqrt();
    if magnitude == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / magnitude)
}
