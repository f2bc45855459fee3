//! Cosine similarity between embedding vectors
//!
//! Pure numeric functions, no I/O.

use crate::error::{Error, Result};

/// Cosine similarity of two vectors: dot product over the product of norms.
///
/// Fails when the dimensions differ. A zero vector has no defined angle;
/// rather than dividing by zero this returns a similarity of `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}
