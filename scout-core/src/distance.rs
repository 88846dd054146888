//! Similarity functions for comparing embeddings.

use ndarray::ArrayView1;
use crate::error::{ScoutError, ScoutResult};

/// Cosine similarity between two arbitrary (not necessarily normalized) vectors.
///
/// # Returns
/// Similarity in `[-1, 1]`, higher is more similar.
/// Returns `ScoutError::DimensionMismatch` if vectors have different lengths.
///
/// # Notes
/// Zero vectors have no direction; their similarity to anything is defined as 0.
pub fn cosine_similarity(v1: ArrayView1<f32>, v2: ArrayView1<f32>) -> ScoutResult<f32> {
    if v1.len() != v2.len() {
        return Err(ScoutError::DimensionMismatch {
            expected: v1.len(),
            actual: v2.len(),
        });
    }

    let dot_product = v1.dot(&v2);
    let norm_v1 = v1.dot(&v1).sqrt();
    let norm_v2 = v2.dot(&v2).sqrt();

    if norm_v1 == 0.0 || norm_v2 == 0.0 {
        Ok(0.0)
    } else {
        Ok(clamp_similarity(dot_product / (norm_v1 * norm_v2)))
    }
}

/// Clamps a raw dot product into `[-1, 1]` so rounding never leaks outside the cosine range.
#[inline]
pub fn clamp_similarity(raw: f32) -> f32 {
    raw.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_cosine_similarity() {
        let v1 = arr1(&[1.0, 2.0, 3.0]);
        let v2 = arr1(&[1.0, 2.0, 3.0]);
        let v3 = arr1(&[-1.0, -2.0, -3.0]);
        let v4 = arr1(&[2.0, 4.0, 6.0]);
        let v5 = arr1(&[1.0, 0.0, 0.0]);
        let v6 = arr1(&[0.0, 1.0, 0.0]);
        let zero = arr1(&[0.0, 0.0, 0.0]);

        assert!((cosine_similarity(v1.view(), v2.view()).unwrap() - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(v1.view(), v3.view()).unwrap() - (-1.0)).abs() < 1e-6);
        assert!((cosine_similarity(v1.view(), v4.view()).unwrap() - 1.0).abs() < 1e-6); // Parallel
        assert!((cosine_similarity(v5.view(), v6.view()).unwrap() - 0.0).abs() < 1e-6); // Orthogonal
        assert!((cosine_similarity(v1.view(), zero.view()).unwrap() - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_similarity() {
        assert_eq!(clamp_similarity(1.000_001), 1.0);
        assert_eq!(clamp_similarity(-1.2), -1.0);
        assert_eq!(clamp_similarity(0.25), 0.25);
    }

    #[test]
    fn test_dimension_mismatch() {
        let v1 = arr1(&[1.0, 2.0]);
        let v2 = arr1(&[1.0, 2.0, 3.0]);

        assert!(matches!(cosine_similarity(v1.view(), v2.view()), Err(ScoutError::DimensionMismatch { expected: 2, actual: 3 })));
    }
}
