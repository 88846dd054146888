use ndarray::Array1;
use serde::{Serialize, Deserialize};

use crate::error::{ScoutError, ScoutResult};

/// Dimensionality of the embeddings produced by the shipped encoders.
pub const DEFAULT_DIMENSIONS: usize = 512;

/// Tolerance used when checking that a stored vector has unit length.
pub const UNIT_NORM_TOLERANCE: f32 = 1e-4;

/// A fixed-length embedding vector.
/// Uses `ndarray::Array1<f32>` for efficient numerical operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Embedding(pub Array1<f32>);

impl std::ops::Deref for Embedding {
    type Target = Array1<f32>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(vec: Vec<f32>) -> Self {
        Embedding(Array1::from(vec))
    }
}

impl From<Embedding> for Vec<f32> {
    fn from(embedding: Embedding) -> Self {
        embedding.0.to_vec()
    }
}

impl Embedding {
    /// Euclidean length of the vector.
    pub fn l2_norm(&self) -> f32 {
        self.0.dot(&self.0).sqrt()
    }

    /// Returns `true` when the norm is within [`UNIT_NORM_TOLERANCE`] of 1.
    pub fn is_unit(&self) -> bool {
        (self.l2_norm() - 1.0).abs() <= UNIT_NORM_TOLERANCE
    }

    /// Scales the vector to unit L2 norm.
    ///
    /// Zero-norm vectors and vectors with non-finite components are rejected;
    /// the caller decides whether that is a per-item or a query failure.
    pub fn normalized(&self) -> Result<Embedding, NormalizeError> {
        if self.0.iter().any(|v| !v.is_finite()) {
            return Err(NormalizeError::NonFinite);
        }
        let norm = self.l2_norm();
        if norm == 0.0 || !norm.is_finite() {
            return Err(NormalizeError::ZeroNorm);
        }
        Ok(Embedding(&self.0 / norm))
    }

    /// Fails with `DimensionMismatch` unless the vector has `expected` components.
    pub fn ensure_dimensions(&self, expected: usize) -> ScoutResult<()> {
        if self.len() != expected {
            return Err(ScoutError::DimensionMismatch { expected, actual: self.len() });
        }
        Ok(())
    }
}

/// Why a vector could not be brought to unit length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeError {
    ZeroNorm,
    NonFinite,
}

impl std::fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizeError::ZeroNorm => write!(f, "embedding has zero norm"),
            NormalizeError::NonFinite => write!(f, "embedding contains non-finite values"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_has_unit_norm() {
        let e = Embedding::from(vec![3.0, 4.0]);
        let n = e.normalized().unwrap();
        assert!((n[0] - 0.6).abs() < 1e-6);
        assert!((n[1] - 0.8).abs() < 1e-6);
        assert!(n.is_unit());
        assert!(!e.is_unit());
    }

    #[test]
    fn test_normalize_rejects_degenerate_vectors() {
        assert_eq!(Embedding::from(vec![0.0; 4]).normalized(), Err(NormalizeError::ZeroNorm));
        assert_eq!(Embedding::from(vec![1.0, f32::NAN]).normalized(), Err(NormalizeError::NonFinite));
        assert_eq!(Embedding::from(vec![f32::INFINITY, 0.0]).normalized(), Err(NormalizeError::NonFinite));
    }

    #[test]
    fn test_ensure_dimensions() {
        let e = Embedding::from(vec![1.0, 2.0, 3.0]);
        assert!(e.ensure_dimensions(3).is_ok());
        assert!(matches!(
            e.ensure_dimensions(512),
            Err(ScoutError::DimensionMismatch { expected: 512, actual: 3 })
        ));
    }
}
