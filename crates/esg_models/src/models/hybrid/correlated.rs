//! Correlation matrices and Cholesky factors.
//!
//! Independent standard normals `Z` become correlated normals `W = L·Z`,
//! where `L` is the lower triangular factor of the correlation matrix
//! `C = L·Lᵀ`.
//!
//! ```
//! use esg_models::models::hybrid::CorrelationMatrix;
//!
//! let corr = CorrelationMatrix::new(&[1.0_f64, 0.6, 0.6, 1.0], 2).unwrap();
//! let chol = corr.cholesky().unwrap();
//! let w = chol.transform(&[1.0, 1.0]);
//! assert!((w[1] - (0.6 + 0.8)).abs() < 1e-12);
//! ```

use esg_core::traits::Float;
use thiserror::Error;

/// Correlation matrix validation and factorisation errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CorrelationError {
    /// Leading minor of the given order is not positive.
    #[error("Correlation matrix is not positive definite (pivot {index} = {pivot})")]
    NotPositiveDefinite {
        /// Row at which the factorisation broke down
        index: usize,
        /// Non-positive pivot value
        pivot: f64,
    },

    /// Wrong number of elements for the declared dimension.
    #[error("Invalid matrix dimensions: expected {expected} elements, got {got}")]
    InvalidDimensions {
        /// Expected element count
        expected: usize,
        /// Provided element count
        got: usize,
    },

    /// Diagonal element different from one.
    #[error("Diagonal element at index {index} is {value}, expected 1.0")]
    InvalidDiagonal {
        /// Diagonal index
        index: usize,
        /// Offending value
        value: f64,
    },

    /// `C[i][j] != C[j][i]`.
    #[error("Matrix is not symmetric at ({i}, {j})")]
    NotSymmetric {
        /// Row
        i: usize,
        /// Column
        j: usize,
    },

    /// Off-diagonal correlation outside `[-1, 1]` or not finite.
    #[error("Correlation at ({i}, {j}) is {value}, must be in [-1, 1]")]
    OutOfRange {
        /// Row
        i: usize,
        /// Column
        j: usize,
        /// Offending value
        value: f64,
    },
}

/// Symmetric correlation matrix with unit diagonal, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationMatrix<T: Float> {
    data: Vec<T>,
    dim: usize,
}

impl<T: Float> CorrelationMatrix<T> {
    /// Validate a row-major `dim × dim` matrix.
    ///
    /// Positive definiteness is not checked here; [`CorrelationMatrix::cholesky`]
    /// reports it.
    pub fn new(data: &[T], dim: usize) -> Result<Self, CorrelationError> {
        let expected = dim * dim;
        if data.len() != expected {
            return Err(CorrelationError::InvalidDimensions {
                expected,
                got: data.len(),
            });
        }

        let tolerance = T::from(1e-10).unwrap();
        let to_f64 = |v: T| v.to_f64().unwrap_or(f64::NAN);

        for i in 0..dim {
            let diag = data[i * dim + i];
            if !((diag - T::one()).abs() <= tolerance) {
                return Err(CorrelationError::InvalidDiagonal {
                    index: i,
                    value: to_f64(diag),
                });
            }
            for j in (i + 1)..dim {
                let upper = data[i * dim + j];
                let lower = data[j * dim + i];
                if !(upper.abs() <= T::one()) {
                    return Err(CorrelationError::OutOfRange {
                        i,
                        j,
                        value: to_f64(upper),
                    });
                }
                if !((upper - lower).abs() <= tolerance) {
                    return Err(CorrelationError::NotSymmetric { i, j });
                }
            }
        }

        Ok(Self {
            data: data.to_vec(),
            dim,
        })
    }

    /// Build from rows.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self, CorrelationError> {
        let dim = rows.len();
        let data: Vec<T> = rows.iter().flat_map(|row| row.iter().copied()).collect();
        Self::new(&data, dim)
    }

    /// Identity matrix of dimension `dim`.
    pub fn identity(dim: usize) -> Self {
        let mut data = vec![T::zero(); dim * dim];
        for i in 0..dim {
            data[i * dim + i] = T::one();
        }
        Self { data, dim }
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i * self.dim + j]
    }

    /// Same matrix with rows and columns permuted: element `(i, j)` of the
    /// result is element `(order[i], order[j])` of `self`.
    ///
    /// # Panics
    /// Panics if `order` has the wrong length or an index out of range.
    pub fn permuted(&self, order: &[usize]) -> Self {
        assert_eq!(order.len(), self.dim, "permutation length mismatch");
        let n = self.dim;
        let mut data = vec![T::zero(); n * n];
        for (i, &oi) in order.iter().enumerate() {
            for (j, &oj) in order.iter().enumerate() {
                data[i * n + j] = self.get(oi, oj);
            }
        }
        Self { data, dim: n }
    }

    /// Lower triangular Cholesky factor.
    ///
    /// # Errors
    /// `CorrelationError::NotPositiveDefinite` at the first non-positive pivot.
    pub fn cholesky(&self) -> Result<CholeskyFactor<T>, CorrelationError> {
        let n = self.dim;
        let mut lower = vec![T::zero(); n * n];

        for i in 0..n {
            for j in 0..=i {
                let dot = (0..j).fold(T::zero(), |acc, k| acc + lower[i * n + k] * lower[j * n + k]);
                if i == j {
                    let pivot = self.get(i, i) - dot;
                    if !(pivot > T::zero()) {
                        return Err(CorrelationError::NotPositiveDefinite {
                            index: i,
                            pivot: pivot.to_f64().unwrap_or(f64::NAN),
                        });
                    }
                    lower[i * n + i] = pivot.sqrt();
                } else {
                    lower[i * n + j] = (self.get(i, j) - dot) / lower[j * n + j];
                }
            }
        }

        Ok(CholeskyFactor { data: lower, dim: n })
    }
}

/// Lower triangular factor `L` of a correlation matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct CholeskyFactor<T: Float> {
    data: Vec<T>,
    dim: usize,
}

impl<T: Float> CholeskyFactor<T> {
    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element `(i, j)`; zero above the diagonal.
    pub fn get(&self, i: usize, j: usize) -> T {
        if j > i {
            T::zero()
        } else {
            self.data[i * self.dim + j]
        }
    }

    /// `W = L·Z`.
    ///
    /// # Panics
    /// Panics if `z.len() < self.dim()`.
    pub fn transform(&self, z: &[T]) -> Vec<T> {
        let mut out = vec![T::zero(); self.dim];
        self.transform_into(z, &mut out);
        out
    }

    /// `W = L·Z` written into `out`, reusing its storage.
    ///
    /// # Panics
    /// Panics if either slice is shorter than `self.dim()`.
    pub fn transform_into(&self, z: &[T], out: &mut [T]) {
        assert!(
            z.len() >= self.dim && out.len() >= self.dim,
            "vector length is less than matrix dimension {}",
            self.dim
        );
        for (i, w) in out.iter_mut().take(self.dim).enumerate() {
            let row = &self.data[i * self.dim..i * self.dim + i + 1];
            *w = row
                .iter()
                .zip(z.iter())
                .fold(T::zero(), |acc, (&l, &zj)| acc + l * zj);
        }
    }

    /// `L·Lᵀ`, the matrix this factor was computed from.
    pub fn reconstruct(&self) -> Vec<T> {
        let n = self.dim;
        let mut out = vec![T::zero(); n * n];
        for i in 0..n {
            for j in 0..n {
                out[i * n + j] = (0..=i.min(j))
                    .fold(T::zero(), |acc, k| acc + self.get(i, k) * self.get(j, k));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            CorrelationMatrix::new(&[1.0_f64, 0.5, 0.5], 2),
            Err(CorrelationError::InvalidDimensions { expected: 4, got: 3 })
        ));
        assert!(matches!(
            CorrelationMatrix::new(&[0.9_f64, 0.5, 0.5, 1.0], 2),
            Err(CorrelationError::InvalidDiagonal { index: 0, .. })
        ));
        assert!(matches!(
            CorrelationMatrix::new(&[1.0_f64, 0.5, 0.4, 1.0], 2),
            Err(CorrelationError::NotSymmetric { i: 0, j: 1 })
        ));
        assert!(matches!(
            CorrelationMatrix::new(&[1.0_f64, f64::NAN, f64::NAN, 1.0], 2),
            Err(CorrelationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_off_diagonal_above_one_is_rejected() {
        // An entry of 1.5 is either out of range or fails factorisation
        let data = [1.0_f64, 1.5, 0.0, 1.5, 1.0, 0.0, 0.0, 0.0, 1.0];
        assert!(CorrelationMatrix::new(&data, 3).is_err());
    }

    #[test]
    fn test_not_positive_definite() {
        #[rustfmt::skip]
        let data = [
            1.0_f64, 0.9, -0.9,
            0.9, 1.0, 0.9,
            -0.9, 0.9, 1.0,
        ];
        let corr = CorrelationMatrix::new(&data, 3).unwrap();
        assert!(matches!(
            corr.cholesky(),
            Err(CorrelationError::NotPositiveDefinite { index: 2, .. })
        ));
    }

    #[test]
    fn test_identity_factor() {
        let chol = CorrelationMatrix::<f64>::identity(3).cholesky().unwrap();
        assert_eq!(chol.transform(&[0.1, -0.2, 0.3]), vec![0.1, -0.2, 0.3]);
        assert_eq!(chol.get(0, 2), 0.0);
    }

    #[test]
    fn test_permuted() {
        #[rustfmt::skip]
        let data = [
            1.0_f64, 0.1, 0.2,
            0.1, 1.0, 0.3,
            0.2, 0.3, 1.0,
        ];
        let corr = CorrelationMatrix::new(&data, 3).unwrap();
        let p = corr.permuted(&[2, 0, 1]);
        assert_eq!(p.get(0, 1), 0.2);
        assert_eq!(p.get(0, 2), 0.3);
        assert_eq!(p.get(1, 2), 0.1);
    }

    proptest! {
        #[test]
        fn test_reconstruction(r01 in -0.9_f64..0.9, r02 in -0.9_f64..0.9, r12 in -0.9_f64..0.9) {
            let data = [1.0, r01, r02, r01, 1.0, r12, r02, r12, 1.0];
            let corr = CorrelationMatrix::new(&data, 3).unwrap();
            if let Ok(chol) = corr.cholesky() {
                for (a, b) in chol.reconstruct().iter().zip(data.iter()) {
                    prop_assert!((a - b).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_transform_into_matches_transform() {
        let corr = CorrelationMatrix::new(&[1.0_f64, -0.3, -0.3, 1.0], 2).unwrap();
        let chol = corr.cholesky().unwrap();
        let mut out = [0.0; 2];
        chol.transform_into(&[0.5, 2.0], &mut out);
        let w = chol.transform(&[0.5, 2.0]);
        assert_relative_eq!(out[0], w[0]);
        assert_relative_eq!(out[1], w[1]);
        assert_relative_eq!(w[1], -0.3 * 0.5 + (1.0_f64 - 0.09).sqrt() * 2.0, epsilon = 1e-14);
    }
}
