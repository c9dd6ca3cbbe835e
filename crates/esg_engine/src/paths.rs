//! Scenario-by-time matrices.
//!
//! # Memory Layout
//!
//! [`PathMatrix`] stores `n_paths × n_points` values row-major: one
//! contiguous row per scenario, so per-scenario evolution can run over
//! disjoint `par_chunks_mut` rows.
//!
//! # Downsampling
//!
//! Fine-grid series come in two kinds:
//! - *flows* (integrated rates, returns, shocks) stored at the end point of
//!   their step with slot 0 equal to zero; a reporting value is the sum over
//!   its interval ([`PathMatrix::downsample_flow`])
//! - *stocks* (short rates, deflators) observed at a point; a reporting value
//!   is the fine value at the reporting point ([`PathMatrix::downsample_stock`])

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Row-major `n_paths × n_points` matrix of `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathMatrix {
    n_paths: usize,
    n_points: usize,
    data: Vec<f64>,
}

impl PathMatrix {
    /// Matrix of zeros.
    pub fn zeros(n_paths: usize, n_points: usize) -> Self {
        Self {
            n_paths,
            n_points,
            data: vec![0.0; n_paths * n_points],
        }
    }

    /// Matrix from row-major data.
    ///
    /// # Panics
    /// Panics if `data.len() != n_paths * n_points`.
    pub fn from_vec(n_paths: usize, n_points: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            n_paths * n_points,
            "data length does not match {n_paths} x {n_points}"
        );
        Self {
            n_paths,
            n_points,
            data,
        }
    }

    /// Number of scenarios.
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.n_paths
    }

    /// Number of time points per scenario.
    #[inline]
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Value of scenario `path` at point `j`.
    #[inline]
    pub fn get(&self, path: usize, j: usize) -> f64 {
        self.data[path * self.n_points + j]
    }

    /// Set scenario `path` at point `j`.
    #[inline]
    pub fn set(&mut self, path: usize, j: usize, value: f64) {
        self.data[path * self.n_points + j] = value;
    }

    /// Row of scenario `path`.
    #[inline]
    pub fn row(&self, path: usize) -> &[f64] {
        &self.data[path * self.n_points..(path + 1) * self.n_points]
    }

    /// Mutable row of scenario `path`.
    #[inline]
    pub fn row_mut(&mut self, path: usize) -> &mut [f64] {
        &mut self.data[path * self.n_points..(path + 1) * self.n_points]
    }

    /// Iterator over rows.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.n_points.max(1))
    }

    /// Mutable iterator over rows.
    pub fn rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, f64> {
        self.data.chunks_exact_mut(self.n_points.max(1))
    }

    /// Parallel mutable iterator over rows.
    pub fn par_rows_mut(&mut self) -> rayon::slice::ChunksExactMut<'_, f64> {
        self.data.par_chunks_exact_mut(self.n_points.max(1))
    }

    /// Row-major storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable row-major storage.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Values of every scenario at point `j`.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows().map(|row| row[j]).collect()
    }

    /// Cross-scenario mean at every point.
    pub fn column_means(&self) -> Vec<f64> {
        let mut means = vec![0.0; self.n_points];
        for row in self.rows() {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        let n = self.n_paths.max(1) as f64;
        means.iter_mut().for_each(|m| *m /= n);
        means
    }

    /// Apply `f` to every value.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        Self {
            n_paths: self.n_paths,
            n_points: self.n_points,
            data: self.data.par_iter().map(|&v| f(v)).collect(),
        }
    }

    /// Row-wise running sum.
    pub fn cumulative(&self) -> Self {
        let mut out = self.clone();
        out.par_rows_mut().for_each(|row| {
            let mut acc = 0.0;
            for v in row.iter_mut() {
                acc += *v;
                *v = acc;
            }
        });
        out
    }

    /// Values at every `stride`-th point, the first included.
    pub fn downsample_stock(&self, stride: usize) -> Self {
        let stride = stride.max(1);
        let n_out = (self.n_points.saturating_sub(1)) / stride + 1;
        let mut data = Vec::with_capacity(self.n_paths * n_out);
        for row in self.rows() {
            data.extend(row.iter().step_by(stride).take(n_out));
        }
        Self::from_vec(self.n_paths, n_out, data)
    }

    /// Sums over consecutive intervals of `stride` points, slot 0 kept.
    ///
    /// Equivalent to cumulative sum, subset and difference.
    pub fn downsample_flow(&self, stride: usize) -> Self {
        let stride = stride.max(1);
        let n_out = (self.n_points.saturating_sub(1)) / stride + 1;
        let mut data = Vec::with_capacity(self.n_paths * n_out);
        for row in self.rows() {
            data.push(row[0]);
            for k in 1..n_out {
                data.push(row[(k - 1) * stride + 1..=k * stride].iter().sum());
            }
        }
        Self::from_vec(self.n_paths, n_out, data)
    }

    /// New matrix holding the given rows in order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.n_points);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self::from_vec(indices.len(), self.n_points, data)
    }

    /// Append the rows of `other`.
    ///
    /// # Panics
    /// Panics if the point counts differ.
    pub fn append(&mut self, other: &PathMatrix) {
        assert_eq!(self.n_points, other.n_points, "point counts differ");
        self.data.extend_from_slice(&other.data);
        self.n_paths += other.n_paths;
    }

    /// Keep the first `n_paths` rows.
    pub fn truncate(&mut self, n_paths: usize) {
        if n_paths < self.n_paths {
            self.n_paths = n_paths;
            self.data.truncate(n_paths * self.n_points);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn sample() -> PathMatrix {
        PathMatrix::from_vec(2, 5, vec![0.0, 1.0, 2.0, 3.0, 4.0, 0.0, -1.0, -2.0, -3.0, -4.0])
    }

    #[test]
    fn test_access() {
        let mut m = sample();
        assert_eq!(m.get(1, 2), -2.0);
        m.set(1, 2, 9.0);
        assert_eq!(m.row(1), &[0.0, -1.0, 9.0, -3.0, -4.0]);
        assert_eq!(m.column(4), vec![4.0, -4.0]);
        assert_eq!(m.rows().count(), 2);
    }

    #[test]
    fn test_downsampling() {
        let m = sample();
        assert_eq!(m.downsample_stock(2).row(0), &[0.0, 2.0, 4.0]);
        assert_eq!(m.downsample_flow(2).row(0), &[0.0, 3.0, 7.0]);
        assert_eq!(m.downsample_flow(1), m);
        assert_eq!(m.cumulative().row(0), &[0.0, 1.0, 3.0, 6.0, 10.0]);
    }

    #[test]
    fn test_select_append_truncate() {
        let m = sample();
        let mut picked = m.select_rows(&[1]);
        assert_eq!(picked.n_paths(), 1);
        picked.append(&m);
        assert_eq!(picked.n_paths(), 3);
        assert_eq!(picked.row(2), m.row(1));
        picked.truncate(2);
        assert_eq!(picked.n_paths(), 2);
        assert_eq!(picked.as_slice().len(), 10);
    }

    #[test]
    fn test_column_means() {
        let means = sample().column_means();
        assert_eq!(means, vec![0.0; 5]);
    }

    proptest! {
        #[test]
        fn test_flow_downsampling_preserves_totals(
            values in prop::collection::vec(-1.0f64..1.0, 12),
            stride in prop::sample::select(vec![1usize, 2, 3, 4, 6, 12]),
        ) {
            let mut data = vec![0.0];
            data.extend(values);
            let m = PathMatrix::from_vec(1, 13, data);
            let coarse = m.downsample_flow(stride);
            let cumulative = m.cumulative().downsample_stock(stride);
            let mut acc = 0.0;
            for (k, v) in coarse.row(0).iter().enumerate() {
                acc += v;
                assert_relative_eq!(acc, cumulative.get(0, k), epsilon = 1e-12);
            }
        }
    }
}
