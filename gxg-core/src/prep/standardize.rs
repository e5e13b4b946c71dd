//! Column-wise centering and scaling.
//!
//! Uses the population standard deviation. A constant column keeps a
//! divisor of 1.0 so it comes out as exact zeros instead of NaN.

use tracing::info;

use gxg_linalg::DenseMatrix;

use crate::error::CoreError;
use crate::util::math::{is_constant, mean, population_variance};

/// Mean and population standard deviation of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub mean: f64,
    pub std: f64,
}

impl ColumnStats {
    pub fn of(values: &[f64]) -> Self {
        if is_constant(values) {
            return ColumnStats {
                mean: values.first().copied().unwrap_or(0.0),
                std: 0.0,
            };
        }
        ColumnStats {
            mean: mean(values),
            std: population_variance(values).sqrt(),
        }
    }

    fn divisor(&self) -> f64 {
        if self.std == 0.0 {
            1.0
        } else {
            self.std
        }
    }
}

/// Standardize one vector, returning the values and the statistics used.
pub fn standardize_vector(values: &[f64]) -> (Vec<f64>, ColumnStats) {
    let stats = ColumnStats::of(values);
    let div = stats.divisor();
    let out = values.iter().map(|v| (v - stats.mean) / div).collect();
    (out, stats)
}

/// Standardize every column of a matrix independently.
pub fn standardize_columns(matrix: &DenseMatrix) -> DenseMatrix {
    let columns: Vec<Vec<f64>> = (0..matrix.ncols())
        .map(|j| standardize_vector(&matrix.col(j)).0)
        .collect();
    if columns.is_empty() {
        return DenseMatrix::zeros(matrix.nrows(), 0);
    }
    DenseMatrix::from_columns(&columns)
}

/// The response vector y in standardized form, with the raw mean and
/// standard deviation kept for reporting.
#[derive(Debug, Clone)]
pub struct StandardizedResponse {
    values: Vec<f64>,
    stats: ColumnStats,
}

impl StandardizedResponse {
    pub fn new(column: &str, raw: &[f64]) -> Self {
        let (values, stats) = standardize_vector(raw);
        info!(
            "Phenotype '{}' mean: {:.3}, std: {:.3}",
            column, stats.mean, stats.std
        );
        StandardizedResponse { values, stats }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn mean(&self) -> f64 {
        self.stats.mean
    }

    pub fn std(&self) -> f64 {
        self.stats.std
    }
}

/// Background matrix E: columns standardized, then the whole matrix
/// scaled by 1/sqrt(K).
///
/// The scaling happens exactly once, inside [`BackgroundMatrix::from_raw`];
/// there is no other way to build this type.
#[derive(Debug, Clone)]
pub struct BackgroundMatrix {
    matrix: DenseMatrix,
}

impl BackgroundMatrix {
    pub fn from_raw(raw: &DenseMatrix) -> Result<Self, CoreError> {
        let k = raw.ncols();
        if k == 0 {
            return Err(CoreError::EmptyBackground);
        }
        let matrix = standardize_columns(raw).scale(1.0 / (k as f64).sqrt());
        info!("Using {} PCs from local ancestry", k);
        Ok(BackgroundMatrix { matrix })
    }

    pub fn matrix(&self) -> &DenseMatrix {
        &self.matrix
    }

    pub fn n_samples(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of background dimensions K.
    pub fn n_dims(&self) -> usize {
        self.matrix.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardize_vector() {
        let (z, stats) = standardize_vector(&[1.0, 2.0, 3.0, 4.0]);
        assert!((stats.mean - 2.5).abs() < 1e-12);
        assert!((stats.std - 1.25f64.sqrt()).abs() < 1e-12);
        assert!(mean(&z).abs() < 1e-12);
        assert!((population_variance(&z) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_is_zero() {
        let (z, stats) = standardize_vector(&[0.1, 0.1, 0.1]);
        assert_eq!(stats.std, 0.0);
        assert_eq!(z, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_standardize_columns_independent() {
        let m = DenseMatrix::from_columns(&[vec![1.0, 2.0, 3.0], vec![10.0, 10.0, 10.0]]);
        let s = standardize_columns(&m);
        let c0 = s.col(0);
        assert!((c0[0] + 1.5f64.sqrt()).abs() < 1e-12);
        assert!(c0[1].abs() < 1e-12);
        assert_eq!(s.col(1), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_background_scaled_by_sqrt_k() {
        let raw = DenseMatrix::from_columns(&[
            vec![1.0, 2.0, 3.0, 4.0],
            vec![2.0, 0.0, 2.0, 0.0],
            vec![5.0, 1.0, 1.0, 5.0],
            vec![0.0, 1.0, 0.0, 3.0],
        ]);
        let bg = BackgroundMatrix::from_raw(&raw).unwrap();
        assert_eq!(bg.n_dims(), 4);
        assert_eq!(bg.n_samples(), 4);
        // Each column has variance 1/K after scaling.
        for j in 0..4 {
            let v = population_variance(&bg.matrix().col(j));
            assert!((v - 0.25).abs() < 1e-12, "col {} var {}", j, v);
        }
    }

    #[test]
    fn test_empty_background() {
        let raw = DenseMatrix::zeros(5, 0);
        assert!(matches!(
            BackgroundMatrix::from_raw(&raw),
            Err(CoreError::EmptyBackground)
        ));
    }

    #[test]
    fn test_response_keeps_raw_stats() {
        let y = StandardizedResponse::new("trait", &[2.0, 4.0, 6.0]);
        assert!((y.mean() - 4.0).abs() < 1e-12);
        assert!((y.std() - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!(mean(y.values()).abs() < 1e-12);
    }
}
