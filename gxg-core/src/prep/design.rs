//! Fixed-effect design matrix assembly.

use tracing::{info, warn};

use gxg_linalg::DenseMatrix;

use super::standardize::BackgroundMatrix;

/// Build M = [1, covariates].
///
/// Covariates are appended as-is, without standardization. When they
/// are given, the intercept follows their row count so a short
/// covariate file surfaces in the dimension check rather than here.
pub fn assemble_fixed_effects(n_samples: usize, covariates: Option<&DenseMatrix>) -> DenseMatrix {
    match covariates {
        Some(cov) => {
            if cov.nrows() != n_samples {
                warn!(
                    "Covariates have {} rows, phenotype has {}",
                    cov.nrows(),
                    n_samples
                );
            }
            info!("Using {} covariates", cov.ncols());
            DenseMatrix::full(cov.nrows(), 1, 1.0).hcat(cov)
        }
        None => {
            info!("No covariates provided, using intercept only");
            DenseMatrix::full(n_samples, 1, 1.0)
        }
    }
}

/// Append the background columns to M as extra fixed effects.
///
/// Both matrices must already have passed the dimension check.
pub fn append_background(m: &DenseMatrix, background: &BackgroundMatrix) -> DenseMatrix {
    info!(
        "Adding {} background columns as fixed effects",
        background.n_dims()
    );
    m.hcat(background.matrix())
}
