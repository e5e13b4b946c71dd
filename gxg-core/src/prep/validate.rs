//! Cross-source sample count check.
//!
//! y, E, M and g are aligned purely by row position. A silent length
//! difference would misalign every sample without any numerical error
//! downstream, so this check runs before the engine is constructed.

use tracing::info;

use gxg_linalg::DenseMatrix;

use crate::error::CoreError;

/// Check len(y) == rows(E) == rows(M) == len(g) and return N.
pub fn validate_dimensions(
    y: &[f64],
    e: &DenseMatrix,
    m: &DenseMatrix,
    g: &[f64],
) -> Result<usize, CoreError> {
    let n = y.len();
    if e.nrows() != n || m.nrows() != n || g.len() != n {
        return Err(CoreError::DimensionMismatch {
            y: n,
            e: e.nrows(),
            m: m.nrows(),
            g: g.len(),
        });
    }
    info!(
        "Data dimensions: samples: {}, PCs: {}, covariates: {}",
        n,
        e.ncols(),
        m.ncols().saturating_sub(1)
    );
    Ok(n)
}
