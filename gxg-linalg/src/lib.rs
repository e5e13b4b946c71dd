//! gxg-linalg: Linear algebra wrappers for gxg
//!
//! Provides the dense matrix type and the Cholesky-based solvers
//! used by the preparation pipeline and the structured LMM.

pub mod decomposition;
pub mod dense;

pub use decomposition::{CholeskyDecomp, LinalgError};
pub use dense::DenseMatrix;
