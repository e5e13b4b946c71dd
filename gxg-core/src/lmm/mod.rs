//! Structured linear mixed models.
//!
//! The orchestrator only depends on [`StructuredLmm`]: construct with
//! (y, M, E), fit the variance components, then score a genotype with
//! the joint two degree-of-freedom interaction test. [`StructLmm`] is
//! the built-in implementation.

pub mod kernel;
pub mod moments;
pub mod structlmm;

use thiserror::Error;

use gxg_linalg::{DenseMatrix, LinalgError};

pub use kernel::{Covariance, EnvironmentKernel};
pub use moments::satterthwaite_pvalue;
pub use structlmm::{StructLmm, StructLmmConfig};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("model must be fitted before scoring")]
    NotFitted,

    #[error("fit did not converge: {0}")]
    NonConvergence(String),

    #[error(transparent)]
    Linalg(#[from] LinalgError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("engine returned p-value {0} outside [0, 1]")]
    InvalidPValue(f64),
}

/// Contract of a structured-LMM engine.
pub trait StructuredLmm: Sized {
    /// Construct from the response, fixed effects and background matrix.
    fn new(y: &[f64], m: &DenseMatrix, e: &DenseMatrix) -> Result<Self, EngineError>;

    /// Estimate the variance components of the null model.
    fn fit(&mut self) -> Result<(), EngineError>;

    /// Joint 2-dof test of the genotype main effect and its interaction
    /// with the background. Returns a p-value.
    fn score_2dof_inter(&mut self, g: &[f64]) -> Result<f64, EngineError>;

    /// Log marginal likelihood of the fitted null model, if exposed.
    fn null_lml(&self) -> Option<f64> {
        None
    }

    /// Log marginal likelihood of the last scored alternative, if exposed.
    fn alt_lml(&self) -> Option<f64> {
        None
    }
}
