//! Errors raised while preparing inputs and running the interaction test.

use thiserror::Error;

use crate::lmm::EngineError;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Sources disagree on the number of samples. Checked before the
    /// engine is constructed.
    #[error("Inconsistent data sizes: y: {y}, E: {e}, M: {m}, g: {g}")]
    DimensionMismatch {
        y: usize,
        e: usize,
        m: usize,
        g: usize,
    },

    #[error("Background matrix has no columns")]
    EmptyBackground,

    #[error("StructLMM analysis failed: {0}")]
    ModelFitting(#[from] EngineError),

    #[error("Failed to write results: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write results: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write results: {0}")]
    Json(#[from] serde_json::Error),
}
