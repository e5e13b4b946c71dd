//! Genotype and covariate extraction from loaded tables.

use tracing::info;

use gxg_linalg::DenseMatrix;

use crate::error::InputError;
use crate::table::RawTable;

/// Named covariate matrix, identifier column removed.
#[derive(Debug, Clone)]
pub struct Covariates {
    pub names: Vec<String>,
    pub matrix: DenseMatrix,
}

/// Genotype vector of an SNV table: identifier first, genotype second.
pub fn genotype_vector(table: &RawTable) -> Result<Vec<f64>, InputError> {
    if table.n_cols() < 2 {
        return Err(InputError::TooFewColumns {
            path: table.path().display().to_string(),
            expected: 2,
            found: table.n_cols(),
        });
    }
    info!("Using genotype column: {}", table.columns()[1]);
    table.numeric_column(1)
}

/// Every column after the identifier, as a covariate matrix.
pub fn covariate_matrix(table: &RawTable) -> Result<Covariates, InputError> {
    if table.n_cols() < 2 {
        return Err(InputError::TooFewColumns {
            path: table.path().display().to_string(),
            expected: 2,
            found: table.n_cols(),
        });
    }
    let indices: Vec<usize> = (1..table.n_cols()).collect();
    let matrix = table.numeric_matrix(&indices)?;
    let names = table.columns()[1..].to_vec();
    info!("Using {} covariates: {}", names.len(), names.join(", "));
    Ok(Covariates { names, matrix })
}
