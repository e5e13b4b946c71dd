//! Background (environment) column selection from an ancestry-PC table.

use tracing::{info, warn};

use gxg_linalg::DenseMatrix;

use crate::error::InputError;
use crate::table::RawTable;

/// Default prefix of principal-component columns.
pub const DEFAULT_PC_PREFIX: &str = "PC";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundStrategy {
    /// Columns whose name starts with the PC prefix.
    PrefixMatch,
    /// Every fully numeric column except the identifier.
    NumericFallback,
}

/// Raw (unstandardized) background matrix and the audit of its columns.
#[derive(Debug, Clone)]
pub struct BackgroundColumns {
    pub selected: Vec<String>,
    pub discarded: Vec<String>,
    pub strategy: BackgroundStrategy,
    pub matrix: DenseMatrix,
}

/// Select the background columns of `table`, keeping file order.
///
/// Column 0 is the row identifier and is never selected.
pub fn select_background(table: &RawTable, prefix: &str) -> Result<BackgroundColumns, InputError> {
    let candidates = 1..table.n_cols();
    let mut indices: Vec<usize> = candidates
        .clone()
        .filter(|&i| table.columns()[i].starts_with(prefix))
        .collect();
    let mut strategy = BackgroundStrategy::PrefixMatch;

    if indices.is_empty() {
        warn!(
            "No columns starting with '{}' found. Using all numeric columns.",
            prefix
        );
        indices = candidates.filter(|&i| table.is_numeric_column(i)).collect();
        strategy = BackgroundStrategy::NumericFallback;
    }
    if indices.is_empty() {
        return Err(InputError::NoBackgroundColumns {
            path: table.path().display().to_string(),
        });
    }

    let selected: Vec<String> = indices.iter().map(|&i| table.columns()[i].clone()).collect();
    let discarded: Vec<String> = (0..table.n_cols())
        .filter(|i| !indices.contains(i))
        .map(|i| table.columns()[i].clone())
        .collect();

    info!("Using these PC columns: {}", selected.join(", "));
    if !discarded.is_empty() {
        info!("Discarded columns: {}", discarded.join(", "));
    }

    let matrix = table.numeric_matrix(&indices)?;
    Ok(BackgroundColumns {
        selected,
        discarded,
        strategy,
        matrix,
    })
}
