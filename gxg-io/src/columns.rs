//! Response column resolution.
//!
//! Picks the trait column of a phenotype table by trying, in order: an
//! explicit name, the first column whose name contains "phenotype"
//! (case-insensitive), and finally the second column.

use tracing::{info, warn};

use crate::error::InputError;
use crate::table::RawTable;

/// Substring searched for by [`ResolutionStrategy::NameContainsPhenotype`].
const PHENOTYPE_MARKER: &str = "phenotype";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    Explicit,
    NameContainsPhenotype,
    SecondColumn,
}

/// The chosen response column and how it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    pub name: String,
    pub index: usize,
    pub strategy: ResolutionStrategy,
}

/// Resolve the response column of a phenotype table.
pub fn resolve_response_column(
    table: &RawTable,
    explicit: Option<&str>,
) -> Result<ResolvedColumn, InputError> {
    let path = table.path().display().to_string();

    if let Some(name) = explicit {
        let index = table
            .column_index(name)
            .ok_or_else(|| InputError::ColumnNotFound {
                column: name.to_string(),
                path: path.clone(),
            })?;
        info!("Using phenotype column: {} (explicit)", name);
        return Ok(ResolvedColumn {
            name: name.to_string(),
            index,
            strategy: ResolutionStrategy::Explicit,
        });
    }

    let matches: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.to_lowercase().contains(PHENOTYPE_MARKER))
        .map(|(i, _)| i)
        .collect();
    if let Some(&index) = matches.first() {
        let name = table.columns()[index].clone();
        if matches.len() > 1 {
            let others: Vec<&str> = matches[1..]
                .iter()
                .map(|&i| table.columns()[i].as_str())
                .collect();
            warn!(
                "Several phenotype-like columns in {}; using '{}' and ignoring {}",
                path,
                name,
                others.join(", ")
            );
        }
        info!("Using phenotype column: {}", name);
        return Ok(ResolvedColumn {
            name,
            index,
            strategy: ResolutionStrategy::NameContainsPhenotype,
        });
    }

    if table.n_cols() > 1 {
        let name = table.columns()[1].clone();
        info!("No column with 'phenotype' found. Using column: {}", name);
        return Ok(ResolvedColumn {
            name,
            index: 1,
            strategy: ResolutionStrategy::SecondColumn,
        });
    }

    Err(InputError::ColumnResolution { path })
}
