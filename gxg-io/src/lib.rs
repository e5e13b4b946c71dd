//! gxg-io: Input loading for the gxg interaction test
//!
//! Loads delimited phenotype, SNV, covariate and ancestry-PC tables,
//! resolves the response column, selects background columns and
//! audits sample identifiers across sources.

pub mod background;
pub mod columns;
pub mod error;
pub mod extract;
pub mod sample;
pub mod table;

pub use error::InputError;
pub use table::{load_table, Cell, Delimiter, HeaderLayout, RawTable};
