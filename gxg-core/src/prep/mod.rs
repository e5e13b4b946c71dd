//! Input preparation stages.
//!
//! Standardization of y and E, allele-coding normalization of g,
//! fixed-effect assembly of M and the mandatory dimension check.

pub mod allele;
pub mod design;
pub mod standardize;
pub mod validate;

pub use allele::{normalize_coding, AlleleCoding};
pub use design::{append_background, assemble_fixed_effects};
pub use standardize::{standardize_columns, standardize_vector, BackgroundMatrix, StandardizedResponse};
pub use validate::validate_dimensions;
