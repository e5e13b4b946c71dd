//! Sample identifier audit.
//!
//! Sources are aligned by row position, never joined by identifier.
//! This module only reports where the identifier columns of two
//! sources disagree so a misaligned input can be spotted.

use crate::error::InputError;

/// First position at which two identifier sequences differ.
#[derive(Debug, Clone, PartialEq)]
pub struct IdMismatch {
    /// Zero-based row.
    pub row: usize,
    pub expected: Option<String>,
    pub found: Option<String>,
}

/// Compare two identifier sequences position by position.
///
/// A length difference is reported at the first row past the shorter
/// sequence.
pub fn first_mismatch(reference: &[String], other: &[String]) -> Option<IdMismatch> {
    let shared = reference.len().min(other.len());
    if let Some(row) = (0..shared).find(|&i| reference[i] != other[i]) {
        return Some(IdMismatch {
            row,
            expected: Some(reference[row].clone()),
            found: Some(other[row].clone()),
        });
    }
    if reference.len() != other.len() {
        return Some(IdMismatch {
            row: shared,
            expected: reference.get(shared).cloned(),
            found: other.get(shared).cloned(),
        });
    }
    None
}

impl IdMismatch {
    /// Turn the mismatch into a fatal error naming both sources.
    pub fn into_error(self, reference: &str, source_name: &str) -> InputError {
        InputError::SampleIdMismatch {
            reference: reference.to_string(),
            source_name: source_name.to_string(),
            row: self.row + 1,
            expected: self.expected.unwrap_or_else(|| "<end>".to_string()),
            found: self.found.unwrap_or_else(|| "<end>".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identical_sequences() {
        let a = ids(&["A", "B", "C"]);
        assert_eq!(first_mismatch(&a, &a.clone()), None);
    }

    #[test]
    fn test_reordered_sequences() {
        let a = ids(&["A", "B", "C"]);
        let b = ids(&["A", "C", "B"]);
        let m = first_mismatch(&a, &b).unwrap();
        assert_eq!(m.row, 1);
        assert_eq!(m.expected.as_deref(), Some("B"));
        assert_eq!(m.found.as_deref(), Some("C"));
    }

    #[test]
    fn test_length_difference() {
        let a = ids(&["A", "B", "C"]);
        let b = ids(&["A", "B"]);
        let m = first_mismatch(&a, &b).unwrap();
        assert_eq!(m.row, 2);
        assert_eq!(m.found, None);

        let err = m.into_error("phenotype", "snv");
        assert!(err.to_string().contains("row 3"));
        assert!(err.to_string().contains("<end>"));
    }
}
