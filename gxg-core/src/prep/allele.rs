//! Genotype allele-coding normalization.
//!
//! The minor allele is expected to be coded as 2, so the 2-homozygote
//! should be the rarer one. When 2s outnumber 0s the coding is reversed
//! (x -> 2 - x, leaving heterozygotes at 1). The decision and the counts
//! behind it are always logged and returned.

use tracing::{debug, info, warn};

/// Below this many samples a flip is reported as a warning: homozygote
/// counts are too noisy to identify the minor allele reliably.
const SMALL_SAMPLE: usize = 50;

/// A genotype vector after coding normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct AlleleCoding {
    pub genotypes: Vec<f64>,
    pub flipped: bool,
    /// Count of 0 codes in the input.
    pub zeros: usize,
    /// Count of 2 codes in the input.
    pub twos: usize,
}

/// Flip the homozygote codes when 2s outnumber 0s.
pub fn normalize_coding(genotypes: &[f64]) -> AlleleCoding {
    let zeros = genotypes.iter().filter(|&&x| x == 0.0).count();
    let twos = genotypes.iter().filter(|&&x| x == 2.0).count();

    let dosages = genotypes
        .iter()
        .filter(|&&x| x != 0.0 && x != 1.0 && x != 2.0)
        .count();
    if dosages > 0 {
        debug!("{} genotype values are not in {{0, 1, 2}}", dosages);
    }

    if twos > zeros {
        let msg = format!(
            "Flipping SNV coding (more 2s than 0s: {} vs {})",
            twos, zeros
        );
        if genotypes.len() < SMALL_SAMPLE {
            warn!("{} on only {} samples", msg, genotypes.len());
        } else {
            info!("{}", msg);
        }
        AlleleCoding {
            genotypes: genotypes.iter().map(|x| 2.0 - x).collect(),
            flipped: true,
            zeros,
            twos,
        }
    } else {
        info!(
            "SNV coding is correct (more 0s than 2s: {} vs {})",
            zeros, twos
        );
        AlleleCoding {
            genotypes: genotypes.to_vec(),
            flipped: false,
            zeros,
            twos,
        }
    }
}
