//! Test orchestration: validate, construct, fit, score.

use tracing::info;

use gxg_linalg::DenseMatrix;

use crate::error::CoreError;
use crate::lmm::{EngineError, StructuredLmm};
use crate::prep::{append_background, validate_dimensions, BackgroundMatrix, StandardizedResponse};
use crate::result::ResultRecord;

/// Everything the engine needs, fully prepared.
pub struct TestInputs<'a> {
    /// Name of the response column, for reporting.
    pub phenotype: &'a str,
    pub response: &'a StandardizedResponse,
    pub background: &'a BackgroundMatrix,
    /// M, intercept first.
    pub fixed_effects: &'a DenseMatrix,
    /// g after coding normalization.
    pub genotype: &'a [f64],
    /// Also append the E columns to M after validation.
    pub background_as_fixed: bool,
}

/// 1 - exp((null - alt) / N), only when both likelihoods are known.
pub fn variance_explained(null_lml: Option<f64>, alt_lml: Option<f64>, n: usize) -> Option<f64> {
    match (null_lml, alt_lml) {
        (Some(null), Some(alt)) if n > 0 => {
            let v = 1.0 - ((null - alt) / n as f64).exp();
            v.is_finite().then_some(v)
        }
        _ => None,
    }
}

/// Run the interaction test with engine `S`.
///
/// The dimension check always runs first; the engine is never
/// constructed for inconsistent inputs.
pub fn run_interaction_test<S: StructuredLmm>(
    inputs: &TestInputs<'_>,
) -> Result<ResultRecord, CoreError> {
    let y = inputs.response.values();
    let e = inputs.background.matrix();
    let n = validate_dimensions(y, e, inputs.fixed_effects, inputs.genotype)?;

    let m = if inputs.background_as_fixed {
        append_background(inputs.fixed_effects, inputs.background)
    } else {
        inputs.fixed_effects.clone()
    };

    info!("Running StructLMM interaction test");
    let mut engine = S::new(y, &m, e)?;
    engine.fit()?;
    let p_value = engine.score_2dof_inter(inputs.genotype)?;
    if !(0.0..=1.0).contains(&p_value) {
        return Err(EngineError::InvalidPValue(p_value).into());
    }

    let variance_explained = variance_explained(engine.null_lml(), engine.alt_lml(), n);
    if variance_explained.is_none() {
        info!("Variance explained not available from this engine");
    }

    Ok(ResultRecord {
        p_value,
        n_samples: n,
        n_pcs: inputs.background.n_dims(),
        phenotype: inputs.phenotype.to_string(),
        phenotype_mean: inputs.response.mean(),
        phenotype_std: inputs.response.std(),
        variance_explained,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variance_explained_requires_both() {
        assert_eq!(variance_explained(None, Some(1.0), 10), None);
        assert_eq!(variance_explained(Some(1.0), None, 10), None);
        assert_eq!(variance_explained(Some(-5.0), Some(-5.0), 10), Some(0.0));
    }

    #[test]
    fn test_variance_explained_value() {
        let v = variance_explained(Some(-120.0), Some(-100.0), 100).unwrap();
        assert!((v - (1.0 - (-0.2f64).exp())).abs() < 1e-12);
    }
}
