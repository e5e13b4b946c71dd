//! Null distribution of a quadratic-form score statistic.
//!
//! Under H0, Q = sum_j lambda_j * chi2_1 with lambda the eigenvalues of
//! Phi. Satterthwaite's method matches the first two moments with
//! kappa * chi2(df):
//!   E[Q] = tr(Phi),  Var[Q] = 2 tr(Phi^2)
//!   kappa = tr(Phi^2) / tr(Phi),  df = tr(Phi)^2 / tr(Phi^2)

use statrs::distribution::{ChiSquared, ContinuousCDF};

use gxg_linalg::DenseMatrix;

use super::EngineError;

const MIN_MOMENT: f64 = 1e-30;

pub fn satterthwaite_pvalue(q: f64, phi: &DenseMatrix) -> Result<f64, EngineError> {
    if !q.is_finite() {
        return Err(EngineError::NonConvergence(format!(
            "score statistic is not finite ({})",
            q
        )));
    }

    let mean_q = phi.trace();
    if mean_q < MIN_MOMENT {
        return Ok(1.0);
    }

    // tr(Phi^2) = sum_{j,k} Phi[j,k]^2 for symmetric Phi
    let mut trace_phi_sq = 0.0;
    for j in 0..phi.nrows() {
        for k in 0..phi.ncols() {
            let v = phi.get(j, k);
            trace_phi_sq += v * v;
        }
    }
    if trace_phi_sq < MIN_MOMENT {
        return Ok(1.0);
    }

    let kappa = trace_phi_sq / mean_q;
    let df = mean_q * mean_q / trace_phi_sq;

    let chi2 = ChiSquared::new(df)
        .map_err(|e| EngineError::NonConvergence(format!("chi-squared df {}: {}", df, e)))?;
    Ok(chi2.sf(q.max(0.0) / kappa).clamp(0.0, 1.0))
}
