//! Built-in structured LMM.
//!
//! Null model:
//!   y = M alpha + u + e,   Cov(y) = sigma2 * (rho * E E' + (1 - rho) * I)
//!
//! `fit` maximises the profile likelihood over rho (alpha and sigma2 have
//! closed-form GLS solutions for fixed rho). The interaction test treats
//! G = diag(g) [1, E] as an extra variance component and scores it at the
//! null fit:
//!   Q   = 1/2 |G' P y|^2 / sigma2
//!   Phi = 1/2 G' P G
//! where P is the GLS projection under V. The p-value matches the first
//! two moments of Q.

use std::f64::consts::PI;

use tracing::debug;

use gxg_linalg::{CholeskyDecomp, DenseMatrix};

use super::kernel::{Covariance, EnvironmentKernel};
use super::moments::satterthwaite_pvalue;
use super::{EngineError, StructuredLmm};
use crate::util::math::{golden_section_max, is_constant};

/// Search settings for the variance-component fit.
#[derive(Debug, Clone)]
pub struct StructLmmConfig {
    /// Upper bound of the rho search; rho = 1 makes V singular.
    pub rho_max: f64,
    /// Stop once the rho bracket is narrower than this.
    pub rho_tol: f64,
    pub max_iter: usize,
}

impl Default for StructLmmConfig {
    fn default() -> Self {
        Self {
            rho_max: 1.0 - 1e-4,
            rho_tol: 1e-6,
            max_iter: 200,
        }
    }
}

/// GLS solution at a fixed rho.
struct GlsFit {
    beta: Vec<f64>,
    sigma2: f64,
    lml: f64,
    /// V^{-1} (y - X beta)
    py: Vec<f64>,
}

fn gls(cov: &Covariance<'_>, x: &DenseMatrix, y: &[f64]) -> Result<GlsFit, EngineError> {
    let n = y.len() as f64;
    let xtvx = x.t_mat_mul(&cov.solve_matrix(x));
    let chol = CholeskyDecomp::new(&xtvx)?;
    let beta = chol.solve(&x.t_mat_vec(&cov.solve(y)));

    let fitted = x.mat_vec(&beta);
    let resid: Vec<f64> = y.iter().zip(&fitted).map(|(yi, fi)| yi - fi).collect();
    let py = cov.solve(&resid);
    let sigma2 = DenseMatrix::dot(&resid, &py) / n;
    if !(sigma2.is_finite() && sigma2 > 0.0) {
        return Err(EngineError::NonConvergence(format!(
            "residual variance {} at rho {}",
            sigma2,
            cov.rho()
        )));
    }

    let lml = -0.5 * (n * (2.0 * PI * sigma2).ln() + cov.log_det() + n);
    Ok(GlsFit {
        beta,
        sigma2,
        lml,
        py,
    })
}

#[derive(Debug, Clone)]
struct NullModel {
    rho: f64,
    sigma2: f64,
    lml: f64,
    py: Vec<f64>,
}

pub struct StructLmm {
    y: Vec<f64>,
    m: DenseMatrix,
    kernel: EnvironmentKernel,
    config: StructLmmConfig,
    null: Option<NullModel>,
    alt_lml: Option<f64>,
}

impl StructLmm {
    pub fn with_config(
        y: &[f64],
        m: &DenseMatrix,
        e: &DenseMatrix,
        config: StructLmmConfig,
    ) -> Result<Self, EngineError> {
        let n = y.len();
        if m.nrows() != n || e.nrows() != n {
            return Err(EngineError::InvalidInput(format!(
                "y has {} samples, M has {} rows, E has {} rows",
                n,
                m.nrows(),
                e.nrows()
            )));
        }
        if m.ncols() == 0 || e.ncols() == 0 {
            return Err(EngineError::InvalidInput(
                "M and E need at least one column".into(),
            ));
        }
        if y.iter().any(|v| !v.is_finite()) || !m.is_finite() || !e.is_finite() {
            return Err(EngineError::InvalidInput("non-finite input value".into()));
        }
        Ok(StructLmm {
            y: y.to_vec(),
            m: m.clone(),
            kernel: EnvironmentKernel::new(e),
            config,
            null: None,
            alt_lml: None,
        })
    }

    /// Estimated rho of the null model.
    pub fn rho(&self) -> Option<f64> {
        self.null.as_ref().map(|n| n.rho)
    }

    fn profile(&self, rho: f64, x: &DenseMatrix) -> Result<GlsFit, EngineError> {
        let cov = self.kernel.covariance(rho)?;
        gls(&cov, x, &self.y)
    }

    /// Maximise the profile likelihood over rho for fixed effects `x`.
    fn optimize(&self, x: &DenseMatrix) -> Result<(f64, GlsFit), EngineError> {
        let rho = golden_section_max(
            |r| self.profile(r, x).map(|f| f.lml).unwrap_or(f64::NEG_INFINITY),
            0.0,
            self.config.rho_max,
            self.config.rho_tol,
            self.config.max_iter,
        );
        let fit = self
            .profile(rho, x)
            .map_err(|e| EngineError::NonConvergence(format!("no valid rho in [0, 1): {}", e)))?;
        if !fit.lml.is_finite() {
            return Err(EngineError::NonConvergence(format!(
                "log-likelihood {} at rho {}",
                fit.lml, rho
            )));
        }
        Ok((rho, fit))
    }
}

impl StructuredLmm for StructLmm {
    fn new(y: &[f64], m: &DenseMatrix, e: &DenseMatrix) -> Result<Self, EngineError> {
        Self::with_config(y, m, e, StructLmmConfig::default())
    }

    fn fit(&mut self) -> Result<(), EngineError> {
        let (rho, fit) = self.optimize(&self.m)?;
        debug!(
            "Null model: rho = {:.4}, sigma2 = {:.4}, lml = {:.4}, beta = {:?}",
            rho, fit.sigma2, fit.lml, fit.beta
        );
        self.null = Some(NullModel {
            rho,
            sigma2: fit.sigma2,
            lml: fit.lml,
            py: fit.py,
        });
        self.alt_lml = None;
        Ok(())
    }

    fn score_2dof_inter(&mut self, g: &[f64]) -> Result<f64, EngineError> {
        let null = self.null.as_ref().ok_or(EngineError::NotFitted)?;
        if g.len() != self.y.len() {
            return Err(EngineError::InvalidInput(format!(
                "genotype has {} samples, model has {}",
                g.len(),
                self.y.len()
            )));
        }
        if g.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::InvalidInput(
                "non-finite genotype value".into(),
            ));
        }
        if is_constant(g) {
            debug!("Genotype has zero variance, returning p = 1");
            // [M, g] spans the same space as M, so the alternative is the null.
            self.alt_lml = Some(null.lml);
            return Ok(1.0);
        }

        let cov = self.kernel.covariance(null.rho)?;
        let gmat = DenseMatrix::from_columns(&[g.to_vec()]).hcat(&self.kernel.e().scale_rows(g));

        let score = gmat.t_mat_vec(&null.py);
        let q = 0.5 * DenseMatrix::dot(&score, &score) / null.sigma2;

        let vinv_g = cov.solve_matrix(&gmat);
        let gtvg = gmat.t_mat_mul(&vinv_g);
        let xtvg = self.m.t_mat_mul(&vinv_g);
        let xtvx = self.m.t_mat_mul(&cov.solve_matrix(&self.m));
        let chol = CholeskyDecomp::new(&xtvx)?;
        let correction = xtvg.t_mat_mul(&chol.solve_matrix(&xtvg));
        let phi = gtvg.sub(&correction).scale(0.5);

        let p = satterthwaite_pvalue(q, &phi)?;
        debug!("Interaction score: Q = {:.4}, tr(Phi) = {:.4}", q, phi.trace());

        let x_alt = self.m.hcat(&DenseMatrix::from_columns(&[g.to_vec()]));
        self.alt_lml = match self.optimize(&x_alt) {
            Ok((_, fit)) => Some(fit.lml),
            Err(e) => {
                debug!("Alternative model fit failed: {}", e);
                None
            }
        };
        Ok(p)
    }

    fn null_lml(&self) -> Option<f64> {
        self.null.as_ref().map(|n| n.lml)
    }

    fn alt_lml(&self) -> Option<f64> {
        self.alt_lml
    }
}
