//! Low-rank covariance V = rho * E E' + (1 - rho) * I.
//!
//! Solves and determinants go through the Woodbury identity:
//!   V^{-1} = (1/a) [I - E (c I + E'E)^{-1} E'],   a = 1 - rho, c = a / rho
//!   log|V| = N log a + log|c I + E'E| - K log c
//! so only the K x K core is ever factorised.

use gxg_linalg::{CholeskyDecomp, DenseMatrix, LinalgError};

/// Background matrix E with its cross product E'E cached.
#[derive(Debug, Clone)]
pub struct EnvironmentKernel {
    e: DenseMatrix,
    ete: DenseMatrix,
}

impl EnvironmentKernel {
    pub fn new(e: &DenseMatrix) -> Self {
        EnvironmentKernel {
            ete: e.t_mat_mul(e),
            e: e.clone(),
        }
    }

    pub fn n_samples(&self) -> usize {
        self.e.nrows()
    }

    pub fn n_dims(&self) -> usize {
        self.e.ncols()
    }

    pub fn e(&self) -> &DenseMatrix {
        &self.e
    }

    /// Factorise V for a given rho in [0, 1).
    pub fn covariance(&self, rho: f64) -> Result<Covariance<'_>, LinalgError> {
        if !(0.0..1.0).contains(&rho) {
            return Err(LinalgError::NotPositiveDefinite);
        }
        let a = 1.0 - rho;
        let core = if rho > 0.0 {
            let mut core = self.ete.clone();
            core.add_to_diag(a / rho);
            Some(CholeskyDecomp::new(&core)?)
        } else {
            None
        };
        Ok(Covariance {
            kernel: self,
            rho,
            a,
            core,
        })
    }
}

/// V at a fixed rho. With rho = 0 this is the identity.
pub struct Covariance<'a> {
    kernel: &'a EnvironmentKernel,
    rho: f64,
    a: f64,
    core: Option<CholeskyDecomp>,
}

impl Covariance<'_> {
    pub fn rho(&self) -> f64 {
        self.rho
    }

    /// V^{-1} v
    pub fn solve(&self, v: &[f64]) -> Vec<f64> {
        let mut x: Vec<f64> = v.iter().map(|vi| vi / self.a).collect();
        if let Some(core) = &self.core {
            let s = core.solve(&self.kernel.e.t_mat_vec(v));
            let es = self.kernel.e.mat_vec(&s);
            for (xi, esi) in x.iter_mut().zip(&es) {
                *xi -= esi / self.a;
            }
        }
        x
    }

    /// V^{-1} B
    pub fn solve_matrix(&self, b: &DenseMatrix) -> DenseMatrix {
        let scaled = b.scale(1.0 / self.a);
        match &self.core {
            Some(core) => {
                let s = core.solve_matrix(&self.kernel.e.t_mat_mul(b));
                scaled.sub(&self.kernel.e.mat_mul(&s).scale(1.0 / self.a))
            }
            None => scaled,
        }
    }

    pub fn log_det(&self) -> f64 {
        let n = self.kernel.n_samples() as f64;
        match &self.core {
            Some(core) => {
                let c = self.a / self.rho;
                n * self.a.ln() + core.log_det() - self.kernel.n_dims() as f64 * c.ln()
            }
            None => n * self.a.ln(),
        }
    }

    /// V v
    pub fn mat_vec(&self, v: &[f64]) -> Vec<f64> {
        let eev = self.kernel.e.mat_vec(&self.kernel.e.t_mat_vec(v));
        v.iter()
            .zip(&eev)
            .map(|(vi, ei)| self.a * vi + self.rho * ei)
            .collect()
    }
}
