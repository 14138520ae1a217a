//! Random-walk proposals for cluster means and covariances.
//!
//! # Means
//!
//! One jump `δ ~ N(0, mu_step · I)` is drawn per call and added to every
//! cluster's mean row.
//!
//! # Covariances
//!
//! Each covariance is perturbed in its eigenbasis `Σ = V Λ Vᵀ`:
//!
//! ```text
//! Λ* = exp(ln Λ + ε),     ε ~ N(0, cov_step · I)   (one draw per call)
//! V* = V · G(θ),          θ ~ N(0, rotation_std²)   (one draw per cluster)
//! Σ* = V* Λ* V*ᵀ
//! ```
//!
//! `G(θ)` is the Givens rotation in the plane of the first two eigenvectors
//! (the identity for a single feature). `V*` stays orthonormal and `Λ*`
//! stays positive, so `Σ*` is symmetric positive-definite by construction.

use crate::error::{Error, Result};
use crate::linalg::{reassemble, symmetric_eigen};
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, Axis};
use rand::prelude::*;
use rand_distr::{Distribution, Normal};

/// Add the same jump to every row of `means`.
pub fn apply_mean_jump(means: &Array2<f64>, jump: ArrayView1<'_, f64>) -> Array2<f64> {
    means + &jump.insert_axis(Axis(0))
}

/// Perturb one covariance by a log-eigenvalue jump and a rotation angle.
///
/// Returns `None` if `cov` has a non-positive eigenvalue.
pub fn apply_covariance_jump(
    cov: ArrayView2<'_, f64>,
    jump: ArrayView1<'_, f64>,
    theta: f64,
) -> Option<Array2<f64>> {
    let eig = symmetric_eigen(cov);
    if eig.values.iter().any(|&l| l.is_nan() || l <= 0.0) {
        return None;
    }

    let values: Array1<f64> = eig
        .values
        .iter()
        .zip(jump.iter())
        .map(|(&l, &e)| (l.ln() + e).exp())
        .collect();

    let mut vectors = eig.vectors;
    if vectors.ncols() >= 2 {
        let (s, c) = theta.sin_cos();
        for i in 0..vectors.nrows() {
            let v0 = vectors[[i, 0]];
            let v1 = vectors[[i, 1]];
            vectors[[i, 0]] = c * v0 + s * v1;
            vectors[[i, 1]] = -s * v0 + c * v1;
        }
    }

    Some(reassemble(vectors.view(), values.view()))
}

/// Draws mean and covariance proposals.
#[derive(Debug, Clone)]
pub struct ProposalGenerator {
    n_features: usize,
    mu_jump: Normal<f64>,
    cov_jump: Normal<f64>,
    rotation: Normal<f64>,
}

impl ProposalGenerator {
    /// `mu_step` and `cov_step` are variances; `rotation_std` is a standard
    /// deviation.
    pub fn new(n_features: usize, mu_step: f64, cov_step: f64, rotation_std: f64) -> Result<Self> {
        let normal = |name: &'static str, std: f64| {
            Normal::new(0.0, std).map_err(|_| Error::InvalidParameter {
                name,
                message: "must be finite and >= 0",
            })
        };
        Ok(Self {
            n_features,
            mu_jump: normal("mu_step", mu_step.sqrt())?,
            cov_jump: normal("cov_step", cov_step.sqrt())?,
            rotation: normal("rotation_std", rotation_std)?,
        })
    }

    fn draw_vector<R: Rng + ?Sized>(&self, dist: &Normal<f64>, rng: &mut R) -> Array1<f64> {
        (0..self.n_features).map(|_| dist.sample(rng)).collect()
    }

    /// Propose new means: one shared jump for all clusters.
    pub fn propose_means<R: Rng + ?Sized>(&self, means: &Array2<f64>, rng: &mut R) -> Array2<f64> {
        let jump = self.draw_vector(&self.mu_jump, rng);
        apply_mean_jump(means, jump.view())
    }

    /// Propose new covariances for every cluster.
    pub fn propose_covariances<R: Rng + ?Sized>(
        &self,
        covariances: &Array3<f64>,
        rng: &mut R,
    ) -> Result<Array3<f64>> {
        let jump = self.draw_vector(&self.cov_jump, rng);
        let mut proposed = Array3::zeros(covariances.raw_dim());
        for (c, cov) in covariances.outer_iter().enumerate() {
            let theta = self.rotation.sample(rng);
            let next = apply_covariance_jump(cov, jump.view(), theta)
                .ok_or(Error::NotPositiveDefinite { cluster: c })?;
            proposed.index_axis_mut(Axis(0), c).assign(&next);
        }
        Ok(proposed)
    }
}
