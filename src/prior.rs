//! Prior log-densities for cluster means and covariances.
//!
//! # Mean prior
//!
//! Cluster `l` has `μₗ ~ N(μ⁰ₗ, s² I)` where `μ⁰ₗ` is the seeded mean and `s²`
//! is wide (100 by default), so the prior is only weakly informative.
//!
//! # Covariance prior
//!
//! Following Alvarez et al. (2014) the covariance is split into scales and
//! correlations:
//!
//! ```text
//! λ = sqrt(diag Σ)
//! R = diag(1/λ) Σ diag(1/λ)
//!
//! ln p(R) = -½ (ν + d + 1) ln det R - (ν/2) Σᵢ ln (R⁻¹)ᵢᵢ
//! ln p(λ) = Σᵢ ln N(λᵢ; bᵢ, ξᵢ)
//! ```
//!
//! with `ν = d + 1`, `b = ln sqrt(diag Σ⁰)` taken from the first seeded
//! covariance and `ξᵢ` equal to the iteration count.

use crate::error::{Error, Result};
use crate::linalg::{normal_logpdf, SpdFactor};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Weakly-informative normal prior on each cluster mean.
#[derive(Debug, Clone)]
pub struct MeanPrior {
    centers: Array2<f64>,
    factor: SpdFactor,
}

impl MeanPrior {
    /// `centers` holds one prior mean per cluster; `var` is the diagonal
    /// prior variance shared by every axis.
    pub fn new(centers: Array2<f64>, var: f64) -> Result<Self> {
        let d = centers.ncols();
        let cov = Array2::from_diag_elem(d, var);
        let factor = SpdFactor::new(cov.view()).ok_or(Error::InvalidParameter {
            name: "mean_prior_var",
            message: "must be finite and > 0",
        })?;
        Ok(Self { centers, factor })
    }

    /// Log prior density of `mean` for `cluster`.
    pub fn log_prob(&self, cluster: usize, mean: ArrayView1<'_, f64>) -> f64 {
        self.factor.mvn_logpdf(mean, self.centers.row(cluster))
    }
}

/// Scale/correlation prior on covariance matrices.
#[derive(Debug, Clone)]
pub struct CovariancePrior {
    /// Location of the scale prior per axis.
    b: Array1<f64>,
    /// Spread of the scale prior per axis.
    kesi: Array1<f64>,
    /// Degrees of freedom of the correlation prior.
    nu: f64,
}

impl CovariancePrior {
    /// Explicit hyperparameters.
    pub fn new(b: Array1<f64>, kesi: Array1<f64>, nu: f64) -> Result<Self> {
        if b.len() != kesi.len() {
            return Err(Error::DimensionMismatch {
                what: "covariance prior kesi",
                expected: b.len(),
                found: kesi.len(),
            });
        }
        if kesi.iter().any(|&k| !(k.is_finite() && k > 0.0)) {
            return Err(Error::InvalidParameter {
                name: "kesi",
                message: "must be finite and > 0",
            });
        }
        Ok(Self { b, kesi, nu })
    }

    /// Hyperparameters derived from a reference covariance and the number of
    /// iterations: `b = ln sqrt(diag Σ⁰)`, `ξ = n_gibbs`, `ν = d + 1`.
    pub fn from_reference(reference: ArrayView2<'_, f64>, n_gibbs: usize) -> Result<Self> {
        let d = reference.nrows();
        if reference.diag().iter().any(|&v| !(v > 0.0)) {
            return Err(Error::InvalidParameter {
                name: "covariances",
                message: "diagonal must be positive",
            });
        }
        // A zero-iteration run never evaluates the prior; keep the scale valid.
        let kesi = (n_gibbs.max(1)) as f64;
        Self::new(
            reference.diag().mapv(|v| v.sqrt().ln()),
            Array1::from_elem(d, kesi),
            (d + 1) as f64,
        )
    }

    /// Feature count the prior was built for.
    pub fn n_features(&self) -> usize {
        self.b.len()
    }

    /// Log prior density of the covariance of `cluster`.
    ///
    /// Fails with `DimensionMismatch` when `cov` is not `n_features` square,
    /// and with `NotPositiveDefinite` when it is not positive-definite.
    pub fn log_prob(&self, cluster: usize, cov: ArrayView2<'_, f64>) -> Result<f64> {
        let d = self.n_features();
        if cov.nrows() != d || cov.ncols() != d {
            return Err(Error::DimensionMismatch {
                what: "covariance prior size",
                expected: d,
                found: if cov.nrows() != d { cov.nrows() } else { cov.ncols() },
            });
        }
        let lam = cov.diag().mapv(f64::sqrt);
        if lam.iter().any(|&l| !(l > 0.0 && l.is_finite())) {
            return Err(Error::NotPositiveDefinite { cluster });
        }
        let r = Array2::from_shape_fn((d, d), |(i, j)| cov[[i, j]] / (lam[i] * lam[j]));
        let factor = SpdFactor::new(r.view()).ok_or(Error::NotPositiveDefinite { cluster })?;

        let inv_diag_log: f64 = factor.inverse().diag().iter().map(|v| v.ln()).sum();
        let log_p_r = -0.5 * (self.nu + d as f64 + 1.0) * factor.log_det() - 0.5 * self.nu * inv_diag_log;

        let log_p_lam: f64 = lam
            .iter()
            .zip(self.b.iter().zip(self.kesi.iter()))
            .map(|(&l, (&b, &k))| normal_logpdf(l, b, k))
            .sum();

        Ok(log_p_r + log_p_lam)
    }
}
