//! Sampler hyperparameters.

use crate::error::{Error, Result};

/// Order in which a Gibbs sweep visits elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepOrder {
    /// Index order; each element sees labels redrawn earlier in the same sweep.
    #[default]
    Sequential,
    /// Color class by color class; elements of one class read the snapshot
    /// taken when the class starts and are committed together.
    Checkerboard,
}

/// Configuration for [`HmrfGmm`](crate::HmrfGmm).
#[derive(Debug, Clone)]
pub struct HmrfConfig {
    /// Total Gibbs/Metropolis iterations.
    n_gibbs: usize,
    /// Number of clusters.
    n_labels: usize,
    /// Initial (and, with the default schedule, fixed) MRF weight.
    beta: f64,
    /// Variance of the mean random walk.
    mu_step: f64,
    /// Variance of the log-eigenvalue random walk.
    cov_step: f64,
    /// Standard deviation of the eigenvector rotation angle.
    rotation_std: f64,
    /// Diagonal variance of the mean prior.
    mean_prior_var: f64,
    /// Sweep order.
    sweep_order: SweepOrder,
    /// Random seed.
    seed: Option<u64>,
}

impl HmrfConfig {
    /// Create a configuration with the default hyperparameters.
    pub fn new() -> Self {
        Self {
            n_gibbs: 100,
            n_labels: 2,
            beta: 0.5,
            mu_step: 0.0005,
            cov_step: 0.00005,
            rotation_std: 0.005,
            mean_prior_var: 100.0,
            sweep_order: SweepOrder::Sequential,
            seed: None,
        }
    }

    /// Set the number of iterations.
    pub fn with_n_gibbs(mut self, n_gibbs: usize) -> Self {
        self.n_gibbs = n_gibbs;
        self
    }

    /// Set the number of labels.
    pub fn with_n_labels(mut self, n_labels: usize) -> Self {
        self.n_labels = n_labels;
        self
    }

    /// Set the MRF weight.
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Set the mean proposal variance.
    pub fn with_mu_step(mut self, mu_step: f64) -> Self {
        self.mu_step = mu_step;
        self
    }

    /// Set the covariance proposal variance.
    pub fn with_cov_step(mut self, cov_step: f64) -> Self {
        self.cov_step = cov_step;
        self
    }

    /// Set the rotation angle standard deviation.
    pub fn with_rotation_std(mut self, rotation_std: f64) -> Self {
        self.rotation_std = rotation_std;
        self
    }

    /// Set the variance of the mean prior.
    pub fn with_mean_prior_var(mut self, var: f64) -> Self {
        self.mean_prior_var = var;
        self
    }

    /// Set the sweep order.
    pub fn with_sweep_order(mut self, order: SweepOrder) -> Self {
        self.sweep_order = order;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Total iterations.
    pub fn n_gibbs(&self) -> usize {
        self.n_gibbs
    }

    /// Number of clusters.
    pub fn n_labels(&self) -> usize {
        self.n_labels
    }

    /// Initial MRF weight.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn mu_step(&self) -> f64 {
        self.mu_step
    }

    pub fn cov_step(&self) -> f64 {
        self.cov_step
    }

    pub fn rotation_std(&self) -> f64 {
        self.rotation_std
    }

    pub fn mean_prior_var(&self) -> f64 {
        self.mean_prior_var
    }

    pub fn sweep_order(&self) -> SweepOrder {
        self.sweep_order
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.n_labels == 0 {
            return Err(Error::InvalidParameter {
                name: "n_labels",
                message: "must be > 0",
            });
        }
        if !(self.beta.is_finite() && self.beta >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "beta",
                message: "must be finite and >= 0",
            });
        }
        for (name, v) in [
            ("mu_step", self.mu_step),
            ("cov_step", self.cov_step),
            ("rotation_std", self.rotation_std),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(Error::InvalidParameter {
                    name,
                    message: "must be finite and >= 0",
                });
            }
        }
        if !(self.mean_prior_var.is_finite() && self.mean_prior_var > 0.0) {
            return Err(Error::InvalidParameter {
                name: "mean_prior_var",
                message: "must be finite and > 0",
            });
        }
        Ok(())
    }
}

impl Default for HmrfConfig {
    fn default() -> Self {
        Self::new()
    }
}
