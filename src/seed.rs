//! Initial cluster parameters from a full-covariance Gaussian mixture.
//!
//! The sampler needs a starting point: one mean and one covariance per
//! label, plus a starting label field. A plain (non-spatial) GMM fit provides
//! all three.
//!
//! # The EM Algorithm
//!
//! **E-step**: responsibilities
//! ```text
//! γₙₖ = πₖ N(xₙ | μₖ, Σₖ) / Σⱼ πⱼ N(xₙ | μⱼ, Σⱼ)
//! ```
//!
//! **M-step**:
//! - Nₖ = Σₙ γₙₖ, πₖ = Nₖ / N
//! - μₖ = Σₙ γₙₖ xₙ / Nₖ
//! - Σₖ = Σₙ γₙₖ (xₙ - μₖ)(xₙ - μₖ)ᵀ / Nₖ + reg·I
//!
//! Means start from k-means++ picks, covariances from the pooled data
//! covariance. The `reg_covar` ridge keeps collapsed components (all members
//! at one point) positive-definite.

use crate::error::{Error, Result};
use crate::linalg::{logsumexp, SpdFactor};
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, Axis};
use rand::prelude::*;

/// Starting state of a chain.
#[derive(Debug, Clone)]
pub struct InitialParameters {
    /// `n_labels x n_features`.
    pub means: Array2<f64>,
    /// `n_labels x n_features x n_features`, each slice SPD.
    pub covariances: Array3<f64>,
    /// Starting label per element. When absent, each element takes the label
    /// with the lowest likelihood energy.
    pub labels: Option<Vec<usize>>,
}

impl InitialParameters {
    pub fn new(means: Array2<f64>, covariances: Array3<f64>) -> Self {
        Self {
            means,
            covariances,
            labels: None,
        }
    }

    /// Attach starting labels.
    pub fn with_labels(mut self, labels: Vec<usize>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Number of clusters.
    pub fn n_labels(&self) -> usize {
        self.means.nrows()
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.means.ncols()
    }
}

/// Gaussian mixture fit used to seed the sampler.
#[derive(Debug, Clone)]
pub struct GmmSeed {
    /// Number of components (clusters).
    n_components: usize,
    /// Maximum EM iterations.
    max_iter: usize,
    /// Stop once the mean log-likelihood improves by less than this.
    tol: f64,
    /// Random seed.
    seed: Option<u64>,
    /// Ridge added to every covariance diagonal.
    reg_covar: f64,
}

impl GmmSeed {
    /// Create a seeding fit with `n_components` clusters.
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            max_iter: 100,
            tol: 1e-3,
            seed: None,
            reg_covar: 1e-6,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set covariance regularization.
    pub fn with_reg_covar(mut self, reg_covar: f64) -> Self {
        self.reg_covar = reg_covar;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// k-means++ picks for the initial means.
    fn init_means(&self, data: ArrayView2<'_, f64>, rng: &mut dyn RngCore) -> Array2<f64> {
        let n = data.nrows();
        let k = self.n_components;
        let mut means = Array2::zeros((k, data.ncols()));

        let first = rng.random_range(0..n);
        means.row_mut(0).assign(&data.row(first));

        for c in 1..k {
            let distances: Vec<f64> = data
                .rows()
                .into_iter()
                .map(|point| {
                    (0..c)
                        .map(|m| {
                            point
                                .iter()
                                .zip(means.row(m).iter())
                                .map(|(a, b)| (a - b).powi(2))
                                .sum::<f64>()
                        })
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            let total: f64 = distances.iter().sum();
            if total == 0.0 {
                let idx = rng.random_range(0..n);
                means.row_mut(c).assign(&data.row(idx));
                continue;
            }

            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = n - 1;
            for (j, &d) in distances.iter().enumerate() {
                cumsum += d;
                if cumsum >= threshold && d > 0.0 {
                    selected = j;
                    break;
                }
            }
            means.row_mut(c).assign(&data.row(selected));
        }

        means
    }

    fn factor_all(covariances: &Array3<f64>) -> Result<Vec<SpdFactor>> {
        covariances
            .outer_iter()
            .enumerate()
            .map(|(c, cov)| SpdFactor::new(cov).ok_or(Error::NotPositiveDefinite { cluster: c }))
            .collect()
    }

    /// Responsibilities and mean log-likelihood.
    fn e_step(
        data: ArrayView2<'_, f64>,
        means: &Array2<f64>,
        factors: &[SpdFactor],
        weights: &Array1<f64>,
    ) -> (Array2<f64>, f64) {
        let n = data.nrows();
        let k = means.nrows();
        let mut resp = Array2::zeros((n, k));
        let mut total_ll = 0.0;

        for i in 0..n {
            let point = data.row(i);
            let log_probs: Vec<f64> = (0..k)
                .map(|c| weights[c].ln() + factors[c].mvn_logpdf(point, means.row(c)))
                .collect();
            let log_sum = logsumexp(&log_probs);
            total_ll += log_sum;
            for c in 0..k {
                resp[[i, c]] = (log_probs[c] - log_sum).exp();
            }
        }

        (resp, total_ll / n as f64)
    }

    /// Mixing weights from per-component responsibility totals, summing to 1.
    fn mixing_weights(resp_sum: ArrayView1<'_, f64>) -> Array1<f64> {
        let total = resp_sum.sum();
        resp_sum.mapv(|r| r / total)
    }

    /// Fit the mixture and return means, covariances and hard labels.
    pub fn fit(&self, data: ArrayView2<'_, f64>) -> Result<InitialParameters> {
        let n = data.nrows();
        let d = data.ncols();
        if n == 0 || d == 0 {
            return Err(Error::EmptyInput);
        }
        let k = self.n_components;
        if k == 0 {
            return Err(Error::InvalidParameter {
                name: "n_components",
                message: "must be > 0",
            });
        }
        if k > n {
            return Err(Error::InvalidParameter {
                name: "n_components",
                message: "must not exceed the number of elements",
            });
        }

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut means = self.init_means(data, rng.as_mut());

        // Pooled covariance as the starting shape for every component
        let centered = &data - &data.mean_axis(Axis(0)).ok_or(Error::EmptyInput)?;
        let mut pooled = centered.t().dot(&centered) / n as f64;
        for j in 0..d {
            pooled[[j, j]] += self.reg_covar;
        }
        let mut covariances = Array3::zeros((k, d, d));
        for mut slice in covariances.outer_iter_mut() {
            slice.assign(&pooled);
        }

        let mut weights = Array1::from_elem(k, 1.0 / k as f64);
        let mut factors = Self::factor_all(&covariances)?;
        let mut prev_ll = f64::NEG_INFINITY;

        for iter in 0..self.max_iter {
            let (resp, ll) = Self::e_step(data, &means, &factors, &weights);
            if (ll - prev_ll).abs() < self.tol {
                log::debug!("gmm seed converged after {iter} iterations (mean ll {ll:.4})");
                break;
            }
            prev_ll = ll;

            let resp_sum = resp.sum_axis(Axis(0));
            weights = Self::mixing_weights(resp_sum.view());
            for c in 0..k {
                if resp_sum[c] <= 1e-10 {
                    continue;
                }

                let r = resp.column(c);
                let mean = r.dot(&data) / resp_sum[c];

                let mut cov = Array2::<f64>::zeros((d, d));
                for (i, point) in data.rows().into_iter().enumerate() {
                    let diff = &point - &mean;
                    for a in 0..d {
                        for b in 0..=a {
                            cov[[a, b]] += r[i] * diff[a] * diff[b];
                        }
                    }
                }
                for a in 0..d {
                    for b in 0..=a {
                        let v = cov[[a, b]] / resp_sum[c];
                        cov[[a, b]] = v;
                        cov[[b, a]] = v;
                    }
                    cov[[a, a]] += self.reg_covar;
                }

                means.row_mut(c).assign(&mean);
                covariances.index_axis_mut(Axis(0), c).assign(&cov);
            }
            factors = Self::factor_all(&covariances)?;
        }

        let (resp, _) = Self::e_step(data, &means, &factors, &weights);
        let labels = resp
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(i, _)| i)
                    .unwrap_or(0)
            })
            .collect();

        Ok(InitialParameters {
            means,
            covariances,
            labels: Some(labels),
        })
    }
}
