//! The HMRF-GMM iteration controller.
//!
//! Every iteration alternates a discrete and a continuous update:
//!
//! 1. **Gibbs sweep**: redraw every label from its Boltzmann conditional
//!    under the current means and covariances.
//! 2. **Proposals**: one covariance proposal and one mean proposal for all
//!    clusters.
//! 3. **Accept/reject per cluster**: compare
//!    `target = M(μ, Σ) + ln p(Σₗ) + ln p(μₗ)` for previous and proposed
//!    parameters through the ratio `target_proposed / target_previous`,
//!    accepting when it exceeds 1 or beats a uniform draw.
//! 4. **Record**: append labels, means, covariances and beta to the history.
//!
//! The ratio compares targets directly rather than exponentiating their
//! difference, so two negative targets can give a ratio above 1.

use crate::beta::{BetaSchedule, FixedBeta};
use crate::config::HmrfConfig;
use crate::data::Dataset;
use crate::energy::{ClusterFactors, EnergyModel, SelfEnergy, ZeroSelfEnergy};
use crate::error::{Error, Result};
use crate::graph::NeighborGraph;
use crate::history::History;
use crate::mixture::mixture_density;
use crate::prior::{CovariancePrior, MeanPrior};
use crate::proposal::ProposalGenerator;
use crate::sampler;
use crate::seed::{GmmSeed, InitialParameters};
use ndarray::Axis;
use rand::prelude::*;

/// Outcome of one iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// 1-based iteration number.
    pub iteration: usize,
    /// Whether each cluster's proposal was accepted.
    pub accepted: Vec<bool>,
    /// Elements whose label distribution was degenerate during the sweep.
    pub degenerate: usize,
}

/// Metropolis-Hastings ratio of two target values.
pub(crate) fn acceptance_ratio(prev: f64, proposed: f64, cluster: usize) -> Result<f64> {
    if prev == 0.0 {
        return Err(Error::NonFiniteAcceptance { cluster });
    }
    let ratio = proposed / prev;
    if !ratio.is_finite() {
        return Err(Error::NonFiniteAcceptance { cluster });
    }
    Ok(ratio)
}

/// Spatially regularized Gaussian mixture sampler.
#[derive(Debug)]
pub struct HmrfGmm {
    dataset: Dataset,
    graph: NeighborGraph,
    config: HmrfConfig,
    color_classes: Vec<Vec<usize>>,
    mean_prior: MeanPrior,
    cov_prior: CovariancePrior,
    proposals: ProposalGenerator,
    self_energy: Box<dyn SelfEnergy>,
    beta_schedule: Box<dyn BetaSchedule>,
    rng: StdRng,
    history: History,
}

impl HmrfGmm {
    /// Validate inputs and record the initial state as history entry 0.
    pub fn new(
        dataset: Dataset,
        graph: NeighborGraph,
        init: InitialParameters,
        config: HmrfConfig,
    ) -> Result<Self> {
        config.validate()?;

        let n = dataset.len();
        let d = dataset.n_features();
        let k = config.n_labels();

        if graph.len() != n {
            return Err(Error::DimensionMismatch {
                what: "neighbor graph elements",
                expected: n,
                found: graph.len(),
            });
        }
        if init.n_labels() != k {
            return Err(Error::DimensionMismatch {
                what: "initial mean rows",
                expected: k,
                found: init.n_labels(),
            });
        }
        if init.n_features() != d {
            return Err(Error::DimensionMismatch {
                what: "initial mean columns",
                expected: d,
                found: init.n_features(),
            });
        }
        let (ck, cr, cc) = init.covariances.dim();
        if ck != k {
            return Err(Error::DimensionMismatch {
                what: "initial covariance count",
                expected: k,
                found: ck,
            });
        }
        if cr != d || cc != d {
            return Err(Error::DimensionMismatch {
                what: "initial covariance size",
                expected: d,
                found: if cr != d { cr } else { cc },
            });
        }

        let self_energy: Box<dyn SelfEnergy> = Box::new(ZeroSelfEnergy);
        let labels = match init.labels {
            Some(labels) => {
                if labels.len() != n {
                    return Err(Error::DimensionMismatch {
                        what: "initial labels",
                        expected: n,
                        found: labels.len(),
                    });
                }
                if let Some((element, &label)) = labels.iter().enumerate().find(|(_, &l)| l >= k) {
                    return Err(Error::InvalidLabel {
                        element,
                        label,
                        n_labels: k,
                    });
                }
                // Still factor once so a bad covariance fails here, not mid-run.
                let _ = ClusterFactors::new(&init.covariances)?;
                labels
            }
            None => {
                let model = EnergyModel::new(
                    dataset.features(),
                    &graph,
                    &init.means,
                    &init.covariances,
                    config.beta(),
                    self_energy.as_ref(),
                )?;
                (0..n)
                    .map(|i| {
                        model
                            .likelihood_energies(i)
                            .iter()
                            .enumerate()
                            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
                            .map(|(l, _)| l)
                            .unwrap_or(0)
                    })
                    .collect()
            }
        };

        let mean_prior = MeanPrior::new(init.means.clone(), config.mean_prior_var())?;
        let cov_prior =
            CovariancePrior::from_reference(init.covariances.index_axis(Axis(0), 0), config.n_gibbs())?;
        let proposals =
            ProposalGenerator::new(d, config.mu_step(), config.cov_step(), config.rotation_std())?;
        let rng = match config.seed() {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let color_classes = graph.color_classes();
        let history = History::new(init.means, init.covariances, labels, config.beta(), config.n_gibbs());

        Ok(Self {
            dataset,
            graph,
            config,
            color_classes,
            mean_prior,
            cov_prior,
            proposals,
            self_energy,
            beta_schedule: Box::new(FixedBeta),
            rng,
            history,
        })
    }

    /// Seed the parameters with a Gaussian mixture fit of the features, then
    /// build the sampler.
    pub fn from_gmm_seed(dataset: Dataset, graph: NeighborGraph, config: HmrfConfig) -> Result<Self> {
        let mut seed = GmmSeed::new(config.n_labels());
        if let Some(s) = config.seed() {
            seed = seed.with_seed(s);
        }
        let init = seed.fit(dataset.features())?;
        Self::new(dataset, graph, init, config)
    }

    /// Replace the self-energy term.
    pub fn with_self_energy(mut self, self_energy: Box<dyn SelfEnergy>) -> Self {
        self.self_energy = self_energy;
        self
    }

    /// Replace the beta schedule.
    pub fn with_beta_schedule(mut self, schedule: Box<dyn BetaSchedule>) -> Self {
        self.beta_schedule = schedule;
        self
    }

    pub fn config(&self) -> &HmrfConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn graph(&self) -> &NeighborGraph {
        &self.graph
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Consume the sampler and keep its trajectory.
    pub fn into_history(self) -> History {
        self.history
    }

    /// Run one iteration.
    pub fn step(&mut self) -> Result<StepReport> {
        let iteration = self.history.iterations() + 1;
        if iteration > self.config.n_gibbs() {
            return Err(Error::InvalidParameter {
                name: "n_gibbs",
                message: "all configured iterations have already run",
            });
        }

        let (Some(prev_means), Some(prev_covs), Some(prev_labels), Some(beta)) = (
            self.history.last_means(),
            self.history.last_covariances(),
            self.history.last_labels(),
            self.history.last_beta(),
        ) else {
            return Err(Error::EmptyInput);
        };

        let model = EnergyModel::new(
            self.dataset.features(),
            &self.graph,
            prev_means,
            prev_covs,
            beta,
            self.self_energy.as_ref(),
        )?;

        let (labels, stats) = sampler::sweep(
            &model,
            self.config.sweep_order(),
            &self.color_classes,
            prev_labels.to_vec(),
            &mut self.rng,
        )?;

        let cov_proposed = self.proposals.propose_covariances(prev_covs, &mut self.rng)?;
        let mu_proposed = self.proposals.propose_means(prev_means, &mut self.rng);

        let alpha = sampler::label_probabilities_all(&model, &labels)?;
        let prev_factors = ClusterFactors::new(prev_covs)?;
        let proposed_factors = ClusterFactors::new(&cov_proposed)?;
        let lmd_prev = mixture_density(&alpha, &labels, prev_means, &prev_factors)?;
        let lmd_proposed = mixture_density(&alpha, &labels, &mu_proposed, &proposed_factors)?;

        let mut means = prev_means.clone();
        let mut covs = prev_covs.clone();
        let mut accepted = vec![false; self.config.n_labels()];

        for c in 0..self.config.n_labels() {
            let cov_prev = prev_covs.index_axis(Axis(0), c);
            let cov_next = cov_proposed.index_axis(Axis(0), c);
            let lp_cov_prev = self.cov_prior.log_prob(c, cov_prev)?;
            let lp_cov_proposed = self.cov_prior.log_prob(c, cov_next)?;
            let lp_mu_prev = self.mean_prior.log_prob(c, prev_means.row(c));
            let lp_mu_proposed = self.mean_prior.log_prob(c, mu_proposed.row(c));

            let target_prev = lmd_prev + lp_cov_prev + lp_mu_prev;
            let target_proposed = lmd_proposed + lp_cov_proposed + lp_mu_proposed;
            let ratio = acceptance_ratio(target_prev, target_proposed, c)?;

            log::trace!(
                "iteration {iteration} cluster {c}: target prev {target_prev:.6} proposed {target_proposed:.6} ratio {ratio:.6}"
            );

            if ratio > 1.0 || self.rng.random::<f64>() < ratio {
                means.row_mut(c).assign(&mu_proposed.row(c));
                covs.index_axis_mut(Axis(0), c).assign(&cov_next);
                accepted[c] = true;
            }
        }

        let next_beta = self.beta_schedule.next_beta(iteration, beta);
        log::debug!(
            "iteration {iteration}: accepted {accepted:?}, label sum {}",
            labels.iter().sum::<usize>()
        );
        self.history.push(means, covs, labels, next_beta);

        Ok(StepReport {
            iteration,
            accepted,
            degenerate: stats.degenerate,
        })
    }

    /// Run every remaining iteration.
    pub fn fit(&mut self) -> Result<&History> {
        log::info!(
            "fitting HMRF-GMM: {} elements, {} features, {} labels, {} iterations",
            self.dataset.len(),
            self.dataset.n_features(),
            self.config.n_labels(),
            self.config.n_gibbs()
        );
        let mut n_accepted = 0usize;
        while self.history.iterations() < self.config.n_gibbs() {
            let report = self.step()?;
            n_accepted += report.accepted.iter().filter(|&&a| a).count();
        }
        log::info!(
            "finished {} iterations, {} of {} cluster proposals accepted",
            self.config.n_gibbs(),
            n_accepted,
            self.config.n_gibbs() * self.config.n_labels()
        );
        Ok(&self.history)
    }
}
