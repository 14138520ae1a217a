//! # hmrf-gmm
//!
//! Spatially regularized clustering: a hidden Markov random field over
//! element labels combined with a Gaussian mixture over their features.
//!
//! Labels are redrawn by Gibbs sampling from an energy that adds a Gaussian
//! likelihood term to a neighbor-mismatch penalty weighted by `beta`.
//! Cluster means and covariances move by a Metropolis-Hastings random walk
//! with weakly informative priors. The full trajectory is kept in a
//! [`History`].
//!
//! ```rust
//! use hmrf_gmm::{Dataset, HmrfConfig, HmrfGmm, InitialParameters, NeighborGraph};
//! use ndarray::{array, Array3};
//!
//! let features = array![[0.0], [0.0], [0.0], [5.0], [5.0]];
//! let dataset = Dataset::along_line(features).unwrap();
//! let graph = NeighborGraph::chain(dataset.len());
//! let init = InitialParameters::new(array![[0.0], [5.0]], Array3::from_elem((2, 1, 1), 1.0));
//! let config = HmrfConfig::new().with_n_gibbs(20).with_beta(0.5).with_seed(42);
//!
//! let mut model = HmrfGmm::new(dataset, graph, init, config).unwrap();
//! let history = model.fit().unwrap();
//! assert_eq!(history.len(), 21);
//! ```
//!
//! With the `parallel` feature the checkerboard sweep evaluates each color
//! class with rayon.

pub mod beta;
pub mod config;
pub mod data;
pub mod energy;
/// Error types used across `hmrf_gmm`.
pub mod error;
pub mod graph;
pub mod history;
pub mod linalg;
pub mod mixture;
pub mod model;
pub mod prior;
pub mod proposal;
pub mod sampler;
pub mod seed;

#[cfg(test)]
mod model_tests;

pub use beta::{BetaSchedule, FixedBeta};
pub use config::{HmrfConfig, SweepOrder};
pub use data::Dataset;
pub use energy::{mrf_energy_all, EnergyModel, SelfEnergy, ZeroSelfEnergy};
pub use error::{Error, Result};
pub use graph::NeighborGraph;
pub use history::History;
pub use model::{HmrfGmm, StepReport};
pub use prior::{CovariancePrior, MeanPrior};
pub use proposal::ProposalGenerator;
pub use seed::{GmmSeed, InitialParameters};
