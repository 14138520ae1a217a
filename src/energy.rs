//! Per-element energies driving the label sampler.
//!
//! For element `i` and candidate label `l`:
//!
//! ```text
//! U(i, l) = U_like(i, l) + U_mrf(i, l) + U_self(i, l)
//!
//! U_like(i, l) = ½ (xᵢ - μₗ)ᵀ Σₗ⁻¹ (xᵢ - μₗ) + ½ ln det Σₗ
//! U_mrf(i, l)  = β · #{ j ∈ N(i) : label_j ≠ l }
//! ```
//!
//! `U_like` is the negative Gaussian log-density without its constant, so
//! `exp(-U)` over labels is proportional to the label's conditional
//! posterior. `U_self` is an extension point and is zero by default.

use crate::error::{Error, Result};
use crate::graph::NeighborGraph;
use crate::linalg::SpdFactor;
use core::fmt;
use ndarray::{Array2, Array3, ArrayView2};

/// Per-element, per-label energy added to the likelihood and MRF terms.
pub trait SelfEnergy: fmt::Debug + Send + Sync {
    /// Energy of giving `element` the label `label`.
    fn self_energy(&self, element: usize, label: usize) -> f64;
}

/// Self energy that is always zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroSelfEnergy;

impl SelfEnergy for ZeroSelfEnergy {
    fn self_energy(&self, _element: usize, _label: usize) -> f64 {
        0.0
    }
}

/// Inverse and log-determinant of every cluster covariance.
#[derive(Debug, Clone)]
pub struct ClusterFactors {
    factors: Vec<SpdFactor>,
}

impl ClusterFactors {
    /// Factor each `n_features x n_features` slice of `covariances`.
    pub fn new(covariances: &Array3<f64>) -> Result<Self> {
        let factors = covariances
            .outer_iter()
            .enumerate()
            .map(|(c, cov)| SpdFactor::new(cov).ok_or(Error::NotPositiveDefinite { cluster: c }))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { factors })
    }

    pub fn get(&self, cluster: usize) -> &SpdFactor {
        &self.factors[cluster]
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

/// MRF energy of every element under its own label.
///
/// `labels` must hold one entry per graph element.
pub fn mrf_energy_all(graph: &NeighborGraph, labels: &[usize], beta: f64) -> Result<Vec<f64>> {
    if labels.len() != graph.len() {
        return Err(Error::DimensionMismatch {
            what: "labels per graph element",
            expected: graph.len(),
            found: labels.len(),
        });
    }
    Ok((0..labels.len())
        .map(|i| mismatch_count(graph, labels, i, labels[i]) as f64 * beta)
        .collect())
}

fn mismatch_count(graph: &NeighborGraph, labels: &[usize], i: usize, label: usize) -> usize {
    graph
        .neighbors(i)
        .iter()
        .filter(|&&j| labels[j] != label)
        .count()
}

/// Energies under one fixed parameter snapshot.
///
/// Built once per sweep; the means and factored covariances it reads are
/// never modified while it is alive.
#[derive(Debug)]
pub struct EnergyModel<'a> {
    features: ArrayView2<'a, f64>,
    graph: &'a NeighborGraph,
    means: &'a Array2<f64>,
    factors: ClusterFactors,
    beta: f64,
    self_energy: &'a dyn SelfEnergy,
}

impl<'a> EnergyModel<'a> {
    /// Snapshot the current parameters. Fails if any covariance is not
    /// positive-definite.
    pub fn new(
        features: ArrayView2<'a, f64>,
        graph: &'a NeighborGraph,
        means: &'a Array2<f64>,
        covariances: &Array3<f64>,
        beta: f64,
        self_energy: &'a dyn SelfEnergy,
    ) -> Result<Self> {
        Ok(Self {
            features,
            graph,
            means,
            factors: ClusterFactors::new(covariances)?,
            beta,
            self_energy,
        })
    }

    /// Number of candidate labels.
    pub fn n_labels(&self) -> usize {
        self.means.nrows()
    }

    /// Number of elements.
    pub fn n_elements(&self) -> usize {
        self.features.nrows()
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Likelihood energy of element `i` under cluster `label`.
    pub fn likelihood_energy_for(&self, i: usize, label: usize) -> f64 {
        let diff = &self.features.row(i) - &self.means.row(label);
        let factor = self.factors.get(label);
        0.5 * factor.quad_form(diff.view()) + 0.5 * factor.log_det()
    }

    /// Likelihood energy of element `i` under its current label.
    pub fn likelihood_energy(&self, i: usize, labels: &[usize]) -> f64 {
        self.likelihood_energy_for(i, labels[i])
    }

    /// Likelihood energy of element `i` for every label.
    pub fn likelihood_energies(&self, i: usize) -> Vec<f64> {
        (0..self.n_labels())
            .map(|l| self.likelihood_energy_for(i, l))
            .collect()
    }

    /// MRF energy of element `i` if it took `label`.
    pub fn mrf_energy(&self, i: usize, label: usize, labels: &[usize]) -> f64 {
        self.beta * mismatch_count(self.graph, labels, i, label) as f64
    }

    /// MRF energy of element `i` for every candidate label.
    pub fn mrf_energies(&self, i: usize, labels: &[usize]) -> Vec<f64> {
        (0..self.n_labels())
            .map(|l| self.mrf_energy(i, l, labels))
            .collect()
    }

    /// Self energy of element `i` for every candidate label.
    pub fn self_energies(&self, i: usize) -> Vec<f64> {
        (0..self.n_labels())
            .map(|l| self.self_energy.self_energy(i, l))
            .collect()
    }

    /// Likelihood + MRF + self energy of element `i` for every candidate label.
    pub fn combined_energies(&self, i: usize, labels: &[usize]) -> Vec<f64> {
        (0..self.n_labels())
            .map(|l| {
                self.likelihood_energy_for(i, l)
                    + self.mrf_energy(i, l, labels)
                    + self.self_energy.self_energy(i, l)
            })
            .collect()
    }
}
