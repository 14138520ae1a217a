//! Append-only trajectory of the chain.

use ndarray::{Array2, Array3};

/// Means, covariances, labels and beta for every iteration.
///
/// Entry 0 is the initial state; entry `k` is the state after iteration `k`.
/// The four sequences always have the same length. Entries are never
/// modified once pushed.
#[derive(Debug, Clone, Default)]
pub struct History {
    means: Vec<Array2<f64>>,
    covariances: Vec<Array3<f64>>,
    labels: Vec<Vec<usize>>,
    betas: Vec<f64>,
}

impl History {
    /// Start a history with its initial snapshot, reserving room for
    /// `n_gibbs` further entries.
    pub fn new(
        means: Array2<f64>,
        covariances: Array3<f64>,
        labels: Vec<usize>,
        beta: f64,
        n_gibbs: usize,
    ) -> Self {
        let cap = n_gibbs + 1;
        let mut history = Self {
            means: Vec::with_capacity(cap),
            covariances: Vec::with_capacity(cap),
            labels: Vec::with_capacity(cap),
            betas: Vec::with_capacity(cap),
        };
        history.push(means, covariances, labels, beta);
        history
    }

    pub(crate) fn push(
        &mut self,
        means: Array2<f64>,
        covariances: Array3<f64>,
        labels: Vec<usize>,
        beta: f64,
    ) {
        self.means.push(means);
        self.covariances.push(covariances);
        self.labels.push(labels);
        self.betas.push(beta);
    }

    /// Number of stored snapshots (iterations completed + 1).
    pub fn len(&self) -> usize {
        self.betas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.betas.is_empty()
    }

    /// Iterations completed.
    pub fn iterations(&self) -> usize {
        self.len().saturating_sub(1)
    }

    pub fn means(&self) -> &[Array2<f64>] {
        &self.means
    }

    pub fn covariances(&self) -> &[Array3<f64>] {
        &self.covariances
    }

    pub fn labels(&self) -> &[Vec<usize>] {
        &self.labels
    }

    pub fn betas(&self) -> &[f64] {
        &self.betas
    }

    /// Most recent means.
    pub fn last_means(&self) -> Option<&Array2<f64>> {
        self.means.last()
    }

    /// Most recent covariances.
    pub fn last_covariances(&self) -> Option<&Array3<f64>> {
        self.covariances.last()
    }

    /// Most recent labels.
    pub fn last_labels(&self) -> Option<&[usize]> {
        self.labels.last().map(Vec::as_slice)
    }

    /// Most recent beta.
    pub fn last_beta(&self) -> Option<f64> {
        self.betas.last().copied()
    }
}
