//! Gibbs label sampler.
//!
//! Each element's label is redrawn from its Boltzmann conditional
//!
//! ```text
//! p(l) = exp(-U(i, l) / T) / Σₖ exp(-U(i, k) / T)
//! ```
//!
//! with `T = 1`. There is no accept/reject: the draw is exact.
//!
//! Two sweep orders are available. The sequential sweep visits elements in
//! index order and every draw sees the labels redrawn before it. The
//! checkerboard sweep visits color classes; within a class every element
//! reads the labels as they stood when the class started, and the new labels
//! are committed together. Because same-color elements are never neighbors
//! both orders leave the same stationary distribution.

use crate::config::SweepOrder;
use crate::energy::EnergyModel;
use crate::error::{Error, Result};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Sampling temperature. Fixed; there is no annealing.
pub const TEMPERATURE: f64 = 1.0;

/// Boltzmann probabilities for one element's label energies.
///
/// Uses the max-shift so large energies do not underflow every entry.
/// Returns `None` if any energy is NaN or none is finite.
pub fn label_probabilities(energies: &[f64], temperature: f64) -> Option<Vec<f64>> {
    if energies.iter().any(|u| u.is_nan()) {
        return None;
    }
    let logits: Vec<f64> = energies.iter().map(|u| -u / temperature).collect();
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return None;
    }
    let weights: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let total: f64 = weights.iter().sum();
    Some(weights.into_iter().map(|w| w / total).collect())
}

/// True when one label carries all probability mass and there was a choice.
pub fn is_degenerate(probs: &[f64]) -> bool {
    probs.len() > 1 && probs.iter().filter(|&&p| p > 0.0).count() == 1
}

/// Inverse-CDF draw from a categorical distribution.
pub fn draw_label<R: Rng + ?Sized>(probs: &[f64], rng: &mut R) -> usize {
    let threshold = rng.random::<f64>();
    let mut cumsum = 0.0;
    let mut last_positive = 0;
    for (l, &p) in probs.iter().enumerate() {
        if p > 0.0 {
            last_positive = l;
        }
        cumsum += p;
        if threshold < cumsum && p > 0.0 {
            return l;
        }
    }
    // Rounding left the cumulative sum just under 1.0
    last_positive
}

/// Counters collected during one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Elements whose conditional put all mass on one label.
    pub degenerate: usize,
}

fn conditional(model: &EnergyModel<'_>, i: usize, labels: &[usize]) -> Result<Vec<f64>> {
    label_probabilities(&model.combined_energies(i, labels), TEMPERATURE)
        .ok_or(Error::NonFiniteEnergy { element: i })
}

/// Conditional label probabilities of every element under `labels`.
pub fn label_probabilities_all(model: &EnergyModel<'_>, labels: &[usize]) -> Result<Vec<Vec<f64>>> {
    (0..labels.len())
        .map(|i| conditional(model, i, labels))
        .collect()
}

/// Redraw every label in index order.
pub fn sweep_sequential(
    model: &EnergyModel<'_>,
    mut labels: Vec<usize>,
    rng: &mut dyn RngCore,
) -> Result<(Vec<usize>, SweepStats)> {
    let mut stats = SweepStats::default();
    for i in 0..labels.len() {
        let probs = conditional(model, i, &labels)?;
        if is_degenerate(&probs) {
            stats.degenerate += 1;
        }
        labels[i] = draw_label(&probs, rng);
    }
    Ok((labels, stats))
}

/// Redraw labels one color class at a time.
///
/// Every element gets its own generator seeded from `rng`, so the result
/// does not depend on whether the class is evaluated in parallel.
pub fn sweep_checkerboard(
    model: &EnergyModel<'_>,
    classes: &[Vec<usize>],
    mut labels: Vec<usize>,
    rng: &mut dyn RngCore,
) -> Result<(Vec<usize>, SweepStats)> {
    let mut stats = SweepStats::default();
    for class in classes {
        let seeds: Vec<u64> = class.iter().map(|_| rng.random::<u64>()).collect();
        let snapshot = &labels;

        let draw = |(&i, &seed): (&usize, &u64)| -> Result<(usize, usize, bool)> {
            let probs = conditional(model, i, snapshot)?;
            let mut local = StdRng::seed_from_u64(seed);
            Ok((i, draw_label(&probs, &mut local), is_degenerate(&probs)))
        };

        #[cfg(feature = "parallel")]
        let drawn: Vec<(usize, usize, bool)> = class
            .par_iter()
            .zip(seeds.par_iter())
            .map(draw)
            .collect::<Result<_>>()?;

        #[cfg(not(feature = "parallel"))]
        let drawn: Vec<(usize, usize, bool)> = class
            .iter()
            .zip(seeds.iter())
            .map(draw)
            .collect::<Result<_>>()?;

        for (i, label, degenerate) in drawn {
            labels[i] = label;
            if degenerate {
                stats.degenerate += 1;
            }
        }
    }
    Ok((labels, stats))
}

/// One full sweep in the requested order.
pub fn sweep(
    model: &EnergyModel<'_>,
    order: SweepOrder,
    classes: &[Vec<usize>],
    labels: Vec<usize>,
    rng: &mut dyn RngCore,
) -> Result<(Vec<usize>, SweepStats)> {
    let (labels, stats) = match order {
        SweepOrder::Sequential => sweep_sequential(model, labels, rng)?,
        SweepOrder::Checkerboard => sweep_checkerboard(model, classes, labels, rng)?,
    };
    if stats.degenerate > 0 {
        log::warn!(
            "label distribution degenerate for {} of {} elements",
            stats.degenerate,
            labels.len()
        );
    }
    Ok((labels, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::ZeroSelfEnergy;
    use crate::graph::NeighborGraph;
    use ndarray::{array, Array3};

    #[test]
    fn test_probabilities_sum_to_one() {
        let probs = label_probabilities(&[0.3, 1.7, -2.0], TEMPERATURE).unwrap();
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(probs[2] > probs[0] && probs[0] > probs[1]);
    }

    #[test]
    fn test_probabilities_survive_huge_energies() {
        let probs = label_probabilities(&[1.0e6, 1.0e6 + 1.0], TEMPERATURE).unwrap();
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!((probs[0] - 1.0 / (1.0 + (-1f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_probabilities_reject_nan_and_all_infinite() {
        assert!(label_probabilities(&[f64::NAN, 0.0], TEMPERATURE).is_none());
        assert!(label_probabilities(&[f64::INFINITY, f64::INFINITY], TEMPERATURE).is_none());
    }

    #[test]
    fn test_degenerate_detection() {
        let probs = label_probabilities(&[0.0, f64::INFINITY], TEMPERATURE).unwrap();
        assert_eq!(probs, vec![1.0, 0.0]);
        assert!(is_degenerate(&probs));
        assert!(!is_degenerate(&[1.0]));
        assert!(!is_degenerate(&[0.5, 0.5]));
    }

    #[test]
    fn test_draw_label_never_picks_zero_mass() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            assert_eq!(draw_label(&[0.0, 1.0, 0.0], &mut rng), 1);
        }
    }

    #[test]
    fn test_draw_label_frequencies() {
        let mut rng = StdRng::seed_from_u64(11);
        let probs = [0.2, 0.8];
        let n = 20_000;
        let ones = (0..n).filter(|_| draw_label(&probs, &mut rng) == 1).count();
        let freq = ones as f64 / n as f64;
        assert!((freq - 0.8).abs() < 0.02, "freq = {freq}");
    }

    fn separated_model_inputs() -> (ndarray::Array2<f64>, NeighborGraph, ndarray::Array2<f64>, Array3<f64>) {
        let features = array![[0.0], [0.0], [0.0], [5.0], [5.0]];
        let graph = NeighborGraph::chain(5);
        let means = array![[0.0], [5.0]];
        let covs = Array3::from_elem((2, 1, 1), 1.0);
        (features, graph, means, covs)
    }

    #[test]
    fn test_sweeps_follow_features() {
        let (features, graph, means, covs) = separated_model_inputs();
        let model =
            EnergyModel::new(features.view(), &graph, &means, &covs, 0.5, &ZeroSelfEnergy).unwrap();
        let classes = graph.color_classes();

        for order in [SweepOrder::Sequential, SweepOrder::Checkerboard] {
            let mut rng: Box<dyn RngCore> = Box::new(StdRng::seed_from_u64(5));
            let (labels, _) = sweep(&model, order, &classes, vec![1, 0, 1, 0, 1], rng.as_mut()).unwrap();
            assert_eq!(labels, vec![0, 0, 0, 1, 1], "{order:?}");
        }
    }

    #[test]
    fn test_label_probabilities_all_rows_normalized() {
        let (features, graph, means, covs) = separated_model_inputs();
        let model =
            EnergyModel::new(features.view(), &graph, &means, &covs, 0.5, &ZeroSelfEnergy).unwrap();
        let alpha = label_probabilities_all(&model, &[0, 0, 0, 1, 1]).unwrap();
        assert_eq!(alpha.len(), 5);
        for row in &alpha {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }
}
