//! Mixture-density term of the Metropolis-Hastings target.
//!
//! ```text
//! M(μ, Σ) = Σⱼ Σₗ αⱼₗ · N(zⱼ · 1 | μₗ, Σₗ)
//! ```
//!
//! `αⱼₗ` are the label probabilities of element `j` from the energy step and
//! `zⱼ` is element `j`'s current label, broadcast to a feature-length vector.
//! The value is a weighted sum of densities, not its logarithm, and the same
//! `α` and labels are used for the previous and the proposed parameters.

use crate::energy::ClusterFactors;
use crate::error::{Error, Result};
use ndarray::{Array1, Array2};

/// Evaluate `M(μ, Σ)` for already factored covariances.
pub fn mixture_density(
    alpha: &[Vec<f64>],
    labels: &[usize],
    means: &Array2<f64>,
    factors: &ClusterFactors,
) -> Result<f64> {
    if alpha.len() != labels.len() {
        return Err(Error::DimensionMismatch {
            what: "label probabilities",
            expected: labels.len(),
            found: alpha.len(),
        });
    }
    let n_labels = means.nrows();
    let d = means.ncols();
    if factors.len() != n_labels {
        return Err(Error::DimensionMismatch {
            what: "factored covariances",
            expected: n_labels,
            found: factors.len(),
        });
    }

    // Densities only depend on the label value, so evaluate each once.
    let mut density = Array2::<f64>::zeros((n_labels, n_labels));
    for z in 0..n_labels {
        let point = Array1::from_elem(d, z as f64);
        for l in 0..n_labels {
            density[[z, l]] = factors.get(l).mvn_logpdf(point.view(), means.row(l)).exp();
        }
    }

    let mut total = 0.0;
    for (element, (row, &z)) in alpha.iter().zip(labels.iter()).enumerate() {
        if z >= n_labels {
            return Err(Error::InvalidLabel {
                element,
                label: z,
                n_labels,
            });
        }
        if row.len() != n_labels {
            return Err(Error::DimensionMismatch {
                what: "label probabilities per element",
                expected: n_labels,
                found: row.len(),
            });
        }
        for (l, &a) in row.iter().enumerate() {
            total += a * density[[z, l]];
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn test_single_element_single_label() {
        let means = array![[0.0]];
        let factors = ClusterFactors::new(&Array3::from_elem((1, 1, 1), 1.0)).unwrap();
        let m = mixture_density(&[vec![1.0]], &[0], &means, &factors).unwrap();
        let expected = 1.0 / (2.0 * std::f64::consts::PI).sqrt();
        assert!((m - expected).abs() < 1e-12);
    }

    #[test]
    fn test_weights_by_alpha_and_evaluates_at_label() {
        let means = array![[0.0, 0.0], [1.0, 1.0]];
        let factors = ClusterFactors::new(&Array3::from_shape_fn((2, 2, 2), |(_, i, j)| {
            if i == j {
                1.0
            } else {
                0.0
            }
        }))
        .unwrap();

        // Element carries label 1: point (1, 1) sits on the mean of cluster 1.
        let peak = 1.0 / (2.0 * std::f64::consts::PI);
        let off = peak * (-1.0f64).exp();
        let m = mixture_density(&[vec![0.25, 0.75]], &[1], &means, &factors).unwrap();
        assert!((m - (0.25 * off + 0.75 * peak)).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        let means = array![[0.0]];
        let factors = ClusterFactors::new(&Array3::from_elem((1, 1, 1), 1.0)).unwrap();
        assert!(mixture_density(&[vec![1.0]], &[0, 0], &means, &factors).is_err());
    }

    #[test]
    fn test_rejects_label_outside_clusters() {
        let means = array![[0.0], [1.0]];
        let factors = ClusterFactors::new(&Array3::from_elem((2, 1, 1), 1.0)).unwrap();
        let err = mixture_density(&[vec![0.5, 0.5]], &[2], &means, &factors).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidLabel {
                element: 0,
                label: 2,
                n_labels: 2
            }
        );
    }

    #[test]
    fn test_rejects_factor_count_mismatch() {
        let means = array![[0.0], [1.0]];
        let factors = ClusterFactors::new(&Array3::from_elem((1, 1, 1), 1.0)).unwrap();
        assert!(matches!(
            mixture_density(&[vec![0.5, 0.5]], &[0], &means, &factors),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
