//! Dense symmetric linear algebra used by the energy, prior and proposal code.
//!
//! Parameters live in `ndarray` arrays; decompositions go through `faer`.
//! Every covariance is handled through its symmetric eigendecomposition
//! `Σ = V diag(λ) Vᵀ`, which yields the inverse, the log-determinant and the
//! positive-definiteness check in one pass.

use faer::{Mat, Side};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Symmetric eigendecomposition with eigenvalues in ascending order.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues, ascending.
    pub values: Array1<f64>,
    /// Eigenvectors, one per column.
    pub vectors: Array2<f64>,
}

/// Decompose a symmetric matrix. Only the lower triangle is read.
pub fn symmetric_eigen(m: ArrayView2<'_, f64>) -> SymmetricEigen {
    let d = m.nrows();
    let mat = Mat::<f64>::from_fn(d, d, |i, j| m[[i, j]]);
    let evd = mat.selfadjoint_eigendecomposition(Side::Lower);
    let s = evd.s().column_vector();
    let u = evd.u();

    let values = Array1::from_shape_fn(d, |i| s[i]);
    let vectors = Array2::from_shape_fn((d, d), |(i, j)| u[(i, j)]);
    SymmetricEigen { values, vectors }
}

/// Rebuild `V diag(λ) Vᵀ`.
///
/// Entry `(i, j)` is accumulated as `Σ_k (V_ik V_jk) λ_k`, so the result is
/// bitwise symmetric.
pub fn reassemble(vectors: ArrayView2<'_, f64>, values: ArrayView1<'_, f64>) -> Array2<f64> {
    let d = vectors.nrows();
    let mut out = Array2::zeros((d, d));
    for i in 0..d {
        for j in 0..=i {
            let mut acc = 0.0;
            for k in 0..values.len() {
                acc += (vectors[[i, k]] * vectors[[j, k]]) * values[k];
            }
            out[[i, j]] = acc;
            out[[j, i]] = acc;
        }
    }
    out
}

/// Inverse and log-determinant of a symmetric positive-definite matrix.
#[derive(Debug, Clone)]
pub struct SpdFactor {
    inverse: Array2<f64>,
    log_det: f64,
}

impl SpdFactor {
    /// Factor `m`, or `None` when it has non-finite entries, or is singular or
    /// indefinite to working precision.
    pub fn new(m: ArrayView2<'_, f64>) -> Option<Self> {
        let d = m.nrows();
        if d == 0 || m.ncols() != d || m.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let eig = symmetric_eigen(m);
        let max = eig.values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let floor = (max * f64::EPSILON * d as f64).max(0.0);
        if eig.values.iter().any(|&l| l.is_nan() || l <= floor) {
            return None;
        }

        let log_det = eig.values.iter().map(|l| l.ln()).sum();
        let inv_values = eig.values.mapv(f64::recip);
        let inverse = reassemble(eig.vectors.view(), inv_values.view());
        Some(Self { inverse, log_det })
    }

    /// `ln det Σ`.
    pub fn log_det(&self) -> f64 {
        self.log_det
    }

    /// `Σ⁻¹`.
    pub fn inverse(&self) -> &Array2<f64> {
        &self.inverse
    }

    /// `diffᵀ Σ⁻¹ diff`.
    pub fn quad_form(&self, diff: ArrayView1<'_, f64>) -> f64 {
        diff.dot(&self.inverse.dot(&diff))
    }

    /// Log-density of `N(mean, Σ)` at `x`.
    pub fn mvn_logpdf(&self, x: ArrayView1<'_, f64>, mean: ArrayView1<'_, f64>) -> f64 {
        let diff = &x - &mean;
        let d = x.len() as f64;
        -0.5 * (d * LN_2PI + self.log_det + self.quad_form(diff.view()))
    }
}

/// Log-density of a univariate normal.
pub fn normal_logpdf(x: f64, loc: f64, scale: f64) -> f64 {
    let z = (x - loc) / scale;
    -0.5 * (LN_2PI + z * z) - scale.ln()
}

/// Log-sum-exp for numerical stability.
pub fn logsumexp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    let max_val = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max_val.is_infinite() {
        return max_val;
    }
    max_val
        + values
            .iter()
            .map(|&v| (v - max_val).exp())
            .sum::<f64>()
            .ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_logsumexp_large_values() {
        let v = [1000.0, 1000.0];
        assert!((logsumexp(&v) - (1000.0 + 2f64.ln())).abs() < 1e-9);
        assert_eq!(logsumexp(&[]), f64::NEG_INFINITY);
    }

    #[test]
    fn test_eigen_reassemble_matches_input() {
        let m = array![[2.0, 0.5], [0.5, 1.0]];
        let eig = symmetric_eigen(m.view());
        assert!(eig.values[0] <= eig.values[1]);
        let back = reassemble(eig.vectors.view(), eig.values.view());
        for (a, b) in back.iter().zip(m.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_spd_factor_inverse_and_logdet() {
        let m = array![[4.0, 0.0], [0.0, 0.25]];
        let f = SpdFactor::new(m.view()).unwrap();
        assert!(f.log_det().abs() < 1e-12);
        assert!((f.inverse()[[0, 0]] - 0.25).abs() < 1e-12);
        assert!((f.inverse()[[1, 1]] - 4.0).abs() < 1e-12);
        assert!((f.quad_form(array![2.0, 1.0].view()) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_spd_factor_rejects_singular_and_indefinite() {
        assert!(SpdFactor::new(array![[1.0, 1.0], [1.0, 1.0]].view()).is_none());
        assert!(SpdFactor::new(array![[1.0, 2.0], [2.0, 1.0]].view()).is_none());
        assert!(SpdFactor::new(array![[f64::NAN]].view()).is_none());
    }

    #[test]
    fn test_mvn_logpdf_standard_normal() {
        let f = SpdFactor::new(array![[1.0]].view()).unwrap();
        let lp = f.mvn_logpdf(array![0.0].view(), array![0.0].view());
        assert!((lp - normal_logpdf(0.0, 0.0, 1.0)).abs() < 1e-12);
        assert!((lp + 0.5 * LN_2PI).abs() < 1e-12);
    }
}
