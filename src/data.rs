//! Spatial elements: physical coordinates plus the features being clustered.

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1, ArrayView2};

/// Coordinates and features for every element, one row per element.
#[derive(Debug, Clone)]
pub struct Dataset {
    coords: Array2<f64>,
    features: Array2<f64>,
    phys_names: Vec<String>,
    feat_names: Vec<String>,
}

impl Dataset {
    /// Build a dataset with default column names (`x`, `y`, `z`, `f0`, `f1`, ...).
    pub fn new(coords: Array2<f64>, features: Array2<f64>) -> Result<Self> {
        let n = features.nrows();
        if n == 0 || features.ncols() == 0 {
            return Err(Error::EmptyInput);
        }
        if coords.nrows() != n {
            return Err(Error::DimensionMismatch {
                what: "coordinate rows",
                expected: n,
                found: coords.nrows(),
            });
        }
        let phys_dim = coords.ncols();
        if !(1..=3).contains(&phys_dim) {
            return Err(Error::InvalidParameter {
                name: "coords",
                message: "physical space must have 1 to 3 dimensions",
            });
        }
        if features.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "features",
                message: "must be finite",
            });
        }

        let phys_names = ["x", "y", "z"][..phys_dim]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let feat_names = (0..features.ncols()).map(|i| format!("f{i}")).collect();

        Ok(Self {
            coords,
            features,
            phys_names,
            feat_names,
        })
    }

    /// Build a 1-D dataset where element `i` sits at `x = i`.
    pub fn along_line(features: Array2<f64>) -> Result<Self> {
        let n = features.nrows();
        let coords = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        Self::new(coords, features)
    }

    /// Replace the physical column names.
    pub fn with_phys_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.coords.ncols() {
            return Err(Error::DimensionMismatch {
                what: "physical names",
                expected: self.coords.ncols(),
                found: names.len(),
            });
        }
        self.phys_names = names;
        Ok(self)
    }

    /// Replace the feature column names.
    pub fn with_feat_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.features.ncols() {
            return Err(Error::DimensionMismatch {
                what: "feature names",
                expected: self.features.ncols(),
                found: names.len(),
            });
        }
        self.feat_names = names;
        Ok(self)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// Always false; construction rejects empty input.
    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    /// Number of features per element.
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Physical dimensionality (1 to 3).
    pub fn phys_dim(&self) -> usize {
        self.coords.ncols()
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    /// Feature vector of element `i`.
    pub fn feature_row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.features.row(i)
    }

    pub fn coords(&self) -> ArrayView2<'_, f64> {
        self.coords.view()
    }

    pub fn phys_names(&self) -> &[String] {
        &self.phys_names
    }

    pub fn feat_names(&self) -> &[String] {
        &self.feat_names
    }
}
