use core::fmt;

/// Result alias for `hmrf_gmm`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the sampler and its setup helpers.
///
/// Variants fall in two families: numerical failures raised while the chain
/// runs, and configuration failures raised when inputs do not fit together.
/// Both abort the run.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Array dimension mismatch between inputs.
    DimensionMismatch {
        /// Which quantity disagreed.
        what: &'static str,
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Neighbor index outside the element range.
    NeighborOutOfRange {
        /// Element whose neighbor list is invalid.
        element: usize,
        /// Offending neighbor index.
        neighbor: usize,
        /// Number of elements.
        n_elements: usize,
    },

    /// Structurally invalid neighbor graph (self loop, asymmetric edge).
    InvalidGraph(String),

    /// Initial label outside `[0, n_labels)`.
    InvalidLabel {
        /// Element carrying the label.
        element: usize,
        /// Offending label.
        label: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Covariance is singular or not positive-definite.
    NotPositiveDefinite {
        /// Cluster owning the covariance.
        cluster: usize,
    },

    /// Every candidate label of an element has a non-finite energy.
    NonFiniteEnergy {
        /// Element index.
        element: usize,
    },

    /// The acceptance ratio could not be formed (zero denominator, NaN or Inf).
    NonFiniteAcceptance {
        /// Cluster index.
        cluster: usize,
    },
}

impl Error {
    /// True for failures raised by density, determinant or inverse evaluation.
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            Error::NotPositiveDefinite { .. }
                | Error::NonFiniteEnergy { .. }
                | Error::NonFiniteAcceptance { .. }
        )
    }

    /// True for failures caused by inputs that do not fit together.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::EmptyInput
                | Error::DimensionMismatch { .. }
                | Error::NeighborOutOfRange { .. }
                | Error::InvalidGraph(_)
                | Error::InvalidLabel { .. }
                | Error::InvalidParameter { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch {
                what,
                expected,
                found,
            } => {
                write!(f, "dimension mismatch in {what}: expected {expected}, found {found}")
            }
            Error::NeighborOutOfRange {
                element,
                neighbor,
                n_elements,
            } => write!(
                f,
                "element {element} lists neighbor {neighbor}, but there are only {n_elements} elements"
            ),
            Error::InvalidGraph(msg) => write!(f, "invalid neighbor graph: {msg}"),
            Error::InvalidLabel {
                element,
                label,
                n_labels,
            } => write!(
                f,
                "element {element} has label {label}, expected a value below {n_labels}"
            ),
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::NotPositiveDefinite { cluster } => {
                write!(f, "covariance of cluster {cluster} is not positive-definite")
            }
            Error::NonFiniteEnergy { element } => {
                write!(f, "no finite label energy for element {element}")
            }
            Error::NonFiniteAcceptance { cluster } => {
                write!(f, "acceptance ratio for cluster {cluster} is not finite")
            }
        }
    }
}

impl std::error::Error for Error {}
