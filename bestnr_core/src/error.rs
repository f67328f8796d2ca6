//bestnr_core/error.rs

use thiserror::Error;

use crate::event::Family;

pub type BestNrResult<T> = Result<T, BestNrError>;

/// Validation failures. A rejected event is not an error; see `Verdict`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BestNrError {
    #[error("event has no detectors")]
    NoDetectors,

    #[error("{family} vector has {actual} entries, expected {expected} (one per detector)")]
    DimensionMismatch {
        family: Family,
        expected: usize,
        actual: usize,
    },

    #[error("{family} degrees of freedom must be finite and positive, got {dof}")]
    InvalidDof { family: Family, dof: f64 },

    #[error("non-finite {input} value (detector {detector:?})")]
    NonFinite {
        input: &'static str,
        detector: Option<usize>,
    },

    #[error("threshold `{name}` must be finite, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("re-weighting parameter `{name}` must be finite and positive, got {value}")]
    InvalidParam { name: &'static str, value: f64 },
}
