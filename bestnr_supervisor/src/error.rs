use std::io;

use bestnr_core::BestNrError;
use thiserror::Error;

pub type SupervisorResult<T> = Result<T, SupervisorError>;

/// Failures at the IO boundary. Per-event evaluation errors are not here:
/// the supervisor logs and skips those.
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Cfg(#[from] BestNrError),

    #[error("detector layout is empty")]
    EmptyLayout,

    #[error("input is missing column `{0}`")]
    MissingColumn(String),

    #[error("row {row}: column `{column}` has non-numeric value {value:?}")]
    BadValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: no `{column}` value and no earlier row to inherit it from")]
    MissingDof { row: usize, column: &'static str },

    #[error("record has {actual} detectors, sink was opened for {expected}")]
    RowWidth { expected: usize, actual: usize },
}
