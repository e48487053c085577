//! Error taxonomy for the eigenvalue analyses.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaError {
    #[error("at least one coefficient matrix is required")]
    EmptyMatrixSequence,

    #[error("{name} must be square, got {rows}x{cols}")]
    NotSquare {
        name: String,
        rows: usize,
        cols: usize,
    },

    #[error("{name} is {rows}x{cols}, expected {expected_rows}x{expected_cols}")]
    ShapeMismatch {
        name: String,
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    #[error("state dimension {n} does not match 2*nq + nq1 (nq = {nq}, nq1 = {nq1})")]
    StatePartition { n: usize, nq: usize, nq1: usize },

    #[error("{name} contains NaN or infinite entries")]
    NonFinite { name: String },

    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("{name} is singular")]
    SingularMatrix { name: String },

    #[error("{stage} did not converge")]
    NoConvergence { stage: &'static str },
}

pub type Result<T> = std::result::Result<T, EvaError>;
