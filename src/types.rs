//! Type aliases, constants, option structs and core enums for the modal analyses.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use nalgebra::Complex;
use serde::{Deserialize, Serialize};

use crate::error::EvaError;

pub type Complex64 = Complex<f64>;

// Core constants
pub const TWO_PI: f64 = 2.0 * PI;

/// Damped frequency (Hz) below which a root of the quadratic problem is treated
/// as non-oscillatory and discarded.
pub const MIN_DAMPED_FREQUENCY_HZ: f64 = 1e-8;

/// Pseudo log-decrement above which the Rayleigh-damping approximation is
/// considered broken down and the damping ratio is reported as NaN.
pub const MAX_PSEUDO_LOG_DECREMENT: f64 = TWO_PI;

/// Relative tolerance on `|Im λ|` for treating a whole spectrum as real.
pub const REAL_EIGENVALUE_TOL: f64 = 1e-12;

/// Relative distance under which eigenvalues share one null-space computation.
pub const CLUSTER_TOL: f64 = 1e-9;

/// Relative margin under which two entries tie for the largest magnitude of a
/// vector; the first of the tied entries is the pivot.
pub const PIVOT_TIE_TOL: f64 = 1e-12;

/// Relative tolerance used when deciding whether a matrix is symmetric.
pub const SYMMETRY_TOL: f64 = 1e-12;

/// Magnitude below which entries of a loaded linear model are flushed to zero.
pub const DEFAULT_ZERO_TOL: f64 = 1e-14;

/// Iteration budget per matrix dimension for the Schur, SVD and symmetric solvers.
pub const MAX_ITERATIONS_PER_DIM: usize = 300;

/// Method used by the mechanical-system analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MckMethod {
    /// Undamped modes with modal damping read from the diagonal of QᵗCQ
    /// (Rayleigh-damping approximation).
    #[serde(rename = "diag_beta")]
    DiagonalBeta,
    /// Exact quadratic eigenvalue problem on the full K, C, M matrices.
    #[default]
    #[serde(rename = "full_matrix")]
    FullMatrix,
}

impl MckMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MckMethod::DiagonalBeta => "diag_beta",
            MckMethod::FullMatrix => "full_matrix",
        }
    }
}

impl fmt::Display for MckMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MckMethod {
    type Err = EvaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diag_beta" => Ok(MckMethod::DiagonalBeta),
            "full_matrix" => Ok(MckMethod::FullMatrix),
            _ => Err(EvaError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Post-hoc eigenvector scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeNormalization {
    #[default]
    None,
    /// Scale each column by its entry of largest magnitude.
    ByMax,
}

/// How [`crate::eig`] reports eigenvalues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EigenvalueOutput {
    /// Eigenvalues on the diagonal of a square matrix.
    #[default]
    Diagonal,
    /// Natural frequencies in Hz, `sqrt(λ) / 2π`.
    Frequencies,
}

/// Options for the generalized eigensolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EigOptions {
    pub sort: bool,
    pub output: EigenvalueOutput,
    pub normalization: ModeNormalization,
}

impl Default for EigOptions {
    fn default() -> Self {
        Self {
            sort: true,
            output: EigenvalueOutput::Diagonal,
            normalization: ModeNormalization::None,
        }
    }
}

/// Options for the state-matrix analysis.
///
/// States are ordered `{q, q_dot, q1}`: `nq` second-order positions, their
/// `nq` velocities, then `nq1` first-order states.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateAnalysisOptions {
    pub nq: Option<usize>,
    pub nq1: Option<usize>,
    /// Keep the velocity rows in the returned eigenvectors.
    pub full_eigenvectors: bool,
    pub normalization: ModeNormalization,
}

/// Options for the mechanical-system analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MckOptions {
    pub method: MckMethod,
    pub sort: bool,
}

impl Default for MckOptions {
    fn default() -> Self {
        Self {
            method: MckMethod::FullMatrix,
            sort: true,
        }
    }
}
