//! Modal results and damping conversions.
//!
//! Definitions used throughout the crate:
//!
//! - `zeta`: damping ratio
//! - `xi`: pseudo logarithmic decrement, `xi = 2π·zeta`
//! - `delta`: logarithmic decrement, `delta = 2π·zeta / sqrt(1 - zeta²)`
//! - `freq_0`: natural (undamped) frequency in Hz
//! - `freq_d`: damped frequency in Hz, `freq_d = freq_0·sqrt(1 - zeta²)`

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::matrix::permute;
use crate::types::{Complex64, TWO_PI};

/// Pseudo logarithmic decrement `2π·zeta`.
pub fn pseudo_log_decrement(zeta: f64) -> f64 {
    TWO_PI * zeta
}

/// Logarithmic decrement `2π·zeta / sqrt(1 - zeta²)`. NaN for `zeta ≥ 1`.
pub fn log_decrement(zeta: f64) -> f64 {
    TWO_PI * zeta / (1.0 - zeta * zeta).sqrt()
}

pub fn damped_from_natural(freq_0: f64, zeta: f64) -> f64 {
    freq_0 * (1.0 - zeta * zeta).sqrt()
}

pub fn natural_from_damped(freq_d: f64, zeta: f64) -> f64 {
    freq_d / (1.0 - zeta * zeta).sqrt()
}

/// Frequencies, damping and shapes of the oscillating modes of a system.
///
/// All per-mode sequences are aligned with the columns of `mode_shapes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalResults {
    /// Damped frequencies (Hz).
    pub freq_damped: Vec<f64>,
    /// Damping ratios (-); positive for decaying modes, NaN where the
    /// Rayleigh-damping approximation broke down.
    pub damping_ratio: Vec<f64>,
    /// Column mode shapes.
    pub mode_shapes: DMatrix<Complex64>,
    /// Natural frequencies (Hz).
    pub freq_natural: Vec<f64>,
}

/// Scalar description of one mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeSummary {
    /// Column index in [`ModalResults::mode_shapes`].
    pub index: usize,
    pub freq_damped: f64,
    pub damping_ratio: f64,
    pub freq_natural: f64,
    pub pseudo_log_decrement: f64,
}

impl ModalResults {
    pub(crate) fn empty(rows: usize) -> Self {
        Self {
            freq_damped: Vec::new(),
            damping_ratio: Vec::new(),
            mode_shapes: DMatrix::zeros(rows, 0),
            freq_natural: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.freq_damped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freq_damped.is_empty()
    }

    /// Reorder every per-mode sequence and the shape columns together.
    pub(crate) fn reorder(self, order: &[usize]) -> Self {
        Self {
            freq_damped: permute(&self.freq_damped, order),
            damping_ratio: permute(&self.damping_ratio, order),
            mode_shapes: self.mode_shapes.select_columns(order.iter()),
            freq_natural: permute(&self.freq_natural, order),
        }
    }

    pub fn summaries(&self) -> Vec<ModeSummary> {
        (0..self.len())
            .map(|index| ModeSummary {
                index,
                freq_damped: self.freq_damped[index],
                damping_ratio: self.damping_ratio[index],
                freq_natural: self.freq_natural[index],
                pseudo_log_decrement: pseudo_log_decrement(self.damping_ratio[index]),
            })
            .collect()
    }

    pub fn log_decrements(&self) -> Vec<f64> {
        self.damping_ratio.iter().map(|&zeta| log_decrement(zeta)).collect()
    }

    /// Indices of modes whose damping ratio is NaN.
    pub fn degenerate_modes(&self) -> Vec<usize> {
        self.damping_ratio
            .iter()
            .enumerate()
            .filter(|(_, zeta)| zeta.is_nan())
            .map(|(i, _)| i)
            .collect()
    }
}
