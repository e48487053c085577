//! Eigen-analysis of first-order state matrices.
//!
//! States are assumed to be ordered `{q, q_dot, q1}`: `nq` second-order
//! positions, their `nq` velocities, then `nq1` purely first-order states. The
//! ordering only matters for trimming the velocity rows off the eigenvectors.

use nalgebra::DMatrix;
use tracing::debug;

use crate::eigen::eigen_general;
use crate::error::{EvaError, Result};
use crate::matrix::{argsort_by, cmp_nan_last, scale_columns_by_max_abs, validate_square_set};
use crate::modes::ModalResults;
use crate::types::{ModeNormalization, StateAnalysisOptions, TWO_PI};

/// Resolve the `(nq, nq1)` partition of an `n`-dimensional state.
///
/// `nq1` defaults to 0 and `nq` to `(n - nq1) / 2`; the result must satisfy
/// `n = 2·nq + nq1`.
pub fn resolve_partition(n: usize, nq: Option<usize>, nq1: Option<usize>) -> Result<(usize, usize)> {
    let nq1 = nq1.unwrap_or(0);
    if nq1 > n {
        return Err(EvaError::StatePartition {
            n,
            nq: nq.unwrap_or(0),
            nq1,
        });
    }
    let nq = nq.unwrap_or((n - nq1) / 2);
    let total = nq.checked_mul(2).and_then(|v| v.checked_add(nq1));
    if total != Some(n) {
        return Err(EvaError::StatePartition { n, nq, nq1 });
    }
    Ok((nq, nq1))
}

/// Assemble the state matrix `[[0, I], [-M⁻¹K, -M⁻¹C]]` of
/// `M q̈ + C q̇ + K q = 0` in `{q, q_dot}` ordering.
pub fn state_matrix_from_mck(
    m: &DMatrix<f64>,
    c: &DMatrix<f64>,
    k: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    let n = validate_square_set(&[("mass", m), ("damping", c), ("stiffness", k)])?;
    let lu = m.clone().lu();
    let singular = || EvaError::SingularMatrix {
        name: "mass".to_string(),
    };
    let m_inv_k = lu.solve(k).ok_or_else(singular)?;
    let m_inv_c = lu.solve(c).ok_or_else(singular)?;

    let mut a = DMatrix::<f64>::zeros(2 * n, 2 * n);
    a.view_mut((0, n), (n, n)).fill_with_identity();
    a.view_mut((n, 0), (n, n)).copy_from(&(-m_inv_k));
    a.view_mut((n, n), (n, n)).copy_from(&(-m_inv_c));
    Ok(a)
}

/// Damped/natural frequencies, damping ratios and mode shapes of a state matrix.
///
/// Only eigenvalues with strictly positive imaginary part are reported, one
/// per complex-conjugate pair; real (non-oscillating) eigenvalues are dropped.
/// For each retained `λ`: `ω₀ = |λ|`, `freq_d = Im λ / 2π`,
/// `zeta = -Re λ / ω₀`, `freq_0 = ω₀ / 2π`. Modes are sorted by `freq_0`.
///
/// Unless `full_eigenvectors` is set, the velocity rows `nq..2·nq` are removed
/// from the mode shapes.
pub fn eig_a(a: &DMatrix<f64>, options: &StateAnalysisOptions) -> Result<ModalResults> {
    let n = validate_square_set(&[("state matrix", a)])?;
    let (nq, nq1) = resolve_partition(n, options.nq, options.nq1)?;

    let decomposition = eigen_general(a)?;
    let mut shapes = decomposition.eigenvectors;
    if !options.full_eigenvectors {
        shapes = shapes.remove_rows(nq, nq);
    }

    let retained: Vec<usize> = (0..decomposition.eigenvalues.len())
        .filter(|&i| decomposition.eigenvalues[i].im > 0.0)
        .collect();
    if retained.is_empty() {
        debug!(n, nq, nq1, "state matrix has no oscillating modes");
        return Ok(ModalResults::empty(shapes.nrows()));
    }

    let mut results = ModalResults {
        freq_damped: Vec::with_capacity(retained.len()),
        damping_ratio: Vec::with_capacity(retained.len()),
        mode_shapes: shapes.select_columns(retained.iter()),
        freq_natural: Vec::with_capacity(retained.len()),
    };
    for &i in &retained {
        let lambda = decomposition.eigenvalues[i];
        let omega_0 = lambda.norm();
        results.freq_damped.push(lambda.im / TWO_PI);
        results.damping_ratio.push(-lambda.re / omega_0);
        results.freq_natural.push(omega_0 / TWO_PI);
    }

    let order = argsort_by(&results.freq_natural, |a, b| cmp_nan_last(*a, *b));
    let mut results = results.reorder(&order);

    match options.normalization {
        ModeNormalization::None => {}
        ModeNormalization::ByMax => scale_columns_by_max_abs(&mut results.mode_shapes),
    }

    debug!(n, nq, nq1, modes = results.len(), "state matrix analysed");
    Ok(results)
}
