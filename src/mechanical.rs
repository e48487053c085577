//! Eigen-analysis of second-order mechanical systems `M q̈ + C q̇ + K q = 0`.

use nalgebra::DMatrix;
use tracing::{debug, warn};

use crate::error::Result;
use crate::matrix::{argsort_by, cmp_nan_last, to_complex, validate_square_set};
use crate::modes::{natural_from_damped, ModalResults};
use crate::polyeig::polyeig;
use crate::solver::eig;
use crate::types::{
    EigOptions, MckMethod, MckOptions, MAX_PSEUDO_LOG_DECREMENT, MIN_DAMPED_FREQUENCY_HZ, TWO_PI,
};

/// Undamped modes of `(K, M)` with damping ratios read from the diagonal of
/// the modal damping matrix `Qᵗ C Q` (Rayleigh-damping approximation).
fn diagonal_beta(m: &DMatrix<f64>, c: &DMatrix<f64>, k: &DMatrix<f64>) -> Result<ModalResults> {
    // Mass-normalized shapes are required for the modal damping; keep solver order.
    let options = EigOptions {
        sort: false,
        ..EigOptions::default()
    };
    let modal = eig(k, Some(m), &options)?;
    let q = modal.eigenvectors;
    let freq_0: Vec<f64> = modal.lambda.frequencies().iter().copied().collect();

    let beta = q.transpose() * to_complex(c) * &q;

    let mut damping_ratio = Vec::with_capacity(freq_0.len());
    let mut freq_damped = Vec::with_capacity(freq_0.len());
    for (j, &f0) in freq_0.iter().enumerate() {
        let xi = beta[(j, j)].re / (2.0 * f0);
        let zeta = if xi > MAX_PSEUDO_LOG_DECREMENT {
            warn!(
                mode = j,
                pseudo_log_decrement = xi,
                "Rayleigh damping approximation broke down, damping ratio set to NaN"
            );
            f64::NAN
        } else {
            xi / TWO_PI
        };
        damping_ratio.push(zeta);
        freq_damped.push(f0 * (1.0 - zeta * zeta).sqrt());
    }

    Ok(ModalResults {
        freq_natural: freq_0,
        freq_damped,
        damping_ratio,
        mode_shapes: q,
    })
}

/// Exact modes from the quadratic eigenvalue problem `(K + λC + λ²M) x = 0`.
fn full_matrix(m: &DMatrix<f64>, c: &DMatrix<f64>, k: &DMatrix<f64>) -> Result<ModalResults> {
    let solution = polyeig(&[k.clone(), c.clone(), m.clone()], false)?;
    let eigenvalues = solution.eigenvalues.to_complex();

    let valid: Vec<usize> = (0..eigenvalues.len())
        .filter(|&i| eigenvalues[i].im / TWO_PI > MIN_DAMPED_FREQUENCY_HZ)
        .collect();

    let freq_damped: Vec<f64> = valid.iter().map(|&i| eigenvalues[i].im / TWO_PI).collect();
    let damping_ratio: Vec<f64> = valid
        .iter()
        .map(|&i| -eigenvalues[i].re / eigenvalues[i].norm())
        .collect();

    Ok(ModalResults {
        freq_natural: vec![f64::NAN; valid.len()],
        freq_damped,
        damping_ratio,
        mode_shapes: solution.eigenvectors.select_columns(valid.iter()),
    })
}

/// Damped frequencies, damping ratios, mode shapes and natural frequencies of
/// a mechanical system given its mass `m`, damping `c` and stiffness `k`.
///
/// With `sort`, modes are ordered by ascending damped frequency (NaN last).
/// The natural frequency is recomputed for both methods as
/// `freq_d / sqrt(1 - zeta²)`.
pub fn eig_mck(
    m: &DMatrix<f64>,
    c: &DMatrix<f64>,
    k: &DMatrix<f64>,
    options: &MckOptions,
) -> Result<ModalResults> {
    let n = validate_square_set(&[("mass", m), ("damping", c), ("stiffness", k)])?;

    let mut results = match options.method {
        MckMethod::DiagonalBeta => diagonal_beta(m, c, k)?,
        MckMethod::FullMatrix => full_matrix(m, c, k)?,
    };

    if options.sort {
        let order = argsort_by(&results.freq_damped, |a, b| cmp_nan_last(*a, *b));
        results = results.reorder(&order);
    }

    results.freq_natural = results
        .freq_damped
        .iter()
        .zip(&results.damping_ratio)
        .map(|(&fd, &zeta)| natural_from_damped(fd, zeta))
        .collect();

    debug!(
        n,
        method = %options.method,
        modes = results.len(),
        degenerate = results.degenerate_modes().len(),
        "mechanical system analysed"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::DVector;

    fn diag(values: &[f64]) -> DMatrix<f64> {
        DMatrix::from_diagonal(&DVector::from_row_slice(values))
    }

    fn options(method: MckMethod) -> MckOptions {
        MckOptions {
            method,
            ..MckOptions::default()
        }
    }

    #[test]
    fn single_dof_matches_closed_form() {
        let (m, c, k) = (diag(&[2.0]), diag(&[0.4]), diag(&[8.0]));
        // ω = 2 rad/s, ζ = c / (2 m ω) = 0.05
        let results = eig_mck(&m, &c, &k, &MckOptions::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert_abs_diff_eq!(results.damping_ratio[0], 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(results.freq_natural[0], 2.0 / TWO_PI, epsilon = 1e-12);
    }

    #[test]
    fn diagonal_systems_agree_between_methods() {
        let (m, c, k) = (diag(&[2.0, 1.0]), diag(&[0.4, 0.2]), diag(&[8.0, 50.0]));
        let exact = eig_mck(&m, &c, &k, &options(MckMethod::FullMatrix)).unwrap();
        let rayleigh = eig_mck(&m, &c, &k, &options(MckMethod::DiagonalBeta)).unwrap();

        assert_eq!(exact.len(), 2);
        assert_eq!(rayleigh.len(), 2);
        for j in 0..2 {
            assert_abs_diff_eq!(exact.freq_damped[j], rayleigh.freq_damped[j], epsilon = 1e-10);
            assert_abs_diff_eq!(exact.damping_ratio[j], rayleigh.damping_ratio[j], epsilon = 1e-10);
            assert_abs_diff_eq!(exact.freq_natural[j], rayleigh.freq_natural[j], epsilon = 1e-10);
        }
    }

    #[test]
    fn excessive_rayleigh_damping_is_flagged_nan() {
        // ω = 1 rad/s: ξ = c / (2 f₀) = 10π > 2π
        let (m, c, k) = (diag(&[1.0, 1.0]), diag(&[10.0, 0.1]), diag(&[1.0, 4.0]));
        let results = eig_mck(&m, &c, &k, &options(MckMethod::DiagonalBeta)).unwrap();

        assert_eq!(results.len(), 2);
        assert!(!results.damping_ratio[0].is_nan());
        assert!(results.damping_ratio[1].is_nan());
        assert!(results.freq_damped[1].is_nan());
        assert!(results.freq_natural[1].is_nan());
        assert_eq!(results.degenerate_modes(), vec![1]);
    }

    #[test]
    fn overdamped_roots_are_discarded_by_full_matrix() {
        let (m, c, k) = (diag(&[1.0, 1.0]), diag(&[10.0, 0.1]), diag(&[1.0, 4.0]));
        let results = eig_mck(&m, &c, &k, &MckOptions::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert_abs_diff_eq!(results.freq_natural[0], 2.0 / TWO_PI, epsilon = 1e-10);
    }

    #[test]
    fn unsorted_results_still_recompute_natural_frequency() {
        let (m, c, k) = (diag(&[1.0, 1.0]), diag(&[0.2, 0.1]), diag(&[9.0, 4.0]));
        let results = eig_mck(
            &m,
            &c,
            &k,
            &MckOptions {
                sort: false,
                ..MckOptions::default()
            },
        )
        .unwrap();
        assert_eq!(results.len(), 2);
        for j in 0..2 {
            assert_abs_diff_eq!(
                results.freq_natural[j],
                natural_from_damped(results.freq_damped[j], results.damping_ratio[j]),
                epsilon = 1e-14
            );
        }
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let result = eig_mck(&diag(&[1.0]), &diag(&[0.1, 0.1]), &diag(&[1.0]), &MckOptions::default());
        assert!(result.is_err());
    }
}
