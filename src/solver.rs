//! Generalized eigensolver for modal analysis.
//!
//! Solves `K x = λ M x` (or `K x = λ x`) and post-processes the eigenpairs the
//! way structural-dynamics tools expect: mass-normalized mode shapes, an
//! eigenvalue diagonal recomputed from `Qᵗ K Q`, ascending order and optional
//! frequency output.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::eigen::{eigen_general, eigen_generalized, eigen_symmetric_definite, EigenDecomposition};
use crate::error::Result;
use crate::matrix::{
    argsort_by, cmp_complex, scale_columns_by_max_entry, to_complex, validate_square_set,
};
use crate::types::{Complex64, EigOptions, EigenvalueOutput, ModeNormalization, TWO_PI};

/// Eigenvalues as returned by [`eig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Lambda {
    /// Eigenvalues on the diagonal of a square matrix.
    Diagonal(DMatrix<Complex64>),
    /// Natural frequencies in Hz.
    Frequencies(DVector<f64>),
}

impl Lambda {
    fn from_eigenvalues(values: &DVector<Complex64>, output: EigenvalueOutput) -> Self {
        match output {
            EigenvalueOutput::Diagonal => Lambda::Diagonal(DMatrix::from_diagonal(values)),
            EigenvalueOutput::Frequencies => {
                Lambda::Frequencies(values.map(|lambda| lambda.re.sqrt() / TWO_PI))
            }
        }
    }

    /// Eigenvalues read back from the diagonal. `None` for frequency output.
    pub fn eigenvalues(&self) -> Option<DVector<Complex64>> {
        match self {
            Lambda::Diagonal(d) => Some(d.diagonal()),
            Lambda::Frequencies(_) => None,
        }
    }

    pub fn frequencies(&self) -> DVector<f64> {
        match self {
            Lambda::Diagonal(d) => d.diagonal().map(|lambda| lambda.re.sqrt() / TWO_PI),
            Lambda::Frequencies(f) => f.clone(),
        }
    }
}

/// Mode shapes and eigenvalues of a (generalized) eigenproblem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralizedEigen {
    /// Column eigenvectors, mass-normalized when a mass matrix was given.
    pub eigenvectors: DMatrix<Complex64>,
    pub lambda: Lambda,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Scale each column so that `qⱼᵗ M qⱼ = 1` (plain transpose, no conjugation).
fn mass_normalize(q: &mut DMatrix<Complex64>, m: &DMatrix<Complex64>) {
    for j in 0..q.ncols() {
        let modal_mass = {
            let q_j = q.column(j);
            q_j.dot(&(m * q_j))
        };
        if modal_mass.norm() == 0.0 || !modal_mass.is_finite() {
            warn!(mode = j, "zero or non-finite modal mass, mode shape left unscaled");
            continue;
        }
        let scale = modal_mass.sqrt();
        for z in q.column_mut(j).iter_mut() {
            *z /= scale;
        }
    }
}

/// Solve the pencil, preferring the symmetric-definite path.
fn decompose_pencil(k: &DMatrix<f64>, m: &DMatrix<f64>) -> Result<EigenDecomposition> {
    if let Some(decomposition) = eigen_symmetric_definite(k, m)? {
        return Ok(decomposition);
    }
    debug!("pencil is not symmetric-definite, using the general reduction");
    eigen_generalized(k, m, "mass")
}

// ============================================================================
// Generalized Eigensolver
// ============================================================================

/// Eigen-analysis of `K x = λ M x`, or of `K` alone when `m` is `None`.
///
/// With a mass matrix the eigenvectors are mass-normalized and the returned
/// eigenvalues are the diagonal of `Qᵗ K Q` (any off-diagonal round-off is
/// dropped). Sorting, when requested, follows that recomputed diagonal.
///
/// Without a mass matrix the raw eigenvalues of `K` are returned and the
/// eigenvectors keep unit Euclidean norm. `sort`, `output` and
/// `normalization` still apply on this path; pass `sort: false` with
/// [`EigenvalueOutput::Diagonal`] to get the eigenvalues in Schur order.
///
/// [`EigenvalueOutput::Frequencies`] reports `sqrt(λ)/2π` in Hz and is only
/// meaningful for non-negative real eigenvalues; negative ones give NaN.
pub fn eig(k: &DMatrix<f64>, m: Option<&DMatrix<f64>>, options: &EigOptions) -> Result<GeneralizedEigen> {
    let (mut eigenvectors, mut eigenvalues) = match m {
        Some(m) => {
            validate_square_set(&[("stiffness", k), ("mass", m)])?;
            let mut q = decompose_pencil(k, m)?.eigenvectors;
            mass_normalize(&mut q, &to_complex(m));

            let lambda = q.transpose() * to_complex(k) * &q;
            (q, lambda.diagonal())
        }
        None => {
            let decomposition = eigen_general(k)?;
            (decomposition.eigenvectors, decomposition.eigenvalues)
        }
    };

    if options.sort {
        let order = argsort_by(eigenvalues.as_slice(), cmp_complex);
        eigenvalues = eigenvalues.select_rows(order.iter());
        eigenvectors = eigenvectors.select_columns(order.iter());
    }

    match options.normalization {
        ModeNormalization::None => {}
        ModeNormalization::ByMax => scale_columns_by_max_entry(&mut eigenvectors),
    }

    debug!(
        n = k.nrows(),
        mass = m.is_some(),
        sorted = options.sort,
        "generalized eigenproblem solved"
    );

    Ok(GeneralizedEigen {
        eigenvectors,
        lambda: Lambda::from_eigenvalues(&eigenvalues, options.output),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaError;
    use crate::matrix::pivot_index;
    use approx::assert_abs_diff_eq;

    fn two_dof() -> (DMatrix<f64>, DMatrix<f64>) {
        let k = DMatrix::from_row_slice(2, 2, &[6.0, -2.0, -2.0, 4.0]);
        let m = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 1.0]);
        (k, m)
    }

    #[test]
    fn mode_shapes_are_mass_normalized() {
        let (k, m) = two_dof();
        let result = eig(&k, Some(&m), &EigOptions::default()).unwrap();
        let m_c = to_complex(&m);
        for j in 0..2 {
            let q = result.eigenvectors.column(j);
            let modal_mass = q.dot(&(&m_c * q));
            assert_abs_diff_eq!(modal_mass.re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(modal_mass.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn eigenvalues_are_sorted_and_match_characteristic_polynomial() {
        // det(K - λM) = 2λ² - 16λ + 20  ⇒  λ = 4 ∓ sqrt(6)
        let (k, m) = two_dof();
        let result = eig(&k, Some(&m), &EigOptions::default()).unwrap();
        let values = result.lambda.eigenvalues().unwrap();
        assert_abs_diff_eq!(values[0].re, 4.0 - 6f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(values[1].re, 4.0 + 6f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn frequency_output_is_sqrt_lambda_over_two_pi() {
        let (k, m) = two_dof();
        let options = EigOptions {
            output: EigenvalueOutput::Frequencies,
            ..EigOptions::default()
        };
        let result = eig(&k, Some(&m), &options).unwrap();
        let Lambda::Frequencies(freqs) = &result.lambda else {
            panic!("expected frequency output");
        };
        assert_abs_diff_eq!(freqs[0], (4.0 - 6f64.sqrt()).sqrt() / TWO_PI, epsilon = 1e-12);
        assert!(freqs[0] < freqs[1]);
    }

    #[test]
    fn diagonal_output_is_purely_diagonal() {
        let (k, m) = two_dof();
        let result = eig(&k, Some(&m), &EigOptions::default()).unwrap();
        let Lambda::Diagonal(d) = &result.lambda else {
            panic!("expected diagonal output");
        };
        assert_eq!(d[(0, 1)], Complex64::new(0.0, 0.0));
        assert_eq!(d[(1, 0)], Complex64::new(0.0, 0.0));
    }

    #[test]
    fn by_max_normalization_sets_pivot_to_plus_one() {
        let (k, m) = two_dof();
        let options = EigOptions {
            normalization: ModeNormalization::ByMax,
            ..EigOptions::default()
        };
        let result = eig(&k, Some(&m), &options).unwrap();
        for col in result.eigenvectors.column_iter() {
            let pivot = col[pivot_index(col.iter()).unwrap()];
            assert_abs_diff_eq!(pivot.re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(pivot.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn by_max_normalization_of_symmetric_and_antisymmetric_shapes() {
        // Shapes [1, 1] and [1, -1]: both entries tie, the first one becomes +1.
        let k = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        let m = DMatrix::<f64>::identity(2, 2);
        let options = EigOptions {
            normalization: ModeNormalization::ByMax,
            ..EigOptions::default()
        };
        let result = eig(&k, Some(&m), &options).unwrap();
        let q = &result.eigenvectors;

        for j in 0..2 {
            assert_abs_diff_eq!(q[(0, j)].re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(q[(0, j)].im, 0.0, epsilon = 1e-12);
        }
        // λ = 1 (antisymmetric) sorts before λ = 3 (symmetric)
        assert_abs_diff_eq!(q[(1, 0)].re, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(q[(1, 1)].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn without_mass_matrix_returns_raw_eigenvalues() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -9.0, 0.0]);
        let options = EigOptions {
            sort: false,
            ..EigOptions::default()
        };
        let result = eig(&a, None, &options).unwrap();
        let values = result.lambda.eigenvalues().unwrap();
        let mut imag: Vec<f64> = values.iter().map(|z| z.im.abs()).collect();
        imag.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
        assert_eq!(imag.len(), 1);
        assert_abs_diff_eq!(imag[0], 3.0, epsilon = 1e-12);
        for col in result.eigenvectors.column_iter() {
            assert_abs_diff_eq!(col.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn without_mass_matrix_options_still_apply() {
        let k = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(vec![9.0, 1.0, 4.0]));

        let sorted = eig(&k, None, &EigOptions::default()).unwrap();
        let values = sorted.lambda.eigenvalues().unwrap();
        for (value, expected) in values.iter().zip([1.0, 4.0, 9.0]) {
            assert_abs_diff_eq!(value.re, expected, epsilon = 1e-12);
        }

        let options = EigOptions {
            output: EigenvalueOutput::Frequencies,
            ..EigOptions::default()
        };
        let result = eig(&k, None, &options).unwrap();
        let Lambda::Frequencies(freqs) = &result.lambda else {
            panic!("expected frequency output");
        };
        assert_abs_diff_eq!(freqs[0], 1.0 / TWO_PI, epsilon = 1e-14);
        assert_abs_diff_eq!(freqs[2], 3.0 / TWO_PI, epsilon = 1e-14);
    }

    #[test]
    fn non_symmetric_stiffness_uses_general_path() {
        let k = DMatrix::from_row_slice(2, 2, &[5.0, 1.0, -1.0, 3.0]);
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 2.0]);
        let result = eig(&k, Some(&m), &EigOptions::default()).unwrap();
        let m_c = to_complex(&m);
        for j in 0..2 {
            let q = result.eigenvectors.column(j);
            let modal_mass = q.dot(&(&m_c * q));
            assert_abs_diff_eq!(modal_mass.re, 1.0, epsilon = 1e-10);
            assert_abs_diff_eq!(modal_mass.im, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn mismatched_mass_is_rejected() {
        let (k, _) = two_dof();
        let m = DMatrix::<f64>::identity(3, 3);
        assert!(matches!(
            eig(&k, Some(&m), &EigOptions::default()),
            Err(EvaError::ShapeMismatch { .. })
        ));
    }
}
