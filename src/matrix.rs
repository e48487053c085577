//! Input validation and column utilities shared by the analyses.

use std::cmp::Ordering;

use nalgebra::DMatrix;

use crate::error::{EvaError, Result};
use crate::types::{Complex64, PIVOT_TIE_TOL, SYMMETRY_TOL};

// ============================================================================
// Validation
// ============================================================================

/// Check that a named set of matrices is non-empty, square, equally shaped and
/// finite. Returns the common dimension.
pub(crate) fn validate_square_set(matrices: &[(&str, &DMatrix<f64>)]) -> Result<usize> {
    let Some((_, first)) = matrices.first() else {
        return Err(EvaError::EmptyMatrixSequence);
    };
    let (rows, cols) = first.shape();

    for (name, m) in matrices {
        if m.nrows() != m.ncols() {
            return Err(EvaError::NotSquare {
                name: (*name).to_string(),
                rows: m.nrows(),
                cols: m.ncols(),
            });
        }
        if m.shape() != (rows, cols) {
            return Err(EvaError::ShapeMismatch {
                name: (*name).to_string(),
                rows: m.nrows(),
                cols: m.ncols(),
                expected_rows: rows,
                expected_cols: cols,
            });
        }
        if m.iter().any(|v| !v.is_finite()) {
            return Err(EvaError::NonFinite {
                name: (*name).to_string(),
            });
        }
    }

    Ok(rows)
}

/// Symmetry check relative to the largest entry.
pub(crate) fn is_symmetric(m: &DMatrix<f64>) -> bool {
    let scale = m.amax().max(1.0);
    let n = m.nrows();
    (0..n).all(|i| (i + 1..n).all(|j| (m[(i, j)] - m[(j, i)]).abs() <= SYMMETRY_TOL * scale))
}

pub(crate) fn to_complex(m: &DMatrix<f64>) -> DMatrix<Complex64> {
    m.map(|v| Complex64::new(v, 0.0))
}

/// Return a copy of `m` where every entry with magnitude below `tol` is zero.
///
/// Linearized models exported by simulation tools carry round-off noise in
/// structurally zero couplings; flushing it keeps repeated eigenvalues exact.
pub fn zero_small_entries(m: &DMatrix<f64>, tol: f64) -> DMatrix<f64> {
    m.map(|v| if v.abs() < tol { 0.0 } else { v })
}

// ============================================================================
// Column scaling
// ============================================================================

/// Divide each column by its largest absolute entry. The divisor is
/// non-negative, so the overall sign of a column is left as computed.
pub(crate) fn scale_columns_by_max_abs(q: &mut DMatrix<Complex64>) {
    for mut col in q.column_iter_mut() {
        let scale = col.iter().map(|z| z.norm()).fold(0.0, f64::max);
        if scale > 0.0 {
            for z in col.iter_mut() {
                *z /= scale;
            }
        }
    }
}

/// Index of the first entry whose magnitude reaches the largest one, up to
/// [`PIVOT_TIE_TOL`]. `None` for an empty vector.
pub(crate) fn pivot_index<'a, I>(entries: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a Complex64>,
{
    let magnitudes: Vec<f64> = entries.into_iter().map(|z| z.norm()).collect();
    let largest = magnitudes.iter().copied().fold(0.0, f64::max);
    magnitudes
        .iter()
        .position(|&v| v >= largest * (1.0 - PIVOT_TIE_TOL))
}

/// Divide each column by the (signed) value of its largest-magnitude entry,
/// so that entry becomes exactly one. Ties go to the lowest row index.
pub(crate) fn scale_columns_by_max_entry(q: &mut DMatrix<Complex64>) {
    for mut col in q.column_iter_mut() {
        let Some(i) = pivot_index(col.iter()) else {
            continue;
        };
        let pivot = col[i];
        if pivot.norm() > 0.0 {
            for z in col.iter_mut() {
                *z /= pivot;
            }
        }
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Ascending order with NaN placed after every number.
pub(crate) fn cmp_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.total_cmp(&b),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

/// Lexicographic order on (real, imaginary).
pub(crate) fn cmp_complex(a: &Complex64, b: &Complex64) -> Ordering {
    cmp_nan_last(a.re, b.re).then_with(|| cmp_nan_last(a.im, b.im))
}

/// Indices that sort `values` according to `cmp` (stable).
pub(crate) fn argsort_by<T, F>(values: &[T], mut cmp: F) -> Vec<usize>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| cmp(&values[a], &values[b]));
    indices
}

pub(crate) fn permute<T: Copy>(values: &[T], order: &[usize]) -> Vec<T> {
    order.iter().map(|&i| values[i]).collect()
}
