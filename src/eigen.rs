//! Dense eigen-decomposition kernels.
//!
//! Inputs are real matrices, eigenpairs are complex. A general matrix is
//! reduced to real Schur form `A = Q T Qᵗ`. Eigenvalues are read off the 1×1
//! and 2×2 diagonal blocks of `T`; the eigenvector of a simple eigenvalue is
//! found by back-substitution through the quasi-triangular `T` and mapped back
//! with `Q`, so the whole decomposition is O(n³).
//!
//! Numerically coincident eigenvalues are grouped into clusters. A cluster of
//! two or more takes the right singular vectors of `A - λI` belonging to its
//! smallest singular values, so a repeated eigenvalue with a full eigenspace
//! receives independent vectors.
//!
//! ## Parallelization
//!
//! When the `parallel` feature is enabled, the eigenvectors of the clusters
//! are computed on the Rayon thread pool.

use nalgebra::linalg::{Schur, SymmetricEigen, SVD};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{EvaError, Result};
use crate::matrix::{argsort_by, is_symmetric, pivot_index, to_complex, validate_square_set};
use crate::types::{Complex64, CLUSTER_TOL, MAX_ITERATIONS_PER_DIM};

/// Eigenvalues and column eigenvectors, aligned index for index.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenDecomposition {
    pub eigenvalues: DVector<Complex64>,
    pub eigenvectors: DMatrix<Complex64>,
}

impl EigenDecomposition {
    fn empty(rows: usize) -> Self {
        Self {
            eigenvalues: DVector::zeros(0),
            eigenvectors: DMatrix::zeros(rows, 0),
        }
    }

    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn iteration_budget(n: usize) -> usize {
    MAX_ITERATIONS_PER_DIM * n.max(1)
}

/// Group indices of numerically coincident eigenvalues. Each group keeps the
/// first eigenvalue as its shift.
fn cluster_eigenvalues(values: &[Complex64]) -> Vec<Vec<usize>> {
    let mut assigned = vec![false; values.len()];
    let mut clusters = Vec::new();

    for i in 0..values.len() {
        if assigned[i] {
            continue;
        }
        let tol = CLUSTER_TOL * values[i].norm().max(1.0);
        let members: Vec<usize> = (i..values.len())
            .filter(|&j| !assigned[j] && (values[j] - values[i]).norm() <= tol)
            .collect();
        for &j in &members {
            assigned[j] = true;
        }
        clusters.push(members);
    }

    clusters
}

/// Rotate a vector so its largest component (first on ties) is real and positive.
fn fix_phase(v: &mut DVector<Complex64>) {
    let Some(i) = pivot_index(v.iter()) else {
        return;
    };
    let pivot = v[i];
    let magnitude = pivot.norm();
    if magnitude > 0.0 {
        let rotation = pivot.conj() / magnitude;
        for z in v.iter_mut() {
            *z *= rotation;
        }
    }
}

/// Scale to unit Euclidean norm and fix the phase.
fn finish_vector(mut v: DVector<Complex64>) -> DVector<Complex64> {
    let norm = v.norm();
    if norm > 0.0 {
        v.unscale_mut(norm);
    }
    fix_phase(&mut v);
    v
}

/// Real Schur factors `A = Q T Qᵗ` together with the diagonal block layout of `T`.
struct SchurFactors {
    q: DMatrix<Complex64>,
    t: DMatrix<f64>,
    /// `(start, size)` of every diagonal block, size 1 or 2.
    blocks: Vec<(usize, usize)>,
    /// Block index owning each diagonal position.
    block_of: Vec<usize>,
    /// Floor for pivots of the back-substitution.
    smin: f64,
}

impl SchurFactors {
    fn new(q: DMatrix<f64>, t: DMatrix<f64>) -> Self {
        let n = t.nrows();
        let mut blocks = Vec::with_capacity(n);
        let mut block_of = Vec::with_capacity(n);
        let mut i = 0;
        while i < n {
            // Same block detection as `Schur::complex_eigenvalues`.
            let size = if i + 1 < n && t[(i + 1, i)] != 0.0 { 2 } else { 1 };
            block_of.extend(std::iter::repeat(blocks.len()).take(size));
            blocks.push((i, size));
            i += size;
        }
        let smin = (f64::EPSILON * t.amax()).max(f64::MIN_POSITIVE);

        Self {
            q: to_complex(&q),
            t,
            blocks,
            block_of,
            smin,
        }
    }

    fn guard(&self, z: Complex64) -> Complex64 {
        if z.norm() < self.smin {
            Complex64::new(self.smin, 0.0)
        } else {
            z
        }
    }

    /// `Σ T[row, k]·x[k]` for `k` in `from..to`.
    fn row_dot(&self, row: usize, x: &DVector<Complex64>, from: usize, to: usize) -> Complex64 {
        (from..to).fold(Complex64::new(0.0, 0.0), |acc, k| acc + x[k] * self.t[(row, k)])
    }

    /// Eigenvector of `T` for the eigenvalue `lambda` sitting at diagonal
    /// position `pos`, by back-substitution over the blocks above it.
    fn triangular_eigenvector(&self, pos: usize, lambda: Complex64) -> DVector<Complex64> {
        let t = &self.t;
        let n = t.nrows();
        let block = self.block_of[pos];
        let (start, size) = self.blocks[block];
        let end = start + size;

        let mut x = DVector::<Complex64>::zeros(n);
        if size == 1 {
            x[start] = Complex64::new(1.0, 0.0);
        } else {
            // Null vector of [[a, b], [c, d]] - λI; b ≠ 0 for a complex pair.
            x[start] = Complex64::new(t[(start, start + 1)], 0.0);
            x[start + 1] = lambda - t[(start, start)];
        }

        for &(i, size) in self.blocks[..block].iter().rev() {
            if size == 1 {
                let rhs = -self.row_dot(i, &x, i + 1, end);
                x[i] = rhs / self.guard(Complex64::new(t[(i, i)], 0.0) - lambda);
            } else {
                let r0 = -self.row_dot(i, &x, i + 2, end);
                let r1 = -self.row_dot(i + 1, &x, i + 2, end);
                let a = Complex64::new(t[(i, i)], 0.0) - lambda;
                let b = Complex64::new(t[(i, i + 1)], 0.0);
                let c = Complex64::new(t[(i + 1, i)], 0.0);
                let d = Complex64::new(t[(i + 1, i + 1)], 0.0) - lambda;
                let det = self.guard(a * d - b * c);
                x[i] = (r0 * d - b * r1) / det;
                x[i + 1] = (a * r1 - c * r0) / det;
            }

            // Keep the partial solution away from overflow.
            let largest = x.iter().map(|z| z.norm()).fold(0.0, f64::max);
            if largest > 1e150 {
                x.unscale_mut(largest);
            }
        }

        x
    }
}

/// Right singular vectors of `A - shift·I` for the `count` smallest singular values.
fn null_vectors(
    a: &DMatrix<Complex64>,
    shift: Complex64,
    count: usize,
) -> Result<Vec<DVector<Complex64>>> {
    let n = a.nrows();
    let mut shifted = a.clone();
    for i in 0..n {
        shifted[(i, i)] -= shift;
    }

    let svd = SVD::try_new(shifted, false, true, f64::EPSILON, iteration_budget(n)).ok_or(
        EvaError::NoConvergence {
            stage: "singular value decomposition",
        },
    )?;
    let v_t = svd.v_t.ok_or(EvaError::NoConvergence {
        stage: "singular value decomposition",
    })?;

    let order = argsort_by(svd.singular_values.as_slice(), |a, b| a.total_cmp(b));
    trace!(
        shift_re = shift.re,
        shift_im = shift.im,
        count,
        smallest_singular_value = svd.singular_values[order[0]],
        "null space of shifted matrix"
    );

    Ok(order
        .iter()
        .take(count)
        .map(|&row| finish_vector(v_t.row(row).adjoint()))
        .collect())
}

/// Eigenvectors of one cluster: back-substitution for a simple eigenvalue,
/// the null space of the shifted matrix for a repeated one.
fn cluster_vectors(
    a: &DMatrix<Complex64>,
    schur: &SchurFactors,
    eigenvalues: &DVector<Complex64>,
    members: &[usize],
) -> Result<Vec<DVector<Complex64>>> {
    match members {
        [pos] => {
            let x = schur.triangular_eigenvector(*pos, eigenvalues[*pos]);
            Ok(vec![finish_vector(&schur.q * x)])
        }
        _ => null_vectors(a, eigenvalues[members[0]], members.len()),
    }
}

/// Eigenvectors for every cluster sequentially.
#[cfg_attr(feature = "parallel", allow(dead_code))]
fn solve_clusters_sequential(
    a: &DMatrix<Complex64>,
    schur: &SchurFactors,
    eigenvalues: &DVector<Complex64>,
    clusters: &[Vec<usize>],
) -> Vec<Result<Vec<DVector<Complex64>>>> {
    clusters
        .iter()
        .map(|members| cluster_vectors(a, schur, eigenvalues, members))
        .collect()
}

/// Eigenvectors for every cluster in parallel using Rayon.
/// Each cluster is independent of the others.
#[cfg(feature = "parallel")]
fn solve_clusters_parallel(
    a: &DMatrix<Complex64>,
    schur: &SchurFactors,
    eigenvalues: &DVector<Complex64>,
    clusters: &[Vec<usize>],
) -> Vec<Result<Vec<DVector<Complex64>>>> {
    clusters
        .par_iter()
        .map(|members| cluster_vectors(a, schur, eigenvalues, members))
        .collect()
}

#[inline]
fn solve_clusters(
    a: &DMatrix<Complex64>,
    schur: &SchurFactors,
    eigenvalues: &DVector<Complex64>,
    clusters: &[Vec<usize>],
) -> Vec<Result<Vec<DVector<Complex64>>>> {
    #[cfg(feature = "parallel")]
    {
        solve_clusters_parallel(a, schur, eigenvalues, clusters)
    }
    #[cfg(not(feature = "parallel"))]
    {
        solve_clusters_sequential(a, schur, eigenvalues, clusters)
    }
}

// ============================================================================
// Dense Solvers
// ============================================================================

/// Eigenvalues and unit eigenvectors of a general real square matrix.
///
/// Eigenvalues are returned in Schur order, not sorted.
pub fn eigen_general(a: &DMatrix<f64>) -> Result<EigenDecomposition> {
    let n = validate_square_set(&[("matrix", a)])?;
    match n {
        0 => return Ok(EigenDecomposition::empty(0)),
        1 => {
            return Ok(EigenDecomposition {
                eigenvalues: DVector::from_element(1, Complex64::new(a[(0, 0)], 0.0)),
                eigenvectors: DMatrix::from_element(1, 1, Complex64::new(1.0, 0.0)),
            })
        }
        _ => {}
    }

    let schur = Schur::try_new(a.clone(), f64::EPSILON, iteration_budget(n)).ok_or(
        EvaError::NoConvergence {
            stage: "Schur decomposition",
        },
    )?;
    let eigenvalues = schur.complex_eigenvalues();
    let (q, t) = schur.unpack();
    let factors = SchurFactors::new(q, t);

    let clusters = cluster_eigenvalues(eigenvalues.as_slice());
    let repeated = clusters.iter().filter(|members| members.len() > 1).count();
    debug!(
        n,
        clusters = clusters.len(),
        repeated,
        "general eigen-decomposition"
    );

    let a_complex = to_complex(a);
    let mut eigenvectors = DMatrix::<Complex64>::zeros(n, n);
    for (members, vectors) in clusters
        .iter()
        .zip(solve_clusters(&a_complex, &factors, &eigenvalues, &clusters))
    {
        for (&idx, v) in members.iter().zip(vectors?) {
            eigenvectors.set_column(idx, &v);
        }
    }

    Ok(EigenDecomposition {
        eigenvalues,
        eigenvectors,
    })
}

/// Eigenpairs of the pencil `A x = λ B x` through the reduction `B⁻¹A`.
///
/// Fails with [`EvaError::SingularMatrix`] (named `b_name`) when `B` cannot be
/// factorized.
pub fn eigen_generalized(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    b_name: &str,
) -> Result<EigenDecomposition> {
    let n = validate_square_set(&[("matrix", a), (b_name, b)])?;
    if n == 0 {
        return Ok(EigenDecomposition::empty(0));
    }

    let reduced = b.clone().lu().solve(a).ok_or_else(|| EvaError::SingularMatrix {
        name: b_name.to_string(),
    })?;
    if reduced.iter().any(|v| !v.is_finite()) {
        return Err(EvaError::SingularMatrix {
            name: b_name.to_string(),
        });
    }

    eigen_general(&reduced)
}

/// Symmetric-definite pencil `K x = λ M x` via the Cholesky transform
/// `L⁻¹ K L⁻ᵀ`. Eigenvectors come back mass-normalized and real.
///
/// Returns `Ok(None)` when either matrix is not symmetric or `M` is not
/// positive definite, so callers can fall back to [`eigen_generalized`].
pub fn eigen_symmetric_definite(
    k: &DMatrix<f64>,
    m: &DMatrix<f64>,
) -> Result<Option<EigenDecomposition>> {
    let n = validate_square_set(&[("stiffness", k), ("mass", m)])?;
    if n == 0 {
        return Ok(Some(EigenDecomposition::empty(0)));
    }
    if !is_symmetric(k) || !is_symmetric(m) {
        return Ok(None);
    }

    // M = L Lᵀ
    let Some(chol) = m.clone().cholesky() else {
        return Ok(None);
    };
    let Some(l_inv) = chol.l().try_inverse() else {
        return Ok(None);
    };

    let k_tilde = &l_inv * k * l_inv.transpose();
    // Symmetrize to remove round-off asymmetry
    let k_tilde_sym = (&k_tilde + k_tilde.transpose()) * 0.5;

    let eig = SymmetricEigen::try_new(k_tilde_sym, f64::EPSILON, iteration_budget(n)).ok_or(
        EvaError::NoConvergence {
            stage: "symmetric eigen-decomposition",
        },
    )?;

    // φ = L⁻ᵀ y
    let phi = l_inv.transpose() * eig.eigenvectors;
    debug!(n, "symmetric-definite eigen-decomposition");

    Ok(Some(EigenDecomposition {
        eigenvalues: eig.eigenvalues.map(|v| Complex64::new(v, 0.0)),
        eigenvectors: to_complex(&phi),
    }))
}
