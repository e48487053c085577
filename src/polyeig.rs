//! Polynomial eigenvalue problem `(A₀ + λA₁ + … + λᵖAₚ) x = 0`.
//!
//! The problem is reduced to a linear pencil of dimension `n·p` in companion
//! form and solved with the dense generalized solver. Only the first `n` rows of
//! each pencil eigenvector (the physical coordinates) are returned.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::eigen::eigen_generalized;
use crate::error::{EvaError, Result};
use crate::matrix::{argsort_by, cmp_complex, scale_columns_by_max_abs, validate_square_set};
use crate::types::{Complex64, REAL_EIGENVALUE_TOL};

/// Eigenvalues of a polynomial problem, real when the whole spectrum is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Spectrum {
    Real(DVector<f64>),
    Complex(DVector<Complex64>),
}

impl Spectrum {
    /// Collapse to a real spectrum when every imaginary part is negligible.
    fn from_complex(values: DVector<Complex64>) -> Self {
        let all_real = values
            .iter()
            .all(|z| z.im.abs() <= REAL_EIGENVALUE_TOL * z.norm().max(1.0));
        if all_real {
            Spectrum::Real(values.map(|z| z.re))
        } else {
            Spectrum::Complex(values)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Spectrum::Real(v) => v.len(),
            Spectrum::Complex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Spectrum::Real(_))
    }

    pub fn get(&self, i: usize) -> Option<Complex64> {
        match self {
            Spectrum::Real(v) => v.get(i).map(|&re| Complex64::new(re, 0.0)),
            Spectrum::Complex(v) => v.get(i).copied(),
        }
    }

    pub fn to_complex(&self) -> DVector<Complex64> {
        match self {
            Spectrum::Real(v) => v.map(|re| Complex64::new(re, 0.0)),
            Spectrum::Complex(v) => v.clone(),
        }
    }

    fn select(&self, order: &[usize]) -> Self {
        match self {
            Spectrum::Real(v) => Spectrum::Real(v.select_rows(order.iter())),
            Spectrum::Complex(v) => Spectrum::Complex(v.select_rows(order.iter())),
        }
    }
}

/// Solution of a polynomial eigenvalue problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolyEigen {
    /// `n × n·p` eigenvectors, each column scaled by its largest absolute entry.
    pub eigenvectors: DMatrix<Complex64>,
    /// `n·p` eigenvalues.
    pub eigenvalues: Spectrum,
}

fn coefficient_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("A{i}")).collect()
}

/// Assemble the companion pencil `(C, D)` for coefficients `A₀ … Aₚ`.
///
/// ```text
/// C = [  0    I    0  …  0      ]     D = [ I      0  ]
///     [  0    0    I  …  0      ]         [ 0     Aₚ  ]
///     [ -A₀  -A₁  -A₂ … -Aₚ₋₁  ]
/// ```
///
/// Both blocks are `n·p × n·p`; `p ≥ 1` is required.
pub fn companion_pencil(coefficients: &[DMatrix<f64>]) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
    let names = coefficient_names(coefficients.len());
    let named: Vec<(&str, &DMatrix<f64>)> = names
        .iter()
        .map(String::as_str)
        .zip(coefficients.iter())
        .collect();
    let n = validate_square_set(&named)?;
    let p = coefficients.len() - 1;
    if p == 0 {
        return Err(EvaError::EmptyMatrixSequence);
    }

    let size = n * p;
    let lead = n * (p - 1);
    let mut c = DMatrix::<f64>::zeros(size, size);
    let mut d = DMatrix::<f64>::zeros(size, size);

    if lead > 0 {
        c.view_mut((0, n), (lead, lead)).fill_with_identity();
        d.view_mut((0, 0), (lead, lead)).fill_with_identity();
    }
    for (j, a_j) in coefficients[..p].iter().enumerate() {
        c.view_mut((lead, j * n), (n, n)).copy_from(&(-a_j));
    }

    d.view_mut((lead, lead), (n, n)).copy_from(&coefficients[p]);

    Ok((c, d))
}

/// Solve `(A₀ + λA₁ + … + λᵖAₚ) x = 0` for `coefficients = [A₀, …, Aₚ]`.
///
/// The most common use is the quadratic problem of a mechanical system,
/// `polyeig(&[K, C, M], false)`.
///
/// Returns `n·p` eigenpairs. When `sort` is set the pairs are ordered by
/// ascending eigenvalue (lexicographic on real then imaginary part for complex
/// spectra). A single coefficient (degree zero) has no eigenvalues.
pub fn polyeig(coefficients: &[DMatrix<f64>], sort: bool) -> Result<PolyEigen> {
    let names = coefficient_names(coefficients.len());
    let named: Vec<(&str, &DMatrix<f64>)> = names
        .iter()
        .map(String::as_str)
        .zip(coefficients.iter())
        .collect();
    let n = validate_square_set(&named)?;
    let degree = coefficients.len() - 1;

    if degree == 0 || n == 0 {
        return Ok(PolyEigen {
            eigenvectors: DMatrix::zeros(n, 0),
            eigenvalues: Spectrum::Real(DVector::zeros(0)),
        });
    }

    let (c, d) = companion_pencil(coefficients)?;
    let leading = format!("leading coefficient A{degree}");
    let pencil = eigen_generalized(&c, &d, &leading)?;

    let mut eigenvalues = Spectrum::from_complex(pencil.eigenvalues);
    let mut eigenvectors = pencil.eigenvectors.rows(0, n).into_owned();

    if sort {
        let order = match &eigenvalues {
            Spectrum::Real(v) => argsort_by(v.as_slice(), |a, b| a.total_cmp(b)),
            Spectrum::Complex(v) => argsort_by(v.as_slice(), cmp_complex),
        };
        eigenvalues = eigenvalues.select(&order);
        eigenvectors = eigenvectors.select_columns(order.iter());
    }

    scale_columns_by_max_abs(&mut eigenvectors);

    debug!(
        n,
        degree,
        eigenvalues = eigenvalues.len(),
        real = eigenvalues.is_real(),
        "polynomial eigenvalue problem solved"
    );

    Ok(PolyEigen {
        eigenvectors,
        eigenvalues,
    })
}
