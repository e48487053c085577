use linmodal::{
    eig, eig_a, eig_mck, polyeig, state_matrix_from_mck, Complex64, EigOptions, MckOptions,
    StateAnalysisOptions,
};
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

fn gaussian_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows, cols, |_, _| StandardNormal.sample(&mut *rng))
}

/// Symmetric positive definite `B Bᵗ + n I`.
fn spd_matrix(rng: &mut StdRng, n: usize) -> DMatrix<f64> {
    let b = gaussian_matrix(rng, n, n);
    &b * b.transpose() + DMatrix::identity(n, n) * n as f64
}

fn to_complex(a: &DMatrix<f64>) -> DMatrix<Complex64> {
    a.map(|v| Complex64::new(v, 0.0))
}

#[test]
fn mass_normalized_modes_of_random_spd_pencils() {
    let mut rng = StdRng::seed_from_u64(7);
    for n in [2, 4, 7] {
        let m = spd_matrix(&mut rng, n);
        let s = gaussian_matrix(&mut rng, n, n);
        let k = &s + s.transpose();

        let result = eig(&k, Some(&m), &EigOptions::default()).unwrap();
        let q = &result.eigenvectors;
        let modal_mass = q.transpose() * to_complex(&m) * q;
        for j in 0..n {
            assert!(
                (modal_mass[(j, j)] - Complex64::new(1.0, 0.0)).norm() < 1e-10,
                "n = {}, mode {}: modal mass {}",
                n,
                j,
                modal_mass[(j, j)]
            );
        }

        let values = result.lambda.eigenvalues().unwrap();
        for j in 1..n {
            assert!(values[j - 1].re <= values[j].re, "eigenvalues not ascending for n = {}", n);
        }
    }
}

#[test]
fn quadratic_eigenpairs_of_random_systems_have_small_residuals() {
    let mut rng = StdRng::seed_from_u64(11);
    let n = 4;
    let m = spd_matrix(&mut rng, n);
    let c = gaussian_matrix(&mut rng, n, n) * 0.1;
    let k = spd_matrix(&mut rng, n);

    let sol = polyeig(&[k.clone(), c.clone(), m.clone()], true).unwrap();
    assert_eq!(sol.eigenvalues.len(), 2 * n);

    let (m, c, k) = (to_complex(&m), to_complex(&c), to_complex(&k));
    let scale = m.norm() + c.norm() + k.norm();
    for j in 0..2 * n {
        let s = sol.eigenvalues.get(j).unwrap();
        let x = sol.eigenvectors.column(j);
        let residual = (&m * (s * s) + &c * s + &k) * x;
        assert!(
            residual.norm() < 1e-10 * scale * (1.0 + s.norm() * s.norm()),
            "eigenpair {} residual {}",
            j,
            residual.norm()
        );
    }
}

#[test]
fn conjugate_pairs_collapse_to_single_modes() {
    let mut rng = StdRng::seed_from_u64(3);
    // Two oscillating pairs and two real decays, hidden behind a similarity.
    #[rustfmt::skip]
    let d = DMatrix::from_row_slice(6, 6, &[
        -0.1,  2.0,  0.0,  0.0,  0.0,  0.0,
        -2.0, -0.1,  0.0,  0.0,  0.0,  0.0,
         0.0,  0.0, -0.3,  5.0,  0.0,  0.0,
         0.0,  0.0, -5.0, -0.3,  0.0,  0.0,
         0.0,  0.0,  0.0,  0.0, -1.0,  0.0,
         0.0,  0.0,  0.0,  0.0,  0.0, -7.0,
    ]);
    let t = gaussian_matrix(&mut rng, 6, 6) + DMatrix::identity(6, 6) * 4.0;
    let a = &t * d * t.clone().try_inverse().unwrap();

    let results = eig_a(&a, &StateAnalysisOptions::default()).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results.mode_shapes.shape(), (3, 2));

    let omega = |re: f64, im: f64| (re * re + im * im).sqrt();
    let expected = [omega(-0.1, 2.0), omega(-0.3, 5.0)];
    for (f0, w) in results.freq_natural.iter().zip(expected) {
        assert!((f0 * 2.0 * std::f64::consts::PI - w).abs() < 1e-8);
    }
}

#[test]
fn sorted_mechanical_modes_have_ascending_natural_frequencies() {
    let mut rng = StdRng::seed_from_u64(19);
    let n = 5;
    let m = spd_matrix(&mut rng, n);
    let k = spd_matrix(&mut rng, n) * 50.0;
    // Light Rayleigh damping keeps every mode underdamped.
    let c = &m * 0.01 + &k * 0.001;

    let results = eig_mck(&m, &c, &k, &MckOptions::default()).unwrap();
    assert_eq!(results.len(), n);
    for j in 1..n {
        assert!(results.freq_damped[j - 1] <= results.freq_damped[j]);
        assert!(results.freq_natural[j - 1] <= results.freq_natural[j] + 1e-12);
    }
}

#[test]
fn state_space_and_mechanical_routes_agree() {
    let mut rng = StdRng::seed_from_u64(23);
    let n = 4;
    let m = spd_matrix(&mut rng, n);
    let k = spd_matrix(&mut rng, n) * 20.0;
    let c = &m * 0.02 + &k * 0.002;

    let mechanical = eig_mck(&m, &c, &k, &MckOptions::default()).unwrap();
    let a = state_matrix_from_mck(&m, &c, &k).unwrap();
    let state = eig_a(&a, &StateAnalysisOptions::default()).unwrap();

    assert_eq!(mechanical.len(), n);
    assert_eq!(state.len(), n);
    assert_eq!(state.mode_shapes.nrows(), n);
    for j in 0..n {
        let rel = |x: f64, y: f64| (x - y).abs() / y.abs().max(1.0);
        assert!(rel(mechanical.freq_natural[j], state.freq_natural[j]) < 1e-8);
        assert!(rel(mechanical.freq_damped[j], state.freq_damped[j]) < 1e-8);
        assert!((mechanical.damping_ratio[j] - state.damping_ratio[j]).abs() < 1e-8);
    }
}
