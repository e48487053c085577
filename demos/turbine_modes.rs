//! Modal analysis of a two-DOF wind-turbine model and a four-DOF quadratic
//! eigenvalue problem.
//!
//! Run with: RUST_LOG=linmodal=debug cargo run --example turbine_modes

use linmodal::{eig_mck, polyeig, MckMethod, MckOptions};
use nalgebra::{DMatrix, DVector};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Tower fore-aft and drivetrain DOFs
    let m = DMatrix::from_diagonal(&DVector::from_vec(vec![430_000.0, 42_000_000.0]));
    let c = DMatrix::from_diagonal(&DVector::from_vec(vec![7_255.0, 42_000_000.0 * 0.001]));
    let k = DMatrix::from_diagonal(&DVector::from_vec(vec![2_700_000.0, 200_000_000.0]));

    for method in [MckMethod::FullMatrix, MckMethod::DiagonalBeta] {
        let options = MckOptions { method, sort: true };
        let modes = eig_mck(&m, &c, &k, &options)?;

        println!("=== {} ===", method);
        println!("{:>6} {:>12} {:>12} {:>12}", "mode", "f_d [Hz]", "f_0 [Hz]", "zeta [%]");
        for s in modes.summaries() {
            println!(
                "{:>6} {:>12.6} {:>12.6} {:>12.4}",
                s.index,
                s.freq_damped,
                s.freq_natural,
                s.damping_ratio * 100.0
            );
        }
        println!("mode shapes:{:.4}", modes.mode_shapes);
    }

    let m = DMatrix::from_diagonal(&DVector::from_vec(vec![3.0, 1.0, 3.0, 1.0]));
    #[rustfmt::skip]
    let c = DMatrix::from_row_slice(4, 4, &[
         0.4, 0.0, -0.3,  0.0,
         0.0, 0.0,  0.0,  0.0,
        -0.3, 0.0,  0.5, -0.2,
         0.0, 0.0, -0.2,  0.2,
    ]);
    #[rustfmt::skip]
    let k = DMatrix::from_row_slice(4, 4, &[
        -7.0,  2.0,  4.0,  0.0,
         2.0, -4.0,  2.0,  0.0,
         4.0,  2.0, -9.0,  3.0,
         0.0,  0.0,  3.0, -3.0,
    ]);

    let solution = polyeig(&[k, c, m], true)?;
    println!("=== quadratic eigenvalue problem ===");
    for i in 0..solution.eigenvalues.len() {
        if let Some(lambda) = solution.eigenvalues.get(i) {
            println!("lambda[{}] = {:.6}", i, lambda);
        }
    }
    println!("eigenvectors:{:.4}", solution.eigenvectors);

    Ok(())
}
