//! Eigenvalue analysis of linearized structural-dynamics models.
//!
//! Computes modal frequencies, damping ratios and mode shapes from
//! - a first-order state matrix `A` ([`eig_a`]),
//! - mass, damping and stiffness matrices of `M q̈ + C q̇ + K q = 0` ([`eig_mck`]),
//! - a stiffness/mass pair `K x = λ M x` ([`eig`]),
//! - a matrix polynomial `(A₀ + λA₁ + … + λᵖAₚ) x = 0` ([`polyeig`]).
//!
//! All analyses are pure functions over dense `nalgebra` matrices. Diagnostics
//! are emitted as `tracing` events; install a subscriber to see them.
//!
//! ```
//! use linmodal::{eig_mck, MckOptions};
//! use nalgebra::{DMatrix, DVector};
//!
//! let m = DMatrix::from_diagonal(&DVector::from_vec(vec![430_000.0, 42_000_000.0]));
//! let c = DMatrix::from_diagonal(&DVector::from_vec(vec![7_255.0, 42_000.0]));
//! let k = DMatrix::from_diagonal(&DVector::from_vec(vec![2_700_000.0, 200_000_000.0]));
//!
//! let modes = eig_mck(&m, &c, &k, &MckOptions::default()).unwrap();
//! assert_eq!(modes.len(), 2);
//! assert!(modes.freq_damped[0] <= modes.freq_damped[1]);
//! ```

pub mod eigen;
pub mod error;
pub mod matrix;
pub mod mechanical;
pub mod modes;
pub mod polyeig;
pub mod solver;
pub mod state_space;
pub mod types;

pub use eigen::{eigen_general, eigen_generalized, eigen_symmetric_definite, EigenDecomposition};
pub use error::{EvaError, Result};
pub use matrix::zero_small_entries;
pub use mechanical::eig_mck;
pub use modes::{
    damped_from_natural, log_decrement, natural_from_damped, pseudo_log_decrement, ModalResults,
    ModeSummary,
};
pub use polyeig::{companion_pencil, polyeig, PolyEigen, Spectrum};
pub use solver::{eig, GeneralizedEigen, Lambda};
pub use state_space::{eig_a, resolve_partition, state_matrix_from_mck};
pub use types::*;
