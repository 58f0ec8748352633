//! Orthogonal non-negative matrix factorization.
//!
//! Factors a non-negative matrix X (m×n) into W (m×rank) and H (rank×n) with
//! X ≈ W * H, using multiplicative updates with an `alpha`-weighted penalty
//! that pushes the rows of H toward orthogonality. W gives row cluster
//! weights, H the per-cluster column patterns.
//!
//! ```no_run
//! use ionmf::OnmfFactorizer;
//! use ndarray::array;
//!
//! let x = array![[5.0, 5.0, 0.1], [5.0, 5.0, 0.1], [0.1, 0.1, 5.0]];
//! let result = OnmfFactorizer::new(2).alpha(1.0).max_iter(100).seed(42).fit(&x)?;
//! println!("row clusters: {:?}", result.row_labels());
//! # Ok::<(), ionmf::OnmfError>(())
//! ```

pub mod atom;
pub mod config;
pub mod types;

pub use atom::{run_onmf, OnmfFactorizer};
pub use config::{OnmfConfig, Sanitize};
pub use types::{Factor, FactorInit, IterationSnapshot, OnmfError, OnmfResult};
