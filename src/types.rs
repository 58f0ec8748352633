//! # ONMF Data Structures
//!
//! Inputs, outputs and errors of the factorization: X ≈ W * H with
//! W (m×rank) and H (rank×n).

use ndarray::{Array2, ArrayView1, Axis};
use std::error::Error;
use std::fmt;

/// Where a factor comes from at the start of a run
#[derive(Debug, Clone, Default)]
pub enum FactorInit {
    /// Held fixed for the whole run and returned unchanged
    Provided(Array2<f64>),
    /// Drawn uniformly from [0, 1) and optimized
    #[default]
    Generate,
}

impl FactorInit {
    pub fn is_provided(&self) -> bool {
        matches!(self, FactorInit::Provided(_))
    }
}

impl From<Option<Array2<f64>>> for FactorInit {
    fn from(init: Option<Array2<f64>>) -> Self {
        match init {
            Some(matrix) => FactorInit::Provided(matrix),
            None => FactorInit::Generate,
        }
    }
}

/// Which factor an error or log record refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    W,
    H,
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Factor::W => write!(f, "W"),
            Factor::H => write!(f, "H"),
        }
    }
}

/// State handed to the progress callback after each completed round
#[derive(Debug)]
pub struct IterationSnapshot<'a> {
    /// Zero-based round index
    pub iteration: usize,
    pub w: &'a Array2<f64>,
    pub h: &'a Array2<f64>,
}

/// Result of a factorization
#[derive(Debug, Clone)]
pub struct OnmfResult {
    /// Coefficient matrix, m×rank (row clustering)
    pub w: Array2<f64>,
    /// Basis matrix, rank×n (column clustering / patterns)
    pub h: Array2<f64>,
}

impl OnmfResult {
    pub fn rank(&self) -> usize {
        self.w.ncols()
    }

    /// Dominant component of each row of X (argmax over the rows of W)
    pub fn row_labels(&self) -> Vec<usize> {
        self.w.axis_iter(Axis(0)).map(argmax).collect()
    }

    /// Dominant component of each column of X (argmax over the columns of H)
    pub fn col_labels(&self) -> Vec<usize> {
        self.h.axis_iter(Axis(1)).map(argmax).collect()
    }

    pub fn into_parts(self) -> (Array2<f64>, Array2<f64>) {
        (self.w, self.h)
    }
}

/// First index of the largest entry; 0 for an empty or all-zero lane
fn argmax(lane: ArrayView1<f64>) -> usize {
    let mut best_idx = 0;
    let mut best_val = f64::NEG_INFINITY;
    for (idx, &v) in lane.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during factorization
#[derive(Debug, Clone, PartialEq)]
pub enum OnmfError {
    /// Rank must be at least 1
    InvalidRank(usize),
    /// Data matrix has a zero dimension
    EmptyInput { rows: usize, cols: usize },
    /// A supplied factor disagrees with X and rank
    ShapeMismatch {
        factor: Factor,
        expected: (usize, usize),
        found: (usize, usize),
    },
    InvalidParameter(String),
    /// Non-finite entries under `Sanitize::Strict`
    Degenerate {
        factor: Factor,
        iteration: usize,
        count: usize,
    },
}

impl fmt::Display for OnmfError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OnmfError::InvalidRank(rank) => write!(f, "Invalid rank: {} (must be positive)", rank),
            OnmfError::EmptyInput { rows, cols } => {
                write!(f, "Empty data matrix: {}x{}", rows, cols)
            }
            OnmfError::ShapeMismatch {
                factor,
                expected,
                found,
            } => write!(
                f,
                "Shape mismatch for {}: expected {}x{}, found {}x{}",
                factor, expected.0, expected.1, found.0, found.1
            ),
            OnmfError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            OnmfError::Degenerate {
                factor,
                iteration,
                count,
            } => write!(
                f,
                "Degenerate update of {} at iteration {}: {} non-finite entries",
                factor, iteration, count
            ),
        }
    }
}

impl Error for OnmfError {}
