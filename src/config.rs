use serde::{Deserialize, Serialize};

use crate::types::OnmfError;

/// What to do with NaN/Inf entries produced by a multiplicative update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sanitize {
    /// Replace non-finite entries with 0.0
    #[default]
    ZeroFill,
    /// Replace with 0.0 and log a warning with the number of masked entries
    Warn,
    /// Leave the entries alone and abort the run with `OnmfError::Degenerate`
    Strict,
}

/// Hyperparameters for one ONMF run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnmfConfig {
    /// Number of latent components (columns of W, rows of H)
    pub rank: usize,
    /// Weight of the H row-orthogonality penalty
    pub alpha: f64,
    /// Number of update rounds; always run to completion
    pub max_iter: usize,
    /// Cadence of the per-iteration debug log record
    pub callback_mod: usize,
    /// Seed for random initialization; `None` draws from entropy
    pub seed: Option<u64>,
    pub sanitize: Sanitize,
}

impl Default for OnmfConfig {
    fn default() -> Self {
        Self {
            rank: 2,
            alpha: 1.0,
            max_iter: 100,
            callback_mod: 1,
            seed: None,
            sanitize: Sanitize::ZeroFill,
        }
    }
}

impl OnmfConfig {
    pub fn new(rank: usize) -> Self {
        Self {
            rank,
            ..Default::default()
        }
    }

    /// Reject hyperparameters the update rules cannot work with
    pub fn validate(&self) -> Result<(), OnmfError> {
        if self.rank == 0 {
            return Err(OnmfError::InvalidRank(self.rank));
        }
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(OnmfError::InvalidParameter(format!(
                "alpha must be finite and non-negative, got {}",
                self.alpha
            )));
        }
        if self.max_iter == 0 {
            return Err(OnmfError::InvalidParameter(
                "max_iter must be positive".to_string(),
            ));
        }
        if self.callback_mod == 0 {
            return Err(OnmfError::InvalidParameter(
                "callback_mod must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
