pub mod onmf;
pub mod update_rules;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for convenience
pub use onmf::{run_factorization, run_onmf, FactorUpdater, IterationCallback, OnmfFactorizer, OnmfUpdater};
pub use update_rules::{count_non_finite, multiplicative_update, nan_to_num, sanitize};
