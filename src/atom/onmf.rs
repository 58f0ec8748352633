use log::{debug, info, log_enabled, warn, Level};
use ndarray::Array2;
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use crate::config::{OnmfConfig, Sanitize};
use crate::types::{Factor, FactorInit, IterationSnapshot, OnmfError, OnmfResult};

use super::update_rules::{multiplicative_update, sanitize};

/// Progress observer invoked once per completed round
pub type IterationCallback<'c> = dyn FnMut(&IterationSnapshot) + 'c;

/// Update rules for a two-factor model X ≈ W * H.
///
/// Implementations only compute the raw multiplicative step; sanitization of
/// the result is applied by the run loop.
pub trait FactorUpdater: Send + Sync {
    fn update_w(&self, x: &Array2<f64>, w: &mut Array2<f64>, h: &Array2<f64>);
    fn update_h(&self, x: &Array2<f64>, w: &Array2<f64>, h: &mut Array2<f64>);
}

/// Orthogonal NMF: least squares with an `alpha`-weighted penalty on H*H^T
/// straying from the identity
#[derive(Debug, Clone, Copy)]
pub struct OnmfUpdater {
    pub alpha: f64,
}

impl OnmfUpdater {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }
}

impl FactorUpdater for OnmfUpdater {
    fn update_w(&self, x: &Array2<f64>, w: &mut Array2<f64>, h: &Array2<f64>) {
        // W ← W * (X*H^T) / (W*(H*H^T))
        let hht = h.dot(&h.t()); // k×k
        let numer = x.dot(&h.t()); // m×k
        let denom = w.dot(&hht); // m×k
        multiplicative_update(w, &numer, &denom);
    }

    fn update_h(&self, x: &Array2<f64>, w: &Array2<f64>, h: &mut Array2<f64>) {
        // H ← H * (W^T*X + α*H) / (W^T*W*H + 2α*H*H^T*H)
        let hhth = h.dot(&h.t()).dot(&*h); // k×n
        let mut numer = w.t().dot(x); // k×n
        numer.scaled_add(self.alpha, &*h);
        let mut denom = w.t().dot(w).dot(&*h); // k×n
        denom.scaled_add(2.0 * self.alpha, &hhth);
        multiplicative_update(h, &numer, &denom);
    }
}

/// Run ONMF on `x` for exactly `config.max_iter` rounds.
///
/// A factor passed as `FactorInit::Provided` is held fixed and returned
/// unchanged; the other is solved for against it. Within a round W is
/// updated first and H's update sees the new W. The callback, if any, fires
/// after every round regardless of `callback_mod`, which only sets the
/// cadence of the debug log record.
pub fn run_onmf(
    config: &OnmfConfig,
    x: &Array2<f64>,
    w_init: FactorInit,
    h_init: FactorInit,
    callback: Option<&mut IterationCallback<'_>>,
) -> Result<OnmfResult, OnmfError> {
    let updater = OnmfUpdater::new(config.alpha);
    run_factorization(config, &updater, x, w_init, h_init, callback)
}

/// Fixed-count alternating loop shared by any `FactorUpdater`
pub fn run_factorization(
    config: &OnmfConfig,
    updater: &dyn FactorUpdater,
    x: &Array2<f64>,
    w_init: FactorInit,
    h_init: FactorInit,
    mut callback: Option<&mut IterationCallback<'_>>,
) -> Result<OnmfResult, OnmfError> {
    config.validate()?;
    let (m, n) = x.dim();
    let k = config.rank;
    if m == 0 || n == 0 {
        return Err(OnmfError::EmptyInput { rows: m, cols: n });
    }
    check_shape(Factor::W, &w_init, (m, k))?;
    check_shape(Factor::H, &h_init, (k, n))?;

    let w_free = !w_init.is_provided();
    let h_free = !h_init.is_provided();

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut w = match w_init {
        FactorInit::Provided(w) => w,
        FactorInit::Generate => Array2::random_using((m, k), Uniform::new(0.0, 1.0), &mut rng),
    };
    let mut h = match h_init {
        FactorInit::Provided(h) => h,
        FactorInit::Generate => Array2::random_using((k, n), Uniform::new(0.0, 1.0), &mut rng),
    };

    info!(
        "ONMF start: X {}x{}, rank {}, alpha {}, max_iter {}, fixed W: {}, fixed H: {}",
        m, n, k, config.alpha, config.max_iter, !w_free, !h_free
    );

    for iteration in 0..config.max_iter {
        if w_free {
            updater.update_w(x, &mut w, &h);
            apply_sanitize(&mut w, Factor::W, iteration, config.sanitize)?;
        }

        if h_free {
            updater.update_h(x, &w, &mut h);
            apply_sanitize(&mut h, Factor::H, iteration, config.sanitize)?;
        }

        if iteration % config.callback_mod == 0 && log_enabled!(Level::Debug) {
            debug!(
                "iteration {}/{}: ||W||_F = {:.6e}, ||H||_F = {:.6e}",
                iteration + 1,
                config.max_iter,
                frobenius_norm(&w),
                frobenius_norm(&h)
            );
        }

        if let Some(cb) = callback.as_deref_mut() {
            cb(&IterationSnapshot {
                iteration,
                w: &w,
                h: &h,
            });
        }
    }

    info!("ONMF done after {} iterations", config.max_iter);

    Ok(OnmfResult { w, h })
}

fn check_shape(
    factor: Factor,
    init: &FactorInit,
    expected: (usize, usize),
) -> Result<(), OnmfError> {
    if let FactorInit::Provided(matrix) = init {
        if matrix.dim() != expected {
            return Err(OnmfError::ShapeMismatch {
                factor,
                expected,
                found: matrix.dim(),
            });
        }
    }
    Ok(())
}

fn apply_sanitize(
    a: &mut Array2<f64>,
    factor: Factor,
    iteration: usize,
    policy: Sanitize,
) -> Result<(), OnmfError> {
    match sanitize(a, policy) {
        Ok(0) => Ok(()),
        Ok(count) => {
            if policy == Sanitize::Warn {
                warn!(
                    "iteration {}: masked {} non-finite entries of {} to zero",
                    iteration, count, factor
                );
            }
            Ok(())
        }
        Err(count) => Err(OnmfError::Degenerate {
            factor,
            iteration,
            count,
        }),
    }
}

fn frobenius_norm(a: &Array2<f64>) -> f64 {
    a.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Front end holding the configuration for repeated use
#[derive(Debug, Clone, Default)]
pub struct OnmfFactorizer {
    pub config: OnmfConfig,
}

impl OnmfFactorizer {
    pub fn new(rank: usize) -> Self {
        Self {
            config: OnmfConfig::new(rank),
        }
    }

    pub fn with_config(config: OnmfConfig) -> Self {
        Self { config }
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.config.alpha = alpha;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.config.max_iter = max_iter;
        self
    }

    pub fn callback_mod(mut self, callback_mod: usize) -> Self {
        self.config.callback_mod = callback_mod;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn sanitize(mut self, policy: Sanitize) -> Self {
        self.config.sanitize = policy;
        self
    }

    /// Optimize both factors from random initialization
    pub fn fit(&self, x: &Array2<f64>) -> Result<OnmfResult, OnmfError> {
        run_onmf(&self.config, x, FactorInit::Generate, FactorInit::Generate, None)
    }

    pub fn fit_with(
        &self,
        x: &Array2<f64>,
        w_init: FactorInit,
        h_init: FactorInit,
        callback: Option<&mut IterationCallback<'_>>,
    ) -> Result<OnmfResult, OnmfError> {
        run_onmf(&self.config, x, w_init, h_init, callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::test_utils::{check_block_labels, is_non_negative_finite, make_two_block};
    use ndarray::array;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_onmf_two_block() {
        init_logger();
        let x = make_two_block(20, 20);
        let result = OnmfFactorizer::new(2)
            .alpha(1.0)
            .max_iter(200)
            .seed(42)
            .fit(&x)
            .unwrap();
        assert_eq!(result.w.dim(), (20, 2));
        assert_eq!(result.h.dim(), (2, 20));
        assert!(
            check_block_labels(&result.row_labels(), 10),
            "ONMF row labels should separate the two blocks: {:?}",
            result.row_labels()
        );
        assert!(
            check_block_labels(&result.col_labels(), 10),
            "ONMF col labels should separate the two blocks: {:?}",
            result.col_labels()
        );
    }

    #[test]
    fn test_update_w_matches_formula() {
        let updater = OnmfUpdater::new(0.0);
        let x = array![[2.0, 0.0], [0.0, 2.0]];
        let h = array![[1.0, 0.0], [0.0, 1.0]];
        let mut w = array![[1.0, 1.0], [1.0, 1.0]];
        // X*H^T = X, W*(H*H^T) = W
        updater.update_w(&x, &mut w, &h);
        assert_eq!(w, array![[2.0, 0.0], [0.0, 2.0]]);
    }

    #[test]
    fn test_update_h_matches_formula() {
        let updater = OnmfUpdater::new(1.0);
        let x = array![[3.0]];
        let w = array![[1.0]];
        let mut h = array![[1.0]];
        // (W^T*X + α*H) / (W^T*W*H + 2α*H*H^T*H) = (3 + 1) / (1 + 2)
        updater.update_h(&x, &w, &mut h);
        assert!((h[[0, 0]] - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let x = make_two_block(8, 6);
        let factorizer = OnmfFactorizer::new(3).max_iter(25).seed(7);
        let first = factorizer.fit(&x).unwrap();
        let second = factorizer.fit(&x).unwrap();
        assert_eq!(first.w, second.w);
        assert_eq!(first.h, second.h);
    }

    #[test]
    fn test_strict_reports_collapse() {
        // Zero data: W collapses on the first update, then H hits 0/0
        let x = Array2::<f64>::zeros((3, 4));
        let err = OnmfFactorizer::new(2)
            .alpha(0.0)
            .max_iter(5)
            .seed(1)
            .sanitize(Sanitize::Strict)
            .fit(&x)
            .unwrap_err();
        assert_eq!(
            err,
            OnmfError::Degenerate {
                factor: Factor::H,
                iteration: 0,
                count: 8,
            }
        );
    }

    #[test]
    fn test_warn_masks_like_zero_fill() {
        init_logger();
        let x = Array2::<f64>::zeros((3, 4));
        let result = OnmfFactorizer::new(2)
            .alpha(0.0)
            .max_iter(5)
            .seed(1)
            .sanitize(Sanitize::Warn)
            .fit(&x)
            .unwrap();
        assert!(result.w.iter().all(|&v| v == 0.0));
        assert!(result.h.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_callback_sees_clean_factors_every_round() {
        init_logger();
        let x = make_two_block(6, 6);
        let mut rounds = Vec::new();
        let mut all_clean = true;
        let mut observe = |snapshot: &IterationSnapshot| {
            rounds.push(snapshot.iteration);
            all_clean &= is_non_negative_finite(snapshot.w) && is_non_negative_finite(snapshot.h);
        };
        OnmfFactorizer::new(2)
            .max_iter(12)
            .callback_mod(5)
            .seed(3)
            .fit_with(&x, FactorInit::Generate, FactorInit::Generate, Some(&mut observe))
            .unwrap();
        assert_eq!(rounds, (0..12).collect::<Vec<_>>());
        assert!(all_clean);
    }

    #[test]
    fn test_input_validation() {
        let x = Array2::<f64>::ones((4, 3));
        let factorizer = OnmfFactorizer::new(2).seed(0);

        let bad_w = factorizer.fit_with(
            &x,
            FactorInit::Provided(Array2::ones((4, 3))),
            FactorInit::Generate,
            None,
        );
        assert_eq!(
            bad_w.unwrap_err(),
            OnmfError::ShapeMismatch {
                factor: Factor::W,
                expected: (4, 2),
                found: (4, 3),
            }
        );

        let bad_h = factorizer.fit_with(
            &x,
            FactorInit::Generate,
            FactorInit::Provided(Array2::ones((3, 3))),
            None,
        );
        assert!(matches!(
            bad_h,
            Err(OnmfError::ShapeMismatch {
                factor: Factor::H,
                ..
            })
        ));

        let empty = Array2::<f64>::zeros((0, 3));
        assert_eq!(
            factorizer.fit(&empty).unwrap_err(),
            OnmfError::EmptyInput { rows: 0, cols: 3 }
        );

        assert_eq!(
            OnmfFactorizer::new(0).fit(&x).unwrap_err(),
            OnmfError::InvalidRank(0)
        );
    }
}
