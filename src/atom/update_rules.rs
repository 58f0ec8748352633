use ndarray::Array2;

use crate::config::Sanitize;

/// Elementwise multiplicative update in place: base = base * numer / denom
///
/// No epsilon is added to the denominator; a zero denominator yields NaN or
/// Inf, which the sanitization step deals with afterwards.
pub fn multiplicative_update(base: &mut Array2<f64>, numer: &Array2<f64>, denom: &Array2<f64>) {
    ndarray::Zip::from(base)
        .and(numer)
        .and(denom)
        .for_each(|r, &n, &d| {
            *r = *r * n / d;
        });
}

/// Replace NaN and Inf with 0.0 in-place, returning how many were replaced
pub fn nan_to_num(a: &mut Array2<f64>) -> usize {
    let mut replaced = 0;
    a.mapv_inplace(|v| {
        if v.is_finite() {
            v
        } else {
            replaced += 1;
            0.0
        }
    });
    replaced
}

pub fn count_non_finite(a: &Array2<f64>) -> usize {
    a.iter().filter(|v| !v.is_finite()).count()
}

/// Named sanitization step run after every update.
///
/// `Ok(n)` is the number of entries zeroed (always 0 when nothing was
/// non-finite). Under `Sanitize::Strict` the matrix is left untouched and
/// `Err(n)` carries the number of offending entries.
pub fn sanitize(a: &mut Array2<f64>, policy: Sanitize) -> Result<usize, usize> {
    match policy {
        Sanitize::ZeroFill | Sanitize::Warn => Ok(nan_to_num(a)),
        Sanitize::Strict => match count_non_finite(a) {
            0 => Ok(0),
            n => Err(n),
        },
    }
}
