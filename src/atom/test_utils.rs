/// Shared test utilities for the factorization tests
use ndarray::Array2;

/// Two-block matrix with clear row/column cluster structure.
/// Rows 0..rows/2 and cols 0..cols/2 form block 0 (value 5.0), the remaining
/// rows and cols form block 1 (value 5.0), off-diagonal entries are 0.1.
pub fn make_two_block(rows: usize, cols: usize) -> Array2<f64> {
    let (row_split, col_split) = (rows / 2, cols / 2);
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        if (i < row_split) == (j < col_split) {
            5.0
        } else {
            0.1
        }
    })
}

/// Labels 0..split share one value, split.. share another, and the two differ
pub fn check_block_labels(labels: &[usize], split: usize) -> bool {
    if split == 0 || split >= labels.len() {
        return false;
    }
    let label_a = labels[0];
    let label_b = labels[split];

    labels[..split].iter().all(|&l| l == label_a)
        && labels[split..].iter().all(|&l| l == label_b)
        && label_a != label_b
}

pub fn is_non_negative_finite(a: &Array2<f64>) -> bool {
    a.iter().all(|&v| v.is_finite() && v >= 0.0)
}
