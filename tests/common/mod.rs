#![allow(dead_code)]

use digit_sweep::Dataset;
use ndarray::Array2;

pub const FEATURES: usize = 16;

/// Ten-class dataset where digit `d` lights up feature `d`, plus a small
/// per-example offset so rows are not identical.
pub fn separable_dataset(per_digit: usize) -> Dataset {
    let total = per_digit * 10;
    let labels: Vec<usize> = (0..total).map(|i| i % 10).collect();
    let images = Array2::from_shape_fn((total, FEATURES), |(i, j)| {
        if j == labels[i] {
            1.0
        } else if j == 10 + (i % 6) {
            0.2
        } else {
            0.0
        }
    });
    Dataset::new(images, labels).unwrap()
}

/// Identical inputs with conflicting labels; no model can fit it.
pub fn conflicting_dataset() -> (Array2<f32>, Vec<usize>) {
    (Array2::from_elem((4, FEATURES), 0.5), vec![0, 1, 0, 1])
}
