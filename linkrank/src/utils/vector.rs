/*
 * SPDX-FileCopyrightText: 2026 The linkrank authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! ℓ₁ utilities for probability vectors.
//!
//! All reductions use compensated (Kahan) summation inside each Rayon task,
//! and then combine the partial sums. The association order of the partial
//! sums depends on how Rayon splits the input, so results may differ in the
//! last bits across thread counts.

use super::RAYON_MIN_LEN;
use kahan::KahanSum;
use rayon::prelude::*;

/// Returns the sum of the entries of `v`.
pub fn sum(v: &[f64]) -> f64 {
    v.par_iter()
        .with_min_len(RAYON_MIN_LEN)
        .fold(KahanSum::<f64>::new, |acc, &x| acc + x)
        .reduce(KahanSum::<f64>::new, |a, b| a + b)
        .sum()
}

/// Returns the sum of the entries of `v` at the given indices.
pub fn sum_at(v: &[f64], indices: &[usize]) -> f64 {
    indices
        .par_iter()
        .with_min_len(RAYON_MIN_LEN)
        .fold(KahanSum::<f64>::new, |acc, &i| acc + v[i])
        .reduce(KahanSum::<f64>::new, |a, b| a + b)
        .sum()
}

/// Returns the ℓ₁ distance between `a` and `b`.
///
/// # Panics
///
/// Panics if the two vectors have different lengths.
pub fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(
        a.len(),
        b.len(),
        "Vectors of different lengths ({} != {})",
        a.len(),
        b.len()
    );
    a.par_iter()
        .zip(b.par_iter())
        .with_min_len(RAYON_MIN_LEN)
        .fold(KahanSum::<f64>::new, |acc, (&x, &y)| acc + (x - y).abs())
        .reduce(KahanSum::<f64>::new, |a, b| a + b)
        .sum()
}

/// Divides the entries of `v` by their sum, so that they sum to one.
///
/// Returns the sum before normalization, or `None`, leaving `v` untouched, if
/// the sum is not a positive finite number.
pub fn normalize_l1(v: &mut [f64]) -> Option<f64> {
    let total = sum(v);
    if !(total.is_finite() && total > 0.0) {
        return None;
    }
    v.par_iter_mut()
        .with_min_len(RAYON_MIN_LEN)
        .for_each(|x| *x /= total);
    Some(total)
}
