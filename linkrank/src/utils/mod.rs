/*
 * SPDX-FileCopyrightText: 2026 The linkrank authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Miscellaneous utilities.

/// Minimum length of the slices handed to a Rayon task by the vector
/// utilities; shorter inputs are processed by a single task.
pub const RAYON_MIN_LEN: usize = 100_000;

mod csr_matrix;
pub use csr_matrix::*;

mod granularity;
pub use granularity::*;

pub mod vector;
