/*
 * SPDX-FileCopyrightText: 2026 The linkrank authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! PageRank on hyperlink graphs.
//!
//! The computation has two phases: a [`GoogleMatrixBuilder`] consumes the
//! arcs of the graph and builds a sparse [`GoogleMatrix`], and a
//! [`PowerIteration`] applies it repeatedly to a probability vector.

pub mod google;
pub mod power;

pub use google::{BuildError, GoogleMatrix, GoogleMatrixBuilder, Mode};
pub use power::{PowerIteration, RankError, preds};
