/*
 * SPDX-FileCopyrightText: 2026 The linkrank authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Sparse representation of the transpose of the Google matrix.
//!
//! If *H* is the row-normalized adjacency matrix of a graph with *n* nodes
//! (*hᵢⱼ* = 1/*dᵢ* if *i* → *j*, where *dᵢ* is the outdegree of *i*), **d** is
//! the characteristic vector of dangling nodes, and α is the damping factor,
//! the _Google matrix_ is
//!
//! > *G* = α (*H* + **d**ᵀ **1** / *n*) + (1 − α) **1**ᵀ **1** / *n*.
//!
//! A step of the power method computes **x** *G*, that is, for each node *j*,
//! a sum over the *j*-th _column_ of *G*. Thus, [`GoogleMatrix`] stores the
//! _transpose_ of *G*: row *j* contains pairs (*i*, *gᵢⱼ*), sorted by *i*.
//!
//! # Modes
//!
//! In [`Reference`](Mode::Reference) mode (the default) the matrix is built
//! in four passes:
//!
//! 1. arcs are drained, counting outdegrees and recording, for each target,
//!    which sources point at it (multiple arcs give a single entry, but are
//!    all counted in the outdegree);
//! 2. each recorded entry (*i*, *j*) is set to 1/*dᵢ*;
//! 3. for each dangling node *i*, an entry (*i*, *j*) with value 1/*n* is
//!    added to _every_ row *j*;
//! 4. each present entry *v* becomes α *v* + (1 − α) / *n*.
//!
//! Note that in the last pass the teleportation term is added only to
//! existing entries: the columns of non-dangling nodes of the resulting
//! matrix do not sum to one (the power iteration renormalizes the rank vector
//! at each step), and the dense rows of dangling nodes cost Θ(*n*) entries
//! each.
//!
//! In [`Canonical`](Mode::Canonical) mode only the entries α / *dᵢ* of the
//! links are stored; the rank of dangling nodes and the teleportation term
//! are instead redistributed uniformly by the
//! [power iteration](super::PowerIteration), which yields exactly the Google
//! matrix above using space linear in the number of arcs.

use dsi_progress_logger::{ProgressLog, no_logging};
use linkrank::utils::{CsrMatrix, Granularity};
use rayon::prelude::*;
use thiserror::Error;

/// Selects how the Google matrix is represented.
///
/// See the [module-level documentation](self) for the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Dense dangling rows and teleportation on existing entries only. This
    /// is the default.
    #[default]
    Reference,
    /// Links only; dangling rank and teleportation are redistributed during
    /// the iteration.
    Canonical,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Reference => f.write_str("reference"),
            Mode::Canonical => f.write_str("canonical"),
        }
    }
}

/// Errors that can occur while building a [`GoogleMatrix`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The graph has no nodes.
    #[error("The graph must have at least one node")]
    NoNodes,
    /// The damping factor is outside the open interval (0 . . 1).
    #[error("The damping factor must be in (0 . . 1), got {0}")]
    InvalidAlpha(f64),
    /// An arc has an endpoint that is not a node.
    #[error("Arc {src} -> {dest} has an endpoint outside of [0 . . {num_nodes})")]
    NodeOutOfRange {
        src: usize,
        dest: usize,
        num_nodes: usize,
    },
}

/// The transpose of a Google matrix, stored by rows.
///
/// Instances are created by a [`GoogleMatrixBuilder`] and are immutable.
#[derive(Debug, Clone)]
pub struct GoogleMatrix {
    rows: CsrMatrix<(usize, f64)>,
    outdegrees: Box<[usize]>,
    dangling: Box<[usize]>,
    alpha: f64,
    mode: Mode,
}

impl GoogleMatrix {
    /// Returns the number of nodes (rows).
    pub fn num_nodes(&self) -> usize {
        self.rows.num_rows()
    }

    /// Returns the number of stored entries.
    pub fn num_entries(&self) -> usize {
        self.rows.num_elements()
    }

    /// Returns the damping factor.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Returns the representation mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the number of arcs leaving `node`, duplicates included.
    pub fn outdegree(&self, node: usize) -> usize {
        self.outdegrees[node]
    }

    /// Returns whether `node` has no outgoing arcs.
    pub fn is_dangling(&self, node: usize) -> bool {
        self.outdegrees[node] == 0
    }

    /// Returns the dangling nodes, in increasing order.
    pub fn dangling(&self) -> &[usize] {
        &self.dangling
    }

    /// Returns the number of dangling nodes.
    pub fn num_dangling(&self) -> usize {
        self.dangling.len()
    }

    /// Returns the row of `dest` as pairs (source, weight), sorted by source.
    #[inline(always)]
    pub fn row(&self, dest: usize) -> &[(usize, f64)] {
        &self.rows[dest]
    }

    /// Returns the weight of the transition from `src` to `dest`, if stored.
    pub fn get(&self, dest: usize, src: usize) -> Option<f64> {
        let row = self.row(dest);
        row.binary_search_by_key(&src, |&(s, _)| s)
            .ok()
            .map(|pos| row[pos].1)
    }

    /// Returns an iterator over the rows.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[(usize, f64)]> + '_ {
        self.rows.iter()
    }
}

/// Builds a [`GoogleMatrix`] from a list of arcs.
///
/// The builder is configured via setters and then executed via
/// [`build`](Self::build), which consumes the arc list.
///
/// # Examples
///
/// ```
/// use linkrank_algo::rank::{GoogleMatrixBuilder, Mode};
///
/// // Node 1 is dangling
/// let g = GoogleMatrixBuilder::new(2).alpha(0.85).build(vec![(0, 1)])?;
/// assert_eq!(g.num_dangling(), 1);
/// assert!((g.get(1, 0).unwrap() - (0.85 + 0.15 / 2.0)).abs() < 1E-15);
/// assert!((g.get(0, 1).unwrap() - 0.5).abs() < 1E-15);
/// assert_eq!(g.get(0, 0), None);
///
/// let c = GoogleMatrixBuilder::new(2)
///     .mode(Mode::Canonical)
///     .build(vec![(0, 1)])?;
/// assert_eq!(c.num_entries(), 1);
/// # Ok::<(), linkrank_algo::rank::BuildError>(())
/// ```
#[derive(Debug, Clone)]
pub struct GoogleMatrixBuilder {
    num_nodes: usize,
    alpha: f64,
    mode: Mode,
    granularity: Granularity,
}

impl GoogleMatrixBuilder {
    /// The default damping factor.
    pub const DEFAULT_ALPHA: f64 = 0.85;

    /// Creates a builder for a graph with `num_nodes` nodes.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            alpha: Self::DEFAULT_ALPHA,
            mode: Mode::default(),
            granularity: Granularity::default(),
        }
    }

    /// Sets the damping factor α.
    ///
    /// The value is checked by [`build`](Self::build), which fails with
    /// [`BuildError::InvalidAlpha`] if it is not in the open interval
    /// (0 . . 1).
    pub fn alpha(&mut self, alpha: f64) -> &mut Self {
        self.alpha = alpha;
        self
    }

    /// Sets the representation [mode](Mode).
    pub fn mode(&mut self, mode: Mode) -> &mut Self {
        self.mode = mode;
        self
    }

    /// Sets the parallel task granularity.
    pub fn granularity(&mut self, granularity: Granularity) -> &mut Self {
        self.granularity = granularity;
        self
    }

    /// Builds the matrix, consuming the arcs.
    pub fn build(
        &self,
        arcs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<GoogleMatrix, BuildError> {
        self.build_with_logging(arcs, no_logging![])
    }

    /// Builds the matrix, consuming the arcs and logging progress.
    pub fn build_with_logging(
        &self,
        arcs: impl IntoIterator<Item = (usize, usize)>,
        pl: &mut impl ProgressLog,
    ) -> Result<GoogleMatrix, BuildError> {
        if self.num_nodes == 0 {
            return Err(BuildError::NoNodes);
        }
        // Note that this rejects NaN, too
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(BuildError::InvalidAlpha(self.alpha));
        }

        log::info!("Mode: {}", self.mode);
        log::info!("Alpha: {}", self.alpha);

        let linked = drain_arcs(self.num_nodes, arcs, pl)?;
        log::info!(
            "{} arcs, {} distinct",
            linked.num_arcs,
            linked.rows.iter().map(Vec::len).sum::<usize>()
        );

        pl.info(format_args!("Normalizing rows..."));
        let stochastic = normalize(linked);
        log::info!("{} dangling nodes", stochastic.dangling.len());

        let stochastic = match self.mode {
            Mode::Reference => {
                pl.info(format_args!("Filling dangling columns..."));
                fill_dangling(stochastic, self.granularity)
            }
            Mode::Canonical => stochastic,
        };

        pl.info(format_args!("Damping..."));
        let matrix = damp(stochastic, self.alpha, self.mode);
        log::info!("{} entries", matrix.num_entries());

        Ok(matrix)
    }
}

/// Rows whose entries only record the presence of a link.
struct Linked {
    rows: Vec<Vec<usize>>,
    outdegrees: Box<[usize]>,
    num_arcs: u64,
}

/// Rows of the transposed, row-normalized adjacency matrix.
struct Stochastic {
    rows: Vec<Vec<(usize, f64)>>,
    outdegrees: Box<[usize]>,
    dangling: Box<[usize]>,
}

fn drain_arcs(
    num_nodes: usize,
    arcs: impl IntoIterator<Item = (usize, usize)>,
    pl: &mut impl ProgressLog,
) -> Result<Linked, BuildError> {
    let mut rows = vec![Vec::new(); num_nodes];
    let mut outdegrees = vec![0_usize; num_nodes].into_boxed_slice();
    let mut num_arcs = 0_u64;

    pl.item_name("arc");
    pl.expected_updates(None);
    pl.start("Draining arcs...");

    for (src, dest) in arcs {
        if src >= num_nodes || dest >= num_nodes {
            return Err(BuildError::NodeOutOfRange {
                src,
                dest,
                num_nodes,
            });
        }
        outdegrees[src] += 1;
        rows[dest].push(src);
        num_arcs += 1;
        pl.light_update();
    }

    pl.done();

    rows.par_iter_mut().for_each(|row| {
        row.sort_unstable();
        row.dedup();
        row.shrink_to_fit();
    });

    Ok(Linked {
        rows,
        outdegrees,
        num_arcs,
    })
}

fn normalize(linked: Linked) -> Stochastic {
    let Linked {
        rows, outdegrees, ..
    } = linked;

    let rows: Vec<Vec<(usize, f64)>> = rows
        .into_par_iter()
        .map(|row| {
            row.into_iter()
                .map(|src| (src, 1.0 / outdegrees[src] as f64))
                .collect::<Vec<_>>()
        })
        .collect();

    let dangling = outdegrees
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d == 0)
        .map(|(node, _)| node)
        .collect();

    Stochastic {
        rows,
        outdegrees,
        dangling,
    }
}

fn fill_dangling(stochastic: Stochastic, granularity: Granularity) -> Stochastic {
    let Stochastic {
        mut rows,
        outdegrees,
        dangling,
    } = stochastic;

    if !dangling.is_empty() {
        let n = rows.len();
        let inv_n = 1.0 / n as f64;
        let num_links = rows.iter().map(Vec::len).sum::<usize>() as u64;
        let node_granularity = granularity.node_granularity(n, Some(num_links));

        rows.par_iter_mut()
            .with_min_len(node_granularity)
            .for_each(|row| {
                let merged = merge(row, &dangling, inv_n);
                *row = merged;
            });
    }

    Stochastic {
        rows,
        outdegrees,
        dangling,
    }
}

/// Merges a row with uniform entries for the dangling nodes. The two sets
/// of sources are disjoint, as dangling nodes have no links.
fn merge(row: &[(usize, f64)], dangling: &[usize], weight: f64) -> Vec<(usize, f64)> {
    let mut merged = Vec::with_capacity(row.len() + dangling.len());
    let (mut i, mut j) = (0, 0);
    while i < row.len() && j < dangling.len() {
        if row[i].0 < dangling[j] {
            merged.push(row[i]);
            i += 1;
        } else {
            merged.push((dangling[j], weight));
            j += 1;
        }
    }
    merged.extend_from_slice(&row[i..]);
    merged.extend(dangling[j..].iter().map(|&src| (src, weight)));
    merged
}

fn damp(stochastic: Stochastic, alpha: f64, mode: Mode) -> GoogleMatrix {
    let Stochastic {
        rows,
        outdegrees,
        dangling,
    } = stochastic;

    let n = rows.len();
    let jump = match mode {
        Mode::Reference => (1.0 - alpha) / n as f64,
        Mode::Canonical => 0.0,
    };

    let num_entries = rows.iter().map(Vec::len).sum();
    let mut csr = CsrMatrix::with_capacity(n, num_entries);
    for row in rows {
        csr.push(row);
    }

    csr.values_mut()
        .par_iter_mut()
        .with_min_len(linkrank::utils::RAYON_MIN_LEN)
        .for_each(|(_, w)| *w = alpha * *w + jump);

    GoogleMatrix {
        rows: csr,
        outdegrees,
        dangling,
        alpha,
        mode,
    }
}
