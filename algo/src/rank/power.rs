/*
 * SPDX-FileCopyrightText: 2026 The linkrank authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Power iteration on the transpose of a Google matrix.
//!
//! Given a [`GoogleMatrix`] *Gᵀ* and an initial probability vector
//! **x**⁽⁰⁾ (by default, uniform), each iteration computes
//!
//! > *xⱼ*⁽*ᵗ* ⁺ ¹⁾ = ∑ *gᵢⱼ* *xᵢ*⁽*ᵗ*⁾ + *u*⁽*ᵗ*⁾,
//!
//! where the sum ranges over the entries (*i*, *gᵢⱼ*) of row *j* of *Gᵀ*, and
//! then divides **x**⁽*ᵗ* ⁺ ¹⁾ by its ℓ₁ norm. The uniform term *u*⁽*ᵗ*⁾ is zero
//! in [reference mode](Mode::Reference), in which dangling nodes and
//! teleportation are stored in the matrix; in
//! [canonical mode](Mode::Canonical) it is
//!
//! > *u*⁽*ᵗ*⁾ = ( α ∑_(*i* dangling) *xᵢ*⁽*ᵗ*⁾ + (1 − α) ∑ *xᵢ*⁽*ᵗ*⁾ ) / *n*.
//!
//! The renormalization is necessary in reference mode, as the columns of
//! non-dangling nodes of the stored matrix are not stochastic.
//!
//! # Parallelism
//!
//! Each iteration writes a new vector, reading only the previous one, so
//! nodes can be processed independently: they are split into chunks of
//! [granularity](PowerIteration::granularity) nodes, and each chunk is handed
//! to a Rayon task. The entries of a row are always summed sequentially, in
//! increasing source order; the global sums (ℓ₁ norm, dangling rank, norm
//! delta) are instead combined from per-task partial sums in an order that
//! depends on the number of threads, so results may differ in the last bits
//! across runs with different thread pools.
//!
//! # Stopping criteria
//!
//! The [`run`](PowerIteration::run) method accepts a composable
//! [`Predicate`] that is evaluated _before_ each iteration; the computation
//! stops as soon as it evaluates to true. In particular,
//! [`MaxIter::from(k)`](preds::MaxIter) performs exactly *k* iterations
//! (possibly zero). The predicate receives the number of iterations
//! performed so far and the ℓ₁ distance between the last two approximations
//! (infinity before the first iteration).

pub mod preds {
    //! Stopping criteria for the [power iteration](super::PowerIteration).
    //!
    //! A criterion is a [`Predicate`] on [`PredParams`]; the iteration stops
    //! as soon as it becomes true. Since it is checked before each step, a
    //! criterion that is true at the start leaves the initial vector
    //! untouched. Criteria combine with the `and`/`or` methods of
    //! [`PredicateBooleanExt`](predicates::prelude::PredicateBooleanExt):
    //!
    //! ```
    //! use linkrank_algo::rank::preds::{L1Norm, MaxIter};
    //! use predicates::prelude::*;
    //!
    //! // At most 50 steps, fewer if successive vectors are within 1E-10
    //! let stop = MaxIter::from(50).or(L1Norm::try_from(1E-10)?);
    //! # Ok::<(), linkrank_algo::rank::RankError>(())
    //! ```

    use super::RankError;
    use predicates::{Predicate, reflection::PredicateReflection};
    use std::fmt::{Display, Formatter};

    /// The state of the iteration seen by stopping criteria.
    #[derive(Debug, Clone, Copy)]
    pub struct PredParams {
        /// Steps performed so far.
        pub iteration: usize,
        /// ℓ₁ distance between the last two renormalized vectors, or infinity
        /// before the first step.
        pub norm_delta: f64,
    }

    /// True once a given number of steps has been performed.
    #[derive(Debug, Clone, Copy)]
    pub struct MaxIter(usize);

    impl MaxIter {
        pub const DEFAULT_MAX_ITER: usize = 20;
    }

    impl From<usize> for MaxIter {
        fn from(steps: usize) -> Self {
            Self(steps)
        }
    }

    impl Default for MaxIter {
        fn default() -> Self {
            Self(Self::DEFAULT_MAX_ITER)
        }
    }

    impl Display for MaxIter {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "after {} iteration(s)", self.0)
        }
    }

    impl PredicateReflection for MaxIter {}

    impl Predicate<PredParams> for MaxIter {
        fn eval(&self, params: &PredParams) -> bool {
            params.iteration >= self.0
        }
    }

    /// True once the ℓ₁ distance between the last two vectors is at most a
    /// positive threshold.
    ///
    /// Both vectors sum to one, so the distance is at most two; in canonical
    /// mode it shrinks at least by a factor α at each step.
    #[derive(Debug, Clone, Copy)]
    pub struct L1Norm(f64);

    impl L1Norm {
        pub const DEFAULT_THRESHOLD: f64 = 1E-6;

        pub fn threshold(&self) -> f64 {
            self.0
        }
    }

    impl TryFrom<f64> for L1Norm {
        type Error = RankError;

        /// Fails with [`RankError::InvalidThreshold`] unless `threshold` is
        /// positive (in particular, NaN is rejected).
        fn try_from(threshold: f64) -> Result<Self, RankError> {
            if threshold > 0.0 {
                Ok(Self(threshold))
            } else {
                Err(RankError::InvalidThreshold(threshold))
            }
        }
    }

    impl Default for L1Norm {
        fn default() -> Self {
            Self(Self::DEFAULT_THRESHOLD)
        }
    }

    impl Display for L1Norm {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "when the l1 delta is at most {}", self.0)
        }
    }

    impl PredicateReflection for L1Norm {}

    impl Predicate<PredParams> for L1Norm {
        fn eval(&self, params: &PredParams) -> bool {
            params.norm_delta <= self.0
        }
    }
}

use super::google::{GoogleMatrix, Mode};
use dsi_progress_logger::{ConcurrentProgressLog, ProgressLog, no_logging};
use linkrank::utils::{Granularity, vector};
use predicates::Predicate;
use rayon::prelude::*;
use thiserror::Error;

/// Errors that can occur during the power iteration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankError {
    /// The initial vector does not have one entry per node.
    #[error("The initial vector has length {len}, but the matrix has {num_nodes} nodes")]
    InitialLength { len: usize, num_nodes: usize },
    /// The initial vector has a negative or non-finite entry.
    #[error("The initial vector has an invalid entry at index {index}: {value}")]
    InvalidInitial { index: usize, value: f64 },
    /// The rank vector cannot be normalized; iteration zero refers to the
    /// initial vector.
    #[error("Iteration {iteration} produced a vector that cannot be normalized (sum = {sum})")]
    ZeroMass { iteration: usize, sum: f64 },
    /// The threshold of an [`L1Norm`](preds::L1Norm) criterion is not
    /// positive.
    #[error("The l1 threshold must be positive, got {0}")]
    InvalidThreshold(f64),
}

/// Computes PageRank by power iteration.
///
/// The struct is configured via setters and then executed via
/// [`run`](Self::run). After completion the rank vector is available via the
/// [`rank`](Self::rank) method.
///
/// # Examples
///
/// ```
/// use linkrank_algo::rank::{GoogleMatrixBuilder, Mode, PowerIteration, preds};
/// use predicates::prelude::*;
///
/// // 0 → 1, 0 → 2, 1 → 2, 2 → 0, 3 → 0; node 4 is dangling
/// let arcs = vec![(0, 1), (0, 2), (1, 2), (2, 0), (3, 0)];
/// let g = GoogleMatrixBuilder::new(5).mode(Mode::Canonical).build(arcs)?;
///
/// let mut pi = PowerIteration::new(&g);
/// pi.run(preds::MaxIter::from(1000).or(preds::L1Norm::try_from(1E-12)?))?;
///
/// assert!(pi.iterations() < 1000);
/// assert!((pi.rank().iter().sum::<f64>() - 1.0).abs() < 1E-9);
/// assert!(pi.rank()[0] > pi.rank()[3]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PowerIteration<'a> {
    matrix: &'a GoogleMatrix,
    initial: Option<&'a [f64]>,
    granularity: Granularity,
    norm_delta: f64,

    rank: Box<[f64]>,
    iteration: usize,
}

impl std::fmt::Debug for PowerIteration<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerIteration")
            .field("granularity", &self.granularity)
            .field("norm_delta", &self.norm_delta)
            .field("iteration", &self.iteration)
            .finish_non_exhaustive()
    }
}

impl<'a> PowerIteration<'a> {
    /// Creates a new power iteration on the given matrix.
    pub fn new(matrix: &'a GoogleMatrix) -> Self {
        let n = matrix.num_nodes();
        Self {
            matrix,
            initial: None,
            granularity: Granularity::default(),
            norm_delta: f64::INFINITY,
            rank: vec![0.0; n].into_boxed_slice(),
            iteration: 0,
        }
    }

    /// Sets the initial vector.
    ///
    /// [`run`](Self::run) checks that it has one finite, nonnegative entry
    /// per node and divides a copy by its sum, so any vector with positive
    /// mass is accepted. Pass `None` to revert to the uniform vector (1/*n*).
    pub fn initial(&mut self, initial: Option<&'a [f64]>) -> &mut Self {
        self.initial = initial;
        self
    }

    /// Sets the parallel task granularity.
    pub fn granularity(&mut self, granularity: Granularity) -> &mut Self {
        self.granularity = granularity;
        self
    }

    /// Returns the rank vector.
    pub fn rank(&self) -> &[f64] {
        &self.rank
    }

    /// Consumes the computation, returning the rank vector.
    pub fn into_rank(self) -> Box<[f64]> {
        self.rank
    }

    /// Returns the number of iterations performed by the last call to
    /// [`run`](Self::run).
    pub fn iterations(&self) -> usize {
        self.iteration
    }

    /// Returns the ℓ₁ distance between the last two approximations, or
    /// infinity if no iteration was performed.
    pub fn norm_delta(&self) -> f64 {
        self.norm_delta
    }

    /// Runs the power iteration until the given predicate is satisfied.
    pub fn run(&mut self, predicate: impl Predicate<preds::PredParams>) -> Result<(), RankError> {
        self.run_with_logging(predicate, no_logging![], no_logging![])
    }

    /// Runs the power iteration until the given predicate is satisfied,
    /// logging progress.
    ///
    /// `pl` is a sequential [`ProgressLog`] counting iterations; `cpl` is a
    /// [`ConcurrentProgressLog`] used for node-level progress inside each
    /// iteration. Either can be [`no_logging![]`](dsi_progress_logger::no_logging).
    pub fn run_with_logging(
        &mut self,
        predicate: impl Predicate<preds::PredParams>,
        pl: &mut impl ProgressLog,
        cpl: &mut impl ConcurrentProgressLog,
    ) -> Result<(), RankError> {
        let matrix = self.matrix;
        let n = matrix.num_nodes();

        self.iteration = 0;
        self.norm_delta = f64::INFINITY;

        match self.initial {
            Some(v) => {
                if v.len() != n {
                    return Err(RankError::InitialLength {
                        len: v.len(),
                        num_nodes: n,
                    });
                }
                if let Some((index, &value)) = v
                    .iter()
                    .enumerate()
                    .find(|&(_, &x)| !(x.is_finite() && x >= 0.0))
                {
                    return Err(RankError::InvalidInitial { index, value });
                }
                self.rank.copy_from_slice(v);
                if vector::normalize_l1(&mut self.rank).is_none() {
                    return Err(RankError::ZeroMass {
                        iteration: 0,
                        sum: vector::sum(&self.rank),
                    });
                }
            }
            None => self.rank.fill(1.0 / n as f64),
        }

        log::info!("Mode: {}", matrix.mode());
        log::info!(
            "Initial vector: {}",
            if self.initial.is_some() {
                "custom"
            } else {
                "uniform"
            }
        );
        log::info!("Stopping criterion: {}", predicate);

        let node_granularity = self
            .granularity
            .node_granularity(n, Some(matrix.num_entries() as u64));
        let alpha = matrix.alpha();
        let inv_n = 1.0 / n as f64;
        let mut next = vec![0.0; n].into_boxed_slice();

        pl.item_name("iteration");
        pl.expected_updates(None);
        pl.start(format!(
            "Computing PageRank (alpha={alpha}, granularity={node_granularity})..."
        ));

        while !predicate.eval(&preds::PredParams {
            iteration: self.iteration,
            norm_delta: self.norm_delta,
        }) {
            let uniform = match matrix.mode() {
                Mode::Reference => 0.0,
                Mode::Canonical => {
                    let dangling_rank = vector::sum_at(&self.rank, matrix.dangling());
                    let total_rank = vector::sum(&self.rank);
                    (alpha * dangling_rank + (1.0 - alpha) * total_rank) * inv_n
                }
            };

            cpl.item_name("node");
            cpl.expected_updates(Some(n));
            cpl.start(format!("Iteration {}...", self.iteration + 1));

            let rank = &self.rank;
            next.par_chunks_mut(node_granularity)
                .enumerate()
                .for_each_with(cpl.clone(), |cpl, (chunk, values)| {
                    let start = chunk * node_granularity;
                    for (j, x) in (start..).zip(values.iter_mut()) {
                        *x = uniform
                            + matrix
                                .row(j)
                                .iter()
                                .map(|&(i, g)| rank[i] * g)
                                .sum::<f64>();
                    }
                    cpl.update_with_count(values.len());
                });

            cpl.done();

            // The previous approximation is now in next
            std::mem::swap(&mut self.rank, &mut next);
            self.iteration += 1;

            if vector::normalize_l1(&mut self.rank).is_none() {
                return Err(RankError::ZeroMass {
                    iteration: self.iteration,
                    sum: vector::sum(&self.rank),
                });
            }

            self.norm_delta = vector::l1_distance(&self.rank, &next);

            log::debug!(
                "Iteration {}: norm delta = {}",
                self.iteration,
                self.norm_delta
            );

            pl.update_and_display();
        }

        pl.done();

        log::info!(
            "Completed after {} iteration(s), norm delta = {}",
            self.iteration,
            self.norm_delta
        );

        Ok(())
    }
}
