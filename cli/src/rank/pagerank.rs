/*
 * SPDX-FileCopyrightText: 2026 The linkrank authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::summary::Summary;
use crate::{ArcsArgs, FloatVectorFormat, GlobalArgs, ParallelArgs};
use anyhow::{Context, Result, ensure};
use clap::Parser;
use dsi_progress_logger::{ProgressLog, concurrent_progress_logger, progress_logger};
use linkrank::arcs;
use linkrank_algo::rank::preds::{L1Norm, MaxIter};
use linkrank_algo::rank::{GoogleMatrixBuilder, Mode, PowerIteration};
use predicates::prelude::*;
use std::path::PathBuf;

/// The representation of the Google matrix.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CliMode {
    /// Store dangling columns densely and damp only stored entries.
    #[default]
    Reference,
    /// Store only links and account for dangling nodes and teleportation
    /// with a uniform term (the textbook Google matrix).
    Canonical,
}

impl From<CliMode> for Mode {
    fn from(m: CliMode) -> Self {
        match m {
            CliMode::Reference => Mode::Reference,
            CliMode::Canonical => Mode::Canonical,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "pagerank",
    about = "Computes PageRank using the power method.",
    long_about = None
)]
pub struct CliArgs {
    /// The arc file, containing one arc per line.
    pub arcs: PathBuf,

    #[arg(short, long, required_unless_present = "num_nodes")]
    /// The vertex file, containing one label per line; the number of lines
    /// is the number of nodes.
    pub vertices: Option<PathBuf>,

    #[arg(short, long, conflicts_with = "vertices")]
    /// The number of nodes, in alternative to a vertex file.
    pub num_nodes: Option<usize>,

    #[arg(short, long)]
    /// Where to store the rank vector.
    pub output: PathBuf,

    #[arg(short, long, default_value_t = GoogleMatrixBuilder::DEFAULT_ALPHA)]
    /// The damping factor α (must be in the interval (0 . . 1)).
    pub alpha: f64,

    #[arg(short = 'k', long, default_value_t = MaxIter::DEFAULT_MAX_ITER)]
    /// The maximum number of iterations.
    pub iterations: usize,

    #[arg(short, long)]
    /// Stop earlier if the ℓ₁ distance between successive approximations
    /// falls below this threshold.
    pub threshold: Option<f64>,

    #[arg(short, long, value_enum, default_value_t = CliMode::Reference)]
    /// The representation of the Google matrix.
    pub mode: CliMode,

    #[arg(long)]
    /// Path to an initial vector (by default, the uniform vector).
    pub initial: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FloatVectorFormat::Ascii)]
    /// The input format for the initial vector.
    pub initial_fmt: FloatVectorFormat,

    #[arg(long, value_enum, default_value_t = FloatVectorFormat::Ascii)]
    /// The output format for the rank vector.
    pub fmt: FloatVectorFormat,

    #[arg(long)]
    /// Decimal digits for text output formats.
    pub precision: Option<usize>,

    #[arg(long, requires = "vertices")]
    /// Also store a JSON document with the vertex labels, the arcs, and the
    /// rank vector (requires a vertex file).
    pub summary: Option<PathBuf>,

    #[clap(flatten)]
    pub arcs_args: ArcsArgs,

    #[clap(flatten)]
    pub parallel: ParallelArgs,
}

pub fn main(global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    ensure!(
        args.alpha > 0.0 && args.alpha < 1.0,
        "The damping factor must be in (0 . . 1), got {}",
        args.alpha
    );

    let mut pl = progress_logger![];
    pl.display_memory(true);
    if let Some(log_interval) = global_args.log_interval {
        pl.log_interval(log_interval);
    }

    let mut cpl = concurrent_progress_logger![];
    cpl.display_memory(true);
    if let Some(log_interval) = global_args.log_interval {
        cpl.log_interval(log_interval);
    }

    let thread_pool = args.parallel.thread_pool()?;

    let labels = match (&args.vertices, &args.summary) {
        (Some(vertices), Some(_)) => Some(arcs::load_labels(vertices)?),
        _ => None,
    };
    let num_nodes = match (&labels, &args.vertices, args.num_nodes) {
        (Some(labels), _, _) => labels.len(),
        (None, _, Some(num_nodes)) => num_nodes,
        (None, Some(vertices), None) => arcs::num_nodes(vertices)?,
        (None, None, None) => anyhow::bail!("Either a vertex file or the number of nodes is needed"),
    };
    log::info!("{} nodes", num_nodes);

    let arcs = args
        .arcs_args
        .arc_format()
        .load_with_logging(&args.arcs, &mut pl)?;
    // The builder consumes the arcs
    let summary_arcs = labels.as_ref().map(|_| arcs.clone());

    let initial = args
        .initial
        .as_ref()
        .map(|path| args.initial_fmt.load(path))
        .transpose()?;

    let mut predicate = MaxIter::from(args.iterations).boxed();
    if let Some(threshold) = args.threshold {
        predicate = predicate.or(L1Norm::try_from(threshold)?).boxed();
    }

    let rank = thread_pool.install(|| -> Result<Box<[f64]>> {
        let matrix = GoogleMatrixBuilder::new(num_nodes)
            .alpha(args.alpha)
            .mode(args.mode.into())
            .granularity(args.parallel.granularity())
            .build_with_logging(arcs, &mut pl)
            .with_context(|| format!("Could not build the Google matrix of {}", args.arcs.display()))?;

        let mut pi = PowerIteration::new(&matrix);
        pi.initial(initial.as_deref())
            .granularity(args.parallel.granularity());
        pi.run_with_logging(predicate, &mut pl, &mut cpl)?;
        Ok(pi.into_rank())
    })?;

    args.fmt.store(&args.output, &rank, args.precision)?;

    if let (Some(path), Some(labels), Some(edges)) = (&args.summary, &labels, &summary_arcs) {
        Summary::new(labels, edges, &rank)?.store(path)?;
    }

    Ok(())
}
