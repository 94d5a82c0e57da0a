/*
 * SPDX-FileCopyrightText: 2026 The linkrank authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]

use anyhow::{Context, Result, ensure};
use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use jiff::SignedDuration;
use jiff::fmt::friendly::{Designator, FractionalUnit, Spacing, SpanPrinter};
use linkrank::arcs::ArcFormat;
use linkrank::utils::Granularity;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

pub mod rank;

/// Version and build information collected by the build script.
pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));

    /// Returns the package version followed by the commit it was built from
    /// (if known), the target, and the compiler.
    pub fn version_string() -> String {
        let commit = match (GIT_COMMIT_HASH_SHORT, GIT_DIRTY) {
            (Some(hash), Some(true)) => format!(" ({hash}, modified)"),
            (Some(hash), _) => format!(" ({hash})"),
            (None, _) => String::new(),
        };
        format!("{PKG_VERSION}{commit}\n{PROFILE} build for {TARGET}, {RUSTC_VERSION}")
    }
}

/// How arc files are parsed.
#[derive(Args, Debug)]
pub struct ArcsArgs {
    #[arg(long, default_value_t = ',')]
    /// The character separating the source from the target of an arc.
    pub separator: char,

    #[arg(long, default_value_t = '#')]
    /// Lines starting with this character are comments.
    pub comment: char,

    #[arg(long)]
    /// Treat every line as an arc, including those starting with the comment
    /// character.
    pub no_comments: bool,
}

impl ArcsArgs {
    pub fn arc_format(&self) -> ArcFormat {
        ArcFormat {
            separator: self.separator,
            comment: (!self.no_comments).then_some(self.comment),
        }
    }
}

/// Thread pool size and task granularity.
#[derive(Args, Debug)]
pub struct ParallelArgs {
    #[arg(
        short = 'j',
        long,
        default_value_t = rayon::current_num_threads().max(1),
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    /// The number of threads.
    pub num_threads: usize,

    #[arg(long, conflicts_with("node_granularity"))]
    /// The tentative number of matrix entries handled by a parallel task
    /// (advanced option).
    pub entry_granularity: Option<u64>,

    #[arg(long)]
    /// The number of nodes handled by a parallel task (advanced option).
    pub node_granularity: Option<usize>,
}

impl ParallelArgs {
    pub fn granularity(&self) -> Granularity {
        match (self.entry_granularity, self.node_granularity) {
            (Some(entries), _) => Granularity::Entries(entries),
            (None, Some(nodes)) => Granularity::Nodes(nodes),
            (None, None) => Granularity::default(),
        }
    }

    /// Builds a dedicated thread pool of the requested size.
    pub fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()
            .context("Could not build the thread pool")?;
        log::info!("Using {} threads", pool.current_num_threads());
        Ok(pool)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
/// File formats for rank vectors.
pub enum FloatVectorFormat {
    /// Big-endian 64-bit floats, as written by Java's `DataOutputStream`.
    Java,
    /// One value per line.
    Ascii,
    /// A JSON array.
    Json,
}

/// Writes a float in textual form: with `precision` decimal digits, or in
/// the shortest form that parses back to the same value.
fn write_float(
    out: &mut impl Write,
    buf: &mut zmij::Buffer,
    x: f64,
    precision: Option<usize>,
) -> std::io::Result<()> {
    match precision {
        Some(precision) => write!(out, "{x:.precision$}"),
        None => out.write_all(buf.format(x).as_bytes()),
    }
}

impl FloatVectorFormat {
    /// Writes `values` to `out`; `precision` applies only to textual formats.
    pub fn write(
        &self,
        mut out: impl Write,
        values: &[f64],
        precision: Option<usize>,
    ) -> std::io::Result<()> {
        let mut buf = zmij::Buffer::new();
        match self {
            FloatVectorFormat::Java => {
                for x in values {
                    out.write_all(&x.to_be_bytes())?;
                }
            }
            FloatVectorFormat::Ascii => {
                for &x in values {
                    write_float(&mut out, &mut buf, x, precision)?;
                    out.write_all(b"\n")?;
                }
            }
            FloatVectorFormat::Json => {
                out.write_all(b"[")?;
                for (i, &x) in values.iter().enumerate() {
                    if i != 0 {
                        out.write_all(b", ")?;
                    }
                    write_float(&mut out, &mut buf, x, precision)?;
                }
                out.write_all(b"]")?;
            }
        }
        out.flush()
    }

    /// Reads values written in this format. Blank lines of ASCII input are
    /// skipped.
    pub fn read(&self, mut reader: impl Read) -> Result<Vec<f64>> {
        match self {
            FloatVectorFormat::Java => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                ensure!(
                    bytes.len() % size_of::<f64>() == 0,
                    "Length {} is not a multiple of {}",
                    bytes.len(),
                    size_of::<f64>()
                );
                Ok(bytes
                    .chunks_exact(size_of::<f64>())
                    .map(|chunk| {
                        let mut word = [0; size_of::<f64>()];
                        word.copy_from_slice(chunk);
                        f64::from_be_bytes(word)
                    })
                    .collect())
            }
            FloatVectorFormat::Ascii => {
                let mut values = Vec::new();
                for (i, line) in BufReader::new(reader).lines().enumerate() {
                    let line = line.with_context(|| format!("Could not read line {}", i + 1))?;
                    let line = line.trim();
                    if !line.is_empty() {
                        values.push(
                            line.parse()
                                .with_context(|| format!("Line {}: {line:?} is not a float", i + 1))?,
                        );
                    }
                }
                Ok(values)
            }
            FloatVectorFormat::Json => {
                serde_json::from_reader(BufReader::new(reader)).context("Not a JSON array of floats")
            }
        }
    }

    /// Stores `values` at `path`, creating missing parent directories and
    /// replacing existing content.
    pub fn store(&self, path: impl AsRef<Path>, values: &[f64], precision: Option<usize>) -> Result<()> {
        let path = path.as_ref();
        create_parent_dir(path)?;
        log::info!("Storing {} values ({:?}) at {}", values.len(), self, path.display());
        let file = std::fs::File::create(path)
            .with_context(|| format!("Could not create {}", path.display()))?;
        self.write(BufWriter::new(file), values, precision)
            .with_context(|| format!("Could not write {}", path.display()))
    }

    /// Loads the values stored at `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Vec<f64>> {
        let path = path.as_ref();
        log::info!("Loading values ({:?}) from {}", self, path.display());
        let file =
            std::fs::File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
        self.read(file)
            .with_context(|| format!("Could not load {}", path.display()))
    }
}

/// Creates the missing parent directories of `path`.
pub fn create_parent_dir(path: impl AsRef<Path>) -> Result<()> {
    match path.as_ref().parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .with_context(|| format!("Could not create directory {}", dir.display())),
        _ => Ok(()),
    }
}

/// Parses a log interval: either a number of milliseconds, or a duration in
/// [jiff's friendly format](jiff::fmt::friendly) such as `30s` or `1m 30s`.
fn parse_log_interval(value: &str) -> Result<Duration> {
    if let Ok(millis) = value.trim().parse::<u64>() {
        return Ok(Duration::from_millis(millis));
    }
    let duration: SignedDuration = value
        .parse()
        .with_context(|| format!("Invalid duration {value:?}"))?;
    Duration::try_from(duration).with_context(|| format!("Negative duration {value:?}"))
}

/// Formats an elapsed time in words, with millisecond precision.
fn format_elapsed(elapsed: Duration) -> String {
    let Ok(duration) = SignedDuration::try_from(Duration::from_millis(elapsed.as_millis() as u64))
    else {
        return format!("{}s", elapsed.as_secs());
    };
    SpanPrinter::new()
        .designator(Designator::Verbose)
        .spacing(Spacing::BetweenUnitsAndDesignators)
        .fractional(Some(FractionalUnit::Second))
        .duration_to_string(&duration)
}

/// Installs an `env_logger` logger (default level `info`) whose lines start
/// with the wall-clock time and the time elapsed since installation.
pub fn init_env_logger() -> Result<()> {
    let start = Instant::now();
    let printer = SpanPrinter::new()
        .designator(Designator::Compact)
        .spacing(Spacing::None);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(move |buf, record| {
            let now = jiff::Timestamp::try_from(SystemTime::now()).map_err(std::io::Error::other)?;
            let elapsed = Duration::from_millis(start.elapsed().as_millis() as u64);
            let elapsed = SignedDuration::try_from(elapsed).map_err(std::io::Error::other)?;
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "{} +{} {style}{:5}{style:#} [{:?}] {}: {}",
                now.strftime("%F %T%.3f"),
                printer.duration_to_string(&elapsed),
                record.level(),
                std::thread::current().id(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .context("Could not install the logger")
}

/// Options shared by all commands.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    #[arg(long, value_parser = parse_log_interval, global = true, display_order = 1000)]
    /// Minimum time between progress messages (default 10s): a number of
    /// milliseconds, or a duration such as "30s", "5m", or "1h 30m".
    pub log_interval: Option<Duration>,
}

#[derive(Subcommand, Debug)]
pub enum SubCommands {
    #[clap(name = "pagerank", visible_alias = "pr")]
    PageRank(rank::pagerank::CliArgs),
}

#[derive(Parser, Debug)]
#[command(name = "linkrank", version = build_info::version_string())]
/// Ranks the nodes of hyperlink graphs stored as text files.
#[doc = include_str!("common_env.txt")]
pub struct Cli {
    #[command(subcommand)]
    pub command: SubCommands,
    #[clap(flatten)]
    pub args: GlobalArgs,
}

/// Parses the command line and runs the selected command.
pub fn cli_main<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let start = Instant::now();
    let cli = Cli::parse_from(args);
    match cli.command {
        SubCommands::PageRank(args) => rank::pagerank::main(cli.args, args)?,
    }
    log::info!("Done in {}", format_elapsed(start.elapsed()));
    Ok(())
}
