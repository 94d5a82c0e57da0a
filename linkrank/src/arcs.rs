/*
 * SPDX-FileCopyrightText: 2026 The linkrank authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Reading graphs from text files.
//!
//! A graph is described by two text files:
//!
//! - a _vertex file_, containing one label per line; the position of a line
//!   (starting from zero) is the index of the corresponding node, and the
//!   number of lines is the number of nodes;
//! - an _arc file_, containing one arc per line in the form
//!   `<source>,<target>`, where source and target are node indices.
//!
//! Labels are never interpreted: only their number matters for ranking.
//! The separator and the comment symbol of arc files are configurable through
//! [`ArcFormat`].
//!
//! # Examples
//!
//! ```
//! use linkrank::arcs::ArcFormat;
//!
//! let text = "# a 3-cycle\n0,1\n1,2\n2,0\n";
//! let arcs = ArcFormat::default().read(text.as_bytes())?;
//! assert_eq!(arcs, vec![(0, 1), (1, 2), (2, 0)]);
//! # Ok::<(), linkrank::arcs::ArcsError>(())
//! ```

use dsi_progress_logger::{ProgressLog, no_logging};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading vertex or arc files.
#[derive(Error, Debug)]
pub enum ArcsError {
    /// A file could not be opened.
    #[error("Could not open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line could not be read.
    #[error("Could not read line {line}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    /// An arc line does not contain the separator.
    #[error("Malformed line {line}: expected two node indices separated by {separator:?}, got {content:?}")]
    MissingSeparator {
        line: usize,
        separator: char,
        content: String,
    },

    /// A node index is not a nonnegative integer.
    #[error("Malformed line {line}: {value:?} is not a node index")]
    ParseIndex {
        line: usize,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// The textual format of an arc file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcFormat {
    /// The character separating the source from the target.
    pub separator: char,
    /// Lines starting with this character (after leading whitespace) are
    /// ignored.
    pub comment: Option<char>,
}

impl Default for ArcFormat {
    /// Returns the comma-separated format, with `#` as comment symbol.
    fn default() -> Self {
        Self {
            separator: ',',
            comment: Some('#'),
        }
    }
}

impl ArcFormat {
    /// Parses a single line; `line` is the one-based line number used in
    /// errors.
    ///
    /// Returns `None` for comment lines. Note that empty lines are not
    /// comments: they lack the separator, and thus they are malformed.
    ///
    /// The line is split at the first separator and both fields must be
    /// node indices, possibly surrounded by whitespace. Trailing fields are
    /// not ignored: `1,2,3` is rejected with [`ArcsError::ParseIndex`], as
    /// `2,3` is not an index.
    pub fn parse_line(&self, line: usize, content: &str) -> Result<Option<(usize, usize)>, ArcsError> {
        if let Some(comment) = self.comment {
            if content.trim_start().starts_with(comment) {
                return Ok(None);
            }
        }

        let Some((src, dst)) = content.split_once(self.separator) else {
            return Err(ArcsError::MissingSeparator {
                line,
                separator: self.separator,
                content: content.to_owned(),
            });
        };

        let parse = |value: &str| {
            value
                .trim()
                .parse::<usize>()
                .map_err(|source| ArcsError::ParseIndex {
                    line,
                    value: value.to_owned(),
                    source,
                })
        };

        Ok(Some((parse(src)?, parse(dst)?)))
    }

    /// Reads all arcs from a reader.
    pub fn read(&self, reader: impl BufRead) -> Result<Vec<(usize, usize)>, ArcsError> {
        self.read_with_logging(reader, no_logging![])
    }

    /// Reads all arcs from a reader, logging progress.
    pub fn read_with_logging(
        &self,
        reader: impl BufRead,
        pl: &mut impl ProgressLog,
    ) -> Result<Vec<(usize, usize)>, ArcsError> {
        let mut arcs = Vec::new();

        pl.item_name("line");
        pl.expected_updates(None);
        pl.start("Reading arcs...");

        for (i, content) in reader.lines().enumerate() {
            let content = content.map_err(|source| ArcsError::Io { line: i + 1, source })?;
            if let Some(arc) = self.parse_line(i + 1, &content)? {
                arcs.push(arc);
            }
            pl.light_update();
        }

        pl.done();
        Ok(arcs)
    }

    /// Reads all arcs from the file at `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Vec<(usize, usize)>, ArcsError> {
        self.load_with_logging(path, no_logging![])
    }

    /// Reads all arcs from the file at `path`, logging progress.
    pub fn load_with_logging(
        &self,
        path: impl AsRef<Path>,
        pl: &mut impl ProgressLog,
    ) -> Result<Vec<(usize, usize)>, ArcsError> {
        let path = path.as_ref();
        log::info!("Reading arcs from {}", path.display());
        let arcs = self.read_with_logging(open(path)?, pl)?;
        log::info!("Read {} arcs", arcs.len());
        Ok(arcs)
    }
}

fn open(path: &Path) -> Result<BufReader<File>, ArcsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| ArcsError::Open {
            path: path.to_owned(),
            source,
        })
}

/// Reads node labels, one per line.
pub fn read_labels(reader: impl BufRead) -> Result<Vec<String>, ArcsError> {
    reader
        .lines()
        .enumerate()
        .map(|(i, line)| line.map_err(|source| ArcsError::Io { line: i + 1, source }))
        .collect()
}

/// Reads node labels, one per line, from the file at `path`.
pub fn load_labels(path: impl AsRef<Path>) -> Result<Vec<String>, ArcsError> {
    let path = path.as_ref();
    log::info!("Reading vertex labels from {}", path.display());
    let labels = read_labels(open(path)?)?;
    log::info!("Read {} vertices", labels.len());
    Ok(labels)
}

/// Returns the number of lines of a reader without storing them.
///
/// A last line without a terminating newline is counted, so the result is
/// the length of the vector returned by [`read_labels`].
pub fn count_lines(mut reader: impl BufRead) -> Result<usize, ArcsError> {
    let mut count = 0;
    let mut last = b'\n';
    loop {
        let buf = reader
            .fill_buf()
            .map_err(|source| ArcsError::Io { line: count + 1, source })?;
        if buf.is_empty() {
            break;
        }
        count += buf.iter().filter(|&&b| b == b'\n').count();
        last = buf[buf.len() - 1];
        let len = buf.len();
        reader.consume(len);
    }
    if last != b'\n' {
        count += 1;
    }
    Ok(count)
}

/// Returns the number of nodes described by the vertex file at `path`.
pub fn num_nodes(path: impl AsRef<Path>) -> Result<usize, ArcsError> {
    let path = path.as_ref();
    let n = count_lines(open(path)?)?;
    log::info!("Counted {} vertices in {}", n, path.display());
    Ok(n)
}
