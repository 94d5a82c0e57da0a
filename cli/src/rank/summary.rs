/*
 * SPDX-FileCopyrightText: 2026 The linkrank authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A single JSON document gathering a graph and its ranks, for consumption
//! by visualization tools.

use crate::create_parent_dir;
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Node labels, arcs, and the rank of each node.
///
/// Serialized as an object with keys `nodes`, `edges` (pairs of node
/// indices), and `pagerank`.
#[derive(Serialize, Debug)]
pub struct Summary<'a> {
    pub nodes: &'a [String],
    pub edges: &'a [(usize, usize)],
    pub pagerank: &'a [f64],
}

impl<'a> Summary<'a> {
    pub fn new(nodes: &'a [String], edges: &'a [(usize, usize)], pagerank: &'a [f64]) -> Result<Self> {
        ensure!(
            nodes.len() == pagerank.len(),
            "{} labels but {} ranks",
            nodes.len(),
            pagerank.len()
        );
        Ok(Self {
            nodes,
            edges,
            pagerank,
        })
    }

    /// Writes the summary as indented JSON.
    pub fn write(&self, mut out: impl Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut out, self)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }

    /// Stores the summary at `path`, creating missing parent directories.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        create_parent_dir(path)?;
        log::info!(
            "Storing summary of {} nodes and {} arcs at {}",
            self.nodes.len(),
            self.edges.len(),
            path.display()
        );
        let file = std::fs::File::create(path)
            .with_context(|| format!("Could not create {}", path.display()))?;
        self.write(BufWriter::new(file))
            .with_context(|| format!("Could not write {}", path.display()))
    }
}
