/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 * SPDX-FileCopyrightText: 2026 The linkrank authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/// Granularity of parallel tasks, specified transparently by nodes or by
/// matrix entries.
///
/// The passes that build the Google matrix and the steps of the power
/// iteration split the nodes (that is, the rows of the transposed matrix)
/// into chunks, each of which is handed to a Rayon task. The size of a chunk
/// can be expressed directly as a number of nodes, or as a tentative number
/// of matrix entries, which is converted into a number of nodes using the
/// average row length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Node granularity: each task processes the specified number of rows.
    Nodes(usize),
    /// Entry granularity: each task processes a number of rows whose total
    /// length is, tentatively, the specified number of entries.
    Entries(u64),
}

impl core::default::Default for Granularity {
    /// Returns a default granularity of 1000 nodes.
    fn default() -> Self {
        Self::Nodes(1000)
    }
}

impl Granularity {
    /// Returns a node granularity for a given number of nodes and entries.
    ///
    /// For the variant [`Nodes`](Self::Nodes), the specified number of nodes
    /// is returned. For the variant [`Entries`](Self::Entries), the number of
    /// nodes is computed as the specified number of entries divided by the
    /// average row length.
    ///
    /// The result is always at least one.
    ///
    /// # Panics
    ///
    /// This method will panic if it needs to convert an entry granularity into
    /// a node granularity and the number of entries is not provided.
    pub fn node_granularity(&self, num_nodes: usize, num_entries: Option<u64>) -> usize {
        match self {
            Self::Nodes(n) => (*n).max(1),
            Self::Entries(n) => {
                let average_len = num_entries.expect(
                    "You need the number of entries to convert entry granularity to node granularity",
                ) as f64
                    / num_nodes.max(1) as f64;
                if average_len == 0.0 {
                    return num_nodes.max(1);
                }
                (*n as f64 / average_len)
                    .min(usize::MAX as f64)
                    .ceil()
                    .max(1.0) as usize
            }
        }
    }
}
