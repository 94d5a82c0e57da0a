/*
 * SPDX-FileCopyrightText: 2026 The linkrank authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/// A compressed sparse row (CSR) matrix storing the entries of each row
/// contiguously.
///
/// It's like a `Vec<Vec<T>>` in which rows can only be appended: the shape of
/// existing rows cannot change, but their entries can be modified in place
/// through [`values_mut`](Self::values_mut), which exposes all entries as a
/// single flat slice (handy for passes that transform every entry
/// independently, possibly in parallel).
#[derive(Debug, Clone)]
pub struct CsrMatrix<T> {
    /// The first offset is always zero, and offsets contains one more element
    /// than the number of rows.
    offsets: Vec<usize>,
    values: Vec<T>,
}

impl<T> Default for CsrMatrix<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CsrMatrix<T> {
    /// Creates a new empty CSR matrix.
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            values: Vec::new(),
        }
    }

    /// Creates a new empty CSR matrix with space for the given number of rows
    /// and entries.
    pub fn with_capacity(num_rows: usize, num_elements: usize) -> Self {
        let mut offsets = Vec::with_capacity(num_rows + 1);
        offsets.push(0);
        Self {
            offsets,
            values: Vec::with_capacity(num_elements),
        }
    }

    /// Appends a new row to the matrix.
    pub fn push(&mut self, values: impl IntoIterator<Item = T>) {
        self.values.extend(values);
        self.offsets.push(self.values.len());
    }

    /// Returns the number of rows in the matrix.
    pub fn num_rows(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Returns the total number of entries in the matrix.
    pub fn num_elements(&self) -> usize {
        self.values.len()
    }

    /// Returns all entries, row after row, as a mutable slice.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Returns an iterator over the rows of the matrix.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[T]> + '_ {
        self.offsets
            .windows(2)
            .map(|w| &self.values[w[0]..w[1]])
    }
}

impl<T> core::ops::Index<usize> for CsrMatrix<T> {
    type Output = [T];

    fn index(&self, row: usize) -> &Self::Output {
        let start = self.offsets[row];
        let end = self.offsets[row + 1];
        &self.values[start..end]
    }
}
