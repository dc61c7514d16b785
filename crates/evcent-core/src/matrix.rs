//! Square binary adjacency matrix.
//!
//! # Invariants
//!
//! - The matrix is square with order `n >= 1`.
//! - Every entry is 0 or 1.
//! - At least one entry is 1.
//!
//! [`AdjacencyMatrix::from_rows`] is the only constructor and enforces all
//! three, so the engine never sees a matrix that breaks them. Once built the
//! matrix is immutable.

use std::fmt;

use crate::error::MatrixError;

/// An immutable n×n grid of 0/1 entries, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyMatrix {
    order: usize,
    entries: Vec<u8>,
}

impl AdjacencyMatrix {
    /// Build a matrix from its rows.
    ///
    /// Checks run in a fixed order: entry values first (row by row), then the
    /// all-zero check, then squareness.
    ///
    /// # Errors
    ///
    /// Returns a [`MatrixError`] describing the first invariant violated.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, MatrixError> {
        let order = rows.len();
        if order == 0 {
            return Err(MatrixError::Empty);
        }

        for (i, row) in rows.iter().enumerate() {
            if let Some((j, &value)) = row.as_ref().iter().enumerate().find(|(_, v)| **v > 1) {
                return Err(MatrixError::InvalidEntry {
                    row: i + 1,
                    column: j + 1,
                    value,
                });
            }
        }

        if !rows.iter().any(|row| row.as_ref().contains(&1)) {
            return Err(MatrixError::AllZero);
        }

        let mut entries = Vec::with_capacity(order * order);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != order {
                return Err(MatrixError::NotSquare {
                    row: i + 1,
                    expected: order,
                    found: row.len(),
                });
            }
            entries.extend_from_slice(row);
        }

        Ok(Self { order, entries })
    }

    /// Number of rows (and columns).
    #[must_use]
    pub const fn order(&self) -> usize {
        self.order
    }

    /// Entry at `(row, column)`, 0-based. `None` when out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> Option<u8> {
        if row >= self.order || column >= self.order {
            return None;
        }
        self.entries.get(row * self.order + column).copied()
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        self.entries.chunks_exact(self.order)
    }

    /// Number of 1-entries.
    #[must_use]
    pub fn ones(&self) -> usize {
        self.entries.iter().filter(|&&v| v == 1).count()
    }

    /// Copy the matrix out as nested rows.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.rows().map(<[u8]>::to_vec).collect()
    }
}

impl fmt::Display for AdjacencyMatrix {
    /// One row per line, entries separated by single spaces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: Vec<String> = row.iter().map(u8::to_string).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
