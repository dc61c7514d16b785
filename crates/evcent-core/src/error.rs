//! Error types for matrix construction and the power-iteration engine.

// ---------------------------------------------------------------------------
// Matrix construction
// ---------------------------------------------------------------------------

/// Reasons an [`AdjacencyMatrix`](crate::AdjacencyMatrix) cannot be built.
///
/// Row and column numbers are 1-based so they line up with the line numbers
/// of a matrix file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatrixError {
    /// No rows were supplied.
    #[error("matrix has no rows")]
    Empty,

    /// An entry is neither 0 nor 1.
    #[error("row {row}, column {column}: value {value} is not 0 or 1")]
    InvalidEntry { row: usize, column: usize, value: u8 },

    /// Every entry is 0, so the graph has no edges.
    #[error("matrix is full of zeros")]
    AllZero,

    /// A row's length differs from the number of rows.
    #[error("row {row} has {found} values, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        found: usize,
    },
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Failures inside the numeric kernels.
///
/// A zero norm reached during a run is not an error: the engine reports it as
/// [`Termination::Degenerate`](crate::Termination::Degenerate). These variants
/// only surface when a kernel is called with inputs that break its contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The score vector length does not match the matrix order.
    #[error("shape mismatch: matrix order is {expected} but vector has {found} entries")]
    ShapeMismatch { expected: usize, found: usize },

    /// Normalization was asked to divide by a zero or non-finite norm.
    #[error("cannot normalize by a zero norm")]
    ZeroNorm,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_errors_cite_rows() {
        let err = MatrixError::InvalidEntry {
            row: 2,
            column: 3,
            value: 7,
        };
        assert_eq!(err.to_string(), "row 2, column 3: value 7 is not 0 or 1");

        let err = MatrixError::NotSquare {
            row: 1,
            expected: 3,
            found: 2,
        };
        assert_eq!(err.to_string(), "row 1 has 2 values, expected 3");
    }

    #[test]
    fn shape_mismatch_reports_both_sizes() {
        let err = EngineError::ShapeMismatch {
            expected: 4,
            found: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains('4') && msg.contains('3'), "got: {msg}");
    }
}
