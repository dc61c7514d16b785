//! Matrix file loading and validation.
//!
//! The file holds one matrix row per line, tokens separated by whitespace,
//! each token `0` or `1`. Every failure names the 1-based line it came from
//! where one applies. Checks run in this order:
//!
//! 1. Token errors, line by line (non-integer, then out of range).
//! 2. All-zero matrix.
//! 3. Squareness: each row must have as many values as there are rows.
//!
//! Trailing blank lines are ignored; a blank line inside the matrix is an
//! error for that line.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use evcent_core::{AdjacencyMatrix, MatrixError};
use tracing::{debug, instrument};

use crate::output::CliError;

/// Reasons a matrix file is rejected.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The file could not be opened or read.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A token is not an integer.
    #[error("line {line}: '{token}' is not an integer")]
    NotInteger { line: usize, token: String },

    /// An integer other than 0 or 1.
    #[error("line {line}: value {value} is not 0 or 1")]
    OutOfRange { line: usize, value: i64 },

    /// A line inside the matrix has no tokens.
    #[error("line {line}: row is empty")]
    BlankRow { line: usize },

    /// No rows at all.
    #[error("matrix is empty")]
    Empty,

    /// Every value is 0.
    #[error("matrix is full of zeros")]
    AllZero,

    /// A row's value count differs from the row count.
    #[error("line {line}: matrix is not square ({found} values, expected {expected})")]
    NotSquare {
        line: usize,
        expected: usize,
        found: usize,
    },
}

impl InputError {
    /// Line the error points at, if any.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::NotInteger { line, .. }
            | Self::OutOfRange { line, .. }
            | Self::BlankRow { line }
            | Self::NotSquare { line, .. } => Some(*line),
            Self::Io { .. } | Self::Empty | Self::AllZero => None,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io_error",
            Self::NotInteger { .. } | Self::OutOfRange { .. } | Self::BlankRow { .. } => {
                "invalid_value"
            }
            Self::Empty => "empty_matrix",
            Self::AllZero => "all_zero_matrix",
            Self::NotSquare { .. } => "not_square",
        }
    }

    /// Remediation hint for the operator.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::Io { .. } => "check the path and file permissions",
            Self::NotInteger { .. } | Self::OutOfRange { .. } | Self::BlankRow { .. } => {
                "every value must be 0 or 1, separated by spaces"
            }
            Self::Empty => "add at least one row to the file",
            Self::AllZero => "the graph needs at least one edge (a 1 somewhere)",
            Self::NotSquare { .. } => "use as many values per row as there are rows",
        }
    }
}

/// Matrix rows are file lines, so row numbers become line numbers.
impl From<MatrixError> for InputError {
    fn from(err: MatrixError) -> Self {
        match err {
            MatrixError::Empty => Self::Empty,
            MatrixError::AllZero => Self::AllZero,
            MatrixError::InvalidEntry { row, value, .. } => Self::OutOfRange {
                line: row,
                value: i64::from(value),
            },
            MatrixError::NotSquare {
                row,
                expected,
                found,
            } => Self::NotSquare {
                line: row,
                expected,
                found,
            },
        }
    }
}

impl From<&InputError> for CliError {
    fn from(err: &InputError) -> Self {
        Self::with_details(err.to_string(), err.suggestion(), err.code())
    }
}

/// Read and validate the matrix at `path`.
///
/// # Errors
///
/// [`InputError::Io`] if the file cannot be read, otherwise any validation
/// error from [`parse_matrix`].
#[instrument]
pub fn load_matrix(path: &Path) -> Result<AdjacencyMatrix, InputError> {
    let text = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let matrix = parse_matrix(&text)?;
    debug!(order = matrix.order(), edges = matrix.ones(), "matrix loaded");
    Ok(matrix)
}

/// Parse and validate matrix text.
///
/// # Errors
///
/// The first [`InputError`] found, in the order listed in the module docs.
/// Token errors are found here; the rest come from
/// [`AdjacencyMatrix::from_rows`] with rows renumbered as lines.
pub fn parse_matrix(text: &str) -> Result<AdjacencyMatrix, InputError> {
    let rows = text
        .trim_end()
        .lines()
        .enumerate()
        .map(|(idx, line)| parse_row(line, idx + 1))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AdjacencyMatrix::from_rows(&rows)?)
}

fn parse_row(line: &str, line_no: usize) -> Result<Vec<u8>, InputError> {
    let row = line
        .split_whitespace()
        .map(|token| parse_token(token, line_no))
        .collect::<Result<Vec<_>, _>>()?;
    if row.is_empty() {
        return Err(InputError::BlankRow { line: line_no });
    }
    Ok(row)
}

fn parse_token(token: &str, line_no: usize) -> Result<u8, InputError> {
    let value: i64 = token.parse().map_err(|_| InputError::NotInteger {
        line: line_no,
        token: token.to_string(),
    })?;
    match value {
        0 => Ok(0),
        1 => Ok(1),
        other => Err(InputError::OutOfRange {
            line: line_no,
            value: other,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_triangle() {
        let m = parse_matrix("0 1 1\n1 0 1\n1 1 0\n").expect("valid");
        assert_eq!(m.order(), 3);
        assert_eq!(m.ones(), 6);
    }

    #[test]
    fn tolerates_extra_whitespace_and_crlf() {
        let m = parse_matrix("0  1\r\n1\t0\r\n\n\n").expect("valid");
        assert_eq!(m.to_rows(), vec![vec![0, 1], vec![1, 0]]);
    }

    #[test]
    fn out_of_range_cites_line() {
        let err = parse_matrix("0 1\n1 2").expect_err("2 is not binary");
        assert!(matches!(err, InputError::OutOfRange { line: 2, value: 2 }));
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.code(), "invalid_value");
    }

    #[test]
    fn non_integer_cites_line_and_token() {
        let err = parse_matrix("0 1 1\n1 x 1\n1 1 0").expect_err("x");
        assert_eq!(err.to_string(), "line 2: 'x' is not an integer");
    }

    #[test]
    fn negative_value_is_out_of_range() {
        let err = parse_matrix("-1 0\n0 1").expect_err("negative");
        assert!(matches!(err, InputError::OutOfRange { line: 1, value: -1 }));
    }

    #[test]
    fn token_errors_win_over_shape_errors() {
        let err = parse_matrix("0 1 1\n1 0\n1 1 5").expect_err("bad token");
        assert!(matches!(err, InputError::OutOfRange { line: 3, .. }));
    }

    #[test]
    fn all_zero_rejected() {
        let err = parse_matrix("0 0\n0 0\n").expect_err("zeros");
        assert!(matches!(err, InputError::AllZero));
        assert_eq!(err.line(), None);
    }

    #[test]
    fn all_zero_checked_before_square() {
        let err = parse_matrix("0 0 0\n0 0").expect_err("zeros");
        assert!(matches!(err, InputError::AllZero));
    }

    #[test]
    fn ragged_row_cites_line() {
        let err = parse_matrix("0 1 1\n1 0 1\n1 1").expect_err("ragged");
        assert!(matches!(
            err,
            InputError::NotSquare {
                line: 3,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn matrix_errors_cite_file_lines() {
        let err = InputError::from(MatrixError::NotSquare {
            row: 4,
            expected: 3,
            found: 5,
        });
        assert_eq!(err.line(), Some(4));
        assert_eq!(err.code(), "not_square");
        assert_eq!(
            err.to_string(),
            "line 4: matrix is not square (5 values, expected 3)"
        );

        let err = InputError::from(MatrixError::InvalidEntry {
            row: 2,
            column: 1,
            value: 3,
        });
        assert!(matches!(err, InputError::OutOfRange { line: 2, value: 3 }));
        assert!(matches!(InputError::from(MatrixError::AllZero), InputError::AllZero));
        assert!(matches!(InputError::from(MatrixError::Empty), InputError::Empty));
    }

    #[test]
    fn first_ragged_row_is_reported() {
        let err = parse_matrix("0 1 1\n1 0\n1 1").expect_err("ragged");
        assert!(matches!(
            err,
            InputError::NotSquare {
                line: 2,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn interior_blank_line_is_an_error() {
        let err = parse_matrix("0 1\n\n1 0").expect_err("blank");
        assert!(matches!(err, InputError::BlankRow { line: 2 }));
    }

    #[test]
    fn empty_and_whitespace_only_files_are_empty() {
        assert!(matches!(parse_matrix(""), Err(InputError::Empty)));
        assert!(matches!(parse_matrix("  \n\n"), Err(InputError::Empty)));
    }

    #[test]
    fn load_matrix_reads_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "1").expect("write");
        let m = load_matrix(file.path()).expect("valid");
        assert_eq!(m.order(), 1);
    }

    #[test]
    fn load_matrix_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_matrix(&dir.path().join("missing.txt")).expect_err("missing");
        assert!(matches!(err, InputError::Io { .. }));
        assert_eq!(err.code(), "io_error");
    }

    #[test]
    fn converts_to_cli_error() {
        let err = parse_matrix("0 1\n1 2").expect_err("bad");
        let cli = CliError::from(&err);
        assert!(cli.message.contains("line 2"));
        assert_eq!(cli.error_code.as_deref(), Some("invalid_value"));
        assert!(cli.suggestion.is_some());
    }
}
