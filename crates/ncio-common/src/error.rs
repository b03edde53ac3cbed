//! Error types for dense grid access.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised by bounds-checked access into a [`crate::Dense2D`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("row {row} out of bounds for grid with {rows} rows")]
    RowOutOfBounds { row: usize, rows: usize },

    #[error("element ({row}, {col}) out of bounds for {rows}x{cols} grid")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("expected {expected} values for a {rows}x{cols} grid, got {actual}")]
    LengthMismatch {
        rows: usize,
        cols: usize,
        expected: usize,
        actual: usize,
    },

    #[error("row length {actual} does not match column count {cols}")]
    RowLengthMismatch { cols: usize, actual: usize },
}
