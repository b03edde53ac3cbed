//! Error types for dataset store operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised at the store boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Open/create/close or range I/O failed in the storage engine
    #[error("I/O error on {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// Named dimension not present in the dataset
    #[error("dimension '{name}' not found in {path}")]
    Dimension { path: PathBuf, name: String },

    /// Named variable not present in the dataset
    #[error("variable '{name}' not found in {path}")]
    Variable { path: PathBuf, name: String },

    /// Row range outside the stored extent
    #[error("rows {start}..{end} out of range for {path} with {nrows} rows")]
    OutOfRange {
        path: PathBuf,
        start: usize,
        end: usize,
        nrows: usize,
    },

    /// Caller buffer does not hold `row_count * ncols` values
    #[error("buffer holds {actual} values, range needs {expected}")]
    BufferSize { expected: usize, actual: usize },

    /// Stored element type differs from the requested one
    #[error("type mismatch on {path}: stored {stored}, requested {requested}")]
    TypeMismatch {
        path: PathBuf,
        stored: String,
        requested: &'static str,
    },

    /// Handle used after close
    #[error("dataset handle for {0} is closed")]
    Closed(PathBuf),
}

impl StoreError {
    /// Create an Io error.
    pub fn io(path: impl AsRef<Path>, message: impl ToString) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Create a Dimension error.
    pub fn dimension(path: impl AsRef<Path>, name: impl Into<String>) -> Self {
        Self::Dimension {
            path: path.as_ref().to_path_buf(),
            name: name.into(),
        }
    }

    /// Create a Variable error.
    pub fn variable(path: impl AsRef<Path>, name: impl Into<String>) -> Self {
        Self::Variable {
            path: path.as_ref().to_path_buf(),
            name: name.into(),
        }
    }

    /// Create an OutOfRange error.
    pub fn out_of_range(path: impl AsRef<Path>, start: usize, count: usize, nrows: usize) -> Self {
        Self::OutOfRange {
            path: path.as_ref().to_path_buf(),
            start,
            end: start + count,
            nrows,
        }
    }
}
