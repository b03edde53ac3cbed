//! Dataset descriptors shared by stores and streams.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Names that locate a 2D variable inside a dataset file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetLayout {
    /// Variable holding the data
    pub variable: String,
    /// Row dimension (unlimited when the file is created by a writer)
    pub row_dimension: String,
    /// Column dimension (fixed length)
    pub column_dimension: String,
}

impl DatasetLayout {
    pub fn new(
        variable: impl Into<String>,
        row_dimension: impl Into<String>,
        column_dimension: impl Into<String>,
    ) -> Self {
        Self {
            variable: variable.into(),
            row_dimension: row_dimension.into(),
            column_dimension: column_dimension.into(),
        }
    }

    /// Dimension names in storage order (rows, then columns).
    pub fn dimensions(&self) -> [&str; 2] {
        [&self.row_dimension, &self.column_dimension]
    }
}

/// Everything a stream knows about the dataset it is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// File the dataset lives in
    pub path: PathBuf,
    /// Variable and dimension names
    pub layout: DatasetLayout,
    /// Element type tag (e.g. "float", "double")
    pub dtype: String,
    /// Rows currently stored. Fixed for readers, grows for writers.
    pub nrows: usize,
    /// Columns per row. Immutable for the lifetime of a stream.
    pub ncols: usize,
}

impl DatasetDescriptor {
    pub fn new(
        path: impl AsRef<Path>,
        layout: DatasetLayout,
        dtype: impl Into<String>,
        nrows: usize,
        ncols: usize,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            layout,
            dtype: dtype.into(),
            nrows,
            ncols,
        }
    }

    /// Number of elements currently stored.
    pub fn len(&self) -> usize {
        self.nrows * self.ncols
    }

    pub fn is_empty(&self) -> bool {
        self.nrows == 0 || self.ncols == 0
    }
}

impl fmt::Display for DatasetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}({}={}, {}={}) {}",
            self.path.display(),
            self.layout.variable,
            self.layout.row_dimension,
            self.nrows,
            self.layout.column_dimension,
            self.ncols,
            self.dtype
        )
    }
}

/// Direction a stream was opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamMode {
    Read,
    Write,
}

impl StreamMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
