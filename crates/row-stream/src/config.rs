//! Configuration for buffered row streams.

use ncio_common::DatasetLayout;
use serde::{Deserialize, Serialize};

/// Configuration shared by readers and writers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Rows held by the internal buffer between store round-trips.
    pub buffer_rows: usize,

    /// Variable holding the 2D data.
    pub variable: String,

    /// Row dimension name (unlimited on files created by a writer).
    pub row_dimension: String,

    /// Column dimension name.
    pub column_dimension: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_rows: 1024,
            variable: "varxy".to_string(),
            row_dimension: "x".to_string(),
            column_dimension: "y".to_string(),
        }
    }
}

impl StreamConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("NCIO_BUFFER_ROWS") {
            if let Ok(rows) = val.parse() {
                config.buffer_rows = rows;
            }
        }

        if let Ok(val) = std::env::var("NCIO_VARIABLE") {
            config.variable = val;
        }

        if let Ok(val) = std::env::var("NCIO_ROW_DIM") {
            config.row_dimension = val;
        }

        if let Ok(val) = std::env::var("NCIO_COL_DIM") {
            config.column_dimension = val;
        }

        config
    }

    /// Replace the buffer capacity.
    pub fn with_buffer_rows(mut self, buffer_rows: usize) -> Self {
        self.buffer_rows = buffer_rows;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_rows == 0 {
            return Err("buffer_rows must be > 0".to_string());
        }

        if self.variable.is_empty() {
            return Err("variable name must not be empty".to_string());
        }

        if self.row_dimension.is_empty() || self.column_dimension.is_empty() {
            return Err("dimension names must not be empty".to_string());
        }

        if self.row_dimension == self.column_dimension {
            return Err("row and column dimensions must differ".to_string());
        }

        Ok(())
    }

    /// Variable and dimension names as a layout.
    pub fn layout(&self) -> DatasetLayout {
        DatasetLayout::new(&self.variable, &self.row_dimension, &self.column_dimension)
    }
}
