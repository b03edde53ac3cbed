//! Error types for buffered row streams.

use std::path::PathBuf;

use nc_store::StoreError;
use ncio_common::{GridError, StreamMode};
use thiserror::Error;

/// Errors that can occur while streaming rows.
#[derive(Error, Debug)]
pub enum StreamError {
    /// Store-level failure (open, dimension lookup, range I/O, close).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A buffer refill failed part way through a chunk.
    ///
    /// The first `rows_read` rows of the chunk hold real data and the stream
    /// position has moved past them; the next `read_chunk` retries the refill.
    #[error("refill failed after {rows_read} rows of the chunk: {source}")]
    Refill {
        rows_read: usize,
        #[source]
        source: StoreError,
    },

    /// A buffer flush failed. The buffered rows are retained and the flush is
    /// retried by the next `write_chunk` or `close`.
    ///
    /// The first `accepted_rows` rows of the chunk were taken into the buffer.
    #[error("flush failed after accepting {accepted_rows} rows of the chunk: {source}")]
    Flush {
        accepted_rows: usize,
        #[source]
        source: StoreError,
    },

    /// Read attempted on a writer, or write attempted on a reader.
    #[error("cannot {operation} {path}: stream is open in {mode} mode")]
    ModeViolation {
        path: PathBuf,
        mode: StreamMode,
        operation: &'static str,
    },

    /// Chunk column count differs from the dataset's.
    #[error("chunk has {actual} columns, dataset {path} has {expected}")]
    ShapeMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    /// Operation attempted after `close`.
    #[error("stream on {0} is closed")]
    Closed(PathBuf),

    /// Invalid stream configuration.
    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// Bounds-checked buffer or chunk access failed.
    #[error("grid access error: {0}")]
    Grid(#[from] GridError),
}

impl StreamError {
    /// Create an InvalidConfig error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether the stream is still usable after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ModeViolation { .. }
                | Self::ShapeMismatch { .. }
                | Self::Refill { .. }
                | Self::Flush { .. }
        )
    }
}

/// Result type for stream operations.
pub type StreamResult<T> = std::result::Result<T, StreamError>;
