//! Mode-agnostic stream interface and per-call reports.

use nc_store::Element;
use ncio_common::{DatasetDescriptor, Dense2D, StreamMode};
use serde::Serialize;

use crate::error::StreamResult;

/// Outcome of one `read_chunk` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkRead {
    /// Leading chunk rows filled with real data.
    pub rows_read: usize,
    /// Trailing chunk rows overwritten with the padding sentinel.
    pub rows_padded: usize,
    /// The stream was already at the end of the data when the call began.
    pub end_of_stream: bool,
}

impl ChunkRead {
    /// No real rows were left to serve; the whole chunk is padding.
    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// Some trailing rows of the chunk are padding.
    pub fn is_padded(&self) -> bool {
        self.rows_padded > 0
    }

    /// The call produced no real rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows_read == 0
    }
}

/// Running counters kept by every stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    /// Real rows moved between chunks and the store.
    pub rows: u64,
    /// Padding rows produced (readers only).
    pub padded_rows: u64,
    /// Refills or flushes issued against the store.
    pub store_calls: u64,
}

/// Operations common to readers and writers.
///
/// Calling the operation of the opposite direction returns
/// [`crate::StreamError::ModeViolation`] and leaves the stream untouched.
pub trait ChunkStream<T: Element> {
    fn mode(&self) -> StreamMode;

    fn descriptor(&self) -> &DatasetDescriptor;

    /// Fill `chunk` with the next rows, padding past the end of the data.
    fn read_chunk(&mut self, chunk: &mut Dense2D<T>) -> StreamResult<ChunkRead>;

    /// Append every row of `chunk`.
    fn write_chunk(&mut self, chunk: &Dense2D<T>) -> StreamResult<()>;

    /// Flush pending rows (writers) and release the store handle.
    fn close(&mut self) -> StreamResult<()>;

    fn stats(&self) -> StreamStats;
}
