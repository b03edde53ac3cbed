//! Buffered, chunked sequential access to 2D numeric datasets.
//!
//! A [`BufferedReader`] serves caller-sized chunks of rows from an internal
//! buffer that is refilled from the store only when exhausted; rows past the
//! end of the data come back as [`nc_store::PADDING_VALUE`]. A
//! [`BufferedWriter`] accumulates caller chunks and flushes whole buffers to
//! the store, with one final partial flush at close.
//!
//! # Example
//!
//! ```no_run
//! use ncio_common::Dense2D;
//! use row_stream::{NetCdfReader, NetCdfWriter};
//!
//! let mut writer: NetCdfWriter<f32> =
//!     NetCdfWriter::create("out.nc", "varxy", "x", "y", 5, 7)?;
//! writer.write_chunk(&Dense2D::filled(3, 5, 1.0))?;
//! writer.close()?;
//!
//! let mut reader: NetCdfReader<f32> = NetCdfReader::open("out.nc", "varxy", "x", "y", 14)?;
//! let mut chunk = Dense2D::new(5, 5);
//! let read = reader.read_chunk(&mut chunk)?;
//! assert_eq!(read.rows_read, 3);
//! # Ok::<(), row_stream::StreamError>(())
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod reader;
pub mod stream;
pub mod writer;

pub use buffer::RowBuffer;
pub use config::StreamConfig;
pub use error::{StreamError, StreamResult};
pub use reader::BufferedReader;
pub use stream::{ChunkRead, ChunkStream, StreamStats};
pub use writer::BufferedWriter;

/// Reader over a NetCDF file.
#[cfg(feature = "netcdf")]
pub type NetCdfReader<T> = BufferedReader<T, nc_store::NetCdfSource<T>>;

/// Writer creating a NetCDF file.
#[cfg(feature = "netcdf")]
pub type NetCdfWriter<T> = BufferedWriter<T, nc_store::NetCdfSink<T>>;
