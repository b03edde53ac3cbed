//! Dataset stores for row-oriented 2D numeric data.
//!
//! A store opens or creates a dataset file and moves contiguous row ranges of
//! one named variable in and out of it. Two backends are provided:
//!
//! - [`NetCdfStore`]: NetCDF-4 files through the native netcdf library
//!   (feature `netcdf`, on by default)
//! - [`MemoryStore`]: a shared in-memory registry that records every range
//!   call, used for tests and dry runs
//!
//! The element type strategy lives in [`Element`]: it is the single place
//! where the type-specific NetCDF read/write primitive is chosen.

pub mod element;
pub mod error;
pub mod memory;
#[cfg(feature = "netcdf")]
pub mod native;
pub mod store;

pub use element::{Element, PADDING_VALUE};
pub use error::{StoreError, StoreResult};
pub use memory::{MemorySink, MemorySource, MemoryStore, RangeCall};
#[cfg(feature = "netcdf")]
pub use native::{silence_hdf5_errors, NetCdfSink, NetCdfSource, NetCdfStore};
pub use store::{DatasetStore, RowSink, RowSource};
