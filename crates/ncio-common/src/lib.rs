//! Common types shared across the ncio workspace.

pub mod descriptor;
pub mod error;
pub mod grid;

pub use descriptor::{DatasetDescriptor, DatasetLayout, StreamMode};
pub use error::{GridError, GridResult};
pub use grid::Dense2D;
