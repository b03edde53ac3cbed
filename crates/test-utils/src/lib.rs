//! Shared test utilities for the ncio workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Scratch path helpers
//! - Chunk generators with verifiable values
//! - The reference write-then-read scenario
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Assert that every cell of the given chunk rows equals the padding sentinel.
///
/// ```ignore
/// assert_padded_rows!(chunk, 2..5);
/// ```
#[macro_export]
macro_rules! assert_padded_rows {
    ($chunk:expr, $rows:expr) => {{
        for r in $rows {
            let row = $chunk.row(r).expect("row index within chunk");
            assert!(
                row.iter().all(|&v| f64::from(v) == 32767.0),
                "row {} is not padding: {:?}",
                r,
                row
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    use ncio_common::Dense2D;

    #[test]
    fn test_assert_padded_rows_passes() {
        let mut chunk: Dense2D<f32> = Dense2D::new(3, 2);
        chunk.fill_rows_from(1, 32767.0).unwrap();
        assert_padded_rows!(chunk, 1..3);
    }

    #[test]
    #[should_panic(expected = "is not padding")]
    fn test_assert_padded_rows_fails() {
        let chunk: Dense2D<f64> = Dense2D::new(2, 2);
        assert_padded_rows!(chunk, 0..1);
    }
}
