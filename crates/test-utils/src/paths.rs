//! Scratch path helpers for tests that write real files.

use std::path::PathBuf;

/// Creates a temporary directory for test output.
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("ncio_test_")
        .tempdir()
        .expect("Failed to create temporary test directory")
}

/// A dataset path inside `dir`, named after the test using it.
pub fn scratch_nc(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(format!("{name}.nc"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_nc_lives_in_temp_dir() {
        let dir = temp_test_dir();
        let path = scratch_nc(&dir, "roundtrip");
        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().unwrap(), "nc");
        assert!(dir.path().to_string_lossy().contains("ncio_test_"));
    }
}
