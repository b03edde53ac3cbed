//! In-memory dataset store.
//!
//! Datasets live in a shared registry keyed by path, so a sink and a later
//! source opened on the same path see the same rows. Every range call is
//! recorded, which lets tests check exactly when streams hit the store.

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use ncio_common::{DatasetDescriptor, DatasetLayout};
use tracing::debug;

use crate::element::Element;
use crate::error::{StoreError, StoreResult};
use crate::store::{check_buffer_len, DatasetStore, RowSink, RowSource};

/// One recorded range call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCall {
    pub start_row: usize,
    pub row_count: usize,
}

struct MemoryDataset {
    layout: DatasetLayout,
    dtype: &'static str,
    ncols: usize,
    nrows: usize,
    values: Box<dyn Any + Send>,
    reads: Vec<RangeCall>,
    writes: Vec<RangeCall>,
    failing_reads: usize,
    failing_writes: usize,
}

impl MemoryDataset {
    fn values<T: Element>(&self, path: &Path) -> StoreResult<&Vec<T>> {
        self.values
            .downcast_ref::<Vec<T>>()
            .ok_or_else(|| StoreError::TypeMismatch {
                path: path.to_path_buf(),
                stored: self.dtype.to_string(),
                requested: T::DTYPE,
            })
    }

    fn values_mut<T: Element>(&mut self, path: &Path) -> StoreResult<&mut Vec<T>> {
        let stored = self.dtype;
        self.values
            .downcast_mut::<Vec<T>>()
            .ok_or_else(|| StoreError::TypeMismatch {
                path: path.to_path_buf(),
                stored: stored.to_string(),
                requested: T::DTYPE,
            })
    }
}

/// Shared in-memory registry of datasets.
#[derive(Clone, Default)]
pub struct MemoryStore {
    datasets: Arc<Mutex<HashMap<PathBuf, MemoryDataset>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a dataset with row-major `values`.
    pub fn insert<T: Element>(
        &self,
        path: impl AsRef<Path>,
        layout: DatasetLayout,
        ncols: usize,
        values: Vec<T>,
    ) -> StoreResult<()> {
        let path = path.as_ref();
        if ncols == 0 || values.len() % ncols != 0 {
            return Err(StoreError::io(
                path,
                format!("{} values do not fill rows of {} columns", values.len(), ncols),
            ));
        }
        let nrows = values.len() / ncols;
        self.lock(path)?.insert(
            path.to_path_buf(),
            MemoryDataset {
                layout,
                dtype: T::DTYPE,
                ncols,
                nrows,
                values: Box::new(values),
                reads: Vec::new(),
                writes: Vec::new(),
                failing_reads: 0,
                failing_writes: 0,
            },
        );
        Ok(())
    }

    /// Copy of the stored values, if the dataset exists with element type `T`.
    pub fn values<T: Element>(&self, path: impl AsRef<Path>) -> Option<Vec<T>> {
        let path = path.as_ref();
        let datasets = self.lock(path).ok()?;
        datasets.get(path)?.values::<T>(path).ok().cloned()
    }

    /// Stored row count.
    pub fn nrows(&self, path: impl AsRef<Path>) -> Option<usize> {
        let path = path.as_ref();
        self.lock(path).ok()?.get(path).map(|d| d.nrows)
    }

    /// Every `read_range` issued against the dataset, in order.
    pub fn read_calls(&self, path: impl AsRef<Path>) -> Vec<RangeCall> {
        let path = path.as_ref();
        self.lock(path)
            .ok()
            .and_then(|d| d.get(path).map(|d| d.reads.clone()))
            .unwrap_or_default()
    }

    /// Every `write_range` issued against the dataset, in order.
    pub fn write_calls(&self, path: impl AsRef<Path>) -> Vec<RangeCall> {
        let path = path.as_ref();
        self.lock(path)
            .ok()
            .and_then(|d| d.get(path).map(|d| d.writes.clone()))
            .unwrap_or_default()
    }

    /// Make the next `count` reads from the dataset fail with an I/O error.
    pub fn fail_next_reads(&self, path: impl AsRef<Path>, count: usize) -> StoreResult<()> {
        self.with_dataset(path.as_ref(), |d| d.failing_reads = count)
    }

    /// Make the next `count` writes to the dataset fail with an I/O error.
    pub fn fail_next_writes(&self, path: impl AsRef<Path>, count: usize) -> StoreResult<()> {
        self.with_dataset(path.as_ref(), |d| d.failing_writes = count)
    }

    fn with_dataset(&self, path: &Path, f: impl FnOnce(&mut MemoryDataset)) -> StoreResult<()> {
        let mut datasets = self.lock(path)?;
        let dataset = datasets
            .get_mut(path)
            .ok_or_else(|| StoreError::io(path, "no such dataset"))?;
        f(dataset);
        Ok(())
    }

    fn lock(&self, path: &Path) -> StoreResult<MutexGuard<'_, HashMap<PathBuf, MemoryDataset>>> {
        self.datasets
            .lock()
            .map_err(|_| StoreError::io(path, "memory store lock poisoned"))
    }
}

impl<T: Element> DatasetStore<T> for MemoryStore {
    type Source = MemorySource<T>;
    type Sink = MemorySink<T>;

    fn open(&self, path: &Path, layout: &DatasetLayout) -> StoreResult<Self::Source> {
        let datasets = self.lock(path)?;
        let dataset = datasets
            .get(path)
            .ok_or_else(|| StoreError::io(path, "No such file or directory"))?;

        for name in layout.dimensions() {
            if !dataset.layout.dimensions().contains(&name) {
                return Err(StoreError::dimension(path, name));
            }
        }
        if dataset.layout.variable != layout.variable {
            return Err(StoreError::variable(path, &layout.variable));
        }
        if dataset.layout.dimensions() != layout.dimensions() {
            return Err(StoreError::io(
                path,
                format!(
                    "variable '{}' has dimensions {:?}, expected {:?}",
                    layout.variable,
                    dataset.layout.dimensions(),
                    layout.dimensions()
                ),
            ));
        }
        dataset.values::<T>(path)?;

        let descriptor =
            DatasetDescriptor::new(path, layout.clone(), T::DTYPE, dataset.nrows, dataset.ncols);
        debug!(descriptor = %descriptor, "Opened in-memory dataset for reading");
        Ok(MemorySource {
            store: self.clone(),
            descriptor,
            open: true,
            _element: PhantomData,
        })
    }

    fn create(&self, path: &Path, layout: &DatasetLayout, ncols: usize) -> StoreResult<Self::Sink> {
        if ncols == 0 {
            return Err(StoreError::io(path, "column dimension length must be > 0"));
        }
        self.insert::<T>(path, layout.clone(), ncols, Vec::new())?;

        let descriptor = DatasetDescriptor::new(path, layout.clone(), T::DTYPE, 0, ncols);
        debug!(descriptor = %descriptor, "Created in-memory dataset for writing");
        Ok(MemorySink {
            store: self.clone(),
            descriptor,
            open: true,
            _element: PhantomData,
        })
    }
}

/// Read handle on an in-memory dataset.
pub struct MemorySource<T> {
    store: MemoryStore,
    descriptor: DatasetDescriptor,
    open: bool,
    _element: PhantomData<fn() -> T>,
}

impl<T: Element> RowSource<T> for MemorySource<T> {
    fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    fn inquire_dimension(&self, name: &str) -> StoreResult<usize> {
        let layout = &self.descriptor.layout;
        if name == layout.row_dimension {
            Ok(self.descriptor.nrows)
        } else if name == layout.column_dimension {
            Ok(self.descriptor.ncols)
        } else {
            Err(StoreError::dimension(&self.descriptor.path, name))
        }
    }

    fn read_range(&mut self, start_row: usize, row_count: usize, out: &mut [T]) -> StoreResult<()> {
        let path = &self.descriptor.path;
        if !self.open {
            return Err(StoreError::Closed(path.clone()));
        }
        let ncols = self.descriptor.ncols;
        check_buffer_len(row_count, ncols, out.len())?;

        let mut datasets = self.store.lock(path)?;
        let dataset = datasets
            .get_mut(path)
            .ok_or_else(|| StoreError::io(path, "dataset removed while open"))?;
        dataset.reads.push(RangeCall {
            start_row,
            row_count,
        });
        if dataset.failing_reads > 0 {
            dataset.failing_reads -= 1;
            return Err(StoreError::io(path, "injected read failure"));
        }
        if start_row + row_count > dataset.nrows {
            return Err(StoreError::out_of_range(
                path,
                start_row,
                row_count,
                dataset.nrows,
            ));
        }

        let values = dataset.values::<T>(path)?;
        out.copy_from_slice(&values[start_row * ncols..(start_row + row_count) * ncols]);
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Write handle on an in-memory dataset.
pub struct MemorySink<T> {
    store: MemoryStore,
    descriptor: DatasetDescriptor,
    open: bool,
    _element: PhantomData<fn() -> T>,
}

impl<T: Element> RowSink<T> for MemorySink<T> {
    fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    fn write_range(&mut self, start_row: usize, row_count: usize, rows: &[T]) -> StoreResult<()> {
        let path = &self.descriptor.path;
        if !self.open {
            return Err(StoreError::Closed(path.clone()));
        }
        let ncols = self.descriptor.ncols;
        check_buffer_len(row_count, ncols, rows.len())?;

        let mut datasets = self.store.lock(path)?;
        let dataset = datasets
            .get_mut(path)
            .ok_or_else(|| StoreError::io(path, "dataset removed while open"))?;
        dataset.writes.push(RangeCall {
            start_row,
            row_count,
        });
        if dataset.failing_writes > 0 {
            dataset.failing_writes -= 1;
            return Err(StoreError::io(path, "injected write failure"));
        }

        let end = start_row + row_count;
        let values = dataset.values_mut::<T>(path)?;
        if values.len() < end * ncols {
            values.resize(end * ncols, T::default());
        }
        values[start_row * ncols..end * ncols].copy_from_slice(rows);
        dataset.nrows = dataset.nrows.max(end);
        self.descriptor.nrows = dataset.nrows;
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> DatasetLayout {
        DatasetLayout::new("varxy", "x", "y")
    }

    #[test]
    fn test_sink_then_source_share_rows() {
        let store = MemoryStore::new();
        let path = Path::new("mem/a.nc");

        let mut sink: MemorySink<f32> = store.create(path, &layout(), 2).unwrap();
        sink.write_range(0, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        sink.write_range(2, 1, &[5.0, 6.0]).unwrap();
        assert_eq!(sink.descriptor().nrows, 3);
        sink.close().unwrap();

        let mut source: MemorySource<f32> = store.open(path, &layout()).unwrap();
        assert_eq!(source.descriptor().nrows, 3);
        assert_eq!(source.inquire_dimension("y").unwrap(), 2);

        let mut out = vec![0.0; 4];
        source.read_range(1, 2, &mut out).unwrap();
        assert_eq!(out, vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(
            store.read_calls(path),
            vec![RangeCall {
                start_row: 1,
                row_count: 2
            }]
        );
    }

    #[test]
    fn test_read_past_extent_fails() {
        let store = MemoryStore::new();
        let path = Path::new("mem/b.nc");
        store.insert(path, layout(), 2, vec![1i32, 2, 3, 4]).unwrap();

        let mut source: MemorySource<i32> = store.open(path, &layout()).unwrap();
        let mut out = vec![0; 4];
        let err = source.read_range(1, 2, &mut out).unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange { nrows: 2, end: 3, .. }));
    }

    #[test]
    fn test_open_reports_missing_names() {
        let store = MemoryStore::new();
        let path = Path::new("mem/c.nc");
        store.insert(path, layout(), 1, vec![1.0f64]).unwrap();

        let bad_dim = DatasetLayout::new("varxy", "rows", "y");
        let err = <MemoryStore as DatasetStore<f64>>::open(&store, path, &bad_dim).err();
        assert!(matches!(err, Some(StoreError::Dimension { name, .. }) if name == "rows"));

        let bad_var = DatasetLayout::new("other", "x", "y");
        let err = <MemoryStore as DatasetStore<f64>>::open(&store, path, &bad_var).err();
        assert!(matches!(err, Some(StoreError::Variable { .. })));

        let missing = <MemoryStore as DatasetStore<f64>>::open(&store, Path::new("nope"), &layout());
        assert!(matches!(missing, Err(StoreError::Io { .. })));
    }

    #[test]
    fn test_type_mismatch_on_open() {
        let store = MemoryStore::new();
        let path = Path::new("mem/d.nc");
        store.insert(path, layout(), 1, vec![1.0f64]).unwrap();

        let err = <MemoryStore as DatasetStore<f32>>::open(&store, path, &layout()).err();
        assert!(matches!(err, Some(StoreError::TypeMismatch { requested: "float", .. })));
    }

    #[test]
    fn test_injected_write_failure_keeps_data() {
        let store = MemoryStore::new();
        let path = Path::new("mem/e.nc");
        let mut sink: MemorySink<f32> = store.create(path, &layout(), 1).unwrap();
        store.fail_next_writes(path, 1).unwrap();

        assert!(sink.write_range(0, 1, &[7.0]).is_err());
        sink.write_range(0, 1, &[7.0]).unwrap();
        assert_eq!(store.values::<f32>(path).unwrap(), vec![7.0]);
        assert_eq!(store.write_calls(path).len(), 2);
    }

    #[test]
    fn test_injected_read_failure_is_one_shot() {
        let store = MemoryStore::new();
        let path = Path::new("mem/h.nc");
        store.insert(path, layout(), 1, vec![1.0f32, 2.0]).unwrap();
        store.fail_next_reads(path, 1).unwrap();

        let mut source: MemorySource<f32> = store.open(path, &layout()).unwrap();
        let mut out = vec![0.0; 2];
        assert!(matches!(
            source.read_range(0, 2, &mut out),
            Err(StoreError::Io { .. })
        ));
        source.read_range(0, 2, &mut out).unwrap();
        assert_eq!(out, vec![1.0, 2.0]);
        assert_eq!(store.read_calls(path).len(), 2);
        assert!(store.fail_next_reads("mem/missing.nc", 1).is_err());
    }

    #[test]
    fn test_closed_handles_reject_io() {
        let store = MemoryStore::new();
        let path = Path::new("mem/f.nc");
        let mut sink: MemorySink<f32> = store.create(path, &layout(), 1).unwrap();
        sink.close().unwrap();
        sink.close().unwrap();
        assert!(!sink.is_open());
        assert!(matches!(
            sink.write_range(0, 1, &[1.0]),
            Err(StoreError::Closed(_))
        ));
    }

    #[test]
    fn test_buffer_size_checked() {
        let store = MemoryStore::new();
        let path = Path::new("mem/g.nc");
        let mut sink: MemorySink<f32> = store.create(path, &layout(), 3).unwrap();
        let err = sink.write_range(0, 1, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::BufferSize {
                expected: 3,
                actual: 2
            }
        ));
    }
}
