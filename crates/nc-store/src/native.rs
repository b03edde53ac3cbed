//! NetCDF store backed by the native netcdf library.
//!
//! Readers open an existing file and discover the row and column counts from
//! the named dimensions. Writers create a NetCDF-4 file with an unlimited row
//! dimension and a fixed column dimension, then grow it range by range.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::Once;

use ncio_common::{DatasetDescriptor, DatasetLayout};
use tracing::{debug, info, trace};

use crate::element::Element;
use crate::error::{StoreError, StoreResult};
use crate::store::{check_buffer_len, DatasetStore, RowSink, RowSource};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose diagnostics even when a failure is
/// handled on the Rust side (a missing dimension during open, for example).
/// Only needs to run once per process; later calls are no-ops.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and passing null handlers is a
        // documented way to disable automatic error output.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Factory for NetCDF handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetCdfStore;

impl<T: Element> DatasetStore<T> for NetCdfStore {
    type Source = NetCdfSource<T>;
    type Sink = NetCdfSink<T>;

    fn open(&self, path: &Path, layout: &DatasetLayout) -> StoreResult<Self::Source> {
        NetCdfSource::open(path, layout)
    }

    fn create(&self, path: &Path, layout: &DatasetLayout, ncols: usize) -> StoreResult<Self::Sink> {
        NetCdfSink::create(path, layout, ncols)
    }
}

/// Read handle on a NetCDF variable.
pub struct NetCdfSource<T> {
    file: Option<netcdf::File>,
    descriptor: DatasetDescriptor,
    _element: PhantomData<fn() -> T>,
}

impl<T: Element> NetCdfSource<T> {
    /// Open `path` read-only and discover the dataset shape.
    pub fn open(path: &Path, layout: &DatasetLayout) -> StoreResult<Self> {
        silence_hdf5_errors();

        let file = netcdf::open(path).map_err(|e| StoreError::io(path, e))?;

        let nrows = dimension_len(&file, path, &layout.row_dimension)?;
        let ncols = dimension_len(&file, path, &layout.column_dimension)?;

        let var = file
            .variable(&layout.variable)
            .ok_or_else(|| StoreError::variable(path, &layout.variable))?;
        let var_dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        if var_dims != layout.dimensions() {
            return Err(StoreError::io(
                path,
                format!(
                    "variable '{}' has dimensions {:?}, expected {:?}",
                    layout.variable,
                    var_dims,
                    layout.dimensions()
                ),
            ));
        }

        let stored = stored_dtype(&var);
        if stored != T::DTYPE {
            return Err(StoreError::TypeMismatch {
                path: path.to_path_buf(),
                stored,
                requested: T::DTYPE,
            });
        }

        let descriptor = DatasetDescriptor::new(path, layout.clone(), T::DTYPE, nrows, ncols);
        info!(
            path = %path.display(),
            variable = %layout.variable,
            nrows = nrows,
            ncols = ncols,
            dtype = T::DTYPE,
            "Opened NetCDF dataset for reading"
        );

        Ok(Self {
            file: Some(file),
            descriptor,
            _element: PhantomData,
        })
    }
}

impl<T: Element> RowSource<T> for NetCdfSource<T> {
    fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    fn inquire_dimension(&self, name: &str) -> StoreResult<usize> {
        let file = self
            .file
            .as_ref()
            .ok_or_else(|| StoreError::Closed(self.descriptor.path.clone()))?;
        dimension_len(file, &self.descriptor.path, name)
    }

    fn read_range(&mut self, start_row: usize, row_count: usize, out: &mut [T]) -> StoreResult<()> {
        let desc = &self.descriptor;
        let file = self
            .file
            .as_ref()
            .ok_or_else(|| StoreError::Closed(desc.path.clone()))?;

        check_buffer_len(row_count, desc.ncols, out.len())?;
        if start_row + row_count > desc.nrows {
            return Err(StoreError::out_of_range(
                &desc.path, start_row, row_count, desc.nrows,
            ));
        }
        if row_count == 0 {
            return Ok(());
        }

        let var = file
            .variable(&desc.layout.variable)
            .ok_or_else(|| StoreError::variable(&desc.path, &desc.layout.variable))?;
        let values = T::nc_get_rows(&var, start_row..start_row + row_count, desc.ncols)
            .map_err(|e| StoreError::io(&desc.path, e))?;
        check_buffer_len(row_count, desc.ncols, values.len())?;
        out.copy_from_slice(&values);

        trace!(start_row, row_count, "Read NetCDF row range");
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        if let Some(file) = self.file.take() {
            drop(file);
            debug!(path = %self.descriptor.path.display(), "Closed NetCDF dataset");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

/// Write handle on a NetCDF variable with an unlimited row dimension.
pub struct NetCdfSink<T> {
    file: Option<netcdf::FileMut>,
    descriptor: DatasetDescriptor,
    _element: PhantomData<fn() -> T>,
}

impl<T: Element> NetCdfSink<T> {
    /// Create `path` (truncating any existing file) and define the variable.
    pub fn create(path: &Path, layout: &DatasetLayout, ncols: usize) -> StoreResult<Self> {
        silence_hdf5_errors();

        // A zero length means "unlimited" to the netCDF API.
        if ncols == 0 {
            return Err(StoreError::io(path, "column dimension length must be > 0"));
        }

        let mut file = netcdf::create(path).map_err(|e| StoreError::io(path, e))?;
        file.add_unlimited_dimension(&layout.row_dimension)
            .map_err(|e| StoreError::io(path, e))?;
        file.add_dimension(&layout.column_dimension, ncols)
            .map_err(|e| StoreError::io(path, e))?;
        T::nc_add_variable(&mut file, &layout.variable, &layout.dimensions())
            .map_err(|e| StoreError::io(path, e))?;

        info!(
            path = %path.display(),
            variable = %layout.variable,
            ncols = ncols,
            dtype = T::DTYPE,
            "Created NetCDF dataset for writing"
        );

        Ok(Self {
            file: Some(file),
            descriptor: DatasetDescriptor::new(path, layout.clone(), T::DTYPE, 0, ncols),
            _element: PhantomData,
        })
    }
}

impl<T: Element> RowSink<T> for NetCdfSink<T> {
    fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    fn write_range(&mut self, start_row: usize, row_count: usize, rows: &[T]) -> StoreResult<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| StoreError::Closed(self.descriptor.path.clone()))?;

        check_buffer_len(row_count, self.descriptor.ncols, rows.len())?;
        if row_count == 0 {
            return Ok(());
        }

        let mut var = file
            .variable_mut(&self.descriptor.layout.variable)
            .ok_or_else(|| {
                StoreError::variable(&self.descriptor.path, &self.descriptor.layout.variable)
            })?;
        T::nc_put_rows(
            &mut var,
            rows,
            start_row..start_row + row_count,
            self.descriptor.ncols,
        )
        .map_err(|e| StoreError::io(&self.descriptor.path, e))?;

        self.descriptor.nrows = self.descriptor.nrows.max(start_row + row_count);
        trace!(start_row, row_count, "Wrote NetCDF row range");
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        if let Some(file) = self.file.take() {
            drop(file);
            debug!(
                path = %self.descriptor.path.display(),
                nrows = self.descriptor.nrows,
                "Closed NetCDF dataset"
            );
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

/// Element type tag of a stored variable, in the same form as [`Element::DTYPE`].
fn stored_dtype(var: &netcdf::Variable<'_>) -> String {
    use netcdf::types::{FloatType, IntType, NcVariableType};

    match var.vartype() {
        NcVariableType::Float(FloatType::F32) => f32::DTYPE.to_string(),
        NcVariableType::Float(FloatType::F64) => f64::DTYPE.to_string(),
        NcVariableType::Int(IntType::I32) => i32::DTYPE.to_string(),
        NcVariableType::Int(IntType::I16) => i16::DTYPE.to_string(),
        other => format!("{other:?}"),
    }
}

fn dimension_len(file: &netcdf::File, path: &Path, name: &str) -> StoreResult<usize> {
    file.dimension(name)
        .map(|d| d.len())
        .ok_or_else(|| StoreError::dimension(path, name))
}
