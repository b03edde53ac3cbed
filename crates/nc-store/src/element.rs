//! Element type strategy.
//!
//! The only thing that varies with the element type is which storage
//! primitive moves the values, so every supported type implements one
//! trait instead of getting its own stream type.

use std::fmt::Debug;
#[cfg(feature = "netcdf")]
use std::ops::Range;

/// Sentinel written into chunk rows that lie past the end of a dataset.
pub const PADDING_VALUE: i16 = 32767;

/// A numeric type that can be stored in and streamed from a dataset.
pub trait Element: Copy + Default + Debug + PartialEq + Send + Sync + 'static {
    /// Type tag as reported in dataset descriptors.
    const DTYPE: &'static str;

    /// [`PADDING_VALUE`] cast to this type.
    fn padding() -> Self;

    /// Define a 2D variable of this type in a file that is being created.
    #[cfg(feature = "netcdf")]
    fn nc_add_variable(
        file: &mut netcdf::FileMut,
        name: &str,
        dims: &[&str],
    ) -> Result<(), netcdf::Error>;

    /// Read `rows` of a 2D variable, all `ncols` columns, as this type.
    #[cfg(feature = "netcdf")]
    fn nc_get_rows(
        var: &netcdf::Variable<'_>,
        rows: Range<usize>,
        ncols: usize,
    ) -> Result<Vec<Self>, netcdf::Error>;

    /// Write `values` into `rows` of a 2D variable.
    #[cfg(feature = "netcdf")]
    fn nc_put_rows(
        var: &mut netcdf::VariableMut<'_>,
        values: &[Self],
        rows: Range<usize>,
        ncols: usize,
    ) -> Result<(), netcdf::Error>;
}

macro_rules! impl_element {
    ($t:ty, $dtype:expr) => {
        impl Element for $t {
            const DTYPE: &'static str = $dtype;

            fn padding() -> Self {
                PADDING_VALUE as $t
            }

            #[cfg(feature = "netcdf")]
            fn nc_add_variable(
                file: &mut netcdf::FileMut,
                name: &str,
                dims: &[&str],
            ) -> Result<(), netcdf::Error> {
                file.add_variable::<$t>(name, dims)?;
                Ok(())
            }

            #[cfg(feature = "netcdf")]
            fn nc_get_rows(
                var: &netcdf::Variable<'_>,
                rows: Range<usize>,
                ncols: usize,
            ) -> Result<Vec<Self>, netcdf::Error> {
                var.get_values::<$t, _>((rows, 0..ncols))
            }

            #[cfg(feature = "netcdf")]
            fn nc_put_rows(
                var: &mut netcdf::VariableMut<'_>,
                values: &[Self],
                rows: Range<usize>,
                ncols: usize,
            ) -> Result<(), netcdf::Error> {
                var.put_values::<$t, _>(values, (rows, 0..ncols))
            }
        }
    };
}

impl_element!(f32, "float");
impl_element!(f64, "double");
impl_element!(i32, "int");
impl_element!(i16, "short");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_cast_per_type() {
        assert_eq!(f32::padding(), 32767.0f32);
        assert_eq!(f64::padding(), 32767.0f64);
        assert_eq!(i32::padding(), 32767);
        assert_eq!(i16::padding(), i16::MAX);
    }

    #[test]
    fn test_dtype_tags() {
        assert_eq!(f32::DTYPE, "float");
        assert_eq!(f64::DTYPE, "double");
        assert_eq!(i32::DTYPE, "int");
        assert_eq!(i16::DTYPE, "short");
    }
}
