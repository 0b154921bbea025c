//! Raw sample grids.

use ndarray::{Array2, ArrayD, IxDyn};

/// On-disk element type of a field.
///
/// Values are held as `f64` in memory; the sample type only decides how the
/// grid is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    /// Unsigned 8-bit.
    U8,
    /// Signed 8-bit.
    I8,
    /// Unsigned 16-bit.
    U16,
    /// Signed 16-bit.
    I16,
    /// Unsigned 32-bit.
    U32,
    /// Signed 32-bit.
    I32,
    /// Unsigned 64-bit.
    U64,
    /// Signed 64-bit.
    I64,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
}

impl SampleType {
    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Whether `value` is stored unchanged by this type.
    ///
    /// Integer types take finite whole numbers within their range. `F32`
    /// takes anything inside the `f32` range (rounding is accepted), `F64`
    /// takes everything.
    pub fn holds(self, value: f64) -> bool {
        let (min, max) = match self {
            Self::U8 => (u8::MIN as f64, u8::MAX as f64),
            Self::I8 => (i8::MIN as f64, i8::MAX as f64),
            Self::U16 => (u16::MIN as f64, u16::MAX as f64),
            Self::I16 => (i16::MIN as f64, i16::MAX as f64),
            Self::U32 => (u32::MIN as f64, u32::MAX as f64),
            Self::I32 => (i32::MIN as f64, i32::MAX as f64),
            Self::U64 => (u64::MIN as f64, u64::MAX as f64),
            Self::I64 => (i64::MIN as f64, i64::MAX as f64),
            Self::F32 => return !value.is_finite() || value.abs() <= f32::MAX as f64,
            Self::F64 => return true,
        };
        value.is_finite() && value.fract() == 0.0 && value >= min && value <= max
    }
}

/// A field's raw samples together with their storage type.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGrid {
    /// Raw values, widened to `f64`.
    pub values: ArrayD<f64>,
    /// Type used when the grid is written.
    pub sample_type: SampleType,
}

impl RawGrid {
    /// Create a grid from values and a storage type.
    pub fn new(values: ArrayD<f64>, sample_type: SampleType) -> Self {
        Self {
            values,
            sample_type,
        }
    }

    /// Build a grid from a flat vector and a shape.
    pub fn from_shape_vec(
        shape: &[usize],
        values: Vec<f64>,
        sample_type: SampleType,
    ) -> Result<Self, ndarray::ShapeError> {
        Ok(Self::new(ArrayD::from_shape_vec(IxDyn(shape), values)?, sample_type))
    }

    /// Grid shape.
    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    /// First value the sample type cannot hold, if any.
    pub fn first_unrepresentable(&self) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .find(|&v| !self.sample_type.holds(v))
    }

    /// Values in row-major order, as stored on disk.
    pub fn to_row_major(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

impl From<ArrayD<f64>> for RawGrid {
    fn from(values: ArrayD<f64>) -> Self {
        Self::new(values, SampleType::F64)
    }
}

impl From<Array2<f64>> for RawGrid {
    fn from(values: Array2<f64>) -> Self {
        Self::new(values.into_dyn(), SampleType::F64)
    }
}

impl From<Array2<u8>> for RawGrid {
    fn from(values: Array2<u8>) -> Self {
        Self::new(values.mapv(f64::from).into_dyn(), SampleType::U8)
    }
}

impl From<Array2<u16>> for RawGrid {
    fn from(values: Array2<u16>) -> Self {
        Self::new(values.mapv(f64::from).into_dyn(), SampleType::U16)
    }
}
