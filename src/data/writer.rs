//! HDF5 file writer.

use super::{AttrValue, DataNode, RawGrid, SampleType};
use crate::config::CompressionConfig;
use crate::error::{OdimError, Result};
use hdf5::types::{FixedAscii, VarLenUnicode};
use hdf5::{H5Type, Location};
use hdf5_metno as hdf5;
use std::path::Path;

/// Write `$grid` as a dataset of element type `$t`.
macro_rules! put_field {
    ($group:expr, $node:expr, $grid:expr, $compression:expr, $t:ty) => {{
        let values: Vec<$t> = $grid.values.iter().map(|&v| v as $t).collect();
        DataWriter::write_dataset($group, $node, $grid.shape(), &values, $compression)?
    }};
}

/// Write `$text` as a NUL-padded fixed-length string attribute of `$n` bytes.
macro_rules! put_fixed_text {
    ($location:expr, $name:expr, $text:expr, $n:literal) => {{
        let value = FixedAscii::<$n>::from_ascii($text.as_bytes())
            .map_err(|e| OdimError::Hdf5(format!("{}: {}", $name, e)))?;
        $location
            .new_attr::<FixedAscii<$n>>()
            .shape(())
            .create($name)?
            .write_scalar(&value)?
    }};
}

/// Writes a [`DataNode`] tree as a plain HDF5 file.
///
/// Groups become HDF5 groups and fields become datasets without dimension
/// scales, so each group holds exactly the members of its node. Text is
/// written as fixed-length NUL-padded strings.
#[derive(Debug)]
pub struct DataWriter;

impl DataWriter {
    /// Create (or truncate) `path` and write the whole tree into it.
    pub fn write_tree(path: &Path, root: &DataNode, compression: &CompressionConfig) -> Result<()> {
        let file = hdf5::File::create(path)?;
        Self::write_group_contents(&file, root, compression)?;
        file.close()?;
        Ok(())
    }

    fn write_group_contents(
        group: &hdf5::Group,
        node: &DataNode,
        compression: &CompressionConfig,
    ) -> Result<()> {
        Self::write_attributes(group, node)?;

        for child in &node.children {
            if child.is_field() {
                Self::write_field(group, child, compression)?;
            } else {
                let child_group = group.create_group(&child.name)?;
                Self::write_group_contents(&child_group, child, compression)?;
            }
        }

        Ok(())
    }

    fn write_field(group: &hdf5::Group, node: &DataNode, compression: &CompressionConfig) -> Result<()> {
        let grid = node
            .grid
            .as_ref()
            .ok_or_else(|| OdimError::Hdf5(format!("Field {} has no data", node.path)))?;
        Self::check_representable(node, grid)?;

        match grid.sample_type {
            SampleType::U8 => put_field!(group, node, grid, compression, u8),
            SampleType::I8 => put_field!(group, node, grid, compression, i8),
            SampleType::U16 => put_field!(group, node, grid, compression, u16),
            SampleType::I16 => put_field!(group, node, grid, compression, i16),
            SampleType::U32 => put_field!(group, node, grid, compression, u32),
            SampleType::I32 => put_field!(group, node, grid, compression, i32),
            SampleType::U64 => put_field!(group, node, grid, compression, u64),
            SampleType::I64 => put_field!(group, node, grid, compression, i64),
            SampleType::F32 => put_field!(group, node, grid, compression, f32),
            SampleType::F64 => put_field!(group, node, grid, compression, f64),
        }
        Ok(())
    }

    fn check_representable(node: &DataNode, grid: &RawGrid) -> Result<()> {
        match grid.first_unrepresentable() {
            Some(value) => Err(OdimError::ValueOutOfRange {
                path: node.path.clone(),
                value,
                sample_type: grid.sample_type.name(),
            }),
            None => Ok(()),
        }
    }

    fn write_dataset<T: H5Type>(
        group: &hdf5::Group,
        node: &DataNode,
        shape: &[usize],
        values: &[T],
        compression: &CompressionConfig,
    ) -> Result<()> {
        let mut builder = group.new_dataset::<T>().shape(shape.to_vec());
        // Filters need chunking, and chunks cannot be empty.
        if !shape.is_empty() && shape.iter().all(|&n| n > 0) {
            builder = builder
                .chunk(shape.to_vec())
                .deflate(compression.deflate_level.clamp(0, 9) as u8);
            if compression.shuffle {
                builder = builder.shuffle();
            }
        }
        let dataset = builder.create(node.name.as_str())?;
        dataset.write_raw(values)?;

        Self::write_attributes(&dataset, node)?;
        // ODIM image datasets are tagged; netCDF never reports CLASS on read.
        if shape.len() == 2 {
            if node.attr("CLASS").is_none() {
                Self::write_text(&dataset, "CLASS", "IMAGE")?;
            }
            if node.attr("IMAGE_VERSION").is_none() {
                Self::write_text(&dataset, "IMAGE_VERSION", "1.2")?;
            }
        }
        Ok(())
    }

    fn write_attributes(location: &Location, node: &DataNode) -> Result<()> {
        for (name, value) in &node.attributes {
            let name = name.as_str();
            match value {
                AttrValue::Text(v) => Self::write_text(location, name, v)?,
                AttrValue::Bool(_) => Self::write_text(location, name, &value.to_string())?,
                AttrValue::Int(v) => location
                    .new_attr::<i64>()
                    .shape(())
                    .create(name)?
                    .write_scalar(v)?,
                AttrValue::Float(v) => location
                    .new_attr::<f64>()
                    .shape(())
                    .create(name)?
                    .write_scalar(v)?,
                AttrValue::Ints(v) => location
                    .new_attr::<i64>()
                    .shape(v.len())
                    .create(name)?
                    .write_raw(v.as_slice())?,
                AttrValue::Floats(v) => location
                    .new_attr::<f64>()
                    .shape(v.len())
                    .create(name)?
                    .write_raw(v.as_slice())?,
                AttrValue::Texts(v) => {
                    let items = v
                        .iter()
                        .map(|s| Self::var_len(name, s))
                        .collect::<Result<Vec<_>>>()?;
                    location
                        .new_attr::<VarLenUnicode>()
                        .shape(items.len())
                        .create(name)?
                        .write_raw(items.as_slice())?
                },
            }
        }
        Ok(())
    }

    /// Fixed-length text sized to keep at least one trailing NUL. Non-ASCII
    /// or very long text falls back to a variable-length UTF-8 string.
    fn write_text(location: &Location, name: &str, text: &str) -> Result<()> {
        if !text.is_ascii() {
            let value = Self::var_len(name, text)?;
            location
                .new_attr::<VarLenUnicode>()
                .shape(())
                .create(name)?
                .write_scalar(&value)?;
            return Ok(());
        }
        match text.len() {
            0..=15 => put_fixed_text!(location, name, text, 16),
            16..=63 => put_fixed_text!(location, name, text, 64),
            64..=255 => put_fixed_text!(location, name, text, 256),
            256..=1023 => put_fixed_text!(location, name, text, 1024),
            1024..=4095 => put_fixed_text!(location, name, text, 4096),
            _ => {
                let value = Self::var_len(name, text)?;
                location
                    .new_attr::<VarLenUnicode>()
                    .shape(())
                    .create(name)?
                    .write_scalar(&value)?
            },
        }
        Ok(())
    }

    fn var_len(name: &str, text: &str) -> Result<VarLenUnicode> {
        text.parse::<VarLenUnicode>()
            .map_err(|e| OdimError::Hdf5(format!("{}: {}", name, e)))
    }
}
