//! NetCDF/HDF5 file reader.

use super::{path, AttrValue, DataNode, NodeType, RawGrid, SampleType};
use crate::error::{OdimError, Result};
use netcdf::types::{FloatType, IntType, NcVariableType};

/// Reads a whole product into a [`DataNode`] tree.
#[derive(Debug)]
pub struct DataReader;

impl DataReader {
    /// Read every group, attribute and field below the file root.
    pub fn read_tree(file: &netcdf::File) -> Result<DataNode> {
        let root = file
            .root()
            .ok_or_else(|| OdimError::NetCDF("File has no root group".to_string()))?;

        let mut root_node = DataNode::root();
        Self::read_group_contents(&root, &mut root_node)?;
        Ok(root_node)
    }

    fn read_group_contents(group: &netcdf::Group<'_>, node: &mut DataNode) -> Result<()> {
        for attr in group.attributes() {
            if let Some(value) = Self::attr_value(&attr) {
                node.attributes.insert(attr.name().to_string(), value);
            }
        }

        for var in group.variables() {
            node.add_child(Self::read_variable(&var, &node.path)?);
        }

        for child_group in group.groups() {
            let mut child = DataNode::new(
                child_group.name(),
                path::join(&node.path, &child_group.name()),
                NodeType::Group,
            );
            Self::read_group_contents(&child_group, &mut child)?;
            node.add_child(child);
        }

        Ok(())
    }

    fn read_variable(var: &netcdf::Variable<'_>, parent_path: &str) -> Result<DataNode> {
        let var_name = var.name();
        let mut var_node = DataNode::new(
            var_name.clone(),
            path::join(parent_path, &var_name),
            NodeType::Field,
        );

        for attr in var.attributes() {
            if let Some(value) = Self::attr_value(&attr) {
                var_node.attributes.insert(attr.name().to_string(), value);
            }
        }

        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        var_node.grid = Some(Self::read_grid(var, &shape)?);
        Ok(var_node)
    }

    fn read_grid(var: &netcdf::Variable<'_>, shape: &[usize]) -> Result<RawGrid> {
        let vartype = var.vartype();

        let from_vec = |v: Vec<f64>, sample_type: SampleType| -> Result<RawGrid> {
            RawGrid::from_shape_vec(shape, v, sample_type)
                .map_err(|e| OdimError::NetCDF(format!("Invalid shape/data size: {}", e)))
        };

        match vartype {
            NcVariableType::Float(FloatType::F64) => {
                let values: Vec<f64> = var.get_values(..)?;
                from_vec(values, SampleType::F64)
            },
            NcVariableType::Float(FloatType::F32) => {
                let values: Vec<f32> = var.get_values(..)?;
                from_vec(values.into_iter().map(f64::from).collect(), SampleType::F32)
            },
            NcVariableType::Int(IntType::I64) => {
                let values: Vec<i64> = var.get_values(..)?;
                from_vec(values.into_iter().map(|x| x as f64).collect(), SampleType::I64)
            },
            NcVariableType::Int(IntType::I32) => {
                let values: Vec<i32> = var.get_values(..)?;
                from_vec(values.into_iter().map(f64::from).collect(), SampleType::I32)
            },
            NcVariableType::Int(IntType::I16) => {
                let values: Vec<i16> = var.get_values(..)?;
                from_vec(values.into_iter().map(f64::from).collect(), SampleType::I16)
            },
            NcVariableType::Int(IntType::I8) => {
                let values: Vec<i8> = var.get_values(..)?;
                from_vec(values.into_iter().map(f64::from).collect(), SampleType::I8)
            },
            NcVariableType::Int(IntType::U64) => {
                let values: Vec<u64> = var.get_values(..)?;
                from_vec(values.into_iter().map(|x| x as f64).collect(), SampleType::U64)
            },
            NcVariableType::Int(IntType::U32) => {
                let values: Vec<u32> = var.get_values(..)?;
                from_vec(values.into_iter().map(f64::from).collect(), SampleType::U32)
            },
            NcVariableType::Int(IntType::U16) => {
                let values: Vec<u16> = var.get_values(..)?;
                from_vec(values.into_iter().map(f64::from).collect(), SampleType::U16)
            },
            NcVariableType::Int(IntType::U8) => {
                let values: Vec<u8> = var.get_values(..)?;
                from_vec(values.into_iter().map(f64::from).collect(), SampleType::U8)
            },
            _ => Err(OdimError::NetCDF(format!(
                "Unsupported field type {:?} for '{}'",
                vartype,
                var.name()
            ))),
        }
    }

    /// Convert a stored attribute to an [`AttrValue`].
    ///
    /// This is the single place where stored strings become text. netCDF
    /// hands `NC_CHAR` and `NC_STRING` back as `Str`; the byte-array variants
    /// are small integers.
    fn attr_value(attr: &netcdf::Attribute<'_>) -> Option<AttrValue> {
        use netcdf::AttributeValue;

        let value = match attr.value().ok()? {
            AttributeValue::Uchar(v) => AttrValue::Int(v.into()),
            AttributeValue::Schar(v) => AttrValue::Int(v.into()),
            AttributeValue::Ushort(v) => AttrValue::Int(v.into()),
            AttributeValue::Short(v) => AttrValue::Int(v.into()),
            AttributeValue::Uint(v) => AttrValue::Int(v.into()),
            AttributeValue::Int(v) => AttrValue::Int(v.into()),
            AttributeValue::Ulonglong(v) => AttrValue::Int(v as i64),
            AttributeValue::Longlong(v) => AttrValue::Int(v),
            AttributeValue::Float(v) => AttrValue::Float(v.into()),
            AttributeValue::Double(v) => AttrValue::Float(v),
            AttributeValue::Str(v) => AttrValue::from_bytes(v.as_bytes()),
            AttributeValue::Uchars(v) => AttrValue::Ints(v.into_iter().map(i64::from).collect()),
            AttributeValue::Schars(v) => AttrValue::Ints(v.into_iter().map(i64::from).collect()),
            AttributeValue::Ushorts(v) => AttrValue::Ints(v.into_iter().map(i64::from).collect()),
            AttributeValue::Shorts(v) => AttrValue::Ints(v.into_iter().map(i64::from).collect()),
            AttributeValue::Uints(v) => AttrValue::Ints(v.into_iter().map(i64::from).collect()),
            AttributeValue::Ints(v) => AttrValue::Ints(v.into_iter().map(i64::from).collect()),
            AttributeValue::Ulonglongs(v) => AttrValue::Ints(v.into_iter().map(|x| x as i64).collect()),
            AttributeValue::Longlongs(v) => AttrValue::Ints(v),
            AttributeValue::Floats(v) => AttrValue::Floats(v.into_iter().map(f64::from).collect()),
            AttributeValue::Doubles(v) => AttrValue::Floats(v),
            AttributeValue::Strs(v) => AttrValue::Texts(v),
        };
        Some(value)
    }
}
