//! Error types for odimh5.
//!
//! This module provides a unified error handling approach using `thiserror`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for odimh5 operations.
pub type Result<T> = std::result::Result<T, OdimError>;

/// Errors that can occur while reading or restructuring an ODIM_H5 product.
#[derive(Debug, Error)]
pub enum OdimError {
    /// Failed to open a file.
    #[error("Failed to open file: {path}")]
    FileOpen {
        /// Path that could not be opened.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file opened but is not a usable ODIM_H5 product.
    #[error("Cannot open {path} as ODIM_H5: {reason}")]
    Open {
        /// Path of the product.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// Failed to read or write the netCDF/HDF5 container.
    #[error("NetCDF error: {0}")]
    NetCDF(String),

    /// Failed to write the HDF5 container.
    #[error("HDF5 error: {0}")]
    Hdf5(String),

    /// A sample cannot be stored in its field's element type.
    #[error("Value {value} at {path} does not fit sample type {sample_type}")]
    ValueOutOfRange {
        /// Field path.
        path: String,
        /// Offending value.
        value: f64,
        /// Element type of the field.
        sample_type: &'static str,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Node not found in tree.
    #[error("Node not found: {path}")]
    NodeNotFound {
        /// Requested path.
        path: String,
    },

    /// A group was required but the path names a field.
    #[error("Not a group: {path}")]
    NotAGroup {
        /// Offending path.
        path: String,
    },

    /// Target of a copy already exists.
    #[error("Node already exists: {path}")]
    NodeExists {
        /// Existing path.
        path: String,
    },

    /// A required attribute is absent.
    #[error("Missing attribute '{name}' on {path}")]
    MissingAttribute {
        /// Node the attribute was expected on.
        path: String,
        /// Attribute name.
        name: String,
    },

    /// An attribute is present but has the wrong type.
    #[error("Attribute '{name}' on {path} is not {expected}")]
    InvalidAttribute {
        /// Node carrying the attribute.
        path: String,
        /// Attribute name.
        name: String,
        /// Expected kind of value.
        expected: &'static str,
    },

    /// Mutation attempted on a read-only session.
    #[error("Write not permitted: {path} is open read-only")]
    WriteNotPermitted {
        /// Path of the product.
        path: PathBuf,
    },

    /// In-place update with a grid of a different shape.
    #[error("Shape mismatch at {path}: field is {expected:?}, new data is {actual:?}")]
    ShapeMismatch {
        /// Field group path.
        path: String,
        /// Shape of the stored grid.
        expected: Vec<usize>,
        /// Shape of the supplied grid.
        actual: Vec<usize>,
    },

    /// Cartesian-only operation on a polar product.
    #[error("{path} is a polar product, not a Cartesian one")]
    NotCartesian {
        /// Path of the product.
        path: PathBuf,
    },

    /// Malformed georeference description string.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl OdimError {
    /// Create a FileOpen error.
    pub fn file_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileOpen {
            path: path.into(),
            source,
        }
    }

    /// Create an Open error.
    pub fn open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a NodeNotFound error.
    pub fn node_not_found(path: impl Into<String>) -> Self {
        Self::NodeNotFound { path: path.into() }
    }

    /// Create a MissingAttribute error.
    pub fn missing_attribute(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MissingAttribute {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Create an InvalidAttribute error.
    pub fn invalid_attribute(
        path: impl Into<String>,
        name: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::InvalidAttribute {
            path: path.into(),
            name: name.into(),
            expected,
        }
    }
}

impl From<hdf5_metno::Error> for OdimError {
    fn from(err: hdf5_metno::Error) -> Self {
        Self::Hdf5(err.to_string())
    }
}

impl From<netcdf::Error> for OdimError {
    fn from(err: netcdf::Error) -> Self {
        Self::NetCDF(err.to_string())
    }
}
