//! odimh5 - read, georeference, decode and restructure ODIM_H5 radar products.
//!
//! ODIM_H5 products are HDF5 trees: a root `what`/`where`/`how` triplet and
//! numbered `datasetN` groups, each holding numbered `dataN` field groups
//! with a raw sample grid and its decode metadata.
//!
//! # Features
//!
//! - Attribute lookups over the tree (find a quantity, find a sweep by elevation)
//! - Cartesian and polar georeferencing, with a round-trippable description string
//! - Affine decoding of raw grids, with or without nodata/undetect masking
//! - Structural edits that keep `datasetN`/`dataN` numbering contiguous
//!
//! # Example
//!
//! ```ignore
//! use odimh5::{AccessMode, FileSession};
//!
//! let mut session = FileSession::open("pvol.h5", AccessMode::ReadOnly)?;
//! if let Some(dbzh) = session.quantity_at_elevation("DBZH", 0.5) {
//!     let values = dbzh.physical_values();
//!     println!("{} -> {:?}", dbzh.path, values.map(|v| v.shape().to_vec()));
//! }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]
#![deny(unsafe_code)]

pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod navigation;
pub mod quantity;
pub mod session;
pub mod util;

pub use config::{CompressionConfig, SessionConfig};
pub use data::{AccessMode, AttrValue, DataNode, MemoryBackend, Hdf5Backend, RawGrid, StoreBackend};
pub use error::{OdimError, Result};
pub use geo::{GeoReference, Georeference, PolarGeoReference};
pub use navigation::AttributeIndex;
pub use quantity::QuantityRecord;
pub use session::{FileSession, ObjectKind};
