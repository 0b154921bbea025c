//! Data reading and representation.
//!
//! This module holds the in-memory form of a product (a tree of
//! [`DataNode`]s with typed attributes and sample grids) and the backends that
//! load and store it.

mod attribute;
mod backend;
mod grid;
mod node;
pub mod path;
mod reader;
mod writer;

pub use attribute::AttrValue;
pub use backend::{AccessMode, MemoryBackend, Hdf5Backend, StoreBackend};
pub use grid::{RawGrid, SampleType};
pub use node::{DataNode, NodeType};
pub use reader::DataReader;
pub use writer::DataWriter;
