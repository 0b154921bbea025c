//! Navigation and search functionality.
//!
//! This module locates nodes inside a product tree by attribute name and
//! value.

mod search;

pub use search::AttributeIndex;
