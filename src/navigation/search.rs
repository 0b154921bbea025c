//! Attribute lookup over a product tree.

use crate::data::{path, AttrValue, DataNode};

/// Depth-first attribute search.
///
/// Traversal is pre-order below the start node (the start node itself is not
/// inspected), visiting siblings in natural name order. The first hit wins;
/// if a malformed product carries the same attribute on several nodes the
/// result is whatever comes first in that order.
#[derive(Debug)]
pub struct AttributeIndex;

impl AttributeIndex {
    /// Path of the first node whose attribute `name` equals `value`.
    pub fn find_first_path(root: &DataNode, name: &str, value: &AttrValue) -> Option<String> {
        Self::visit(root, &mut |node| {
            node.attr(name)
                .filter(|found| found.matches(value))
                .map(|_| node.path.clone())
        })
    }

    /// Value of the first attribute called `name` anywhere below `root`.
    pub fn find_first_value<'a>(root: &'a DataNode, name: &str) -> Option<&'a AttrValue> {
        Self::visit(root, &mut |node| node.attr(name))
    }

    /// Strip 1 or 2 trailing segments from a match, see [`path::derive_group_path`].
    pub fn derive_group_path(full_path: &str, trim: usize) -> String {
        path::derive_group_path(full_path, trim)
    }

    fn visit<'a, T>(
        node: &'a DataNode,
        check: &mut impl FnMut(&'a DataNode) -> Option<T>,
    ) -> Option<T> {
        for child in &node.children {
            if let Some(hit) = check(child) {
                return Some(hit);
            }
            if let Some(hit) = Self::visit(child, check) {
                return Some(hit);
            }
        }
        None
    }
}
