//! Data node types and structures.

use super::path;
use super::{AttrValue, RawGrid};
use std::collections::BTreeMap;

/// Type of node in the ODIM_H5 hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Root node (file level).
    Root,
    /// Group node.
    Group,
    /// Field node holding a sample grid.
    Field,
}

/// A node in the product tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DataNode {
    /// Node name.
    pub name: String,
    /// Full path to this node.
    pub path: String,
    /// Type of node.
    pub node_type: NodeType,
    /// Attributes, keyed by name.
    pub attributes: BTreeMap<String, AttrValue>,
    /// Child nodes, in natural name order.
    pub children: Vec<DataNode>,
    /// Samples for field nodes.
    pub grid: Option<RawGrid>,
}

impl DataNode {
    /// Create a new data node.
    pub fn new(name: impl Into<String>, path: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            node_type,
            attributes: BTreeMap::new(),
            children: Vec::new(),
            grid: None,
        }
    }

    /// Empty root node.
    pub fn root() -> Self {
        Self::new("", path::ROOT, NodeType::Root)
    }

    /// Detached group; its path is fixed when it is added to a parent.
    pub fn group(name: impl Into<String>) -> Self {
        let name = name.into();
        let path = path::join(path::ROOT, &name);
        Self::new(name, path, NodeType::Group)
    }

    /// Detached field holding `grid`.
    pub fn field(name: impl Into<String>, grid: impl Into<RawGrid>) -> Self {
        let name = name.into();
        let path = path::join(path::ROOT, &name);
        let mut node = Self::new(name, path, NodeType::Field);
        node.grid = Some(grid.into());
        node
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child insertion.
    pub fn with_child(mut self, child: DataNode) -> Self {
        self.add_child(child);
        self
    }

    /// Check if this node is a field.
    pub fn is_field(&self) -> bool {
        self.node_type == NodeType::Field
    }

    /// Check if this node is a group (or root).
    pub fn is_group(&self) -> bool {
        matches!(self.node_type, NodeType::Group | NodeType::Root)
    }

    /// Attribute by name.
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// Set or replace an attribute.
    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    /// Add a child node, replacing any child with the same name.
    ///
    /// The child (and its subtree) is re-pathed under this node.
    pub fn add_child(&mut self, mut child: DataNode) {
        child.rebase(&self.path);
        self.remove_child(&child.name);
        let pos = self
            .children
            .iter()
            .position(|c| path::natural_cmp(&c.name, &child.name).is_gt())
            .unwrap_or(self.children.len());
        self.children.insert(pos, child);
    }

    /// Remove and return the named child.
    pub fn remove_child(&mut self, name: &str) -> Option<DataNode> {
        let pos = self.children.iter().position(|c| c.name == name)?;
        Some(self.children.remove(pos))
    }

    /// Direct child by name.
    pub fn child(&self, name: &str) -> Option<&DataNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Direct child by name, mutably.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut DataNode> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Descendant at `target`, relative to this node.
    ///
    /// Absolute paths are resolved from this node as if it were the root.
    pub fn node_at(&self, target: &str) -> Option<&DataNode> {
        path::segments(target)
            .into_iter()
            .try_fold(self, |node, name| node.child(name))
    }

    /// Descendant at `target`, mutably.
    pub fn node_at_mut(&mut self, target: &str) -> Option<&mut DataNode> {
        path::segments(target)
            .into_iter()
            .try_fold(self, |node, name| node.child_mut(name))
    }

    /// Whether a node exists at `target`.
    pub fn contains(&self, target: &str) -> bool {
        self.node_at(target).is_some()
    }

    /// Descendant group at `target`, creating missing groups on the way.
    ///
    /// Returns `None` if an existing field blocks the path.
    pub fn ensure_group(&mut self, target: &str) -> Option<&mut DataNode> {
        let mut node = self;
        for name in path::segments(target) {
            if node.is_field() {
                return None;
            }
            if node.child(name).is_none() {
                node.add_child(DataNode::group(name));
            }
            node = node.child_mut(name)?;
        }
        if node.is_field() {
            None
        } else {
            Some(node)
        }
    }

    /// Names of the direct children whose names are `stem` followed by an index.
    pub fn numbered_children<'a>(&'a self, stem: &'a str) -> impl Iterator<Item = u64> + 'a {
        self.children.iter().filter_map(move |c| match path::numbered(&c.name) {
            (s, Some(idx)) if s == stem => Some(idx),
            _ => None,
        })
    }

    /// Recompute this subtree's paths for a new parent.
    fn rebase(&mut self, parent_path: &str) {
        self.path = path::join(parent_path, &self.name);
        let own = self.path.clone();
        for child in &mut self.children {
            child.rebase(&own);
        }
    }

    /// Get display name with icon and metadata.
    pub fn display_name(&self) -> String {
        let icon = match self.node_type {
            NodeType::Root => "🏠",
            NodeType::Group => "📂",
            NodeType::Field => "🌡️",
        };

        let name = if self.name.is_empty() { "/" } else { &self.name };

        let suffix = match self.node_type {
            NodeType::Field => match &self.grid {
                Some(grid) => {
                    let dims: Vec<String> = grid.shape().iter().map(|d| d.to_string()).collect();
                    format!(" [{}] {}", dims.join("x"), grid.sample_type.name())
                },
                None => String::new(),
            },
            NodeType::Group | NodeType::Root => {
                format!(" ({})", self.children.len())
            },
        };

        format!("{} {}{}", icon, name, suffix)
    }
}
