//! Hierarchy nodes.
//!
//! A node is an [`Array`](crate::array::Array), an explicit [`Group`](crate::group::Group) with its own metadata record, or an implicit group.
//! An implicit group has no metadata record and exists only because some deeper path holds an array or explicit group.

mod node_name;
mod node_path;

pub use node_name::{NodeName, NodeNameError};
pub use node_path::{NodePath, NodePathError};

use crate::metadata::{ArrayMetadata, GroupMetadata};

/// A resolved hierarchy node.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// An array.
    Array(Box<ArrayMetadata>),
    /// A group with its own metadata record.
    ExplicitGroup(GroupMetadata),
    /// A group without a metadata record, inferred from a deeper array or explicit group.
    ImplicitGroup,
}

impl Node {
    /// Returns true if the node is an array.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns true if the node is an explicit or implicit group.
    #[must_use]
    pub const fn is_group(&self) -> bool {
        !self.is_array()
    }

    /// Returns the user-defined attributes of the node.
    ///
    /// An implicit group has no attributes.
    #[must_use]
    pub fn attributes(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        match self {
            Self::Array(metadata) => Some(&metadata.attributes),
            Self::ExplicitGroup(metadata) => Some(&metadata.attributes),
            Self::ImplicitGroup => None,
        }
    }

    /// Returns a short name of the node type.
    #[must_use]
    pub const fn node_type(&self) -> &'static str {
        match self {
            Self::Array(_) => "array",
            Self::ExplicitGroup(_) => "explicit group",
            Self::ImplicitGroup => "implicit group",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind() {
        let group = Node::ExplicitGroup(GroupMetadata::default());
        assert!(group.is_group());
        assert!(!group.is_array());
        assert_eq!(group.node_type(), "explicit group");
        assert!(group.attributes().is_some_and(serde_json::Map::is_empty));
        assert!(Node::ImplicitGroup.attributes().is_none());
        assert_eq!(Node::ImplicitGroup.node_type(), "implicit group");
    }
}
