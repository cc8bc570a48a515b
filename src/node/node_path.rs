use derive_more::Display;
use thiserror::Error;

use super::{NodeName, NodeNameError};

/// A hierarchy node path.
///
/// A path is `/` for the root, otherwise `/` followed by `/` separated [`NodeName`]s.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct NodePath(String);

/// An invalid node path.
#[derive(Debug, Error)]
#[error("invalid node path {0}")]
pub struct NodePathError(String);

impl NodePath {
    /// Create a new node path from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`NodePathError`] if `path` is not valid according to [`NodePath::validate`()].
    pub fn new(path: &str) -> Result<Self, NodePathError> {
        if Self::validate(path) {
            Ok(Self(path.to_string()))
        } else {
            Err(NodePathError(path.to_string()))
        }
    }

    /// The root node.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Extracts a string slice containing the node path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Validates a path.
    ///
    /// A path always starts with `/`, and a non-root path is a sequence of valid node names each preceded by `/`.
    #[must_use]
    pub fn validate(path: &str) -> bool {
        path.eq("/")
            || path.strip_prefix('/').is_some_and(|path| {
                path.split('/')
                    .all(|name| !name.is_empty() && NodeName::validate(name))
            })
    }

    /// Returns the name of the node.
    #[must_use]
    pub fn name(&self) -> NodeName {
        match self.0.rsplit_once('/') {
            Some((_, name)) if !name.is_empty() => NodeName::new(name).unwrap_or_else(|_| NodeName::root()),
            _ => NodeName::root(),
        }
    }

    /// Returns the path of the parent node, or [`None`] for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) | None => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
        }
    }

    /// Returns the paths of all ancestors of the node, starting from the root.
    #[must_use]
    pub fn ancestors(&self) -> Vec<Self> {
        let mut ancestors = Vec::new();
        let mut parent = self.parent();
        while let Some(path) = parent {
            parent = path.parent();
            ancestors.push(path);
        }
        ancestors.reverse();
        ancestors
    }

    /// Returns the path of the child named `name`.
    ///
    /// # Errors
    /// Returns [`NodeNameError`] if `name` is not a valid non-root node name.
    pub fn child(&self, name: &str) -> Result<Self, NodeNameError> {
        let name = NodeName::new(name)?;
        Ok(if self.is_root() {
            Self(format!("/{name}"))
        } else {
            Self(format!("{}/{name}", self.0))
        })
    }

    /// Returns true if this path is `other` or a descendant of `other`.
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> bool {
        other.is_root()
            || self.0 == other.0
            || self
                .0
                .strip_prefix(other.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Returns the depth of the node, where the root has depth zero.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.0.matches('/').count()
        }
    }
}

impl TryFrom<&str> for NodePath {
    type Error = NodePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}
