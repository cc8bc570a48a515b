use derive_more::Display;
use thiserror::Error;

/// A hierarchy node name.
///
/// The root node has the empty name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub struct NodeName(String);

/// An invalid node name.
#[derive(Debug, Error)]
#[error("invalid node name {0}")]
pub struct NodeNameError(String);

impl NodeName {
    /// Create a new node name from `name`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeNameError`] if `name` is not valid according to [`NodeName::validate`()].
    pub fn new(name: &str) -> Result<Self, NodeNameError> {
        if Self::validate(name) && !name.is_empty() {
            Ok(Self(name.to_string()))
        } else {
            Err(NodeNameError(name.to_string()))
        }
    }

    /// The root node name.
    #[must_use]
    pub const fn root() -> Self {
        Self(String::new())
    }

    /// Extracts a string slice containing the node name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a node name.
    ///
    /// The root node name is the empty string. Any other name
    /// - must not include the character `/`, and
    /// - must not be a string composed only of period characters, e.g. `.` or `..`.
    #[must_use]
    pub fn validate(node_name: &str) -> bool {
        node_name.is_empty()
            || (!node_name.contains('/') && !node_name.chars().all(|c| c == '.'))
    }

    /// Indicates if a node has the root node name.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}
