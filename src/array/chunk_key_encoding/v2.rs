//! The Zarr V2 chunk key encoding.

use crate::storage::StoreKey;

use super::{join_indices, ChunkKeyEncodingTraits, ChunkKeySeparator};

/// A `v2` chunk key encoding.
///
/// The key for a chunk with at least one dimension is formed by joining the ASCII decimal string representation of the chunk index within each dimension with the separator character.
/// The key of the chunk of a zero dimensional array is `0`.
#[derive(Debug, Clone)]
pub struct V2ChunkKeyEncoding {
    separator: ChunkKeySeparator,
}

impl V2ChunkKeyEncoding {
    /// Create a new v2 chunk key encoding with separator `separator`.
    #[must_use]
    pub const fn new(separator: ChunkKeySeparator) -> Self {
        Self { separator }
    }
}

impl Default for V2ChunkKeyEncoding {
    /// Create a v2 chunk key encoding with default separator: `.`.
    fn default() -> Self {
        Self {
            separator: ChunkKeySeparator::Dot,
        }
    }
}

impl ChunkKeyEncodingTraits for V2ChunkKeyEncoding {
    fn separator(&self) -> ChunkKeySeparator {
        self.separator
    }

    fn encode(&self, chunk_grid_indices: &[u64]) -> StoreKey {
        let key = if chunk_grid_indices.is_empty() {
            "0".to_string()
        } else {
            join_indices(chunk_grid_indices, self.separator)
        };
        unsafe { StoreKey::new_unchecked(key) }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        node::NodePath,
        storage::{data_key, node_prefix_v2},
    };

    use super::*;

    #[test]
    fn dot_nd() {
        let key = V2ChunkKeyEncoding::default().encode(&[1, 23, 45]);
        assert_eq!(key, StoreKey::new("1.23.45").unwrap());
        let path = NodePath::new("/arthur/dent").unwrap();
        assert_eq!(
            data_key(&node_prefix_v2(&path), key.as_str()).as_str(),
            "arthur/dent/1.23.45"
        );
        assert_eq!(
            data_key(&node_prefix_v2(&NodePath::root()), key.as_str()).as_str(),
            "1.23.45"
        );
    }

    #[test]
    fn slash_nd() {
        let key = V2ChunkKeyEncoding::new(ChunkKeySeparator::Slash).encode(&[1, 23, 45]);
        assert_eq!(key, StoreKey::new("1/23/45").unwrap());
    }

    #[test]
    fn scalar() {
        assert_eq!(V2ChunkKeyEncoding::default().encode(&[]).as_str(), "0");
    }
}
