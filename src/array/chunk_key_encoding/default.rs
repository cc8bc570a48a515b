//! The default chunk key encoding of the Zarr V3 core protocol.

use crate::storage::StoreKey;

use super::{join_indices, ChunkKeyEncodingTraits, ChunkKeySeparator};

/// A `default` chunk key encoding.
///
/// The key for a chunk with grid index (k, j, i, …) is formed by taking the initial prefix `c`, and appending
/// the ASCII decimal string representation of the chunk index within each dimension, separated by the separator character.
/// The prefix alone is the key of the chunk of a zero dimensional array.
#[derive(Debug, Clone)]
pub struct DefaultChunkKeyEncoding {
    separator: ChunkKeySeparator,
}

impl DefaultChunkKeyEncoding {
    /// Create a new `default` chunk key encoding with separator `separator`.
    #[must_use]
    pub const fn new(separator: ChunkKeySeparator) -> Self {
        Self { separator }
    }
}

impl Default for DefaultChunkKeyEncoding {
    /// Create a `default` chunk key encoding with default separator: `/`.
    fn default() -> Self {
        Self {
            separator: ChunkKeySeparator::Slash,
        }
    }
}

impl ChunkKeyEncodingTraits for DefaultChunkKeyEncoding {
    fn separator(&self) -> ChunkKeySeparator {
        self.separator
    }

    fn encode(&self, chunk_grid_indices: &[u64]) -> StoreKey {
        let key = format!("c{}", join_indices(chunk_grid_indices, self.separator));
        unsafe { StoreKey::new_unchecked(key) }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        node::NodePath,
        storage::{data_key, data_prefix_v3},
    };

    use super::*;

    #[test]
    fn slash_nd() {
        let key = DefaultChunkKeyEncoding::default().encode(&[1, 23, 45]);
        assert_eq!(key, StoreKey::new("c1/23/45").unwrap());
        let path = NodePath::new("/arthur/dent").unwrap();
        assert_eq!(
            data_key(&data_prefix_v3(&path), key.as_str()).as_str(),
            "data/root/arthur/dent/c1/23/45"
        );
    }

    #[test]
    fn dot_nd() {
        let key = DefaultChunkKeyEncoding::new(ChunkKeySeparator::Dot).encode(&[1, 23, 45]);
        assert_eq!(key, StoreKey::new("c1.23.45").unwrap());
    }

    #[test]
    fn scalar() {
        let key = DefaultChunkKeyEncoding::default().encode(&[]);
        assert_eq!(key, StoreKey::new("c").unwrap());
    }
}
