//! The regular chunk grid.
//!
//! A regular chunk grid partitions an array into chunks of a fixed [`ChunkShape`].
//! Chunk `i` along dimension `d` covers the array indices `[i * chunk_shape[d], (i + 1) * chunk_shape[d])`.
//! The last chunk along a dimension may extend beyond the array shape, but is always stored at the full chunk shape.

use thiserror::Error;

use crate::array_subset::ArraySubset;

use super::{ArrayIndices, ArrayShape, ChunkShape};

/// An invalid chunk grid indices error.
#[derive(Clone, Debug, Error)]
#[error("chunk grid indices {_0:?} are not compatible with a chunk grid of shape {_1:?}")]
pub struct InvalidChunkGridIndicesError(ArrayIndices, ArrayShape);

/// A `regular` chunk grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularChunkGrid {
    chunk_shape: ChunkShape,
}

impl RegularChunkGrid {
    /// Create a new regular chunk grid with chunk shape `chunk_shape`.
    #[must_use]
    pub fn new(chunk_shape: ChunkShape) -> Self {
        Self { chunk_shape }
    }

    /// Return the chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &ChunkShape {
        &self.chunk_shape
    }

    /// Return the dimensionality of the grid.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.chunk_shape.len()
    }

    /// The grid shape (i.e. number of chunks along each dimension) of an array with shape `array_shape`.
    ///
    /// The length of `array_shape` must match the dimensionality of the grid.
    #[must_use]
    pub fn grid_shape(&self, array_shape: &[u64]) -> ArrayShape {
        std::iter::zip(array_shape, self.chunk_shape.iter())
            .map(|(a, s)| num::Integer::div_ceil(a, &s.get()))
            .collect()
    }

    /// Returns true if `chunk_indices` are within the grid of an array with shape `array_shape`.
    #[must_use]
    pub fn validate_chunk_indices(&self, chunk_indices: &[u64], array_shape: &[u64]) -> bool {
        chunk_indices.len() == self.dimensionality()
            && array_shape.len() == self.dimensionality()
            && std::iter::zip(chunk_indices, self.grid_shape(array_shape)).all(|(i, n)| *i < n)
    }

    /// The origin of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns [`InvalidChunkGridIndicesError`] if `chunk_indices` are not within the grid of an array with shape `array_shape`.
    pub fn chunk_origin(
        &self,
        chunk_indices: &[u64],
        array_shape: &[u64],
    ) -> Result<ArrayIndices, InvalidChunkGridIndicesError> {
        if self.validate_chunk_indices(chunk_indices, array_shape) {
            Ok(std::iter::zip(chunk_indices, self.chunk_shape.iter())
                .map(|(i, s)| i * s.get())
                .collect())
        } else {
            Err(InvalidChunkGridIndicesError(
                chunk_indices.to_vec(),
                self.grid_shape(array_shape),
            ))
        }
    }

    /// The subset of the array covered by the chunk at `chunk_indices`, at the full chunk shape.
    ///
    /// # Errors
    /// Returns [`InvalidChunkGridIndicesError`] if `chunk_indices` are not within the grid of an array with shape `array_shape`.
    pub fn subset(
        &self,
        chunk_indices: &[u64],
        array_shape: &[u64],
    ) -> Result<ArraySubset, InvalidChunkGridIndicesError> {
        let origin = self.chunk_origin(chunk_indices, array_shape)?;
        Ok(ArraySubset::new_with_start_shape(origin, self.chunk_shape.to_array_shape())
            .unwrap_or_default())
    }

    /// The subset of the array covered by the chunk at `chunk_indices`, clamped to the array shape.
    ///
    /// # Errors
    /// Returns [`InvalidChunkGridIndicesError`] if `chunk_indices` are not within the grid of an array with shape `array_shape`.
    pub fn subset_bounded(
        &self,
        chunk_indices: &[u64],
        array_shape: &[u64],
    ) -> Result<ArraySubset, InvalidChunkGridIndicesError> {
        let subset = self.subset(chunk_indices, array_shape)?;
        Ok(subset
            .overlap(&ArraySubset::new_with_shape(array_shape.to_vec()))
            .unwrap_or(subset))
    }
}
