use thiserror::Error;

use crate::{
    array_subset::{
        ArrayExtractBytesError, ArraySubset, ArrayStoreBytesError, IncompatibleDimensionalityError,
    },
    metadata::MetadataError,
    storage::StorageError,
};

use super::{
    chunk_grid::InvalidChunkGridIndicesError, codec::CodecError, data_type::IncompatibleFillValueError,
    ArrayIndices, ArrayShape,
};

/// An array creation error.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    /// A chunk shape with a zero extent.
    #[error("chunk shape {0:?} has a zero extent")]
    InvalidChunkShape(Vec<u64>),
    /// An array shape with a zero extent.
    #[error("array shape {0:?} has a zero extent")]
    ZeroDimension(ArrayShape),
    /// The dimensionality of the chunk shape does not match the array shape.
    #[error("chunk shape dimensionality {0} does not match array dimensionality {1}")]
    ChunkRankMismatch(usize, usize),
    /// A fill value incompatible with the data type.
    #[error(transparent)]
    InvalidFillValue(#[from] IncompatibleFillValueError),
    /// A codec creation error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// Invalid metadata.
    #[error(transparent)]
    MetadataError(#[from] MetadataError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// Missing metadata.
    #[error("array metadata is missing")]
    MissingMetadata,
}

/// Array errors.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// Invalid chunk grid indices.
    #[error(transparent)]
    InvalidChunkGridIndicesError(#[from] InvalidChunkGridIndicesError),
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// An array subset exceeds the array shape.
    #[error("array subset {subset} is out of bounds of array shape {shape:?}")]
    OutOfBounds {
        /// The array subset.
        subset: ArraySubset,
        /// The array shape.
        shape: ArrayShape,
    },
    /// An incompatible chunk subset.
    #[error("chunk subset {_0} is not compatible with chunk {_1:?} with shape {_2:?}")]
    InvalidChunkSubset(ArraySubset, ArrayIndices, ArrayShape),
    /// An unexpected chunk decoded size.
    #[error("got chunk decoded size {_0:?}, expected {_1:?}")]
    UnexpectedChunkDecodedSize(usize, usize),
    /// An unexpected bytes input size.
    #[error("got bytes with size {_0:?}, expected {_1:?}")]
    InvalidBytesInputSize(usize, u64),
    /// Incompatible element size.
    #[error("got element size {_0}, expected {_1}")]
    IncompatibleElementSize(usize, usize),
    /// An error extracting the bytes of a subset.
    #[error(transparent)]
    ExtractBytes(#[from] ArrayExtractBytesError),
    /// An error placing the bytes of a subset.
    #[error(transparent)]
    StoreBytes(#[from] ArrayStoreBytesError),
    /// An error storing metadata.
    #[error(transparent)]
    MetadataError(#[from] serde_json::Error),
    /// A chunk operation failed.
    ///
    /// The chunk indices are those of the first failing chunk in C order.
    #[error("chunk {chunk_indices:?} failed: {source}")]
    ChunkFailed {
        /// The grid indices of the chunk.
        chunk_indices: ArrayIndices,
        /// The error.
        source: Box<ArrayError>,
    },
}

impl ArrayError {
    /// Attach the grid indices of a chunk to an error.
    #[must_use]
    pub fn in_chunk(self, chunk_indices: &[u64]) -> Self {
        match self {
            Self::ChunkFailed { .. } => self,
            err => Self::ChunkFailed {
                chunk_indices: chunk_indices.to_vec(),
                source: Box::new(err),
            },
        }
    }
}
