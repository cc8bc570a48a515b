//! Arrays.
//!
//! An array is a node in a hierarchy used to hold multidimensional array data and associated metadata.
//!
//! Use [`ArrayBuilder`] to setup a new array, or use [`Array::open`] for an existing array.
//! The documentation for [`Array`] details how to interact with arrays.

mod array_builder;
mod array_errors;
mod array_order;
mod array_sync;
pub mod chunk_grid;
pub mod chunk_key_encoding;
mod chunk_shape;
pub mod codec;
pub mod data_type;
mod endianness;
mod fill_value;

use std::sync::Arc;

use thiserror::Error;

pub use self::{
    array_builder::ArrayBuilder,
    array_errors::{ArrayCreateError, ArrayError},
    array_order::ArrayOrder,
    chunk_grid::RegularChunkGrid,
    chunk_key_encoding::{ChunkKeyEncoding, ChunkKeySeparator},
    chunk_shape::ChunkShape,
    codec::Compressor,
    data_type::{
        DataType, Dtype, IncompatibleFillValueError, IncompatibleFillValueMetadataError,
        UnsupportedDataTypeError,
    },
    endianness::{Endianness, NATIVE_ENDIAN},
    fill_value::FillValue,
};

pub(crate) use self::{array_order::transpose_chunk, endianness::reverse_endianness};

use crate::{
    array_subset::ArraySubset,
    metadata::{
        to_json_bytes, ArrayMetadata, Attributes, CompressorMetadata, FillValueMetadata,
        MetadataError, ZarrVersion,
    },
    node::NodePath,
    storage::{
        data_key, data_prefix_v3, meta_key_v2_array, meta_key_v2_attributes, meta_key_v3_array,
        node_prefix_v2, ReadableStorageTraits, StorageError, StoreKey, StorePrefix,
        WritableStorageTraits,
    },
};

/// An ND index to an element in an array.
pub type ArrayIndices = Vec<u64>;

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// An error indicating a shape component was zero.
#[derive(Copy, Clone, Debug, Error)]
#[error("value must be non-zero")]
pub struct NonZeroError;

/// An array.
///
/// ### Metadata
///
/// An array is defined by the following parameters (which are encoded in its metadata record):
///  - **shape**: the length of the array dimensions,
///  - **chunk shape**: the shape of the chunks of its regular chunk grid,
///  - **dtype**: the numerical representation of array elements,
///  - **compressor**: the codec used to compress chunks, if any,
///  - **fill value**: the element value of uninitialised portions of the array,
///  - **order**: the memory layout of elements within a chunk, and
///  - **attributes**: user-defined attributes.
///
/// Only the attributes are mutable after creation.
/// Attribute changes must be written explicitly with [`store_metadata`](Array::store_metadata), or made with [`set_attributes`](Array::set_attributes).
///
/// ### Initialisation
///
/// A *new* array is initialised with an [`ArrayBuilder`], usually through [`Hierarchy::create_array`](crate::hierarchy::Hierarchy::create_array).
/// An *existing* array is initialised with [`Array::open`], its metadata is read from the store.
///
/// ### Methods
///
/// Array operations are divided into several categories based on the traits implemented for the backing [storage](crate::storage):
///  - [`ReadableStorageTraits`]: read array data and metadata
///    - [`retrieve_chunk`](Array::retrieve_chunk)
///    - [`retrieve_chunk_subset`](Array::retrieve_chunk_subset)
///    - [`retrieve_array_subset`](Array::retrieve_array_subset)
///  - [`WritableStorageTraits`]: write array data and metadata
///    - [`store_metadata`](Array::store_metadata)
///    - [`store_chunk`](Array::store_chunk)
///    - [`erase_chunk`](Array::erase_chunk)
///  - [`ReadableWritableStorageTraits`](crate::storage::ReadableWritableStorageTraits): operations requiring both reading and writing
///    - [`store_chunk_subset`](Array::store_chunk_subset)
///    - [`store_array_subset`](Array::store_array_subset)
///
/// Bytes passed to and returned from these methods are the native endian, C order representation of elements.
/// Variants with an `_elements` suffix read and write elements of a known type, and with the `ndarray` feature,
/// variants with an `_ndarray` suffix store or retrieve [`ndarray::ArrayD`]s.
///
/// ### Concurrency
///
/// Chunks are replaced as a whole, so a reader observes either the old or the new content of a chunk if the store sets values atomically.
/// [`store_chunk_subset`](Array::store_chunk_subset) and [`store_array_subset`](Array::store_array_subset) retrieve a chunk, update it, then store it.
/// Chunks are not locked during this process, so concurrent writes to the same chunk race and the last store wins.
#[derive(Debug)]
pub struct Array<TStorage: ?Sized> {
    /// The storage.
    storage: Arc<TStorage>,
    /// The path of the array in a hierarchy.
    path: NodePath,
    /// The metadata generation.
    version: ZarrVersion,
    /// The array metadata.
    metadata: ArrayMetadata,
    /// The chunk grid.
    chunk_grid: RegularChunkGrid,
    /// The mapping from chunk grid cell coordinates to keys relative to the chunk prefix.
    chunk_key_encoding: ChunkKeyEncoding,
    /// The prefix of all chunk keys.
    chunk_prefix: StorePrefix,
    /// The fill value in native endianness.
    fill_value: FillValue,
    /// The compressor.
    compressor: Option<Compressor>,
}

impl<TStorage: ?Sized> Array<TStorage> {
    /// Create an array in `storage` at `path` with `metadata` of the `version` generation.
    /// This does **not** write to the store, use [`store_metadata`](Array::store_metadata) to write `metadata` to `storage`.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if:
    ///  - the shape has a zero extent or a different dimensionality to the chunk shape,
    ///  - the fill value is incompatible with the data type, or
    ///  - the compressor is unsupported or has invalid parameters.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &NodePath,
        version: ZarrVersion,
        metadata: ArrayMetadata,
    ) -> Result<Self, ArrayCreateError> {
        if metadata.shape.len() != metadata.chunk_shape.len() {
            return Err(ArrayCreateError::ChunkRankMismatch(
                metadata.chunk_shape.len(),
                metadata.shape.len(),
            ));
        }
        if metadata.shape.contains(&0) {
            return Err(ArrayCreateError::ZeroDimension(metadata.shape));
        }
        let data_type = metadata.data_type();
        let fill_value = match data_type.fill_value_from_metadata(&metadata.fill_value) {
            Ok(fill_value) => fill_value,
            Err(err) if !crate::config::global_config().validate_fill_value() => {
                log::warn!("{err}, using a zero fill value");
                data_type
                    .fill_value_from_metadata(&FillValueMetadata::Null)
                    .map_err(MetadataError::from)?
            }
            Err(err) => return Err(MetadataError::from(err).into()),
        };
        let compressor = metadata
            .compressor
            .as_ref()
            .map(Compressor::from_metadata)
            .transpose()?;
        let chunk_prefix = match version {
            ZarrVersion::V2 => node_prefix_v2(path),
            ZarrVersion::V3 => data_prefix_v3(path),
        };
        Ok(Self {
            storage,
            path: path.clone(),
            version,
            chunk_grid: RegularChunkGrid::new(metadata.chunk_shape.clone()),
            chunk_key_encoding: ChunkKeyEncoding::for_version(version, metadata.separator),
            chunk_prefix,
            fill_value,
            compressor,
            metadata,
        })
    }

    /// Get the node path.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the metadata generation.
    #[must_use]
    pub const fn version(&self) -> ZarrVersion {
        self.version
    }

    /// Get the array metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ArrayMetadata {
        &self.metadata
    }

    /// Get the array shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.metadata.shape
    }

    /// Get the dimensionality of the array.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.metadata.shape.len()
    }

    /// Get the chunk shape.
    #[must_use]
    pub const fn chunk_shape(&self) -> &ChunkShape {
        &self.metadata.chunk_shape
    }

    /// Get the dtype.
    #[must_use]
    pub const fn dtype(&self) -> &Dtype {
        &self.metadata.dtype
    }

    /// Get the data type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.metadata.dtype.data_type()
    }

    /// Get the compressor metadata.
    #[must_use]
    pub const fn compressor(&self) -> Option<&CompressorMetadata> {
        self.metadata.compressor.as_ref()
    }

    /// Get the fill value in native endianness.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Get the fill value metadata.
    #[must_use]
    pub const fn fill_value_metadata(&self) -> &FillValueMetadata {
        &self.metadata.fill_value
    }

    /// Get the memory layout of chunks.
    #[must_use]
    pub const fn order(&self) -> ArrayOrder {
        self.metadata.order
    }

    /// Get the attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.metadata.attributes
    }

    /// Mutably borrow the array attributes.
    ///
    /// Changes are persisted with [`store_metadata`](Array::store_metadata).
    #[must_use]
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.metadata.attributes
    }

    /// Get the chunk grid.
    #[must_use]
    pub const fn chunk_grid(&self) -> &RegularChunkGrid {
        &self.chunk_grid
    }

    /// Return the shape of the chunk grid (i.e., the number of chunks along each dimension).
    #[must_use]
    pub fn chunk_grid_shape(&self) -> ArrayShape {
        self.chunk_grid.grid_shape(self.shape())
    }

    /// Return the store key of the chunk at `chunk_indices`.
    #[must_use]
    pub fn chunk_key(&self, chunk_indices: &[u64]) -> StoreKey {
        data_key(
            &self.chunk_prefix,
            self.chunk_key_encoding.encode(chunk_indices).as_str(),
        )
    }

    /// Return the array subset of the chunk at `chunk_indices`, at the full chunk shape.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if `chunk_indices` are incompatible with the chunk grid.
    pub fn chunk_subset(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        Ok(self.chunk_grid.subset(chunk_indices, self.shape())?)
    }

    /// Return the array subset of the chunk at `chunk_indices`, bounded by the array shape.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if `chunk_indices` are incompatible with the chunk grid.
    pub fn chunk_subset_bounded(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        Ok(self.chunk_grid.subset_bounded(chunk_indices, self.shape())?)
    }

    /// Return the grid indices of the chunks overlapping `array_subset`, in C order.
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleDimensionality`] if the dimensionality of `array_subset` does not match the array.
    pub fn chunks_in_array_subset(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<Vec<ArrayIndices>, ArrayError> {
        Ok(array_subset.iter_chunks(self.chunk_shape())?.collect())
    }

    /// Check that `array_subset` is within the bounds of the array.
    fn validate_array_subset(&self, array_subset: &ArraySubset) -> Result<(), ArrayError> {
        if array_subset.dimensionality() != self.dimensionality() {
            return Err(crate::array_subset::IncompatibleDimensionalityError::new(
                array_subset.dimensionality(),
                self.dimensionality(),
            )
            .into());
        }
        if !array_subset.inbounds(self.shape()) {
            return Err(ArrayError::OutOfBounds {
                subset: array_subset.clone(),
                shape: self.shape().to_vec(),
            });
        }
        Ok(())
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> Array<TStorage> {
    /// Open an existing array in `storage` at `path` of the `version` generation. The metadata is read from the store.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if there is a storage error, the metadata is missing, or any metadata is invalid.
    pub fn open(
        storage: Arc<TStorage>,
        path: &NodePath,
        version: ZarrVersion,
    ) -> Result<Self, ArrayCreateError> {
        let metadata = match version {
            ZarrVersion::V2 => {
                let array = storage
                    .get(&meta_key_v2_array(path))?
                    .ok_or(ArrayCreateError::MissingMetadata)?;
                let attributes = match storage.get(&meta_key_v2_attributes(path))? {
                    Some(attributes) => serde_json::from_slice(&attributes)
                        .map_err(MetadataError::from)?,
                    None => Attributes::new(),
                };
                let array = serde_json::from_slice(&array).map_err(MetadataError::from)?;
                ArrayMetadata::try_from_v2(array, attributes)?
            }
            ZarrVersion::V3 => {
                let array = storage
                    .get(&meta_key_v3_array(path))?
                    .ok_or(ArrayCreateError::MissingMetadata)?;
                let array = serde_json::from_slice(&array).map_err(MetadataError::from)?;
                ArrayMetadata::try_from_v3(array)?
            }
        };
        Self::new_with_metadata(storage, path, version, metadata)
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> Array<TStorage> {
    /// Store metadata.
    ///
    /// In the Zarr V2 generation, attributes are written to a separate `.zattrs` record which is erased if the attributes are empty.
    ///
    /// # Errors
    /// Returns [`StorageError`] if there is an underlying store error.
    pub fn store_metadata(&self) -> Result<(), StorageError> {
        let bytes = |value: &serde_json::Value| {
            to_json_bytes(value).map_err(|err| StorageError::Other(err.to_string()))
        };
        match self.version {
            ZarrVersion::V2 => {
                self.storage.set(
                    &meta_key_v2_array(&self.path),
                    bytes(&self.metadata.encode(ZarrVersion::V2))?,
                )?;
                let attributes_key = meta_key_v2_attributes(&self.path);
                if self.metadata.attributes.is_empty() {
                    self.storage.erase(&attributes_key)
                } else {
                    self.storage
                        .set(&attributes_key, bytes(&self.metadata.encode_attributes())?)
                }
            }
            ZarrVersion::V3 => self.storage.set(
                &meta_key_v3_array(&self.path),
                bytes(&self.metadata.encode(ZarrVersion::V3))?,
            ),
        }
    }

    /// Replace the attributes and store the metadata.
    ///
    /// # Errors
    /// Returns [`StorageError`] if there is an underlying store error.
    pub fn set_attributes(&mut self, attributes: Attributes) -> Result<(), StorageError> {
        self.metadata.attributes = attributes;
        self.store_metadata()
    }
}

/// Check that the size of `T` matches the element size of `dtype`.
fn validate_element_size<T>(dtype: &Dtype) -> Result<(), ArrayError> {
    if dtype.size() == std::mem::size_of::<T>() {
        Ok(())
    } else {
        Err(ArrayError::IncompatibleElementSize(
            std::mem::size_of::<T>(),
            dtype.size(),
        ))
    }
}

/// Convert native endian bytes to a vector of elements.
fn transmute_from_bytes_vec<T: bytemuck::Pod>(from: Vec<u8>) -> Vec<T> {
    bytemuck::allocation::try_cast_vec(from)
        .unwrap_or_else(|(_, from)| bytemuck::allocation::pod_collect_to_vec(&from))
}

/// Convert elements to their native endian bytes.
fn transmute_to_bytes_vec<T: bytemuck::Pod>(from: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(from).to_vec()
}

#[cfg(feature = "ndarray")]
fn iter_u64_to_usize<'a, I: Iterator<Item = &'a u64>>(iter: I) -> Vec<usize> {
    #[allow(clippy::cast_possible_truncation)]
    iter.map(|v| *v as usize).collect::<Vec<_>>()
}

#[cfg(feature = "ndarray")]
/// Convert a vector of elements to an [`ndarray::ArrayD`].
fn elements_to_ndarray<T>(shape: &[u64], elements: Vec<T>) -> Result<ndarray::ArrayD<T>, ArrayError> {
    let length = elements.len();
    ndarray::ArrayD::<T>::from_shape_vec(iter_u64_to_usize(shape.iter()), elements)
        .map_err(|_| ArrayError::InvalidBytesInputSize(length, shape.iter().product()))
}
