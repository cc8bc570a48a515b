use std::sync::Arc;

use crate::{
    metadata::{ArrayMetadata, Attributes, CompressorMetadata, ZarrVersion},
    node::NodePath,
};

use super::{
    data_type::IncompatibleFillValueError, Array, ArrayCreateError, ArrayOrder, ArrayShape,
    ChunkKeySeparator, ChunkShape, Dtype, FillValue,
};

/// An [`Array`] builder.
///
/// The array builder is initialised from an array shape, dtype, chunk shape, and fill value.
///  - There is no compressor by default, so chunks are stored uncompressed.
///  - The default order is `C`.
///  - The default chunk key separator is `.` for Zarr V2 and `/` for Zarr V3.
///  - Attributes are empty.
///
/// Use the methods in the array builder to change the configuration away from these defaults, and then build the array at a path of some storage with [`ArrayBuilder::build`].
/// Note that [`build`](ArrayBuilder::build) does not modify the store; the array metadata has to be explicitly written with [`Array::store_metadata`].
/// [`Hierarchy::create_array`](crate::hierarchy::Hierarchy::create_array) does both.
///
/// For example:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # use std::sync::Arc;
/// use zarrs_lite::array::{ArrayBuilder, DataType, FillValue};
/// use zarrs_lite::metadata::{CompressorMetadata, ZarrVersion};
/// use zarrs_lite::node::NodePath;
/// # let store = Arc::new(zarrs_lite::storage::store::MemoryStore::new());
/// let mut configuration = serde_json::Map::new();
/// configuration.insert("level".to_string(), 1.into());
/// let array = ArrayBuilder::new(
///     vec![8, 8], // array shape
///     DataType::Float32,
///     vec![4, 4], // regular chunk shape (elements must be non-zero)
///     FillValue::from(f32::NAN),
/// )
/// .compressor(Some(CompressorMetadata::new("gzip", configuration)))
/// .build(store.clone(), &NodePath::new("/group/array")?, ZarrVersion::V3)?;
/// array.store_metadata()?; // write metadata to the store
///
/// // array.store_chunk(...)
/// // array.store_array_subset(...)
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ArrayBuilder {
    /// Array shape.
    pub shape: ArrayShape,
    /// Dtype.
    pub dtype: Dtype,
    /// Chunk shape.
    pub chunk_shape: Vec<u64>,
    /// Fill value.
    pub fill_value: FillValue,
    /// Compressor.
    pub compressor: Option<CompressorMetadata>,
    /// Order.
    pub order: ArrayOrder,
    /// Chunk key separator, or [`None`] for the default of the metadata generation.
    pub separator: Option<ChunkKeySeparator>,
    /// Attributes.
    pub attributes: Attributes,
}

impl ArrayBuilder {
    /// Create a new array builder.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        dtype: impl Into<Dtype>,
        chunk_shape: Vec<u64>,
        fill_value: FillValue,
    ) -> Self {
        Self {
            shape,
            dtype: dtype.into(),
            chunk_shape,
            fill_value,
            compressor: None,
            order: ArrayOrder::default(),
            separator: None,
            attributes: Attributes::default(),
        }
    }

    /// Create a new builder copying the configuration of an existing array.
    #[must_use]
    pub fn from_array<T: ?Sized>(array: &Array<T>) -> Self {
        let mut builder = Self::new(
            array.shape().to_vec(),
            *array.dtype(),
            array.chunk_shape().to_array_shape(),
            array.fill_value().clone(),
        );
        builder
            .compressor(array.compressor().cloned())
            .order(array.order())
            .separator(array.metadata().separator)
            .attributes(array.attributes().clone());
        builder
    }

    /// Set the shape.
    pub fn shape(&mut self, shape: ArrayShape) -> &mut Self {
        self.shape = shape;
        self
    }

    /// Set the dtype.
    pub fn dtype(&mut self, dtype: impl Into<Dtype>) -> &mut Self {
        self.dtype = dtype.into();
        self
    }

    /// Set the chunk shape.
    pub fn chunk_shape(&mut self, chunk_shape: Vec<u64>) -> &mut Self {
        self.chunk_shape = chunk_shape;
        self
    }

    /// Set the fill value.
    pub fn fill_value(&mut self, fill_value: FillValue) -> &mut Self {
        self.fill_value = fill_value;
        self
    }

    /// Set the compressor.
    ///
    /// If left unmodified, chunks are stored uncompressed.
    pub fn compressor(&mut self, compressor: Option<CompressorMetadata>) -> &mut Self {
        self.compressor = compressor;
        self
    }

    /// Set the order of elements within stored chunks.
    ///
    /// If left unmodified, the order is `C`.
    pub fn order(&mut self, order: ArrayOrder) -> &mut Self {
        self.order = order;
        self
    }

    /// Set the chunk key separator.
    ///
    /// If left unmodified, the separator is `.` for Zarr V2 and `/` for Zarr V3.
    pub fn separator(&mut self, separator: ChunkKeySeparator) -> &mut Self {
        self.separator = Some(separator);
        self
    }

    /// Set the user defined attributes.
    ///
    /// If left unmodified, the user defined attributes of the array will be empty.
    pub fn attributes(&mut self, attributes: Attributes) -> &mut Self {
        self.attributes = attributes;
        self
    }

    /// Create the array metadata of the metadata generation `version`.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if the chunk shape has a zero extent, or the fill value is incompatible with the dtype.
    pub fn build_metadata(&self, version: ZarrVersion) -> Result<ArrayMetadata, ArrayCreateError> {
        let chunk_shape = ChunkShape::try_from(&self.chunk_shape)
            .map_err(|_| ArrayCreateError::InvalidChunkShape(self.chunk_shape.clone()))?;
        if self.dtype.size() != self.fill_value.size() {
            return Err(IncompatibleFillValueError::new(
                self.dtype.data_type().to_string(),
                self.fill_value.clone(),
            )
            .into());
        }
        let fill_value = self.dtype.data_type().metadata_fill_value(&self.fill_value)?;
        let separator = self.separator.unwrap_or(match version {
            ZarrVersion::V2 => ChunkKeySeparator::Dot,
            ZarrVersion::V3 => ChunkKeySeparator::Slash,
        });
        Ok(ArrayMetadata {
            shape: self.shape.clone(),
            chunk_shape,
            dtype: self.dtype,
            compressor: self.compressor.clone(),
            fill_value,
            order: self.order,
            separator,
            attributes: self.attributes.clone(),
            filters: None,
        })
    }

    /// Build into an [`Array`].
    ///
    /// # Errors
    ///
    /// Returns [`ArrayCreateError`] if there is an error creating the array.
    /// This can be due to an invalid shape or chunk shape, an incompatible fill value, or an unsupported compressor.
    pub fn build<TStorage: ?Sized>(
        &self,
        storage: Arc<TStorage>,
        path: &NodePath,
        version: ZarrVersion,
    ) -> Result<Array<TStorage>, ArrayCreateError> {
        Array::new_with_metadata(storage, path, version, self.build_metadata(version)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::{array::DataType, storage::store::MemoryStore};

    use super::*;

    #[test]
    fn array_builder() {
        let mut builder = ArrayBuilder::new(vec![8, 8], DataType::Int8, vec![2, 2], FillValue::from(0i8));

        // Coverage
        builder.shape(vec![8, 8]);
        builder.dtype(DataType::Int8);
        builder.chunk_shape(vec![2, 4]);
        builder.fill_value(FillValue::from(1i8));
        builder.order(ArrayOrder::F);

        let mut attributes = Attributes::new();
        attributes.insert("key".to_string(), "value".into());
        builder.attributes(attributes.clone());

        let storage = Arc::new(MemoryStore::new());
        let path = NodePath::new("/array").unwrap();
        let array = builder
            .build(storage.clone(), &path, ZarrVersion::V2)
            .unwrap();
        assert_eq!(array.shape(), &[8, 8]);
        assert_eq!(array.chunk_shape().to_array_shape(), vec![2, 4]);
        assert_eq!(array.fill_value(), &FillValue::from(1i8));
        assert_eq!(array.order(), ArrayOrder::F);
        assert_eq!(array.attributes(), &attributes);
        assert_eq!(array.metadata().separator, ChunkKeySeparator::Dot);

        let builder_copy = ArrayBuilder::from_array(&array);
        let array_copy = builder_copy
            .build(storage, &path, ZarrVersion::V2)
            .unwrap();
        assert_eq!(array.metadata(), array_copy.metadata());
    }

    #[test]
    fn array_builder_separator_default() {
        let builder = ArrayBuilder::new(vec![4], DataType::UInt16, vec![2], FillValue::from(0u16));
        assert_eq!(
            builder.build_metadata(ZarrVersion::V2).unwrap().separator,
            ChunkKeySeparator::Dot
        );
        assert_eq!(
            builder.build_metadata(ZarrVersion::V3).unwrap().separator,
            ChunkKeySeparator::Slash
        );
    }

    #[test]
    fn array_builder_invalid() {
        let storage = Arc::new(MemoryStore::new());
        let path = NodePath::root();

        let builder = ArrayBuilder::new(vec![4, 4], DataType::Float64, vec![2, 0], FillValue::from(0.0f64));
        assert!(matches!(
            builder.build(storage.clone(), &path, ZarrVersion::V3),
            Err(ArrayCreateError::InvalidChunkShape(_))
        ));

        let builder = ArrayBuilder::new(vec![4, 4], DataType::Float64, vec![2], FillValue::from(0.0f64));
        assert!(matches!(
            builder.build(storage.clone(), &path, ZarrVersion::V3),
            Err(ArrayCreateError::ChunkRankMismatch(1, 2))
        ));

        let builder = ArrayBuilder::new(vec![4, 0], DataType::Float64, vec![2, 2], FillValue::from(0.0f64));
        assert!(matches!(
            builder.build(storage.clone(), &path, ZarrVersion::V3),
            Err(ArrayCreateError::ZeroDimension(_))
        ));

        let builder = ArrayBuilder::new(vec![4, 4], DataType::Float64, vec![2, 2], FillValue::from(0.0f32));
        assert!(matches!(
            builder.build(storage, &path, ZarrVersion::V3),
            Err(ArrayCreateError::InvalidFillValue(_))
        ));
    }
}
