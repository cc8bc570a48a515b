use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    array_subset::ArraySubset,
    config::global_config,
    storage::{ReadableStorageTraits, ReadableWritableStorageTraits, WritableStorageTraits},
};

use super::{
    reverse_endianness, transpose_chunk, transmute_from_bytes_vec, transmute_to_bytes_vec,
    validate_element_size, Array, ArrayError, ArrayIndices, ArrayOrder,
};

#[cfg(feature = "ndarray")]
use super::elements_to_ndarray;

/// Apply `f` to each chunk, in parallel if [parallel chunks](crate::config::Config#parallel-chunks) is enabled.
///
/// Every chunk is processed. The error of the first failing chunk in C order is returned.
fn for_each_chunk<T: Send>(
    chunks: Vec<ArrayIndices>,
    f: impl Fn(&ArrayIndices) -> Result<T, ArrayError> + Send + Sync,
) -> Result<Vec<(ArrayIndices, T)>, ArrayError> {
    let parallel = global_config().parallel_chunks();
    let apply = |chunk_indices: ArrayIndices| {
        let result = f(&chunk_indices);
        (chunk_indices, result)
    };
    let results: Vec<_> = if parallel && chunks.len() > 1 {
        chunks.into_par_iter().map(apply).collect()
    } else {
        chunks.into_iter().map(apply).collect()
    };
    results
        .into_iter()
        .map(|(chunk_indices, result)| match result {
            Ok(value) => Ok((chunk_indices, value)),
            Err(err) => Err(err.in_chunk(&chunk_indices)),
        })
        .collect()
}

impl<TStorage: ?Sized> Array<TStorage> {
    /// The number of bytes of a decoded chunk.
    fn chunk_size_bytes(&self) -> usize {
        #[allow(clippy::cast_possible_truncation)]
        let num_elements = self.chunk_shape().num_elements_u64() as usize;
        num_elements * self.dtype().size()
    }

    /// Encode the native endian, C order bytes of a chunk into its stored representation.
    fn encode_chunk(&self, mut bytes: Vec<u8>) -> Result<Vec<u8>, ArrayError> {
        let element_size = self.dtype().size();
        if self.order() == ArrayOrder::F {
            bytes = transpose_chunk(&bytes, &self.chunk_shape().to_array_shape(), element_size, true)
                .map_err(|_| {
                    ArrayError::InvalidBytesInputSize(bytes.len(), self.chunk_size_bytes() as u64)
                })?;
        }
        if self.dtype().is_byte_swapped() {
            reverse_endianness(&mut bytes, element_size);
        }
        match &self.compressor {
            Some(compressor) => Ok(compressor.encode(bytes)?),
            None => Ok(bytes),
        }
    }

    /// Decode the stored representation of a chunk into native endian, C order bytes.
    fn decode_chunk(&self, encoded: Vec<u8>) -> Result<Vec<u8>, ArrayError> {
        let mut bytes = match &self.compressor {
            Some(compressor) => compressor.decode(encoded)?,
            None => encoded,
        };
        let expected_size = self.chunk_size_bytes();
        if bytes.len() != expected_size {
            return Err(ArrayError::UnexpectedChunkDecodedSize(
                bytes.len(),
                expected_size,
            ));
        }
        let element_size = self.dtype().size();
        if self.dtype().is_byte_swapped() {
            reverse_endianness(&mut bytes, element_size);
        }
        if self.order() == ArrayOrder::F {
            bytes = transpose_chunk(&bytes, &self.chunk_shape().to_array_shape(), element_size, false)
                .map_err(|_| ArrayError::UnexpectedChunkDecodedSize(bytes.len(), expected_size))?;
        }
        Ok(bytes)
    }

    /// Check that `chunk_subset` is within the chunk at `chunk_indices`.
    fn validate_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
    ) -> Result<(), ArrayError> {
        self.chunk_grid.chunk_origin(chunk_indices, self.shape())?;
        let chunk_shape = self.chunk_shape().to_array_shape();
        if chunk_subset.inbounds(&chunk_shape) {
            Ok(())
        } else {
            Err(ArrayError::InvalidChunkSubset(
                chunk_subset.clone(),
                chunk_indices.to_vec(),
                chunk_shape,
            ))
        }
    }

    /// Check that `bytes` holds every element of a subset with `num_elements`.
    fn validate_bytes_size(&self, bytes: &[u8], num_elements: u64) -> Result<(), ArrayError> {
        let expected_size = num_elements * self.dtype().size() as u64;
        if bytes.len() as u64 == expected_size {
            Ok(())
        } else {
            Err(ArrayError::InvalidBytesInputSize(bytes.len(), expected_size))
        }
    }

    /// Returns true if `chunk_subset` covers the whole chunk.
    fn is_whole_chunk(&self, chunk_subset: &ArraySubset) -> bool {
        chunk_subset.start().iter().all(|&i| i == 0)
            && chunk_subset.shape() == self.chunk_shape().to_array_shape()
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> Array<TStorage> {
    /// Read and decode the chunk at `chunk_indices` into its bytes if it exists.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk_if_exists(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Option<Vec<u8>>, ArrayError> {
        self.chunk_grid.chunk_origin(chunk_indices, self.shape())?;
        let key = self.chunk_key(chunk_indices);
        let Some(encoded) = self.storage.get(&key)? else {
            log::trace!("chunk {chunk_indices:?} of {} is absent", self.path);
            return Ok(None);
        };
        log::trace!("retrieved chunk {chunk_indices:?} of {} from {key}", self.path);
        self.decode_chunk(encoded.to_vec()).map(Some)
    }

    /// Read and decode the chunk at `chunk_indices` into its bytes or the fill value if it does not exist.
    ///
    /// The chunk is always returned at the full chunk shape, even if it extends beyond the array shape.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk(&self, chunk_indices: &[u64]) -> Result<Vec<u8>, ArrayError> {
        match self.retrieve_chunk_if_exists(chunk_indices)? {
            Some(chunk) => Ok(chunk),
            None => Ok(self
                .fill_value
                .repeat(self.chunk_size_bytes() / self.dtype().size())),
        }
    }

    /// Read and decode the chunk at `chunk_indices` into a vector of its elements or the fill value if it does not exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the size of `T` does not match the data type size, or
    ///  - a [`retrieve_chunk`](Array::retrieve_chunk) error condition is met.
    pub fn retrieve_chunk_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Vec<T>, ArrayError> {
        validate_element_size::<T>(self.dtype())?;
        let bytes = self.retrieve_chunk(chunk_indices)?;
        Ok(transmute_from_bytes_vec::<T>(bytes))
    }

    #[cfg(feature = "ndarray")]
    /// Read and decode the chunk at `chunk_indices` into an [`ndarray::ArrayD`]. It is filled with the fill value if it does not exist.
    ///
    /// # Errors
    /// See [`Array::retrieve_chunk_elements`].
    pub fn retrieve_chunk_ndarray<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<ndarray::ArrayD<T>, ArrayError> {
        let elements = self.retrieve_chunk_elements::<T>(chunk_indices)?;
        elements_to_ndarray(&self.chunk_shape().to_array_shape(), elements)
    }

    /// Read and decode the `chunk_subset` of the chunk at `chunk_indices` into its bytes.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the chunk indices are invalid,
    ///  - the chunk subset is out of bounds of the chunk,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
    ) -> Result<Vec<u8>, ArrayError> {
        self.validate_chunk_subset(chunk_indices, chunk_subset)?;
        let chunk = self.retrieve_chunk(chunk_indices)?;
        if self.is_whole_chunk(chunk_subset) {
            Ok(chunk)
        } else {
            Ok(chunk_subset.extract_bytes(
                &chunk,
                &self.chunk_shape().to_array_shape(),
                self.dtype().size(),
            )?)
        }
    }

    /// Read and decode the `chunk_subset` of the chunk at `chunk_indices` into its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the size of `T` does not match the data type size, or
    ///  - a [`retrieve_chunk_subset`](Array::retrieve_chunk_subset) error condition is met.
    pub fn retrieve_chunk_subset_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
    ) -> Result<Vec<T>, ArrayError> {
        validate_element_size::<T>(self.dtype())?;
        let bytes = self.retrieve_chunk_subset(chunk_indices, chunk_subset)?;
        Ok(transmute_from_bytes_vec::<T>(bytes))
    }

    #[cfg(feature = "ndarray")]
    /// Read and decode the `chunk_subset` of the chunk at `chunk_indices` into an [`ndarray::ArrayD`].
    ///
    /// # Errors
    /// See [`Array::retrieve_chunk_subset_elements`].
    pub fn retrieve_chunk_subset_ndarray<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
    ) -> Result<ndarray::ArrayD<T>, ArrayError> {
        let elements = self.retrieve_chunk_subset_elements::<T>(chunk_indices, chunk_subset)?;
        elements_to_ndarray(chunk_subset.shape(), elements)
    }

    /// Read and decode the `array_subset` of the array into its bytes.
    ///
    /// Chunks which have not been written are read as the fill value.
    /// Chunks are retrieved in parallel if [parallel chunks](crate::config::Config#parallel-chunks) is enabled.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if:
    ///  - the array subset has the wrong dimensionality or is out of bounds of the array shape,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    ///
    /// A failure in a chunk is reported as [`ArrayError::ChunkFailed`].
    pub fn retrieve_array_subset(&self, array_subset: &ArraySubset) -> Result<Vec<u8>, ArrayError> {
        self.validate_array_subset(array_subset)?;
        let chunks = self.chunks_in_array_subset(array_subset)?;

        if let [chunk_indices] = chunks.as_slice() {
            // Single chunk fast path
            let chunk_subset = self.chunk_subset(chunk_indices)?;
            let array_subset_in_chunk_subset = array_subset.relative_to(chunk_subset.start())?;
            return self
                .retrieve_chunk_subset(chunk_indices, &array_subset_in_chunk_subset)
                .map_err(|err| err.in_chunk(chunk_indices));
        }

        let element_size = self.dtype().size();
        let retrieve_chunk = |chunk_indices: &ArrayIndices| -> Result<_, ArrayError> {
            let chunk_subset = self.chunk_subset(chunk_indices)?;
            let overlap = chunk_subset.overlap(array_subset)?;
            let overlap_in_chunk = overlap.relative_to(chunk_subset.start())?;
            let bytes = self.retrieve_chunk_subset(chunk_indices, &overlap_in_chunk)?;
            Ok((overlap.relative_to(array_subset.start())?, bytes))
        };
        let chunk_bytes = for_each_chunk(chunks, retrieve_chunk)?;

        let mut output = vec![0; array_subset.num_elements_usize() * element_size];
        for (_, (overlap_in_array_subset, bytes)) in chunk_bytes {
            overlap_in_array_subset.store_bytes(
                &bytes,
                &mut output,
                array_subset.shape(),
                element_size,
            )?;
        }
        Ok(output)
    }

    /// Read and decode the `array_subset` of the array into a vector of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the size of `T` does not match the data type size, or
    ///  - a [`retrieve_array_subset`](Array::retrieve_array_subset) error condition is met.
    pub fn retrieve_array_subset_elements<T: bytemuck::Pod>(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<Vec<T>, ArrayError> {
        validate_element_size::<T>(self.dtype())?;
        let bytes = self.retrieve_array_subset(array_subset)?;
        Ok(transmute_from_bytes_vec::<T>(bytes))
    }

    #[cfg(feature = "ndarray")]
    /// Read and decode the `array_subset` of the array into an [`ndarray::ArrayD`].
    ///
    /// # Errors
    /// See [`Array::retrieve_array_subset_elements`].
    pub fn retrieve_array_subset_ndarray<T: bytemuck::Pod>(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ndarray::ArrayD<T>, ArrayError> {
        let elements = self.retrieve_array_subset_elements::<T>(array_subset)?;
        elements_to_ndarray(array_subset.shape(), elements)
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> Array<TStorage> {
    /// Encode `chunk_bytes` and store at `chunk_indices`.
    ///
    /// `chunk_bytes` must hold every element of the chunk at the full chunk shape, even if it extends beyond the array shape.
    /// A chunk equal to the fill value is still stored.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - the length of `chunk_bytes` is not equal to the expected length (the product of the number of elements in the chunk and the data type size in bytes),
    ///  - there is a codec encoding error, or
    ///  - an underlying store error.
    pub fn store_chunk(&self, chunk_indices: &[u64], chunk_bytes: Vec<u8>) -> Result<(), ArrayError> {
        self.chunk_grid.chunk_origin(chunk_indices, self.shape())?;
        self.validate_bytes_size(&chunk_bytes, self.chunk_shape().num_elements_u64())?;
        let encoded = self.encode_chunk(chunk_bytes)?;
        let key = self.chunk_key(chunk_indices);
        log::trace!("storing chunk {chunk_indices:?} of {} at {key}", self.path);
        self.storage.set(&key, encoded.into())?;
        Ok(())
    }

    /// Encode `chunk_elements` and store at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the size of `T` does not match the data type size, or
    ///  - a [`store_chunk`](Array::store_chunk) error condition is met.
    pub fn store_chunk_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
        chunk_elements: &[T],
    ) -> Result<(), ArrayError> {
        validate_element_size::<T>(self.dtype())?;
        self.store_chunk(chunk_indices, transmute_to_bytes_vec(chunk_elements))
    }

    #[cfg(feature = "ndarray")]
    /// Encode `chunk_array` and store at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the shape of the array does not match the chunk shape, or
    ///  - a [`store_chunk_elements`](Array::store_chunk_elements) error condition is met.
    pub fn store_chunk_ndarray<T: bytemuck::Pod, TArray: Into<ndarray::Array<T, D>>, D: ndarray::Dimension>(
        &self,
        chunk_indices: &[u64],
        chunk_array: TArray,
    ) -> Result<(), ArrayError> {
        let chunk_array: ndarray::Array<T, D> = chunk_array.into();
        let chunk_shape = self.chunk_shape().to_array_shape();
        let shape: Vec<u64> = chunk_array.shape().iter().map(|&s| s as u64).collect();
        if shape != chunk_shape {
            return Err(ArrayError::InvalidChunkSubset(
                ArraySubset::new_with_shape(shape),
                chunk_indices.to_vec(),
                chunk_shape,
            ));
        }
        let elements: Vec<T> = chunk_array.iter().copied().collect();
        self.store_chunk_elements(chunk_indices, &elements)
    }

    /// Erase the chunk at `chunk_indices`.
    ///
    /// Succeeds if the chunk does not exist. An erased chunk is read as the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `chunk_indices` are invalid or there is an underlying store error.
    pub fn erase_chunk(&self, chunk_indices: &[u64]) -> Result<(), ArrayError> {
        self.chunk_grid.chunk_origin(chunk_indices, self.shape())?;
        let key = self.chunk_key(chunk_indices);
        log::trace!("erasing chunk {chunk_indices:?} of {} at {key}", self.path);
        self.storage.erase(&key)?;
        Ok(())
    }
}

impl<TStorage: ?Sized + ReadableWritableStorageTraits> Array<TStorage> {
    /// Encode `chunk_subset_bytes` and store in `chunk_subset` of the chunk at `chunk_indices`.
    ///
    /// If `chunk_subset` does not cover the whole chunk, the chunk is retrieved, updated, then stored.
    /// This is not atomic: concurrent writes to the same chunk race and the last store wins.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - `chunk_subset` is out of bounds of the chunk,
    ///  - the length of `chunk_subset_bytes` does not match the expected length (the product of the number of elements in the chunk subset and the data type size in bytes),
    ///  - there is a codec encoding error, or
    ///  - an underlying store error.
    pub fn store_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        chunk_subset_bytes: Vec<u8>,
    ) -> Result<(), ArrayError> {
        self.validate_chunk_subset(chunk_indices, chunk_subset)?;
        self.validate_bytes_size(&chunk_subset_bytes, chunk_subset.num_elements())?;
        if self.is_whole_chunk(chunk_subset) {
            self.store_chunk(chunk_indices, chunk_subset_bytes)
        } else {
            let mut chunk_bytes = self.retrieve_chunk(chunk_indices)?;
            chunk_subset.store_bytes(
                &chunk_subset_bytes,
                &mut chunk_bytes,
                &self.chunk_shape().to_array_shape(),
                self.dtype().size(),
            )?;
            self.store_chunk(chunk_indices, chunk_bytes)
        }
    }

    /// Encode `chunk_subset_elements` and store in `chunk_subset` of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the size of `T` does not match the data type size, or
    ///  - a [`store_chunk_subset`](Array::store_chunk_subset) error condition is met.
    pub fn store_chunk_subset_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        chunk_subset_elements: &[T],
    ) -> Result<(), ArrayError> {
        validate_element_size::<T>(self.dtype())?;
        self.store_chunk_subset(
            chunk_indices,
            chunk_subset,
            transmute_to_bytes_vec(chunk_subset_elements),
        )
    }

    /// Encode `subset_bytes` and store in `array_subset`.
    ///
    /// Chunks which are only partially covered by `array_subset` are retrieved, updated, then stored.
    /// Chunks are stored in parallel if [parallel chunks](crate::config::Config#parallel-chunks) is enabled.
    /// A multi-chunk store is not atomic: if a chunk fails, other chunks may have been updated.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the array subset has the wrong dimensionality or is out of bounds of the array shape,
    ///  - the length of `subset_bytes` does not match the expected length (the product of the number of elements in the array subset and the data type size in bytes),
    ///  - there is a codec encoding error, or
    ///  - an underlying store error.
    ///
    /// A failure in a chunk is reported as [`ArrayError::ChunkFailed`] for the first failing chunk in C order.
    pub fn store_array_subset(
        &self,
        array_subset: &ArraySubset,
        subset_bytes: Vec<u8>,
    ) -> Result<(), ArrayError> {
        self.validate_array_subset(array_subset)?;
        self.validate_bytes_size(&subset_bytes, array_subset.num_elements())?;
        let chunks = self.chunks_in_array_subset(array_subset)?;

        if let [chunk_indices] = chunks.as_slice() {
            // Single chunk fast path
            let chunk_subset = self.chunk_subset(chunk_indices)?;
            let array_subset_in_chunk_subset = array_subset.relative_to(chunk_subset.start())?;
            return self
                .store_chunk_subset(chunk_indices, &array_subset_in_chunk_subset, subset_bytes)
                .map_err(|err| err.in_chunk(chunk_indices));
        }

        let element_size = self.dtype().size();
        let store_chunk = |chunk_indices: &ArrayIndices| -> Result<(), ArrayError> {
            let chunk_subset = self.chunk_subset(chunk_indices)?;
            let overlap = chunk_subset.overlap(array_subset)?;
            let overlap_in_array_subset = overlap.relative_to(array_subset.start())?;
            let chunk_subset_bytes = overlap_in_array_subset.extract_bytes(
                &subset_bytes,
                array_subset.shape(),
                element_size,
            )?;
            let overlap_in_chunk = overlap.relative_to(chunk_subset.start())?;
            self.store_chunk_subset(chunk_indices, &overlap_in_chunk, chunk_subset_bytes)
        };
        for_each_chunk(chunks, store_chunk)?;
        Ok(())
    }

    /// Encode `subset_elements` and store in `array_subset`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the size of `T` does not match the data type size, or
    ///  - a [`store_array_subset`](Array::store_array_subset) error condition is met.
    pub fn store_array_subset_elements<T: bytemuck::Pod>(
        &self,
        array_subset: &ArraySubset,
        subset_elements: &[T],
    ) -> Result<(), ArrayError> {
        validate_element_size::<T>(self.dtype())?;
        self.store_array_subset(array_subset, transmute_to_bytes_vec(subset_elements))
    }

    #[cfg(feature = "ndarray")]
    /// Encode `subset_array` and store in the array subset starting at `subset_start`.
    ///
    /// # Errors
    /// See [`Array::store_array_subset_elements`].
    pub fn store_array_subset_ndarray<T: bytemuck::Pod, TArray: Into<ndarray::Array<T, D>>, D: ndarray::Dimension>(
        &self,
        subset_start: &[u64],
        subset_array: TArray,
    ) -> Result<(), ArrayError> {
        let subset_array: ndarray::Array<T, D> = subset_array.into();
        let subset = ArraySubset::new_with_start_shape(
            subset_start.to_vec(),
            subset_array.shape().iter().map(|&s| s as u64).collect(),
        )?;
        let elements: Vec<T> = subset_array.iter().copied().collect();
        self.store_array_subset_elements(&subset, &elements)
    }
}
