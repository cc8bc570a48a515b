//! Array subsets.
//!
//! An [`ArraySubset`] is a half-open N-dimensional region of an array, used whenever a region of data is read from or written to an array.
//!
//! This module provides convenience functions for:
//!  - finding the chunks overlapped by a subset,
//!  - intersecting subsets, and
//!  - extracting and placing the bytes of a subset within the C-order bytes of an enclosing array.

use std::ops::Range;

use derive_more::Display;
use itertools::izip;
use thiserror::Error;

use crate::array::{ArrayIndices, ArrayShape};

/// An array subset.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Default)]
#[display("start {start:?} shape {shape:?}")]
pub struct ArraySubset {
    /// The start of the array subset.
    start: ArrayIndices,
    /// The shape of the array subset.
    shape: ArrayShape,
}

/// An array extract bytes error.
#[derive(Debug, Error)]
#[error("array subset {_0} is incompatible with array of shape {_1:?} and element size {_2}")]
pub struct ArrayExtractBytesError(ArraySubset, ArrayShape, usize);

/// An array store bytes error.
#[derive(Debug, Error)]
pub enum ArrayStoreBytesError {
    /// Invalid array shape.
    #[error("array shape {_1:?} is incompatible with array subset {_0}")]
    InvalidArrayShape(ArraySubset, ArrayShape),
    /// Invalid subset bytes.
    #[error("expected subset bytes to have length {_1}, got {_0}")]
    InvalidSubsetBytes(usize, usize),
    /// Invalid array bytes.
    #[error("expected array bytes to have length {_1}, got {_0}")]
    InvalidArrayBytes(usize, usize),
}

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

impl ArraySubset {
    /// Create a new array subset with `shape` starting at the origin.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create a new array subset.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `start` and `shape` do not match.
    pub fn new_with_start_shape(
        start: ArrayIndices,
        shape: ArrayShape,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == shape.len() {
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(
                start.len(),
                shape.len(),
            ))
        }
    }

    /// Create a new array subset from a start and end (exclusive).
    ///
    /// An end before the start yields an empty extent in that dimension.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `start` and `end` do not match.
    pub fn new_with_start_end_exc(
        start: ArrayIndices,
        end: ArrayIndices,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == end.len() {
            let shape = std::iter::zip(&start, &end)
                .map(|(start, end)| end.saturating_sub(*start))
                .collect();
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(end.len(), start.len()))
        }
    }

    /// Create a new array subset from a list of [`Range`]s.
    #[must_use]
    pub fn new_with_ranges(ranges: &[Range<u64>]) -> Self {
        let start = ranges.iter().map(|range| range.start).collect();
        let shape = ranges
            .iter()
            .map(|range| range.end.saturating_sub(range.start))
            .collect();
        Self { start, shape }
    }

    /// Return the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Return the shape of the array subset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the end (exclusive) of the array subset.
    ///
    /// An end beyond [`u64::MAX`] saturates.
    #[must_use]
    pub fn end_exc(&self) -> ArrayIndices {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start.saturating_add(*size))
            .collect()
    }

    /// Return the per-dimension ranges of the array subset.
    #[must_use]
    pub fn to_ranges(&self) -> Vec<Range<u64>> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(&start, &size)| start..start.saturating_add(size))
            .collect()
    }

    /// Return the number of elements of the array subset.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape
            .iter()
            .fold(1, |num_elements, size| num_elements.saturating_mul(*size))
    }

    /// Return the number of elements of the array subset as a `usize`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn num_elements_usize(&self) -> usize {
        self.num_elements() as usize
    }

    /// Returns true if the array subset is within the bounds of `array_shape`.
    #[must_use]
    pub fn inbounds(&self, array_shape: &[u64]) -> bool {
        self.dimensionality() == array_shape.len()
            && izip!(&self.start, &self.shape, array_shape).all(|(start, size, shape)| {
                start
                    .checked_add(*size)
                    .is_some_and(|end| end <= *shape)
            })
    }

    /// Return the intersection of this array subset and `subset_other`.
    ///
    /// The intersection is empty in any dimension where the subsets do not overlap.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `subset_other` does not match.
    pub fn overlap(&self, subset_other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        if subset_other.dimensionality() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                subset_other.dimensionality(),
                self.dimensionality(),
            ));
        }
        let (start, end): (Vec<u64>, Vec<u64>) = izip!(
            &self.start,
            self.end_exc(),
            &subset_other.start,
            subset_other.end_exc()
        )
        .map(|(start, end, other_start, other_end)| {
            let start = std::cmp::max(*start, *other_start);
            (start, std::cmp::max(start, std::cmp::min(end, other_end)))
        })
        .unzip();
        Self::new_with_start_end_exc(start, end)
    }

    /// Return this array subset relative to `start`, i.e. with `start` subtracted from its start.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `start` does not match the dimensionality.
    pub fn relative_to(&self, start: &[u64]) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                start.len(),
                self.dimensionality(),
            ));
        }
        Ok(Self {
            start: std::iter::zip(&self.start, start)
                .map(|(start, origin)| start.saturating_sub(*origin))
                .collect(),
            shape: self.shape.clone(),
        })
    }

    /// Returns an iterator over the indices of elements within the subset in C order.
    #[must_use]
    pub fn iter_indices(&self) -> IndicesIterator {
        IndicesIterator::new(self.clone())
    }

    /// Returns an iterator over the grid indices of the chunks with shape `chunk_shape` overlapping the array subset, in C order.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `chunk_shape` does not match the dimensionality.
    pub fn iter_chunks(
        &self,
        chunk_shape: &[std::num::NonZeroU64],
    ) -> Result<IndicesIterator, IncompatibleDimensionalityError> {
        if chunk_shape.len() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                chunk_shape.len(),
                self.dimensionality(),
            ));
        }
        if self.num_elements() == 0 {
            return Ok(IndicesIterator::new(Self::new_with_shape(vec![
                0;
                self.dimensionality()
            ])));
        }
        let (start, end): (Vec<u64>, Vec<u64>) =
            izip!(&self.start, self.end_exc(), chunk_shape)
                .map(|(start, end, chunk_size)| {
                    let chunk_size = chunk_size.get();
                    (start / chunk_size, num::Integer::div_ceil(&end, &chunk_size))
                })
                .unzip();
        Ok(IndicesIterator::new(Self::new_with_start_end_exc(
            start, end,
        )?))
    }

    /// Visit each contiguous run of elements of this subset within an array of shape `array_shape` (C order).
    ///
    /// `f` receives the linearised index of the first element of the run in the array and the run length in elements.
    fn for_each_contiguous_run(&self, array_shape: &[u64], mut f: impl FnMut(u64, u64)) {
        let dimensionality = self.dimensionality();
        let mut run = 1;
        let mut outer = dimensionality;
        while outer > 0 {
            let dim = outer - 1;
            run *= self.shape[dim];
            outer = dim;
            if self.shape[dim] != array_shape[dim] {
                break;
            }
        }
        if run == 0 {
            return;
        }
        let outer_subset = Self {
            start: self.start[..outer].to_vec(),
            shape: self.shape[..outer].to_vec(),
        };
        let mut indices = vec![0; dimensionality];
        indices[outer..].copy_from_slice(&self.start[outer..]);
        for outer_indices in outer_subset.iter_indices() {
            indices[..outer].copy_from_slice(&outer_indices);
            f(ravel_indices(&indices, array_shape), run);
        }
    }

    /// Return the bytes in this array subset from an array with shape `array_shape` and `element_size`.
    ///
    /// # Errors
    /// Returns [`ArrayExtractBytesError`] if the length of `array_shape` does not match the array subset dimensionality,
    /// the array subset is outside of the bounds of `array_shape`, or `bytes` has the wrong length.
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<Vec<u8>, ArrayExtractBytesError> {
        let element_size_u64 = element_size as u64;
        if bytes.len() as u64 != array_shape.iter().product::<u64>() * element_size_u64
            || !self.inbounds(array_shape)
        {
            return Err(ArrayExtractBytesError(
                self.clone(),
                array_shape.to_vec(),
                element_size,
            ));
        }
        let mut bytes_subset = Vec::with_capacity(self.num_elements_usize() * element_size);
        self.for_each_contiguous_run(array_shape, |array_index, contiguous_elements| {
            let byte_offset = (array_index * element_size_u64) as usize;
            let byte_length = (contiguous_elements * element_size_u64) as usize;
            bytes_subset.extend_from_slice(&bytes[byte_offset..byte_offset + byte_length]);
        });
        Ok(bytes_subset)
    }

    /// Store `bytes_subset` into the bytes of an array (`bytes_array`) with shape `array_shape` and `element_size`.
    ///
    /// # Errors
    /// Returns [`ArrayStoreBytesError`] if:
    ///  - the length of `array_shape` does not match the array subset dimensionality or the array subset is outside of the bounds of `array_shape`,
    ///  - the length of `bytes_array` is not compatible with the `array_shape` and `element_size`, or
    ///  - the length of `bytes_subset` is not compatible with the shape of this subset and `element_size`.
    pub fn store_bytes(
        &self,
        bytes_subset: &[u8],
        bytes_array: &mut [u8],
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<(), ArrayStoreBytesError> {
        let element_size_u64 = element_size as u64;
        let expected_subset_size = self.num_elements() * element_size_u64;
        let expected_array_size = array_shape.iter().product::<u64>() * element_size_u64;
        if !self.inbounds(array_shape) {
            return Err(ArrayStoreBytesError::InvalidArrayShape(
                self.clone(),
                array_shape.to_vec(),
            ));
        } else if bytes_subset.len() as u64 != expected_subset_size {
            return Err(ArrayStoreBytesError::InvalidSubsetBytes(
                bytes_subset.len(),
                expected_subset_size as usize,
            ));
        } else if bytes_array.len() as u64 != expected_array_size {
            return Err(ArrayStoreBytesError::InvalidArrayBytes(
                bytes_array.len(),
                expected_array_size as usize,
            ));
        }
        let mut offset = 0;
        self.for_each_contiguous_run(array_shape, |array_index, contiguous_elements| {
            let byte_index = (array_index * element_size_u64) as usize;
            let byte_length = (contiguous_elements * element_size_u64) as usize;
            bytes_array[byte_index..byte_index + byte_length]
                .copy_from_slice(&bytes_subset[offset..offset + byte_length]);
            offset += byte_length;
        });
        Ok(())
    }
}

/// Convert array indices to a linearised index in C order.
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> u64 {
    std::iter::zip(indices, shape).fold(0, |index, (i, s)| index * s + i)
}

/// An iterator over the indices of an array subset in C order.
///
/// A zero dimensional subset has a single (empty) index.
#[derive(Clone, Debug)]
pub struct IndicesIterator {
    subset: ArraySubset,
    next: Option<ArrayIndices>,
}

impl IndicesIterator {
    /// Create a new indices iterator.
    #[must_use]
    pub fn new(subset: ArraySubset) -> Self {
        let next = if subset.num_elements() == 0 {
            None
        } else {
            Some(subset.start.clone())
        };
        Self { subset, next }
    }
}

impl Iterator for IndicesIterator {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let mut next = current.clone();
        for dim in (0..next.len()).rev() {
            next[dim] += 1;
            if next[dim] < self.subset.start[dim].saturating_add(self.subset.shape[dim]) {
                self.next = Some(next);
                break;
            }
            next[dim] = self.subset.start[dim];
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use super::*;

    #[test]
    fn array_subset_basics() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 0..4]);
        assert_eq!(subset.start(), &[1, 0]);
        assert_eq!(subset.shape(), &[2, 4]);
        assert_eq!(subset.end_exc(), vec![3, 4]);
        assert_eq!(subset.num_elements(), 8);
        assert_eq!(subset.to_ranges(), vec![1..3, 0..4]);
        assert!(subset.inbounds(&[3, 4]));
        assert!(!subset.inbounds(&[2, 4]));
        assert!(!subset.inbounds(&[3]));
        assert!(ArraySubset::new_with_start_shape(vec![0], vec![1, 1]).is_err());
        assert_eq!(subset.to_string(), "start [1, 0] shape [2, 4]");
    }

    #[test]
    fn array_subset_end_beyond_u64() {
        let subset = ArraySubset::new_with_start_shape(vec![u64::MAX, 0], vec![1, 2]).unwrap();
        assert!(!subset.inbounds(&[u64::MAX, 2]));
        assert_eq!(subset.end_exc(), vec![u64::MAX, 2]);
        assert_eq!(subset.to_ranges(), vec![u64::MAX..u64::MAX, 0..2]);
        assert_eq!(
            ArraySubset::new_with_shape(vec![u64::MAX, 2]).num_elements(),
            u64::MAX
        );
        let last = ArraySubset::new_with_start_shape(vec![u64::MAX - 1], vec![1]).unwrap();
        assert!(last.inbounds(&[u64::MAX]));
        assert_eq!(last.iter_indices().collect::<Vec<_>>(), vec![vec![u64::MAX - 1]]);
    }

    #[test]
    fn array_subset_overlap() {
        let a = ArraySubset::new_with_ranges(&[0..4, 2..6]);
        let b = ArraySubset::new_with_ranges(&[2..8, 0..3]);
        assert_eq!(
            a.overlap(&b).unwrap(),
            ArraySubset::new_with_ranges(&[2..4, 2..3])
        );
        let c = ArraySubset::new_with_ranges(&[5..8, 0..3]);
        assert_eq!(a.overlap(&c).unwrap().num_elements(), 0);
        assert_eq!(
            b.overlap(&a).unwrap().relative_to(&[2, 2]).unwrap(),
            ArraySubset::new_with_ranges(&[0..2, 0..1])
        );
        assert!(a.overlap(&ArraySubset::new_with_ranges(&[0..1])).is_err());
    }

    #[test]
    fn array_subset_iter_indices() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 5..7]);
        let indices: Vec<_> = subset.iter_indices().collect();
        assert_eq!(
            indices,
            vec![vec![1, 5], vec![1, 6], vec![2, 5], vec![2, 6]]
        );
        assert_eq!(ArraySubset::new_with_shape(vec![]).iter_indices().count(), 1);
        assert_eq!(
            ArraySubset::new_with_shape(vec![2, 0]).iter_indices().count(),
            0
        );
    }

    #[test]
    fn array_subset_iter_chunks() {
        let chunk_shape = [NonZeroU64::new(2).unwrap(), NonZeroU64::new(5).unwrap()];
        let subset = ArraySubset::new_with_ranges(&[1..5, 0..10]);
        let chunks: Vec<_> = subset.iter_chunks(&chunk_shape).unwrap().collect();
        assert_eq!(
            chunks,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![1, 0],
                vec![1, 1],
                vec![2, 0],
                vec![2, 1]
            ]
        );
        let empty = ArraySubset::new_with_ranges(&[1..1, 0..10]);
        assert_eq!(empty.iter_chunks(&chunk_shape).unwrap().count(), 0);
        assert!(subset.iter_chunks(&chunk_shape[..1]).is_err());
    }

    #[test]
    fn array_subset_bytes() {
        let array: Vec<u8> = (0..20).collect();
        let array_shape = [4, 5];
        let subset = ArraySubset::new_with_ranges(&[1..3, 1..4]);
        let bytes = subset.extract_bytes(&array, &array_shape, 1).unwrap();
        assert_eq!(bytes, vec![6, 7, 8, 11, 12, 13]);

        let mut array_out = vec![0u8; 20];
        subset
            .store_bytes(&bytes, &mut array_out, &array_shape, 1)
            .unwrap();
        assert_eq!(array_out[6..9], [6, 7, 8]);
        assert_eq!(array_out[11..14], [11, 12, 13]);
        assert_eq!(array_out.iter().filter(|&&v| v != 0).count(), 6);

        let rows = ArraySubset::new_with_ranges(&[2..4, 0..5]);
        assert_eq!(
            rows.extract_bytes(&array, &array_shape, 1).unwrap(),
            (10..20).collect::<Vec<u8>>()
        );

        let wide: Vec<u8> = (0..40).collect();
        assert_eq!(
            subset.extract_bytes(&wide, &array_shape, 2).unwrap(),
            vec![12, 13, 14, 15, 16, 17, 22, 23, 24, 25, 26, 27]
        );

        assert!(subset.extract_bytes(&array, &[2, 5], 1).is_err());
        assert!(subset
            .store_bytes(&bytes[1..], &mut array_out, &array_shape, 1)
            .is_err());
    }

    #[test]
    fn ravel() {
        assert_eq!(ravel_indices(&[2, 1], &[4, 4]), 9);
        assert_eq!(ravel_indices(&[], &[]), 0);
    }
}
