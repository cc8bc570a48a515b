use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The layout of elements within each stored chunk.
///
/// Caller facing buffers are always row-major.
/// Chunks of a column-major array are transposed when they are encoded and decoded.
#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, Debug, Display, Default)]
pub enum ArrayOrder {
    /// Row-major order. The last dimension varies fastest.
    #[default]
    C,
    /// Column-major order. The first dimension varies fastest.
    F,
}

/// Reorder the elements of a chunk between row-major and column-major order.
///
/// `shape` is the logical shape of the chunk.
/// If `to_column_major` the input is row-major, otherwise the input is column-major.
///
/// # Errors
/// Returns [`ndarray::ShapeError`] if `bytes` does not hold a chunk of `shape` with `element_size`.
pub(crate) fn transpose_chunk(
    bytes: &[u8],
    shape: &[u64],
    element_size: usize,
    to_column_major: bool,
) -> Result<Vec<u8>, ndarray::ShapeError> {
    let overflow = || ndarray::ShapeError::from_kind(ndarray::ErrorKind::Overflow);
    let mut shape_n = shape
        .iter()
        .map(|&size| usize::try_from(size).map_err(|_| overflow()))
        .collect::<Result<Vec<_>, _>>()?;
    if !to_column_major {
        // column-major bytes are the row-major bytes of the reversed shape
        shape_n.reverse();
    }
    // the trailing axis keeps the bytes of each element together
    shape_n.push(element_size);
    let array = ndarray::ArrayViewD::<u8>::from_shape(shape_n, bytes)?;

    let mut order: Vec<usize> = (0..shape.len()).rev().collect();
    order.push(shape.len());
    Ok(array.permuted_axes(order).iter().copied().collect())
}
