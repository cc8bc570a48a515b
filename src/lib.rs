//! `zarrs_lite` is a Rust library for chunked N-dimensional arrays stored in the [Zarr](https://zarr.dev) format.
//!
//! It supports two metadata generations:
//!  - [Zarr V2](https://zarr-specs.readthedocs.io/en/latest/v2/v2.0.html): flat metadata, with an `.zarray` record per array, a `.zgroup` marker per group, and `.zattrs` attributes, and
//!  - Zarr V3 core protocol 3.0: hierarchical metadata rooted at a `zarr.json` entry point, with `meta/root/...` records for arrays and explicit groups, and implicit groups inferred from deeper nodes.
//!
//! The generation is chosen when a [`Hierarchy`](crate::hierarchy::Hierarchy) is created and detected when it is opened.
//!
//! ## Overview
//! - [`storage`]: abstract key-value stores ([`MemoryStore`](crate::storage::store::MemoryStore), [`FilesystemStore`](crate::storage::store::FilesystemStore)) and storage adapters.
//! - [`metadata`]: generation independent array and group metadata, and the records of each generation.
//! - [`hierarchy`]: resolves paths to [`Node`](crate::node::Node)s, and creates, lists, and erases them.
//! - [`array`]: reads and writes chunks and arbitrary regions of an array, with compression through the codec registry in [`array::codec`].
//! - [`config`]: global options such as chunk parallelism and metadata formatting.
//!
//! ## Example
#![cfg_attr(feature = "ndarray", doc = "```rust")]
#![cfg_attr(not(feature = "ndarray"), doc = "```rust,ignore")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use zarrs_lite::array::{ArrayBuilder, DataType, FillValue};
//! use zarrs_lite::array_subset::ArraySubset;
//! use zarrs_lite::hierarchy::Hierarchy;
//! use zarrs_lite::metadata::{CompressorMetadata, ZarrVersion};
//! use zarrs_lite::storage::store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let hierarchy = Hierarchy::create(store, ZarrVersion::V3)?;
//!
//! let mut gzip = serde_json::Map::new();
//! gzip.insert("level".to_string(), 1.into());
//! let mut builder = ArrayBuilder::new(vec![4, 4], DataType::Float64, vec![2, 2], FillValue::from(6.6f64));
//! builder.compressor(Some(CompressorMetadata::new("gzip", gzip)));
//! let array = hierarchy.create_array("/arthur/dent", &builder)?;
//!
//! array.store_array_subset_elements::<f64>(
//!     &ArraySubset::new_with_start_shape(vec![2, 1], vec![1, 1])?,
//!     &[3.0],
//! )?;
//! let data = array.retrieve_array_subset_ndarray::<f64>(&ArraySubset::new_with_shape(vec![4, 4]))?;
//! assert_eq!(data[[2, 1]], 3.0);
//! assert_eq!(data[[0, 0]], 6.6);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Features
//! - `gzip` (default): the `gzip` and `zlib` codecs.
//! - `zstd` (default): the `zstd` codec.
//! - `ndarray` (default): [`ndarray`] retrieve and store methods on [`Array`](crate::array::Array). Column-major chunks are transposed with [`ndarray`] regardless.
//! - `bz2`: the `bz2` codec.
//!
//! ## Licence
//! `zarrs_lite` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs)]

pub mod array;
pub mod array_subset;
pub mod config;
pub mod group;
pub mod hierarchy;
pub mod metadata;
pub mod node;
pub mod plugin;
pub mod storage;
