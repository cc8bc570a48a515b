//! Storage ([stores](store) and [storage adapters](storage_adapter)).
//!
//! A store is a key/value system used to persist the metadata records and chunks of a hierarchy.
//! For example: an in-memory map or a directory on a filesystem.
//!
//! Keys are `/` delimited strings ([`StoreKey`]) and values are opaque byte sequences ([`Bytes`]).
//! Stores implement some combination of [`ReadableStorageTraits`], [`WritableStorageTraits`], and [`ListableStorageTraits`].
//! A store must replace the value of a key atomically in [`WritableStorageTraits::set`], so that a concurrent reader never observes a partially written value.
//!
//! This module also defines the key layout of the two supported metadata generations.

pub mod storage_adapter;
mod storage_sync;
pub mod store;
mod store_key;
mod store_prefix;

use std::sync::Arc;

use thiserror::Error;

use crate::node::{NodePath, NodePathError};

pub use store_key::{StoreKey, StoreKeyError, StoreKeys};
pub use store_prefix::{StorePrefix, StorePrefixError, StorePrefixes};

pub use self::storage_sync::{
    ListableStorageTraits, ReadableListableStorageTraits, ReadableStorageTraits,
    ReadableWritableListableStorageTraits, ReadableWritableStorageTraits, WritableStorageTraits,
};

/// Bytes stored under a [`StoreKey`].
pub type Bytes = bytes::Bytes;

/// [`Bytes`] which may be absent.
pub type MaybeBytes = Option<Bytes>;

/// [`Arc`] wrapped readable storage.
pub type ReadableStorage = Arc<dyn ReadableStorageTraits>;

/// [`Arc`] wrapped writable storage.
pub type WritableStorage = Arc<dyn WritableStorageTraits>;

/// [`Arc`] wrapped listable storage.
pub type ListableStorage = Arc<dyn ListableStorageTraits>;

/// [`Arc`] wrapped readable and writable storage.
pub type ReadableWritableStorage = Arc<dyn ReadableWritableStorageTraits>;

/// [`Arc`] wrapped readable and listable storage.
pub type ReadableListableStorage = Arc<dyn ReadableListableStorageTraits>;

/// [`Arc`] wrapped readable, writable, and listable storage.
pub type ReadableWritableListableStorage = Arc<dyn ReadableWritableListableStorageTraits>;

/// [`StoreKeys`] and [`StorePrefixes`].
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct StoreKeysPrefixes {
    keys: StoreKeys,
    prefixes: StorePrefixes,
}

impl StoreKeysPrefixes {
    /// Create a new [`StoreKeysPrefixes`].
    #[must_use]
    pub fn new(keys: StoreKeys, prefixes: StorePrefixes) -> Self {
        Self { keys, prefixes }
    }

    /// Returns the keys.
    #[must_use]
    pub const fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    /// Returns the prefixes.
    #[must_use]
    pub const fn prefixes(&self) -> &StorePrefixes {
        &self.prefixes
    }
}

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write operation was attempted on a read only store.
    #[error("a write operation was attempted on a read only store")]
    ReadOnly,
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An invalid store prefix.
    #[error("invalid store prefix {0}")]
    StorePrefixError(#[from] StorePrefixError),
    /// An invalid store key.
    #[error("invalid store key {0}")]
    InvalidStoreKey(#[from] StoreKeyError),
    /// An invalid node path.
    #[error("invalid node path {0}")]
    NodePathError(#[from] NodePathError),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// The key of the Zarr V3 entry point metadata (`zarr.json`).
pub const ENTRY_POINT_KEY_V3: &str = "zarr.json";

const V2_ARRAY: &str = ".zarray";
const V2_GROUP: &str = ".zgroup";
const V2_ATTRIBUTES: &str = ".zattrs";
const V3_ARRAY_SUFFIX: &str = ".array.json";
const V3_GROUP_SUFFIX: &str = ".group.json";

/// Return the key of a file named `metadata_file_name` directly under a Zarr V2 node path.
fn meta_key_any(path: &NodePath, metadata_file_name: &str) -> StoreKey {
    let path = path.as_str();
    if path.eq("/") {
        unsafe { StoreKey::new_unchecked(metadata_file_name.to_string()) }
    } else {
        let path = path.strip_prefix('/').unwrap_or(path);
        unsafe { StoreKey::new_unchecked(format!("{path}/{metadata_file_name}")) }
    }
}

/// Return the Zarr V2 array metadata key (`.zarray`) given a node path.
#[must_use]
pub fn meta_key_v2_array(path: &NodePath) -> StoreKey {
    meta_key_any(path, V2_ARRAY)
}

/// Return the Zarr V2 group metadata key (`.zgroup`) given a node path.
#[must_use]
pub fn meta_key_v2_group(path: &NodePath) -> StoreKey {
    meta_key_any(path, V2_GROUP)
}

/// Return the Zarr V2 user-defined attributes key (`.zattrs`) given a node path.
#[must_use]
pub fn meta_key_v2_attributes(path: &NodePath) -> StoreKey {
    meta_key_any(path, V2_ATTRIBUTES)
}

/// Returns true if `key` is a Zarr V2 array or group metadata key.
#[must_use]
pub fn is_meta_key_v2(key: &StoreKey) -> bool {
    matches!(key.name(), V2_ARRAY | V2_GROUP)
}

/// Return the Zarr V3 entry point key (`zarr.json`).
#[must_use]
pub fn meta_key_v3_entry_point() -> StoreKey {
    unsafe { StoreKey::new_unchecked(ENTRY_POINT_KEY_V3) }
}

/// Return the Zarr V3 array metadata key (`meta/root<path>.array.json`) given a node path.
#[must_use]
pub fn meta_key_v3_array(path: &NodePath) -> StoreKey {
    unsafe { StoreKey::new_unchecked(format!("meta/root{}{V3_ARRAY_SUFFIX}", path_suffix(path))) }
}

/// Return the Zarr V3 group metadata key (`meta/root<path>.group.json`) given a node path.
#[must_use]
pub fn meta_key_v3_group(path: &NodePath) -> StoreKey {
    unsafe { StoreKey::new_unchecked(format!("meta/root{}{V3_GROUP_SUFFIX}", path_suffix(path))) }
}

/// Return the prefix holding the Zarr V3 metadata of all descendants of a node path.
#[must_use]
pub fn meta_prefix_v3(path: &NodePath) -> StorePrefix {
    unsafe { StorePrefix::new_unchecked(format!("meta/root{}/", path_suffix(path))) }
}

/// Return the prefix holding the Zarr V3 chunks of an array at a node path.
#[must_use]
pub fn data_prefix_v3(path: &NodePath) -> StorePrefix {
    unsafe { StorePrefix::new_unchecked(format!("data/root{}/", path_suffix(path))) }
}

/// Return the prefix of a Zarr V2 node path.
#[must_use]
pub fn node_prefix_v2(path: &NodePath) -> StorePrefix {
    let path = path_suffix(path);
    if path.is_empty() {
        StorePrefix::root()
    } else {
        unsafe { StorePrefix::new_unchecked(format!("{}/", &path[1..])) }
    }
}

/// If a Zarr V3 metadata key names a node, return the node name and whether it is an array.
#[must_use]
pub fn node_name_from_meta_key_v3(key: &StoreKey) -> Option<(&str, bool)> {
    let name = key.name();
    if let Some(name) = name.strip_suffix(V3_ARRAY_SUFFIX) {
        Some((name, true))
    } else {
        name.strip_suffix(V3_GROUP_SUFFIX).map(|name| (name, false))
    }
}

/// Return the data key given the chunk prefix of an array and an encoded chunk key.
#[must_use]
pub fn data_key(prefix: &StorePrefix, chunk_key: &str) -> StoreKey {
    unsafe { StoreKey::new_unchecked(format!("{}{chunk_key}", prefix.as_str())) }
}

/// The node path without the root `/`, so that the root maps to an empty string.
fn path_suffix(path: &NodePath) -> &str {
    let path = path.as_str();
    if path.eq("/") {
        ""
    } else {
        path
    }
}
