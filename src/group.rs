//! Groups.
//!
//! A group is a node in a hierarchy which is not an array.
//! It can have user-defined attributes and may have child nodes (groups or [`arrays`](crate::array)).
//!
//! An explicit group has its own metadata record:
//!  - Zarr V2: a `.zgroup` marker, with attributes in an accompanying `.zattrs` record, and
//!  - Zarr V3: a `meta/root<path>.group.json` record holding its attributes. For example:
//! ```json
//! {
//!     "attributes": {
//!         "spam": "ham",
//!         "eggs": 42
//!     },
//!     "extensions": []
//! }
//! ```
//!
//! An implicit group has no record and no attributes.
//! Use [`Hierarchy::create_group`](crate::hierarchy::Hierarchy::create_group) to create a group, or [`Hierarchy::get_group`](crate::hierarchy::Hierarchy::get_group) to open one.

use std::sync::Arc;

use crate::{
    hierarchy::{Hierarchy, HierarchyError},
    metadata::{to_json_bytes, Attributes, GroupMetadata, ZarrVersion},
    node::NodePath,
    storage::{
        meta_key_v2_attributes, meta_key_v2_group, meta_key_v3_group, ReadableStorageTraits,
        StorageError, WritableStorageTraits,
    },
};

/// A group.
#[derive(Clone, Debug)]
pub struct Group<TStorage: ?Sized> {
    /// The storage.
    storage: Arc<TStorage>,
    /// The path of the group in a hierarchy.
    path: NodePath,
    /// The metadata generation.
    version: ZarrVersion,
    /// The metadata.
    metadata: GroupMetadata,
}

impl<TStorage: ?Sized> Group<TStorage> {
    /// Create a group in `storage` at `path` with `metadata` of the `version` generation.
    /// This does **not** write to the store, use [`store_metadata`](Group::store_metadata) to write `metadata` to `storage`.
    #[must_use]
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &NodePath,
        version: ZarrVersion,
        metadata: GroupMetadata,
    ) -> Self {
        Self {
            storage,
            path: path.clone(),
            version,
            metadata,
        }
    }

    /// Get path.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the metadata generation.
    #[must_use]
    pub const fn version(&self) -> ZarrVersion {
        self.version
    }

    /// Get attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.metadata.attributes
    }

    /// Get metadata.
    #[must_use]
    pub const fn metadata(&self) -> &GroupMetadata {
        &self.metadata
    }

    /// Mutably borrow the group attributes.
    ///
    /// Changes are persisted with [`store_metadata`](Group::store_metadata).
    #[must_use]
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.metadata.attributes
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> Group<TStorage> {
    /// Create a group in `storage` at `path` of the `version` generation. The metadata is read from the store.
    ///
    /// A group without a metadata record (an implicit group) has empty attributes.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError`] if there is a storage error or any metadata is invalid.
    pub fn open(
        storage: Arc<TStorage>,
        path: &NodePath,
        version: ZarrVersion,
    ) -> Result<Self, HierarchyError> {
        let metadata = Hierarchy::new_with_version(storage.clone(), version)
            .group_metadata(path)?
            .unwrap_or_default();
        Ok(Self::new_with_metadata(storage, path, version, metadata))
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> Group<TStorage> {
    /// Store metadata.
    ///
    /// This makes the group explicit.
    /// In the Zarr V2 generation, attributes are written to a separate `.zattrs` record which is erased if the attributes are empty.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if there is an underlying store error.
    pub fn store_metadata(&self) -> Result<(), StorageError> {
        let bytes = |value: &serde_json::Value| {
            to_json_bytes(value).map_err(|err| StorageError::Other(err.to_string()))
        };
        match self.version {
            ZarrVersion::V2 => {
                self.storage.set(
                    &meta_key_v2_group(&self.path),
                    bytes(&self.metadata.encode(ZarrVersion::V2))?,
                )?;
                let attributes_key = meta_key_v2_attributes(&self.path);
                if self.metadata.attributes.is_empty() {
                    self.storage.erase(&attributes_key)
                } else {
                    self.storage.set(
                        &attributes_key,
                        bytes(&serde_json::Value::Object(self.metadata.attributes.clone()))?,
                    )
                }
            }
            ZarrVersion::V3 => self.storage.set(
                &meta_key_v3_group(&self.path),
                bytes(&self.metadata.encode(ZarrVersion::V3))?,
            ),
        }
    }

    /// Replace the attributes and store the metadata.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if there is an underlying store error.
    pub fn set_attributes(&mut self, attributes: Attributes) -> Result<(), StorageError> {
        self.metadata.attributes = attributes;
        self.store_metadata()
    }
}
