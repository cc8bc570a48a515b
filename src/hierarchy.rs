//! Hierarchies.
//!
//! A [`Hierarchy`] is a tree of groups and arrays rooted at `/`, backed by a single store.
//! Its metadata generation ([`ZarrVersion`]) is fixed when it is created or opened, and generations are never mixed within a hierarchy.
//!
//! A path resolves to a [`Node`]:
//!  - [`Node::Array`] or [`Node::ExplicitGroup`] if a metadata record exists at that exact path, or
//!  - [`Node::ImplicitGroup`] if there is no record at the path, but there is a record somewhere below it.
//!
//! The root is always a group, implicit unless an explicit record was written for it.
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # use std::sync::Arc;
//! use zarrs_lite::{hierarchy::Hierarchy, metadata::{Attributes, ZarrVersion}, node::Node};
//! # let store = Arc::new(zarrs_lite::storage::store::MemoryStore::new());
//! let hierarchy = Hierarchy::create(store, ZarrVersion::V3)?;
//! hierarchy.create_group("/marvin/paranoid", Attributes::new())?;
//! assert_eq!(hierarchy.resolve("/marvin")?, Node::ImplicitGroup);
//! # Ok(())
//! # }
//! ```

use std::{collections::BTreeSet, sync::Arc};

use thiserror::Error;

use crate::{
    array::{Array, ArrayBuilder, ArrayCreateError},
    group::Group,
    metadata::{
        to_json_bytes,
        v3::{EntryPointMetadataV3, ZARR_FORMAT_V3},
        ArrayMetadata, Attributes, GroupMetadata, MetadataError, ZarrVersion,
    },
    node::{Node, NodePath, NodePathError},
    storage::{
        data_prefix_v3, is_meta_key_v2, meta_key_v2_array, meta_key_v2_attributes,
        meta_key_v2_group, meta_key_v3_array, meta_key_v3_entry_point, meta_key_v3_group,
        meta_prefix_v3, node_name_from_meta_key_v3, node_prefix_v2,
        ReadableListableStorageTraits, ReadableStorageTraits, ReadableWritableListableStorageTraits,
        StorageError, StoreKey, WritableStorageTraits,
    },
};

/// A hierarchy error.
#[derive(Debug, Error)]
pub enum HierarchyError {
    /// No node exists at a path.
    #[error("node {0} not found")]
    NodeNotFound(NodePath),
    /// A node already exists at a path.
    #[error("node {0} already exists")]
    AlreadyExists(NodePath),
    /// An ancestor of a path is an array.
    #[error("ancestor {0} is an array")]
    AncestorIsArray(NodePath),
    /// The node at a path is not an array.
    #[error("node {0} is not an array")]
    NotAnArray(NodePath),
    /// The node at a path is not a group.
    #[error("node {0} is not a group")]
    NotAGroup(NodePath),
    /// An invalid node path.
    #[error(transparent)]
    InvalidPath(#[from] NodePathError),
    /// Invalid metadata.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    /// A storage error.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// An array creation error.
    #[error(transparent)]
    ArrayCreate(#[from] ArrayCreateError),
}

/// A hierarchy.
#[derive(Debug)]
pub struct Hierarchy<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    version: ZarrVersion,
}

impl<TStorage: ?Sized> Clone for Hierarchy<TStorage> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            version: self.version,
        }
    }
}

impl<TStorage: ?Sized> Hierarchy<TStorage> {
    /// Wrap `storage` holding a hierarchy of the `version` generation without reading or writing anything.
    pub(crate) const fn new_with_version(storage: Arc<TStorage>, version: ZarrVersion) -> Self {
        Self { storage, version }
    }

    /// Get the metadata generation.
    #[must_use]
    pub const fn version(&self) -> ZarrVersion {
        self.version
    }

    /// Get the storage.
    #[must_use]
    pub const fn storage(&self) -> &Arc<TStorage> {
        &self.storage
    }

    fn array_key(&self, path: &NodePath) -> StoreKey {
        match self.version {
            ZarrVersion::V2 => meta_key_v2_array(path),
            ZarrVersion::V3 => meta_key_v3_array(path),
        }
    }

    fn group_key(&self, path: &NodePath) -> StoreKey {
        match self.version {
            ZarrVersion::V2 => meta_key_v2_group(path),
            ZarrVersion::V3 => meta_key_v3_group(path),
        }
    }
}

/// Serialize a metadata record.
fn record_bytes(value: &serde_json::Value) -> Result<bytes::Bytes, StorageError> {
    to_json_bytes(value).map_err(|err| StorageError::Other(err.to_string()))
}

impl<TStorage: ?Sized + WritableStorageTraits> Hierarchy<TStorage> {
    /// Create a new hierarchy of the `version` generation in `storage`.
    ///
    /// This writes the Zarr V3 entry point (`zarr.json`) or the Zarr V2 root group marker (`.zgroup`).
    ///
    /// # Errors
    /// Returns [`HierarchyError`] if there is an underlying store error.
    pub fn create(storage: Arc<TStorage>, version: ZarrVersion) -> Result<Self, HierarchyError> {
        let hierarchy = Self { storage, version };
        match version {
            ZarrVersion::V2 => hierarchy.write_group_marker_v2(&NodePath::root())?,
            ZarrVersion::V3 => {
                let entry_point = serde_json::to_value(EntryPointMetadataV3::default())
                    .map_err(MetadataError::from)?;
                hierarchy
                    .storage
                    .set(&meta_key_v3_entry_point(), record_bytes(&entry_point)?)?;
            }
        }
        log::debug!("created Zarr V{version} hierarchy");
        Ok(hierarchy)
    }

    /// Write a Zarr V2 group marker without touching the attributes of the group.
    fn write_group_marker_v2(&self, path: &NodePath) -> Result<(), StorageError> {
        self.storage.set(
            &meta_key_v2_group(path),
            record_bytes(&GroupMetadata::default().encode(ZarrVersion::V2))?,
        )
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> Hierarchy<TStorage> {
    fn read_record(&self, key: &StoreKey) -> Result<Option<serde_json::Value>, HierarchyError> {
        match self.storage.get(key)? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).map_err(MetadataError::from)?,
            )),
            None => Ok(None),
        }
    }

    /// Read the Zarr V2 attributes of a node, which are empty if the `.zattrs` record is absent.
    fn read_attributes_v2(&self, path: &NodePath) -> Result<Attributes, HierarchyError> {
        match self.read_record(&meta_key_v2_attributes(path))? {
            Some(attributes) => Ok(serde_json::from_value(attributes).map_err(MetadataError::from)?),
            None => Ok(Attributes::new()),
        }
    }

    fn array_metadata(&self, path: &NodePath) -> Result<Option<ArrayMetadata>, HierarchyError> {
        let Some(record) = self.read_record(&self.array_key(path))? else {
            return Ok(None);
        };
        let mut metadata = ArrayMetadata::decode(self.version, record)?;
        if self.version == ZarrVersion::V2 {
            metadata.attributes = self.read_attributes_v2(path)?;
        }
        Ok(Some(metadata))
    }

    /// Read the metadata of the explicit group at `path`, or [`None`] if it has no record.
    pub(crate) fn group_metadata(
        &self,
        path: &NodePath,
    ) -> Result<Option<GroupMetadata>, HierarchyError> {
        let Some(record) = self.read_record(&self.group_key(path))? else {
            return Ok(None);
        };
        let mut metadata = GroupMetadata::decode(self.version, record)?;
        if self.version == ZarrVersion::V2 {
            metadata.attributes = self.read_attributes_v2(path)?;
        }
        Ok(Some(metadata))
    }
}

impl<TStorage: ?Sized + ReadableListableStorageTraits> Hierarchy<TStorage> {
    /// Open an existing hierarchy in `storage`, detecting its metadata generation.
    ///
    /// The hierarchy is Zarr V3 if the store holds an entry point (`zarr.json`), and Zarr V2 if it holds any `.zgroup` or `.zarray` record.
    ///
    /// # Errors
    /// Returns [`HierarchyError::NodeNotFound`] if the store holds no hierarchy, or [`HierarchyError::Metadata`] if the entry point is invalid.
    pub fn open(storage: Arc<TStorage>) -> Result<Self, HierarchyError> {
        let root = NodePath::root();
        let version = if let Some(entry_point) = storage.get(&meta_key_v3_entry_point())? {
            let entry_point: EntryPointMetadataV3 =
                serde_json::from_slice(&entry_point).map_err(MetadataError::from)?;
            if entry_point.zarr_format != ZARR_FORMAT_V3 {
                return Err(MetadataError::UnsupportedZarrFormat(entry_point.zarr_format).into());
            }
            ZarrVersion::V3
        } else if storage.exists(&meta_key_v2_group(&root))?
            || storage.exists(&meta_key_v2_array(&root))?
            || storage.list()?.iter().any(is_meta_key_v2)
        {
            ZarrVersion::V2
        } else {
            return Err(HierarchyError::NodeNotFound(root));
        };
        log::debug!("opened Zarr V{version} hierarchy");
        Ok(Self { storage, version })
    }

    /// Returns true if there is a metadata record strictly below `path`.
    fn has_descendants(&self, path: &NodePath) -> Result<bool, HierarchyError> {
        Ok(match self.version {
            ZarrVersion::V2 => {
                // the records of the node itself are directly under its prefix
                let prefix = node_prefix_v2(path);
                self.storage
                    .list_prefix(&prefix)?
                    .iter()
                    .any(|key| is_meta_key_v2(key) && key.parent() != prefix)
            }
            ZarrVersion::V3 => !self.storage.list_prefix(&meta_prefix_v3(path))?.is_empty(),
        })
    }

    fn resolve_path(&self, path: &NodePath) -> Result<Node, HierarchyError> {
        if let Some(metadata) = self.array_metadata(path)? {
            Ok(Node::Array(Box::new(metadata)))
        } else if let Some(metadata) = self.group_metadata(path)? {
            Ok(Node::ExplicitGroup(metadata))
        } else if path.is_root() || self.has_descendants(path)? {
            Ok(Node::ImplicitGroup)
        } else {
            Err(HierarchyError::NodeNotFound(path.clone()))
        }
    }

    /// Resolve the node at `path`.
    ///
    /// # Errors
    /// Returns [`HierarchyError::NodeNotFound`] if no node exists at `path`, or another [`HierarchyError`] if the path or its metadata is invalid or there is an underlying store error.
    pub fn resolve(&self, path: &str) -> Result<Node, HierarchyError> {
        self.resolve_path(&NodePath::new(path)?)
    }

    /// Open the array at `path`.
    ///
    /// # Errors
    /// Returns [`HierarchyError::NotAnArray`] if the node at `path` is a group, or a [`resolve`](Hierarchy::resolve) error.
    pub fn get_array(&self, path: &str) -> Result<Array<TStorage>, HierarchyError> {
        let path = NodePath::new(path)?;
        match self.resolve_path(&path)? {
            Node::Array(metadata) => Ok(Array::new_with_metadata(
                self.storage.clone(),
                &path,
                self.version,
                *metadata,
            )?),
            Node::ExplicitGroup(_) | Node::ImplicitGroup => Err(HierarchyError::NotAnArray(path)),
        }
    }

    /// Open the group at `path`.
    ///
    /// An implicit group has empty attributes.
    ///
    /// # Errors
    /// Returns [`HierarchyError::NotAGroup`] if the node at `path` is an array, or a [`resolve`](Hierarchy::resolve) error.
    pub fn get_group(&self, path: &str) -> Result<Group<TStorage>, HierarchyError> {
        let path = NodePath::new(path)?;
        let metadata = match self.resolve_path(&path)? {
            Node::ExplicitGroup(metadata) => metadata,
            Node::ImplicitGroup => GroupMetadata::default(),
            Node::Array(_) => return Err(HierarchyError::NotAGroup(path)),
        };
        Ok(Group::new_with_metadata(
            self.storage.clone(),
            &path,
            self.version,
            metadata,
        ))
    }

    /// Returns the immediate children of the node at `path` in name order.
    ///
    /// An array has no children.
    ///
    /// # Errors
    /// Returns a [`resolve`](Hierarchy::resolve) error for the node or any child.
    pub fn children(&self, path: &str) -> Result<Vec<(NodePath, Node)>, HierarchyError> {
        let path = NodePath::new(path)?;
        if self.resolve_path(&path)?.is_array() {
            Ok(Vec::new())
        } else {
            self.children_of(&path)
        }
    }

    fn children_of(&self, path: &NodePath) -> Result<Vec<(NodePath, Node)>, HierarchyError> {
        let names: BTreeSet<String> = match self.version {
            ZarrVersion::V2 => {
                let dir = self.storage.list_dir(&node_prefix_v2(path))?;
                dir.prefixes()
                    .iter()
                    .map(|prefix| prefix.name().to_string())
                    .collect()
            }
            ZarrVersion::V3 => {
                let dir = self.storage.list_dir(&meta_prefix_v3(path))?;
                dir.keys()
                    .iter()
                    .filter_map(|key| node_name_from_meta_key_v3(key).map(|(name, _)| name.to_string()))
                    .chain(dir.prefixes().iter().map(|prefix| prefix.name().to_string()))
                    .collect()
            }
        };

        let mut children = Vec::with_capacity(names.len());
        for name in names {
            let Ok(child_path) = path.child(&name) else {
                continue;
            };
            match self.resolve_path(&child_path) {
                Ok(node) => children.push((child_path, node)),
                Err(HierarchyError::NodeNotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(children)
    }

    /// Returns an indented listing of every node in the hierarchy.
    ///
    /// # Errors
    /// Returns a [`resolve`](Hierarchy::resolve) error for any node.
    pub fn tree(&self) -> Result<String, HierarchyError> {
        let root = NodePath::root();
        let node = self.resolve_path(&root)?;
        let mut tree = String::new();
        self.tree_node(&root, &node, 0, &mut tree)?;
        Ok(tree)
    }

    fn tree_node(
        &self,
        path: &NodePath,
        node: &Node,
        depth: usize,
        tree: &mut String,
    ) -> Result<(), HierarchyError> {
        let name = if path.is_root() {
            "/".to_string()
        } else {
            path.name().to_string()
        };
        let description = match node {
            Node::Array(metadata) => format!("{name} {:?} {}", metadata.shape, metadata.dtype),
            Node::ExplicitGroup(_) | Node::ImplicitGroup => name,
        };
        tree.push_str(&format!("{}{description}\n", "  ".repeat(depth)));
        if node.is_group() {
            for (child_path, child) in self.children_of(path)? {
                self.tree_node(&child_path, &child, depth + 1, tree)?;
            }
        }
        Ok(())
    }
}

impl<TStorage: ?Sized + ReadableWritableListableStorageTraits> Hierarchy<TStorage> {
    /// Check that a node can be created at `path`.
    ///
    /// A group may replace an implicit group, but an array may not.
    fn check_creatable(&self, path: &NodePath, is_group: bool) -> Result<(), HierarchyError> {
        for ancestor in path.ancestors() {
            if self.storage.exists(&self.array_key(&ancestor))? {
                return Err(HierarchyError::AncestorIsArray(ancestor));
            }
        }
        if self.storage.exists(&self.array_key(path))?
            || self.storage.exists(&self.group_key(path))?
            || (!is_group && self.has_descendants(path)?)
        {
            return Err(HierarchyError::AlreadyExists(path.clone()));
        }
        Ok(())
    }

    /// Write Zarr V2 group markers for every ancestor of `path` lacking one.
    fn create_ancestors(&self, path: &NodePath) -> Result<(), HierarchyError> {
        if self.version == ZarrVersion::V2 {
            for ancestor in path.ancestors() {
                if !self.storage.exists(&meta_key_v2_group(&ancestor))? {
                    self.write_group_marker_v2(&ancestor)?;
                }
            }
        }
        Ok(())
    }

    /// Create an array at `path` configured by `builder` and store its metadata.
    ///
    /// # Errors
    /// Returns [`HierarchyError`] if:
    ///  - a node already exists at `path`,
    ///  - an ancestor of `path` is an array,
    ///  - the array configuration is invalid, or
    ///  - there is an underlying store error.
    pub fn create_array(
        &self,
        path: &str,
        builder: &ArrayBuilder,
    ) -> Result<Array<TStorage>, HierarchyError> {
        let path = NodePath::new(path)?;
        self.check_creatable(&path, false)?;
        let array = builder.build(self.storage.clone(), &path, self.version)?;
        self.create_ancestors(&path)?;
        array.store_metadata()?;
        log::debug!(
            "created array {path} with shape {:?} and dtype {}",
            array.shape(),
            array.dtype()
        );
        Ok(array)
    }

    /// Create an explicit group at `path` with `attributes` and store its metadata.
    ///
    /// An implicit group at `path` becomes explicit.
    ///
    /// # Errors
    /// Returns [`HierarchyError`] if:
    ///  - an array or explicit group already exists at `path`,
    ///  - an ancestor of `path` is an array, or
    ///  - there is an underlying store error.
    pub fn create_group(
        &self,
        path: &str,
        attributes: Attributes,
    ) -> Result<Group<TStorage>, HierarchyError> {
        let path = NodePath::new(path)?;
        self.check_creatable(&path, true)?;
        let group = Group::new_with_metadata(
            self.storage.clone(),
            &path,
            self.version,
            GroupMetadata::new(attributes),
        );
        self.create_ancestors(&path)?;
        group.store_metadata()?;
        log::debug!("created group {path}");
        Ok(group)
    }

    /// Erase the node at `path`, its metadata records, and all keys below it.
    ///
    /// Erasing the root erases the whole hierarchy, but the hierarchy remains valid and empty.
    ///
    /// # Errors
    /// Returns [`HierarchyError::NodeNotFound`] if no node exists at `path`, or another [`HierarchyError`] on an underlying store error.
    pub fn erase_node(&self, path: &str) -> Result<(), HierarchyError> {
        let path = NodePath::new(path)?;
        if !(path.is_root()
            || self.storage.exists(&self.array_key(&path))?
            || self.storage.exists(&self.group_key(&path))?
            || self.has_descendants(&path)?)
        {
            return Err(HierarchyError::NodeNotFound(path));
        }
        match self.version {
            ZarrVersion::V2 => {
                self.storage.erase_prefix(&node_prefix_v2(&path))?;
                if path.is_root() {
                    self.write_group_marker_v2(&path)?;
                }
            }
            ZarrVersion::V3 => {
                self.storage.erase(&meta_key_v3_array(&path))?;
                self.storage.erase(&meta_key_v3_group(&path))?;
                self.storage.erase_prefix(&meta_prefix_v3(&path))?;
                self.storage.erase_prefix(&data_prefix_v3(&path))?;
            }
        }
        log::debug!("erased node {path}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        array::{DataType, FillValue},
        storage::{store::MemoryStore, ListableStorageTraits, ReadableWritableListableStorage},
    };

    use super::*;

    fn builder() -> ArrayBuilder {
        ArrayBuilder::new(vec![4, 4], DataType::Float64, vec![2, 2], FillValue::from(6.6f64))
    }

    fn attributes(key: &str, value: serde_json::Value) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert(key.to_string(), value);
        attributes
    }

    #[test]
    fn hierarchy_create_open() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            Hierarchy::open(store.clone()),
            Err(HierarchyError::NodeNotFound(_))
        ));
        Hierarchy::create(store.clone(), ZarrVersion::V3)?;
        assert!(store.get(&StoreKey::new("zarr.json")?)?.is_some());
        assert_eq!(Hierarchy::open(store)?.version(), ZarrVersion::V3);

        let store = Arc::new(MemoryStore::new());
        Hierarchy::create(store.clone(), ZarrVersion::V2)?;
        assert!(store.get(&StoreKey::new(".zgroup")?)?.is_some());
        assert_eq!(Hierarchy::open(store)?.version(), ZarrVersion::V2);
        Ok(())
    }

    #[test]
    fn hierarchy_open_unsupported_format() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        store.set(
            &StoreKey::new("zarr.json")?,
            r#"{"zarr_format": "https://purl.org/zarr/spec/protocol/core/4.0", "metadata_encoding": "json"}"#.into(),
        )?;
        assert!(matches!(
            Hierarchy::open(store),
            Err(HierarchyError::Metadata(MetadataError::UnsupportedZarrFormat(_)))
        ));
        Ok(())
    }

    #[test]
    fn hierarchy_open_v2_without_root_marker() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        store.set(&StoreKey::new("arthur/dent/.zgroup")?, r#"{"zarr_format": 2}"#.into())?;
        let hierarchy = Hierarchy::open(store)?;
        assert_eq!(hierarchy.version(), ZarrVersion::V2);
        assert_eq!(hierarchy.resolve("/")?, Node::ImplicitGroup);
        assert_eq!(hierarchy.resolve("/arthur")?, Node::ImplicitGroup);
        assert!(matches!(
            hierarchy.resolve("/arthur/dent")?,
            Node::ExplicitGroup(_)
        ));
        Ok(())
    }

    #[test]
    fn hierarchy_resolve_v3() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let hierarchy = Hierarchy::create(store, ZarrVersion::V3)?;
        assert_eq!(hierarchy.resolve("/")?, Node::ImplicitGroup);

        hierarchy.create_group("/marvin/paranoid", attributes("depressed", true.into()))?;
        hierarchy.create_array("/marvin/android", &builder())?;
        hierarchy.create_array("/arthur/dent", &builder())?;

        assert_eq!(hierarchy.resolve("/marvin")?, Node::ImplicitGroup);
        assert_eq!(hierarchy.resolve("/arthur")?, Node::ImplicitGroup);
        assert!(hierarchy.resolve("/marvin/android")?.is_array());
        assert_eq!(
            hierarchy.resolve("/marvin/paranoid")?.attributes(),
            Some(&attributes("depressed", true.into()))
        );
        assert!(matches!(
            hierarchy.resolve("/zaphod"),
            Err(HierarchyError::NodeNotFound(_))
        ));

        hierarchy.create_group("/marvin", Attributes::new())?;
        assert!(matches!(
            hierarchy.resolve("/marvin")?,
            Node::ExplicitGroup(_)
        ));
        Ok(())
    }

    #[test]
    fn hierarchy_resolve_v2() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let hierarchy = Hierarchy::create(store.clone(), ZarrVersion::V2)?;
        assert!(matches!(hierarchy.resolve("/")?, Node::ExplicitGroup(_)));

        hierarchy.create_array("/arthur/dent", &builder())?;
        assert!(store.get(&StoreKey::new("arthur/.zgroup")?)?.is_some());
        assert!(matches!(hierarchy.resolve("/arthur")?, Node::ExplicitGroup(_)));
        assert!(hierarchy.resolve("/arthur/dent")?.is_array());
        Ok(())
    }

    #[test]
    fn hierarchy_create_collisions() -> Result<(), Box<dyn std::error::Error>> {
        for version in [ZarrVersion::V2, ZarrVersion::V3] {
            let store = Arc::new(MemoryStore::new());
            let hierarchy = Hierarchy::create(store, version)?;
            hierarchy.create_array("/arthur/dent", &builder())?;
            hierarchy.create_group("/marvin/paranoid", Attributes::new())?;
            assert!(matches!(
                hierarchy.create_array("/arthur/dent", &builder()),
                Err(HierarchyError::AlreadyExists(_))
            ));
            assert!(matches!(
                hierarchy.create_group("/arthur/dent", Attributes::new()),
                Err(HierarchyError::AlreadyExists(_))
            ));
            assert!(matches!(
                hierarchy.create_group("/marvin/paranoid", Attributes::new()),
                Err(HierarchyError::AlreadyExists(_))
            ));
            assert!(matches!(
                hierarchy.create_array("/arthur/dent/towel", &builder()),
                Err(HierarchyError::AncestorIsArray(path)) if path.as_str() == "/arthur/dent"
            ));
            assert!(matches!(
                hierarchy.create_array("/marvin", &builder()),
                Err(HierarchyError::AlreadyExists(_))
            ));
        }
        Ok(())
    }

    #[test]
    fn hierarchy_get_array_group() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let hierarchy = Hierarchy::create(store, ZarrVersion::V3)?;
        hierarchy.create_array("/arthur/dent", &builder())?;
        let array = hierarchy.get_array("/arthur/dent")?;
        assert_eq!(array.shape(), &[4, 4]);
        assert!(hierarchy.get_group("/arthur")?.attributes().is_empty());
        assert!(matches!(
            hierarchy.get_array("/arthur"),
            Err(HierarchyError::NotAnArray(_))
        ));
        assert!(matches!(
            hierarchy.get_group("/arthur/dent"),
            Err(HierarchyError::NotAGroup(_))
        ));
        assert!(matches!(
            hierarchy.get_array("arthur"),
            Err(HierarchyError::InvalidPath(_))
        ));
        Ok(())
    }

    #[test]
    fn hierarchy_children_tree() -> Result<(), Box<dyn std::error::Error>> {
        for version in [ZarrVersion::V2, ZarrVersion::V3] {
            let store = Arc::new(MemoryStore::new());
            let hierarchy = Hierarchy::create(store, version)?;
            hierarchy.create_group("/marvin/paranoid", Attributes::new())?;
            let android = hierarchy.create_array("/marvin/android", &builder())?;
            android.store_chunk_elements::<f64>(&[0, 0], &[1.0; 4])?;
            hierarchy.create_array("/arthur/dent", &builder())?;

            let children: Vec<String> = hierarchy
                .children("/")?
                .into_iter()
                .map(|(path, _)| path.to_string())
                .collect();
            assert_eq!(children, vec!["/arthur", "/marvin"]);
            let children: Vec<String> = hierarchy
                .children("/marvin")?
                .into_iter()
                .map(|(path, _)| path.to_string())
                .collect();
            assert_eq!(children, vec!["/marvin/android", "/marvin/paranoid"]);
            assert!(hierarchy.children("/marvin/android")?.is_empty());

            let dtype = crate::array::Dtype::native(DataType::Float64);
            assert_eq!(
                hierarchy.tree()?,
                format!("/\n  arthur\n    dent [4, 4] {dtype}\n  marvin\n    android [4, 4] {dtype}\n    paranoid\n")
            );
        }
        Ok(())
    }

    #[test]
    fn hierarchy_erase_node() -> Result<(), Box<dyn std::error::Error>> {
        for version in [ZarrVersion::V2, ZarrVersion::V3] {
            let store = Arc::new(MemoryStore::new());
            let hierarchy = Hierarchy::create(store.clone(), version)?;
            let array = hierarchy.create_array("/marvin/android", &builder())?;
            array.store_chunk_elements::<f64>(&[1, 1], &[1.0; 4])?;
            hierarchy.create_group("/marvin/paranoid", Attributes::new())?;

            hierarchy.erase_node("/marvin/android")?;
            assert!(matches!(
                hierarchy.resolve("/marvin/android"),
                Err(HierarchyError::NodeNotFound(_))
            ));
            assert!(store.get(&array.chunk_key(&[1, 1]))?.is_none());
            assert!(hierarchy.resolve("/marvin/paranoid")?.is_group());

            hierarchy.erase_node("/")?;
            assert!(hierarchy.children("/")?.is_empty());
            assert_eq!(Hierarchy::open(store.clone())?.version(), version);
            assert!(matches!(
                hierarchy.erase_node("/marvin"),
                Err(HierarchyError::NodeNotFound(_))
            ));
            assert_eq!(store.list()?.len(), 1);
        }
        Ok(())
    }

    #[test]
    fn hierarchy_dyn_storage() -> Result<(), Box<dyn std::error::Error>> {
        for version in [ZarrVersion::V2, ZarrVersion::V3] {
            let store: ReadableWritableListableStorage = Arc::new(MemoryStore::new());
            let hierarchy = Hierarchy::create(store.clone(), version)?;
            hierarchy.create_group("/marvin", attributes("depressed", true.into()))?;
            let array = hierarchy.create_array("/marvin/android", &builder())?;
            array.store_chunk_elements::<f64>(&[0, 0], &[1.0; 4])?;
            assert!(matches!(
                hierarchy.create_group("/marvin/android/arm", Attributes::new()),
                Err(HierarchyError::AncestorIsArray(_))
            ));

            hierarchy.erase_node("/marvin/android")?;
            assert!(store.get(&array.chunk_key(&[0, 0]))?.is_none());
            assert_eq!(
                Hierarchy::open(store.clone())?.get_group("/marvin")?.attributes(),
                &attributes("depressed", true.into())
            );
        }
        Ok(())
    }

    #[test]
    fn hierarchy_debug_logging()-> Result<(), Box<dyn std::error::Error>> {
        testing_logger::setup();
        let store = Arc::new(MemoryStore::new());
        let hierarchy = Hierarchy::create(store, ZarrVersion::V3)?;
        hierarchy.create_group("/marvin", Attributes::new())?;
        testing_logger::validate(|captured_logs| {
            assert!(captured_logs
                .iter()
                .any(|log| log.level == log::Level::Debug && log.body == "created group /marvin"));
        });
        Ok(())
    }
}
