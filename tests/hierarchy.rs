use std::{error::Error, sync::Arc};

use zarrs_lite::{
    array::{ArrayBuilder, DataType, FillValue},
    hierarchy::{Hierarchy, HierarchyError},
    metadata::{Attributes, ZarrVersion},
    node::Node,
    storage::{
        storage_adapter::UsageLogStorageAdapter,
        store::{FilesystemStore, MemoryStore},
        ReadableWritableListableStorageTraits, StoreKey, WritableStorageTraits,
    },
};

fn android_builder() -> ArrayBuilder {
    ArrayBuilder::new(vec![10, 10], DataType::UInt8, vec![5, 5], FillValue::from(0u8))
}

fn build_hierarchy<TStorage: ?Sized + ReadableWritableListableStorageTraits + 'static>(
    store: Arc<TStorage>,
    version: ZarrVersion,
) -> Result<Hierarchy<TStorage>, HierarchyError> {
    let hierarchy = Hierarchy::create(store, version)?;
    let mut attributes = Attributes::new();
    attributes.insert("depressed".to_string(), true.into());
    hierarchy.create_group("/marvin/paranoid", attributes)?;
    hierarchy.create_array("/marvin/android", &android_builder())?;
    hierarchy.create_array("/arthur/dent", &android_builder())?;
    Ok(hierarchy)
}

fn node_types<TStorage: ?Sized + ReadableWritableListableStorageTraits>(
    hierarchy: &Hierarchy<TStorage>,
    path: &str,
) -> Result<Vec<(String, &'static str)>, HierarchyError> {
    Ok(hierarchy
        .children(path)?
        .into_iter()
        .map(|(path, node)| (path.to_string(), node.node_type()))
        .collect())
}

#[test]
fn hierarchy_classification_v3() -> Result<(), Box<dyn Error>> {
    let hierarchy = build_hierarchy(Arc::new(MemoryStore::new()), ZarrVersion::V3)?;
    assert_eq!(
        node_types(&hierarchy, "/")?,
        vec![
            ("/arthur".to_string(), "implicit group"),
            ("/marvin".to_string(), "implicit group"),
        ]
    );
    assert_eq!(
        node_types(&hierarchy, "/marvin")?,
        vec![
            ("/marvin/android".to_string(), "array"),
            ("/marvin/paranoid".to_string(), "explicit group"),
        ]
    );
    assert_eq!(
        node_types(&hierarchy, "/arthur")?,
        vec![("/arthur/dent".to_string(), "array")]
    );
    assert_eq!(hierarchy.resolve("/")?, Node::ImplicitGroup);
    Ok(())
}

#[test]
fn hierarchy_classification_v2() -> Result<(), Box<dyn Error>> {
    let hierarchy = build_hierarchy(Arc::new(MemoryStore::new()), ZarrVersion::V2)?;
    // Zarr V2 has no implicit groups, every ancestor gets a marker
    assert_eq!(
        node_types(&hierarchy, "/")?,
        vec![
            ("/arthur".to_string(), "explicit group"),
            ("/marvin".to_string(), "explicit group"),
        ]
    );
    assert_eq!(
        node_types(&hierarchy, "/marvin")?,
        vec![
            ("/marvin/android".to_string(), "array"),
            ("/marvin/paranoid".to_string(), "explicit group"),
        ]
    );
    assert_eq!(
        hierarchy
            .get_group("/marvin/paranoid")?
            .attributes()
            .get("depressed"),
        Some(&true.into())
    );
    Ok(())
}

#[test]
fn hierarchy_filesystem_reopen() -> Result<(), Box<dyn Error>> {
    for version in [ZarrVersion::V2, ZarrVersion::V3] {
        let path = tempfile::TempDir::new()?;
        let store = Arc::new(FilesystemStore::new(path.path())?);
        let tree = build_hierarchy(store, version)?.tree()?;

        let store = Arc::new(FilesystemStore::new(path.path())?);
        let hierarchy = Hierarchy::open(store)?;
        assert_eq!(hierarchy.version(), version);
        assert_eq!(hierarchy.tree()?, tree);
        assert!(hierarchy.resolve("/arthur/dent")?.is_array());
    }
    Ok(())
}

#[test]
fn hierarchy_open_empty() -> Result<(), Box<dyn Error>> {
    let path = tempfile::TempDir::new()?;
    let store = Arc::new(FilesystemStore::new(path.path())?);
    assert!(matches!(
        Hierarchy::open(store),
        Err(HierarchyError::NodeNotFound(_))
    ));
    Ok(())
}

#[test]
fn hierarchy_invalid_metadata() -> Result<(), Box<dyn Error>> {
    let store = Arc::new(MemoryStore::new());
    let hierarchy = Hierarchy::create(store.clone(), ZarrVersion::V3)?;
    store.set(
        &StoreKey::new("meta/root/broken.array.json")?,
        r#"{"shape": [10]}"#.into(),
    )?;
    assert!(matches!(
        hierarchy.resolve("/broken"),
        Err(HierarchyError::Metadata(_))
    ));
    assert!(matches!(
        hierarchy.children("/"),
        Err(HierarchyError::Metadata(_))
    ));
    Ok(())
}

#[test]
fn hierarchy_usage_log() -> Result<(), Box<dyn Error>> {
    testing_logger::setup();
    let store = Arc::new(UsageLogStorageAdapter::new(
        Arc::new(MemoryStore::new()),
        log::Level::Info,
    ));
    let hierarchy = Hierarchy::create(store, ZarrVersion::V3)?;
    hierarchy.create_array("/arthur/dent", &android_builder())?;
    testing_logger::validate(|captured_logs| {
        let storage_logs: Vec<&str> = captured_logs
            .iter()
            .filter(|log| log.target == "zarrs_lite::storage")
            .map(|log| log.body.as_str())
            .collect();
        assert!(storage_logs
            .iter()
            .any(|body| body.starts_with("set(zarr.json")));
        assert!(storage_logs
            .iter()
            .any(|body| body.starts_with("set(meta/root/arthur/dent.array.json")));
    });
    Ok(())
}
