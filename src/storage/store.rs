//! Stores.
//!
//! - [`MemoryStore`]: an in-memory store.
//! - [`FilesystemStore`]: a store backed by a directory on a local filesystem.

mod filesystem_store;
mod memory_store;

pub use filesystem_store::{FilesystemStore, FilesystemStoreCreateError};
pub use memory_store::MemoryStore;

#[cfg(test)]
mod test_util {
    use std::error::Error;

    use crate::storage::{
        ListableStorageTraits, ReadableStorageTraits, StoreKey, StorePrefix, WritableStorageTraits,
    };

    fn key(key: &str) -> Result<StoreKey, Box<dyn Error>> {
        Ok(StoreKey::new(key)?)
    }

    /// Populate a store with the records and chunks of a small Zarr V3 hierarchy
    /// ```text
    /// zarr.json
    /// meta/root/marvin.group.json
    /// meta/root/marvin/android.array.json
    /// data/root/marvin/android/c0/0   [0, 1, 2, 3]
    /// data/root/marvin/android/c0/1   [4]
    /// data/root/marvin/android/c1/0   []
    /// ```
    pub fn store_write<T: WritableStorageTraits>(store: &T) -> Result<(), Box<dyn Error>> {
        store.erase_prefix(&StorePrefix::root())?;

        store.set(&key("zarr.json")?, "{}".into())?;
        store.set(&key("meta/root/marvin.group.json")?, "{}".into())?;
        store.set(&key("meta/root/marvin/android.array.json")?, "{}".into())?;
        store.set(&key("data/root/marvin/android/c0/0")?, vec![9, 9].into())?;
        store.set(&key("data/root/marvin/android/c0/0")?, vec![0, 1, 2, 3].into())?;
        store.set(&key("data/root/marvin/android/c0/1")?, vec![4].into())?;
        store.set(&key("data/root/marvin/android/c1/0")?, vec![].into())?;

        // Erasing is idempotent
        store.set(&key("data/root/marvin/android/c9/9")?, vec![].into())?;
        store.erase(&key("data/root/marvin/android/c9/9")?)?;
        store.erase(&key("data/root/marvin/android/c9/9")?)?;

        store.set(&key("meta/root/zaphod.array.json")?, "{}".into())?;
        store.set(&key("meta/root/trillian.group.json")?, "{}".into())?;
        store.erase_values(&[key("meta/root/zaphod.array.json")?, key("meta/root/trillian.group.json")?])?;

        store.set(&key("data/root/zaphod/c0")?, vec![].into())?;
        store.set(&key("data/root/zaphod/c1")?, vec![].into())?;
        store.erase_prefix(&StorePrefix::new("data/root/zaphod/")?)?;

        Ok(())
    }

    pub fn store_read<T: ReadableStorageTraits>(store: &T) -> Result<(), Box<dyn Error>> {
        assert!(store.get(&key("meta/root/arthur.group.json")?)?.is_none());
        assert!(store.size_key(&key("meta/root/arthur.group.json")?)?.is_none());
        assert!(!store.exists(&key("data/root/marvin/android/c9/9")?)?);
        assert!(!store.exists(&key("data/root/zaphod/c0")?)?);
        assert_eq!(
            store.get(&key("data/root/marvin/android/c0/0")?)?,
            Some(vec![0, 1, 2, 3].into())
        );
        assert!(store.exists(&key("data/root/marvin/android/c1/0")?)?);
        assert_eq!(store.size_key(&key("data/root/marvin/android/c0/1")?)?, Some(1));
        assert_eq!(store.size_key(&key("zarr.json")?)?, Some(2));
        Ok(())
    }

    pub fn store_list<T: ListableStorageTraits>(store: &T) -> Result<(), Box<dyn Error>> {
        let chunks = vec![
            key("data/root/marvin/android/c0/0")?,
            key("data/root/marvin/android/c0/1")?,
            key("data/root/marvin/android/c1/0")?,
        ];
        let mut all = chunks.clone();
        all.extend([
            key("meta/root/marvin.group.json")?,
            key("meta/root/marvin/android.array.json")?,
            key("zarr.json")?,
        ]);
        assert_eq!(store.list()?, all);
        assert_eq!(store.list_prefix(&StorePrefix::new("data/root/")?)?, chunks);
        assert!(store.list_prefix(&StorePrefix::new("data/root/zaphod/")?)?.is_empty());

        let meta = store.list_dir(&StorePrefix::new("meta/root/")?)?;
        assert_eq!(meta.keys(), &[key("meta/root/marvin.group.json")?]);
        assert_eq!(meta.prefixes(), &[StorePrefix::new("meta/root/marvin/")?]);

        let root = store.list_dir(&StorePrefix::root())?;
        assert_eq!(root.keys(), &[key("zarr.json")?]);
        assert_eq!(
            root.prefixes(),
            &[StorePrefix::new("data/")?, StorePrefix::new("meta/")?]
        );
        Ok(())
    }
}
