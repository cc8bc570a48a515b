//! A storage adapter which logs storage method calls.

use std::sync::Arc;

use itertools::Itertools;

use crate::storage::{
    Bytes, ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey,
    StoreKeys, StoreKeysPrefixes, StorePrefix, WritableStorageTraits,
};

/// The usage log storage adapter. Logs storage method calls through the [`log`] facade.
///
/// It is intended to aid in debugging by revealing storage access patterns.
/// Each call produces one record at the configured [`log::Level`] with the `zarrs_lite::storage` target, like
/// ```text
/// set(meta/root/arthur/dent.array.json, len=312) -> Ok(())
/// get(data/root/arthur/dent/c1/0) -> len=Ok(Some(41))
/// list_dir(meta/root/) -> (keys:[meta/root/tricia.group.json], prefixes:[meta/root/arthur/])
/// ```
pub struct UsageLogStorageAdapter<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    level: log::Level,
}

impl<TStorage: ?Sized> core::fmt::Debug for UsageLogStorageAdapter<TStorage> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "usage log ({})", self.level)
    }
}

const TARGET: &str = "zarrs_lite::storage";

impl<TStorage: ?Sized> UsageLogStorageAdapter<TStorage> {
    /// Create a new usage log storage adapter logging at `level`.
    pub fn new(storage: Arc<TStorage>, level: log::Level) -> Self {
        Self { storage, level }
    }

    /// Returns the inner storage.
    #[must_use]
    pub fn storage(&self) -> &Arc<TStorage> {
        &self.storage
    }
}

fn len_of<T, E>(result: &Result<Option<T>, E>, len: impl Fn(&T) -> usize) -> Result<Option<usize>, &E> {
    result.as_ref().map(|value| value.as_ref().map(len))
}

impl<TStorage: ?Sized + ReadableStorageTraits> ReadableStorageTraits
    for UsageLogStorageAdapter<TStorage>
{
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        let result = self.storage.get(key);
        log::log!(target: TARGET, self.level, "get({key}) -> len={:?}", len_of(&result, Bytes::len));
        result
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        let result = self.storage.size_key(key);
        log::log!(target: TARGET, self.level, "size_key({key}) -> {result:?}");
        result
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> WritableStorageTraits
    for UsageLogStorageAdapter<TStorage>
{
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        let len = value.len();
        let result = self.storage.set(key, value);
        log::log!(target: TARGET, self.level, "set({key}, len={len}) -> {result:?}");
        result
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        let result = self.storage.erase(key);
        log::log!(target: TARGET, self.level, "erase({key}) -> {result:?}");
        result
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        let result = self.storage.erase_prefix(prefix);
        log::log!(target: TARGET, self.level, "erase_prefix({prefix}) -> {result:?}");
        result
    }
}

impl<TStorage: ?Sized + ListableStorageTraits> ListableStorageTraits
    for UsageLogStorageAdapter<TStorage>
{
    fn list(&self) -> Result<StoreKeys, StorageError> {
        let result = self.storage.list();
        log::log!(
            target: TARGET,
            self.level,
            "list() -> {:?}",
            result.as_ref().map(|keys| format!("[{}]", keys.iter().format(", ")))
        );
        result
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        let result = self.storage.list_prefix(prefix);
        log::log!(
            target: TARGET,
            self.level,
            "list_prefix({prefix}) -> {:?}",
            result.as_ref().map(|keys| format!("[{}]", keys.iter().format(", ")))
        );
        result
    }

    fn list_dir(&self, prefix: &StorePrefix) -> Result<StoreKeysPrefixes, StorageError> {
        let result = self.storage.list_dir(prefix);
        log::log!(
            target: TARGET,
            self.level,
            "list_dir({prefix}) -> {:?}",
            result.as_ref().map(|keys_prefixes| format!(
                "(keys:[{}], prefixes:[{}])",
                keys_prefixes.keys().iter().format(", "),
                keys_prefixes.prefixes().iter().format(", ")
            ))
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;
    use crate::storage::store::MemoryStore;

    #[test]
    fn usage_log() -> Result<(), Box<dyn Error>> {
        testing_logger::setup();
        let store = UsageLogStorageAdapter::new(Arc::new(MemoryStore::new()), log::Level::Info);
        store.set(&"a/b".try_into()?, vec![0, 1, 2].into())?;
        assert_eq!(store.get(&"a/b".try_into()?)?, Some(vec![0, 1, 2].into()));
        store.list_dir(&StorePrefix::root())?;
        store.erase(&"a/b".try_into()?)?;
        testing_logger::validate(|captured_logs| {
            let records: Vec<_> = captured_logs
                .iter()
                .filter(|log| log.target == TARGET)
                .map(|log| log.body.as_str())
                .collect();
            assert_eq!(
                records,
                vec![
                    "set(a/b, len=3) -> Ok(())",
                    "get(a/b) -> len=Ok(Some(3))",
                    "list_dir() -> Ok(\"(keys:[], prefixes:[a/])\")",
                    "erase(a/b) -> Ok(())",
                ]
            );
            assert!(captured_logs
                .iter()
                .filter(|log| log.target == TARGET)
                .all(|log| log.level == log::Level::Info));
        });
        Ok(())
    }
}
