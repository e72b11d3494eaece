//! In-memory storage implementation.

use crate::{
    column_families::all_column_families,
    errors::{Result, StorageError},
    traits::{deserialize_value, serialize_key, serialize_value, Batch, Storage},
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tokio::sync::RwLock;
use tracing::debug;

type ColumnFamily = BTreeMap<Vec<u8>, Vec<u8>>;
type ColumnFamilies = HashMap<String, ColumnFamily>;

/// In-memory storage implementation
///
/// All column families sit behind one lock so a committed [`Batch`] is
/// observed entirely or not at all. Contents are lost when the process exits.
#[derive(Clone)]
pub struct MemoryStorage {
    column_families: Arc<RwLock<ColumnFamilies>>,
}

impl MemoryStorage {
    /// Create storage with all KBAN column families
    pub fn new() -> Self {
        Self::with_column_families(all_column_families())
    }

    /// Create storage with an explicit set of column families
    pub fn with_column_families<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let column_families: ColumnFamilies = names
            .into_iter()
            .map(|name| (name.into(), ColumnFamily::new()))
            .collect();

        debug!(
            column_families = column_families.len(),
            "Opened in-memory storage"
        );

        Self {
            column_families: Arc::new(RwLock::new(column_families)),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn cf_ref<'a>(families: &'a ColumnFamilies, cf: &str) -> Result<&'a ColumnFamily> {
    families
        .get(cf)
        .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))
}

fn cf_mut<'a>(families: &'a mut ColumnFamilies, cf: &str) -> Result<&'a mut ColumnFamily> {
    families
        .get_mut(cf)
        .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get<K, V>(&self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned,
    {
        let key_bytes = serialize_key(key)?;
        let families = self.column_families.read().await;

        match cf_ref(&families, cf)?.get(&key_bytes) {
            Some(bytes) => Ok(Some(deserialize_value(bytes)?)),
            None => Ok(None),
        }
    }

    async fn put<K, V>(&self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;
        let value_bytes = serialize_value(value)?;

        let mut families = self.column_families.write().await;
        cf_mut(&mut families, cf)?.insert(key_bytes, value_bytes);

        Ok(())
    }

    async fn delete<K>(&self, cf: &str, key: &K) -> Result<()>
    where
        K: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;

        let mut families = self.column_families.write().await;
        cf_mut(&mut families, cf)?.remove(&key_bytes);

        Ok(())
    }

    async fn exists<K>(&self, cf: &str, key: &K) -> Result<bool>
    where
        K: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;
        let families = self.column_families.read().await;

        Ok(cf_ref(&families, cf)?.contains_key(&key_bytes))
    }

    async fn get_by_prefix<K, V>(&self, cf: &str, prefix: &K) -> Result<Vec<(Vec<u8>, V)>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned,
    {
        let prefix_bytes = serialize_key(prefix)?;
        let families = self.column_families.read().await;

        // Keys are sorted, so the matching run starts at the prefix itself
        cf_ref(&families, cf)?
            .range(prefix_bytes.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix_bytes))
            .map(|(key, value)| Ok((key.clone(), deserialize_value(value)?)))
            .collect()
    }

    async fn scan_all<V>(&self, cf: &str) -> Result<Vec<(Vec<u8>, V)>>
    where
        V: DeserializeOwned,
    {
        let families = self.column_families.read().await;

        cf_ref(&families, cf)?
            .iter()
            .map(|(key, value)| Ok((key.clone(), deserialize_value(value)?)))
            .collect()
    }

    async fn count(&self, cf: &str) -> Result<usize> {
        let families = self.column_families.read().await;
        Ok(cf_ref(&families, cf)?.len())
    }

    fn batch(&self) -> Box<dyn Batch> {
        Box::new(MemoryBatch {
            column_families: Arc::clone(&self.column_families),
            puts: Vec::new(),
        })
    }
}

struct BatchPut {
    cf: String,
    key: Vec<u8>,
    value: Vec<u8>,
}

/// In-memory batch implementation
pub struct MemoryBatch {
    column_families: Arc<RwLock<ColumnFamilies>>,
    puts: Vec<BatchPut>,
}

#[async_trait]
impl Batch for MemoryBatch {
    fn put_raw(&mut self, cf: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.puts.push(BatchPut {
            cf: cf.to_string(),
            key,
            value,
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryBatch {
            column_families,
            puts,
        } = *self;
        let mut families = column_families.write().await;

        // Validate everything before the first write so a bad CF leaves no trace
        for put in &puts {
            cf_ref(&families, &put.cf)?;
        }

        let applied = puts.len();
        for BatchPut { cf, key, value } in puts {
            cf_mut(&mut families, &cf)?.insert(key, value);
        }

        debug!(operations = applied, "Batch committed successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        column_families::{CF_AUDIT_EVENTS, CF_AUDIT_EVENTS_BY_KBAN, CF_KBAN_SESSIONS},
        traits::BatchExt,
    };
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: u64,
    }

    fn data(name: &str, value: u64) -> TestData {
        TestData {
            name: name.to_string(),
            value,
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let storage = MemoryStorage::new();
        let key = "US0012C7BF9123456785".to_string();

        storage
            .put(CF_KBAN_SESSIONS, &key, &data("test", 42))
            .await
            .unwrap();

        let result: Option<TestData> = storage.get(CF_KBAN_SESSIONS, &key).await.unwrap();
        assert_eq!(result, Some(data("test", 42)));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let storage = MemoryStorage::new();
        let result: Option<TestData> = storage
            .get(CF_KBAN_SESSIONS, &"missing".to_string())
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_put_replaces_existing_value() {
        let storage = MemoryStorage::new();
        let key = "key".to_string();

        storage.put(CF_KBAN_SESSIONS, &key, &data("a", 1)).await.unwrap();
        storage.put(CF_KBAN_SESSIONS, &key, &data("b", 2)).await.unwrap();

        let result: Option<TestData> = storage.get(CF_KBAN_SESSIONS, &key).await.unwrap();
        assert_eq!(result, Some(data("b", 2)));
        assert_eq!(storage.count(CF_KBAN_SESSIONS).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_exists_and_delete() {
        let storage = MemoryStorage::new();
        let key = "key".to_string();

        assert!(!storage.exists(CF_KBAN_SESSIONS, &key).await.unwrap());
        storage.put(CF_KBAN_SESSIONS, &key, &data("a", 1)).await.unwrap();
        assert!(storage.exists(CF_KBAN_SESSIONS, &key).await.unwrap());

        storage.delete(CF_KBAN_SESSIONS, &key).await.unwrap();
        assert!(!storage.exists(CF_KBAN_SESSIONS, &key).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_column_family() {
        let storage = MemoryStorage::new();
        let result = storage.put("nope", &"key".to_string(), &1u8).await;
        assert!(matches!(result, Err(StorageError::InvalidColumnFamily(_))));
    }

    #[tokio::test]
    async fn test_scan_all_is_ordered_by_big_endian_key() {
        let storage = MemoryStorage::new();
        for sequence in [3u64, 1, 256, 2] {
            storage
                .put(CF_AUDIT_EVENTS, &sequence.to_be_bytes(), &sequence)
                .await
                .unwrap();
        }

        let values: Vec<u64> = storage
            .scan_all::<u64>(CF_AUDIT_EVENTS)
            .await
            .unwrap()
            .into_iter()
            .map(|(_, value)| value)
            .collect();
        assert_eq!(values, vec![1, 2, 3, 256]);
    }

    #[tokio::test]
    async fn test_get_by_prefix_does_not_match_longer_strings() {
        let storage = MemoryStorage::new();
        let short = "US001".to_string();
        let long = "US0012".to_string();

        storage
            .put(CF_AUDIT_EVENTS_BY_KBAN, &(&short, 1u64.to_be_bytes()), &1u64)
            .await
            .unwrap();
        storage
            .put(CF_AUDIT_EVENTS_BY_KBAN, &(&short, 2u64.to_be_bytes()), &2u64)
            .await
            .unwrap();
        storage
            .put(CF_AUDIT_EVENTS_BY_KBAN, &(&long, 3u64.to_be_bytes()), &3u64)
            .await
            .unwrap();

        let results: Vec<(Vec<u8>, u64)> = storage
            .get_by_prefix(CF_AUDIT_EVENTS_BY_KBAN, &short)
            .await
            .unwrap();

        let values: Vec<u64> = results.into_iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_batch_commit() {
        let storage = MemoryStorage::new();

        let mut batch = storage.batch();
        batch
            .put(CF_AUDIT_EVENTS, &1u64.to_be_bytes(), &data("event", 1))
            .unwrap();
        batch
            .put(CF_KBAN_SESSIONS, &"key".to_string(), &data("session", 2))
            .unwrap();
        batch.commit().await.unwrap();

        assert_eq!(storage.count(CF_AUDIT_EVENTS).await.unwrap(), 1);
        assert_eq!(storage.count(CF_KBAN_SESSIONS).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dropped_batch_applies_nothing() {
        let storage = MemoryStorage::new();

        let mut batch = storage.batch();
        batch
            .put(CF_KBAN_SESSIONS, &"key".to_string(), &data("a", 1))
            .unwrap();
        drop(batch);

        assert_eq!(storage.count(CF_KBAN_SESSIONS).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_with_unknown_cf_applies_nothing() {
        let storage = MemoryStorage::new();

        let mut batch = storage.batch();
        batch
            .put(CF_KBAN_SESSIONS, &"key".to_string(), &data("a", 1))
            .unwrap();
        batch.put("nope", &"key".to_string(), &data("b", 2)).unwrap();

        let result = batch.commit().await;
        assert!(matches!(result, Err(StorageError::InvalidColumnFamily(_))));
        assert_eq!(storage.count(CF_KBAN_SESSIONS).await.unwrap(), 0);
    }
}
