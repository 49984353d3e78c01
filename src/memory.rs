use crate::config::StoreConfig;
use crate::error::{KvStoreError, Result};
use crate::record::{check_key, Record};
use crate::shard::ShardedMap;
use crate::KvsEngine;
use std::sync::Arc;

/// MemKvsEngine keeps records in memory only. Everything is lost once the
/// last handle is dropped.
///
/// # Example
///
/// ``` rust
/// use kvs::{KvsEngine, MemKvsEngine};
///
/// let store = MemKvsEngine::new();
/// store.upsert("key1".to_owned(), "value1".to_owned()).unwrap();
///
/// assert_eq!(store.get("key1".to_owned()).unwrap().value, "value1");
/// assert!(store.get("key2".to_owned()).unwrap_err().is_not_found());
/// ```
#[derive(Clone)]
pub struct MemKvsEngine {
    map: Arc<ShardedMap>,
}

impl MemKvsEngine {
    /// Create an empty store with the default configuration.
    pub fn new() -> MemKvsEngine {
        MemKvsEngine::with_config(&StoreConfig::default())
    }

    /// Create an empty store sharded according to `config`.
    pub fn with_config(config: &StoreConfig) -> MemKvsEngine {
        MemKvsEngine {
            map: Arc::new(ShardedMap::new(config.shards)),
        }
    }
}

impl Default for MemKvsEngine {
    fn default() -> MemKvsEngine {
        MemKvsEngine::new()
    }
}

impl KvsEngine for MemKvsEngine {
    fn upsert(&self, key: String, value: String) -> Result<Record> {
        check_key(&key)?;

        self.map.write(&key)?.insert(key.clone(), value.clone());

        Ok(Record::new(key, value))
    }

    fn get(&self, key: String) -> Result<Record> {
        let value = self.map.get(&key)?.ok_or(KvStoreError::KeyNotFound)?;

        Ok(Record::new(key, value))
    }

    fn list(&self) -> Result<Vec<Record>> {
        self.map.snapshot()
    }

    fn delete(&self, key: String) -> Result<()> {
        self.map
            .write(&key)?
            .remove(&key)
            .map(|_| ())
            .ok_or(KvStoreError::KeyNotFound)
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
