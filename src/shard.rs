use crate::error::{KvStoreError, Result};
use crate::record::Record;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Shard = HashMap<String, String>;

/// Key to value map split into independently locked shards.
///
/// A write locks only the shard its key hashes to. Taking every shard lock
/// happens in ascending index order, and single-key paths never hold more
/// than one shard, so the two can not deadlock.
pub(crate) struct ShardedMap {
    shards: Vec<RwLock<Shard>>,
}

impl ShardedMap {
    pub(crate) fn new(shards: usize) -> ShardedMap {
        let shards = (0..shards.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect();

        ShardedMap { shards }
    }

    fn index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);

        (hasher.finish() % self.shards.len() as u64) as usize
    }

    pub(crate) fn read(&self, key: &str) -> Result<RwLockReadGuard<'_, Shard>> {
        Ok(self.shards[self.index(key)].read()?)
    }

    pub(crate) fn write(&self, key: &str) -> Result<RwLockWriteGuard<'_, Shard>> {
        Ok(self.shards[self.index(key)].write()?)
    }

    /// Read-lock every shard. While the guards live no write can land, so
    /// whatever is read through them is a single point in time.
    pub(crate) fn read_all(&self) -> Result<Vec<RwLockReadGuard<'_, Shard>>> {
        self.shards
            .iter()
            .map(|shard| shard.read().map_err(KvStoreError::from))
            .collect()
    }

    pub(crate) fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read(key)?.get(key).cloned())
    }

    pub(crate) fn snapshot(&self) -> Result<Vec<Record>> {
        let guards = self.read_all()?;

        Ok(records(&guards))
    }
}

/// Flatten locked shards into records ordered by key.
pub(crate) fn records(shards: &[RwLockReadGuard<'_, Shard>]) -> Vec<Record> {
    let mut records: Vec<Record> = shards
        .iter()
        .flat_map(|shard| shard.iter())
        .map(|(k, v)| Record::new(k.clone(), v.clone()))
        .collect();

    records.sort_by(|a, b| a.key.cmp(&b.key));

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_shards_is_clamped_to_one() {
        let map = ShardedMap::new(0);
        assert_eq!(map.shards.len(), 1);

        map.write("a").unwrap().insert("a".to_owned(), "1".to_owned());
        assert_eq!(map.get("a").unwrap(), Some("1".to_owned()));
    }

    #[test]
    fn key_always_routes_to_the_same_shard() {
        let map = ShardedMap::new(16);

        for i in 0..100 {
            let key = format!("key-{}", i);
            assert_eq!(map.index(&key), map.index(&key));
            assert!(map.index(&key) < 16);
        }
    }

    #[test]
    fn snapshot_spans_all_shards_in_key_order() {
        let map = ShardedMap::new(8);

        for i in (0..50).rev() {
            let key = format!("key-{:02}", i);
            map.write(&key).unwrap().insert(key.clone(), i.to_string());
        }

        let snapshot = map.snapshot().unwrap();
        assert_eq!(snapshot.len(), 50);
        assert_eq!(snapshot[0], Record::new("key-00".to_owned(), "0".to_owned()));
        assert_eq!(snapshot[49], Record::new("key-49".to_owned(), "49".to_owned()));
    }

    #[test]
    fn writes_to_other_shards_proceed_while_one_is_locked() {
        let map = ShardedMap::new(2);

        let key_in = |shard: usize| {
            (0..)
                .map(|i| format!("key-{}", i))
                .find(|key| map.index(key) == shard)
                .unwrap()
        };
        let (a, b) = (key_in(0), key_in(1));

        let _held = map.write(&a).unwrap();
        assert!(map.shards[map.index(&b)].try_write().is_ok());
    }
}
