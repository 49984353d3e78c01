use crate::config::StoreConfig;
use crate::error::{KvStoreError, Result};
use crate::record::{check_key, Record};
use crate::KvsEngine;
use std::sync::{Arc, RwLock};

/// Adapter for sled database.
///
/// sled makes single key operations atomic on its own. Writers additionally
/// share a gate that `list` takes exclusively, so a listing never sees a
/// write that started after it.
///
/// sled has no point-in-time read snapshots, so writers wait for the whole
/// of a `list`. On large stores listing is a full write pause. Reads are
/// never blocked.
#[derive(Clone)]
pub struct SledKvsEngine {
    tree: ::sled::Db,
    gate: Arc<RwLock<()>>,
    sync_writes: bool,
}

impl SledKvsEngine {
    /// Open a sled database on the given path returning the SledKvsEngine
    /// adapter.
    pub fn open(path: &std::path::Path) -> Result<SledKvsEngine> {
        SledKvsEngine::open_with_config(path, &StoreConfig::default())
    }

    /// Open a sled database, flushing after each write when the config asks
    /// for synchronous writes.
    pub fn open_with_config(path: &std::path::Path, config: &StoreConfig) -> Result<SledKvsEngine> {
        let tree = ::sled::open(path)?;

        Ok(SledKvsEngine {
            tree,
            gate: Arc::new(RwLock::new(())),
            sync_writes: config.sync_writes,
        })
    }

    fn maybe_flush(&self) -> Result<()> {
        if self.sync_writes {
            self.tree.flush()?;
        }

        Ok(())
    }
}

fn decode(bytes: ::sled::IVec) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|c| KvStoreError::Utf8 { c })
}

impl KvsEngine for SledKvsEngine {
    fn upsert(&self, key: String, value: String) -> Result<Record> {
        check_key(&key)?;

        {
            let _gate = self.gate.read()?;
            self.tree.insert(key.as_bytes(), value.as_bytes())?;
        }
        self.maybe_flush()?;

        Ok(Record::new(key, value))
    }

    fn get(&self, key: String) -> Result<Record> {
        let value = self
            .tree
            .get(key.as_bytes())?
            .ok_or(KvStoreError::KeyNotFound)?;

        Ok(Record::new(key, decode(value)?))
    }

    fn list(&self) -> Result<Vec<Record>> {
        let _gate = self.gate.write()?;

        // sled iterates in byte order, which for UTF-8 is key order.
        self.tree
            .iter()
            .map(|entry| -> Result<Record> {
                let (k, v) = entry?;
                Ok(Record::new(decode(k)?, decode(v)?))
            })
            .collect()
    }

    fn delete(&self, key: String) -> Result<()> {
        {
            let _gate = self.gate.read()?;
            self.tree
                .remove(key.as_bytes())?
                .ok_or(KvStoreError::KeyNotFound)?;
        }

        self.maybe_flush()
    }

    fn flush(&self) -> Result<()> {
        self.tree.flush()?;

        Ok(())
    }
}
