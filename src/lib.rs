#![deny(missing_docs)]

//! # KvStore
//! `kvs` packages a key value store with interchangeable storage engines and
//! an HTTP front end.
//!
//! Every engine implements [`KvsEngine`]: upsert, get, list and delete of
//! string values addressed by non-empty string keys. Operations on a single
//! key are linearizable, operations on unrelated keys do not serialize on a
//! global lock, and `list` returns a point-in-time snapshot.

pub use config::{claim_data_dir, StoreConfig};
pub use error::{KvStoreError, Result};
pub use memory::MemKvsEngine;
pub use record::Record;
pub use store::KvStore;

#[macro_use]
extern crate failure_derive;

/// Errors thrown by KvStore.
pub mod error;

/// Tuning knobs shared by the engines.
pub mod config;

mod record;

mod shard;

mod memory;

mod store;

/// Bindings for sled database.
pub mod sled;

/// HTTP adapter translating requests into engine operations.
pub mod server;

/// KvsEngine represents the storage interface used by the server.
///
/// Implementations are handles onto shared state: cloning an engine yields
/// another handle to the same records, so one engine can serve many
/// concurrent callers.
pub trait KvsEngine: Clone + Send + Sync + 'static {
    /// Create the record for `key`, or replace its value when it exists.
    /// Returns the record as it is after the write.
    fn upsert(&self, key: String, value: String) -> Result<Record>;
    /// Return the current record for `key`, or `KvStoreError::KeyNotFound`.
    fn get(&self, key: String) -> Result<Record>;
    /// Return every record currently stored, ordered by key.
    fn list(&self) -> Result<Vec<Record>>;
    /// Remove the record for `key`, or fail with `KvStoreError::KeyNotFound`.
    fn delete(&self, key: String) -> Result<()>;
    /// Push buffered writes down to the backing medium. Call before dropping
    /// the last handle.
    fn flush(&self) -> Result<()>;
}
