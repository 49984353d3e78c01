use crate::error::{KvStoreError, Result};
use std::fs;
use std::path::Path;

/// Configuration shared by the storage engines.
///
/// # Example
///
/// ``` rust
/// use kvs::StoreConfig;
///
/// let config = StoreConfig {
///     shards: 4,
///     ..StoreConfig::default()
/// };
/// assert_eq!(config.compaction_threshold, 1024);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of independently locked shards of the in-memory map. Clamped
    /// to at least one.
    pub shards: usize,
    /// Number of stale log commands tolerated before `KvStore` rewrites its
    /// log.
    pub compaction_threshold: u64,
    /// Sync every write to disk before acknowledging it.
    pub sync_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> StoreConfig {
        StoreConfig {
            shards: 16,
            compaction_threshold: 1024,
            sync_writes: false,
        }
    }
}

// Records which engine owns a data directory.
const ENGINE_MARKER: &str = "engine";

/// Claim `dir` for the engine named `engine`.
///
/// A fresh directory is created and marked with the engine name. A directory
/// already marked by another engine is refused with
/// `KvStoreError::EngineMismatch`, its data is left untouched.
pub fn claim_data_dir(dir: &Path, engine: &str) -> Result<()> {
    let marker = dir.join(ENGINE_MARKER);

    match fs::read_to_string(&marker) {
        Ok(found) => {
            if found.trim() != engine {
                return Err(KvStoreError::EngineMismatch {
                    dir: dir.display().to_string(),
                    found: found.trim().to_owned(),
                    requested: engine.to_owned(),
                });
            }
        }
        Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|c| KvStoreError::CreateDirFailure {
                c,
                name: dir.display().to_string(),
            })?;
            fs::write(&marker, engine).map_err(|c| KvStoreError::WriteToFileFailure { c })?;
        }
        Err(c) => {
            return Err(KvStoreError::OpenFileFailure {
                c,
                name: marker.display().to_string(),
            })
        }
    }

    Ok(())
}
