use crate::config::StoreConfig;
use crate::error::{KvStoreError, Result};
use crate::record::{check_key, Record};
use crate::shard::{records, ShardedMap};
use crate::KvsEngine;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const LOG_FILE: &str = "kvs.log";
const COMPACT_FILE: &str = "kvs.log.compact";

/// KvStore stores values by their key.
///
/// Every write is appended to a log file before it becomes visible, the
/// current values are served from memory. Opening a store replays its log.
///
/// # Example
///
/// ``` rust
/// use kvs::KvStore;
/// use tempfile::TempDir;
///
/// let temp_dir = TempDir::new().expect("unable to create temporary working directory");
/// let store = KvStore::open(temp_dir.path()).unwrap();
///
/// store.upsert("key1".to_owned(), "value1".to_owned()).unwrap();
/// store.upsert("key2".to_owned(), "value2".to_owned()).unwrap();
///
/// assert_eq!(store.get("key1".to_owned()).unwrap().value, "value1");
/// assert_eq!(store.get("key2".to_owned()).unwrap().value, "value2");
/// ```
///
#[derive(Clone)]
pub struct KvStore {
    map: Arc<ShardedMap>,
    log: Arc<Mutex<LogFile>>,
    // Directory holding the log, needed to swap in a compacted log.
    path: PathBuf,
    config: StoreConfig,
}

impl KvsEngine for KvStore {
    fn upsert(&self, key: String, value: String) -> Result<Record> {
        KvStore::upsert(self, key, value)
    }
    fn get(&self, key: String) -> Result<Record> {
        KvStore::get(self, key)
    }
    fn list(&self) -> Result<Vec<Record>> {
        KvStore::list(self)
    }
    fn delete(&self, key: String) -> Result<()> {
        KvStore::delete(self, key)
    }
    fn flush(&self) -> Result<()> {
        self.log.lock()?.sync()
    }
}

impl KvStore {
    /// Open the store in the given directory with the default configuration,
    /// creating the directory and log when missing.
    pub fn open(path: &Path) -> Result<KvStore> {
        KvStore::open_with_config(path, StoreConfig::default())
    }

    /// Open the store in the given directory.
    pub fn open_with_config(path: &Path, config: StoreConfig) -> Result<KvStore> {
        fs::create_dir_all(path).map_err(|c| KvStoreError::CreateDirFailure {
            c,
            name: path.display().to_string(),
        })?;

        let map = ShardedMap::new(config.shards);
        let log_path = path.join(LOG_FILE);
        let stale = replay(&log_path, &map)?;

        let mut log = LogFile::open(&log_path, config.sync_writes)?;
        log.stale = stale;

        let kvs = KvStore {
            map: Arc::new(map),
            log: Arc::new(Mutex::new(log)),
            path: path.to_path_buf(),
            config,
        };

        if stale > kvs.config.compaction_threshold {
            kvs.compact()?;
        }

        Ok(kvs)
    }

    /// Returns the record for the given key.
    pub fn get(&self, k: String) -> Result<Record> {
        let v = self.map.get(&k)?.ok_or(KvStoreError::KeyNotFound)?;

        Ok(Record::new(k, v))
    }

    /// Returns a snapshot of every record.
    pub fn list(&self) -> Result<Vec<Record>> {
        self.map.snapshot()
    }

    /// Sets the value for the given key, creating the record if needed.
    pub fn upsert(&self, k: String, v: String) -> Result<Record> {
        check_key(&k)?;

        let stale = {
            let mut shard = self.map.write(&k)?;
            let overwritten = if shard.contains_key(&k) { 1 } else { 0 };

            let cmd = Command::Set {
                k: k.clone(),
                v: v.clone(),
            };
            let stale = self.log.lock()?.append(&cmd, overwritten)?;

            shard.insert(k.clone(), v.clone());
            stale
        };

        self.maybe_compact(stale);

        Ok(Record::new(k, v))
    }

    /// Removes the record of the given key.
    pub fn delete(&self, k: String) -> Result<()> {
        let stale = {
            let mut shard = self.map.write(&k)?;
            if !shard.contains_key(&k) {
                return Err(KvStoreError::KeyNotFound);
            }

            // Both the remove command and the set it cancels are dead weight.
            let stale = self.log.lock()?.append(&Command::Remove { k: k.clone() }, 2)?;

            shard.remove(&k);
            stale
        };

        self.maybe_compact(stale);

        Ok(())
    }

    /// Rewrite the log so it holds exactly one set command per live record.
    pub fn compact(&self) -> Result<()> {
        // Lock order is shards, then log, same as the write path.
        let shards = self.map.read_all()?;
        let mut log = self.log.lock()?;

        let tmp_path = self.path.join(COMPACT_FILE);
        let log_path = self.path.join(LOG_FILE);

        // A leftover from an interrupted compaction is garbage.
        if tmp_path.exists() {
            fs::remove_file(&tmp_path).map_err(|c| KvStoreError::FileMoveFailure { c })?;
        }

        let live = records(&shards);
        let mut compacted = LogFile::open(&tmp_path, false)?;
        for record in live.iter() {
            compacted.append(
                &Command::Set {
                    k: record.key.clone(),
                    v: record.value.clone(),
                },
                0,
            )?;
        }
        compacted.sync()?;

        fs::rename(&tmp_path, &log_path).map_err(|c| KvStoreError::FileMoveFailure { c })?;

        // The open handle follows the renamed file, nothing can fail past the
        // rename.
        let removed = log.stale;
        compacted.sync_writes = self.config.sync_writes;
        *log = compacted;

        info!(
            "Compacted log in '{}': dropped {} stale commands, kept {} records.",
            self.path.display(),
            removed,
            live.len()
        );

        Ok(())
    }

    fn maybe_compact(&self, stale: u64) {
        if stale <= self.config.compaction_threshold {
            return;
        }

        // The triggering write is already durable, a failed compaction
        // leaves the old log in place.
        if let Err(e) = self.compact() {
            warn!("Compaction of '{}' failed: {}", self.path.display(), e);
        }
    }
}

/// Rebuild `map` from the log at `path`, returning the number of stale
/// commands in it. A truncated final command is cut off the log.
fn replay(path: &Path, map: &ShardedMap) -> Result<u64> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(c) => {
            return Err(KvStoreError::OpenFileFailure {
                c,
                name: path.display().to_string(),
            })
        }
    };

    let reader = std::io::BufReader::new(file);
    let mut stream = serde_json::Deserializer::from_reader(reader).into_iter::<Command>();

    let mut stale = 0;
    let mut commands = 0;
    let mut offset = 0;

    while let Some(cmd) = stream.next() {
        let cmd = match cmd {
            Ok(cmd) => cmd,
            Err(ref c) if c.is_eof() => {
                warn!(
                    "Dropping torn command at offset {} of '{}'.",
                    offset,
                    path.display()
                );
                truncate(path, offset)?;
                break;
            }
            Err(c) => return Err(KvStoreError::DeserializationFailure { c }),
        };

        commands += 1;
        stale += match cmd {
            Command::Set { k, v } => match map.write(&k)?.insert(k, v) {
                Some(_) => 1,
                None => 0,
            },
            Command::Remove { k } => match map.write(&k)?.remove(&k) {
                Some(_) => 2,
                None => 1,
            },
        };

        offset = stream.byte_offset() as Offset;
    }

    debug!(
        "Replayed {} commands from '{}', {} stale.",
        commands,
        path.display(),
        stale
    );

    Ok(stale)
}

/// Cut the log at `offset`, the end of the last intact command. The newline
/// terminating that command is kept.
fn truncate(path: &Path, offset: Offset) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|c| KvStoreError::OpenFileFailure {
            c,
            name: path.display().to_string(),
        })?;

    file.seek(SeekFrom::Start(offset))
        .map_err(|c| KvStoreError::SeekFileFailure { c })?;
    let mut next = [0u8; 1];
    let read = file
        .read(&mut next)
        .map_err(|c| KvStoreError::SeekFileFailure { c })?;
    let len = if read == 1 && next[0] == b'\n' {
        offset + 1
    } else {
        offset
    };

    file.set_len(len)
        .map_err(|c| KvStoreError::WriteToFileFailure { c })?;
    file.sync_all()
        .map_err(|c| KvStoreError::FileFlushFailure { c })
}

type Offset = u64;

/// LogFile represents the append end of a database log file on disk.
struct LogFile {
    file: fs::File,
    // End of the file, where the next command lands.
    position: Offset,
    // Commands in the log that no longer contribute to any record.
    stale: u64,
    sync_writes: bool,
    #[cfg(test)]
    fail_sync: bool,
}

impl LogFile {
    fn open(path: &Path, sync_writes: bool) -> Result<LogFile> {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|c| KvStoreError::OpenFileFailure {
                c,
                name: path.display().to_string(),
            })?;

        let position = file
            .metadata()
            .map_err(|c| KvStoreError::SeekFileFailure { c })?
            .len();

        Ok(LogFile {
            file,
            position,
            stale: 0,
            sync_writes,
            #[cfg(test)]
            fail_sync: false,
        })
    }

    /// Append `cmd` and count `stale` more dead commands. Returns the new
    /// stale count.
    fn append(&mut self, cmd: &Command, stale: u64) -> Result<u64> {
        let mut serialized =
            serde_json::to_vec(cmd).map_err(|c| KvStoreError::SerializationFailure { c })?;
        serialized.push(b'\n');

        let written = self
            .file
            .write_all(&serialized)
            .map_err(|c| KvStoreError::WriteToFileFailure { c })
            .and_then(|()| if self.sync_writes { self.sync() } else { Ok(()) });

        if let Err(e) = written {
            // Cut off whatever part of the command made it to the file, an
            // unacknowledged command must not come back on replay.
            if let Err(c) = self.file.set_len(self.position) {
                warn!("Failed to roll back partial write: {}", c);
            }
            return Err(e);
        }

        self.position += serialized.len() as Offset;
        self.stale += stale;

        Ok(self.stale)
    }

    fn sync(&mut self) -> Result<()> {
        #[cfg(test)]
        {
            if self.fail_sync {
                return Err(KvStoreError::FileFlushFailure {
                    c: std::io::Error::new(std::io::ErrorKind::Other, "sync disabled"),
                });
            }
        }

        self.file
            .sync_data()
            .map_err(|c| KvStoreError::FileFlushFailure { c })
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Command {
    Set { k: String, v: String },
    Remove { k: String },
}
