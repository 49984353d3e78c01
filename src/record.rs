use crate::error::{KvStoreError, Result};
use serde::{Deserialize, Serialize};

/// A single key value pair as stored by an engine.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Record {
    /// Unique, non-empty key.
    pub key: String,
    /// Value, possibly empty.
    pub value: String,
}

impl Record {
    /// Construct a record from its parts.
    pub fn new(key: String, value: String) -> Record {
        Record { key, value }
    }
}

/// Reject keys outside the engines' input domain.
pub(crate) fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(KvStoreError::EmptyKey);
    }

    Ok(())
}
