/// Result type returned by the KvStore library.
pub type Result<T> = std::result::Result<T, KvStoreError>;

/// Error returned by the KvStore library.
#[derive(Debug, Fail)]
pub enum KvStoreError {
    /// No record exists for the requested key.
    #[fail(display = "Key not found")]
    KeyNotFound,

    /// Keys must contain at least one character.
    #[fail(display = "key must not be empty")]
    EmptyKey,

    /// Failure when opening database file.
    #[fail(display = "failed to open file {}", name)]
    OpenFileFailure {
        /// Underlying io Error.
        #[cause]
        c: std::io::Error,
        /// Name of the file.
        name: String,
    },

    /// Failure when creating the data directory.
    #[fail(display = "failed to create directory {}", name)]
    CreateDirFailure {
        /// Underlying io Error.
        #[cause]
        c: std::io::Error,
        /// Name of the directory.
        name: String,
    },

    /// Failure when move file.
    #[fail(display = "failed to move file")]
    FileMoveFailure {
        /// Underlying io Error.
        #[cause]
        c: std::io::Error,
    },

    /// Failure when flush file.
    #[fail(display = "failed to flush file")]
    FileFlushFailure {
        /// Underlying io Error.
        #[cause]
        c: std::io::Error,
    },

    /// Failure when serializing input.
    #[fail(display = "failed to serialize input")]
    SerializationFailure {
        /// Underlying serde Error.
        #[cause]
        c: serde_json::error::Error,
    },

    /// Failure when deserializing input.
    #[fail(display = "failed to deserialize input")]
    DeserializationFailure {
        /// Underlying serde Error.
        #[cause]
        c: serde_json::error::Error,
    },

    /// Failure writing to file.
    #[fail(display = "failed to write to file")]
    WriteToFileFailure {
        /// Underlying io Error.
        #[cause]
        c: std::io::Error,
    },

    /// Failure seeking file.
    #[fail(display = "failed to seek file")]
    SeekFileFailure {
        /// Underlying io Error.
        #[cause]
        c: std::io::Error,
    },

    /// Failure inside the sled database.
    #[fail(display = "sled failure")]
    Sled {
        /// Underlying sled Error.
        #[cause]
        c: ::sled::Error,
    },

    /// Stored bytes are not valid UTF-8.
    #[fail(display = "stored value is not valid utf-8")]
    Utf8 {
        /// Underlying conversion Error.
        #[cause]
        c: std::string::FromUtf8Error,
    },

    /// The data directory was written by another engine.
    #[fail(
        display = "data directory '{}' belongs to engine '{}', not '{}'",
        dir, found, requested
    )]
    EngineMismatch {
        /// The data directory.
        dir: String,
        /// Engine recorded in the directory.
        found: String,
        /// Engine asked for.
        requested: String,
    },

    /// A thread panicked while holding a lock on shared state.
    #[fail(display = "lock poisoned by a panicked writer")]
    LockPoisoned,
}

impl KvStoreError {
    /// Whether the error only reports a missing key. Every other error means
    /// the backing storage could not be reached or written.
    pub fn is_not_found(&self) -> bool {
        match self {
            KvStoreError::KeyNotFound => true,
            _ => false,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for KvStoreError {
    fn from(_: std::sync::PoisonError<T>) -> KvStoreError {
        KvStoreError::LockPoisoned
    }
}

impl From<::sled::Error> for KvStoreError {
    fn from(c: ::sled::Error) -> KvStoreError {
        KvStoreError::Sled { c }
    }
}
