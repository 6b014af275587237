use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("checksum mismatch for descriptor {timestamp} in {}", location.display())]
    ChecksumMismatch { location: PathBuf, timestamp: u64 },

    #[error("descriptor {timestamp} already recorded in {}", location.display())]
    DuplicateTimestamp { location: PathBuf, timestamp: u64 },

    #[error("unsupported session version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("core error: {0}")]
    Core(#[from] refhist_core::CoreError),
}
