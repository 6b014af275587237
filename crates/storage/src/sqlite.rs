use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::debug;

use refhist_core::{DescriptorFlags, DescriptorProxy, RefactoringDescriptor, RefactoringHistory, TimeRange};

use crate::error::StorageError;
use crate::traits::{HistoryStore, NAME_HISTORY_FILE, StoreProvider};

/// Stamps are millisecond values; anything past `i64::MAX` is clamped for SQLite.
fn to_sql_stamp(stamp: u64) -> i64 {
    i64::try_from(stamp).unwrap_or(i64::MAX)
}

fn encode_arguments(arguments: &BTreeMap<String, String>) -> Result<Vec<u8>, StorageError> {
    rmp_serde::to_vec(arguments).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode_arguments(bytes: &[u8]) -> Result<BTreeMap<String, String>, StorageError> {
    rmp_serde::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// History log backed by a SQLite file at `<location>/refactorings.history`.
///
/// The file is created on first write; reading a location that was never
/// written yields an empty history.
pub struct SqliteHistoryStore {
    location: PathBuf,
    project: Option<String>,
    conn: Option<Connection>,
}

impl SqliteHistoryStore {
    pub fn open(location: &Path, project: Option<&str>) -> Result<Self, StorageError> {
        let mut store = Self {
            location: location.to_path_buf(),
            project: project.map(str::to_string),
            conn: None,
        };
        if store.file().exists() {
            store.connect()?;
        }
        Ok(store)
    }

    fn file(&self) -> PathBuf {
        self.location.join(NAME_HISTORY_FILE)
    }

    fn connect(&mut self) -> Result<&Connection, StorageError> {
        if self.conn.is_none() {
            fs::create_dir_all(&self.location)?;
            let conn = Connection::open(self.file())?;
            crate::schema::init_schema(&conn)?;
            debug!(location = %self.location.display(), "opened history log");
            self.conn = Some(conn);
        }
        self.conn
            .as_ref()
            .ok_or_else(|| StorageError::Serialization("history log not open".into()))
    }

    /// Re-opens the connection if the file appeared since this handle was created.
    fn existing(&mut self) -> Result<Option<&Connection>, StorageError> {
        if self.conn.is_none() && !self.file().exists() {
            return Ok(None);
        }
        self.connect().map(Some)
    }
}

fn read_descriptor(location: &Path, row: &rusqlite::Row) -> Result<RefactoringDescriptor, StorageError> {
    let timestamp: i64 = row.get(0)?;
    let refactoring_id: String = row.get(1)?;
    let project: Option<String> = row.get(2)?;
    let description: String = row.get(3)?;
    let comment: Option<String> = row.get(4)?;
    let arguments_bytes: Vec<u8> = row.get(5)?;
    let flags: i64 = row.get(6)?;
    let checksum: Vec<u8> = row.get(7)?;

    let timestamp = timestamp as u64;
    if blake3::hash(&arguments_bytes).as_bytes().as_slice() != checksum.as_slice() {
        return Err(StorageError::ChecksumMismatch {
            location: location.to_path_buf(),
            timestamp,
        });
    }
    let arguments = decode_arguments(&arguments_bytes)?;
    let flags = DescriptorFlags::from_bits_retain(flags as u32);

    let descriptor = RefactoringDescriptor::new(
        refactoring_id,
        project.as_deref(),
        description,
        arguments,
        flags,
    )
    .stamped(timestamp);
    Ok(match comment {
        Some(comment) => descriptor.with_comment(comment),
        None => descriptor,
    })
}

impl HistoryStore for SqliteHistoryStore {
    fn location(&self) -> &Path {
        &self.location
    }

    fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    fn read_history(
        &mut self,
        range: TimeRange,
        filter: DescriptorFlags,
    ) -> Result<RefactoringHistory, StorageError> {
        let Some(conn) = self.existing()? else {
            return Ok(RefactoringHistory::EMPTY);
        };
        let mut stmt = conn.prepare(
            "SELECT timestamp, project, description FROM descriptors
             WHERE timestamp >= ?1 AND timestamp <= ?2 AND (flags & ?3) = ?3
             ORDER BY timestamp DESC",
        )?;
        let rows = stmt.query_map(
            rusqlite::params![
                to_sql_stamp(range.start()),
                to_sql_stamp(range.end()),
                filter.bits() as i64,
            ],
            |row| {
                let timestamp: i64 = row.get(0)?;
                let project: Option<String> = row.get(1)?;
                let description: String = row.get(2)?;
                Ok(DescriptorProxy::new(project.as_deref(), &description, timestamp as u64))
            },
        )?;
        let mut proxies = Vec::new();
        for row in rows {
            proxies.push(row?);
        }
        Ok(RefactoringHistory::new(proxies))
    }

    fn request_descriptor(
        &mut self,
        timestamp: u64,
    ) -> Result<Option<RefactoringDescriptor>, StorageError> {
        let location = self.location.clone();
        let Some(conn) = self.existing()? else {
            return Ok(None);
        };
        let mut stmt = conn.prepare(
            "SELECT timestamp, refactoring_id, project, description, comment, arguments, flags, checksum
             FROM descriptors WHERE timestamp = ?1",
        )?;
        let mut rows = stmt.query(rusqlite::params![to_sql_stamp(timestamp)])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_descriptor(&location, row)?)),
            None => Ok(None),
        }
    }

    fn add_descriptor(&mut self, descriptor: &RefactoringDescriptor) -> Result<(), StorageError> {
        let arguments = encode_arguments(descriptor.arguments())?;
        let checksum = blake3::hash(&arguments);
        let location = self.location.clone();
        let conn = self.connect()?;
        let inserted = conn.execute(
            "INSERT INTO descriptors
             (timestamp, refactoring_id, project, description, comment, arguments, flags, checksum)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                to_sql_stamp(descriptor.timestamp()),
                descriptor.id(),
                descriptor.project(),
                descriptor.description(),
                descriptor.comment(),
                arguments,
                descriptor.flags().bits() as i64,
                checksum.as_bytes().as_slice(),
            ],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::DuplicateTimestamp {
                    location,
                    timestamp: descriptor.timestamp(),
                })
            }
            Err(error) => Err(error.into()),
        }
    }

    fn latest_timestamp(&mut self) -> Result<Option<u64>, StorageError> {
        let Some(conn) = self.existing()? else {
            return Ok(None);
        };
        let latest: Option<i64> = conn.query_row("SELECT MAX(timestamp) FROM descriptors", [], |row| row.get(0))?;
        Ok(latest.map(|stamp| stamp as u64))
    }

    fn remove_descriptors(&mut self, timestamps: &[u64]) -> Result<usize, StorageError> {
        let Some(conn) = self.existing()? else {
            return Ok(0);
        };
        let tx = conn.unchecked_transaction()?;
        let mut removed = 0;
        for stamp in timestamps {
            removed += tx.execute(
                "DELETE FROM descriptors WHERE timestamp = ?1",
                rusqlite::params![to_sql_stamp(*stamp)],
            )?;
        }
        tx.commit()?;
        Ok(removed)
    }
}

/// Opens [`SqliteHistoryStore`]s and manages history folders on the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteStoreProvider;

impl SqliteStoreProvider {
    pub fn new() -> Self {
        Self
    }
}

fn copy_dir(from: &Path, to: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

impl StoreProvider for SqliteStoreProvider {
    fn open(
        &self,
        location: &Path,
        project: Option<&str>,
    ) -> Result<Box<dyn HistoryStore>, StorageError> {
        Ok(Box::new(SqliteHistoryStore::open(location, project)?))
    }

    fn exists(&self, location: &Path) -> bool {
        location.join(NAME_HISTORY_FILE).exists()
    }

    fn delete(&self, location: &Path) -> Result<(), StorageError> {
        if location.exists() {
            fs::remove_dir_all(location)?;
            debug!(location = %location.display(), "deleted history log");
        }
        Ok(())
    }

    fn relocate(&self, from: &Path, to: &Path) -> Result<bool, StorageError> {
        if !from.exists() {
            return Ok(false);
        }
        if to.exists() {
            fs::remove_dir_all(to)?;
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        // rename fails across file systems; fall back to copy + delete
        if fs::rename(from, to).is_err() {
            copy_dir(from, to)?;
            fs::remove_dir_all(from)?;
        }
        debug!(from = %from.display(), to = %to.display(), "relocated history log");
        Ok(true)
    }
}
