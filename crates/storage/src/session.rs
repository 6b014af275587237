use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use refhist_core::RefactoringDescriptor;

use crate::error::StorageError;

pub const SESSION_VERSION: u32 = 1;

/// A batch of descriptors exchanged through a byte stream (export / import).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefactoringSession {
    pub version: u32,
    pub comment: Option<String>,
    pub refactorings: Vec<RefactoringDescriptor>,
}

impl RefactoringSession {
    pub fn new(refactorings: Vec<RefactoringDescriptor>) -> Self {
        Self {
            version: SESSION_VERSION,
            comment: None,
            refactorings,
        }
    }
}

pub fn write_session<W: Write>(writer: &mut W, session: &RefactoringSession) -> Result<(), StorageError> {
    rmp_serde::encode::write_named(writer, session)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    writer.flush()?;
    Ok(())
}

pub fn read_session<R: Read>(reader: R) -> Result<RefactoringSession, StorageError> {
    let session: RefactoringSession =
        rmp_serde::from_read(reader).map_err(|e| StorageError::Serialization(e.to_string()))?;
    if session.version != SESSION_VERSION {
        return Err(StorageError::UnsupportedVersion {
            found: session.version,
            expected: SESSION_VERSION,
        });
    }
    Ok(session)
}
