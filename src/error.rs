#![deny(warnings)]

// Error types for the filewriter crate

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure causes for file writer operations.
///
/// Every variant carries the path it concerns so callers can report it
/// without holding on to the writer.
#[derive(Error, Debug)]
pub enum FileWriterError {
    /// Parent directory could not be created
    #[error("Failed to create parent directories for {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    /// Missing file could not be created
    #[error("Failed to create file {}: {source}", .path.display())]
    CreateFile { path: PathBuf, source: io::Error },

    /// Current content could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    /// Exclusive lock could not be taken
    #[error("Failed to lock {}: {source}", .path.display())]
    Lock { path: PathBuf, source: io::Error },

    /// Content could not be written
    #[error("Failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    /// File could not be removed
    #[error("Failed to delete {}: {source}", .path.display())]
    Delete { path: PathBuf, source: io::Error },

    /// File does not exist
    #[error("File not found: {}", .path.display())]
    NotFound { path: PathBuf },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, FileWriterError>;

impl FileWriterError {
    /// Path the failed operation was targeting
    pub fn path(&self) -> &Path {
        match self {
            FileWriterError::CreateDir { path, .. }
            | FileWriterError::CreateFile { path, .. }
            | FileWriterError::Read { path, .. }
            | FileWriterError::Lock { path, .. }
            | FileWriterError::Write { path, .. }
            | FileWriterError::Delete { path, .. }
            | FileWriterError::NotFound { path } => path.as_path(),
        }
    }

    /// Underlying I/O error kind, if the failure came from the OS
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            FileWriterError::CreateDir { source, .. }
            | FileWriterError::CreateFile { source, .. }
            | FileWriterError::Read { source, .. }
            | FileWriterError::Lock { source, .. }
            | FileWriterError::Write { source, .. }
            | FileWriterError::Delete { source, .. } => Some(source.kind()),
            FileWriterError::NotFound { .. } => None,
        }
    }
}
