//! File loading port for file-backed variables.

use std::path::{Path, PathBuf};

/// Error type for file loading.
#[derive(Debug, thiserror::Error)]
pub enum FileLoadError {
    /// File not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Path is not a regular file.
    #[error("Path is not a file: {0}")]
    NotAFile(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file read and encoded for a file-backed variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    /// File name shown on the chip.
    pub name: String,
    /// Guessed MIME type.
    pub mime_type: String,
    /// File contents, base64 encoded.
    pub data: String,
}

/// Abstraction over reading files chosen by the user.
///
/// This trait allows mocking file access in tests.
pub trait FileLoader: Send + Sync {
    /// Reads and base64 encodes a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn load(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<LoadedFile, FileLoadError>> + Send;
}
