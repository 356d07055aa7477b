//! File loader backed by `tokio::fs`.

use std::io::ErrorKind;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use courier_application::ports::{FileLoadError, FileLoader, LoadedFile};
use tokio::fs;

/// Reads files for file-backed variables, base64 encoding the contents and
/// guessing the MIME type from the extension.
#[derive(Debug, Clone, Default)]
pub struct TokioFileLoader;

impl TokioFileLoader {
    /// Creates a new `TokioFileLoader`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl FileLoader for TokioFileLoader {
    async fn load(&self, path: &Path) -> Result<LoadedFile, FileLoadError> {
        let metadata = fs::metadata(path).await.map_err(|e| map_io(e, path))?;
        if !metadata.is_file() {
            return Err(FileLoadError::NotAFile(path.to_path_buf()));
        }

        let content = fs::read(path).await.map_err(|e| map_io(e, path))?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        tracing::debug!(
            target: "courier::files",
            path = %path.display(),
            bytes = content.len(),
            %mime_type,
            "loaded file"
        );

        Ok(LoadedFile {
            name,
            mime_type,
            data: STANDARD.encode(content),
        })
    }
}

fn map_io(error: std::io::Error, path: &Path) -> FileLoadError {
    match error.kind() {
        ErrorKind::NotFound => FileLoadError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => FileLoadError::PermissionDenied(path.to_path_buf()),
        _ => FileLoadError::Io(error),
    }
}
