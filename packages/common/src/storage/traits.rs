use std::fmt;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Top-level area a file is written under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Uploads,
    Thumbnails,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploads => "uploads",
            Self::Thumbnails => "thumbnails",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a saved file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path relative to the storage root, always `/`-separated.
    pub relative_path: String,
    /// `{prefix}_{sanitized name}` as written to disk.
    pub stored_filename: String,
}

/// Media file storage partitioned by collection code and upload month.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist `content` and return its location relative to the storage root.
    async fn save(
        &self,
        content: &[u8],
        original_filename: &str,
        collection_code: &str,
        kind: StorageKind,
    ) -> Result<StoredFile, StorageError>;

    /// Persist `content` as a companion of an already stored file.
    ///
    /// The companion mirrors the source path under `kind` with its extension
    /// replaced, so `uploads/K7MP2X/2024/05/3fa9_beach.png` with `"jpg"` lands
    /// at `thumbnails/K7MP2X/2024/05/3fa9_beach.jpg`.
    async fn save_companion(
        &self,
        content: &[u8],
        source_relative_path: &str,
        kind: StorageKind,
        extension: &str,
    ) -> Result<StoredFile, StorageError>;

    /// Open a stored file for streaming.
    async fn open(&self, relative_path: &str) -> Result<BoxReader, StorageError>;

    /// Read a stored file fully into memory.
    async fn read(&self, relative_path: &str) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.open(relative_path).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Remove a stored file.
    ///
    /// Returns `true` if the file was removed, `false` if it was already absent.
    async fn delete(&self, relative_path: &str) -> Result<bool, StorageError>;

    /// Map a stored relative path to a URL clients can fetch.
    fn url_for(&self, relative_path: &str) -> String;
}
