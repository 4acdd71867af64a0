use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use rand::RngCore;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::filename::sanitize_filename;
use super::traits::{BoxReader, MediaStore, StorageKind, StoredFile};

/// Bytes of randomness in the stored filename prefix (12 hex characters).
const PREFIX_BYTES: usize = 6;

/// Filesystem-backed media store.
///
/// Files land at
/// `{base_path}/{kind}/{collection_code}/{yyyy}/{mm}/{prefix}_{sanitized name}`.
/// Writes go to `{base_path}/.tmp` first and are renamed into place, so a
/// reader never observes a partially written file.
pub struct FilesystemMediaStore {
    base_path: PathBuf,
    public_prefix: String,
}

impl FilesystemMediaStore {
    /// Create a new filesystem media store.
    pub async fn new(
        base_path: PathBuf,
        public_prefix: impl Into<String>,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path.join(".tmp").join(random_token())
    }

    /// Resolve a stored relative path, rejecting anything that could escape the root.
    fn resolve(&self, relative_path: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(relative_path);
        let is_plain = !relative_path.is_empty()
            && !relative_path.contains('\\')
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(part) if !part.to_string_lossy().starts_with('.')));

        if !is_plain {
            return Err(StorageError::InvalidPath(relative_path.to_string()));
        }
        Ok(self.base_path.join(rel))
    }

    /// Write to a temp file, then rename it to `relative_path`.
    async fn write_atomic(&self, relative_path: &str, content: &[u8]) -> Result<(), StorageError> {
        let final_path = self.resolve(relative_path)?;
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.temp_path();
        let write = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(content).await?;
            file.sync_all().await?;
            Ok::<_, std::io::Error>(())
        };
        if let Err(e) = write.await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(path = %relative_path, bytes = content.len(), "Stored media file");
        Ok(())
    }
}

fn random_token() -> String {
    let mut bytes = [0u8; PREFIX_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// `{kind}/{code}/{yyyy}/{mm}` for the current month.
fn partition(kind: StorageKind, collection_code: &str) -> String {
    let now = Utc::now();
    format!(
        "{}/{}/{:04}/{:02}",
        kind.as_str(),
        sanitize_filename(collection_code),
        now.year(),
        now.month()
    )
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn save(
        &self,
        content: &[u8],
        original_filename: &str,
        collection_code: &str,
        kind: StorageKind,
    ) -> Result<StoredFile, StorageError> {
        let stored_filename = format!("{}_{}", random_token(), sanitize_filename(original_filename));
        let relative_dir = partition(kind, collection_code);
        let relative_path = format!("{relative_dir}/{stored_filename}");

        self.write_atomic(&relative_path, content).await?;

        Ok(StoredFile {
            relative_path,
            stored_filename,
        })
    }

    async fn save_companion(
        &self,
        content: &[u8],
        source_relative_path: &str,
        kind: StorageKind,
        extension: &str,
    ) -> Result<StoredFile, StorageError> {
        self.resolve(source_relative_path)?;
        let invalid = || StorageError::InvalidPath(source_relative_path.to_string());

        let (_, rest) = source_relative_path.split_once('/').ok_or_else(invalid)?;
        let (dir, source_name) = rest.rsplit_once('/').ok_or_else(invalid)?;
        let stem = match source_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => source_name,
        };

        let stored_filename = format!("{stem}.{}", extension.trim_start_matches('.'));
        let relative_path = format!("{}/{dir}/{stored_filename}", kind.as_str());
        self.write_atomic(&relative_path, content).await?;

        Ok(StoredFile {
            relative_path,
            stored_filename,
        })
    }

    async fn open(&self, relative_path: &str) -> Result<BoxReader, StorageError> {
        let path = self.resolve(relative_path)?;
        if fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            return Err(StorageError::NotFound(relative_path.to_string()));
        }
        match fs::File::open(&path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(relative_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, relative_path: &str) -> Result<bool, StorageError> {
        let path = self.resolve(relative_path)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn url_for(&self, relative_path: &str) -> String {
        format!("{}/{}", self.public_prefix, relative_path.trim_start_matches('/'))
    }
}
