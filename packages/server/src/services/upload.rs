//! Per-file upload pipeline: validate, store, analyze, record.

use chrono::Utc;
use lumen_common::storage::extension_of;
use lumen_common::{MediaStore, StorageKind, imaging};
use sea_orm::{ConnectionTrait, DbErr, Set, TransactionSession, TransactionTrait};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::entity::{collection, photo};
use crate::models::photo::UploadResult;
use crate::repository::{CollectionRepository, PhotoRepository};

/// Content types accepted after sniffing the file's leading bytes.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// Why a single file was rejected. The display string is what the client sees.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0}")]
    CollectionUnavailable(String),
    #[error("{0}")]
    UnsupportedType(String),
    #[error("File size exceeds limit of {}", format_megabytes(.limit))]
    TooLarge { size: u64, limit: u64 },
    #[error("Failed to store file: {0}")]
    Storage(String),
    #[error("Failed to record photo: {0}")]
    Record(String),
}

fn format_megabytes(bytes: &u64) -> String {
    let mb = *bytes as f64 / (1024.0 * 1024.0);
    if mb.fract() == 0.0 {
        format!("{mb:.0}MB")
    } else {
        format!("{mb:.1}MB")
    }
}

/// Who sent the upload. Both fields are best-effort.
#[derive(Debug, Clone, Default)]
pub struct UploaderInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// One file taken from a multipart request.
///
/// `size` is the full size the client sent; `bytes` may be shorter when the
/// reader stopped buffering at the hard per-file ceiling.
#[derive(Debug)]
pub struct IncomingFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub size: u64,
}

impl IncomingFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        Self {
            filename: filename.into(),
            bytes,
            size,
        }
    }

    fn is_truncated(&self) -> bool {
        (self.bytes.len() as u64) < self.size
    }
}

/// Results of image analysis that are allowed to be missing.
struct Analysis {
    dimensions: Option<(u32, u32)>,
    exif: Option<imaging::ExifData>,
    thumbnail: Option<Vec<u8>>,
}

pub struct UploadPipeline<'a, C: ConnectionTrait + TransactionTrait> {
    conn: &'a C,
    media: &'a dyn MediaStore,
    thumbnail_size: u32,
}

impl<'a, C: ConnectionTrait + TransactionTrait> UploadPipeline<'a, C> {
    pub fn new(conn: &'a C, media: &'a dyn MediaStore, thumbnail_size: u32) -> Self {
        Self {
            conn,
            media,
            thumbnail_size,
        }
    }

    /// Run every file through the pipeline in order. One file's failure never
    /// affects its siblings.
    pub async fn process_batch(
        &self,
        collection_code: &str,
        files: Vec<IncomingFile>,
        uploader: &UploaderInfo,
    ) -> Vec<UploadResult> {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let filename = file.filename.clone();
            let result = match self.process_file(collection_code, file, uploader).await {
                Ok(photo) => UploadResult {
                    success: true,
                    filename,
                    photo_id: Some(photo.id),
                    file_size: Some(photo.file_size),
                    error: None,
                },
                Err(e) => {
                    warn!(%filename, error = %e, "Upload rejected");
                    UploadResult {
                        success: false,
                        filename,
                        photo_id: None,
                        file_size: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(result);
        }
        results
    }

    #[instrument(skip(self, file, uploader), fields(filename = %file.filename, size = file.size))]
    pub async fn process_file(
        &self,
        collection_code: &str,
        file: IncomingFile,
        uploader: &UploaderInfo,
    ) -> Result<photo::Model, UploadError> {
        let collection = self.available_collection(collection_code).await?;
        let mime_type = validate(&collection, &file)?;

        let original = self
            .media
            .save(&file.bytes, &file.filename, &collection.code, StorageKind::Uploads)
            .await
            .map_err(|e| UploadError::Storage(e.to_string()))?;

        let analysis = self.analyze(file.bytes).await;

        let thumbnail = match analysis.thumbnail {
            Some(jpeg) => {
                match self
                    .media
                    .save_companion(&jpeg, &original.relative_path, StorageKind::Thumbnails, "jpg")
                    .await
                {
                    Ok(stored) => Some(stored),
                    Err(e) => {
                        warn!(error = %e, "Failed to store thumbnail");
                        None
                    }
                }
            }
            None => None,
        };

        let (width, height) = match analysis.dimensions {
            Some((w, h)) => (i32::try_from(w).ok(), i32::try_from(h).ok()),
            None => (None, None),
        };
        let exif = analysis
            .exif
            .and_then(|data| serde_json::to_value(data).ok());

        let record = photo::ActiveModel {
            id: Set(Uuid::now_v7()),
            collection_code: Set(collection.code.clone()),
            filename: Set(file.filename.clone()),
            stored_filename: Set(original.stored_filename.clone()),
            file_path: Set(original.relative_path.clone()),
            thumbnail_path: Set(thumbnail.as_ref().map(|t| t.relative_path.clone())),
            file_size: Set(file.size as i64),
            mime_type: Set(mime_type.to_string()),
            width: Set(width),
            height: Set(height),
            uploader_ip: Set(uploader.ip.clone()),
            uploader_user_agent: Set(uploader.user_agent.clone()),
            exif: Set(exif),
            processing_status: Set(photo::STATUS_PROCESSED.to_string()),
            uploaded_at: Set(Utc::now()),
            is_deleted: Set(false),
        };

        let photo = match self.record(record, &collection.code).await {
            Ok(photo) => photo,
            Err(e) => {
                self.discard(&original.relative_path).await;
                if let Some(thumb) = &thumbnail {
                    self.discard(&thumb.relative_path).await;
                }
                return Err(UploadError::Record(e.to_string()));
            }
        };

        info!(photo_id = %photo.id, code = %collection.code, "Photo uploaded");
        Ok(photo)
    }

    /// Insert the photo and bump the collection statistics in one transaction.
    async fn record(&self, record: photo::ActiveModel, code: &str) -> Result<photo::Model, DbErr> {
        let txn = self.conn.begin().await?;

        let photo = PhotoRepository::new(&txn).create(record).await?;
        let counted = CollectionRepository::new(&txn)
            .increment_statistics(code, photo.file_size)
            .await?;
        if !counted {
            txn.rollback().await?;
            return Err(DbErr::RecordNotUpdated);
        }

        txn.commit().await?;
        Ok(photo)
    }

    async fn available_collection(&self, code: &str) -> Result<collection::Model, UploadError> {
        let collection = CollectionRepository::new(self.conn)
            .find_by_code(code)
            .await
            .map_err(|e| UploadError::Record(e.to_string()))?
            .ok_or_else(|| UploadError::CollectionUnavailable("Collection not found".into()))?;

        match collection.upload_block_reason() {
            Some(reason) => Err(UploadError::CollectionUnavailable(reason)),
            None => Ok(collection),
        }
    }

    /// Decoding is CPU-bound, so it runs off the async workers.
    async fn analyze(&self, bytes: Vec<u8>) -> Analysis {
        let size = self.thumbnail_size;
        let job = tokio::task::spawn_blocking(move || {
            let thumbnail = match imaging::generate_thumbnail(&bytes, size, size) {
                Ok(jpeg) => Some(jpeg),
                Err(e) => {
                    warn!(error = %e, "Thumbnail generation failed");
                    None
                }
            };
            let exif = imaging::extract_exif(&bytes);
            if exif.is_none() {
                debug!("No EXIF data");
            }
            Analysis {
                dimensions: imaging::dimensions(&bytes),
                exif,
                thumbnail,
            }
        });

        match job.await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "Image analysis task failed");
                Analysis {
                    dimensions: None,
                    exif: None,
                    thumbnail: None,
                }
            }
        }
    }

    async fn discard(&self, relative_path: &str) {
        if let Err(e) = self.media.delete(relative_path).await {
            warn!(path = relative_path, error = %e, "Failed to remove orphaned file");
        }
    }
}

/// Extension, then sniffed content, then size. Returns the sniffed MIME type.
fn validate(
    collection: &collection::Model,
    file: &IncomingFile,
) -> Result<&'static str, UploadError> {
    let ext = extension_of(&file.filename).unwrap_or_default();
    if !collection.allowed_extensions().iter().any(|allowed| *allowed == ext) {
        let shown = if ext.is_empty() { "(none)" } else { ext.as_str() };
        return Err(UploadError::UnsupportedType(format!(
            "File type {shown} not allowed"
        )));
    }

    let mime = imaging::detect_mime(&file.bytes)
        .filter(|mime| ALLOWED_MIME_TYPES.contains(mime))
        .ok_or_else(|| {
            UploadError::UnsupportedType(
                "Invalid file type: content is not a supported image".into(),
            )
        })?;

    let limit = u64::try_from(collection.max_file_size).unwrap_or(0);
    if file.size > limit || file.is_truncated() {
        return Err(UploadError::TooLarge {
            size: file.size,
            limit,
        });
    }

    Ok(mime)
}
