use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::Pagination;
use crate::entity::photo;

/// Outcome for one file of an upload request.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UploadResult {
    pub success: bool,
    /// Filename as sent by the client.
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub uploaded: Vec<UploadResult>,
    pub failed: Vec<UploadResult>,
    pub total: usize,
    pub success_count: usize,
    pub failed_count: usize,
}

impl UploadResponse {
    pub fn from_results(results: Vec<UploadResult>) -> Self {
        let total = results.len();
        let (uploaded, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.success);
        Self {
            success_count: uploaded.len(),
            failed_count: failed.len(),
            uploaded,
            failed,
            total,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PhotoListQuery {
    /// 1-based page number. Default: 1.
    pub page: Option<u64>,
    /// Page size, 1-100. Default: 20.
    pub limit: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PhotoResponse {
    pub id: Uuid,
    pub collection_code: String,
    pub filename: String,
    /// Where the original can be fetched.
    #[schema(example = "/storage/uploads/K7MP2X/2024/05/3fa9c1d2e4b7_beach.jpg")]
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub file_size: i64,
    #[schema(example = "image/jpeg")]
    pub mime_type: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub exif: Option<serde_json::Value>,
    pub uploaded_at: DateTime<Utc>,
}

impl PhotoResponse {
    pub fn new(m: photo::Model, url_for: impl Fn(&str) -> String) -> Self {
        Self {
            id: m.id,
            url: url_for(&m.file_path),
            thumbnail_url: m.thumbnail_path.as_deref().map(&url_for),
            collection_code: m.collection_code,
            filename: m.filename,
            file_size: m.file_size,
            mime_type: m.mime_type,
            width: m.width,
            height: m.height,
            exif: m.exif,
            uploaded_at: m.uploaded_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PhotoListResponse {
    pub data: Vec<PhotoResponse>,
    pub pagination: Pagination,
}
