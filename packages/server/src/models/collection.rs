use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::double_option;
use crate::entity::collection::{self, CollectionStatus};
use crate::error::AppError;

pub const DEFAULT_MAX_FILE_SIZE: i64 = 10 * 1024 * 1024;
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

const NAME_MIN_CHARS: usize = 3;
const NAME_MAX_CHARS: usize = 100;
const DESCRIPTION_MAX_CHARS: usize = 500;

/// Upload settings of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CollectionSettings {
    pub allow_upload: bool,
    /// Per-file limit in bytes.
    #[schema(example = 10485760)]
    pub max_file_size: i64,
    /// Lowercase extensions with a leading dot.
    #[schema(example = json!([".jpg", ".jpeg", ".png", ".gif", ".webp"]))]
    pub allowed_extensions: Vec<String>,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            allow_upload: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CollectionSettings {
    /// Apply the fields present in `patch` on top of `self`.
    pub fn merged(mut self, patch: &SettingsPatch) -> Result<Self, AppError> {
        if let Some(allow_upload) = patch.allow_upload {
            self.allow_upload = allow_upload;
        }
        if let Some(max_file_size) = patch.max_file_size {
            if max_file_size <= 0 {
                return Err(AppError::Validation(
                    "max_file_size must be greater than 0".into(),
                ));
            }
            self.max_file_size = max_file_size;
        }
        if let Some(ref extensions) = patch.allowed_extensions {
            self.allowed_extensions = normalize_extensions(extensions)?;
        }
        Ok(self)
    }

    pub fn from_model(m: &collection::Model) -> Self {
        Self {
            allow_upload: m.allow_upload,
            max_file_size: m.max_file_size,
            allowed_extensions: m.allowed_extensions(),
        }
    }
}

/// Partial settings object accepted by create and update requests.
/// Unknown keys are ignored.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct SettingsPatch {
    pub allow_upload: Option<bool>,
    pub max_file_size: Option<i64>,
    pub allowed_extensions: Option<Vec<String>>,
}

/// Lowercase, trim, add the leading dot and drop duplicates, keeping order.
pub fn normalize_extensions(extensions: &[String]) -> Result<Vec<String>, AppError> {
    let mut out: Vec<String> = Vec::with_capacity(extensions.len());
    for raw in extensions {
        let ext = raw.trim().trim_start_matches('.').to_ascii_lowercase();
        if ext.is_empty()
            || !ext.chars().all(|c| c.is_ascii_alphanumeric())
            || ext.len() > 10
        {
            return Err(AppError::Validation(format!("Invalid file extension '{raw}'")));
        }
        let ext = format!(".{ext}");
        if !out.contains(&ext) {
            out.push(ext);
        }
    }
    Ok(out)
}

/// Usage counters maintained by the upload pipeline.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CollectionStatistics {
    #[schema(example = 12)]
    pub total_photos: i64,
    #[schema(example = 24000000)]
    pub total_size_bytes: i64,
    pub last_upload_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCollectionRequest {
    #[schema(example = "Wedding Photos")]
    pub name: String,
    #[schema(example = "Alex & Sam's wedding")]
    pub description: Option<String>,
    /// Defaults to `active`.
    #[schema(example = "active")]
    pub status: Option<String>,
    /// Merged over the default settings.
    pub settings: Option<SettingsPatch>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateCollectionRequest {
    pub name: Option<String>,
    /// `null` clears the description.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    /// Merged over the collection's current settings.
    pub settings: Option<SettingsPatch>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CollectionListQuery {
    /// 1-based page number. Default: 1.
    pub page: Option<u64>,
    /// Page size, 1-100. Default: 20.
    pub limit: Option<u64>,
    /// Only return collections with this status.
    pub status: Option<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CollectionCountQuery {
    /// Count only collections with this status.
    pub status: Option<String>,
}

/// Counts of non-deleted collections. Per-status counts are only present
/// when no `status` filter was given.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CollectionCountResponse {
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CollectionResponse {
    pub id: i32,
    #[schema(example = "K7MP2X")]
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "active")]
    pub status: String,
    pub settings: CollectionSettings,
    pub statistics: CollectionStatistics,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl From<collection::Model> for CollectionResponse {
    fn from(m: collection::Model) -> Self {
        let settings = CollectionSettings::from_model(&m);
        Self {
            id: m.id,
            code: m.code,
            name: m.name,
            description: m.description,
            status: m.status,
            settings,
            statistics: CollectionStatistics {
                total_photos: m.total_photos,
                total_size_bytes: m.total_size_bytes,
                last_upload_at: m.last_upload_at,
            },
            created_at: m.created_at,
            created_by: m.created_by,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ValidateCodeRequest {
    /// Access code, case-insensitive.
    #[schema(example = "k7mp2x")]
    pub code: String,
}

/// What a guest needs to know before uploading.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicCollection {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub settings: PublicSettings,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicSettings {
    pub max_file_size: i64,
    pub allowed_extensions: Vec<String>,
}

impl From<collection::Model> for PublicCollection {
    fn from(m: collection::Model) -> Self {
        let allowed_extensions = m.allowed_extensions();
        Self {
            code: m.code,
            name: m.name,
            description: m.description,
            settings: PublicSettings {
                max_file_size: m.max_file_size,
                allowed_extensions,
            },
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ValidateCodeResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<PublicCollection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidateCodeResponse {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            collection: None,
            message: Some(message.into()),
        }
    }
}

/// Parse a status value from a request, rejecting anything outside the allowed set.
pub fn parse_status(raw: &str) -> Result<CollectionStatus, AppError> {
    raw.trim().parse().map_err(AppError::Validation)
}

fn validate_name(name: &str) -> Result<(), AppError> {
    let len = name.trim().chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(AppError::Validation(format!(
            "Name must be {NAME_MIN_CHARS}-{NAME_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), AppError> {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "Description must be at most {DESCRIPTION_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn validate_create_collection(req: &CreateCollectionRequest) -> Result<(), AppError> {
    validate_name(&req.name)?;
    if let Some(ref description) = req.description {
        validate_description(description)?;
    }
    if let Some(ref status) = req.status {
        parse_status(status)?;
    }
    Ok(())
}

pub fn validate_update_collection(req: &UpdateCollectionRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_name(name)?;
    }
    if let Some(Some(ref description)) = req.description {
        validate_description(description)?;
    }
    if let Some(ref status) = req.status {
        parse_status(status)?;
    }
    Ok(())
}
