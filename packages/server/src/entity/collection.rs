use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a collection. Only `Active` collections accept uploads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    Active,
    Archived,
    Closed,
}

impl CollectionStatus {
    pub const ALL: [CollectionStatus; 3] = [Self::Active, Self::Archived, Self::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            "closed" => Ok(Self::Closed),
            other => Err(format!(
                "Status must be one of active, archived, closed (got '{other}')"
            )),
        }
    }
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "collection")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Uppercase access code. Unique across all rows, deleted ones included.
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// One of: active, archived, closed
    pub status: String,

    pub allow_upload: bool,
    pub max_file_size: i64,
    /// JSON array of lowercase extensions with a leading dot.
    #[sea_orm(column_type = "JsonBinary")]
    pub allowed_extensions: serde_json::Value,

    pub total_photos: i64,
    pub total_size_bytes: i64,
    pub last_upload_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub created_by: String,
    #[sea_orm(default_value = false, indexed)]
    pub is_deleted: bool,
}

impl Model {
    pub fn status(&self) -> Option<CollectionStatus> {
        self.status.parse().ok()
    }

    pub fn allowed_extensions(&self) -> Vec<String> {
        self.allowed_extensions
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Why this collection refuses uploads, or `None` if it accepts them.
    pub fn upload_block_reason(&self) -> Option<String> {
        match self.status() {
            Some(CollectionStatus::Active) => {}
            Some(CollectionStatus::Archived) => {
                return Some(
                    "This collection has been archived and is no longer accepting uploads."
                        .into(),
                );
            }
            Some(CollectionStatus::Closed) => {
                return Some("This collection is closed and no longer accepting uploads.".into());
            }
            None => return Some(format!("This collection is {}.", self.status)),
        }
        if !self.allow_upload {
            return Some("Upload is not currently allowed for this collection.".into());
        }
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}
