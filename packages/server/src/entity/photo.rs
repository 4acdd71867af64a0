use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const STATUS_PROCESSED: &str = "processed";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "photo")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Code of the collection this photo was uploaded to. Not a foreign key.
    #[sea_orm(indexed)]
    pub collection_code: String,

    /// Original client filename.
    pub filename: String,
    pub stored_filename: String,
    /// Relative to the storage root.
    pub file_path: String,
    pub thumbnail_path: Option<String>,
    pub file_size: i64,
    /// Sniffed from content, not taken from the client.
    pub mime_type: String,
    pub width: Option<i32>,
    pub height: Option<i32>,

    pub uploader_ip: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub uploader_user_agent: Option<String>,

    /// NULL when the image carried no readable EXIF block.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub exif: Option<serde_json::Value>,

    /// One of: pending, processed, failed
    pub processing_status: String,

    pub uploaded_at: DateTimeUtc,
    #[sea_orm(default_value = false)]
    pub is_deleted: bool,
}

impl ActiveModelBehavior for ActiveModel {}
