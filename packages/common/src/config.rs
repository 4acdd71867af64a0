use std::path::PathBuf;

use serde::Deserialize;

/// Media storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for uploads and thumbnails. Default: "./storage".
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// URL prefix under which stored files are served. Default: "/storage".
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Bounding box for generated thumbnails, in pixels. Default: 400.
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./storage")
}
fn default_public_prefix() -> String {
    "/storage".into()
}
fn default_thumbnail_size() -> u32 {
    crate::imaging::THUMBNAIL_BOX.0
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            public_prefix: default_public_prefix(),
            thumbnail_size: default_thumbnail_size(),
        }
    }
}
