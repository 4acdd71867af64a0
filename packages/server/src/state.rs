use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::Algorithm;
use lumen_common::MediaStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::utils::jwt::JwtSettings;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub media: Arc<dyn MediaStore>,
}

impl AppState {
    pub fn jwt_settings(&self) -> JwtSettings<'_> {
        let auth = &self.config.auth;
        JwtSettings {
            secret: &auth.jwt_secret,
            // Validated when the config is loaded.
            algorithm: auth.algorithm().unwrap_or(Algorithm::HS256),
            ttl: Duration::minutes(auth.jwt_expires_minutes),
        }
    }
}
