use std::time::Duration;

use lumen_common::retry::retry_with_backoff;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::config::DatabaseConfig;

/// Upper bound for a single backoff sleep between connection attempts.
const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Connect, retrying with backoff, then sync the schema from the entity registry.
pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let db = retry_with_backoff(
        "database connect",
        config.connect_retries,
        config.retry_base_ms,
        MAX_RETRY_DELAY_MS,
        || connect(&config.url),
    )
    .await?;

    sync_schema(&db).await?;
    info!("Database ready");
    Ok(db)
}

pub async fn connect(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(false);

    Database::connect(opt).await
}

pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.get_schema_registry("lumen_server::entity::*")
        .sync(db)
        .await
}
