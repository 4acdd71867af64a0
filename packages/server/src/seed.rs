use chrono::Utc;
use sea_orm::*;
use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder};
use tracing::info;

use crate::config::AdminConfig;
use crate::entity::{collection, photo, user};
use crate::utils::hash;

/// Create the bootstrap admin account if a password is configured and the user is missing.
///
/// Returns `true` if a user was inserted.
pub async fn seed_default_admin(db: &DatabaseConnection, admin: &AdminConfig) -> Result<bool, DbErr> {
    let Some(password) = admin.password.as_deref() else {
        info!("No admin password configured, skipping default admin seed");
        return Ok(false);
    };

    let password = hash::hash_password(password)
        .map_err(|e| DbErr::Custom(format!("Password hash error: {e}")))?;
    let now = Utc::now();

    let model = user::ActiveModel {
        username: Set(admin.username.clone()),
        password: Set(password),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = user::Entity::insert(model)
        .on_conflict(
            OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(0) | Err(DbErr::RecordNotInserted) => Ok(false),
        Ok(_) => {
            info!(username = %admin.username, "Seeded default admin user");
            Ok(true)
        }
        Err(e) => Err(e),
    }
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Photo listing per collection, newest first.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_photo_collection_uploaded")
        .table(photo::Entity)
        .col(photo::Column::CollectionCode)
        .col(photo::Column::UploadedAt)
        .to_string(PostgresQueryBuilder);
    create_index(db, "idx_photo_collection_uploaded", &stmt).await;

    // Admin listing: non-deleted, optional status filter, newest first.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_collection_deleted_status_created")
        .table(collection::Entity)
        .col(collection::Column::IsDeleted)
        .col(collection::Column::Status)
        .col(collection::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);
    create_index(db, "idx_collection_deleted_status_created", &stmt).await;

    Ok(())
}

async fn create_index(db: &DatabaseConnection, name: &str, stmt: &str) {
    match db.execute_unprepared(stmt).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
    }
}
