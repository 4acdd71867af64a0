use chrono::Utc;
use lumen_common::CodeError;
use lumen_common::access_code::{self, CODE_LENGTH, DEFAULT_MAX_RETRIES};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, SqlErr,
};
use thiserror::Error;
use tracing::{debug, info};

use super::page_offset;
use crate::entity::collection::{self, CollectionStatus};
use crate::models::collection::CollectionSettings;

#[derive(Debug, Error)]
pub enum CreateCollectionError {
    #[error(transparent)]
    Db(#[from] DbErr),
    #[error(transparent)]
    Code(#[from] CodeError),
}

/// Everything needed to insert a collection except its code.
#[derive(Debug, Clone)]
pub struct NewCollection {
    pub name: String,
    pub description: Option<String>,
    pub status: CollectionStatus,
    pub settings: CollectionSettings,
    pub created_by: String,
}

/// Fields to change on update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct CollectionChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<CollectionStatus>,
    pub settings: Option<CollectionSettings>,
}

impl CollectionChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.settings.is_none()
    }
}

/// Collection persistence. Every read and write on a live collection is
/// filtered by [`Self::not_deleted`], so soft-deleted rows are invisible to
/// callers. Only the code reservation check looks at every row.
pub struct CollectionRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
    max_code_attempts: u32,
}

impl<'a, C: ConnectionTrait> CollectionRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self {
            conn,
            max_code_attempts: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_code_attempts(mut self, attempts: u32) -> Self {
        self.max_code_attempts = attempts;
        self
    }

    /// The soft-delete predicate.
    fn not_deleted() -> Condition {
        Condition::all().add(collection::Column::IsDeleted.eq(false))
    }

    fn visible() -> Select<collection::Entity> {
        collection::Entity::find().filter(Self::not_deleted())
    }

    fn with_status(
        select: Select<collection::Entity>,
        status: Option<CollectionStatus>,
    ) -> Select<collection::Entity> {
        match status {
            Some(status) => select.filter(collection::Column::Status.eq(status.as_str())),
            None => select,
        }
    }

    /// Case-insensitive lookup of a non-deleted collection.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<collection::Model>, DbErr> {
        Self::visible()
            .filter(collection::Column::Code.eq(access_code::normalize(code)))
            .one(self.conn)
            .await
    }

    /// Whether any row, deleted or not, holds `code`.
    ///
    /// Deleted collections keep their code reserved because the unique
    /// index covers every row.
    pub async fn code_taken(&self, code: String) -> Result<bool, DbErr> {
        let n = collection::Entity::find()
            .filter(collection::Column::Code.eq(code))
            .count(self.conn)
            .await?;
        Ok(n > 0)
    }

    /// Newest first.
    pub async fn list(
        &self,
        status: Option<CollectionStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<Vec<collection::Model>, DbErr> {
        Self::with_status(Self::visible(), status)
            .order_by_desc(collection::Column::CreatedAt)
            .order_by_desc(collection::Column::Id)
            .offset(page_offset(page, per_page))
            .limit(per_page)
            .all(self.conn)
            .await
    }

    pub async fn count(&self, status: Option<CollectionStatus>) -> Result<u64, DbErr> {
        Self::with_status(Self::visible(), status)
            .count(self.conn)
            .await
    }

    /// Insert with a freshly generated code.
    pub async fn create(&self, new: NewCollection) -> Result<collection::Model, CreateCollectionError> {
        let new = &new;
        let model = self
            .claim_code(|code| async move {
                match self.insert(&code, new).await {
                    Ok(model) => Ok(Some(model)),
                    Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                        debug!(%code, "Code claimed concurrently, regenerating");
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            })
            .await?;
        info!(code = %model.code, id = model.id, "Created collection");
        Ok(model)
    }

    /// Draw unused codes and hand each to `insert` until one sticks.
    ///
    /// `insert` returns `Ok(None)` when the code was claimed between the
    /// existence check and the insert. That candidate is spent and a new one
    /// is drawn from the remaining attempts.
    async fn claim_code<T, F, Fut>(&self, mut insert: F) -> Result<T, CreateCollectionError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Option<T>, DbErr>>,
    {
        let mut attempts_used = 0u32;

        while attempts_used < self.max_code_attempts {
            let mut checks = 0u32;
            let code = access_code::generate_unique(
                |candidate| {
                    checks += 1;
                    self.code_taken(candidate)
                },
                CODE_LENGTH,
                self.max_code_attempts - attempts_used,
            )
            .await;
            attempts_used += checks;
            let Ok(code) = code else {
                break;
            };

            if let Some(inserted) = insert(code).await? {
                return Ok(inserted);
            }
        }

        Err(CodeError::GenerationExhausted {
            attempts: self.max_code_attempts,
        }
        .into())
    }

    async fn insert(&self, code: &str, new: &NewCollection) -> Result<collection::Model, DbErr> {
        collection::ActiveModel {
            code: Set(code.to_string()),
            name: Set(new.name.trim().to_string()),
            description: Set(new.description.clone()),
            status: Set(new.status.as_str().to_string()),
            allow_upload: Set(new.settings.allow_upload),
            max_file_size: Set(new.settings.max_file_size),
            allowed_extensions: Set(serde_json::json!(new.settings.allowed_extensions)),
            total_photos: Set(0),
            total_size_bytes: Set(0),
            last_upload_at: Set(None),
            created_at: Set(Utc::now()),
            created_by: Set(new.created_by.clone()),
            is_deleted: Set(false),
            ..Default::default()
        }
        .insert(self.conn)
        .await
    }

    /// Apply only the supplied fields. Returns `None` if no visible collection has `code`.
    pub async fn update(
        &self,
        code: &str,
        changes: CollectionChanges,
    ) -> Result<Option<collection::Model>, DbErr> {
        let Some(existing) = self.find_by_code(code).await? else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(existing));
        }

        let mut active: collection::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(settings) = changes.settings {
            active.allow_upload = Set(settings.allow_upload);
            active.max_file_size = Set(settings.max_file_size);
            active.allowed_extensions = Set(serde_json::json!(settings.allowed_extensions));
        }

        active.update(self.conn).await.map(Some)
    }

    /// Set the soft-delete flag. Returns `false` if nothing visible matched.
    pub async fn soft_delete(&self, code: &str) -> Result<bool, DbErr> {
        let result = collection::Entity::update_many()
            .col_expr(collection::Column::IsDeleted, Expr::value(true))
            .filter(collection::Column::Code.eq(access_code::normalize(code)))
            .filter(Self::not_deleted())
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Record one uploaded photo of `bytes` bytes in a single UPDATE.
    ///
    /// Returns `false` if the collection is gone.
    pub async fn increment_statistics(&self, code: &str, bytes: i64) -> Result<bool, DbErr> {
        let result = collection::Entity::update_many()
            .col_expr(
                collection::Column::TotalPhotos,
                Expr::col(collection::Column::TotalPhotos).add(1),
            )
            .col_expr(
                collection::Column::TotalSizeBytes,
                Expr::col(collection::Column::TotalSizeBytes).add(bytes),
            )
            .col_expr(collection::Column::LastUploadAt, Expr::value(Utc::now()))
            .filter(collection::Column::Code.eq(access_code::normalize(code)))
            .filter(Self::not_deleted())
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
