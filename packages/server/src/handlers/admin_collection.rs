use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::entity::collection::{self, CollectionStatus};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::collection::*;
use crate::models::photo::{PhotoListQuery, PhotoListResponse, PhotoResponse};
use crate::models::shared::{Pagination, page_params};
use crate::repository::{CollectionChanges, CollectionRepository, NewCollection, PhotoRepository};
use crate::state::AppState;

fn not_found(code: &str) -> AppError {
    AppError::NotFound(format!("Collection '{code}' not found"))
}

async fn find_collection(state: &AppState, code: &str) -> Result<collection::Model, AppError> {
    CollectionRepository::new(&state.db)
        .find_by_code(code)
        .await?
        .ok_or_else(|| not_found(code))
}

fn status_filter(raw: Option<&str>) -> Result<Option<CollectionStatus>, AppError> {
    raw.map(parse_status).transpose()
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Admin Collections",
    operation_id = "createCollection",
    summary = "Create a collection",
    description = "Creates a collection with a freshly generated 6-character access code. \
        Supplied settings are merged over the defaults.",
    request_body = CreateCollectionRequest,
    responses(
        (status = 201, description = "Collection created", body = CollectionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "No free access code found (CODE_GENERATION_EXHAUSTED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_collection(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCollectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_collection(&payload)?;

    let status = match payload.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => CollectionStatus::Active,
    };
    let settings = match payload.settings {
        Some(ref patch) => CollectionSettings::default().merged(patch)?,
        None => CollectionSettings::default(),
    };

    let model = CollectionRepository::new(&state.db)
        .create(NewCollection {
            name: payload.name,
            description: payload.description,
            status,
            settings,
            created_by: auth_user.user.username,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CollectionResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Admin Collections",
    operation_id = "listCollections",
    summary = "List collections",
    description = "Returns non-deleted collections, newest first, optionally filtered by status.",
    params(CollectionListQuery),
    responses(
        (status = 200, description = "One page of collections", body = Vec<CollectionResponse>),
        (status = 400, description = "Invalid page, limit or status (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_collections(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<CollectionListQuery>,
) -> Result<Json<Vec<CollectionResponse>>, AppError> {
    let (page, limit) = page_params(query.page, query.limit)?;
    let status = status_filter(query.status.as_deref())?;

    let data = CollectionRepository::new(&state.db)
        .list(status, page, limit)
        .await?
        .into_iter()
        .map(CollectionResponse::from)
        .collect();

    Ok(Json(data))
}

#[utoipa::path(
    get,
    path = "/stats/count",
    tag = "Admin Collections",
    operation_id = "countCollections",
    summary = "Count collections",
    description = "Counts non-deleted collections. Without a `status` filter the response also \
        breaks the total down per status.",
    params(CollectionCountQuery),
    responses(
        (status = 200, description = "Counts", body = CollectionCountResponse),
        (status = 400, description = "Invalid status (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn count_collections(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<CollectionCountQuery>,
) -> Result<Json<CollectionCountResponse>, AppError> {
    let repo = CollectionRepository::new(&state.db);

    if let Some(status) = status_filter(query.status.as_deref())? {
        return Ok(Json(CollectionCountResponse {
            total: repo.count(Some(status)).await?,
            active: None,
            archived: None,
            closed: None,
        }));
    }

    Ok(Json(CollectionCountResponse {
        total: repo.count(None).await?,
        active: Some(repo.count(Some(CollectionStatus::Active)).await?),
        archived: Some(repo.count(Some(CollectionStatus::Archived)).await?),
        closed: Some(repo.count(Some(CollectionStatus::Closed)).await?),
    }))
}

#[utoipa::path(
    get,
    path = "/{code}",
    tag = "Admin Collections",
    operation_id = "getCollection",
    summary = "Get a collection by access code",
    params(("code" = String, Path, description = "Access code (case-insensitive)")),
    responses(
        (status = 200, description = "Collection details", body = CollectionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Collection not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(code = %code))]
pub async fn get_collection(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<CollectionResponse>, AppError> {
    let model = find_collection(&state, &code).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{code}",
    tag = "Admin Collections",
    operation_id = "updateCollection",
    summary = "Update a collection",
    description = "Partial update: only supplied fields change. A `settings` object is merged \
        over the current settings; `description: null` clears the description.",
    params(("code" = String, Path, description = "Access code (case-insensitive)")),
    request_body = UpdateCollectionRequest,
    responses(
        (status = 200, description = "Updated collection", body = CollectionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Collection not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(code = %code))]
pub async fn update_collection(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(code): Path<String>,
    AppJson(payload): AppJson<UpdateCollectionRequest>,
) -> Result<Json<CollectionResponse>, AppError> {
    validate_update_collection(&payload)?;

    let settings = match payload.settings {
        Some(ref patch) => {
            let current = find_collection(&state, &code).await?;
            Some(CollectionSettings::from_model(&current).merged(patch)?)
        }
        None => None,
    };

    let changes = CollectionChanges {
        name: payload.name,
        description: payload.description,
        status: payload.status.as_deref().map(parse_status).transpose()?,
        settings,
    };

    let model = CollectionRepository::new(&state.db)
        .update(&code, changes)
        .await?
        .ok_or_else(|| not_found(&code))?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{code}",
    tag = "Admin Collections",
    operation_id = "deleteCollection",
    summary = "Delete a collection",
    description = "Soft delete: the collection disappears from every endpoint but its row and \
        its access code are kept.",
    params(("code" = String, Path, description = "Access code (case-insensitive)")),
    responses(
        (status = 204, description = "Collection deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Collection not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(code = %code))]
pub async fn delete_collection(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    let deleted = CollectionRepository::new(&state.db)
        .soft_delete(&code)
        .await?;
    if !deleted {
        return Err(not_found(&code));
    }

    tracing::info!(by = %auth_user.user.username, "Collection deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{code}/photos",
    tag = "Admin Collections",
    operation_id = "listCollectionPhotos",
    summary = "List photos in a collection",
    description = "Returns non-deleted photos, newest first, with URLs for the original and thumbnail.",
    params(
        ("code" = String, Path, description = "Access code (case-insensitive)"),
        PhotoListQuery,
    ),
    responses(
        (status = 200, description = "One page of photos", body = PhotoListResponse),
        (status = 400, description = "Invalid page or limit (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Collection not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query), fields(code = %code))]
pub async fn list_photos(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<PhotoListQuery>,
) -> Result<Json<PhotoListResponse>, AppError> {
    let (page, limit) = page_params(query.page, query.limit)?;
    let collection = find_collection(&state, &code).await?;

    let (photos, total) = PhotoRepository::new(&state.db)
        .list_for_collection(&collection.code, page, limit)
        .await?;

    let media = &state.media;
    let data = photos
        .into_iter()
        .map(|p| PhotoResponse::new(p, |path| media.url_for(path)))
        .collect();

    Ok(Json(PhotoListResponse {
        data,
        pagination: Pagination::new(page, limit, total),
    }))
}
