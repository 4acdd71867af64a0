use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::client::ClientInfo;
use crate::extractors::json::AppJson;
use crate::models::collection::{ValidateCodeRequest, ValidateCodeResponse};
use crate::models::photo::UploadResponse;
use crate::repository::CollectionRepository;
use crate::services::upload::{IncomingFile, UploadPipeline, UploaderInfo};
use crate::state::AppState;

const CODE_NOT_FOUND: &str = "Collection code not found. Please check the code and try again.";

pub fn upload_body_limit(max_request_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_request_bytes)
}

#[utoipa::path(
    post,
    path = "/validate",
    tag = "Collections",
    operation_id = "validateCollectionCode",
    summary = "Check an access code before uploading",
    description = "Public. Codes are case-insensitive. A code is valid when its collection exists, \
        is `active` and allows uploads; otherwise `valid` is false and `message` says why.",
    request_body = ValidateCodeRequest,
    responses(
        (status = 200, description = "Validation outcome", body = ValidateCodeResponse),
        (status = 400, description = "Malformed body (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(code = %payload.code))]
pub async fn validate_code(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ValidateCodeRequest>,
) -> Result<Json<ValidateCodeResponse>, AppError> {
    let Some(collection) = CollectionRepository::new(&state.db)
        .find_by_code(&payload.code)
        .await?
    else {
        return Ok(Json(ValidateCodeResponse::rejected(CODE_NOT_FOUND)));
    };

    if let Some(reason) = collection.upload_block_reason() {
        return Ok(Json(ValidateCodeResponse::rejected(reason)));
    }

    Ok(Json(ValidateCodeResponse {
        valid: true,
        collection: Some(collection.into()),
        message: None,
    }))
}

#[utoipa::path(
    post,
    path = "/{code}/photos",
    tag = "Collections",
    operation_id = "uploadPhotos",
    summary = "Upload photos to a collection",
    description = "Public. Send one or more files in multipart fields named `files` (or `file`). \
        Each file is validated and stored independently; per-file failures are reported in \
        `failed` and never fail the request as a whole.",
    params(("code" = String, Path, description = "Collection access code (case-insensitive)")),
    request_body(content_type = "multipart/form-data", description = "One or more image files"),
    responses(
        (status = 200, description = "Per-file outcomes", body = UploadResponse),
        (status = 400, description = "No files or malformed multipart body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "A bearer token was sent but is invalid (TOKEN_INVALID)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user, client, multipart), fields(code = %code))]
pub async fn upload_photos(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(code): Path<String>,
    client: ClientInfo,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    if let Some(ref auth_user) = auth_user {
        tracing::debug!(user_id = auth_user.user.id, "Upload by authenticated admin");
    }

    let hard_limit = state.config.upload.hard_file_limit;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("files") | Some("file") => {
                files.push(read_file_field(field, hard_limit).await?);
            }
            _ => {} // Ignore unknown fields.
        }
    }

    if files.is_empty() {
        return Err(AppError::Validation("No files provided".into()));
    }

    let uploader = UploaderInfo {
        ip: client.ip,
        user_agent: client.user_agent,
    };
    let results = UploadPipeline::new(
        &state.db,
        state.media.as_ref(),
        state.config.storage.thumbnail_size,
    )
    .process_batch(&code, files, &uploader)
    .await;

    let response = UploadResponse::from_results(results);
    tracing::info!(
        total = response.total,
        succeeded = response.success_count,
        failed = response.failed_count,
        "Upload request processed"
    );
    Ok(Json(response))
}

/// Buffer one file field, counting but discarding bytes past `hard_limit`.
async fn read_file_field(
    mut field: axum::extract::multipart::Field<'_>,
    hard_limit: u64,
) -> Result<IncomingFile, AppError> {
    let filename = field
        .file_name()
        .map(str::to_string)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "unnamed".to_string());

    let mut bytes = Vec::new();
    let mut size: u64 = 0;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        size += chunk.len() as u64;
        let room = hard_limit.saturating_sub(bytes.len() as u64) as usize;
        if room > 0 {
            bytes.extend_from_slice(&chunk[..room.min(chunk.len())]);
        }
    }

    Ok(IncomingFile {
        filename,
        bytes,
        size,
    })
}
