use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Administrator resolved from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. The token's
/// subject must still name an existing user.
#[derive(Debug)]
pub struct AuthUser {
    pub user: user::Model,
}

fn bearer_token(parts: &Parts) -> Option<Result<&str, AppError>> {
    let value = parts.headers.get(header::AUTHORIZATION)?;
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::TokenInvalid);
    Some(token)
}

async fn resolve(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims = jwt::verify(token, &state.jwt_settings()).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::TokenInvalid
    })?;

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(&claims.sub))
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    Ok(AuthUser { user })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::TokenMissing)??;
        resolve(state, token).await
    }
}

/// `Option<AuthUser>` as an extractor: no header yields `None`, while a header
/// carrying a bad token is still rejected.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(None),
            Some(token) => resolve(state, token?).await.map(Some),
        }
    }
}
