use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::{header, request::Parts};
use common::Role;
use common::policy::{self, Caller, Operation, Resource, Visibility};
use sea_orm::EntityTrait;

use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// The token only identifies the account. Role and staff flag are loaded from
/// the user row on every request, so a role change applies immediately and a
/// deleted account is rejected.
///
/// Use `Option<AuthUser>` for endpoints that also accept anonymous callers; a
/// present but invalid token is still rejected there.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    /// `None` when the stored role is not recognised.
    pub role: Option<Role>,
    pub is_staff: bool,
}

impl AuthUser {
    pub fn caller(&self) -> Caller {
        Caller::new(self.user_id, self.role, self.is_staff)
    }

    /// Collection-level permission check.
    pub fn require(&self, resource: Resource, op: Operation) -> Result<(), AppError> {
        if policy::check(&self.caller(), resource, op).is_allowed() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Row-level permission check for a row owned by `owner_user_id`.
    pub fn require_object(
        &self,
        resource: Resource,
        op: Operation,
        owner_user_id: i32,
    ) -> Result<(), AppError> {
        if policy::check_object(&self.caller(), resource, op, owner_user_id).is_allowed() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    pub fn visibility(&self, resource: Resource) -> Visibility {
        policy::visibility(&self.caller(), resource)
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<String>, AppError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AppError::TokenInvalid)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AppError::TokenInvalid)?;
    Ok(Some(token.to_string()))
}

async fn authenticate(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims =
        jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

    let account = user::Entity::find_by_id(claims.uid)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    let role = account.role.parse::<Role>().ok();
    if role.is_none() {
        tracing::warn!(user_id = account.id, role = %account.role, "Unrecognised role on account");
    }

    Ok(AuthUser {
        user_id: account.id,
        username: account.username,
        role,
        is_staff: account.is_staff,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or(AppError::TokenMissing)?;
        authenticate(state, &token).await
    }
}

impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => authenticate(state, &token).await.map(Some),
            None => Ok(None),
        }
    }
}
