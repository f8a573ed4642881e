use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::policy::{self, Operation, Resource};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::user::{
    LoginRequest, LoginResponse, MeResponse, RegisterRequest, UserResponse,
    validate_login_request, validate_register_request,
};
use crate::state::AppState;
use crate::utils::profile::{ProfileFields, ensure_profile};
use crate::utils::{cascade, hash, jwt, lookup, upload};

#[utoipa::path(
    post,
    path = "/users/register",
    tag = "Users",
    operation_id = "registerUser",
    summary = "Register a new account",
    description = "Creates an account and, for PARTICIPANT and JUDGE roles, its profile in the \
        same transaction. Anonymous callers may only create PARTICIPANT accounts; any other \
        role requires an ADMIN bearer token.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Role requires authentication (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Role requires ADMIN (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Username taken (USERNAME_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller, payload), fields(username = %payload.username))]
pub async fn register(
    caller: Option<AuthUser>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let role = payload.role.unwrap_or_default();
    let caller_policy = caller.as_ref().map(AuthUser::caller);
    if !policy::may_register_role(caller_policy.as_ref(), role) {
        return Err(match caller {
            Some(_) => AppError::PermissionDenied,
            None => AppError::TokenMissing,
        });
    }

    let password_hash = hash::hash_password_blocking(payload.password.clone())
        .await
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let mut new_user = user::ActiveModel {
        username: Set(payload.username.trim().to_string()),
        email: Set(payload.email.trim().to_string()),
        password: Set(password_hash),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    new_user.set_role(role);

    let txn = state.db.begin().await?;
    let account = new_user.insert(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Registration race condition: unique constraint caught on insert");
            AppError::UsernameTaken
        }
        _ => AppError::from(e),
    })?;

    let fields = ProfileFields {
        institution: payload.institution,
        phone: payload.phone,
        expertise: payload.expertise,
    };
    ensure_profile(&txn, account.id, role, &fields).await?;
    txn.commit().await?;

    tracing::info!(user_id = account.id, %role, "Account registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(account))))
}

#[utoipa::path(
    post,
    path = "/users/login",
    tag = "Users",
    operation_id = "login",
    summary = "Log in and obtain a bearer token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let account = user::Entity::find()
        .filter(user::Column::Username.eq(payload.username.trim()))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password_blocking(payload.password, account.password.clone())
        .await
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = jwt::sign(
        account.id,
        &account.username,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_days,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;

    Ok(Json(LoginResponse {
        token,
        user: account.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    operation_id = "getMe",
    summary = "Get the current account",
    responses(
        (status = 200, description = "Current account", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let account = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    let participant_id = lookup::participant_for_user(&state.db, account.id)
        .await?
        .map(|p| p.id);
    let judge_id = lookup::judge_for_user(&state.db, account.id)
        .await?
        .map(|j| j.id);

    Ok(Json(MeResponse {
        user: account.into(),
        participant_id,
        judge_id,
    }))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List all accounts",
    description = "ADMIN only.",
    responses(
        (status = 200, description = "All accounts, by ID", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    auth_user.require(Resource::User, Operation::List)?;

    let accounts = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(accounts.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete an account",
    description = "ADMIN only. Removes the account's participant or judge profile, the \
        submissions and scores hanging off it, and their stored files. An administrator \
        cannot delete their own account.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 400, description = "Attempt to delete self (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, target = id))]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require(Resource::User, Operation::Delete)?;
    if id == auth_user.user_id {
        return Err(AppError::Validation(
            "You cannot delete your own account".into(),
        ));
    }

    let txn = state.db.begin().await?;
    let account = user::Entity::find_by_id(id)
        .lock(sea_query::LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let mut released = Vec::new();
    if let Some(p) = lookup::participant_for_user(&txn, id).await? {
        released.extend(cascade::delete_participant(&txn, p.id).await?);
    }
    if let Some(j) = lookup::judge_for_user(&txn, id).await? {
        released.extend(cascade::delete_judge(&txn, j.id).await?);
    }
    user::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    upload::release_files(&*state.file_store, &released).await;
    tracing::info!(deleted = account.id, username = %account.username, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}

