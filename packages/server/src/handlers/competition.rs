use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::policy::{Operation, Resource};
use sea_orm::*;
use tracing::instrument;

use crate::entity::competition;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::competition::*;
use crate::state::AppState;
use crate::utils::{cascade, upload};

#[utoipa::path(
    get,
    path = "/competitions",
    tag = "Competitions",
    operation_id = "listCompetitions",
    summary = "List competitions",
    responses(
        (status = 200, description = "All competitions, newest first", body = Vec<CompetitionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_competitions(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CompetitionResponse>>, AppError> {
    auth_user.require(Resource::Competition, Operation::List)?;

    let rows = competition::Entity::find()
        .order_by_desc(competition::Column::CreatedAt)
        .order_by_desc(competition::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/competitions",
    tag = "Competitions",
    operation_id = "createCompetition",
    summary = "Create a competition",
    description = "Staff only.",
    request_body = CreateCompetitionRequest,
    responses(
        (status = 201, description = "Competition created", body = CompetitionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_competition(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCompetitionRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require(Resource::Competition, Operation::Create)?;
    validate_create_competition(&payload)?;

    let model = competition::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(competition_id = model.id, "Competition created");
    Ok((StatusCode::CREATED, Json(CompetitionResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/competitions/{id}",
    tag = "Competitions",
    operation_id = "getCompetition",
    summary = "Get a competition",
    params(("id" = i32, Path, description = "Competition ID")),
    responses(
        (status = 200, description = "Competition", body = CompetitionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Competition not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_competition(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CompetitionResponse>, AppError> {
    auth_user.require(Resource::Competition, Operation::Retrieve)?;
    Ok(Json(find_competition(&state.db, id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/competitions/{id}",
    tag = "Competitions",
    operation_id = "replaceCompetition",
    summary = "Replace a competition",
    description = "Staff only. Every field is overwritten; omitted dates become null.",
    params(("id" = i32, Path, description = "Competition ID")),
    request_body = CreateCompetitionRequest,
    responses(
        (status = 200, description = "Competition updated", body = CompetitionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Competition not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn replace_competition(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateCompetitionRequest>,
) -> Result<Json<CompetitionResponse>, AppError> {
    auth_user.require(Resource::Competition, Operation::Update)?;
    validate_create_competition(&payload)?;

    let patch = UpdateCompetitionRequest {
        name: Some(payload.name),
        description: Some(payload.description),
        start_date: Some(payload.start_date),
        end_date: Some(payload.end_date),
    };
    apply_competition_update(&state, id, patch).await.map(Json)
}

#[utoipa::path(
    patch,
    path = "/competitions/{id}",
    tag = "Competitions",
    operation_id = "updateCompetition",
    summary = "Partially update a competition",
    description = "Staff only. Absent fields are left unchanged; `null` clears a date. The \
        resulting date range is validated against stored values.",
    params(("id" = i32, Path, description = "Competition ID")),
    request_body = UpdateCompetitionRequest,
    responses(
        (status = 200, description = "Competition updated", body = CompetitionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Competition not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_competition(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCompetitionRequest>,
) -> Result<Json<CompetitionResponse>, AppError> {
    auth_user.require(Resource::Competition, Operation::Update)?;
    validate_update_competition(&payload)?;
    apply_competition_update(&state, id, payload).await.map(Json)
}

async fn apply_competition_update(
    state: &AppState,
    id: i32,
    payload: UpdateCompetitionRequest,
) -> Result<CompetitionResponse, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_competition_for_update(&txn, id).await?;

    let start_date = payload.start_date.unwrap_or(existing.start_date);
    let end_date = payload.end_date.unwrap_or(existing.end_date);
    validate_date_range(start_date, end_date)?;

    let mut active: competition::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    active.start_date = Set(start_date);
    active.end_date = Set(end_date);

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(model.into())
}

#[utoipa::path(
    delete,
    path = "/competitions/{id}",
    tag = "Competitions",
    operation_id = "deleteCompetition",
    summary = "Delete a competition",
    description = "Staff only. Also deletes the competition's submissions, rubrics, scores and \
        membership rows.",
    params(("id" = i32, Path, description = "Competition ID")),
    responses(
        (status = 204, description = "Competition deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Competition not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_competition(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require(Resource::Competition, Operation::Delete)?;

    let txn = state.db.begin().await?;
    find_competition_for_update(&txn, id).await?;
    let released = cascade::delete_competition(&txn, id).await?;
    txn.commit().await?;

    upload::release_files(&*state.file_store, &released).await;
    tracing::info!(competition_id = id, "Competition deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_competition<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<competition::Model, AppError> {
    competition::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Competition not found".into()))
}

async fn find_competition_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<competition::Model, AppError> {
    competition::Entity::find_by_id(id)
        .lock(sea_query::LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Competition not found".into()))
}
