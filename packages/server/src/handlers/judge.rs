use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::policy::{Operation, Resource};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{judge, judge_competition};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::judge::{JudgeResponse, UpdateJudgeRequest, validate_update_judge};
use crate::state::AppState;
use crate::utils::{cascade, lookup, upload};

#[utoipa::path(
    get,
    path = "/judges",
    tag = "Judges",
    operation_id = "listJudges",
    summary = "List judges",
    responses(
        (status = 200, description = "Judge profiles", body = Vec<JudgeResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_judges(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<JudgeResponse>>, AppError> {
    auth_user.require(Resource::Judge, Operation::List)?;

    let rows = judge::Entity::find()
        .order_by_asc(judge::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(decorate(&state.db, rows).await?))
}

#[utoipa::path(
    get,
    path = "/judges/{id}",
    tag = "Judges",
    operation_id = "getJudge",
    summary = "Get a judge",
    params(("id" = i32, Path, description = "Judge ID")),
    responses(
        (status = 200, description = "Judge profile", body = JudgeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Judge not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_judge(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<JudgeResponse>, AppError> {
    auth_user.require(Resource::Judge, Operation::Retrieve)?;
    let row = find_judge(&state.db, id).await?;
    respond(&state.db, row).await.map(Json)
}

#[utoipa::path(
    put,
    path = "/judges/{id}",
    tag = "Judges",
    operation_id = "updateJudge",
    summary = "Update a judge",
    description = "Staff only. When `competitions` is present it replaces the judge's whole \
        assignment set.",
    params(("id" = i32, Path, description = "Judge ID")),
    request_body = UpdateJudgeRequest,
    responses(
        (status = 200, description = "Judge updated", body = JudgeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Judge not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_judge(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateJudgeRequest>,
) -> Result<Json<JudgeResponse>, AppError> {
    auth_user.require(Resource::Judge, Operation::Update)?;
    validate_update_judge(&payload)?;

    let txn = state.db.begin().await?;
    let existing = judge::Entity::find_by_id(id)
        .lock(sea_query::LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Judge not found".into()))?;

    let model = match payload.expertise {
        Some(expertise) => {
            let mut active: judge::ActiveModel = existing.into();
            active.expertise = Set(expertise.trim().to_string());
            active.update(&txn).await?
        }
        None => existing,
    };

    if let Some(competitions) = payload.competitions {
        lookup::require_competitions_exist(&txn, &competitions).await?;

        judge_competition::Entity::delete_many()
            .filter(judge_competition::Column::JudgeId.eq(id))
            .exec(&txn)
            .await?;
        if !competitions.is_empty() {
            let rows = competitions
                .iter()
                .map(|&competition_id| judge_competition::ActiveModel {
                    judge_id: Set(id),
                    competition_id: Set(competition_id),
                })
                .collect::<Vec<_>>();
            judge_competition::Entity::insert_many(rows)
                .exec_without_returning(&txn)
                .await?;
        }
        tracing::info!(judge_id = id, assigned = competitions.len(), "Judge assignments replaced");
    }

    txn.commit().await?;
    respond(&state.db, model).await.map(Json)
}

#[utoipa::path(
    delete,
    path = "/judges/{id}",
    tag = "Judges",
    operation_id = "deleteJudge",
    summary = "Delete a judge profile",
    description = "Staff only. The judge's scores are deleted with it; the user account stays.",
    params(("id" = i32, Path, description = "Judge ID")),
    responses(
        (status = 204, description = "Judge deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Judge not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_judge(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require(Resource::Judge, Operation::Delete)?;

    let txn = state.db.begin().await?;
    find_judge(&txn, id).await?;
    let released = cascade::delete_judge(&txn, id).await?;
    txn.commit().await?;

    upload::release_files(&*state.file_store, &released).await;
    tracing::info!(judge_id = id, "Judge deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_judge<C: ConnectionTrait>(db: &C, id: i32) -> Result<judge::Model, AppError> {
    judge::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Judge not found".into()))
}

async fn respond<C: ConnectionTrait>(
    db: &C,
    row: judge::Model,
) -> Result<JudgeResponse, AppError> {
    decorate(db, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("Judge not found".into()))
}

async fn decorate<C: ConnectionTrait>(
    db: &C,
    rows: Vec<judge::Model>,
) -> Result<Vec<JudgeResponse>, DbErr> {
    let names = lookup::usernames(db, rows.iter().map(|j| j.user_id)).await?;
    let mut assigned = lookup::judge_competitions(db, rows.iter().map(|j| j.id)).await?;

    Ok(rows
        .into_iter()
        .map(|j| JudgeResponse {
            id: j.id,
            username: names.get(&j.user_id).cloned().unwrap_or_default(),
            competitions: assigned.remove(&j.id).unwrap_or_default(),
            user_id: j.user_id,
            expertise: j.expertise,
        })
        .collect())
}
