use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::policy::{Operation, Resource};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{rubric, rubric_criterion, rubric_version, rubric_version_competition, score};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::rubric::*;
use crate::state::AppState;
use crate::utils::{cascade, lookup, upload};

#[utoipa::path(
    get,
    path = "/rubrics",
    tag = "Rubrics",
    operation_id = "listRubrics",
    summary = "List rubrics",
    params(RubricListQuery),
    responses(
        (status = 200, description = "Rubrics", body = Vec<RubricResponse>),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(competition_id = ?query.competition_id))]
pub async fn list_rubrics(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RubricListQuery>,
) -> Result<Json<Vec<RubricResponse>>, AppError> {
    auth_user.require(Resource::Rubric, Operation::List)?;

    let mut select = rubric::Entity::find().order_by_asc(rubric::Column::Id);
    if let Some(competition_id) = query.competition_id {
        select = select.filter(rubric::Column::CompetitionId.eq(competition_id));
    }
    let rows = select.all(&state.db).await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/rubrics",
    tag = "Rubrics",
    operation_id = "createRubric",
    summary = "Create a rubric",
    description = "ADMIN only. `max_score` defaults to 100.",
    request_body = CreateRubricRequest,
    responses(
        (status = 201, description = "Rubric created", body = RubricResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(competition = payload.competition))]
pub async fn create_rubric(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRubricRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require(Resource::Rubric, Operation::Create)?;
    validate_create_rubric(&payload)?;
    lookup::require_competitions_exist(&state.db, &[payload.competition]).await?;

    let model = rubric::ActiveModel {
        competition_id: Set(payload.competition),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        max_score: Set(payload.max_score.unwrap_or(DEFAULT_MAX_SCORE)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(rubric_id = model.id, competition_id = model.competition_id, "Rubric created");
    Ok((StatusCode::CREATED, Json(RubricResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/rubrics/{id}",
    tag = "Rubrics",
    operation_id = "getRubric",
    summary = "Get a rubric",
    params(("id" = i32, Path, description = "Rubric ID")),
    responses(
        (status = 200, description = "Rubric", body = RubricResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Rubric not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_rubric(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RubricResponse>, AppError> {
    auth_user.require(Resource::Rubric, Operation::Retrieve)?;
    Ok(Json(find_rubric(&state.db, id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/rubrics/{id}",
    tag = "Rubrics",
    operation_id = "updateRubric",
    summary = "Update a rubric",
    description = "ADMIN only. Absent fields are left unchanged. `max_score` cannot be lowered \
        below a score already given against the rubric.",
    params(("id" = i32, Path, description = "Rubric ID")),
    request_body = UpdateRubricRequest,
    responses(
        (status = 200, description = "Rubric updated", body = RubricResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Rubric not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_rubric(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRubricRequest>,
) -> Result<Json<RubricResponse>, AppError> {
    auth_user.require(Resource::Rubric, Operation::Update)?;
    validate_update_rubric(&payload)?;

    let txn = state.db.begin().await?;
    let existing = rubric::Entity::find_by_id(id)
        .lock(sea_query::LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Rubric not found".into()))?;

    if let Some(max_score) = payload.max_score.filter(|&m| m < existing.max_score) {
        let above = score::Entity::find()
            .filter(score::Column::RubricId.eq(id))
            .filter(score::Column::Score.gt(max_score))
            .count(&txn)
            .await?;
        if above > 0 {
            return Err(AppError::Validation(format!(
                "{above} existing score(s) exceed max_score {max_score}"
            )));
        }
    }

    let mut active: rubric::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(max_score) = payload.max_score {
        active.max_score = Set(max_score);
    }
    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/rubrics/{id}",
    tag = "Rubrics",
    operation_id = "deleteRubric",
    summary = "Delete a rubric",
    description = "ADMIN only. Scores given against the rubric are deleted with it.",
    params(("id" = i32, Path, description = "Rubric ID")),
    responses(
        (status = 204, description = "Rubric deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Rubric not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_rubric(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require(Resource::Rubric, Operation::Delete)?;

    let txn = state.db.begin().await?;
    find_rubric(&txn, id).await?;
    let released = cascade::delete_rubric(&txn, id).await?;
    txn.commit().await?;

    upload::release_files(&*state.file_store, &released).await;
    tracing::info!(rubric_id = id, "Rubric deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_rubric<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<rubric::Model, AppError> {
    rubric::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Rubric not found".into()))
}

#[utoipa::path(
    get,
    path = "/rubric-versions",
    tag = "Rubric Versions",
    operation_id = "listRubricVersions",
    summary = "List rubric versions",
    responses(
        (status = 200, description = "Rubric versions with their criteria", body = Vec<RubricVersionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_rubric_versions(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RubricVersionResponse>>, AppError> {
    auth_user.require(Resource::RubricVersion, Operation::List)?;

    let rows = rubric_version::Entity::find()
        .order_by_desc(rubric_version::Column::CreatedAt)
        .order_by_desc(rubric_version::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(decorate_versions(&state.db, rows).await?))
}

#[utoipa::path(
    post,
    path = "/rubric-versions",
    tag = "Rubric Versions",
    operation_id = "createRubricVersion",
    summary = "Create a rubric version",
    description = "ADMIN only. Criterion weights must sum to exactly 100; nothing is stored \
        otherwise. The version, its criteria and its competition links are written together.",
    request_body = CreateRubricVersionRequest,
    responses(
        (status = 201, description = "Rubric version created", body = RubricVersionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name, criteria = payload.criteria.len()))]
pub async fn create_rubric_version(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRubricVersionRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require(Resource::RubricVersion, Operation::Create)?;
    validate_create_rubric_version(&payload)?;

    let txn = state.db.begin().await?;
    lookup::require_competitions_exist(&txn, &payload.competitions).await?;

    let version = rubric_version::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let criteria = payload
        .criteria
        .iter()
        .map(|c| rubric_criterion::ActiveModel {
            rubric_version_id: Set(version.id),
            name: Set(c.name.trim().to_string()),
            weight: Set(c.weight),
            ..Default::default()
        })
        .collect::<Vec<_>>();
    rubric_criterion::Entity::insert_many(criteria)
        .exec_without_returning(&txn)
        .await?;

    if !payload.competitions.is_empty() {
        let links = payload
            .competitions
            .iter()
            .map(|&competition_id| rubric_version_competition::ActiveModel {
                rubric_version_id: Set(version.id),
                competition_id: Set(competition_id),
            })
            .collect::<Vec<_>>();
        rubric_version_competition::Entity::insert_many(links)
            .exec_without_returning(&txn)
            .await?;
    }

    txn.commit().await?;

    tracing::info!(
        rubric_version_id = version.id,
        criteria = payload.criteria.len(),
        "Rubric version created"
    );

    let response = decorate_versions(&state.db, vec![version])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("Created rubric version vanished".into()))?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/rubric-versions/{id}",
    tag = "Rubric Versions",
    operation_id = "getRubricVersion",
    summary = "Get a rubric version",
    params(("id" = i32, Path, description = "Rubric version ID")),
    responses(
        (status = 200, description = "Rubric version with its criteria", body = RubricVersionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Rubric version not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_rubric_version(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RubricVersionResponse>, AppError> {
    auth_user.require(Resource::RubricVersion, Operation::Retrieve)?;

    let not_found = || AppError::NotFound("Rubric version not found".into());
    let version = rubric_version::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(not_found)?;

    decorate_versions(&state.db, vec![version])
        .await?
        .pop()
        .map(Json)
        .ok_or_else(not_found)
}

async fn decorate_versions<C: ConnectionTrait>(
    db: &C,
    versions: Vec<rubric_version::Model>,
) -> Result<Vec<RubricVersionResponse>, DbErr> {
    if versions.is_empty() {
        return Ok(vec![]);
    }
    let ids: Vec<i32> = versions.iter().map(|v| v.id).collect();

    let mut criteria: BTreeMap<i32, Vec<CriterionResponse>> = BTreeMap::new();
    for c in rubric_criterion::Entity::find()
        .filter(rubric_criterion::Column::RubricVersionId.is_in(ids.clone()))
        .order_by_asc(rubric_criterion::Column::Id)
        .all(db)
        .await?
    {
        criteria.entry(c.rubric_version_id).or_default().push(CriterionResponse {
            id: c.id,
            name: c.name,
            weight: c.weight,
        });
    }

    let links: Vec<(i32, i32)> = rubric_version_competition::Entity::find()
        .filter(rubric_version_competition::Column::RubricVersionId.is_in(ids))
        .select_only()
        .column(rubric_version_competition::Column::RubricVersionId)
        .column(rubric_version_competition::Column::CompetitionId)
        .order_by_asc(rubric_version_competition::Column::CompetitionId)
        .into_tuple()
        .all(db)
        .await?;
    let mut competitions: BTreeMap<i32, Vec<i32>> = BTreeMap::new();
    for (version_id, competition_id) in links {
        competitions.entry(version_id).or_default().push(competition_id);
    }

    Ok(versions
        .into_iter()
        .map(|v| RubricVersionResponse {
            criteria: criteria.remove(&v.id).unwrap_or_default(),
            competitions: competitions.remove(&v.id).unwrap_or_default(),
            id: v.id,
            name: v.name,
            created_at: v.created_at,
        })
        .collect())
}
