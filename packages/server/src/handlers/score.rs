use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::policy::{Operation, Resource, Visibility};
use common::storage::Bucket;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{judge, rubric, score, submission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::score::*;
use crate::state::AppState;
use crate::utils::{cascade, lookup, upload};

const DUPLICATE_SCORE: &str =
    "This judge has already scored this submission against this rubric";

#[utoipa::path(
    get,
    path = "/scores",
    tag = "Scores",
    operation_id = "listScores",
    summary = "List visible scores",
    description = "ADMIN and COMMITTEE see every score, judges only their own, everyone else \
        nothing.",
    params(ScoreListQuery),
    responses(
        (status = 200, description = "Scores, newest first", body = Vec<ScoreResponse>),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_scores(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ScoreListQuery>,
) -> Result<Json<Vec<ScoreResponse>>, AppError> {
    auth_user.require(Resource::Score, Operation::List)?;

    let mut select = score::Entity::find()
        .order_by_desc(score::Column::ScoredAt)
        .order_by_desc(score::Column::Id);

    match auth_user.visibility(Resource::Score) {
        Visibility::All => {}
        Visibility::OwnedBy(user_id) => {
            let Some(profile) = lookup::judge_for_user(&state.db, user_id).await? else {
                return Ok(Json(vec![]));
            };
            select = select.filter(score::Column::JudgeId.eq(profile.id));
        }
        Visibility::Nothing => return Ok(Json(vec![])),
    }

    if let Some(competition_id) = query.competition {
        select = select.filter(score::Column::CompetitionId.eq(competition_id));
    }
    if let Some(submission_id) = query.submission {
        select = select.filter(score::Column::SubmissionId.eq(submission_id));
    }

    let rows = select.all(&state.db).await?;
    Ok(Json(decorate(&state.db, rows).await?))
}

#[utoipa::path(
    post,
    path = "/scores",
    tag = "Scores",
    operation_id = "createScore",
    summary = "Score a submission",
    description = "Judges only. The rubric and the submission must both belong to `competition`, \
        and `score` must lie within `0..=rubric.max_score`. A judge scores each submission at \
        most once per rubric.",
    request_body = CreateScoreRequest,
    responses(
        (status = 201, description = "Score recorded", body = ScoreResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Already scored (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, auth_user, payload),
    fields(user_id = auth_user.user_id, submission = payload.submission, rubric = payload.rubric)
)]
pub async fn create_score(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateScoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require(Resource::Score, Operation::Create)?;
    validate_create_score(&payload)?;

    let profile = lookup::judge_for_user(&state.db, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::Validation("Judge profile is missing for this account".into()))?;

    let target_rubric = rubric::Entity::find_by_id(payload.rubric)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Rubric {} does not exist", payload.rubric)))?;
    if target_rubric.competition_id != payload.competition {
        return Err(AppError::Validation(
            "Rubric does not belong to this competition".into(),
        ));
    }

    let submission_competition: i32 = submission::Entity::find_by_id(payload.submission)
        .select_only()
        .column(submission::Column::CompetitionId)
        .into_tuple()
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            AppError::Validation(format!("Submission {} does not exist", payload.submission))
        })?;
    if submission_competition != payload.competition {
        return Err(AppError::Validation(
            "Submission does not belong to this competition".into(),
        ));
    }

    validate_score_bound(payload.score, target_rubric.max_score)?;

    let already_scored = score::Entity::find()
        .filter(score::Column::CompetitionId.eq(payload.competition))
        .filter(score::Column::SubmissionId.eq(payload.submission))
        .filter(score::Column::JudgeId.eq(profile.id))
        .filter(score::Column::RubricId.eq(payload.rubric))
        .count(&state.db)
        .await?
        > 0;
    if already_scored {
        return Err(AppError::Conflict(DUPLICATE_SCORE.into()));
    }

    let new_score = score::ActiveModel {
        competition_id: Set(payload.competition),
        submission_id: Set(payload.submission),
        judge_id: Set(profile.id),
        rubric_id: Set(payload.rubric),
        score: Set(payload.score),
        comment: Set(payload.comment),
        evaluation_file: Set(None),
        evaluation_link: Set(payload.evaluation_link.map(|l| l.trim().to_string())),
        scored_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let model = new_score.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Concurrent score insert caught by the unique index");
            AppError::Conflict(DUPLICATE_SCORE.into())
        }
        _ => AppError::from(e),
    })?;

    tracing::info!(
        score_id = model.id,
        judge_id = profile.id,
        submission_id = model.submission_id,
        score = model.score,
        "Score recorded"
    );

    let response = respond(&state.db, model).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/scores/{id}",
    tag = "Scores",
    operation_id = "getScore",
    summary = "Get a score",
    params(("id" = i32, Path, description = "Score ID")),
    responses(
        (status = 200, description = "Score", body = ScoreResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found or not visible (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_score(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ScoreResponse>, AppError> {
    auth_user.require(Resource::Score, Operation::Retrieve)?;
    let (row, _) = find_visible(&state.db, &auth_user, id).await?;
    respond(&state.db, row).await.map(Json)
}

#[utoipa::path(
    put,
    path = "/scores/{id}",
    tag = "Scores",
    operation_id = "replaceScore",
    summary = "Update a score",
    description = "Owning judge or ADMIN. Accepts the same partial body as PATCH. The scored \
        tuple and `scored_at` never change.",
    params(("id" = i32, Path, description = "Score ID")),
    request_body = UpdateScoreRequest,
    responses(
        (status = 200, description = "Score updated", body = ScoreResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found or not visible (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn replace_score(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    apply_score_update(&state, &auth_user, id, payload)
        .await
        .map(Json)
}

#[utoipa::path(
    patch,
    path = "/scores/{id}",
    tag = "Scores",
    operation_id = "updateScore",
    summary = "Partially update a score",
    description = "Owning judge or ADMIN. `evaluation_link: null` clears the link.",
    params(("id" = i32, Path, description = "Score ID")),
    request_body = UpdateScoreRequest,
    responses(
        (status = 200, description = "Score updated", body = ScoreResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found or not visible (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_score(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    apply_score_update(&state, &auth_user, id, payload)
        .await
        .map(Json)
}

async fn apply_score_update(
    state: &AppState,
    auth_user: &AuthUser,
    id: i32,
    payload: UpdateScoreRequest,
) -> Result<ScoreResponse, AppError> {
    let (existing, owner_user_id) = find_visible(&state.db, auth_user, id).await?;
    auth_user.require_object(Resource::Score, Operation::Update, owner_user_id)?;
    validate_update_score(&payload)?;

    if let Some(value) = payload.score {
        let max_score: i32 = rubric::Entity::find_by_id(existing.rubric_id)
            .select_only()
            .column(rubric::Column::MaxScore)
            .into_tuple()
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::Internal("Score references a missing rubric".into()))?;
        validate_score_bound(value, max_score)?;
    }

    let mut active: score::ActiveModel = existing.into();
    if let Some(value) = payload.score {
        active.score = Set(value);
    }
    if let Some(comment) = payload.comment {
        active.comment = Set(comment);
    }
    if let Some(link) = payload.evaluation_link {
        active.evaluation_link = Set(link.map(|l| l.trim().to_string()));
    }
    let model = active.update(&state.db).await?;

    tracing::info!(score_id = model.id, by = auth_user.user_id, "Score updated");
    respond(&state.db, model).await
}

#[utoipa::path(
    delete,
    path = "/scores/{id}",
    tag = "Scores",
    operation_id = "deleteScore",
    summary = "Delete a score",
    description = "Owning judge or ADMIN.",
    params(("id" = i32, Path, description = "Score ID")),
    responses(
        (status = 204, description = "Score deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found or not visible (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_score(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let (_, owner_user_id) = find_visible(&state.db, &auth_user, id).await?;
    auth_user.require_object(Resource::Score, Operation::Delete, owner_user_id)?;

    let released = cascade::delete_score(&state.db, id).await?;
    upload::release_files(&*state.file_store, &released).await;

    tracing::info!(score_id = id, by = auth_user.user_id, "Score deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/scores/{id}/evaluation-file",
    tag = "Scores",
    operation_id = "uploadEvaluationFile",
    summary = "Attach an evaluation sheet to a score",
    description = "Owning judge or ADMIN. Multipart body with a single `file` part; replaces \
        any previous sheet.",
    params(("id" = i32, Path, description = "Score ID")),
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` part"),
    responses(
        (status = 200, description = "File stored", body = ScoreResponse),
        (status = 400, description = "Bad upload (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found or not visible (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(id))]
pub async fn upload_evaluation_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ScoreResponse>, AppError> {
    let (existing, owner_user_id) = find_visible(&state.db, &auth_user, id).await?;
    auth_user.require_object(Resource::Score, Operation::Attach, owner_user_id)?;

    let stored = upload::store_multipart_file(
        multipart,
        &*state.file_store,
        Bucket::JudgeEvaluations,
        state.config.storage.max_upload_size,
    )
    .await?;
    let new_path = stored.path.to_string();

    let previous = existing.evaluation_file.clone();
    let mut active: score::ActiveModel = existing.into();
    active.evaluation_file = Set(Some(new_path.clone()));
    let model = active.update(&state.db).await?;

    if let Some(old) = previous.filter(|old| *old != new_path) {
        upload::release_files(&*state.file_store, &[old]).await;
    }
    tracing::info!(score_id = id, size = stored.size, "Evaluation file stored");

    respond(&state.db, model).await.map(Json)
}

/// Load a score the caller may see, with the user ID of the judge who gave it.
async fn find_visible<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    id: i32,
) -> Result<(score::Model, i32), AppError> {
    let not_found = || AppError::NotFound("Score not found".into());

    let row = score::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    let owner_user_id: i32 = judge::Entity::find_by_id(row.judge_id)
        .select_only()
        .column(judge::Column::UserId)
        .into_tuple()
        .one(db)
        .await?
        .ok_or_else(not_found)?;

    if !auth_user.visibility(Resource::Score).permits(owner_user_id) {
        return Err(not_found());
    }
    Ok((row, owner_user_id))
}

async fn respond<C: ConnectionTrait>(
    db: &C,
    row: score::Model,
) -> Result<ScoreResponse, AppError> {
    decorate(db, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("Score not found".into()))
}

async fn decorate<C: ConnectionTrait>(
    db: &C,
    rows: Vec<score::Model>,
) -> Result<Vec<ScoreResponse>, DbErr> {
    let titles = lookup::submission_titles(db, rows.iter().map(|s| s.submission_id)).await?;
    let judges = lookup::judge_owners(db, rows.iter().map(|s| s.judge_id)).await?;
    let rubrics = lookup::rubric_names(db, rows.iter().map(|s| s.rubric_id)).await?;

    Ok(rows
        .into_iter()
        .map(|s| ScoreResponse {
            id: s.id,
            competition_id: s.competition_id,
            submission_id: s.submission_id,
            submission_title: titles.get(&s.submission_id).cloned().unwrap_or_default(),
            judge_id: s.judge_id,
            judge_username: judges
                .get(&s.judge_id)
                .map(|(_, name)| name.clone())
                .unwrap_or_default(),
            rubric_id: s.rubric_id,
            rubric_name: rubrics.get(&s.rubric_id).cloned().unwrap_or_default(),
            score: s.score,
            comment: s.comment,
            evaluation_file: s.evaluation_file,
            evaluation_link: s.evaluation_link,
            scored_at: s.scored_at,
        })
        .collect())
}
