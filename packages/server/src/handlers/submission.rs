use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::SubmissionStatus;
use common::policy::{Operation, Resource, Visibility};
use common::storage::Bucket;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{participant, participant_competition, submission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::submission::*;
use crate::state::AppState;
use crate::utils::{cascade, lookup, upload};

#[utoipa::path(
    get,
    path = "/submissions",
    tag = "Submissions",
    operation_id = "listSubmissions",
    summary = "List visible submissions",
    description = "Staff, committee members and judges see every submission; participants see \
        only their own. `competition` narrows the result further.",
    params(SubmissionListQuery),
    responses(
        (status = 200, description = "Submissions, newest first", body = Vec<SubmissionResponse>),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SubmissionListQuery>,
) -> Result<Json<Vec<SubmissionResponse>>, AppError> {
    auth_user.require(Resource::Submission, Operation::List)?;

    let mut select = submission::Entity::find()
        .order_by_desc(submission::Column::SubmittedAt)
        .order_by_desc(submission::Column::Id);

    match auth_user.visibility(Resource::Submission) {
        Visibility::All => {}
        Visibility::OwnedBy(user_id) => {
            let Some(profile) = lookup::participant_for_user(&state.db, user_id).await? else {
                return Ok(Json(vec![]));
            };
            select = select.filter(submission::Column::ParticipantId.eq(profile.id));
        }
        Visibility::Nothing => return Ok(Json(vec![])),
    }

    if let Some(competition_id) = query.competition {
        select = select.filter(submission::Column::CompetitionId.eq(competition_id));
    }

    let rows = select.all(&state.db).await?;
    Ok(Json(decorate(&state.db, rows).await?))
}

#[utoipa::path(
    post,
    path = "/submissions",
    tag = "Submissions",
    operation_id = "createSubmission",
    summary = "Create a submission",
    description = "Participants only. The caller's participant profile is attached and the \
        competition is added to its joined competitions. Status starts as UNDER_REVIEW.",
    request_body = CreateSubmissionRequest,
    responses(
        (status = 201, description = "Submission created", body = SubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, competition = payload.competition))]
pub async fn create_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require(Resource::Submission, Operation::Create)?;
    validate_create_submission(&payload)?;

    let profile = lookup::participant_for_user(&state.db, auth_user.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Validation("Participant profile is missing for this account".into())
        })?;

    let txn = state.db.begin().await?;
    lookup::require_competitions_exist(&txn, &[payload.competition]).await?;

    let now = chrono::Utc::now();
    let model = submission::ActiveModel {
        participant_id: Set(profile.id),
        competition_id: Set(payload.competition),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        file: Set(None),
        link: Set(payload.link.map(|l| l.trim().to_string())),
        status: Set(SubmissionStatus::UnderReview),
        submitted_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let membership = participant_competition::ActiveModel {
        participant_id: Set(profile.id),
        competition_id: Set(payload.competition),
        joined_at: Set(now),
    };
    participant_competition::Entity::insert(membership)
        .on_conflict(
            sea_query::OnConflict::columns([
                participant_competition::Column::ParticipantId,
                participant_competition::Column::CompetitionId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        submission_id = model.id,
        participant_id = profile.id,
        competition_id = model.competition_id,
        "Submission created"
    );

    let response = decorate(&state.db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("Created submission vanished".into()))?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/submissions/{id}",
    tag = "Submissions",
    operation_id = "getSubmission",
    summary = "Get a submission",
    params(("id" = i32, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission", body = SubmissionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found or not visible (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SubmissionResponse>, AppError> {
    auth_user.require(Resource::Submission, Operation::Retrieve)?;
    let (row, _) = find_visible(&state.db, &auth_user, id).await?;
    respond(&state.db, row).await.map(Json)
}

#[utoipa::path(
    put,
    path = "/submissions/{id}",
    tag = "Submissions",
    operation_id = "replaceSubmission",
    summary = "Update a submission",
    description = "Staff only. Accepts the same partial body as PATCH.",
    params(("id" = i32, Path, description = "Submission ID")),
    request_body = UpdateSubmissionRequest,
    responses(
        (status = 200, description = "Submission updated", body = SubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found or not visible (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn replace_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateSubmissionRequest>,
) -> Result<Json<SubmissionResponse>, AppError> {
    apply_submission_update(&state, &auth_user, id, payload)
        .await
        .map(Json)
}

#[utoipa::path(
    patch,
    path = "/submissions/{id}",
    tag = "Submissions",
    operation_id = "updateSubmission",
    summary = "Partially update a submission",
    description = "Staff only. `status` moves the submission through review; `link: null` \
        clears the link.",
    params(("id" = i32, Path, description = "Submission ID")),
    request_body = UpdateSubmissionRequest,
    responses(
        (status = 200, description = "Submission updated", body = SubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found or not visible (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateSubmissionRequest>,
) -> Result<Json<SubmissionResponse>, AppError> {
    apply_submission_update(&state, &auth_user, id, payload)
        .await
        .map(Json)
}

async fn apply_submission_update(
    state: &AppState,
    auth_user: &AuthUser,
    id: i32,
    payload: UpdateSubmissionRequest,
) -> Result<SubmissionResponse, AppError> {
    let (existing, _) = find_visible(&state.db, auth_user, id).await?;
    auth_user.require(Resource::Submission, Operation::Update)?;
    validate_update_submission(&payload)?;

    let previous_status = existing.status;
    let mut active: submission::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(link) = payload.link {
        active.link = Set(link.map(|l| l.trim().to_string()));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }

    let model = active.update(&state.db).await?;
    if model.status != previous_status {
        tracing::info!(
            submission_id = model.id,
            from = %previous_status,
            to = %model.status,
            "Submission status changed"
        );
    }

    respond(&state.db, model).await
}

#[utoipa::path(
    delete,
    path = "/submissions/{id}",
    tag = "Submissions",
    operation_id = "deleteSubmission",
    summary = "Delete a submission",
    description = "Staff only. Scores on the submission are deleted with it.",
    params(("id" = i32, Path, description = "Submission ID")),
    responses(
        (status = 204, description = "Submission deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found or not visible (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    find_visible(&state.db, &auth_user, id).await?;
    auth_user.require(Resource::Submission, Operation::Delete)?;

    let txn = state.db.begin().await?;
    let released = cascade::delete_submission(&txn, id).await?;
    txn.commit().await?;

    upload::release_files(&*state.file_store, &released).await;
    tracing::info!(submission_id = id, "Submission deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/submissions/{id}/file",
    tag = "Submissions",
    operation_id = "uploadSubmissionFile",
    summary = "Attach a file to a submission",
    description = "Owning participant or staff. Multipart body with a single `file` part; \
        replaces any previous file.",
    params(("id" = i32, Path, description = "Submission ID")),
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` part"),
    responses(
        (status = 200, description = "File stored", body = SubmissionResponse),
        (status = 400, description = "Bad upload (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found or not visible (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(id))]
pub async fn upload_submission_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<SubmissionResponse>, AppError> {
    let (existing, owner_user_id) = find_visible(&state.db, &auth_user, id).await?;
    auth_user.require_object(Resource::Submission, Operation::Attach, owner_user_id)?;

    let stored = upload::store_multipart_file(
        multipart,
        &*state.file_store,
        Bucket::Submissions,
        state.config.storage.max_upload_size,
    )
    .await?;
    let new_path = stored.path.to_string();

    let previous = existing.file.clone();
    let mut active: submission::ActiveModel = existing.into();
    active.file = Set(Some(new_path.clone()));
    let model = active.update(&state.db).await?;

    if let Some(old) = previous.filter(|old| *old != new_path) {
        upload::release_files(&*state.file_store, &[old]).await;
    }
    tracing::info!(submission_id = id, size = stored.size, "Submission file stored");

    respond(&state.db, model).await.map(Json)
}

#[utoipa::path(
    get,
    path = "/submissions/{id}/file",
    tag = "Submissions",
    operation_id = "downloadSubmissionFile",
    summary = "Download a submission's file",
    params(("id" = i32, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found, not visible, or no file (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn download_submission_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    auth_user.require(Resource::Submission, Operation::Retrieve)?;
    let (row, _) = find_visible(&state.db, &auth_user, id).await?;
    let stored = row
        .file
        .ok_or_else(|| AppError::NotFound("Submission has no file".into()))?;
    upload::file_response(&*state.file_store, &stored).await
}

/// Load a submission the caller may see, with the user ID of its owner.
///
/// Rows outside the caller's visible set are reported as missing.
async fn find_visible<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    id: i32,
) -> Result<(submission::Model, i32), AppError> {
    let not_found = || AppError::NotFound("Submission not found".into());

    let row = submission::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    let owner_user_id: i32 = participant::Entity::find_by_id(row.participant_id)
        .select_only()
        .column(participant::Column::UserId)
        .into_tuple()
        .one(db)
        .await?
        .ok_or_else(not_found)?;

    if !auth_user
        .visibility(Resource::Submission)
        .permits(owner_user_id)
    {
        return Err(not_found());
    }
    Ok((row, owner_user_id))
}

async fn respond<C: ConnectionTrait>(
    db: &C,
    row: submission::Model,
) -> Result<SubmissionResponse, AppError> {
    decorate(db, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))
}

async fn decorate<C: ConnectionTrait>(
    db: &C,
    rows: Vec<submission::Model>,
) -> Result<Vec<SubmissionResponse>, DbErr> {
    let owners = lookup::participant_owners(db, rows.iter().map(|s| s.participant_id)).await?;
    let competitions = lookup::competition_names(db, rows.iter().map(|s| s.competition_id)).await?;

    Ok(rows
        .into_iter()
        .map(|s| SubmissionResponse {
            id: s.id,
            participant_id: s.participant_id,
            participant_username: owners
                .get(&s.participant_id)
                .map(|(_, name)| name.clone())
                .unwrap_or_default(),
            competition_id: s.competition_id,
            competition_name: competitions.get(&s.competition_id).cloned().unwrap_or_default(),
            title: s.title,
            description: s.description,
            file: s.file,
            link: s.link,
            status: s.status,
            submitted_at: s.submitted_at,
        })
        .collect())
}
