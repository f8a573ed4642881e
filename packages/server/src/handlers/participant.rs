use axum::Json;
use axum::extract::{Path, State};
use common::policy::{Operation, Resource};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{participant, participant_competition};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppQuery;
use crate::models::participant::{ParticipantListQuery, ParticipantResponse};
use crate::state::AppState;
use crate::utils::lookup;

#[utoipa::path(
    get,
    path = "/participants",
    tag = "Participants",
    operation_id = "listParticipants",
    summary = "List participants",
    description = "With `competition`, only participants who joined that competition.",
    params(ParticipantListQuery),
    responses(
        (status = 200, description = "Participant profiles", body = Vec<ParticipantResponse>),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(competition = ?query.competition))]
pub async fn list_participants(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ParticipantListQuery>,
) -> Result<Json<Vec<ParticipantResponse>>, AppError> {
    auth_user.require(Resource::Participant, Operation::List)?;

    let mut select = participant::Entity::find().order_by_asc(participant::Column::Id);
    if let Some(competition_id) = query.competition {
        let members: Vec<i32> = participant_competition::Entity::find()
            .filter(participant_competition::Column::CompetitionId.eq(competition_id))
            .select_only()
            .column(participant_competition::Column::ParticipantId)
            .into_tuple()
            .all(&state.db)
            .await?;
        select = select.filter(participant::Column::Id.is_in(members));
    }
    let rows = select.all(&state.db).await?;

    Ok(Json(decorate(&state.db, rows).await?))
}

#[utoipa::path(
    get,
    path = "/participants/{id}",
    tag = "Participants",
    operation_id = "getParticipant",
    summary = "Get a participant",
    params(("id" = i32, Path, description = "Participant ID")),
    responses(
        (status = 200, description = "Participant profile", body = ParticipantResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Participant not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_participant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ParticipantResponse>, AppError> {
    auth_user.require(Resource::Participant, Operation::Retrieve)?;

    let row = participant::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Participant not found".into()))?;

    decorate(&state.db, vec![row])
        .await?
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Participant not found".into()))
}

async fn decorate<C: ConnectionTrait>(
    db: &C,
    rows: Vec<participant::Model>,
) -> Result<Vec<ParticipantResponse>, DbErr> {
    let names = lookup::usernames(db, rows.iter().map(|p| p.user_id)).await?;
    let mut joined = lookup::participant_competitions(db, rows.iter().map(|p| p.id)).await?;

    Ok(rows
        .into_iter()
        .map(|p| ParticipantResponse {
            id: p.id,
            username: names.get(&p.user_id).cloned().unwrap_or_default(),
            competitions: joined.remove(&p.id).unwrap_or_default(),
            user_id: p.user_id,
            institution: p.institution,
            phone: p.phone,
        })
        .collect())
}
