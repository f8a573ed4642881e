use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use common::policy::{Operation, Resource};
use common::report::{self, SCORE_EXPORT_HEADER};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{participant, participant_competition, score, submission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppQuery;
use crate::models::dashboard::{DashboardStats, JudgeActivity, StatsQuery};
use crate::state::AppState;
use crate::utils::filename::attachment_disposition;
use crate::utils::lookup;

const EXPORT_FILENAME: &str = "scores_report.csv";

#[utoipa::path(
    get,
    path = "/dashboard/stats",
    tag = "Dashboard",
    operation_id = "getDashboardStats",
    summary = "Aggregate statistics",
    description = "ADMIN or COMMITTEE. With `competition`, every figure is restricted to that \
        competition. `weekly_submissions` covers the last eight weeks, oldest week first.",
    params(StatsQuery),
    responses(
        (status = 200, description = "Statistics", body = DashboardStats),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(competition = ?query.competition))]
pub async fn get_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<StatsQuery>,
) -> Result<Json<DashboardStats>, AppError> {
    auth_user.require(Resource::DashboardStats, Operation::Retrieve)?;
    let db = &state.db;
    let competition = query.competition;

    let total_participants = match competition {
        Some(id) => {
            participant_competition::Entity::find()
                .filter(participant_competition::Column::CompetitionId.eq(id))
                .count(db)
                .await?
        }
        None => participant::Entity::find().count(db).await?,
    };

    let mut submissions = submission::Entity::find();
    let mut scores = score::Entity::find();
    if let Some(id) = competition {
        submissions = submissions.filter(submission::Column::CompetitionId.eq(id));
        scores = scores.filter(score::Column::CompetitionId.eq(id));
    }

    let total_submissions = submissions.clone().count(db).await?;
    let total_scores = scores.clone().count(db).await?;

    let score_sum: Option<i64> = scores
        .clone()
        .select_only()
        .column_as(score::Column::Score.sum(), "total")
        .into_tuple::<Option<i64>>()
        .one(db)
        .await?
        .flatten();
    let average_score = match (score_sum, total_scores) {
        (Some(sum), n) if n > 0 => Some(sum as f64 / n as f64),
        _ => None,
    };

    let per_judge: Vec<(i32, i64)> = scores
        .select_only()
        .column(score::Column::JudgeId)
        .column_as(score::Column::Id.count(), "count")
        .group_by(score::Column::JudgeId)
        .into_tuple()
        .all(db)
        .await?;
    let judges = lookup::judge_owners(db, per_judge.iter().map(|(id, _)| *id)).await?;
    let mut judge_activity: Vec<JudgeActivity> = per_judge
        .into_iter()
        .map(|(judge_id, count)| JudgeActivity {
            judge_username: judges
                .get(&judge_id)
                .map(|(_, name)| name.clone())
                .unwrap_or_default(),
            count: Ord::max(count, 0) as u64,
        })
        .collect();
    judge_activity.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.judge_username.cmp(&b.judge_username))
    });

    let now = Utc::now();
    let recent: Vec<DateTime<Utc>> = submissions
        .filter(submission::Column::SubmittedAt.gte(report::window_start(now)))
        .select_only()
        .column(submission::Column::SubmittedAt)
        .into_tuple()
        .all(db)
        .await?;
    let weekly_submissions = report::weekly_histogram(recent, now);

    Ok(Json(DashboardStats {
        total_participants,
        total_submissions,
        total_scores,
        average_score,
        judge_activity,
        weekly_submissions,
    }))
}

#[utoipa::path(
    get,
    path = "/dashboard/export-scores",
    tag = "Dashboard",
    operation_id = "exportScores",
    summary = "Export every score as CSV",
    description = "Staff only. One row per score ordered by ID, with the columns \
        `Submission,Judge,Rubric,Score,Comment,Scored At`.",
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn export_scores(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    auth_user.require(Resource::ScoreExport, Operation::Retrieve)?;
    let db = &state.db;

    let rows = score::Entity::find()
        .order_by_asc(score::Column::Id)
        .all(db)
        .await?;
    let titles = lookup::submission_titles(db, rows.iter().map(|s| s.submission_id)).await?;
    let judges = lookup::judge_owners(db, rows.iter().map(|s| s.judge_id)).await?;
    let rubrics = lookup::rubric_names(db, rows.iter().map(|s| s.rubric_id)).await?;

    let mut body = report::csv_row(&SCORE_EXPORT_HEADER);
    for s in &rows {
        body.push_str(&report::csv_row(&[
            titles.get(&s.submission_id).map(String::as_str).unwrap_or_default(),
            judges
                .get(&s.judge_id)
                .map(|(_, name)| name.as_str())
                .unwrap_or_default(),
            rubrics.get(&s.rubric_id).map(String::as_str).unwrap_or_default(),
            s.score.to_string().as_str(),
            s.comment.as_str(),
            report::format_export_time(s.scored_at).as_str(),
        ]));
    }

    tracing::info!(rows = rows.len(), "Scores exported");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(EXPORT_FILENAME),
            ),
        ],
        body,
    )
        .into_response())
}
