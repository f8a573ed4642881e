use axum::extract::DefaultBodyLimit;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{competition, dashboard, judge, participant, rubric, score, submission, user};
use crate::state::AppState;

/// Multipart overhead allowed on top of the stored file itself.
const MULTIPART_SLACK: usize = 64 * 1024;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(user_routes())
        .merge(competition_routes())
        .merge(participant_routes())
        .merge(submission_routes())
        .merge(rubric_routes())
        .merge(judge_routes())
        .merge(score_routes())
        .merge(dashboard_routes())
        .merge(upload_routes(config))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(user::register))
        .routes(routes!(user::login))
        .routes(routes!(user::me))
        .routes(routes!(user::list_users))
        .routes(routes!(user::delete_user))
}

fn competition_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            competition::list_competitions,
            competition::create_competition
        ))
        .routes(routes!(
            competition::get_competition,
            competition::replace_competition,
            competition::update_competition,
            competition::delete_competition
        ))
}

fn participant_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(participant::list_participants))
        .routes(routes!(participant::get_participant))
}

fn submission_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            submission::list_submissions,
            submission::create_submission
        ))
        .routes(routes!(
            submission::get_submission,
            submission::replace_submission,
            submission::update_submission,
            submission::delete_submission
        ))
}

fn rubric_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(rubric::list_rubrics, rubric::create_rubric))
        .routes(routes!(
            rubric::get_rubric,
            rubric::update_rubric,
            rubric::delete_rubric
        ))
        .routes(routes!(
            rubric::list_rubric_versions,
            rubric::create_rubric_version
        ))
        .routes(routes!(rubric::get_rubric_version))
}

fn judge_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(judge::list_judges))
        .routes(routes!(
            judge::get_judge,
            judge::update_judge,
            judge::delete_judge
        ))
}

fn score_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(score::list_scores, score::create_score))
        .routes(routes!(
            score::get_score,
            score::replace_score,
            score::update_score,
            score::delete_score
        ))
}

fn dashboard_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(dashboard::get_stats))
        .routes(routes!(dashboard::export_scores))
}

/// File uploads get a body limit sized from the storage config instead of axum's 2 MiB default.
fn upload_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let limit = usize::try_from(config.storage.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_SLACK);

    OpenApiRouter::new()
        .routes(routes!(
            submission::upload_submission_file,
            submission::download_submission_file
        ))
        .routes(routes!(score::upload_evaluation_file))
        .layer(DefaultBodyLimit::max(limit))
}
