use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_link, validate_max_len};
use crate::error::AppError;

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ScoreListQuery {
    pub competition: Option<i32>,
    pub submission: Option<i32>,
}

/// Body for creating a score. The judge is the caller.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateScoreRequest {
    pub competition: i32,
    pub submission: i32,
    pub rubric: i32,
    #[schema(example = 85)]
    pub score: i32,
    #[serde(default)]
    pub comment: String,
    pub evaluation_link: Option<String>,
}

pub fn validate_create_score(req: &CreateScoreRequest) -> Result<(), AppError> {
    if req.score < 0 {
        return Err(AppError::Validation("Score must be >= 0".into()));
    }
    validate_max_len("Comment", &req.comment, 10_000)?;
    if let Some(link) = &req.evaluation_link {
        validate_link("Evaluation link", link)?;
    }
    Ok(())
}

/// Partial update by the owning judge or an administrator. The tuple and
/// `scored_at` never change.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateScoreRequest {
    pub score: Option<i32>,
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub evaluation_link: Option<Option<String>>,
}

pub fn validate_update_score(req: &UpdateScoreRequest) -> Result<(), AppError> {
    if let Some(score) = req.score
        && score < 0
    {
        return Err(AppError::Validation("Score must be >= 0".into()));
    }
    if let Some(comment) = &req.comment {
        validate_max_len("Comment", comment, 10_000)?;
    }
    if let Some(Some(link)) = &req.evaluation_link {
        validate_link("Evaluation link", link)?;
    }
    Ok(())
}

/// Reject a score above the rubric's maximum.
pub fn validate_score_bound(score: i32, max_score: i32) -> Result<(), AppError> {
    if score > max_score {
        return Err(AppError::Validation(format!(
            "Score must be between 0 and {max_score}"
        )));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScoreResponse {
    pub id: i32,
    pub competition_id: i32,
    pub submission_id: i32,
    pub submission_title: String,
    pub judge_id: i32,
    pub judge_username: String,
    pub rubric_id: i32,
    pub rubric_name: String,
    pub score: i32,
    pub comment: String,
    /// Stored path of the evaluation sheet, if any.
    pub evaluation_file: Option<String>,
    pub evaluation_link: Option<String>,
    pub scored_at: DateTime<Utc>,
}
