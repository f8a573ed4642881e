use serde::{Deserialize, Serialize};

use super::shared::{validate_max_len, validate_unique_ids};
use crate::error::AppError;

#[derive(Serialize, utoipa::ToSchema)]
pub struct JudgeResponse {
    pub id: i32,
    pub user_id: i32,
    #[schema(example = "judge_amy")]
    pub username: String,
    pub expertise: String,
    /// IDs of assigned competitions, ascending.
    pub competitions: Vec<i32>,
}

/// Staff update. When present, `competitions` replaces the whole assignment set.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateJudgeRequest {
    pub expertise: Option<String>,
    pub competitions: Option<Vec<i32>>,
}

pub fn validate_update_judge(req: &UpdateJudgeRequest) -> Result<(), AppError> {
    if let Some(expertise) = &req.expertise {
        validate_max_len("Expertise", expertise, 255)?;
    }
    if let Some(ids) = &req.competitions {
        validate_unique_ids(ids, "competition")?;
    }
    Ok(())
}
