use chrono::{DateTime, Utc};
use common::SubmissionStatus;
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_link, validate_max_len, validate_name};
use crate::error::AppError;

#[derive(Deserialize, utoipa::IntoParams)]
pub struct SubmissionListQuery {
    /// Restrict to one competition.
    pub competition: Option<i32>,
}

/// Body for creating a submission.
///
/// Participant, status and timestamp are assigned by the server; unknown
/// fields such as `status` are ignored.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSubmissionRequest {
    /// Target competition ID.
    pub competition: i32,
    #[schema(example = "Smart irrigation controller")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub link: Option<String>,
}

pub fn validate_create_submission(req: &CreateSubmissionRequest) -> Result<(), AppError> {
    validate_name("Title", &req.title, 255)?;
    validate_max_len("Description", &req.description, 100_000)?;
    if let Some(link) = &req.link {
        validate_link("Link", link)?;
    }
    Ok(())
}

/// Staff-only partial update.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateSubmissionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub link: Option<Option<String>>,
    pub status: Option<SubmissionStatus>,
}

pub fn validate_update_submission(req: &UpdateSubmissionRequest) -> Result<(), AppError> {
    if let Some(title) = &req.title {
        validate_name("Title", title, 255)?;
    }
    if let Some(description) = &req.description {
        validate_max_len("Description", description, 100_000)?;
    }
    if let Some(Some(link)) = &req.link {
        validate_link("Link", link)?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionResponse {
    pub id: i32,
    pub participant_id: i32,
    pub participant_username: String,
    pub competition_id: i32,
    pub competition_name: String,
    pub title: String,
    pub description: String,
    /// Stored path of the uploaded file, if any.
    pub file: Option<String>,
    pub link: Option<String>,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
}
