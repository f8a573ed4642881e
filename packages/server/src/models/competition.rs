use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_max_len, validate_name};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCompetitionRequest {
    #[schema(example = "Spring Hackathon 2025")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = Option<String>, example = "2025-03-01")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, example = "2025-03-31")]
    pub end_date: Option<NaiveDate>,
}

/// Partial update. `null` clears a date.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateCompetitionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub end_date: Option<Option<NaiveDate>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CompetitionResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    #[schema(value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::competition::Model> for CompetitionResponse {
    fn from(m: crate::entity::competition::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            start_date: m.start_date,
            end_date: m.end_date,
            created_at: m.created_at,
        }
    }
}

pub fn validate_date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        return Err(AppError::Validation(
            "end_date must not be before start_date".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_competition(req: &CreateCompetitionRequest) -> Result<(), AppError> {
    validate_name("Name", &req.name, 255)?;
    validate_max_len("Description", &req.description, 100_000)?;
    validate_date_range(req.start_date, req.end_date)
}

pub fn validate_update_competition(req: &UpdateCompetitionRequest) -> Result<(), AppError> {
    if let Some(name) = &req.name {
        validate_name("Name", name, 255)?;
    }
    if let Some(description) = &req.description {
        validate_max_len("Description", description, 100_000)?;
    }
    Ok(())
}
