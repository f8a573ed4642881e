use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{validate_max_len, validate_name, validate_unique_ids};
use crate::error::AppError;

/// Default and lower bound for `max_score`.
pub const DEFAULT_MAX_SCORE: i32 = 100;

#[derive(Deserialize, utoipa::IntoParams)]
pub struct RubricListQuery {
    /// Restrict to one competition.
    pub competition_id: Option<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateRubricRequest {
    /// Owning competition ID.
    pub competition: i32,
    #[schema(example = "Innovation")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to 100.
    pub max_score: Option<i32>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateRubricRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub max_score: Option<i32>,
}

fn validate_max_score(max_score: i32) -> Result<(), AppError> {
    if max_score < 1 {
        return Err(AppError::Validation("max_score must be at least 1".into()));
    }
    Ok(())
}

pub fn validate_create_rubric(req: &CreateRubricRequest) -> Result<(), AppError> {
    validate_name("Name", &req.name, 255)?;
    validate_max_len("Description", &req.description, 100_000)?;
    validate_max_score(req.max_score.unwrap_or(DEFAULT_MAX_SCORE))
}

pub fn validate_update_rubric(req: &UpdateRubricRequest) -> Result<(), AppError> {
    if let Some(name) = &req.name {
        validate_name("Name", name, 255)?;
    }
    if let Some(description) = &req.description {
        validate_max_len("Description", description, 100_000)?;
    }
    if let Some(max_score) = req.max_score {
        validate_max_score(max_score)?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RubricResponse {
    pub id: i32,
    pub competition_id: i32,
    pub name: String,
    pub description: String,
    pub max_score: i32,
}

impl From<crate::entity::rubric::Model> for RubricResponse {
    fn from(m: crate::entity::rubric::Model) -> Self {
        Self {
            id: m.id,
            competition_id: m.competition_id,
            name: m.name,
            description: m.description,
            max_score: m.max_score,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CriterionInput {
    #[schema(example = "Technical depth")]
    pub name: String,
    /// Percent; all weights of a version sum to 100.
    #[schema(example = 40)]
    pub weight: i32,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateRubricVersionRequest {
    #[schema(example = "Finals 2025")]
    pub name: String,
    /// Competition IDs this version applies to.
    #[serde(default)]
    pub competitions: Vec<i32>,
    pub criteria: Vec<CriterionInput>,
}

pub fn validate_create_rubric_version(req: &CreateRubricVersionRequest) -> Result<(), AppError> {
    validate_name("Name", &req.name, 255)?;
    validate_unique_ids(&req.competitions, "competition")?;
    for criterion in &req.criteria {
        validate_name("Criterion name", &criterion.name, 255)?;
    }
    common::rubric::validate_weights(req.criteria.iter().map(|c| c.weight))?;
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CriterionResponse {
    pub id: i32,
    pub name: String,
    pub weight: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RubricVersionResponse {
    pub id: i32,
    pub name: String,
    pub competitions: Vec<i32>,
    pub criteria: Vec<CriterionResponse>,
    pub created_at: DateTime<Utc>,
}
