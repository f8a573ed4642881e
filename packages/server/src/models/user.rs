use chrono::{DateTime, Utc};
use common::Role;
use serde::{Deserialize, Serialize};

use super::shared::{validate_max_len, validate_name};
use crate::error::AppError;

/// Request body for account registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Unique username (1-32 chars, alphanumeric and underscores).
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[serde(default)]
    #[schema(example = "alice@example.org")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    /// Defaults to PARTICIPANT. Other roles require an ADMIN token.
    pub role: Option<Role>,
    /// Participant profile field.
    #[serde(default)]
    #[schema(example = "Tsinghua University")]
    pub institution: String,
    /// Participant profile field.
    #[serde(default)]
    pub phone: String,
    /// Judge profile field.
    #[serde(default)]
    #[schema(example = "Machine learning")]
    pub expertise: String,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > 32 {
        return Err(AppError::Validation(
            "Username must be 1-32 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username must contain only letters, digits, and underscores".into(),
        ));
    }
    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    let email = payload.email.trim();
    if !email.is_empty() {
        validate_max_len("Email", email, 254)?;
        if !email.contains('@') {
            return Err(AppError::Validation("Email must contain '@'".into()));
        }
    }
    validate_max_len("Institution", &payload.institution, 255)?;
    validate_max_len("Phone", &payload.phone, 30)?;
    validate_max_len("Expertise", &payload.expertise, 255)?;
    Ok(())
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    validate_name("Username", &payload.username, 32)?;
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Public view of an account.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice_wonder")]
    pub username: String,
    pub email: String,
    /// Stored role name.
    #[schema(example = "PARTICIPANT")]
    pub role: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::user::Model> for UserResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            is_staff: user.is_staff,
            created_at: user.created_at,
        }
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: UserResponse,
}

/// The caller's own account plus profile IDs.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// Set for accounts with a participant profile.
    pub participant_id: Option<i32>,
    /// Set for accounts with a judge profile.
    pub judge_id: Option<i32>,
}
