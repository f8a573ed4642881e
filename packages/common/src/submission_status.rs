#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Review lifecycle of a submission. Only staff move a submission between states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PENDING"))]
    Pending,
    /// Initial state of every new submission.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "UNDER_REVIEW"))]
    UnderReview,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "COMPLETED"))]
    Completed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "REJECTED"))]
    Rejected,
}

impl SubmissionStatus {
    pub const ALL: &'static [SubmissionStatus] = &[
        Self::Pending,
        Self::UnderReview,
        Self::Completed,
        Self::Rejected,
    ];

    /// Returns true once review has concluded, either way.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Completed => "COMPLETED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        Self::UnderReview
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown submission status: {s}"))
    }
}
