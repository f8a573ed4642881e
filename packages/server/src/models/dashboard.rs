use common::report::WeekBucket;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, utoipa::IntoParams)]
pub struct StatsQuery {
    /// Restrict every figure to one competition.
    pub competition: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema, PartialEq, Debug)]
pub struct JudgeActivity {
    #[schema(example = "judge_amy")]
    pub judge_username: String,
    #[schema(example = 14)]
    pub count: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DashboardStats {
    pub total_participants: u64,
    pub total_submissions: u64,
    pub total_scores: u64,
    /// `null` when there are no scores.
    pub average_score: Option<f64>,
    /// Most active judge first.
    pub judge_activity: Vec<JudgeActivity>,
    /// Oldest week first; weeks without submissions are omitted.
    pub weekly_submissions: Vec<WeekBucket>,
}
