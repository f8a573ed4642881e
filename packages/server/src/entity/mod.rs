pub mod competition;
pub mod judge;
pub mod judge_competition;
pub mod participant;
pub mod participant_competition;
pub mod rubric;
pub mod rubric_criterion;
pub mod rubric_version;
pub mod rubric_version_competition;
pub mod score;
pub mod submission;
pub mod user;
