pub mod competition;
pub mod dashboard;
pub mod judge;
pub mod participant;
pub mod rubric;
pub mod score;
pub mod shared;
pub mod submission;
pub mod user;
