pub mod policy;
pub mod report;
pub mod role;
pub mod rubric;
pub mod storage;
pub mod submission_status;

pub use role::Role;
pub use submission_status::SubmissionStatus;
