mod common;

mod dashboard;
mod rubrics;
mod scenario;
mod users;
