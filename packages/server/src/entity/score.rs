use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "score")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "score_tuple")]
    pub competition_id: i32,
    #[sea_orm(belongs_to, from = "competition_id", to = "id")]
    pub competition: HasOne<super::competition::Entity>,

    #[sea_orm(unique_key = "score_tuple")]
    pub submission_id: i32,
    #[sea_orm(belongs_to, from = "submission_id", to = "id")]
    pub submission: HasOne<super::submission::Entity>,

    #[sea_orm(unique_key = "score_tuple")]
    pub judge_id: i32,
    #[sea_orm(belongs_to, from = "judge_id", to = "id")]
    pub judge: HasOne<super::judge::Entity>,

    #[sea_orm(unique_key = "score_tuple")]
    pub rubric_id: i32,
    #[sea_orm(belongs_to, from = "rubric_id", to = "id")]
    pub rubric: HasOne<super::rubric::Entity>,

    pub score: i32,
    #[sea_orm(column_type = "Text")]
    pub comment: String,

    /// Stored path (`judge_evaluations/...`) of the attached evaluation sheet.
    pub evaluation_file: Option<String>,
    pub evaluation_link: Option<String>,

    /// Set on insert and never updated.
    pub scored_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
