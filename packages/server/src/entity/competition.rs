use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "competition")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    pub description: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,

    #[sea_orm(has_many, via = "participant_competition")]
    pub participants: HasMany<super::participant::Entity>,

    #[sea_orm(has_many, via = "judge_competition")]
    pub judges: HasMany<super::judge::Entity>,

    #[sea_orm(has_many, via = "rubric_version_competition")]
    pub rubric_versions: HasMany<super::rubric_version::Entity>,

    #[sea_orm(has_many)]
    pub submissions: HasMany<super::submission::Entity>,

    #[sea_orm(has_many)]
    pub rubrics: HasMany<super::rubric::Entity>,

    #[sea_orm(has_many)]
    pub scores: HasMany<super::score::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
