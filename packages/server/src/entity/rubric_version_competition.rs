use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rubric_version_competition")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub rubric_version_id: i32,
    #[sea_orm(primary_key)]
    pub competition_id: i32,
    #[sea_orm(belongs_to, from = "rubric_version_id", to = "id")]
    pub rubric_version: HasOne<super::rubric_version::Entity>,
    #[sea_orm(belongs_to, from = "competition_id", to = "id")]
    pub competition: HasOne<super::competition::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
