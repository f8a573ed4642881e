use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rubric_criterion")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub rubric_version_id: i32,
    #[sea_orm(belongs_to, from = "rubric_version_id", to = "id")]
    pub rubric_version: HasOne<super::rubric_version::Entity>,

    pub name: String,
    /// Percent of the version's total; siblings sum to 100.
    pub weight: i32,
}

impl ActiveModelBehavior for ActiveModel {}
