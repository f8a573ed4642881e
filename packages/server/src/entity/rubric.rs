use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Flat scoring category; a score is given against exactly one rubric.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rubric")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub competition_id: i32,
    #[sea_orm(belongs_to, from = "competition_id", to = "id")]
    pub competition: HasOne<super::competition::Entity>,

    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(default_value = 100)]
    pub max_score: i32,

    #[sea_orm(has_many)]
    pub scores: HasMany<super::score::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
