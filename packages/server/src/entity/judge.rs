use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "judge")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub expertise: String,

    #[sea_orm(has_many, via = "judge_competition")]
    pub competitions: HasMany<super::competition::Entity>,

    #[sea_orm(has_many)]
    pub scores: HasMany<super::score::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
