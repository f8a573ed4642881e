use async_trait::async_trait;
use common::Role;
use sea_orm::ActiveValue::{self, Set};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,

    /// Upper-case role name. Parsed per request; unknown values grant nothing.
    pub role: String,
    /// Always equal to `role == ADMIN`; derived from `role` on every save.
    pub is_staff: bool,

    #[sea_orm(has_one)]
    pub participant: HasOne<super::participant::Entity>,

    #[sea_orm(has_one)]
    pub judge: HasOne<super::judge::Entity>,

    pub created_at: DateTimeUtc,
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        self.derive_staff_flag();
        Ok(self)
    }
}

impl ActiveModel {
    pub fn set_role(&mut self, role: Role) {
        self.role = Set(role.as_str().to_string());
        self.derive_staff_flag();
    }

    /// Bring `is_staff` in line with whatever role this model carries.
    fn derive_staff_flag(&mut self) {
        let staff = match &self.role {
            ActiveValue::Set(role) | ActiveValue::Unchanged(role) => Role::staff_flag(role),
            ActiveValue::NotSet => return,
        };
        let current = match &self.is_staff {
            ActiveValue::Set(flag) | ActiveValue::Unchanged(flag) => Some(*flag),
            ActiveValue::NotSet => None,
        };
        if current != Some(staff) {
            self.is_staff = Set(staff);
        }
    }
}
