use common::Role;
use sea_orm::*;

use crate::entity::{judge, participant};

/// Profile fields collected at registration.
#[derive(Debug, Default, Clone)]
pub struct ProfileFields {
    pub institution: String,
    pub phone: String,
    pub expertise: String,
}

/// The profile row an account of a given role must own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Participant,
    Judge,
}

impl ProfileKind {
    pub fn for_role(role: Role) -> Option<Self> {
        match role {
            Role::Participant => Some(Self::Participant),
            Role::Judge => Some(Self::Judge),
            Role::Admin | Role::Committee => None,
        }
    }
}

/// Create the profile row for `user_id` if its role needs one and it is missing.
///
/// Returns `true` when a row was inserted.
pub async fn ensure_profile<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    role: Role,
    fields: &ProfileFields,
) -> Result<bool, DbErr> {
    let Some(kind) = ProfileKind::for_role(role) else {
        return Ok(false);
    };

    let inserted = match kind {
        ProfileKind::Participant => {
            let row = participant::ActiveModel {
                user_id: Set(user_id),
                institution: Set(fields.institution.trim().to_string()),
                phone: Set(fields.phone.trim().to_string()),
                ..Default::default()
            };
            participant::Entity::insert(row)
                .on_conflict(
                    sea_query::OnConflict::column(participant::Column::UserId)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(db)
                .await?
        }
        ProfileKind::Judge => {
            let row = judge::ActiveModel {
                user_id: Set(user_id),
                expertise: Set(fields.expertise.trim().to_string()),
                ..Default::default()
            };
            judge::Entity::insert(row)
                .on_conflict(
                    sea_query::OnConflict::column(judge::Column::UserId)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(db)
                .await?
        }
    };

    Ok(inserted > 0)
}
