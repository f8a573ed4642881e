//! Idempotent maintenance run on every startup.

use common::Role;
use sea_orm::*;
use tracing::info;

use crate::config::BootstrapAdmin;
use crate::entity::user;
use crate::utils::hash;
use crate::utils::profile::{ProfileFields, ensure_profile};

/// Bring `is_staff` back in line with the role on rows where the two disagree.
///
/// Saves through [`user::ActiveModel`] derive the flag already, so this only
/// catches edits made directly in the database. Roles are compared with
/// [`Role::staff_flag`], the same parse the request path uses.
pub async fn sync_staff_flags(db: &DatabaseConnection) -> Result<u64, DbErr> {
    let accounts: Vec<(i32, String, bool)> = user::Entity::find()
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Role)
        .column(user::Column::IsStaff)
        .into_tuple()
        .all(db)
        .await?;

    let (to_promote, to_demote): (Vec<_>, Vec<_>) = accounts
        .into_iter()
        .filter(|(_, role, is_staff)| Role::staff_flag(role) != *is_staff)
        .partition(|(_, role, _)| Role::staff_flag(role));

    let promoted = set_staff_flag(db, to_promote.iter().map(|(id, ..)| *id), true).await?;
    let demoted = set_staff_flag(db, to_demote.iter().map(|(id, ..)| *id), false).await?;

    let fixed = promoted + demoted;
    if fixed > 0 {
        info!(promoted, demoted, "Synchronised staff flags");
    }
    Ok(fixed)
}

async fn set_staff_flag(
    db: &DatabaseConnection,
    ids: impl Iterator<Item = i32>,
    flag: bool,
) -> Result<u64, DbErr> {
    let ids: Vec<i32> = ids.collect();
    if ids.is_empty() {
        return Ok(0);
    }
    Ok(user::Entity::update_many()
        .col_expr(user::Column::IsStaff, sea_query::Expr::value(flag))
        .filter(user::Column::Id.is_in(ids))
        .exec(db)
        .await?
        .rows_affected)
}

/// Create the participant or judge profile for every account that lacks one.
pub async fn backfill_profiles(db: &DatabaseConnection) -> Result<u64, DbErr> {
    // Roles are parsed in Rust so stored casing does not matter.
    let accounts: Vec<(i32, String)> = user::Entity::find()
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Role)
        .order_by_asc(user::Column::Id)
        .into_tuple()
        .all(db)
        .await?;

    let fields = ProfileFields::default();
    let mut created = 0u64;
    for (user_id, role) in accounts {
        let Ok(role) = role.parse::<Role>() else {
            continue;
        };
        if ensure_profile(db, user_id, role, &fields).await? {
            created += 1;
        }
    }

    if created > 0 {
        info!(created, "Backfilled missing profiles");
    }
    Ok(created)
}

/// Create the configured administrator if no account with that username exists.
///
/// Returns `true` when an account was created.
pub async fn bootstrap_admin(
    db: &DatabaseConnection,
    admin: Option<&BootstrapAdmin>,
) -> Result<bool, DbErr> {
    let Some(admin) = admin else {
        return Ok(false);
    };

    let exists = user::Entity::find()
        .filter(user::Column::Username.eq(admin.username.as_str()))
        .count(db)
        .await?
        > 0;
    if exists {
        return Ok(false);
    }

    let password_hash = hash::hash_password_blocking(admin.password.clone())
        .await
        .map_err(|e| DbErr::Custom(format!("Failed to hash bootstrap password: {e}")))?;

    let mut account = user::ActiveModel {
        username: Set(admin.username.clone()),
        email: Set(admin.email.clone()),
        password: Set(password_hash),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    account.set_role(Role::Admin);

    let result = user::Entity::insert(account)
        .on_conflict(
            sea_query::OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    if result > 0 {
        info!(username = %admin.username, "Created bootstrap administrator");
    }
    Ok(result > 0)
}
