//! Batched lookups used to decorate list responses with related names.

use std::collections::{BTreeMap, HashMap};

use sea_orm::*;

use crate::entity::{
    competition, judge, judge_competition, participant, participant_competition, rubric,
    submission, user,
};
use crate::error::AppError;

fn dedup(ids: impl IntoIterator<Item = i32>) -> Vec<i32> {
    let mut ids: Vec<i32> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

pub async fn usernames<C: ConnectionTrait>(
    db: &C,
    user_ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, String>, DbErr> {
    let ids = dedup(user_ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i32, String)> = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Username)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

pub async fn competition_names<C: ConnectionTrait>(
    db: &C,
    competition_ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, String>, DbErr> {
    let ids = dedup(competition_ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i32, String)> = competition::Entity::find()
        .filter(competition::Column::Id.is_in(ids))
        .select_only()
        .column(competition::Column::Id)
        .column(competition::Column::Name)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

pub async fn rubric_names<C: ConnectionTrait>(
    db: &C,
    rubric_ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, String>, DbErr> {
    let ids = dedup(rubric_ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i32, String)> = rubric::Entity::find()
        .filter(rubric::Column::Id.is_in(ids))
        .select_only()
        .column(rubric::Column::Id)
        .column(rubric::Column::Name)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

pub async fn submission_titles<C: ConnectionTrait>(
    db: &C,
    submission_ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, String>, DbErr> {
    let ids = dedup(submission_ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i32, String)> = submission::Entity::find()
        .filter(submission::Column::Id.is_in(ids))
        .select_only()
        .column(submission::Column::Id)
        .column(submission::Column::Title)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

/// Participant ID -> (owning user ID, username).
pub async fn participant_owners<C: ConnectionTrait>(
    db: &C,
    participant_ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, (i32, String)>, DbErr> {
    let ids = dedup(participant_ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i32, i32)> = participant::Entity::find()
        .filter(participant::Column::Id.is_in(ids))
        .select_only()
        .column(participant::Column::Id)
        .column(participant::Column::UserId)
        .into_tuple()
        .all(db)
        .await?;
    let names = usernames(db, rows.iter().map(|(_, uid)| *uid)).await?;
    Ok(rows
        .into_iter()
        .map(|(pid, uid)| (pid, (uid, names.get(&uid).cloned().unwrap_or_default())))
        .collect())
}

/// Judge ID -> (owning user ID, username).
pub async fn judge_owners<C: ConnectionTrait>(
    db: &C,
    judge_ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, (i32, String)>, DbErr> {
    let ids = dedup(judge_ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i32, i32)> = judge::Entity::find()
        .filter(judge::Column::Id.is_in(ids))
        .select_only()
        .column(judge::Column::Id)
        .column(judge::Column::UserId)
        .into_tuple()
        .all(db)
        .await?;
    let names = usernames(db, rows.iter().map(|(_, uid)| *uid)).await?;
    Ok(rows
        .into_iter()
        .map(|(jid, uid)| (jid, (uid, names.get(&uid).cloned().unwrap_or_default())))
        .collect())
}

/// Participant ID -> joined competition IDs, ascending.
pub async fn participant_competitions<C: ConnectionTrait>(
    db: &C,
    participant_ids: impl IntoIterator<Item = i32>,
) -> Result<BTreeMap<i32, Vec<i32>>, DbErr> {
    let ids = dedup(participant_ids);
    if ids.is_empty() {
        return Ok(BTreeMap::new());
    }
    let rows: Vec<(i32, i32)> = participant_competition::Entity::find()
        .filter(participant_competition::Column::ParticipantId.is_in(ids))
        .select_only()
        .column(participant_competition::Column::ParticipantId)
        .column(participant_competition::Column::CompetitionId)
        .order_by_asc(participant_competition::Column::CompetitionId)
        .into_tuple()
        .all(db)
        .await?;
    let mut map: BTreeMap<i32, Vec<i32>> = BTreeMap::new();
    for (pid, cid) in rows {
        map.entry(pid).or_default().push(cid);
    }
    Ok(map)
}

/// Judge ID -> assigned competition IDs, ascending.
pub async fn judge_competitions<C: ConnectionTrait>(
    db: &C,
    judge_ids: impl IntoIterator<Item = i32>,
) -> Result<BTreeMap<i32, Vec<i32>>, DbErr> {
    let ids = dedup(judge_ids);
    if ids.is_empty() {
        return Ok(BTreeMap::new());
    }
    let rows: Vec<(i32, i32)> = judge_competition::Entity::find()
        .filter(judge_competition::Column::JudgeId.is_in(ids))
        .select_only()
        .column(judge_competition::Column::JudgeId)
        .column(judge_competition::Column::CompetitionId)
        .order_by_asc(judge_competition::Column::CompetitionId)
        .into_tuple()
        .all(db)
        .await?;
    let mut map: BTreeMap<i32, Vec<i32>> = BTreeMap::new();
    for (jid, cid) in rows {
        map.entry(jid).or_default().push(cid);
    }
    Ok(map)
}

pub async fn participant_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Option<participant::Model>, DbErr> {
    participant::Entity::find()
        .filter(participant::Column::UserId.eq(user_id))
        .one(db)
        .await
}

pub async fn judge_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Option<judge::Model>, DbErr> {
    judge::Entity::find()
        .filter(judge::Column::UserId.eq(user_id))
        .one(db)
        .await
}

/// Fail with a validation error unless every competition ID exists.
pub async fn require_competitions_exist<C: ConnectionTrait>(
    db: &C,
    ids: &[i32],
) -> Result<(), AppError> {
    if ids.is_empty() {
        return Ok(());
    }
    let found: Vec<i32> = competition::Entity::find()
        .filter(competition::Column::Id.is_in(ids.to_vec()))
        .select_only()
        .column(competition::Column::Id)
        .into_tuple()
        .all(db)
        .await?;
    if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
        return Err(AppError::Validation(format!(
            "Competition {missing} does not exist"
        )));
    }
    Ok(())
}
