//! Deletes that remove dependent rows first. Call inside a transaction.

use sea_orm::*;
use sea_orm::sea_query::IntoCondition;

use crate::entity::{
    competition, judge, judge_competition, participant, participant_competition, rubric,
    rubric_version_competition, score, submission,
};

/// Stored file paths released by a cascade; removed from the file store after commit.
pub type ReleasedFiles = Vec<String>;

async fn score_files<C, F>(db: &C, filter: F) -> Result<ReleasedFiles, DbErr>
where
    C: ConnectionTrait,
    F: IntoCondition + Clone,
{
    let files: Vec<Option<String>> = score::Entity::find()
        .filter(filter)
        .select_only()
        .column(score::Column::EvaluationFile)
        .into_tuple()
        .all(db)
        .await?;
    Ok(files.into_iter().flatten().collect())
}

async fn delete_scores<C, F>(db: &C, filter: F) -> Result<ReleasedFiles, DbErr>
where
    C: ConnectionTrait,
    F: IntoCondition + Clone,
{
    let files = score_files(db, filter.clone()).await?;
    score::Entity::delete_many().filter(filter).exec(db).await?;
    Ok(files)
}

/// Delete submissions matching `filter` together with their scores.
async fn delete_submissions<C, F>(db: &C, filter: F) -> Result<ReleasedFiles, DbErr>
where
    C: ConnectionTrait,
    F: IntoCondition,
{
    let rows: Vec<(i32, Option<String>)> = submission::Entity::find()
        .filter(filter)
        .select_only()
        .column(submission::Column::Id)
        .column(submission::Column::File)
        .into_tuple()
        .all(db)
        .await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = rows.iter().map(|(id, _)| *id).collect();
    let mut files = delete_scores(db, score::Column::SubmissionId.is_in(ids.clone())).await?;
    submission::Entity::delete_many()
        .filter(submission::Column::Id.is_in(ids))
        .exec(db)
        .await?;
    files.extend(rows.into_iter().filter_map(|(_, file)| file));
    Ok(files)
}

pub async fn delete_submission<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<ReleasedFiles, DbErr> {
    delete_submissions(db, submission::Column::Id.eq(id)).await
}

pub async fn delete_score<C: ConnectionTrait>(db: &C, id: i32) -> Result<ReleasedFiles, DbErr> {
    delete_scores(db, score::Column::Id.eq(id)).await
}

pub async fn delete_rubric<C: ConnectionTrait>(db: &C, id: i32) -> Result<ReleasedFiles, DbErr> {
    let files = delete_scores(db, score::Column::RubricId.eq(id)).await?;
    rubric::Entity::delete_by_id(id).exec(db).await?;
    Ok(files)
}

pub async fn delete_participant<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<ReleasedFiles, DbErr> {
    let files = delete_submissions(db, submission::Column::ParticipantId.eq(id)).await?;
    participant_competition::Entity::delete_many()
        .filter(participant_competition::Column::ParticipantId.eq(id))
        .exec(db)
        .await?;
    participant::Entity::delete_by_id(id).exec(db).await?;
    Ok(files)
}

pub async fn delete_judge<C: ConnectionTrait>(db: &C, id: i32) -> Result<ReleasedFiles, DbErr> {
    let files = delete_scores(db, score::Column::JudgeId.eq(id)).await?;
    judge_competition::Entity::delete_many()
        .filter(judge_competition::Column::JudgeId.eq(id))
        .exec(db)
        .await?;
    judge::Entity::delete_by_id(id).exec(db).await?;
    Ok(files)
}

pub async fn delete_competition<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<ReleasedFiles, DbErr> {
    let mut files = delete_scores(db, score::Column::CompetitionId.eq(id)).await?;
    files.extend(delete_submissions(db, submission::Column::CompetitionId.eq(id)).await?);
    rubric::Entity::delete_many()
        .filter(rubric::Column::CompetitionId.eq(id))
        .exec(db)
        .await?;
    participant_competition::Entity::delete_many()
        .filter(participant_competition::Column::CompetitionId.eq(id))
        .exec(db)
        .await?;
    judge_competition::Entity::delete_many()
        .filter(judge_competition::Column::CompetitionId.eq(id))
        .exec(db)
        .await?;
    rubric_version_competition::Entity::delete_many()
        .filter(rubric_version_competition::Column::CompetitionId.eq(id))
        .exec(db)
        .await?;
    competition::Entity::delete_by_id(id).exec(db).await?;
    Ok(files)
}
