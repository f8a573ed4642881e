//! One competition run from registration through the final export.

use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn full_competition_round() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let c1 = app.create_competition(&admin, "Robotics Challenge").await;

    let p1 = app.create_participant("team_orion").await;
    let participant_id = app.profile_id(&p1, "participant_id").await;
    let s1 = app.create_submission(&p1, c1, "Line follower").await;

    let res = app.get_with_token(&routes::participant(participant_id), &admin).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["competitions"], json!([c1]));

    let j1 = app.create_user_with_role(&admin, "judge_kim", "JUDGE").await;
    let judge_id = app.profile_id(&j1, "judge_id").await;
    let res = app
        .put_with_token(&routes::judge(judge_id), &json!({"competitions": [c1]}), &admin)
        .await;
    assert_eq!(res.status, 200);

    let r1 = app.create_rubric(&admin, c1, "Innovation").await;

    // The judge can see the submission but not change it.
    let res = app.get_with_token(&routes::submission(s1), &j1).await;
    assert_eq!(res.status, 200);
    let res = app
        .patch_with_token(&routes::submission(s1), &json!({"status": "COMPLETED"}), &j1)
        .await;
    assert_eq!(res.status, 403);

    let score = app.create_score(&j1, c1, s1, r1, 92).await;

    // Scoring the same submission against the same rubric again is refused.
    let res = app
        .post_with_token(
            routes::SCORES,
            &json!({"competition": c1, "submission": s1, "rubric": r1, "score": 10}),
            &j1,
        )
        .await;
    assert_eq!(res.status, 409);
    let res = app.get_with_token(routes::SCORES, &j1).await;
    let scores = res.body.as_array().unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0]["id"], score);
    assert_eq!(scores[0]["score"], 92);

    let res = app.get_with_token(routes::SCORES, &p1).await;
    assert!(res.body.as_array().unwrap().is_empty());

    let res = app
        .patch_with_token(&routes::submission(s1), &json!({"status": "COMPLETED"}), &admin)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "COMPLETED");

    let res = app.get_with_token(&routes::submission(s1), &p1).await;
    assert_eq!(res.body["status"], "COMPLETED");

    let res = app
        .get_with_token(&format!("{}?competition={c1}", routes::STATS), &admin)
        .await;
    assert_eq!(res.body["total_participants"], 1);
    assert_eq!(res.body["total_submissions"], 1);
    assert_eq!(res.body["total_scores"], 1);
    assert_eq!(res.body["average_score"].as_f64(), Some(92.0));
    assert_eq!(res.body["judge_activity"][0]["judge_username"], "judge_kim");

    let res = app.get_with_token(routes::EXPORT, &admin).await;
    assert!(res.text.contains("Line follower,judge_kim,Innovation,92,Solid work,"));

    let res = app.delete_with_token(&routes::competition(c1), &admin).await;
    assert_eq!(res.status, 204);
    assert_eq!(app.get_with_token(&routes::score(score), &admin).await.status, 404);
    assert_eq!(app.get_with_token(&routes::submission(s1), &admin).await.status, 404);

    let res = app.get_with_token(&routes::participant(participant_id), &admin).await;
    assert_eq!(res.body["competitions"], json!([]));
}
