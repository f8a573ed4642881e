use serde_json::json;

use crate::common::{TestApp, routes};

mod stats {
    use super::*;

    #[tokio::test]
    async fn empty_database_has_zero_totals_and_no_average() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app.get_with_token(routes::STATS, &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total_participants"], 0);
        assert_eq!(res.body["total_submissions"], 0);
        assert_eq!(res.body["total_scores"], 0);
        assert!(res.body["average_score"].is_null());
        assert_eq!(res.body["judge_activity"], json!([]));
        assert_eq!(res.body["weekly_submissions"], json!([]));
    }

    #[tokio::test]
    async fn only_admin_and_committee_read_stats() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let committee = app
            .create_user_with_role(&admin, "committee_bo", "COMMITTEE")
            .await;
        let judge = app.create_user_with_role(&admin, "judge_amy", "JUDGE").await;
        let alice = app.create_participant("alice").await;

        assert_eq!(app.get_with_token(routes::STATS, &committee).await.status, 200);
        assert_eq!(app.get_with_token(routes::STATS, &judge).await.status, 403);
        assert_eq!(app.get_with_token(routes::STATS, &alice).await.status, 403);
        assert_eq!(app.get_without_token(routes::STATS).await.status, 401);
    }

    #[tokio::test]
    async fn totals_average_and_activity() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let alice = app.create_participant("alice").await;
        let bob = app.create_participant("bob").await;
        let amy = app.create_user_with_role(&admin, "judge_amy", "JUDGE").await;
        let ben = app.create_user_with_role(&admin, "judge_ben", "JUDGE").await;
        let competition = app.create_competition(&admin, "Spring Cup").await;
        let rubric = app.create_rubric(&admin, competition, "Innovation").await;
        let s1 = app.create_submission(&alice, competition, "Robot").await;
        let s2 = app.create_submission(&bob, competition, "Drone").await;

        app.create_score(&ben, competition, s1, rubric, 90).await;
        app.create_score(&amy, competition, s1, rubric, 60).await;
        app.create_score(&amy, competition, s2, rubric, 75).await;

        let res = app.get_with_token(routes::STATS, &admin).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["total_participants"], 2);
        assert_eq!(res.body["total_submissions"], 2);
        assert_eq!(res.body["total_scores"], 3);
        assert_eq!(res.body["average_score"].as_f64(), Some(75.0));
        assert_eq!(
            res.body["judge_activity"],
            json!([
                {"judge_username": "judge_amy", "count": 2},
                {"judge_username": "judge_ben", "count": 1},
            ])
        );

        let weeks = res.body["weekly_submissions"].as_array().unwrap();
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0]["count"], 2);
        let this_week = ::common::report::week_start(chrono::Utc::now().date_naive());
        assert_eq!(weeks[0]["week"], this_week.to_string());
    }

    #[tokio::test]
    async fn competition_filter_narrows_every_figure() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let alice = app.create_participant("alice").await;
        let bob = app.create_participant("bob").await;
        let amy = app.create_user_with_role(&admin, "judge_amy", "JUDGE").await;
        let spring = app.create_competition(&admin, "Spring Cup").await;
        let autumn = app.create_competition(&admin, "Autumn Cup").await;
        let rubric = app.create_rubric(&admin, spring, "Innovation").await;
        let s1 = app.create_submission(&alice, spring, "Robot").await;
        app.create_submission(&bob, autumn, "Drone").await;
        app.create_score(&amy, spring, s1, rubric, 40).await;

        let res = app
            .get_with_token(&format!("{}?competition={autumn}", routes::STATS), &admin)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["total_participants"], 1);
        assert_eq!(res.body["total_submissions"], 1);
        assert_eq!(res.body["total_scores"], 0);
        assert!(res.body["average_score"].is_null());
        assert_eq!(res.body["judge_activity"], json!([]));

        let res = app
            .get_with_token(&format!("{}?competition={spring}", routes::STATS), &admin)
            .await;
        assert_eq!(res.body["total_scores"], 1);
        assert_eq!(res.body["average_score"].as_f64(), Some(40.0));
    }
}

mod export {
    use super::*;

    #[tokio::test]
    async fn csv_has_header_and_quoted_fields() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let alice = app.create_participant("alice").await;
        let amy = app.create_user_with_role(&admin, "judge_amy", "JUDGE").await;
        let competition = app.create_competition(&admin, "Spring Cup").await;
        let rubric = app.create_rubric(&admin, competition, "Innovation").await;
        let submission = app.create_submission(&alice, competition, "Robot").await;

        let res = app
            .post_with_token(
                routes::SCORES,
                &json!({
                    "competition": competition,
                    "submission": submission,
                    "rubric": rubric,
                    "score": 88,
                    "comment": "Fast, but \"noisy\"",
                }),
                &amy,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app.get_with_token(routes::EXPORT, &admin).await;
        assert_eq!(res.status, 200);
        assert!(res.content_type.as_deref().unwrap_or_default().starts_with("text/csv"));
        assert!(
            res.content_disposition
                .as_deref()
                .unwrap_or_default()
                .contains("scores_report.csv")
        );

        let mut lines = res.text.split("\r\n");
        assert_eq!(lines.next(), Some("Submission,Judge,Rubric,Score,Comment,Scored At"));
        let row = lines.next().unwrap();
        assert!(
            row.starts_with("Robot,judge_amy,Innovation,88,\"Fast, but \"\"noisy\"\"\","),
            "{row}"
        );
        assert_eq!(lines.next(), Some(""));
    }

    #[tokio::test]
    async fn export_is_staff_only() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let committee = app
            .create_user_with_role(&admin, "committee_bo", "COMMITTEE")
            .await;
        let judge = app.create_user_with_role(&admin, "judge_amy", "JUDGE").await;

        assert_eq!(app.get_with_token(routes::EXPORT, &committee).await.status, 403);
        assert_eq!(app.get_with_token(routes::EXPORT, &judge).await.status, 403);

        let res = app.get_with_token(routes::EXPORT, &admin).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.text, "Submission,Judge,Rubric,Score,Comment,Scored At\r\n");
    }
}
