use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use scorecard_server::entity::{rubric_criterion, rubric_version};

use crate::common::{TestApp, routes};

mod flat_rubrics {
    use super::*;

    #[tokio::test]
    async fn max_score_defaults_to_hundred() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let competition = app.create_competition(&admin, "Spring Cup").await;

        let id = app.create_rubric(&admin, competition, "Innovation").await;

        let res = app.get_with_token(&routes::rubric(id), &admin).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["max_score"], 100);
        assert_eq!(res.body["competition_id"], competition);
    }

    #[tokio::test]
    async fn only_admin_creates() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let judge = app.create_user_with_role(&admin, "judge_amy", "JUDGE").await;
        let competition = app.create_competition(&admin, "Spring Cup").await;

        let res = app
            .post_with_token(
                routes::RUBRICS,
                &json!({"competition": competition, "name": "Design"}),
                &judge,
            )
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn list_filters_by_competition() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let spring = app.create_competition(&admin, "Spring Cup").await;
        let autumn = app.create_competition(&admin, "Autumn Cup").await;
        app.create_rubric(&admin, spring, "Innovation").await;
        app.create_rubric(&admin, autumn, "Design").await;

        let res = app
            .get_with_token(&format!("{}?competition_id={autumn}", routes::RUBRICS), &admin)
            .await;
        let list = res.body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["name"], "Design");

        let res = app.get_with_token(routes::RUBRICS, &admin).await;
        assert_eq!(res.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn max_score_cannot_drop_below_given_scores() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let alice = app.create_participant("alice").await;
        let judge = app.create_user_with_role(&admin, "judge_amy", "JUDGE").await;
        let competition = app.create_competition(&admin, "Spring Cup").await;
        let submission = app.create_submission(&alice, competition, "Robot").await;
        let id = app.create_rubric(&admin, competition, "Innovation").await;
        app.create_score(&judge, competition, submission, id, 90).await;

        let res = app
            .put_with_token(&routes::rubric(id), &json!({"max_score": 50, "name": "Renamed"}), &admin)
            .await;
        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.code(), "VALIDATION_ERROR");

        let res = app.get_with_token(&routes::rubric(id), &admin).await;
        assert_eq!(res.body["max_score"], 100);
        assert_eq!(res.body["name"], "Innovation");

        let res = app
            .put_with_token(&routes::rubric(id), &json!({"max_score": 90}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["max_score"], 90);
    }

    #[tokio::test]
    async fn update_and_delete() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let competition = app.create_competition(&admin, "Spring Cup").await;
        let id = app.create_rubric(&admin, competition, "Innovation").await;

        let res = app
            .put_with_token(&routes::rubric(id), &json!({"max_score": 10}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["max_score"], 10);
        assert_eq!(res.body["name"], "Innovation");

        let res = app
            .put_with_token(&routes::rubric(id), &json!({"max_score": 0}), &admin)
            .await;
        assert_eq!(res.status, 400);

        let res = app.delete_with_token(&routes::rubric(id), &admin).await;
        assert_eq!(res.status, 204);
        let res = app.get_with_token(&routes::rubric(id), &admin).await;
        assert_eq!(res.status, 404);
    }
}

mod versions {
    use super::*;

    #[tokio::test]
    async fn weights_summing_to_hundred_are_stored_with_competitions() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let spring = app.create_competition(&admin, "Spring Cup").await;
        let autumn = app.create_competition(&admin, "Autumn Cup").await;

        let res = app
            .post_with_token(
                routes::RUBRIC_VERSIONS,
                &json!({
                    "name": "Finals",
                    "competitions": [spring, autumn],
                    "criteria": [
                        {"name": "Technical depth", "weight": 40},
                        {"name": "Presentation", "weight": 35},
                        {"name": "Impact", "weight": 25},
                    ],
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let id = res.id();

        let res = app.get_with_token(&routes::rubric_version(id), &admin).await;
        assert_eq!(res.status, 200);
        let weights: Vec<i64> = res.body["criteria"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["weight"].as_i64().unwrap())
            .collect();
        assert_eq!(weights, vec![40, 35, 25]);
        let mut competitions = vec![spring, autumn];
        competitions.sort_unstable();
        assert_eq!(res.body["competitions"], json!(competitions));
    }

    #[tokio::test]
    async fn weights_off_by_one_persist_nothing() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let competition = app.create_competition(&admin, "Spring Cup").await;

        for weights in [[50, 49], [50, 51]] {
            let res = app
                .post_with_token(
                    routes::RUBRIC_VERSIONS,
                    &json!({
                        "name": "Broken",
                        "competitions": [competition],
                        "criteria": [
                            {"name": "A", "weight": weights[0]},
                            {"name": "B", "weight": weights[1]},
                        ],
                    }),
                    &admin,
                )
                .await;
            assert_eq!(res.status, 400, "{}", res.text);
            assert_eq!(res.code(), "VALIDATION_ERROR");
        }

        assert_eq!(rubric_version::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(rubric_criterion::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_competition_persists_nothing() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::RUBRIC_VERSIONS,
                &json!({
                    "name": "Orphan",
                    "competitions": [777],
                    "criteria": [{"name": "All", "weight": 100}],
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(rubric_version::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn committee_reads_but_cannot_create() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let committee = app
            .create_user_with_role(&admin, "committee_bo", "COMMITTEE")
            .await;

        let body = json!({"name": "V1", "criteria": [{"name": "All", "weight": 100}]});
        let res = app
            .post_with_token(routes::RUBRIC_VERSIONS, &body, &committee)
            .await;
        assert_eq!(res.status, 403);

        let res = app.post_with_token(routes::RUBRIC_VERSIONS, &body, &admin).await;
        assert_eq!(res.status, 201);

        let res = app.get_with_token(routes::RUBRIC_VERSIONS, &committee).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_array().unwrap().len(), 1);
    }
}
