use serde_json::json;

use crate::common::{ADMIN_USERNAME, PASSWORD, TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn anonymous_registration_creates_a_participant_with_profile() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "username": "alice",
                    "password": PASSWORD,
                    "institution": "MIT",
                    "phone": "555-0100",
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["username"], "alice");
        assert_eq!(res.body["role"], "PARTICIPANT");
        assert_eq!(res.body["is_staff"], false);
        assert!(res.body.get("password").is_none());

        let token = app.login("alice").await;
        let participant_id = app.profile_id(&token, "participant_id").await;
        let profile = app
            .get_with_token(&routes::participant(participant_id), &token)
            .await;
        assert_eq!(profile.status, 200);
        assert_eq!(profile.body["institution"], "MIT");
        assert_eq!(profile.body["username"], "alice");
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let app = TestApp::spawn().await;
        let body = json!({"username": "alice", "password": PASSWORD});

        let first = app.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(first.status, 201, "{}", first.text);

        let res = app.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.code(), "USERNAME_TAKEN");
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"username": "alice", "password": "short"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn anonymous_caller_cannot_register_a_judge() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"username": "sneaky", "password": PASSWORD, "role": "JUDGE"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn participant_cannot_register_an_admin() {
        let app = TestApp::spawn().await;
        let token = app.create_participant("alice").await;

        let res = app
            .post_with_token(
                routes::REGISTER,
                &json!({"username": "boss", "password": PASSWORD, "role": "ADMIN"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.code(), "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn admin_registers_judge_with_profile_and_committee_without() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let judge = app.create_user_with_role(&admin, "judge_amy", "JUDGE").await;
        let me = app.get_with_token(routes::ME, &judge).await;
        assert_eq!(me.body["role"], "JUDGE");
        assert!(me.body["judge_id"].is_number());
        assert!(me.body["participant_id"].is_null());

        let committee = app
            .create_user_with_role(&admin, "committee_bo", "COMMITTEE")
            .await;
        let me = app.get_with_token(routes::ME, &committee).await;
        assert_eq!(me.body["role"], "COMMITTEE");
        assert!(me.body["judge_id"].is_null());
        assert!(me.body["participant_id"].is_null());
    }

    #[tokio::test]
    async fn staff_flag_follows_role() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::REGISTER,
                &json!({"username": "second_admin", "password": PASSWORD, "role": "ADMIN"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["is_staff"], true);

        let res = app
            .post_with_token(
                routes::REGISTER,
                &json!({"username": "viewer", "password": PASSWORD, "role": "COMMITTEE"}),
                &admin,
            )
            .await;
        assert_eq!(res.body["is_staff"], false);
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_participant("alice").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alice", "password": "not-the-password"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_user_is_rejected_like_a_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "ghost", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn login_returns_token_and_user() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": ADMIN_USERNAME, "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["user"]["role"], "ADMIN");
    }
}

mod tokens {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not.a.jwt").await;
        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn token_of_deleted_account_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let token = app.create_participant("alice").await;
        let me = app.get_with_token(routes::ME, &token).await;
        let user_id = me.id();

        let res = app.delete_with_token(&routes::user(user_id), &admin).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let res = app.get_with_token(routes::ME, &token).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "TOKEN_INVALID");
    }
}

mod administration {
    use super::*;

    #[tokio::test]
    async fn only_admin_lists_users() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let participant = app.create_participant("alice").await;

        let res = app.get_with_token(routes::USERS, &admin).await;
        assert_eq!(res.status, 200);
        let names: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["username"].as_str().unwrap())
            .collect();
        assert!(names.contains(&ADMIN_USERNAME));
        assert!(names.contains(&"alice"));

        let res = app.get_with_token(routes::USERS, &participant).await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn admin_cannot_delete_own_account() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let me = app.get_with_token(routes::ME, &admin).await;

        let res = app.delete_with_token(&routes::user(me.id()), &admin).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn deleting_a_participant_removes_their_submissions() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let competition = app.create_competition(&admin, "Spring Cup").await;
        let alice = app.create_participant("alice").await;
        let submission = app.create_submission(&alice, competition, "Robot").await;
        let alice_id = app.get_with_token(routes::ME, &alice).await.id();

        let res = app.delete_with_token(&routes::user(alice_id), &admin).await;
        assert_eq!(res.status, 204);

        let res = app
            .get_with_token(&routes::submission(submission), &admin)
            .await;
        assert_eq!(res.status, 404);
    }
}

mod staff_flag {
    use super::*;
    use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

    use scorecard_server::entity::user;
    use scorecard_server::seed;

    async fn stored_flag(app: &TestApp, id: i32) -> bool {
        user::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap()
            .is_staff
    }

    #[tokio::test]
    async fn startup_sync_accepts_any_role_casing() {
        let app = TestApp::spawn().await;
        let carol = app.create_participant("carol").await;
        let id = app.get_with_token(routes::ME, &carol).await.id();

        user::Entity::update_many()
            .col_expr(user::Column::Role, sea_orm::sea_query::Expr::value("admin"))
            .filter(user::Column::Id.eq(id))
            .exec(&app.db)
            .await
            .unwrap();

        assert_eq!(seed::sync_staff_flags(&app.db).await.unwrap(), 1);
        assert!(stored_flag(&app, id).await);
        assert_eq!(seed::sync_staff_flags(&app.db).await.unwrap(), 0);

        let res = app.get_with_token(routes::USERS, &carol).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn saving_a_role_rederives_the_flag() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let judge = app.create_user_with_role(&admin, "judge_amy", "JUDGE").await;
        let id = app.get_with_token(routes::ME, &judge).await.id();

        let row = user::Entity::find_by_id(id).one(&app.db).await.unwrap().unwrap();
        let mut active: user::ActiveModel = row.into();
        active.role = Set("ADMIN".to_string());
        active.update(&app.db).await.unwrap();
        assert!(stored_flag(&app, id).await);

        let row = user::Entity::find_by_id(id).one(&app.db).await.unwrap().unwrap();
        let mut active: user::ActiveModel = row.into();
        active.role = Set("COMMITTEE".to_string());
        active.is_staff = Set(true);
        active.update(&app.db).await.unwrap();
        assert!(!stored_flag(&app, id).await);
    }
}
