use serde_json::json;

use crate::common::{ADMIN_PASSWORD, ADMIN_USERNAME, TestApp, routes};

mod login {
    use super::*;

    #[tokio::test]
    async fn seeded_admin_receives_a_bearer_token() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": ADMIN_USERNAME, "password": ADMIN_PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(res.body["token_type"], "bearer");
        assert_eq!(res.body["expires_in"], 3600);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": ADMIN_USERNAME, "password": "not-the-password"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_user_gets_the_same_error_as_a_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "nobody", "password": ADMIN_PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::LOGIN, &json!({"username": ADMIN_USERNAME}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod token {
    use super::*;

    #[tokio::test]
    async fn me_returns_the_authenticated_admin() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["username"], ADMIN_USERNAME);
        assert!(res.body["id"].is_number());
        assert!(res.body["created_at"].is_string());
        assert!(res.body.get("password").is_none());
    }

    #[tokio::test]
    async fn verify_confirms_a_live_token() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let res = app.post_with_token(routes::VERIFY, &json!({}), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["valid"], true);
        assert_eq!(res.body["username"], ADMIN_USERNAME);
    }

    #[tokio::test]
    async fn missing_token_is_unauthenticated() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let app = TestApp::spawn().await;
        let other = TestApp::spawn_with(|cfg| cfg.auth.jwt_secret = "a-different-secret".into()).await;
        let foreign = other.login_admin().await;

        let res = app.get_with_token(routes::ME, &foreign).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let app = TestApp::spawn_with(|cfg| cfg.auth.jwt_expires_minutes = -5).await;
        let token = app.login_admin().await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
