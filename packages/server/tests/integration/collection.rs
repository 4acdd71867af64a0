use serde_json::json;

use crate::common::{TestApp, routes};

const ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

mod create {
    use super::*;

    #[tokio::test]
    async fn admin_creates_a_collection_with_a_generated_code() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let res = app
            .post_with_token(
                routes::ADMIN_COLLECTIONS,
                &json!({"name": "Wedding Photos", "description": "Saturday"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let code = res.code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| ALPHABET.contains(c)), "{code}");
        assert_eq!(res.body["name"], "Wedding Photos");
        assert_eq!(res.body["status"], "active");
        assert_eq!(res.body["created_by"], "admin");
        assert_eq!(res.body["settings"]["allow_upload"], true);
        assert_eq!(res.body["settings"]["max_file_size"], 10 * 1024 * 1024);
        assert_eq!(
            res.body["settings"]["allowed_extensions"],
            json!([".jpg", ".jpeg", ".png", ".gif", ".webp"])
        );
        assert_eq!(res.body["statistics"]["total_photos"], 0);
        assert_eq!(res.body["statistics"]["total_size_bytes"], 0);
        assert!(res.body["statistics"]["last_upload_at"].is_null());
    }

    #[tokio::test]
    async fn partial_settings_are_merged_over_defaults() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let res = app
            .post_with_token(
                routes::ADMIN_COLLECTIONS,
                &json!({"name": "Raw only", "settings": {"allowed_extensions": ["JPG", "heic"]}}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["settings"]["allowed_extensions"], json!([".jpg", ".heic"]));
        assert_eq!(res.body["settings"]["allow_upload"], true);
        assert_eq!(res.body["settings"]["max_file_size"], 10 * 1024 * 1024);
    }

    #[tokio::test]
    async fn codes_are_unique_across_many_collections() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let mut codes = std::collections::HashSet::new();
        for i in 0..20 {
            let code = app
                .create_collection(&token, json!({"name": format!("Collection {i}")}))
                .await;
            assert!(codes.insert(code));
        }
    }

    #[tokio::test]
    async fn invalid_fields_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        for body in [
            json!({"name": "ab"}),
            json!({"name": "x".repeat(101)}),
            json!({"name": "Valid", "description": "d".repeat(501)}),
            json!({"name": "Valid", "status": "deleted"}),
            json!({"name": "Valid", "settings": {"max_file_size": 0}}),
        ] {
            let res = app
                .post_with_token(routes::ADMIN_COLLECTIONS, &body, &token)
                .await;
            assert_eq!(res.status, 400, "{body}: {}", res.text);
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::ADMIN_COLLECTIONS, &json!({"name": "Wedding"}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let code = app.create_collection(&token, json!({"name": "Reunion"})).await;

        let res = app
            .get_with_token(&routes::admin_collection(&code.to_lowercase()), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.code(), code);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let res = app
            .get_with_token(&routes::admin_collection("ZZZZZZ"), &token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let first = app.create_collection(&token, json!({"name": "First"})).await;
        let second = app.create_collection(&token, json!({"name": "Second"})).await;
        let third = app.create_collection(&token, json!({"name": "Third"})).await;

        let res = app
            .get_with_token(&format!("{}?page=1&limit=2", routes::ADMIN_COLLECTIONS), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let page: Vec<&str> = res.body.as_array().unwrap().iter().map(|c| c["code"].as_str().unwrap()).collect();
        assert_eq!(page, vec![third.as_str(), second.as_str()]);

        let res = app
            .get_with_token(&format!("{}?page=2&limit=2", routes::ADMIN_COLLECTIONS), &token)
            .await;
        let page: Vec<&str> = res.body.as_array().unwrap().iter().map(|c| c["code"].as_str().unwrap()).collect();
        assert_eq!(page, vec![first.as_str()]);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        app.create_collection(&token, json!({"name": "Open"})).await;
        let archived = app
            .create_collection(&token, json!({"name": "Old", "status": "archived"}))
            .await;

        let res = app
            .get_with_token(&format!("{}?status=archived", routes::ADMIN_COLLECTIONS), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let items = res.body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["code"], archived.as_str());
    }

    #[tokio::test]
    async fn bad_list_parameters_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        for query in ["status=bogus", "limit=0", "limit=101", "page=0"] {
            let res = app
                .get_with_token(&format!("{}?{query}", routes::ADMIN_COLLECTIONS), &token)
                .await;
            assert_eq!(res.status, 400, "{query}: {}", res.text);
        }
    }

    #[tokio::test]
    async fn count_breaks_down_by_status() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        app.create_collection(&token, json!({"name": "One"})).await;
        app.create_collection(&token, json!({"name": "Two"})).await;
        app.create_collection(&token, json!({"name": "Three", "status": "closed"}))
            .await;

        let res = app
            .get_with_token(routes::ADMIN_COLLECTION_COUNT, &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body, json!({"total": 3, "active": 2, "archived": 0, "closed": 1}));

        let res = app
            .get_with_token(&format!("{}?status=active", routes::ADMIN_COLLECTION_COUNT), &token)
            .await;
        assert_eq!(res.body, json!({"total": 2}));
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn only_supplied_fields_change() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let code = app
            .create_collection(
                &token,
                json!({"name": "Reunion", "description": "Class of 2004", "settings": {"max_file_size": 5000000}}),
            )
            .await;

        let res = app
            .patch_with_token(
                &routes::admin_collection(&code),
                &json!({"status": "archived", "settings": {"allow_upload": false}}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "archived");
        assert_eq!(res.body["name"], "Reunion");
        assert_eq!(res.body["description"], "Class of 2004");
        assert_eq!(res.body["settings"]["allow_upload"], false);
        assert_eq!(res.body["settings"]["max_file_size"], 5000000);
        assert_eq!(res.code(), code);
    }

    #[tokio::test]
    async fn null_description_clears_it() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let code = app
            .create_collection(&token, json!({"name": "Reunion", "description": "temp"}))
            .await;

        let res = app
            .patch_with_token(&routes::admin_collection(&code), &json!({"description": null}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["description"].is_null());
    }

    #[tokio::test]
    async fn invalid_status_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let code = app.create_collection(&token, json!({"name": "Reunion"})).await;

        let res = app
            .patch_with_token(&routes::admin_collection(&code), &json!({"status": "paused"}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let res = app
            .patch_with_token(&routes::admin_collection("ZZZZZZ"), &json!({"name": "Nope"}), &token)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn deleted_collection_disappears_everywhere() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let code = app.create_collection(&token, json!({"name": "Short lived"})).await;

        let res = app.delete_with_token(&routes::admin_collection(&code), &token).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let res = app.get_with_token(&routes::admin_collection(&code), &token).await;
        assert_eq!(res.status, 404);

        let res = app.get_with_token(routes::ADMIN_COLLECTIONS, &token).await;
        assert_eq!(res.body, json!([]));

        let res = app.get_with_token(routes::ADMIN_COLLECTION_COUNT, &token).await;
        assert_eq!(res.body["total"], 0);

        let res = app.post_without_token(routes::VALIDATE, &json!({"code": code})).await;
        assert_eq!(res.body["valid"], false);
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let code = app.create_collection(&token, json!({"name": "Short lived"})).await;

        let first = app.delete_with_token(&routes::admin_collection(&code), &token).await;
        assert_eq!(first.status, 204);
        let second = app.delete_with_token(&routes::admin_collection(&code), &token).await;
        assert_eq!(second.status, 404);
    }
}

mod validate {
    use super::*;

    #[tokio::test]
    async fn active_collection_is_valid_for_any_case() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let code = app
            .create_collection(&token, json!({"name": "Garden Party", "description": "June"}))
            .await;

        let res = app
            .post_without_token(routes::VALIDATE, &json!({"code": format!(" {} ", code.to_lowercase())}))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["valid"], true);
        assert_eq!(res.body["collection"]["code"], code.as_str());
        assert_eq!(res.body["collection"]["name"], "Garden Party");
        assert_eq!(res.body["collection"]["settings"]["max_file_size"], 10 * 1024 * 1024);
        assert!(res.body.get("message").is_none());
    }

    #[tokio::test]
    async fn archived_collection_explains_why() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let code = app
            .create_collection(&token, json!({"name": "Old event", "status": "archived"}))
            .await;

        let res = app.post_without_token(routes::VALIDATE, &json!({"code": code})).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["valid"], false);
        assert!(res.body["message"].as_str().unwrap().contains("archived"));
        assert!(res.body.get("collection").is_none());
    }

    #[tokio::test]
    async fn uploads_disabled_is_not_valid() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let code = app
            .create_collection(&token, json!({"name": "Paused", "settings": {"allow_upload": false}}))
            .await;

        let res = app.post_without_token(routes::VALIDATE, &json!({"code": code})).await;

        assert_eq!(res.body["valid"], false);
        assert!(res.body["message"].as_str().unwrap().contains("not currently allowed"));
    }

    #[tokio::test]
    async fn unknown_and_malformed_codes_are_not_found() {
        let app = TestApp::spawn().await;

        for code in ["ZZZZZZ", "INVALID", "", "AB0O1I"] {
            let res = app.post_without_token(routes::VALIDATE, &json!({"code": code})).await;
            assert_eq!(res.status, 200);
            assert_eq!(res.body["valid"], false);
            assert!(res.body["message"].as_str().unwrap().contains("not found"), "{code}");
        }
    }
}
