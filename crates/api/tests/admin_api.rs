//! HTTP-level integration tests for the `/admin/users` endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, get, post_json, register, send, whoami, TestApp, PASSWORD};
use gotta_listen_db::store::CredentialStore;
use serde_json::json;

/// Register an admin and a regular user; returns `(admin_token, bob_token, bob_id)`.
async fn admin_and_bob(app: &TestApp) -> (String, String, i64) {
    let admin = register(&app.router, "admin").await;
    let admin_id = whoami(&app.router, &admin).await.unwrap();
    assert!(app.store.set_admin(admin_id, true).await.unwrap());

    let bob = register(&app.router, "bob").await;
    let bob_id = whoami(&app.router, &bob).await.unwrap();
    (admin, bob, bob_id)
}

async fn login_bob(app: &TestApp) -> axum::response::Response {
    post_json(
        &app.router,
        "/api/v1/auth/login",
        None,
        json!({ "email": "bob@test.io", "password": PASSWORD }),
    )
    .await
}

#[tokio::test]
async fn test_admin_requires_session() {
    let app = common::build_test_app();
    let response = get(&app.router, "/api/v1/admin/users", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHENTICATED");
    assert_eq!(json["redirect"], "/login");
}

#[tokio::test]
async fn test_admin_rejects_regular_user() {
    let app = common::build_test_app();
    let (_, bob, _) = admin_and_bob(&app).await;

    let response = get(&app.router, "/api/v1/admin/users", Some(&bob)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
    assert_eq!(json["redirect"], "/feed");
}

#[tokio::test]
async fn test_list_users() {
    let app = common::build_test_app();
    let (admin, _, _) = admin_and_bob(&app).await;

    let response = get(&app.router, "/api/v1/admin/users", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let users = json["data"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
    assert!(users.iter().any(|u| u["username"] == "bob"));
}

#[tokio::test]
async fn test_permanent_ban_revokes_and_blocks_login() {
    let app = common::build_test_app();
    let (admin, bob, bob_id) = admin_and_bob(&app).await;

    let response = post_json(
        &app.router,
        &format!("/api/v1/admin/users/{bob_id}/ban"),
        Some(&admin),
        json!({ "duration_days": 0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["is_banned"], true);
    assert!(json["data"]["banned_until"].is_null());

    assert_eq!(whoami(&app.router, &bob).await, None);

    let response = login_bob(&app).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BANNED");
    assert_eq!(json["error"], "You are permanently banned.");
}

#[tokio::test]
async fn test_timed_ban_message_and_unban() {
    let app = common::build_test_app();
    let (admin, _, bob_id) = admin_and_bob(&app).await;

    let response = post_json(
        &app.router,
        &format!("/api/v1/admin/users/{bob_id}/ban"),
        Some(&admin),
        json!({ "duration_days": 7 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(login_bob(&app).await).await;
    assert_eq!(json["error"], "You are banned until 2026-03-08 12:00 UTC.");

    let response = post_json(
        &app.router,
        &format!("/api/v1/admin/users/{bob_id}/unban"),
        Some(&admin),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_banned"], false);

    assert_eq!(login_bob(&app).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_cannot_ban_self() {
    let app = common::build_test_app();
    let (admin, _, _) = admin_and_bob(&app).await;
    let admin_id = whoami(&app.router, &admin).await.unwrap();

    let response = post_json(
        &app.router,
        &format!("/api/v1/admin/users/{admin_id}/ban"),
        Some(&admin),
        json!({ "duration_days": 0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(whoami(&app.router, &admin).await, Some(admin_id));
}

#[tokio::test]
async fn test_set_role() {
    let app = common::build_test_app();
    let (admin, bob, bob_id) = admin_and_bob(&app).await;

    let response = send(
        &app.router,
        Method::PUT,
        &format!("/api/v1/admin/users/{bob_id}/role"),
        Some(&admin),
        Some(json!({ "is_admin": true })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_admin"], true);

    let response = get(&app.router, "/api/v1/admin/users", Some(&bob)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_user() {
    let app = common::build_test_app();
    let (admin, bob, bob_id) = admin_and_bob(&app).await;

    let uri = format!("/api/v1/admin/users/{bob_id}");
    let response = send(&app.router, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(whoami(&app.router, &bob).await, None);
    assert_eq!(app.store.user_count().await, 1);

    let response = send(&app.router, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_user() {
    let app = common::build_test_app();
    let (admin, bob, bob_id) = admin_and_bob(&app).await;
    let uri = format!("/api/v1/admin/users/{bob_id}");

    let response = send(
        &app.router,
        Method::PUT,
        &uri,
        Some(&admin),
        Some(json!({
            "email": "admin@test.io",
            "username": "bob",
            "display_name": "Bob",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["field"], "email");

    let response = send(
        &app.router,
        Method::PUT,
        &uri,
        Some(&admin),
        Some(json!({
            "email": "bob@test.io",
            "username": "bobby",
            "display_name": "Bobby",
            "new_password": "fresh-secret",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["username"], "bobby");
    assert!(json["data"].get("password_hash").is_none());

    assert_eq!(whoami(&app.router, &bob).await, None);
    assert_eq!(login_bob(&app).await.status(), StatusCode::UNAUTHORIZED);

    let response = post_json(
        &app.router,
        "/api/v1/auth/login",
        None,
        json!({ "email": "bob@test.io", "password": "fresh-secret" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}
