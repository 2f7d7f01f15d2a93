mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum_extra::extract::cookie::Cookie;
use common::{
    body_json, empty_request, json_request, login, relaxed_rate_limit, seed_user, send,
    session_cookie, set_cookie_header, test_app, test_app_with,
};
use lectern::modules::users::repository::UserRepository;
use lectern_models::Role;
use lectern_session::{MemoryBackend, SessionBackend, SessionError, UnavailableBackend};
use serde_json::json;

#[tokio::test]
async fn test_protected_routes_reject_anonymous() {
    let app = test_app();

    for (method, uri) in [
        ("GET", "/api/auth/who-am-i"),
        ("POST", "/api/auth/logout"),
        ("GET", "/api/users"),
        ("GET", "/api/courses"),
        ("GET", "/api/courses/1"),
        ("GET", "/api/lessons"),
    ] {
        let response = send(&app.router, empty_request(method, uri, None)).await;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{} {} should require a session",
            method,
            uri
        );
    }
}

#[tokio::test]
async fn test_forged_cookie_is_anonymous() {
    let app = test_app();
    let forged = format!("lectern_session={}", "a".repeat(64));

    let response = send(&app.router, empty_request("GET", "/api/auth/who-am-i", Some(&forged))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let app = test_app();
    seed_user(app.users.as_ref(), "alice", "s3cret-pass", &[Role::User]).await;
    seed_user(app.users.as_ref(), "root", "r00t-pass!", &[Role::Admin, Role::User]).await;

    let user_cookie = login(&app.router, "alice", "s3cret-pass").await;
    let response = send(&app.router, empty_request("GET", "/api/users", Some(&user_cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["error"],
        "Access denied. Required role: ADMIN"
    );

    let admin_cookie = login(&app.router, "root", "r00t-pass!").await;
    let response = send(&app.router, empty_request("GET", "/api/users", Some(&admin_cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_admin_does_not_imply_teacher() {
    let app = test_app();
    seed_user(app.users.as_ref(), "root", "r00t-pass!", &[Role::Admin]).await;
    let cookie = login(&app.router, "root", "r00t-pass!").await;

    let response = send(
        &app.router,
        json_request("POST", "/api/courses", json!({ "name": "Rust 101" }), Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_cannot_write_courses_or_lessons() {
    let app = test_app();
    seed_user(app.users.as_ref(), "alice", "s3cret-pass", &[Role::User]).await;
    let cookie = login(&app.router, "alice", "s3cret-pass").await;

    let response = send(
        &app.router,
        json_request("POST", "/api/courses", json!({ "name": "Rust 101" }), Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app.router, empty_request("DELETE", "/api/lessons/1", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_change_applies_to_next_request() {
    let app = test_app();
    let alice = seed_user(app.users.as_ref(), "alice", "s3cret-pass", &[Role::User]).await;
    let cookie = login(&app.router, "alice", "s3cret-pass").await;

    let response = send(&app.router, empty_request("GET", "/api/users", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    app.users
        .set_roles(alice.id, &[Role::Admin, Role::User])
        .await
        .unwrap();

    let response = send(&app.router, empty_request("GET", "/api/users", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_sets_roles() {
    let app = test_app();
    let alice = seed_user(app.users.as_ref(), "alice", "s3cret-pass", &[Role::User]).await;
    seed_user(app.users.as_ref(), "root", "r00t-pass!", &[Role::Admin]).await;
    let cookie = login(&app.router, "root", "r00t-pass!").await;

    let response = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/users/{}/roles", alice.id),
            json!({ "roles": ["TEACHER", "USER", "TEACHER"] }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["roles"], json!(["TEACHER", "USER"]));

    let response = send(
        &app.router,
        json_request(
            "PUT",
            "/api/users/999/roles",
            json!({ "roles": ["USER"] }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_user_session_is_rejected() {
    let app = test_app();
    let alice = seed_user(app.users.as_ref(), "alice", "s3cret-pass", &[Role::User]).await;
    let cookie = login(&app.router, "alice", "s3cret-pass").await;

    assert!(app.users.delete(alice.id).await.unwrap());

    let response = send(&app.router, empty_request("GET", "/api/auth/who-am-i", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_store_outage_fails_login_and_reads_as_anonymous() {
    let app = test_app_with(Arc::new(UnavailableBackend), relaxed_rate_limit());
    seed_user(app.users.as_ref(), "alice", "s3cret-pass", &[Role::User]).await;

    let response = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/login",
            json!({ "username": "alice", "password": "s3cret-pass" }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(session_cookie(&response).is_none());

    // A correctly signed cookie still resolves to nobody while the store is down.
    let jar = app
        .state
        .sessions
        .jar(&HeaderMap::new())
        .add(Cookie::new("lectern_session", "b".repeat(64)));
    let signed = session_cookie(&(jar, ()).into_response()).expect("signed cookie");

    let response = send(&app.router, empty_request("GET", "/api/auth/who-am-i", Some(&signed))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Reads and writes normally but cannot delete.
struct UndeletableBackend(MemoryBackend);

#[async_trait]
impl SessionBackend for UndeletableBackend {
    async fn load(&self, key: &str) -> Result<Option<String>, SessionError> {
        self.0.load(key).await
    }

    async fn store(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError> {
        self.0.store(key, value, ttl).await
    }

    async fn store_new(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, SessionError> {
        self.0.store_new(key, value, ttl).await
    }

    async fn remove(&self, _key: &str) -> Result<(), SessionError> {
        Err(SessionError::StoreUnavailable("connection reset".into()))
    }
}

#[tokio::test]
async fn test_logout_fails_when_store_cannot_destroy() {
    let app = test_app_with(
        Arc::new(UndeletableBackend(MemoryBackend::new())),
        relaxed_rate_limit(),
    );
    seed_user(app.users.as_ref(), "alice", "s3cret-pass", &[Role::User]).await;
    let cookie = login(&app.router, "alice", "s3cret-pass").await;

    let response = send(&app.router, empty_request("POST", "/api/auth/logout", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(set_cookie_header(&response).is_none());

    // The session survives a failed destroy.
    let who = send(&app.router, empty_request("GET", "/api/auth/who-am-i", Some(&cookie))).await;
    assert_eq!(who.status(), StatusCode::OK);
}
