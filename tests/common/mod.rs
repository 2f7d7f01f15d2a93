#![allow(dead_code)]

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use lectern::modules::users::repository::{InMemoryUserRepository, UserRepository};
use lectern::router::init_router;
use lectern::state::AppState;
use lectern_config::{CorsConfig, RateLimitConfig, SessionConfig};
use lectern_core::hash_password;
use lectern_models::users::{NewUser, User};
use lectern_models::Role;
use lectern_session::{MemoryBackend, SessionBackend, SessionManager, SessionStore};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "lectern-integration-test-secret-0123456789";
pub const COOKIE_NAME: &str = "lectern_session";

pub fn session_config() -> SessionConfig {
    SessionConfig {
        cookie_name: COOKIE_NAME.to_string(),
        secret: TEST_SECRET.to_string(),
        user_key: "logged_user_id".to_string(),
        ttl: Duration::from_secs(3600),
        cookie_secure: false,
    }
}

/// Limiter loose enough that ordinary tests never trip it.
pub fn relaxed_rate_limit() -> RateLimitConfig {
    RateLimitConfig::per_client(Duration::from_millis(1), NonZeroU32::new(10_000).unwrap())
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<InMemoryUserRepository>,
}

pub fn test_app() -> TestApp {
    test_app_with(Arc::new(MemoryBackend::new()), relaxed_rate_limit())
}

/// App wired to an in-memory user repository and the given session backend.
///
/// The pool is lazy and never connected: routes that reach it fail with 500,
/// everything behind the repository works without a database.
pub fn test_app_with(backend: Arc<dyn SessionBackend>, rate_limit: RateLimitConfig) -> TestApp {
    let db = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://localhost/lectern_test")
        .expect("lazy pool");

    let users = Arc::new(InMemoryUserRepository::new());
    let store = SessionStore::new(backend, &session_config(), "lectern-test");
    let sessions = SessionManager::new(store, "logged_user_id");

    let state = AppState::new(
        db,
        users.clone(),
        sessions,
        &rate_limit,
        CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    );

    TestApp {
        router: init_router(state.clone()),
        state,
        users,
    }
}

pub async fn seed_user(
    users: &dyn UserRepository,
    username: &str,
    password: &str,
    roles: &[Role],
) -> User {
    users
        .create(
            NewUser {
                name: "Test".to_string(),
                surname: "User".to_string(),
                username: username.to_string(),
                password_hash: hash_password(password).unwrap(),
            },
            roles,
        )
        .await
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

/// `name=value` pair of the session cookie set by the response, if any.
///
/// A removal cookie (empty value) counts as no cookie.
pub fn session_cookie<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .find(|pair| {
            pair.split_once('=')
                .is_some_and(|(name, value)| name == COOKIE_NAME && !value.is_empty())
        })
        .map(str::to_string)
}

pub fn set_cookie_header<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Logs in and returns the session cookie pair.
pub async fn login(router: &Router, username: &str, password: &str) -> String {
    let response = send(
        router,
        json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "username": username, "password": password }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), 200, "login as {} failed", username);
    session_cookie(&response).expect("login sets the session cookie")
}
