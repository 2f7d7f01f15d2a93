mod common;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use common::{body_json, empty_request, json_request, login, relaxed_rate_limit, send, session_config};
use lectern::modules::users::repository::{PgUserRepository, UserRepository};
use lectern::router::init_router;
use lectern::state::AppState;
use lectern_config::CorsConfig;
use lectern_core::hash_password;
use lectern_models::Role;
use lectern_models::users::NewUser;
use lectern_session::{MemoryBackend, SessionManager, SessionStore};
use serde_json::json;
use sqlx::PgPool;

async fn setup(pool: PgPool) -> (Router, Arc<PgUserRepository>) {
    let users = Arc::new(PgUserRepository::new(pool.clone()));
    let store = SessionStore::new(Arc::new(MemoryBackend::new()), &session_config(), "lectern-test");
    let state = AppState::new(
        pool,
        users.clone(),
        SessionManager::new(store, "logged_user_id"),
        &relaxed_rate_limit(),
        CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    );
    (init_router(state), users)
}

async fn seed(users: &dyn UserRepository, username: &str, roles: &[Role]) {
    users
        .create(
            NewUser {
                name: "Test".into(),
                surname: "User".into(),
                username: username.into(),
                password_hash: hash_password("password123").unwrap(),
            },
            roles,
        )
        .await
        .unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres"]
async fn test_teacher_course_and_lesson_lifecycle(pool: PgPool) {
    let (app, users) = setup(pool).await;
    seed(users.as_ref(), "teacher", &[Role::Teacher, Role::User]).await;
    seed(users.as_ref(), "student", &[Role::User]).await;
    let teacher = login(&app, "teacher", "password123").await;
    let student = login(&app, "student", "password123").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/courses",
            json!({ "name": "Rust 101", "description": "Ownership", "estimation": 3 }),
            Some(&teacher),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let course = body_json(response).await;
    let course_id = course["id"].as_i64().unwrap();
    assert_eq!(course["lesson_count"], 0);

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/lessons",
            json!({
                "course_id": course_id,
                "name": "Borrowing",
                "video_url": "https://videos.example.com/borrowing"
            }),
            Some(&teacher),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let lesson_id = body_json(response).await["id"].as_i64().unwrap();

    // Any authenticated user can read.
    let response = send(
        &app,
        empty_request("GET", &format!("/api/courses/{}", course_id), Some(&student)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["lesson_count"], 1);

    let response = send(
        &app,
        empty_request("GET", &format!("/api/lessons?course_id={}", course_id), Some(&student)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(1));

    let response = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/lessons/{}", lesson_id),
            json!({ "name": "Borrowing rules" }),
            Some(&teacher),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "Borrowing rules");

    let response = send(
        &app,
        empty_request("DELETE", &format!("/api/courses/{}", course_id), Some(&teacher)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        empty_request("GET", &format!("/api/lessons/{}", lesson_id), Some(&student)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres"]
async fn test_only_owner_can_modify_course(pool: PgPool) {
    let (app, users) = setup(pool).await;
    seed(users.as_ref(), "owner", &[Role::Teacher]).await;
    seed(users.as_ref(), "other", &[Role::Teacher]).await;
    let owner = login(&app, "owner", "password123").await;
    let other = login(&app, "other", "password123").await;

    let response = send(
        &app,
        json_request("POST", "/api/courses", json!({ "name": "Mine" }), Some(&owner)),
    )
    .await;
    let course_id = body_json(response).await["id"].as_i64().unwrap();

    let response = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/courses/{}", course_id),
            json!({ "name": "Theirs" }),
            Some(&other),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/lessons",
            json!({ "course_id": course_id, "name": "Sneaky" }),
            Some(&other),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, empty_request("GET", "/api/courses/999999", Some(&other))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres"]
async fn test_non_owner_writes_leave_rows_untouched(pool: PgPool) {
    let (app, users) = setup(pool.clone()).await;
    seed(users.as_ref(), "owner", &[Role::Teacher]).await;
    seed(users.as_ref(), "other", &[Role::Teacher]).await;
    let owner = login(&app, "owner", "password123").await;
    let other = login(&app, "other", "password123").await;

    let response = send(
        &app,
        json_request("POST", "/api/courses", json!({ "name": "Mine" }), Some(&owner)),
    )
    .await;
    let course_id = body_json(response).await["id"].as_i64().unwrap();
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/lessons",
            json!({ "course_id": course_id, "name": "Intro" }),
            Some(&owner),
        ),
    )
    .await;
    let lesson_id = body_json(response).await["id"].as_i64().unwrap();

    let response = send(
        &app,
        empty_request("DELETE", &format!("/api/courses/{}", course_id), Some(&other)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/lessons/{}", lesson_id),
            json!({ "name": "Hijacked" }),
            Some(&other),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        empty_request("DELETE", &format!("/api/lessons/{}", lesson_id), Some(&other)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let (name,): (String,) = sqlx::query_as("SELECT name FROM lessons WHERE id = $1")
        .bind(lesson_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(name, "Intro");
    let (courses,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM courses WHERE id = $1")
        .bind(course_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(courses, 1);
}
