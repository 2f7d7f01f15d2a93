//! # Lectern API
//!
//! A REST API built with Rust, Axum, and PostgreSQL for managing courses and
//! lessons, with authentication carried by a signed session cookie.
//!
//! ## Overview
//!
//! - **Authentication**: username/password login; the server keeps the
//!   session record in Redis and hands the client an opaque, signed cookie
//! - **Role gates**: `ADMIN`, `TEACHER` and `USER`, checked by exact name
//! - **Courses and lessons**: readable by any authenticated user, writable by
//!   the owning teacher
//! - **Admission control**: a token-bucket limiter in front of every `/api`
//!   route
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── middleware/       # Authentication gate, role gates, rate limiter
//! ├── modules/          # Feature modules
//! │   ├── auth/        # Register, login, logout, who-am-i
//! │   ├── users/       # User repository and role administration
//! │   ├── courses/     # Course CRUD
//! │   └── lessons/     # Lesson CRUD
//! ├── docs.rs           # OpenAPI document
//! ├── logging.rs        # Request logging and subscriber setup
//! ├── metrics.rs        # Prometheus metrics
//! ├── router.rs         # Route tree
//! └── state.rs          # Shared application state
//! ```
//!
//! Each feature module follows the same layout:
//!
//! - `controller.rs`: HTTP handlers
//! - `service.rs`: business logic
//! - `model.rs`: DTOs and database structs
//! - `router.rs`: Axum router configuration
//!
//! ## Workspace Crates
//!
//! - [`lectern_core`]: error type and password hashing
//! - [`lectern_config`]: environment-driven configuration
//! - [`lectern_db`]: pool setup and migrations
//! - [`lectern_models`]: shared domain types
//! - [`lectern_session`]: session store and session manager
//!
//! ## Session Flow
//!
//! ```text
//! POST /api/auth/login
//!     → credentials checked against the users table
//!     → previous session (if any) destroyed
//!     → new record {logged_user_id: <id>} written to the store
//!     → Set-Cookie: lectern_session=<signed id>; HttpOnly; SameSite=Lax
//!
//! GET /api/courses  (Cookie: lectern_session=...)
//!     → rate limiter
//!     → authentication gate resolves the user and its roles
//!     → handler
//! ```

pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod validator;

// Re-export workspace crates for convenience
pub use lectern_config;
pub use lectern_core;
pub use lectern_db;
pub use lectern_models;
pub use lectern_session;
