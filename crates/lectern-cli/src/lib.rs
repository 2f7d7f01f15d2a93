//! # Lectern CLI
//!
//! Account administration that has to happen outside the HTTP API, most
//! importantly bootstrapping the first `ADMIN`.
//!
//! ## Usage
//!
//! ```ignore
//! use lectern_cli::admin::{create_admin, grant_role};
//! use lectern_models::Role;
//!
//! create_admin(&pool, "Ada", "Lovelace", "ada", "correct horse battery").await?;
//! grant_role(&pool, "grace", Role::Teacher).await?;
//! ```

pub mod admin;
