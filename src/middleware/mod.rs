//! Request gates.
//!
//! Order on a protected route, outermost first:
//!
//! 1. [`rate_limit`]: admission, 429 when out of tokens
//! 2. [`auth`]: session lookup, 401 without a live session, attaches the
//!    [`Principal`](auth::Principal)
//! 3. [`role`]: exact role membership, 403 when missing
//!
//! Handlers take `Principal` as an extractor:
//!
//! ```ignore
//! async fn who_am_i(principal: Principal) -> Json<UserWithRoles> {
//!     Json(principal.to_user_with_roles())
//! }
//! ```

pub mod auth;
pub mod rate_limit;
pub mod role;
