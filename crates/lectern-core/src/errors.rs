//! HTTP-facing application error.
//!
//! Every handler and middleware returns [`AppError`] on failure. The error
//! carries the status code to respond with and an [`anyhow::Error`] whose
//! display text becomes the `{"error": "..."}` body. Server errors are logged
//! in full; their body carries only the top-level message, never the cause
//! chain.

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

macro_rules! status_constructors {
    ($($(#[$meta:meta])* $name:ident => $status:expr;)+) => {
        $(
            $(#[$meta])*
            pub fn $name<E>(err: E) -> Self
            where
                E: Into<Error>,
            {
                Self::new($status, err)
            }
        )+
    };
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    status_constructors! {
        internal => StatusCode::INTERNAL_SERVER_ERROR;
        /// Query failures. Responds 500 like [`AppError::internal`].
        database => StatusCode::INTERNAL_SERVER_ERROR;
        bad_request => StatusCode::BAD_REQUEST;
        unauthorized => StatusCode::UNAUTHORIZED;
        forbidden => StatusCode::FORBIDDEN;
        not_found => StatusCode::NOT_FOUND;
        conflict => StatusCode::CONFLICT;
        unprocessable => StatusCode::UNPROCESSABLE_ENTITY;
        too_many_requests => StatusCode::TOO_MANY_REQUESTS;
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status.as_u16(), error = ?self.error, "Request failed");
        }

        // `to_string` on anyhow prints the outermost context only.
        let body = Json(json!({ "error": self.error.to_string() }));

        (self.status, body).into_response()
    }
}

/// `?` on any error type yields a 500.
impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};
    use http_body_util::BodyExt;

    #[test]
    fn test_constructors_set_status() {
        let cases = [
            (AppError::unauthorized(anyhow!("x")), StatusCode::UNAUTHORIZED),
            (AppError::forbidden(anyhow!("x")), StatusCode::FORBIDDEN),
            (AppError::conflict(anyhow!("x")), StatusCode::CONFLICT),
            (AppError::unprocessable(anyhow!("x")), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::too_many_requests(anyhow!("x")), StatusCode::TOO_MANY_REQUESTS),
            (AppError::database(anyhow!("x")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status, status);
        }
    }

    #[test]
    fn test_from_any_error_is_internal() {
        let err: AppError = std::io::Error::other("disk on fire").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_body_carries_outer_context_only() {
        let source: Result<(), _> = Err(anyhow!("connection reset by peer"));
        let err = AppError::database(source.context("Failed to fetch courses").unwrap_err());

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Failed to fetch courses");
    }
}
