use axum::http::StatusCode;
use thiserror::Error;

/// Failures of the session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backing store could not be reached or did not answer in time.
    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store answered but there is no identity to be had: no cookie,
    /// no record, or a record without a user id.
    #[error("No identity in session")]
    SessionUnresolvable,

    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    /// Status to answer with when this error ends a request.
    pub fn status(&self) -> StatusCode {
        match self {
            SessionError::SessionUnresolvable => StatusCode::UNAUTHORIZED,
            SessionError::StoreUnavailable(_) | SessionError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            SessionError::StoreUnavailable("down".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            SessionError::SessionUnresolvable.status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
