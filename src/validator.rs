use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use lectern_core::AppError;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

/// Maps a JSON rejection to a 400 with a message a client can act on.
fn rejection_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::bad_request(anyhow!("Missing 'Content-Type: application/json' header"))
        }
        JsonRejection::JsonDataError(err) => {
            let text = err.body_text();
            match text
                .split("missing field `")
                .nth(1)
                .and_then(|rest| rest.split('`').next())
            {
                Some(field) => AppError::bad_request(anyhow!("{} is required", field)),
                None => AppError::bad_request(anyhow!("Invalid field type in request")),
            }
        }
        _ => AppError::bad_request(anyhow!("Invalid request body")),
    }
}

/// JSON body extractor that also runs `validator` rules.
///
/// Malformed JSON and missing fields are 400; rule violations are 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_error)?;

        value
            .validate()
            .map_err(|errors| AppError::unprocessable(anyhow!("{}", format_errors(&errors))))?;

        Ok(ValidatedJson(value))
    }
}
