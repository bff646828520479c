use std::collections::BTreeMap;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

use crate::JsonResponse;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Not found.")]
    NotFound,
    #[error("{0}")]
    NotAuthorized(&'static str),
    #[error("You do not have permission to perform this action.")]
    Forbidden,
    #[error("{0}")]
    RunTimeError(&'static str),
    #[error("Invalid input")]
    Validation(FieldErrors),
    #[error("Unsupported media type in request.")]
    UnsupportedMediaType,
    #[error("Internal Server Error")]
    ServerError,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Field name to the messages raised against it.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), RequestError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(RequestError::Validation(self))
        }
    }
}

#[derive(Serialize)]
pub struct RequestErrorJson {
    detail: String,
}

impl RequestErrorJson {
    pub fn new(error: &str) -> RequestErrorJson {
        RequestErrorJson {
            detail: error.to_string(),
        }
    }
}

impl RequestError {
    /// Whether this is a database constraint violation mentioning `needle`,
    /// e.g. `"UNIQUE constraint failed: users.email"`.
    pub fn is_constraint_violation(&self, needle: &str) -> bool {
        match self {
            RequestError::DatabaseError(sqlx::Error::Database(e)) => e.message().contains(needle),
            _ => false,
        }
    }

    pub fn to_json_response(&self) -> JsonResponse<serde_json::Value> {
        let (status_code, json) = match self {
            RequestError::NotFound
            | RequestError::NotAuthorized(_)
            | RequestError::Forbidden
            | RequestError::RunTimeError(_)
            | RequestError::UnsupportedMediaType => {
                let status = match self {
                    RequestError::NotFound => StatusCode::NOT_FOUND,
                    RequestError::NotAuthorized(_) => StatusCode::UNAUTHORIZED,
                    RequestError::Forbidden => StatusCode::FORBIDDEN,
                    RequestError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, detail(&self.to_string()))
            }
            RequestError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                serde_json::to_value(errors).unwrap_or_default(),
            ),
            RequestError::ServerError => {
                tracing::error!("request failed with an internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, detail("Internal Server Error"))
            }
            RequestError::DatabaseError(e) => {
                tracing::error!(error = %e, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, detail("Internal Server Error"))
            }
        };
        (status_code, Json(json))
    }
}

fn detail(message: &str) -> serde_json::Value {
    serde_json::to_value(RequestErrorJson::new(message)).unwrap_or_default()
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        self.to_json_response().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_collect_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("email", "Enter a valid email address.");
        errors.add("email", "This field may not be blank.");
        errors.add("username", "This field may not be blank.");

        assert_eq!(errors.get("email").map(|m| m.len()), Some(2));
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["username"][0], "This field may not be blank.");
        assert!(errors.into_result().is_err());
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn domain_errors_render_as_detail() {
        let (status, Json(body)) =
            RequestError::RunTimeError("You have already liked this post").to_json_response();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "You have already liked this post");

        let (status, Json(body)) = RequestError::NotFound.to_json_response();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Not found.");
    }
}
