use axum::http::{StatusCode, Uri};

use crate::{errors::RequestError, JsonResponse};

mod comment_handlers;
mod follow_handlers;
mod like_handlers;
mod password_reset_handlers;
mod post_handlers;
mod token_handlers;
mod user_handlers;

pub use comment_handlers::*;
pub use follow_handlers::*;
pub use like_handlers::*;
pub use password_reset_handlers::*;
pub use post_handlers::*;
pub use token_handlers::*;
pub use user_handlers::*;

type JsonResult<T> = Result<JsonResponse<T>, RequestError>;

fn ok<T>(body: T) -> JsonResult<T> {
    Ok((StatusCode::OK, axum::Json(body)))
}

fn created<T>(body: T) -> JsonResult<T> {
    Ok((StatusCode::CREATED, axum::Json(body)))
}

/// Logs the cause of a failure that is reported to the client as a plain 500.
fn internal(context: &'static str) -> impl FnOnce(anyhow::Error) -> RequestError {
    move |error| {
        tracing::error!(error = %error, "{}", context);
        RequestError::ServerError
    }
}

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> Result<(), (StatusCode, String)> {
    Err((
        StatusCode::NOT_FOUND,
        format!("URL {} provided was not found", uri),
    ))
}
