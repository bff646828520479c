use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension,
};
use sqlx::SqlitePool;

use crate::{
    authentication::{hash_password_argon2, AuthUser},
    data_formats::{
        RegisterRequest, SimpleUserResponse, UpdateAvatarRequest, UpdateUserRequest,
        UserResponse, UserSearchParams,
    },
    db_helpers::{
        delete_user_in_db, email_taken, get_user_by_id, insert_user, load_user_profile,
        search_users_in_db, update_avatar_in_db, update_user_in_db, username_taken,
    },
    errors::{FieldErrors, RequestError},
    extractors::Json,
};

use super::{created, internal, ok, JsonResult};

const USERNAME_EXISTS: &str = "A user with that username already exists.";
const EMAIL_EXISTS: &str = "user with this email already exists.";
const USERNAME_TAKEN: &str = "Username is taken";
const EMAIL_TAKEN: &str = "This email is already in use";

// ----------------- User Handlers -----------------
pub async fn register_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Json(mut user): Json<RegisterRequest>,
) -> JsonResult<UserResponse> {
    user.validate()?;

    let mut errors = FieldErrors::new();
    if username_taken(&pool, &user.username, None).await? {
        errors.add("username", USERNAME_EXISTS);
    }
    if email_taken(&pool, &user.email, None).await? {
        errors.add("email", EMAIL_EXISTS);
    }
    errors.into_result()?;

    user.password = hash_password_argon2(user.password)
        .await
        .map_err(internal("Could not hash password"))?;

    // A concurrent registration can still hit the unique constraints.
    let user = insert_user(&pool, &user)
        .await
        .map_err(|e| taken_field_error(e, USERNAME_EXISTS, EMAIL_EXISTS))?;
    tracing::info!(user_id = user.id, username = %user.username, "registered user");

    created(load_user_profile(&pool, user).await?)
}

pub async fn get_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    _: AuthUser,
    Path(id): Path<i64>,
) -> JsonResult<UserResponse> {
    let user = get_user_by_id(&pool, id)
        .await?
        .ok_or(RequestError::NotFound)?;
    ok(load_user_profile(&pool, user).await?)
}

pub async fn list_users(
    Extension(pool): Extension<Arc<SqlitePool>>,
    _: AuthUser,
    Query(params): Query<UserSearchParams>,
) -> JsonResult<Vec<SimpleUserResponse>> {
    let username = params.username.unwrap_or_default();
    let users = search_users_in_db(&pool, &username).await?;
    ok(users.into_iter().map(SimpleUserResponse::from).collect())
}

/// Only the caller's own record is reachable; other ids are not found.
pub async fn update_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id: user_id }: AuthUser,
    Path(id): Path<i64>,
    Json(update): Json<UpdateUserRequest>,
) -> JsonResult<SimpleUserResponse> {
    if id != user_id {
        return Err(RequestError::NotFound);
    }
    update.validate()?;

    let mut errors = FieldErrors::new();
    if let Some(username) = &update.username {
        if username_taken(&pool, username, Some(user_id)).await? {
            errors.add("username", USERNAME_TAKEN);
        }
    }
    if let Some(email) = &update.email {
        if email_taken(&pool, email, Some(user_id)).await? {
            errors.add("email", EMAIL_TAKEN);
        }
    }
    errors.into_result()?;

    // Another request may claim the name between the check and the update.
    let user = update_user_in_db(&pool, user_id, update)
        .await
        .map_err(|e| taken_field_error(e, USERNAME_TAKEN, EMAIL_TAKEN))?;
    tracing::debug!(user_id, "updated profile");
    ok(user.into())
}

pub async fn update_avatar(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id: user_id }: AuthUser,
    Path(id): Path<i64>,
    Json(UpdateAvatarRequest { avatar }): Json<UpdateAvatarRequest>,
) -> JsonResult<SimpleUserResponse> {
    if id != user_id {
        return Err(RequestError::NotFound);
    }
    let user = match avatar {
        Some(avatar) => update_avatar_in_db(&pool, user_id, &avatar).await?,
        None => get_user_by_id(&pool, user_id)
            .await?
            .ok_or(RequestError::NotFound)?,
    };
    ok(user.into())
}

pub async fn delete_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id: user_id }: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    if id != user_id {
        return Err(RequestError::NotFound);
    }
    delete_user_in_db(&pool, user_id).await?;
    tracing::info!(user_id, "deleted user");
    Ok(StatusCode::NO_CONTENT)
}

/// Maps a unique violation on username or email to a field error.
fn taken_field_error(
    error: RequestError,
    username_message: &'static str,
    email_message: &'static str,
) -> RequestError {
    if error.is_constraint_violation("users.username") {
        RequestError::Validation(FieldErrors::single("username", username_message))
    } else if error.is_constraint_violation("users.email") {
        RequestError::Validation(FieldErrors::single("email", email_message))
    } else {
        error
    }
}
