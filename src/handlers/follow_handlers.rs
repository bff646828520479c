use std::sync::Arc;

use axum::{extract::Path, http::StatusCode, Extension};
use sqlx::SqlitePool;

use crate::{
    authentication::AuthUser,
    data_formats::{FollowRequest, FollowResponse},
    db_helpers::{follow_user_in_db, get_user_by_id, unfollow_user_in_db, UserLookup},
    errors::RequestError,
    extractors::Json,
};

use super::{created, JsonResult};

const USER_MISSING: &str = "User doesn't exist";

// ----------------- Follow Handlers -----------------
pub async fn follow_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id: user_id }: AuthUser,
    Json(FollowRequest { follow_id }): Json<FollowRequest>,
) -> JsonResult<FollowResponse> {
    let followed = get_user_by_id(&pool, follow_id)
        .await?
        .ok_or(RequestError::RunTimeError(USER_MISSING))?;

    let follow = follow_user_in_db(&pool, user_id, follow_id)
        .await
        .map_err(|e| {
            if e.is_constraint_violation("FOREIGN KEY") {
                RequestError::RunTimeError(USER_MISSING)
            } else {
                e
            }
        })?
        .ok_or(RequestError::RunTimeError("Already follows this user"))?;
    tracing::debug!(follower = user_id, followed = follow_id, "followed user");

    let mut users = UserLookup::new(&pool);
    let followed = users.remember(followed);
    let following = users.get(user_id).await?;
    created(FollowResponse::new(follow, followed, following))
}

pub async fn unfollow_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id: user_id }: AuthUser,
    Path(followed_id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    unfollow_user_in_db(&pool, user_id, followed_id).await?;
    tracing::debug!(follower = user_id, followed = followed_id, "unfollowed user");
    Ok(StatusCode::NO_CONTENT)
}
