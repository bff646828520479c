use std::sync::Arc;

use axum::{extract::Path, http::StatusCode, Extension};
use sqlx::SqlitePool;

use crate::{
    authentication::AuthUser,
    data_formats::LikeResponse,
    db_helpers::{delete_like_in_db, get_post_by_id, like_post_in_db},
    errors::RequestError,
};

use super::{comment_handlers::POST_MISSING, created, JsonResult};

// ----------------- Like Handlers -----------------
pub async fn like_post(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id: user_id }: AuthUser,
    Path(post_id): Path<i64>,
) -> JsonResult<LikeResponse> {
    if get_post_by_id(&pool, post_id).await?.is_none() {
        return Err(RequestError::RunTimeError(POST_MISSING));
    }

    let like = like_post_in_db(&pool, post_id, user_id)
        .await
        .map_err(|e| {
            if e.is_constraint_violation("FOREIGN KEY") {
                RequestError::RunTimeError(POST_MISSING)
            } else {
                e
            }
        })?
        .ok_or(RequestError::RunTimeError("You have already liked this post"))?;

    tracing::debug!(post_id, user_id, "liked post");
    created(like.into())
}

pub async fn unlike_post(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id: user_id }: AuthUser,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    delete_like_in_db(&pool, post_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
