use std::sync::Arc;

use axum::{extract::Path, Extension};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    authentication::AuthUser,
    data_formats::{CommentRequest, CommentResponse},
    db_helpers::{
        expand_comments, get_post_by_id, insert_comment, list_comments_for_post, UserLookup,
    },
    errors::RequestError,
    extractors::Json,
};

use super::{created, ok, JsonResult};

pub(super) const POST_MISSING: &str = "Post doesn't exist";

// ----------------- Comment Handlers -----------------
pub async fn list_comments(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(post_id): Path<i64>,
) -> JsonResult<Vec<CommentResponse>> {
    let comments = list_comments_for_post(&pool, post_id).await?;
    let mut users = UserLookup::new(&pool);
    ok(expand_comments(&mut users, comments, Utc::now()).await?)
}

pub async fn create_comment(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id: user_id }: AuthUser,
    Path(post_id): Path<i64>,
    Json(request): Json<CommentRequest>,
) -> JsonResult<CommentResponse> {
    request.validate()?;
    if get_post_by_id(&pool, post_id).await?.is_none() {
        return Err(RequestError::RunTimeError(POST_MISSING));
    }

    let comment = insert_comment(&pool, post_id, user_id, request)
        .await
        .map_err(|e| {
            if e.is_constraint_violation("FOREIGN KEY") {
                RequestError::RunTimeError(POST_MISSING)
            } else {
                e
            }
        })?;

    let mut users = UserLookup::new(&pool);
    let owner = users.get(user_id).await?;
    created(CommentResponse::new(comment, owner, Utc::now()))
}
