use std::sync::Arc;

use axum::{extract::Path, http::StatusCode, Extension};
use sqlx::SqlitePool;

use crate::{
    authentication::{AuthUser, MaybeUser},
    config::{Config, FeedFallback},
    data_formats::{CreatePostRequest, PostResponse, UpdatePostRequest},
    db_helpers::{
        delete_post_in_db, expand_posts, follows_anyone, get_post_by_id, insert_post,
        list_all_posts, list_feed_posts, list_posts_by_owner, update_post_in_db, UserLookup,
    },
    errors::RequestError,
    extractors::Json,
    models::Post,
};

use super::{created, ok, JsonResult};

async fn expand_post(pool: &SqlitePool, post: Post) -> Result<PostResponse, RequestError> {
    let mut users = UserLookup::new(pool);
    expand_posts(pool, &mut users, vec![post])
        .await?
        .pop()
        .ok_or(RequestError::ServerError)
}

async fn expand_all(pool: &SqlitePool, posts: Vec<Post>) -> Result<Vec<PostResponse>, RequestError> {
    let mut users = UserLookup::new(pool);
    expand_posts(pool, &mut users, posts).await
}

/// Loads a post the caller is allowed to modify.
async fn get_owned_post(pool: &SqlitePool, id: i64, user_id: i64) -> Result<Post, RequestError> {
    let post = get_post_by_id(pool, id).await?.ok_or(RequestError::NotFound)?;
    if post.owner_id != user_id {
        return Err(RequestError::Forbidden);
    }
    Ok(post)
}

// ----------------- Post Handlers -----------------

/// The caller's own posts. Anonymous callers own nothing.
pub async fn list_posts(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
) -> JsonResult<Vec<PostResponse>> {
    let posts = match maybe_user.get_id() {
        Some(id) => list_posts_by_owner(&pool, id).await?,
        None => vec![],
    };
    ok(expand_all(&pool, posts).await?)
}

pub async fn create_post(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id: user_id }: AuthUser,
    Json(request): Json<CreatePostRequest>,
) -> JsonResult<PostResponse> {
    request.validate()?;
    let post = insert_post(&pool, user_id, request).await?;
    tracing::debug!(post_id = post.id, user_id, "created post");
    created(expand_post(&pool, post).await?)
}

pub async fn get_post(
    Extension(pool): Extension<Arc<SqlitePool>>,
    _: AuthUser,
    Path(id): Path<i64>,
) -> JsonResult<PostResponse> {
    let post = get_post_by_id(&pool, id).await?.ok_or(RequestError::NotFound)?;
    ok(expand_post(&pool, post).await?)
}

pub async fn update_post(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id: user_id }: AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdatePostRequest>,
) -> JsonResult<PostResponse> {
    get_owned_post(&pool, id, user_id).await?;
    request.validate()?;
    let post = update_post_in_db(&pool, id, request).await?;
    ok(expand_post(&pool, post).await?)
}

pub async fn delete_post(
    Extension(pool): Extension<Arc<SqlitePool>>,
    AuthUser { id: user_id }: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    get_owned_post(&pool, id, user_id).await?;
    delete_post_in_db(&pool, id).await?;
    tracing::debug!(post_id = id, user_id, "deleted post");
    Ok(StatusCode::NO_CONTENT)
}

// ----------------- Feed Handlers -----------------
pub async fn feed(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Extension(config): Extension<Arc<Config>>,
    AuthUser { id: user_id }: AuthUser,
) -> JsonResult<Vec<PostResponse>> {
    let posts = if follows_anyone(&pool, user_id).await? {
        list_feed_posts(&pool, user_id).await?
    } else {
        match config.empty_feed {
            FeedFallback::AllPosts => list_all_posts(&pool).await?,
            FeedFallback::Empty => vec![],
        }
    };
    ok(expand_all(&pool, posts).await?)
}
