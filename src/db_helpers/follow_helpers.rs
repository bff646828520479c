use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};

use crate::{data_formats::FollowResponse, errors::RequestError, models::Follow};

use super::UserLookup;

const FOLLOW_COLUMNS: &str = "id, created_at, followed_id, following_id";

/// Records that `following_id` follows `followed_id`. `None` when the edge
/// already exists.
pub async fn follow_user_in_db(
    pool: &SqlitePool,
    following_id: i64,
    followed_id: i64,
) -> Result<Option<Follow>, RequestError> {
    let query = format!(
        r#"
        INSERT INTO follows (created_at, followed_id, following_id)
        VALUES (?, ?, ?)
        ON CONFLICT (followed_id, following_id) DO NOTHING
        RETURNING {}
        "#,
        FOLLOW_COLUMNS
    );
    let follow = sqlx::query_as::<Sqlite, Follow>(&query)
        .bind(Utc::now())
        .bind(followed_id)
        .bind(following_id)
        .fetch_optional(pool)
        .await?;
    Ok(follow)
}

pub async fn unfollow_user_in_db(
    pool: &SqlitePool,
    following_id: i64,
    followed_id: i64,
) -> Result<(), RequestError> {
    let result = sqlx::query("DELETE FROM follows WHERE following_id = ? AND followed_id = ?")
        .bind(following_id)
        .bind(followed_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    Ok(())
}

/// Whether `user_id` follows at least one user.
pub async fn follows_anyone(pool: &SqlitePool, user_id: i64) -> Result<bool, RequestError> {
    let (any,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM follows WHERE following_id = ?)")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(any)
}

/// Edges where `user_id` is the follower.
pub async fn list_followings(pool: &SqlitePool, user_id: i64) -> Result<Vec<Follow>, RequestError> {
    let query = format!(
        "SELECT {} FROM follows WHERE following_id = ? ORDER BY created_at DESC, id DESC",
        FOLLOW_COLUMNS
    );
    let follows = sqlx::query_as::<Sqlite, Follow>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(follows)
}

/// Edges where `user_id` is the one being followed.
pub async fn list_followers(pool: &SqlitePool, user_id: i64) -> Result<Vec<Follow>, RequestError> {
    let query = format!(
        "SELECT {} FROM follows WHERE followed_id = ? ORDER BY created_at DESC, id DESC",
        FOLLOW_COLUMNS
    );
    let follows = sqlx::query_as::<Sqlite, Follow>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(follows)
}

pub async fn expand_follows(
    users: &mut UserLookup<'_>,
    follows: Vec<Follow>,
) -> Result<Vec<FollowResponse>, RequestError> {
    let mut result = Vec::with_capacity(follows.len());
    for follow in follows {
        let followed = users.get(follow.followed_id).await?;
        let following = users.get(follow.following_id).await?;
        result.push(FollowResponse::new(follow, followed, following));
    }
    Ok(result)
}
