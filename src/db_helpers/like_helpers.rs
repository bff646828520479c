use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::Like};

const LIKE_COLUMNS: &str = "id, created_at, post_id, owner_id";

/// Inserts the like unless `(post_id, owner_id)` already exists, in one
/// statement. `None` means the post was already liked.
pub async fn like_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
    owner_id: i64,
) -> Result<Option<Like>, RequestError> {
    let query = format!(
        r#"
        INSERT INTO likes (created_at, post_id, owner_id)
        VALUES (?, ?, ?)
        ON CONFLICT (post_id, owner_id) DO NOTHING
        RETURNING {}
        "#,
        LIKE_COLUMNS
    );
    let like = sqlx::query_as::<Sqlite, Like>(&query)
        .bind(Utc::now())
        .bind(post_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;
    Ok(like)
}

pub async fn list_likes_for_post(pool: &SqlitePool, post_id: i64) -> Result<Vec<Like>, RequestError> {
    let query = format!(
        "SELECT {} FROM likes WHERE post_id = ? ORDER BY created_at DESC, id DESC",
        LIKE_COLUMNS
    );
    let likes = sqlx::query_as::<Sqlite, Like>(&query)
        .bind(post_id)
        .fetch_all(pool)
        .await?;
    Ok(likes)
}

pub async fn delete_like_in_db(
    pool: &SqlitePool,
    post_id: i64,
    owner_id: i64,
) -> Result<(), RequestError> {
    let result = sqlx::query("DELETE FROM likes WHERE post_id = ? AND owner_id = ?")
        .bind(post_id)
        .bind(owner_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    Ok(())
}
