use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};

use crate::{
    data_formats::{CommentRequest, CommentResponse},
    errors::RequestError,
    models::Comment,
};

use super::UserLookup;

const COMMENT_COLUMNS: &str = "id, message, created_at, post_id, owner_id";

/// The caller checks that the post exists; a post deleted in between
/// surfaces as a foreign key violation.
pub async fn insert_comment(
    pool: &SqlitePool,
    post_id: i64,
    owner_id: i64,
    CommentRequest { message }: CommentRequest,
) -> Result<Comment, RequestError> {
    let query = format!(
        r#"
        INSERT INTO comments (message, created_at, post_id, owner_id)
        VALUES (?, ?, ?, ?)
        RETURNING {}
        "#,
        COMMENT_COLUMNS
    );
    let comment = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(message)
        .bind(Utc::now())
        .bind(post_id)
        .bind(owner_id)
        .fetch_one(pool)
        .await?;
    Ok(comment)
}

pub async fn list_comments_for_post(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<Comment>, RequestError> {
    let query = format!(
        "SELECT {} FROM comments WHERE post_id = ? ORDER BY created_at DESC, id DESC",
        COMMENT_COLUMNS
    );
    let comments = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(post_id)
        .fetch_all(pool)
        .await?;
    Ok(comments)
}

pub async fn expand_comments(
    users: &mut UserLookup<'_>,
    comments: Vec<Comment>,
    now: DateTime<Utc>,
) -> Result<Vec<CommentResponse>, RequestError> {
    let mut result = Vec::with_capacity(comments.len());
    for comment in comments {
        let owner = users.get(comment.owner_id).await?;
        result.push(CommentResponse::new(comment, owner, now));
    }
    Ok(result)
}
