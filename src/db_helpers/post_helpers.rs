use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};

use crate::{
    data_formats::{CreatePostRequest, LikeResponse, PostResponse, UpdatePostRequest},
    errors::RequestError,
    models::Post,
};

use super::{expand_comments, list_comments_for_post, list_likes_for_post, QueryBuilder, UserLookup};

const POST_COLUMNS: &str = "id, message, image, created_at, owner_id";

pub async fn insert_post(
    pool: &SqlitePool,
    owner_id: i64,
    CreatePostRequest { message, image }: CreatePostRequest,
) -> Result<Post, RequestError> {
    let query = format!(
        r#"
        INSERT INTO posts (message, image, created_at, owner_id)
        VALUES (?, ?, ?, ?)
        RETURNING {}
        "#,
        POST_COLUMNS
    );
    let post = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(message)
        .bind(image)
        .bind(Utc::now())
        .bind(owner_id)
        .fetch_one(pool)
        .await?;
    Ok(post)
}

pub async fn get_post_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Post>, RequestError> {
    let query = format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS);
    let post = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(post)
}

pub async fn list_posts_by_owner(pool: &SqlitePool, owner_id: i64) -> Result<Vec<Post>, RequestError> {
    let query = format!(
        "SELECT {} FROM posts WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
        POST_COLUMNS
    );
    let posts = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(owner_id)
        .fetch_all(pool)
        .await?;
    Ok(posts)
}

pub async fn list_all_posts(pool: &SqlitePool) -> Result<Vec<Post>, RequestError> {
    let query = format!(
        "SELECT {} FROM posts ORDER BY created_at DESC, id DESC",
        POST_COLUMNS
    );
    let posts = sqlx::query_as::<Sqlite, Post>(&query).fetch_all(pool).await?;
    Ok(posts)
}

/// Posts owned by anyone `user_id` follows.
pub async fn list_feed_posts(pool: &SqlitePool, user_id: i64) -> Result<Vec<Post>, RequestError> {
    let query = format!(
        r#"
        SELECT {} FROM posts
        WHERE owner_id IN (SELECT followed_id FROM follows WHERE following_id = ?)
        ORDER BY created_at DESC, id DESC
        "#,
        POST_COLUMNS
    );
    let posts = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(posts)
}

pub async fn update_post_in_db(
    pool: &SqlitePool,
    id: i64,
    UpdatePostRequest { message, image }: UpdatePostRequest,
) -> Result<Post, RequestError> {
    let update = QueryBuilder::update("posts")
        .add_param("message", message)
        .add_param("image", image)
        .build(id);

    if let Some((query, params)) = update {
        let mut query = sqlx::query(&query);
        for param in params {
            query = query.bind(param);
        }
        query.execute(pool).await?;
    }

    get_post_by_id(pool, id).await?.ok_or(RequestError::NotFound)
}

pub async fn delete_post_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let result = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    Ok(())
}

/// Attaches owner, comments and likes to each post.
pub async fn expand_posts(
    pool: &SqlitePool,
    users: &mut UserLookup<'_>,
    posts: Vec<Post>,
) -> Result<Vec<PostResponse>, RequestError> {
    let now = Utc::now();
    let mut result = Vec::with_capacity(posts.len());
    for post in posts {
        let owner = users.get(post.owner_id).await?;
        let comments = list_comments_for_post(pool, post.id).await?;
        let comments = expand_comments(users, comments, now).await?;
        let likes = list_likes_for_post(pool, post.id)
            .await?
            .into_iter()
            .map(LikeResponse::from)
            .collect();
        result.push(PostResponse::new(post, owner, comments, likes, now));
    }
    Ok(result)
}
