use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub message: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub owner_id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub post_id: i64,
    pub owner_id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Like {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub post_id: i64,
    pub owner_id: i64,
}

/// `following_id` follows `followed_id`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Follow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub followed_id: i64,
    pub following_id: i64,
}
