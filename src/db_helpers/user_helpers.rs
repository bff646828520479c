use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};

use crate::{
    data_formats::{RegisterRequest, UpdateUserRequest, UserResponse},
    errors::RequestError,
    models::User,
};

use super::{
    expand_follows, expand_posts, get_user_by_id, list_followers, list_followings,
    list_posts_by_owner, QueryBuilder, UserLookup, USER_COLUMNS,
};

/// `password` must already be hashed.
pub async fn insert_user(pool: &SqlitePool, user: &RegisterRequest) -> Result<User, RequestError> {
    let query = format!(
        r#"
        INSERT INTO users (username, email, password, bio, gender, avatar, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        USER_COLUMNS
    );
    let user = sqlx::query_as::<Sqlite, User>(&query)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.bio)
        .bind(&user.gender)
        .bind(&user.avatar)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
    Ok(user)
}

/// Whether another user (not `except`) already has this username.
pub async fn username_taken(
    pool: &SqlitePool,
    username: &str,
    except: Option<i64>,
) -> Result<bool, RequestError> {
    let (taken,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? AND (? IS NULL OR id != ?))",
    )
    .bind(username)
    .bind(except)
    .bind(except)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

/// Whether another user (not `except`) already has this email.
pub async fn email_taken(
    pool: &SqlitePool,
    email: &str,
    except: Option<i64>,
) -> Result<bool, RequestError> {
    let (taken,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? AND (? IS NULL OR id != ?))",
    )
    .bind(email)
    .bind(except)
    .bind(except)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

pub async fn update_user_in_db(
    pool: &SqlitePool,
    id: i64,
    UpdateUserRequest {
        username,
        email,
        bio,
        avatar,
        gender,
    }: UpdateUserRequest,
) -> Result<User, RequestError> {
    let update = QueryBuilder::update("users")
        .add_param("username", username)
        .add_param("email", email)
        .add_param("bio", bio)
        .add_param("avatar", avatar)
        .add_param("gender", gender)
        .build(id);

    if let Some((query, params)) = update {
        let mut query = sqlx::query(&query);
        for param in params {
            query = query.bind(param);
        }
        query.execute(pool).await?;
    }

    get_user_by_id(pool, id).await?.ok_or(RequestError::NotFound)
}

pub async fn update_avatar_in_db(
    pool: &SqlitePool,
    id: i64,
    avatar: &str,
) -> Result<User, RequestError> {
    let query = format!("UPDATE users SET avatar = ? WHERE id = ? RETURNING {}", USER_COLUMNS);
    sqlx::query_as::<Sqlite, User>(&query)
        .bind(avatar)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(RequestError::NotFound)
}

pub async fn set_password_in_db(
    pool: &SqlitePool,
    id: i64,
    password_hash: &str,
) -> Result<(), RequestError> {
    let result = sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    Ok(())
}

/// Case-insensitive substring match on the username.
pub async fn search_users_in_db(pool: &SqlitePool, username: &str) -> Result<Vec<User>, RequestError> {
    let pattern = format!("%{}%", escape_like(username));
    let query = format!(
        r#"SELECT {} FROM users WHERE username LIKE ? ESCAPE '\' ORDER BY id"#,
        USER_COLUMNS
    );
    let users = sqlx::query_as::<Sqlite, User>(&query)
        .bind(pattern)
        .fetch_all(pool)
        .await?;
    Ok(users)
}

/// Posts, comments, likes and follow edges go with the user.
pub async fn delete_user_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    Ok(())
}

pub async fn load_user_profile(pool: &SqlitePool, user: User) -> Result<UserResponse, RequestError> {
    let mut users = UserLookup::new(pool);
    users.remember(user.clone());

    let posts = list_posts_by_owner(pool, user.id).await?;
    let posts = expand_posts(pool, &mut users, posts).await?;
    let followings = list_followings(pool, user.id).await?;
    let followings = expand_follows(&mut users, followings).await?;
    let followers = list_followers(pool, user.id).await?;
    let followers = expand_follows(&mut users, followers).await?;

    Ok(UserResponse::new(user, posts, followings, followers))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("jane"), "jane");
        assert_eq!(escape_like("50%_off"), r"50\%\_off");
    }
}
