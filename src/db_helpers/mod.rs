use std::collections::HashMap;

use sqlx::{Sqlite, SqlitePool};

use crate::{data_formats::SimpleUserResponse, errors::RequestError, models::User};

mod comment_helpers;
mod follow_helpers;
mod like_helpers;
mod post_helpers;
mod user_helpers;

pub use comment_helpers::*;
pub use follow_helpers::*;
pub use like_helpers::*;
pub use post_helpers::*;
pub use user_helpers::*;

const USER_COLUMNS: &str = "id, username, email, password, bio, gender, avatar, created_at";

/// Builds `UPDATE <table> SET a = ?, b = ? WHERE id = ?` from the fields that
/// are actually present.
struct QueryBuilder {
    query: String,
    params: Vec<String>,
    seperator: &'static str,
}

impl QueryBuilder {
    fn update(table: &str) -> Self {
        Self {
            query: format!("UPDATE {} SET ", table),
            params: vec![],
            seperator: ", ",
        }
    }

    fn add_param(mut self, column: &str, param: Option<String>) -> Self {
        if let Some(value) = param {
            if !self.params.is_empty() {
                self.query.push_str(self.seperator);
            }
            self.query.push_str(column);
            self.query.push_str(" = ?");
            self.params.push(value);
        }
        self
    }

    /// `None` when no column was set, i.e. there is nothing to update.
    fn build(mut self, id: i64) -> Option<(String, Vec<String>)> {
        if self.params.is_empty() {
            return None;
        }
        self.query.push_str(" WHERE id = ?");
        self.params.push(id.to_string());
        Some((self.query, self.params))
    }
}

// ----------------- Helper Functions -----------------

pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

/// Resolves user ids to their nested representation, querying each id once
/// per response.
pub struct UserLookup<'a> {
    pool: &'a SqlitePool,
    seen: HashMap<i64, SimpleUserResponse>,
}

impl<'a> UserLookup<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self {
            pool,
            seen: HashMap::new(),
        }
    }

    pub fn remember(&mut self, user: User) -> SimpleUserResponse {
        let simple = SimpleUserResponse::from(user);
        self.seen.insert(simple.id, simple.clone());
        simple
    }

    pub async fn get(&mut self, id: i64) -> Result<SimpleUserResponse, RequestError> {
        if let Some(user) = self.seen.get(&id) {
            return Ok(user.clone());
        }
        let user = get_user_by_id(self.pool, id)
            .await?
            .ok_or(RequestError::NotFound)?;
        Ok(self.remember(user))
    }
}
