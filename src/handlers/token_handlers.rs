use std::sync::Arc;

use axum::Extension;
use sqlx::SqlitePool;

use crate::{
    authentication::{get_jwt_token, verify_jwt_token, verify_password_argon2, TokenType},
    config::Config,
    data_formats::{AccessTokenResponse, LoginRequest, RefreshRequest, TokenPairResponse},
    db_helpers::{get_user_by_email, get_user_by_id},
    errors::RequestError,
    extractors::Json,
};

use super::{internal, ok, JsonResult};

const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

// ----------------- Token Handlers -----------------
pub async fn obtain_token(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Extension(config): Extension<Arc<Config>>,
    Json(LoginRequest { email, password }): Json<LoginRequest>,
) -> JsonResult<TokenPairResponse> {
    let user = get_user_by_email(&pool, &email)
        .await?
        .ok_or(RequestError::NotAuthorized(BAD_CREDENTIALS))?;

    let is_password_correct = verify_password_argon2(password, &user.password)
        .await
        .map_err(internal("Could not verify password"))?;
    if !is_password_correct {
        return Err(RequestError::NotAuthorized(BAD_CREDENTIALS));
    }

    let access = get_jwt_token(&config.auth, user.id, TokenType::Access)
        .map_err(internal("Could not issue access token"))?;
    let refresh = get_jwt_token(&config.auth, user.id, TokenType::Refresh)
        .map_err(internal("Could not issue refresh token"))?;
    tracing::debug!(user_id = user.id, "issued token pair");
    ok(TokenPairResponse { access, refresh })
}

pub async fn refresh_token(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Extension(config): Extension<Arc<Config>>,
    Json(RefreshRequest { refresh }): Json<RefreshRequest>,
) -> JsonResult<AccessTokenResponse> {
    let id = verify_jwt_token(&config.auth, &refresh, TokenType::Refresh)?;
    // Refresh tokens of deleted accounts are dead.
    if get_user_by_id(&pool, id).await?.is_none() {
        return Err(RequestError::NotAuthorized("Token is invalid or expired"));
    }
    let access = get_jwt_token(&config.auth, id, TokenType::Access)
        .map_err(internal("Could not issue access token"))?;
    ok(AccessTokenResponse { access })
}
