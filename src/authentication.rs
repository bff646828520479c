use std::sync::Arc;

use crate::config::{AuthConfig, Config};
use crate::db_helpers::get_user_by_id;
use crate::errors::RequestError;
use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaim {
    id: i64,
    exp: i64,
    token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResetClaim {
    id: i64,
    exp: i64,
}

pub struct AuthUser {
    pub id: i64,
}

pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn get_id(&self) -> Option<i64> {
        self.0.as_ref().map(|a| a.id)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = match parts.headers.get("Authorization") {
            Some(header) => header,
            None => return Ok(MaybeUser(None)),
        };
        let header = header.to_str().map_err(|_| {
            tracing::debug!("authorization header is not valid ascii");
            RequestError::NotAuthorized("Invalid token")
        })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            tracing::debug!("authorization header without Bearer prefix");
            RequestError::NotAuthorized("Invalid token")
        })?;

        let config = parts
            .extensions
            .get::<Arc<Config>>()
            .ok_or(RequestError::ServerError)?;
        let id = verify_jwt_token(&config.auth, token, TokenType::Access)?;

        // The account may have been deleted after the token was issued.
        let pool = parts
            .extensions
            .get::<Arc<SqlitePool>>()
            .cloned()
            .ok_or(RequestError::ServerError)?;
        if get_user_by_id(&pool, id).await?.is_none() {
            tracing::debug!(user_id = id, "token for a deleted user");
            return Err(RequestError::NotAuthorized("User not found"));
        }

        Ok(MaybeUser(Some(AuthUser { id })))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        MaybeUser::from_request_parts(parts, state)
            .await?
            .0
            .ok_or(RequestError::NotAuthorized(
                "Authentication credentials were not provided.",
            ))
    }
}

// ----------------- JWT -----------------

fn expires_after(lifetime: time::Duration) -> Result<OffsetDateTime> {
    OffsetDateTime::now_utc()
        .checked_add(lifetime)
        .context("Token lifetime is out of range")
}

pub fn get_jwt_token(auth: &AuthConfig, id: i64, token_type: TokenType) -> Result<String> {
    let lifetime = match token_type {
        TokenType::Access => auth.access_token_ttl,
        TokenType::Refresh => auth.refresh_token_ttl,
    };
    let expiry_date = expires_after(lifetime)?;
    let claim = AuthClaim {
        id,
        exp: expiry_date.unix_timestamp(),
        token_type,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(auth.jwt_secret.as_ref()),
    )
    .context("Failed to generate jwt token")
}

pub fn verify_jwt_token(
    auth: &AuthConfig,
    token: &str,
    expected: TokenType,
) -> Result<i64, RequestError> {
    let token_data = jsonwebtoken::decode::<AuthClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(auth.jwt_secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected jwt");
        RequestError::NotAuthorized("Token is invalid or expired")
    })?;
    let claim = token_data.claims;
    if claim.token_type != expected {
        return Err(RequestError::NotAuthorized("Token has wrong type"));
    }
    if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
        return Err(RequestError::NotAuthorized("Token is invalid or expired"));
    }
    Ok(claim.id)
}

// ----------------- Password reset -----------------

/// Reset tokens are signed with the user's current password hash mixed into
/// the key, so they stop verifying once the password changes.
fn reset_key(auth: &AuthConfig, password_hash: &str) -> Vec<u8> {
    format!("{}:password-reset:{}", auth.jwt_secret, password_hash).into_bytes()
}

pub fn make_password_reset_token(auth: &AuthConfig, id: i64, password_hash: &str) -> Result<String> {
    let expiry_date = expires_after(auth.password_reset_ttl)?;
    let claim = ResetClaim {
        id,
        exp: expiry_date.unix_timestamp(),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(&reset_key(auth, password_hash)),
    )
    .context("Failed to generate password reset token")
}

pub fn check_password_reset_token(
    auth: &AuthConfig,
    id: i64,
    password_hash: &str,
    token: &str,
) -> bool {
    let mut validation = jsonwebtoken::Validation::default();
    validation.leeway = 0;
    match jsonwebtoken::decode::<ResetClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(&reset_key(auth, password_hash)),
        &validation,
    ) {
        Ok(data) => data.claims.id == id,
        Err(e) => {
            tracing::debug!(error = %e, "rejected password reset token");
            false
        }
    }
}

pub fn encode_uid(id: i64) -> String {
    URL_SAFE_NO_PAD.encode(id.to_string())
}

pub fn decode_uid(uidb64: &str) -> Option<i64> {
    let bytes = URL_SAFE_NO_PAD.decode(uidb64.trim_end_matches('=')).ok()?;
    String::from_utf8(bytes).ok()?.parse().ok()
}

// ----------------- Passwords -----------------

pub async fn verify_password_argon2(password: String, hash: &str) -> Result<bool> {
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthConfig {
        Config::in_memory("test-secret").auth
    }

    #[test]
    fn access_and_refresh_tokens_are_not_interchangeable() {
        let auth = auth();
        let access = get_jwt_token(&auth, 12, TokenType::Access).unwrap();
        let refresh = get_jwt_token(&auth, 12, TokenType::Refresh).unwrap();

        assert_eq!(verify_jwt_token(&auth, &access, TokenType::Access).unwrap(), 12);
        assert_eq!(verify_jwt_token(&auth, &refresh, TokenType::Refresh).unwrap(), 12);
        assert!(verify_jwt_token(&auth, &refresh, TokenType::Access).is_err());
        assert!(verify_jwt_token(&auth, &access, TokenType::Refresh).is_err());
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let other = Config::in_memory("other-secret").auth;
        let token = get_jwt_token(&other, 1, TokenType::Access).unwrap();
        assert!(verify_jwt_token(&auth(), &token, TokenType::Access).is_err());
    }

    #[test]
    fn reset_token_is_bound_to_user_and_password() {
        let auth = auth();
        let token = make_password_reset_token(&auth, 3, "hash-one").unwrap();

        assert!(check_password_reset_token(&auth, 3, "hash-one", &token));
        assert!(!check_password_reset_token(&auth, 4, "hash-one", &token));
        assert!(!check_password_reset_token(&auth, 3, "hash-two", &token));

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(!check_password_reset_token(&auth, 3, "hash-one", &tampered));
    }

    #[test]
    fn expired_reset_tokens_fail() {
        let mut auth = auth();
        auth.password_reset_ttl = time::Duration::seconds(-10);
        let token = make_password_reset_token(&auth, 3, "hash").unwrap();
        assert!(!check_password_reset_token(&auth, 3, "hash", &token));
    }

    #[test]
    fn out_of_range_lifetimes_are_errors() {
        let mut auth = auth();
        auth.access_token_ttl = time::Duration::MAX;
        auth.password_reset_ttl = time::Duration::MAX;
        assert!(get_jwt_token(&auth, 1, TokenType::Access).is_err());
        assert!(get_jwt_token(&auth, 1, TokenType::Refresh).is_ok());
        assert!(make_password_reset_token(&auth, 1, "hash").is_err());
    }

    #[test]
    fn uid_codec() {
        assert_eq!(encode_uid(42), "NDI");
        assert_eq!(decode_uid(&encode_uid(42)), Some(42));
        assert_eq!(decode_uid("NDI="), Some(42));
        assert_eq!(decode_uid("not base64!"), None);
        assert_eq!(decode_uid(&URL_SAFE_NO_PAD.encode("abc")), None);
    }

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hash = hash_password_argon2("hunter2".to_owned()).await.unwrap();
        assert!(verify_password_argon2("hunter2".to_owned(), &hash).await.unwrap());
        assert!(!verify_password_argon2("hunter3".to_owned(), &hash).await.unwrap());
    }
}
