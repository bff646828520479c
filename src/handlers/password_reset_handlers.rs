use std::sync::Arc;

use axum::{extract::Path, Extension};
use sqlx::SqlitePool;

use crate::{
    authentication::{
        check_password_reset_token, decode_uid, encode_uid, hash_password_argon2,
        make_password_reset_token,
    },
    config::Config,
    data_formats::{
        DetailResponse, PasswordResetConfirmRequest, PasswordResetRequest, ResetLinkResponse,
    },
    db_helpers::{get_user_by_email, get_user_by_id, set_password_in_db},
    errors::RequestError,
    extractors::Json,
    mailer::{password_reset_mail, Mailer},
    models::User,
};

use super::{internal, ok, JsonResult};

const INVALID_LINK: &str = "Invalid reset link";
const RESET_SENT: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// Resolves the user behind a reset link. Every way the link can be wrong
/// produces the same error.
async fn resolve_reset_user(
    pool: &SqlitePool,
    config: &Config,
    uidb64: &str,
    token: &str,
) -> Result<User, RequestError> {
    let id = decode_uid(uidb64).ok_or(RequestError::RunTimeError(INVALID_LINK))?;
    let user = get_user_by_id(pool, id)
        .await?
        .ok_or(RequestError::RunTimeError(INVALID_LINK))?;
    if !check_password_reset_token(&config.auth, user.id, &user.password, token) {
        return Err(RequestError::RunTimeError(INVALID_LINK));
    }
    Ok(user)
}

// ----------------- Password Reset Handlers -----------------
pub async fn request_password_reset(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Extension(config): Extension<Arc<Config>>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Json(PasswordResetRequest { email }): Json<PasswordResetRequest>,
) -> JsonResult<DetailResponse> {
    if let Some(user) = get_user_by_email(&pool, &email).await? {
        let token = make_password_reset_token(&config.auth, user.id, &user.password)
            .map_err(internal("Could not issue password reset token"))?;
        let link = format!(
            "{}/{}/{}",
            config.auth.password_reset_url.trim_end_matches('/'),
            encode_uid(user.id),
            token
        );
        let mail = password_reset_mail(&user.email, &user.username, &link);
        // The answer must not depend on whether the account exists.
        match mailer.send(mail).await {
            Ok(()) => tracing::info!(user_id = user.id, "sent password reset mail"),
            Err(e) => tracing::error!(user_id = user.id, error = %e, "password reset mail failed"),
        }
    }
    ok(DetailResponse::new(RESET_SENT))
}

pub async fn check_reset_link(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Extension(config): Extension<Arc<Config>>,
    Path((uidb64, token)): Path<(String, String)>,
) -> JsonResult<ResetLinkResponse> {
    resolve_reset_user(&pool, &config, &uidb64, &token).await?;
    ok(ResetLinkResponse { valid: true })
}

pub async fn confirm_password_reset(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Extension(config): Extension<Arc<Config>>,
    Json(request): Json<PasswordResetConfirmRequest>,
) -> JsonResult<DetailResponse> {
    let user = resolve_reset_user(&pool, &config, &request.uidb64, &request.token).await?;
    request.validate()?;

    let password_hash = hash_password_argon2(request.password)
        .await
        .map_err(internal("Could not hash password"))?;
    set_password_in_db(&pool, user.id, &password_hash).await?;
    tracing::info!(user_id = user.id, "password reset completed");
    ok(DetailResponse::new("Password has been reset."))
}
