mod authentication;
pub mod config;
mod data_formats;
mod db_helpers;
mod errors;
mod extractors;
mod handlers;
pub mod mailer;
mod models;

use std::{str::FromStr, sync::Arc};

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
pub use config::{Config, FeedFallback};
pub use data_formats::*;
use handlers::*;
use mailer::Mailer;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Sqlite, SqlitePool,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub type JsonResponse<T> = (StatusCode, Json<T>);

pub async fn run_app(app: Router, listener: TcpListener) -> Result<()> {
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

pub async fn init_db(config: &config::DatabaseConfig) -> Result<SqlitePool> {
    let db_url = config.url.as_str();
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        tracing::info!("Creating database {}", db_url);
        Sqlite::create_database(db_url)
            .await
            .with_context(|| format!("Failed to create database {}", db_url))?;
    } else {
        tracing::debug!("Database already exists");
    }

    let options = SqliteConnectOptions::from_str(db_url)
        .with_context(|| format!("Invalid DATABASE_URL {}", db_url))?
        .foreign_keys(true);
    // In-memory databases vanish with their last connection.
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Running Migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations completed");
    Ok(pool)
}

/// The routing table with everything the handlers pull out of request
/// extensions attached.
pub fn build_app(pool: SqlitePool, config: Config, mailer: Arc<dyn Mailer>) -> Router {
    make_router()
        .layer(Extension(Arc::new(pool)))
        .layer(Extension(Arc::new(config)))
        .layer(Extension(mailer))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub fn make_router() -> Router {
    Router::new()
        .route("/check_health", get(alive))
        // Users
        .route("/user", post(register_user))
        .route("/user/:id", get(get_user).delete(delete_user))
        .route("/user/:id/update", patch(update_user).put(update_user))
        .route("/user/:id/avatar/update", patch(update_avatar).put(update_avatar))
        .route("/users", get(list_users))
        // Posts
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/post/:id",
            get(get_post)
                .patch(update_post)
                .put(update_post)
                .delete(delete_post),
        )
        .route("/post/:id/comments", get(list_comments).post(create_comment))
        .route("/post/:id/like", post(like_post))
        .route("/post/:id/unlike", delete(unlike_post))
        .route("/feed", get(feed))
        // Follows
        .route("/follow", post(follow_user))
        .route("/unfollow/:id", delete(unfollow_user))
        // Auth
        .route("/token", post(obtain_token))
        .route("/token/refresh", post(refresh_token))
        .route("/password-reset", post(request_password_reset))
        .route("/password-reset/confirm", post(confirm_password_reset))
        .route("/password-reset/:uidb64/:token", get(check_reset_link))
        .fallback(not_found)
}
