use std::{env, str::FromStr};

use anyhow::{bail, Context, Result};

/// What `/feed` returns for a user who follows nobody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFallback {
    /// Every post in the system, newest first.
    AllPosts,
    /// Nothing.
    Empty,
}

impl FromStr for FeedFallback {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FeedFallback::AllPosts),
            "empty" | "none" => Ok(FeedFallback::Empty),
            other => bail!("unknown EMPTY_FEED value '{}', expected 'all' or 'empty'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
    pub empty_feed: FeedFallback,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl: time::Duration,
    pub refresh_token_ttl: time::Duration,
    pub password_reset_ttl: time::Duration,
    /// Links in reset mails are `{password_reset_url}/{uidb64}/{token}`.
    pub password_reset_url: String,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database: DatabaseConfig {
                url: var_or("DATABASE_URL", "sqlite://socialnet.db"),
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            server: ServerConfig {
                host: var_or("SERVER_HOST", "127.0.0.1"),
                port: parse_var("SERVER_PORT", 3001)?,
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
                access_token_ttl: lifetime_var("ACCESS_TOKEN_MINUTES", 60, time::Duration::MINUTE)?,
                refresh_token_ttl: lifetime_var("REFRESH_TOKEN_HOURS", 24, time::Duration::HOUR)?,
                password_reset_ttl: lifetime_var("PASSWORD_RESET_HOURS", 72, time::Duration::HOUR)?,
                password_reset_url: var_or(
                    "PASSWORD_RESET_URL",
                    "http://localhost:3000/password-reset",
                ),
            },
            mail: MailConfig {
                smtp_host: env::var("SMTP_HOST").ok().filter(|h| !h.is_empty()),
                smtp_username: env::var("SMTP_USERNAME").ok(),
                smtp_password: env::var("SMTP_PASSWORD").ok(),
                from: var_or("MAIL_FROM", "no-reply@localhost"),
            },
            empty_feed: parse_var("EMPTY_FEED", FeedFallback::AllPosts)?,
        })
    }

    /// Settings for a throwaway in-memory instance. Memory databases live
    /// inside a single connection, so the pool is capped at one.
    pub fn in_memory(jwt_secret: &str) -> Self {
        Config {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_owned(),
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_owned(),
                port: 0,
            },
            auth: AuthConfig {
                jwt_secret: jwt_secret.to_owned(),
                access_token_ttl: time::Duration::minutes(60),
                refresh_token_ttl: time::Duration::hours(24),
                password_reset_ttl: time::Duration::hours(72),
                password_reset_url: "http://localhost:3000/password-reset".to_owned(),
            },
            mail: MailConfig {
                smtp_host: None,
                smtp_username: None,
                smtp_password: None,
                from: "no-reply@localhost".to_owned(),
            },
            empty_feed: FeedFallback::AllPosts,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

/// A token lifetime given as a count of `unit`. It has to fit between now and
/// the end of the representable calendar.
fn lifetime_var(key: &str, default: u32, unit: time::Duration) -> Result<time::Duration> {
    let count = parse_var(key, default)?;
    lifetime(key, count, unit)
}

fn lifetime(key: &str, count: u32, unit: time::Duration) -> Result<time::Duration> {
    let lifetime = time::Duration::seconds(i64::from(count) * unit.whole_seconds());
    if time::OffsetDateTime::now_utc().checked_add(lifetime).is_none() {
        bail!("{} is too large: {}", key, count);
    }
    Ok(lifetime)
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e))
}
