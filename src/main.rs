use socialnet::{build_app, config::Config, init_db, mailer::mailer_from_config, run_app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> socialnet::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,socialnet=debug,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        database = %config.database.url,
        empty_feed = ?config.empty_feed,
        smtp = config.mail.smtp_host.is_some(),
        "Loaded configuration"
    );

    let pool = init_db(&config.database).await?;
    let mailer = mailer_from_config(&config.mail)?;
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    let app = build_app(pool, config, mailer);

    if let Err(error) = run_app(app, listener).await {
        tracing::error!("Server stopped: {}", error);
        return Err(error);
    }
    Ok(())
}
