use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use electra::config::Config;
use electra::console::Console;
use electra::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "electra=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting electric utility service desk...");

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let pool = db::create_pool(config.database_url(), config.max_connections).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let mut console = Console::new(pool);
    console.run().await?;

    Ok(())
}
