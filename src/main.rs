// main.rs
use std::sync::Arc;

use poem::listener::TcpListener;
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::EnvFilter;

use condo_api::config::Config;
use condo_api::migration::Migrator;
use condo_api::state::AppState;
use condo_api::{app, mailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let db = Database::connect(config.database_url.as_str()).await?;
    if config.run_migrations {
        Migrator::up(&db, None).await?;
        tracing::info!("migrations applied");
    }

    let mailer = mailer::from_config(&config);
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(db, config, mailer));

    tracing::info!(%bind_addr, "listening");
    poem::Server::new(TcpListener::bind(bind_addr))
        .run(app(state))
        .await?;
    Ok(())
}
