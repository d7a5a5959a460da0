//! Pilgrim - daily collectible draw server
//!
//! - SeaORM for persistence (SQLite, Postgres)
//! - Axum for the HTTP API behind a per-client rate limiter
//! - Tokio runtime hosting restartable background plugins

mod auth;
mod clock;
mod entity;
mod error;
mod geo;
mod governor;
mod plugins;
mod prelude;
mod seed;
mod state;
mod sv;
mod utils;

use std::sync::Arc;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  plugins::{App, server, sweeper::Sweeper},
  prelude::*,
  seed::Seed,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "pilgrim=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  info!("Starting Pilgrim v{}", env!("CARGO_PKG_VERSION"));

  let config = Config::from_env()?;
  let app = Arc::new(AppState::new(config).await?);

  Seed::load(app.config.seed_file.as_deref())
    .await?
    .apply(&app)
    .await
    .context("Failed to seed catalog")?;

  App::new().register(server::Plugin).register(Sweeper).run(app).await;

  tokio::signal::ctrl_c().await?;
  info!("Shutting down");

  Ok(())
}
