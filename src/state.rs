use std::{path::PathBuf, sync::Arc};

use chrono_tz::Tz;

use crate::{
  auth::{Authenticator, Jwt},
  clock::Clock,
  governor::{Governor, Quota},
  prelude::*,
  sv,
};

#[derive(Debug, Clone, Copy)]
pub struct TierCosts {
  pub basic: i32,
  pub premium: i32,
}

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  pub jwt_secret: String,
  pub clock: Clock,
  /// Chance to prefer an unowned item on a draw
  pub new_item_weight: f64,
  pub geofence: bool,
  pub milestone_interval: u32,
  pub quota: Quota,
  pub tiers: TierCosts,
  pub seed_file: Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: String::from("sqlite:pilgrim.db?mode=rwc"),
      port: 8080,
      jwt_secret: String::new(),
      clock: Clock::default(),
      new_item_weight: 0.9,
      geofence: false,
      milestone_interval: 7,
      quota: Quota::default(),
      tiers: TierCosts { basic: 1, premium: 5 },
      seed_file: None,
    }
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let base = Self::default();

    let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET not set")?;
    anyhow::ensure!(!jwt_secret.is_empty(), "JWT_SECRET must not be empty");

    let tz: Tz = utils::env_or("DRAW_TIMEZONE", base.clock.tz())?;
    let cutoff: u32 = utils::env_or("DRAW_CUTOFF_HOUR", 16)?;
    anyhow::ensure!(cutoff < 24, "DRAW_CUTOFF_HOUR must be 0..=23");

    let sweep: humantime::Duration =
      utils::env_or("RATE_SWEEP_INTERVAL", base.quota.sweep.into())?;
    let quota = Quota {
      per_second: utils::env_or("RATE_PER_SECOND", base.quota.per_second)?,
      burst: utils::env_or("RATE_BURST", base.quota.burst)?,
      sweep: sweep.into(),
    };

    let config = Self {
      database_url: utils::env_or("DATABASE_URL", base.database_url)?,
      port: utils::env_or("PORT", base.port)?,
      jwt_secret,
      clock: Clock::new(tz, cutoff),
      new_item_weight: utils::env_or("DRAW_NEW_WEIGHT", base.new_item_weight)?,
      geofence: utils::env_or("GEOFENCE_ENABLED", base.geofence)?,
      milestone_interval: utils::env_or(
        "MILESTONE_INTERVAL",
        base.milestone_interval,
      )?,
      quota,
      tiers: TierCosts {
        basic: utils::env_or("REDEEM_BASIC_COST", base.tiers.basic)?,
        premium: utils::env_or("REDEEM_PREMIUM_COST", base.tiers.premium)?,
      },
      seed_file: std::env::var_os("SEED_FILE").map(PathBuf::from),
    };

    config.validate()?;
    Ok(config)
  }

  /// Rejects values the engine cannot run with.
  pub fn validate(&self) -> anyhow::Result<()> {
    anyhow::ensure!(
      (0.0..=1.0).contains(&self.new_item_weight),
      "DRAW_NEW_WEIGHT must be within 0..=1"
    );
    anyhow::ensure!(
      self.milestone_interval > 0,
      "MILESTONE_INTERVAL must be positive"
    );

    let quota = &self.quota;
    anyhow::ensure!(
      quota.per_second.is_finite() && quota.per_second > 0.0,
      "RATE_PER_SECOND must be a positive number"
    );
    anyhow::ensure!(quota.burst >= 1, "RATE_BURST must be at least 1");
    anyhow::ensure!(
      !quota.sweep.is_zero(),
      "RATE_SWEEP_INTERVAL must be non-zero"
    );

    anyhow::ensure!(
      self.tiers.basic >= 0 && self.tiers.premium >= 0,
      "REDEEM_BASIC_COST and REDEEM_PREMIUM_COST must not be negative"
    );
    Ok(())
  }
}

pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub catalog: sv::Catalog<'a>,
  pub zone: sv::Zone<'a>,
  pub draw: sv::Draw<'a>,
  pub achievement: sv::Achievement<'a>,
  pub redeem: sv::Redeem<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  pub governor: Governor,
  pub auth: Arc<dyn Authenticator>,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    migration::Migrator::up(&db, None)
      .await
      .context("Failed to run migrations")?;

    let auth = Arc::new(Jwt::new(&config.jwt_secret));
    Ok(Self::with_db(db, config, auth))
  }

  pub fn with_db(
    db: DatabaseConnection,
    config: Config,
    auth: Arc<dyn Authenticator>,
  ) -> Self {
    let governor = Governor::new(config.quota.clone());
    Self { db, config, governor, auth }
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      user: sv::User::new(&self.db),
      catalog: sv::Catalog::new(&self.db),
      zone: sv::Zone::new(&self.db),
      draw: sv::Draw::new(&self.db, &self.config),
      achievement: sv::Achievement::new(&self.db, &self.config),
      redeem: sv::Redeem::new(&self.db, &self.config),
    }
  }
}
