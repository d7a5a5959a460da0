//! Database migrations using SeaORM

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_items;
mod m20260301_000003_create_daily_draws;
mod m20260301_000004_create_achievements;
mod m20260301_000005_seed_achievements;
mod m20260301_000006_create_zones;
mod m20260301_000007_create_redemptions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260301_000001_create_users::Migration),
      Box::new(m20260301_000002_create_items::Migration),
      Box::new(m20260301_000003_create_daily_draws::Migration),
      Box::new(m20260301_000004_create_achievements::Migration),
      Box::new(m20260301_000005_seed_achievements::Migration),
      Box::new(m20260301_000006_create_zones::Migration),
      Box::new(m20260301_000007_create_redemptions::Migration),
    ]
  }
}
