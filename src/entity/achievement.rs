//! Achievement catalog - static reference data seeded by migrations

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which progress predicate unlocks the achievement
#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
  #[sea_orm(string_value = "first_item")]
  FirstItem,
  #[sea_orm(string_value = "draw_days")]
  DrawDays,
  #[sea_orm(string_value = "complete_series")]
  CompleteSeries,
  #[sea_orm(string_value = "complete_catalog")]
  CompleteCatalog,
  /// Repeating every-N-items reward, granted without a manual claim
  #[sea_orm(string_value = "milestone")]
  Milestone,
  #[sea_orm(string_value = "zone_checkins")]
  ZoneCheckins,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievements")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(unique)]
  pub code: String,
  pub name: String,
  /// May contain a `{zone}` placeholder
  pub description: String,
  pub reward_points: i32,
  pub kind: AchievementKind,
  pub target: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::user_achievement::Entity")]
  UserAchievements,
}

impl Related<super::user_achievement::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::UserAchievements.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
