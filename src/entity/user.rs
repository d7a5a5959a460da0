use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  /// Id handed out by the authentication collaborator
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: i64,
  pub username: String,
  /// Running ledger: credited by achievements, debited by redemptions
  pub exchange_points: i32,
  pub draw_count: i32,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::ownership::Entity")]
  Ownership,
  #[sea_orm(has_many = "super::daily_draw::Entity")]
  DailyDraws,
  #[sea_orm(has_many = "super::redemption::Entity")]
  Redemptions,
}

impl Related<super::ownership::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Ownership.def()
  }
}

impl Related<super::daily_draw::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::DailyDraws.def()
  }
}

impl Related<super::redemption::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Redemptions.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
