//! The presence of a row is the only source of truth for "already drawn"

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_draws")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: i64,
  /// Logical draw day, see [`crate::clock::Clock`]
  #[sea_orm(primary_key, auto_increment = false)]
  pub draw_date: Date,
  pub item_id: i32,
  pub is_new: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::user::Entity",
    from = "Column::UserId",
    to = "super::user::Column::Id"
  )]
  User,
  #[sea_orm(
    belongs_to = "super::item::Entity",
    from = "Column::ItemId",
    to = "super::item::Column::Id"
  )]
  Item,
}

impl Related<super::user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<super::item::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Item.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
