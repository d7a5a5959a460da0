use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "location_checkins")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: i64,
  #[sea_orm(primary_key, auto_increment = false)]
  pub zone_id: i32,
  #[sea_orm(primary_key, auto_increment = false)]
  pub checkin_date: Date,
  pub latitude: f64,
  pub longitude: f64,
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
    belongs_to = "super::zone::Entity",
    from = "Column::ZoneId",
    to = "super::zone::Column::Id"
  )]
  Zone,
}

impl Related<super::user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<super::zone::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Zone.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
