use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "checkin_zones")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub name: String,
  pub latitude: f64,
  pub longitude: f64,
  pub radius_meters: f64,
  /// Achievement unlocked by repeated check-ins here
  pub achievement_code: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::checkin::Entity")]
  Checkins,
}

impl Related<super::checkin::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Checkins.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
