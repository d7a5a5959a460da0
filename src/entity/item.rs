use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub name: String,
  pub image_url: String,
  pub series: String,
  pub description: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::ownership::Entity")]
  Ownership,
}

impl Related<super::ownership::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Ownership.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
