use serde::{Deserialize, Serialize};

use crate::{
  entity::{item, ownership},
  prelude::*,
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
  pub name: String,
  pub image_url: String,
  #[serde(default = "default_series")]
  pub series: String,
  #[serde(default)]
  pub description: Option<String>,
}

fn default_series() -> String {
  String::from("common")
}

#[derive(Debug, Clone, Serialize)]
pub struct Detail {
  #[serde(flatten)]
  pub item: item::Model,
  pub owned: bool,
}

pub struct Catalog<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Catalog<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn all(&self) -> Result<Vec<item::Model>> {
    let items = item::Entity::find()
      .order_by_asc(item::Column::Series)
      .order_by_asc(item::Column::Id)
      .all(self.db)
      .await?;
    Ok(items)
  }

  pub async fn count(&self) -> Result<u64> {
    Ok(item::Entity::find().count(self.db).await?)
  }

  pub async fn detail(&self, user_id: i64, item_id: i32) -> Result<Detail> {
    let item = item::Entity::find_by_id(item_id)
      .one(self.db)
      .await?
      .ok_or(Error::ItemNotFound)?;

    let owned = ownership::Entity::find_by_id((user_id, item_id))
      .one(self.db)
      .await?
      .is_some();

    Ok(Detail { item, owned })
  }

  pub async fn add(&self, item: NewItem) -> Result<item::Model> {
    let item = item::ActiveModel {
      name: Set(item.name),
      image_url: Set(item.image_url),
      series: Set(item.series),
      description: Set(item.description),
      created_at: Set(utils::now()),
      ..Default::default()
    }
    .insert(self.db)
    .await?;

    debug!("Added item #{} `{}` ({})", item.id, item.name, item.series);
    Ok(item)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::fixtures;

  #[tokio::test]
  async fn test_detail() {
    let db = fixtures::db().await;
    fixtures::user(&db, 1, 0).await;
    let ids = fixtures::items(&db, &["common"], 2).await;
    fixtures::give(&db, 1, &ids[..1]).await;

    let sv = Catalog::new(&db);
    assert!(sv.detail(1, ids[0]).await.unwrap().owned);
    assert!(!sv.detail(1, ids[1]).await.unwrap().owned);
    assert!(matches!(sv.detail(1, 999).await, Err(Error::ItemNotFound)));
  }

  #[test]
  fn test_new_item_defaults() {
    let item: NewItem =
      json::from_str(r#"{"name":"Lantern","image_url":"/images/lantern.jpg"}"#)
        .unwrap();
    assert_eq!(item.series, "common");
    assert_eq!(item.description, None);
  }
}
