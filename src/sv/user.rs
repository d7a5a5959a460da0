use sea_orm::sea_query::Expr;
use serde::Serialize;

use crate::{
  auth::Identity,
  entity::{item, ownership, user},
  prelude::*,
};

/// Item as it appears in a collection listing
#[derive(Debug, Clone, Serialize)]
pub struct Owned {
  #[serde(flatten)]
  pub item: item::Model,
  pub obtained_at: DateTime,
}

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Looks the user up by the authenticated id, creating the row on first
  /// sight.
  pub async fn get_or_create(&self, identity: &Identity) -> Result<user::Model> {
    if let Some(user) = self.by_id(identity.user_id).await? {
      return Ok(user);
    }

    let user = user::ActiveModel {
      id: Set(identity.user_id),
      username: Set(identity.username.clone()),
      exchange_points: Set(0),
      draw_count: Set(0),
      created_at: Set(utils::now()),
    };
    if utils::insert_new(self.db, user).await? {
      info!("Registered user {} ({})", identity.user_id, identity.username);
    }

    self.by_id(identity.user_id).await?.ok_or(Error::UserNotFound)
  }

  pub async fn by_id(&self, id: i64) -> Result<Option<user::Model>> {
    Ok(user::Entity::find_by_id(id).one(self.db).await?)
  }

  /// Owned items grouped by series.
  pub async fn items(&self, id: i64) -> Result<Vec<Owned>> {
    let rows = ownership::Entity::find()
      .filter(ownership::Column::UserId.eq(id))
      .find_also_related(item::Entity)
      .order_by_asc(item::Column::Series)
      .order_by_asc(item::Column::Id)
      .all(self.db)
      .await?;

    let items = rows
      .into_iter()
      .filter_map(|(owned, item)| {
        item.map(|item| Owned { item, obtained_at: owned.obtained_at })
      })
      .collect();
    Ok(items)
  }
}

/// Adds `points` to the user's balance.
pub(crate) async fn credit<C>(db: &C, user_id: i64, points: i32) -> Result<()>
where
  C: ConnectionTrait,
{
  let res = user::Entity::update_many()
    .col_expr(
      user::Column::ExchangePoints,
      Expr::col(user::Column::ExchangePoints).add(points),
    )
    .filter(user::Column::Id.eq(user_id))
    .exec(db)
    .await?;

  if res.rows_affected == 0 {
    return Err(Error::UserNotFound);
  }
  Ok(())
}

/// Subtracts `points` only if the balance covers them; `false` otherwise.
pub(crate) async fn debit<C>(db: &C, user_id: i64, points: i32) -> Result<bool>
where
  C: ConnectionTrait,
{
  let res = user::Entity::update_many()
    .col_expr(
      user::Column::ExchangePoints,
      Expr::col(user::Column::ExchangePoints).sub(points),
    )
    .filter(user::Column::Id.eq(user_id))
    .filter(user::Column::ExchangePoints.gte(points))
    .exec(db)
    .await?;

  Ok(res.rows_affected > 0)
}
