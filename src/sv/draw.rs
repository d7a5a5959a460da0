use std::collections::HashSet;

use rand::{Rng, seq::IndexedRandom};
use sea_orm::sea_query::Expr;
use serde::Serialize;

use crate::{
  entity::{checkin, daily_draw, item, ownership, user, zone},
  error,
  geo::Coords,
  prelude::*,
  state::Config,
  sv,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pool {
  Unowned,
  Owned,
}

/// Which pool a draw takes from, given the biased coin and which pools are
/// non-empty. `None` only for an empty catalog.
fn pool(prefer_new: bool, has_unowned: bool, has_owned: bool) -> Option<Pool> {
  match (prefer_new, has_unowned, has_owned) {
    (_, false, false) => None,
    (true, true, _) | (false, true, false) => Some(Pool::Unowned),
    (true, false, true) | (false, _, true) => Some(Pool::Owned),
  }
}

/// Picks an item, preferring unowned ones with probability `weight`.
///
/// Returns the item and whether it is new to the user.
pub fn allocate<'c, R: Rng + ?Sized>(
  catalog: &'c [item::Model],
  owned: &HashSet<i32>,
  weight: f64,
  rng: &mut R,
) -> Option<(&'c item::Model, bool)> {
  let (have, missing): (Vec<_>, Vec<_>) =
    catalog.iter().partition(|item| owned.contains(&item.id));

  let prefer_new = rng.random_bool(weight.clamp(0.0, 1.0));
  let (candidates, is_new) =
    match pool(prefer_new, !missing.is_empty(), !have.is_empty())? {
      Pool::Unowned => (missing, true),
      Pool::Owned => (have, false),
    };

  candidates.choose(rng).map(|&item| (item, is_new))
}

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
  pub item: item::Model,
  pub is_new: bool,
  /// Today's draw already existed and is returned unchanged
  pub replayed: bool,
  /// Zone the draw was checked in at
  pub zone: Option<String>,
  /// Achievements unlocked or settled by this draw
  pub achievements: Vec<sv::achievement::Status>,
}

pub struct Draw<'a> {
  db: &'a DatabaseConnection,
  config: &'a Config,
}

impl<'a> Draw<'a> {
  pub fn new(db: &'a DatabaseConnection, config: &'a Config) -> Self {
    Self { db, config }
  }

  /// The draw already made on `day`, if any.
  pub async fn today(&self, user_id: i64, day: Date) -> Result<Option<Outcome>> {
    let Some(record) = daily_draw::Entity::find_by_id((user_id, day))
      .one(self.db)
      .await?
    else {
      return Ok(None);
    };

    let item = item::Entity::find_by_id(record.item_id)
      .one(self.db)
      .await?
      .ok_or(Error::ItemNotFound)?;

    Ok(Some(Outcome {
      item,
      is_new: record.is_new,
      replayed: true,
      zone: None,
      achievements: Vec::new(),
    }))
  }

  /// Performs the single draw allowed per user and logical day.
  ///
  /// Repeated calls on the same day return the first result without
  /// writing anything.
  pub async fn draw(
    &self,
    user_id: i64,
    day: Date,
    coords: Option<Coords>,
  ) -> Result<Outcome> {
    if let Some(outcome) = self.today(user_id, day).await? {
      debug!("User {user_id} already drew on {day}");
      return Ok(outcome);
    }

    let checkin = if self.config.geofence {
      Some(self.locate(coords).await?)
    } else {
      None
    };

    let txn = self.db.begin().await?;

    let catalog =
      item::Entity::find().order_by_asc(item::Column::Id).all(&txn).await?;
    let owned: HashSet<i32> = ownership::Entity::find()
      .select_only()
      .column(ownership::Column::ItemId)
      .filter(ownership::Column::UserId.eq(user_id))
      .into_tuple::<i32>()
      .all(&txn)
      .await?
      .into_iter()
      .collect();

    let (item, is_new) = allocate(
      &catalog,
      &owned,
      self.config.new_item_weight,
      &mut rand::rng(),
    )
    .map(|(item, is_new)| (item.clone(), is_new))
    .ok_or(Error::EmptyCatalog)?;

    let now = utils::now();
    let record = daily_draw::ActiveModel {
      user_id: Set(user_id),
      draw_date: Set(day),
      item_id: Set(item.id),
      is_new: Set(is_new),
      created_at: Set(now),
    };
    if !utils::insert_new(&txn, record).await? {
      // A concurrent request drew first
      txn.rollback().await?;
      debug!("User {user_id} lost a draw race on {day}");
      return self.today(user_id, day).await?.ok_or_else(|| {
        Error::Internal(format!("draw of {user_id} on {day} vanished"))
      });
    }

    if is_new {
      let owned = ownership::ActiveModel {
        user_id: Set(user_id),
        item_id: Set(item.id),
        obtained_at: Set(now),
      };
      utils::insert_new(&txn, owned).await?;
    }

    let res = user::Entity::update_many()
      .col_expr(
        user::Column::DrawCount,
        Expr::col(user::Column::DrawCount).add(1),
      )
      .filter(user::Column::Id.eq(user_id))
      .exec(&txn)
      .await?;
    if res.rows_affected == 0 {
      return Err(Error::UserNotFound);
    }

    if let Some((zone, point)) = &checkin {
      let visit = checkin::ActiveModel {
        user_id: Set(user_id),
        zone_id: Set(zone.id),
        checkin_date: Set(day),
        latitude: Set(point.latitude),
        longitude: Set(point.longitude),
        created_at: Set(now),
      };
      utils::insert_new(&txn, visit).await?;
    }

    txn.commit().await?;
    info!(
      "User {user_id} drew item #{} on {day}{}",
      item.id,
      if is_new { " (new)" } else { "" }
    );

    // The draw is committed; an evaluation failure must not undo it
    let achievements =
      match sv::Achievement::new(self.db, self.config).evaluate(user_id).await {
        Ok(changed) => changed,
        Err(err) => {
          error!("Failed to evaluate achievements for user {user_id}: {err}");
          Vec::new()
        }
      };

    Ok(Outcome {
      item,
      is_new,
      replayed: false,
      zone: checkin.map(|(zone, _)| zone.name),
      achievements,
    })
  }

  async fn locate(&self, coords: Option<Coords>) -> Result<(zone::Model, Coords)> {
    let point = coords.ok_or(error::Draw::LocationRequired)?;

    let zones = sv::zone::all(self.db).await?;
    match crate::geo::nearest(&zones, point) {
      Some((zone, dist)) => {
        debug!("Location matched `{}` at {dist:.0}m", zone.name);
        Ok((zone.clone(), point))
      }
      None => {
        let zones = zones.into_iter().map(|zone| zone.name).collect();
        Err(error::Draw::LocationRejected { zones }.into())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use rand::{SeedableRng, rngs::StdRng};

  use super::*;
  use crate::{entity::AchievementKind, sv::fixtures};

  fn catalog(n: i32) -> Vec<item::Model> {
    (1..=n)
      .map(|id| item::Model {
        id,
        name: format!("item-{id}"),
        image_url: String::new(),
        series: String::from("common"),
        description: None,
        created_at: DateTime::default(),
      })
      .collect()
  }

  fn day(d: u32) -> Date {
    Date::from_ymd_opt(2026, 3, d).unwrap()
  }

  #[test]
  fn test_pool_table() {
    assert_eq!(pool(true, true, true), Some(Pool::Unowned));
    assert_eq!(pool(true, false, true), Some(Pool::Owned));
    assert_eq!(pool(false, true, true), Some(Pool::Owned));
    assert_eq!(pool(false, true, false), Some(Pool::Unowned));
    assert_eq!(pool(true, false, false), None);
    assert_eq!(pool(false, false, false), None);
  }

  #[test]
  fn test_allocate_converges_to_weight() {
    let catalog = catalog(10);
    let owned: HashSet<i32> = (1..=5).collect();
    let mut rng = StdRng::seed_from_u64(7);

    let rounds = 10_000;
    let fresh = (0..rounds)
      .filter(|_| allocate(&catalog, &owned, 0.9, &mut rng).unwrap().1)
      .count();

    let rate = fresh as f64 / rounds as f64;
    assert!((rate - 0.9).abs() < 0.02, "rate {rate}");
  }

  #[test]
  fn test_allocate_falls_back() {
    let catalog = catalog(3);
    let mut rng = StdRng::seed_from_u64(1);

    let all: HashSet<i32> = (1..=3).collect();
    for _ in 0..100 {
      let (item, is_new) = allocate(&catalog, &all, 1.0, &mut rng).unwrap();
      assert!(!is_new && all.contains(&item.id));
    }

    for _ in 0..100 {
      assert!(allocate(&catalog, &HashSet::new(), 0.0, &mut rng).unwrap().1);
    }

    assert!(allocate(&[], &HashSet::new(), 0.5, &mut rng).is_none());
  }

  #[tokio::test]
  async fn test_draw_is_idempotent() {
    let db = fixtures::db().await;
    let config = Config::default();
    fixtures::user(&db, 1, 0).await;
    fixtures::items(&db, &["common"], 3).await;
    let sv = Draw::new(&db, &config);

    let first = sv.draw(1, day(1), None).await.unwrap();
    assert!(!first.replayed && first.is_new);

    let again = sv.draw(1, day(1), None).await.unwrap();
    assert!(again.replayed);
    assert_eq!(again.item.id, first.item.id);
    assert_eq!(again.is_new, first.is_new);

    let user = user::Entity::find_by_id(1).one(&db).await.unwrap().unwrap();
    assert_eq!(user.draw_count, 1);

    let next = sv.draw(1, day(2), None).await.unwrap();
    assert!(!next.replayed);
  }

  #[tokio::test]
  async fn test_concurrent_draws_write_once() {
    let db = fixtures::db().await;
    let config = Config::default();
    fixtures::user(&db, 1, 0).await;
    fixtures::items(&db, &["common"], 5).await;
    let sv = Draw::new(&db, &config);

    let outcomes = futures::future::join_all(
      (0..4).map(|_| sv.draw(1, day(1), None)),
    )
    .await;
    let ids: HashSet<i32> =
      outcomes.into_iter().map(|res| res.unwrap().item.id).collect();
    assert_eq!(ids.len(), 1);

    let draws = daily_draw::Entity::find().count(&db).await.unwrap();
    assert_eq!(draws, 1);
  }

  #[tokio::test]
  async fn test_first_draw_unlocks_first_item() {
    let db = fixtures::db().await;
    let config = Config::default();
    fixtures::user(&db, 1, 0).await;
    fixtures::items(&db, &["a", "b"], 2).await;

    let outcome = Draw::new(&db, &config).draw(1, day(1), None).await.unwrap();
    assert!(
      outcome.achievements.iter().any(|s| s.kind == AchievementKind::FirstItem)
    );
  }

  #[tokio::test]
  async fn test_empty_catalog() {
    let db = fixtures::db().await;
    let config = Config::default();
    fixtures::user(&db, 1, 0).await;

    let res = Draw::new(&db, &config).draw(1, day(1), None).await;
    assert!(matches!(res, Err(Error::EmptyCatalog)));
    assert_eq!(daily_draw::Entity::find().count(&db).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_geofence() {
    let db = fixtures::db().await;
    let config = Config { geofence: true, ..Config::default() };
    fixtures::user(&db, 1, 0).await;
    fixtures::items(&db, &["common"], 2).await;
    sv::Zone::new(&db)
      .add(sv::zone::NewZone {
        name: "Harbor".into(),
        latitude: 10.0,
        longitude: 10.0,
        radius_meters: 200.0,
        achievement_code: None,
      })
      .await
      .unwrap();
    let sv = Draw::new(&db, &config);

    assert!(matches!(
      sv.draw(1, day(1), None).await,
      Err(Error::Draw(error::Draw::LocationRequired))
    ));

    match sv.draw(1, day(1), Some(Coords::new(0.0, 0.0))).await {
      Err(Error::Draw(error::Draw::LocationRejected { zones })) => {
        assert_eq!(zones, ["Harbor"]);
      }
      other => panic!("unexpected {other:?}"),
    }
    assert_eq!(daily_draw::Entity::find().count(&db).await.unwrap(), 0);

    let outcome =
      sv.draw(1, day(1), Some(Coords::new(10.0005, 10.0))).await.unwrap();
    assert_eq!(outcome.zone.as_deref(), Some("Harbor"));
    assert_eq!(checkin::Entity::find().count(&db).await.unwrap(), 1);

    // Replays skip the location check entirely
    assert!(sv.draw(1, day(1), None).await.unwrap().replayed);
  }
}
