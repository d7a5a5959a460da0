//! Achievement evaluation.
//!
//! Predicates are recomputed from persisted facts (ownership, draw days,
//! check-ins) every time; nothing is cached between calls. Unlocked but
//! unclaimed rows are revoked when their predicate stops holding, claimed
//! rows are final.

use std::collections::HashSet;

use sea_orm::sea_query::Expr;
use serde::Serialize;

use crate::{
  entity::{
    AchievementKind, achievement, daily_draw, item, milestone, ownership,
    user_achievement, zone,
  },
  error,
  prelude::*,
  state::Config,
  sv,
};

/// Facts about one user that the predicates read.
#[derive(Debug, Default, Clone)]
pub struct Progress {
  owned: HashSet<i32>,
  /// series -> item ids
  series: HashMap<String, Vec<i32>>,
  draw_days: u64,
  /// zone id -> check-in days
  checkins: HashMap<i32, u64>,
}

impl Progress {
  pub async fn load<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<Self> {
    let owned: Vec<i32> = ownership::Entity::find()
      .select_only()
      .column(ownership::Column::ItemId)
      .filter(ownership::Column::UserId.eq(user_id))
      .into_tuple()
      .all(db)
      .await?;

    let catalog: Vec<(i32, String)> = item::Entity::find()
      .select_only()
      .column(item::Column::Id)
      .column(item::Column::Series)
      .into_tuple()
      .all(db)
      .await?;

    let draw_days = daily_draw::Entity::find()
      .filter(daily_draw::Column::UserId.eq(user_id))
      .count(db)
      .await?;

    let mut series: HashMap<String, Vec<i32>> = HashMap::new();
    for (id, name) in catalog {
      series.entry(name).or_default().push(id);
    }

    Ok(Self {
      owned: owned.into_iter().collect(),
      series,
      draw_days,
      checkins: sv::zone::checkins(db, user_id).await?,
    })
  }

  pub fn owned_count(&self) -> u64 {
    self.owned.len() as u64
  }

  fn owned_in(&self, ids: &[i32]) -> u64 {
    ids.iter().filter(|id| self.owned.contains(id)).count() as u64
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tally {
  pub current: u64,
  pub target: u64,
}

/// Unlock predicate of an achievement type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
  Owns(u64),
  DrawDays(u64),
  CompleteSeries,
  CompleteCatalog,
  /// Every `n` owned items
  Milestone(u64),
  /// Check-in days at a zone; `None` when no zone links the achievement
  Checkins { zone: Option<i32>, target: u64 },
}

impl Condition {
  pub fn of(
    ty: &achievement::Model,
    zones: &[zone::Model],
    interval: u32,
  ) -> Self {
    let target = |default: u64| {
      ty.target
        .and_then(|t| u64::try_from(t).ok())
        .filter(|&t| t > 0)
        .unwrap_or(default)
    };

    match ty.kind {
      AchievementKind::FirstItem => Self::Owns(target(1)),
      AchievementKind::DrawDays => Self::DrawDays(target(1)),
      AchievementKind::CompleteSeries => Self::CompleteSeries,
      AchievementKind::CompleteCatalog => Self::CompleteCatalog,
      AchievementKind::Milestone => Self::Milestone(u64::from(interval.max(1))),
      AchievementKind::ZoneCheckins => Self::Checkins {
        zone: linked_zone(ty, zones).map(|zone| zone.id),
        target: target(1),
      },
    }
  }

  pub fn holds(&self, p: &Progress) -> bool {
    match *self {
      Self::Owns(n) => p.owned_count() >= n,
      Self::DrawDays(n) => p.draw_days >= n,
      Self::CompleteSeries => p
        .series
        .values()
        .any(|ids| p.owned_in(ids) == ids.len() as u64),
      Self::CompleteCatalog => {
        !p.series.is_empty()
          && p.series.values().all(|ids| p.owned_in(ids) == ids.len() as u64)
      }
      Self::Milestone(n) => {
        let owned = p.owned_count();
        owned >= n && owned % n == 0
      }
      Self::Checkins { zone: Some(zone), target } => {
        p.checkins.get(&zone).copied().unwrap_or(0) >= target
      }
      Self::Checkins { zone: None, .. } => false,
    }
  }

  pub fn tally(&self, p: &Progress) -> Tally {
    let (current, target) = match *self {
      Self::Owns(n) => (p.owned_count(), n),
      Self::DrawDays(n) => (p.draw_days, n),
      // Series closest to completion
      Self::CompleteSeries => p
        .series
        .values()
        .map(|ids| (p.owned_in(ids), ids.len() as u64))
        .max_by(|(a, a_len), (b, b_len)| (a * b_len).cmp(&(b * a_len)))
        .unwrap_or((0, 0)),
      Self::CompleteCatalog => {
        let ids = p.series.values().flatten().copied().collect::<Vec<_>>();
        (p.owned_in(&ids), ids.len() as u64)
      }
      Self::Milestone(n) => {
        let owned = p.owned_count();
        (owned, owned.saturating_sub(1) / n * n + n)
      }
      Self::Checkins { zone, target } => {
        let count = zone.and_then(|zone| p.checkins.get(&zone).copied());
        (count.unwrap_or(0), target)
      }
    };
    Tally { current, target }
  }
}

fn linked_zone<'z>(
  ty: &achievement::Model,
  zones: &'z [zone::Model],
) -> Option<&'z zone::Model> {
  zones.iter().find(|zone| zone.achievement_code.as_deref() == Some(&ty.code))
}

/// Achievement as shown to a user
#[derive(Debug, Clone, Serialize)]
pub struct Status {
  pub id: i32,
  pub code: String,
  pub name: String,
  pub description: String,
  pub reward_points: i32,
  pub kind: AchievementKind,
  pub unlocked: bool,
  pub unlocked_at: Option<DateTime>,
  pub claimed: bool,
  pub claimed_at: Option<DateTime>,
  pub auto_claimed: bool,
  pub progress: Tally,
}

/// Everything needed to evaluate one user, read inside a single transaction.
struct Ledger {
  types: Vec<achievement::Model>,
  zones: Vec<zone::Model>,
  states: HashMap<i32, user_achievement::Model>,
  progress: Progress,
  /// Milestone interval, rendered into its description
  interval: u32,
}

impl Ledger {
  async fn load<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    interval: u32,
  ) -> Result<Self> {
    let types = achievement::Entity::find()
      .order_by_asc(achievement::Column::Id)
      .all(db)
      .await?;

    let states = user_achievement::Entity::find()
      .filter(user_achievement::Column::UserId.eq(user_id))
      .all(db)
      .await?
      .into_iter()
      .map(|state| (state.achievement_id, state))
      .collect();

    Ok(Self {
      types,
      zones: sv::zone::all(db).await?,
      states,
      progress: Progress::load(db, user_id).await?,
      interval,
    })
  }

  fn status(
    &self,
    ty: &achievement::Model,
    state: Option<&user_achievement::Model>,
    cond: Condition,
  ) -> Status {
    let place = linked_zone(ty, &self.zones)
      .map_or("a check-in zone", |zone| zone.name.as_str());

    Status {
      id: ty.id,
      code: ty.code.clone(),
      name: ty.name.clone(),
      description: ty
        .description
        .replace("{zone}", place)
        .replace("{n}", &self.interval.to_string()),
      reward_points: ty.reward_points,
      kind: ty.kind,
      unlocked: state.is_some_and(|s| s.is_unlocked()),
      unlocked_at: state.and_then(|s| s.unlocked_at),
      claimed: state.is_some_and(|s| s.is_claimed()),
      claimed_at: state.and_then(|s| s.claimed_at),
      auto_claimed: ty.kind == AchievementKind::Milestone,
      progress: cond.tally(&self.progress),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Claimed {
  pub achievement_id: i32,
  pub reward_points: i32,
  pub exchange_points: i32,
}

pub struct Achievement<'a> {
  db: &'a DatabaseConnection,
  config: &'a Config,
}

impl<'a> Achievement<'a> {
  pub fn new(db: &'a DatabaseConnection, config: &'a Config) -> Self {
    Self { db, config }
  }

  fn condition(&self, ty: &achievement::Model, zones: &[zone::Model]) -> Condition {
    Condition::of(ty, zones, self.config.milestone_interval)
  }

  /// Unlocks every achievement whose predicate now holds and settles
  /// milestone rewards. Returns what changed in this call.
  pub async fn evaluate(&self, user_id: i64) -> Result<Vec<Status>> {
    let txn = self.db.begin().await?;
    let ledger =
      Ledger::load(&txn, user_id, self.config.milestone_interval).await?;
    let now = utils::now();

    let mut changed = Vec::new();
    for ty in &ledger.types {
      let cond = self.condition(ty, &ledger.zones);

      if ty.kind == AchievementKind::Milestone {
        if let Some(status) =
          self.settle_milestones(&txn, user_id, ty, &ledger, now).await?
        {
          changed.push(status);
        }
        continue;
      }

      if ledger.states.contains_key(&ty.id) || !cond.holds(&ledger.progress) {
        continue;
      }

      let state = user_achievement::Model {
        user_id,
        achievement_id: ty.id,
        unlocked_at: Some(now),
        claimed_at: None,
      };
      let active: user_achievement::ActiveModel = state.clone().into();
      if utils::insert_new(&txn, active).await? {
        info!("User {user_id} unlocked `{}`", ty.code);
        changed.push(ledger.status(ty, Some(&state), cond));
      }
    }

    txn.commit().await?;
    Ok(changed)
  }

  /// Grants the milestone reward once per reached threshold, including any
  /// skipped ones.
  async fn settle_milestones<C: ConnectionTrait>(
    &self,
    txn: &C,
    user_id: i64,
    ty: &achievement::Model,
    ledger: &Ledger,
    now: DateTime,
  ) -> Result<Option<Status>> {
    let interval = self.config.milestone_interval.max(1) as u64;
    let reached = ledger.progress.owned_count() / interval;
    if reached == 0 {
      return Ok(None);
    }

    let settled: HashSet<i32> = milestone::Entity::find()
      .select_only()
      .column(milestone::Column::ItemCount)
      .filter(milestone::Column::UserId.eq(user_id))
      .into_tuple::<i32>()
      .all(txn)
      .await?
      .into_iter()
      .collect();

    let mut granted = 0;
    for threshold in (1..=reached).map(|k| k * interval) {
      let threshold = i32::try_from(threshold)
        .map_err(|_| Error::Internal(format!("milestone {threshold} overflows")))?;
      if settled.contains(&threshold) {
        continue;
      }

      let claim = milestone::ActiveModel {
        user_id: Set(user_id),
        item_count: Set(threshold),
        claimed_at: Set(now),
      };
      if utils::insert_new(txn, claim).await? {
        granted += 1;
      }
    }
    if granted == 0 {
      return Ok(None);
    }

    sv::user::credit(txn, user_id, ty.reward_points * granted).await?;

    let state = match ledger.states.get(&ty.id) {
      Some(prev) => {
        let mut state: user_achievement::ActiveModel = prev.clone().into();
        state.unlocked_at = Set(prev.unlocked_at.or(Some(now)));
        state.claimed_at = Set(Some(now));
        state.update(txn).await?
      }
      None => {
        let state = user_achievement::Model {
          user_id,
          achievement_id: ty.id,
          unlocked_at: Some(now),
          claimed_at: Some(now),
        };
        utils::insert_new(txn, user_achievement::ActiveModel::from(state.clone()))
          .await?;
        state
      }
    };

    info!(
      "User {user_id} reached {granted} milestone(s), +{} points",
      ty.reward_points * granted
    );
    let cond = self.condition(ty, &ledger.zones);
    Ok(Some(ledger.status(ty, Some(&state), cond)))
  }

  /// Full achievement list for a user.
  ///
  /// Runs [`Self::evaluate`] first, then drops unlocks that are no longer
  /// backed by the user's progress and have not been claimed yet.
  pub async fn recompute(&self, user_id: i64) -> Result<Vec<Status>> {
    self.evaluate(user_id).await?;

    let txn = self.db.begin().await?;
    let ledger =
      Ledger::load(&txn, user_id, self.config.milestone_interval).await?;

    let mut list = Vec::with_capacity(ledger.types.len());
    for ty in &ledger.types {
      let cond = self.condition(ty, &ledger.zones);
      let mut state = ledger.states.get(&ty.id);

      if let Some(current) = state
        && current.is_unlocked()
        && !current.is_claimed()
        && !cond.holds(&ledger.progress)
      {
        let res = user_achievement::Entity::delete_many()
          .filter(user_achievement::Column::UserId.eq(user_id))
          .filter(user_achievement::Column::AchievementId.eq(ty.id))
          .filter(user_achievement::Column::ClaimedAt.is_null())
          .exec(&txn)
          .await?;
        if res.rows_affected > 0 {
          warn!("Revoked stale unlock `{}` for user {user_id}", ty.code);
          state = None;
        }
      }

      list.push(ledger.status(ty, state, cond));
    }

    txn.commit().await?;
    Ok(list)
  }

  /// Claims the reward of an unlocked achievement.
  pub async fn claim(&self, user_id: i64, achievement_id: i32) -> Result<Claimed> {
    let txn = self.db.begin().await?;

    let ty = achievement::Entity::find_by_id(achievement_id)
      .one(&txn)
      .await?
      .ok_or(error::Achievement::NotFound)?;
    if ty.kind == AchievementKind::Milestone {
      return Err(error::Achievement::AutoClaimed.into());
    }

    let state = user_achievement::Entity::find_by_id((user_id, achievement_id))
      .one(&txn)
      .await?;
    match state {
      Some(state) if state.is_claimed() => {
        return Err(error::Achievement::AlreadyClaimed.into());
      }
      Some(state) if state.is_unlocked() => {}
      _ => return Err(error::Achievement::NotUnlocked.into()),
    }

    let zones = sv::zone::all(&txn).await?;
    let progress = Progress::load(&txn, user_id).await?;
    if !self.condition(&ty, &zones).holds(&progress) {
      return Err(error::Achievement::ConditionNoLongerMet.into());
    }

    let res = user_achievement::Entity::update_many()
      .col_expr(user_achievement::Column::ClaimedAt, Expr::value(utils::now()))
      .filter(user_achievement::Column::UserId.eq(user_id))
      .filter(user_achievement::Column::AchievementId.eq(achievement_id))
      .filter(user_achievement::Column::ClaimedAt.is_null())
      .exec(&txn)
      .await?;
    if res.rows_affected == 0 {
      return Err(error::Achievement::AlreadyClaimed.into());
    }

    sv::user::credit(&txn, user_id, ty.reward_points).await?;
    let exchange_points = crate::entity::user::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?
      .exchange_points;

    txn.commit().await?;
    info!("User {user_id} claimed `{}` for {} points", ty.code, ty.reward_points);

    Ok(Claimed {
      achievement_id,
      reward_points: ty.reward_points,
      exchange_points,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::{checkin, user},
    sv::fixtures,
  };

  async fn by_code(db: &DatabaseConnection, code: &str) -> achievement::Model {
    achievement::Entity::find()
      .filter(achievement::Column::Code.eq(code))
      .one(db)
      .await
      .unwrap()
      .unwrap()
  }

  fn find<'s>(list: &'s [Status], code: &str) -> &'s Status {
    list.iter().find(|s| s.code == code).unwrap()
  }

  #[tokio::test]
  async fn test_first_item_unlock_and_claim() {
    let db = fixtures::db().await;
    let config = Config::default();
    fixtures::user(&db, 1, 0).await;
    let ids = fixtures::items(&db, &["common"], 3).await;
    let sv = Achievement::new(&db, &config);

    let list = sv.recompute(1).await.unwrap();
    assert!(!find(&list, "first_item").unlocked);

    fixtures::give(&db, 1, &ids[..1]).await;
    let changed = sv.evaluate(1).await.unwrap();
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].code, "first_item");

    let first = by_code(&db, "first_item").await;
    let claimed = sv.claim(1, first.id).await.unwrap();
    assert_eq!(claimed.reward_points, first.reward_points);
    assert_eq!(fixtures::points(&db, 1).await, first.reward_points);

    assert!(matches!(
      sv.claim(1, first.id).await,
      Err(Error::Achievement(error::Achievement::AlreadyClaimed))
    ));
  }

  #[tokio::test]
  async fn test_claim_errors() {
    let db = fixtures::db().await;
    let config = Config::default();
    fixtures::user(&db, 1, 0).await;
    let sv = Achievement::new(&db, &config);

    let first = by_code(&db, "first_item").await;
    assert!(matches!(
      sv.claim(1, first.id).await,
      Err(Error::Achievement(error::Achievement::NotUnlocked))
    ));
    assert!(matches!(
      sv.claim(1, 9999).await,
      Err(Error::Achievement(error::Achievement::NotFound))
    ));

    let milestone = by_code(&db, "milestone").await;
    assert!(matches!(
      sv.claim(1, milestone.id).await,
      Err(Error::Achievement(error::Achievement::AutoClaimed))
    ));
  }

  #[tokio::test]
  async fn test_milestone_settles_once() {
    let db = fixtures::db().await;
    let config = Config { milestone_interval: 3, ..Config::default() };
    fixtures::user(&db, 1, 0).await;
    let ids = fixtures::items(&db, &["common"], 7).await;
    let reward = by_code(&db, "milestone").await.reward_points;
    let sv = Achievement::new(&db, &config);

    // Skipped straight past two thresholds
    fixtures::give(&db, 1, &ids[..6]).await;
    sv.evaluate(1).await.unwrap();
    let base = fixtures::points(&db, 1).await;

    sv.evaluate(1).await.unwrap();
    sv.recompute(1).await.unwrap();
    assert_eq!(fixtures::points(&db, 1).await, base);

    let claims = milestone::Entity::find()
      .filter(milestone::Column::UserId.eq(1))
      .count(&db)
      .await
      .unwrap();
    assert_eq!(claims, 2);

    let list = sv.recompute(1).await.unwrap();
    let status = find(&list, "milestone");
    assert!(status.claimed && status.auto_claimed);
    assert_eq!(status.progress, Tally { current: 6, target: 6 });
    assert!(status.description.contains("every 3 distinct items"));
    assert_eq!(base, 2 * reward);

    fixtures::give(&db, 1, &ids[6..]).await;
    sv.evaluate(1).await.unwrap();
    assert_eq!(fixtures::points(&db, 1).await, base);
  }

  #[tokio::test]
  async fn test_stale_unlock_is_revoked() {
    let db = fixtures::db().await;
    let config = Config::default();
    fixtures::user(&db, 1, 0).await;
    let ids = fixtures::items(&db, &["spring"], 2).await;
    fixtures::give(&db, 1, &ids).await;
    let sv = Achievement::new(&db, &config);

    let list = sv.recompute(1).await.unwrap();
    assert!(find(&list, "complete_series").unlocked);

    // Series grew, so it is no longer complete
    fixtures::items(&db, &["spring"], 1).await;
    let list = sv.recompute(1).await.unwrap();
    let series = find(&list, "complete_series");
    assert!(!series.unlocked);
    assert_eq!(series.progress, Tally { current: 2, target: 3 });

    let id = by_code(&db, "complete_series").await.id;
    assert!(matches!(
      sv.claim(1, id).await,
      Err(Error::Achievement(error::Achievement::NotUnlocked))
    ));
  }

  #[tokio::test]
  async fn test_claimed_unlock_survives() {
    let db = fixtures::db().await;
    let config = Config::default();
    fixtures::user(&db, 1, 0).await;
    let ids = fixtures::items(&db, &["spring"], 1).await;
    fixtures::give(&db, 1, &ids).await;
    let sv = Achievement::new(&db, &config);

    sv.evaluate(1).await.unwrap();
    let id = by_code(&db, "complete_series").await.id;
    sv.claim(1, id).await.unwrap();

    fixtures::items(&db, &["spring"], 1).await;
    let list = sv.recompute(1).await.unwrap();
    let series = find(&list, "complete_series");
    assert!(series.unlocked && series.claimed);
  }

  #[tokio::test]
  async fn test_condition_no_longer_met() {
    let db = fixtures::db().await;
    let config = Config::default();
    fixtures::user(&db, 1, 0).await;
    let ids = fixtures::items(&db, &["spring"], 1).await;
    fixtures::give(&db, 1, &ids).await;
    let sv = Achievement::new(&db, &config);

    sv.evaluate(1).await.unwrap();
    fixtures::items(&db, &["spring"], 1).await;

    let id = by_code(&db, "complete_series").await.id;
    assert!(matches!(
      sv.claim(1, id).await,
      Err(Error::Achievement(error::Achievement::ConditionNoLongerMet))
    ));
  }

  #[tokio::test]
  async fn test_zone_checkins() {
    let db = fixtures::db().await;
    let config = Config::default();
    fixtures::user(&db, 1, 0).await;
    let zone = sv::Zone::new(&db)
      .add(sv::zone::NewZone {
        name: "Old Gate".into(),
        latitude: 0.0,
        longitude: 0.0,
        radius_meters: 100.0,
        achievement_code: Some("zone_a_15".into()),
      })
      .await
      .unwrap();

    let start = Date::from_ymd_opt(2026, 3, 1).unwrap();
    for offset in 0..15 {
      checkin::ActiveModel {
        user_id: Set(1),
        zone_id: Set(zone.id),
        checkin_date: Set(start + TimeDelta::days(offset)),
        latitude: Set(0.0),
        longitude: Set(0.0),
        created_at: Set(utils::now()),
      }
      .insert(&db)
      .await
      .unwrap();
    }

    let list = Achievement::new(&db, &config).recompute(1).await.unwrap();
    let linked = find(&list, "zone_a_15");
    assert!(linked.unlocked && !linked.claimed);
    assert!(linked.description.contains("Old Gate"));
    assert_eq!(linked.progress, Tally { current: 15, target: 15 });

    let unlinked = find(&list, "zone_b_15");
    assert!(!unlinked.unlocked);
  }

  #[test]
  fn test_milestone_tally() {
    let progress = |owned: i32| Progress {
      owned: (0..owned).collect(),
      ..Progress::default()
    };
    let cond = Condition::Milestone(7);

    assert_eq!(cond.tally(&progress(0)).target, 7);
    assert_eq!(cond.tally(&progress(7)).target, 7);
    assert_eq!(cond.tally(&progress(8)).target, 14);
    assert!(cond.holds(&progress(14)));
    assert!(!cond.holds(&progress(15)));
  }

  #[tokio::test]
  async fn test_draw_days() {
    let db = fixtures::db().await;
    let config = Config::default();
    fixtures::user(&db, 1, 0).await;
    let ids = fixtures::items(&db, &["common"], 1).await;

    let start = Date::from_ymd_opt(2026, 3, 1).unwrap();
    for offset in 0..3 {
      daily_draw::ActiveModel {
        user_id: Set(1),
        draw_date: Set(start + TimeDelta::days(offset)),
        item_id: Set(ids[0]),
        is_new: Set(offset == 0),
        created_at: Set(utils::now()),
      }
      .insert(&db)
      .await
      .unwrap();
    }

    let list = Achievement::new(&db, &config).recompute(1).await.unwrap();
    assert!(find(&list, "pilgrim_nova").unlocked);

    let user = user::Entity::find_by_id(1).one(&db).await.unwrap().unwrap();
    assert_eq!(user.exchange_points, 0);
  }
}
