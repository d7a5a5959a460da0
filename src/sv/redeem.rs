use serde::Serialize;

use crate::{
  entity::{Tier, redemption, user},
  error,
  prelude::*,
  state::Config,
  sv,
};

#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
  pub month: String,
  pub tier: Tier,
  pub cost: i32,
  pub redeemed_at: DateTime,
  pub exchange_points: i32,
}

/// Redemption status of the current month
#[derive(Debug, Clone, Serialize)]
pub struct Info {
  pub month: String,
  pub has_redeemed: bool,
  pub tier: Option<Tier>,
  pub redeemed_at: Option<DateTime>,
  pub exchange_points: i32,
  pub basic_cost: i32,
  pub premium_cost: i32,
}

pub struct Redeem<'a> {
  db: &'a DatabaseConnection,
  config: &'a Config,
}

impl<'a> Redeem<'a> {
  pub fn new(db: &'a DatabaseConnection, config: &'a Config) -> Self {
    Self { db, config }
  }

  pub fn cost(&self, tier: Tier) -> i32 {
    match tier {
      Tier::Basic => self.config.tiers.basic,
      Tier::Premium => self.config.tiers.premium,
    }
  }

  async fn existing<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    month: &str,
  ) -> Result<Option<redemption::Model>> {
    let found = redemption::Entity::find_by_id((user_id, month.to_owned()))
      .one(db)
      .await?;
    Ok(found)
  }

  /// Spends exchange points on this month's single redemption.
  pub async fn redeem(
    &self,
    user_id: i64,
    tier: Tier,
    month: &str,
  ) -> Result<Receipt> {
    let cost = self.cost(tier);
    let txn = self.db.begin().await?;

    if let Some(prev) = Self::existing(&txn, user_id, month).await? {
      return Err(
        error::Redeem::AlreadyRedeemed { tier: prev.tier, at: prev.redeemed_at }
          .into(),
      );
    }

    let now = utils::now();
    let record = redemption::ActiveModel {
      user_id: Set(user_id),
      month: Set(month.to_owned()),
      tier: Set(tier),
      cost: Set(cost),
      redeemed_at: Set(now),
    };
    if !utils::insert_new(&txn, record).await? {
      txn.rollback().await?;
      let prev = Self::existing(self.db, user_id, month)
        .await?
        .ok_or_else(|| Error::Internal(format!("redemption {month} vanished")))?;
      return Err(
        error::Redeem::AlreadyRedeemed { tier: prev.tier, at: prev.redeemed_at }
          .into(),
      );
    }

    if !sv::user::debit(&txn, user_id, cost).await? {
      let available = user::Entity::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or(Error::UserNotFound)?
        .exchange_points;
      // Drops the redemption row written above
      txn.rollback().await?;
      return Err(
        error::Redeem::InsufficientPoints { required: cost, available }.into(),
      );
    }

    let exchange_points = user::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?
      .exchange_points;
    txn.commit().await?;

    info!("User {user_id} redeemed {tier:?} for {month}, -{cost} points");
    Ok(Receipt {
      month: month.to_owned(),
      tier,
      cost,
      redeemed_at: now,
      exchange_points,
    })
  }

  pub async fn info(&self, user_id: i64, month: &str) -> Result<Info> {
    let user = user::Entity::find_by_id(user_id)
      .one(self.db)
      .await?
      .ok_or(Error::UserNotFound)?;
    let prev = Self::existing(self.db, user_id, month).await?;

    Ok(Info {
      month: month.to_owned(),
      has_redeemed: prev.is_some(),
      tier: prev.as_ref().map(|prev| prev.tier),
      redeemed_at: prev.map(|prev| prev.redeemed_at),
      exchange_points: user.exchange_points,
      basic_cost: self.config.tiers.basic,
      premium_cost: self.config.tiers.premium,
    })
  }
}
