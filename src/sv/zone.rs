use serde::{Deserialize, Serialize};

use crate::{
  entity::{checkin, zone},
  prelude::*,
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewZone {
  pub name: String,
  pub latitude: f64,
  pub longitude: f64,
  #[serde(default = "default_radius")]
  pub radius_meters: f64,
  #[serde(default)]
  pub achievement_code: Option<String>,
}

fn default_radius() -> f64 {
  100.0
}

#[derive(Debug, Clone, Serialize)]
pub struct Visits {
  pub zone_id: i32,
  pub name: String,
  pub checkins: u64,
}

pub struct Zone<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Zone<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn all(&self) -> Result<Vec<zone::Model>> {
    all(self.db).await
  }

  pub async fn count(&self) -> Result<u64> {
    Ok(zone::Entity::find().count(self.db).await?)
  }

  pub async fn add(&self, zone: NewZone) -> Result<zone::Model> {
    let zone = zone::ActiveModel {
      name: Set(zone.name),
      latitude: Set(zone.latitude),
      longitude: Set(zone.longitude),
      radius_meters: Set(zone.radius_meters),
      achievement_code: Set(zone.achievement_code),
      ..Default::default()
    }
    .insert(self.db)
    .await?;

    debug!("Added zone #{} `{}`", zone.id, zone.name);
    Ok(zone)
  }

  /// Check-in totals for every zone, including unvisited ones.
  pub async fn visits(&self, user_id: i64) -> Result<Vec<Visits>> {
    let counts = checkins(self.db, user_id).await?;

    let visits = self
      .all()
      .await?
      .into_iter()
      .map(|zone| Visits {
        checkins: counts.get(&zone.id).copied().unwrap_or(0),
        zone_id: zone.id,
        name: zone.name,
      })
      .collect();
    Ok(visits)
  }
}

pub(crate) async fn all<C: ConnectionTrait>(db: &C) -> Result<Vec<zone::Model>> {
  let zones =
    zone::Entity::find().order_by_asc(zone::Column::Id).all(db).await?;
  Ok(zones)
}

/// Check-in count per zone id.
pub(crate) async fn checkins<C: ConnectionTrait>(
  db: &C,
  user_id: i64,
) -> Result<HashMap<i32, u64>> {
  let zones: Vec<i32> = checkin::Entity::find()
    .select_only()
    .column(checkin::Column::ZoneId)
    .filter(checkin::Column::UserId.eq(user_id))
    .into_tuple()
    .all(db)
    .await?;

  let mut counts = HashMap::new();
  for zone in zones {
    *counts.entry(zone).or_default() += 1;
  }
  Ok(counts)
}
