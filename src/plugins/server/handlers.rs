use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use super::extract::Caller;
use crate::{
  entity::{Tier, item, user, zone},
  geo::Coords,
  prelude::*,
  state::AppState,
  sv::{
    achievement::{Claimed, Status},
    catalog::Detail,
    draw::Outcome,
    redeem::{Info, Receipt},
    user::Owned,
    zone::Visits,
  },
};

#[derive(Debug, Serialize)]
pub struct Success<T> {
  pub success: bool,
  pub data: T,
}

fn ok<T>(data: T) -> Json<Success<T>> {
  Json(Success { success: true, data })
}

type Reply<T> = Result<Json<Success<T>>>;

#[derive(Debug, Serialize)]
pub struct HealthRes {
  pub status: &'static str,
}

pub async fn health(State(app): State<Arc<AppState>>) -> Json<HealthRes> {
  let status = match app.db.ping().await {
    Ok(()) => "ok",
    Err(err) => {
      warn!("Health check failed: {err}");
      "degraded"
    }
  };
  Json(HealthRes { status })
}

pub async fn profile(Caller(user): Caller) -> Reply<user::Model> {
  Ok(ok(user))
}

pub async fn items(
  State(app): State<Arc<AppState>>,
  Caller(user): Caller,
) -> Reply<Vec<Owned>> {
  Ok(ok(app.sv().user.items(user.id).await?))
}

pub async fn catalog(
  State(app): State<Arc<AppState>>,
) -> Reply<Vec<item::Model>> {
  Ok(ok(app.sv().catalog.all().await?))
}

pub async fn item(
  State(app): State<Arc<AppState>>,
  Caller(user): Caller,
  Path(id): Path<i32>,
) -> Reply<Detail> {
  Ok(ok(app.sv().catalog.detail(user.id, id).await?))
}

#[derive(Debug, Serialize)]
pub struct CheckRes {
  pub day: Date,
  pub has_drawn: bool,
  pub draw: Option<Outcome>,
}

pub async fn check_draw(
  State(app): State<Arc<AppState>>,
  Caller(user): Caller,
) -> Reply<CheckRes> {
  let day = app.config.clock.logical_day(Utc::now());
  let draw = app.sv().draw.today(user.id, day).await?;
  Ok(ok(CheckRes { day, has_drawn: draw.is_some(), draw }))
}

#[derive(Debug, Default, Deserialize)]
pub struct DrawReq {
  pub latitude: Option<f64>,
  pub longitude: Option<f64>,
}

impl DrawReq {
  fn coords(&self) -> Option<Coords> {
    Some(Coords::new(self.latitude?, self.longitude?))
  }
}

pub async fn draw(
  State(app): State<Arc<AppState>>,
  Caller(user): Caller,
  req: Option<Json<DrawReq>>,
) -> Reply<Outcome> {
  let req = req.map(|Json(req)| req).unwrap_or_default();
  let day = app.config.clock.logical_day(Utc::now());

  Ok(ok(app.sv().draw.draw(user.id, day, req.coords()).await?))
}

pub async fn achievements(
  State(app): State<Arc<AppState>>,
  Caller(user): Caller,
) -> Reply<Vec<Status>> {
  Ok(ok(app.sv().achievement.recompute(user.id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ClaimReq {
  pub achievement_id: i32,
}

pub async fn claim(
  State(app): State<Arc<AppState>>,
  Caller(user): Caller,
  Json(req): Json<ClaimReq>,
) -> Reply<Claimed> {
  Ok(ok(app.sv().achievement.claim(user.id, req.achievement_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct RedeemReq {
  pub tier: Tier,
}

pub async fn redeem(
  State(app): State<Arc<AppState>>,
  Caller(user): Caller,
  Json(req): Json<RedeemReq>,
) -> Reply<Receipt> {
  let month = app.config.clock.month(Utc::now());
  Ok(ok(app.sv().redeem.redeem(user.id, req.tier, &month).await?))
}

pub async fn redeem_info(
  State(app): State<Arc<AppState>>,
  Caller(user): Caller,
) -> Reply<Info> {
  let month = app.config.clock.month(Utc::now());
  Ok(ok(app.sv().redeem.info(user.id, &month).await?))
}

#[derive(Debug, Serialize)]
pub struct LocationSetting {
  pub geofence_enabled: bool,
}

pub async fn location_setting(
  State(app): State<Arc<AppState>>,
) -> Json<Success<LocationSetting>> {
  ok(LocationSetting { geofence_enabled: app.config.geofence })
}

pub async fn locations(
  State(app): State<Arc<AppState>>,
) -> Reply<Vec<zone::Model>> {
  Ok(ok(app.sv().zone.all().await?))
}

pub async fn checkins(
  State(app): State<Arc<AppState>>,
  Caller(user): Caller,
) -> Reply<Vec<Visits>> {
  Ok(ok(app.sv().zone.visits(user.id).await?))
}
