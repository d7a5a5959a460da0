//! Error types for the engagement server

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::entity::Tier;

#[derive(Debug, Error)]
pub enum Draw {
  #[error("Location is required to draw")]
  LocationRequired,
  #[error("Not inside any check-in zone")]
  LocationRejected { zones: Vec<String> },
}

#[derive(Debug, Error)]
pub enum Achievement {
  #[error("Achievement not found")]
  NotFound,
  #[error("Achievement is not unlocked")]
  NotUnlocked,
  #[error("Reward already claimed")]
  AlreadyClaimed,
  #[error("Achievement condition is no longer met")]
  ConditionNoLongerMet,
  #[error("Reward is granted automatically")]
  AutoClaimed,
}

#[derive(Debug, Error)]
pub enum Redeem {
  #[error("Already redeemed this month")]
  AlreadyRedeemed { tier: Tier, at: chrono::NaiveDateTime },
  #[error("Not enough exchange points: {available}/{required}")]
  InsufficientPoints { required: i32, available: i32 },
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error(transparent)]
  Draw(#[from] Draw),

  #[error(transparent)]
  Achievement(#[from] Achievement),

  #[error(transparent)]
  Redeem(#[from] Redeem),

  #[error("Item catalog is empty")]
  EmptyCatalog,

  #[error("User not found")]
  UserNotFound,

  #[error("Item not found")]
  ItemNotFound,

  #[error("Unauthorized")]
  Unauthorized,

  #[error("Too many requests")]
  RateLimited,

  #[error("Internal error: {0}")]
  Internal(String),
}

impl Error {
  pub fn status(&self) -> StatusCode {
    match self {
      Error::Draw(Draw::LocationRequired) => StatusCode::BAD_REQUEST,
      Error::Draw(Draw::LocationRejected { .. }) => StatusCode::FORBIDDEN,
      Error::Achievement(Achievement::NotFound) => StatusCode::NOT_FOUND,
      Error::Achievement(Achievement::AlreadyClaimed) => StatusCode::CONFLICT,
      Error::Achievement(_) => StatusCode::FORBIDDEN,
      Error::Redeem(Redeem::AlreadyRedeemed { .. }) => StatusCode::CONFLICT,
      Error::Redeem(Redeem::InsufficientPoints { .. }) => StatusCode::FORBIDDEN,
      Error::UserNotFound | Error::ItemNotFound => StatusCode::NOT_FOUND,
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
      Error::Database(_)
      | Error::EmptyCatalog
      | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();

    let body = if status.is_server_error() {
      tracing::error!("Request failed: {self}");
      json::json!({ "success": false, "error": "Internal error" })
    } else {
      let mut body = json::json!({ "success": false, "error": self.to_string() });
      match &self {
        Error::Draw(Draw::LocationRejected { zones }) => {
          body["zones"] = json::json!(zones);
        }
        Error::Redeem(Redeem::AlreadyRedeemed { tier, at }) => {
          body["tier"] = json::json!(tier);
          body["redeemed_at"] = json::json!(crate::utils::format_date(*at));
        }
        _ => {}
      }
      body
    };

    (status, axum::Json(body)).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
