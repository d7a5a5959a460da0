use std::{net::SocketAddr, sync::Arc};

use axum::{
  extract::{ConnectInfo, FromRequestParts, Request, State},
  http::{header, request::Parts},
  middleware::Next,
  response::Response,
};

use crate::{entity::user, prelude::*, state::AppState};

/// Authenticated caller, created on first sight.
pub struct Caller(pub user::Model);

impl FromRequestParts<Arc<AppState>> for Caller {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self> {
    let token = parts
      .headers
      .get(header::AUTHORIZATION)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.strip_prefix("Bearer "))
      .ok_or(Error::Unauthorized)?;

    let identity = app.auth.validate(token.trim()).ok_or(Error::Unauthorized)?;
    let user = app.sv().user.get_or_create(&identity).await?;
    Ok(Self(user))
  }
}

/// Rate-limit key of a request: a non-empty forwarded-for header as sent,
/// otherwise the peer address.
pub fn client_key(req: &Request) -> String {
  if let Some(forwarded) = req
    .headers()
    .get("x-forwarded-for")
    .and_then(|value| value.to_str().ok())
    .map(str::trim)
    .filter(|value| !value.is_empty())
  {
    return forwarded.to_owned();
  }

  req
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ConnectInfo(addr)| addr.ip().to_string())
    .unwrap_or_else(|| String::from("unknown"))
}

pub async fn throttle(
  State(app): State<Arc<AppState>>,
  req: Request,
  next: Next,
) -> Result<Response> {
  let key = client_key(&req);
  if !app.governor.check(&key) {
    debug!("Rate limited `{key}` on {}", req.uri().path());
    return Err(Error::RateLimited);
  }
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use axum::body::Body;

  use super::*;

  fn request(forwarded: Option<&str>) -> Request {
    let mut builder = Request::builder().uri("/health");
    if let Some(forwarded) = forwarded {
      builder = builder.header("x-forwarded-for", forwarded);
    }
    let mut req = builder.body(Body::empty()).unwrap();
    req
      .extensions_mut()
      .insert(ConnectInfo(SocketAddr::from(([192, 168, 0, 9], 4000))));
    req
  }

  #[test]
  fn test_client_key() {
    assert_eq!(client_key(&request(Some(" 10.0.0.1 "))), "10.0.0.1");
    assert_eq!(client_key(&request(None)), "192.168.0.9");
  }

  #[test]
  fn test_blank_forwarded_for_uses_peer() {
    assert_eq!(client_key(&request(Some(""))), "192.168.0.9");
    assert_eq!(client_key(&request(Some("   "))), "192.168.0.9");
  }
}
