mod extract;
mod handlers;

use std::{net::SocketAddr, sync::Arc};

use axum::{
  Router, middleware,
  routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

pub fn router(app: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    .route("/api/user/profile", get(handlers::profile))
    .route("/api/user/items", get(handlers::items))
    .route("/api/items", get(handlers::catalog))
    .route("/api/items/{id}", get(handlers::item))
    .route("/api/draw", post(handlers::draw))
    .route("/api/draw/check", get(handlers::check_draw))
    .route("/api/achievements", get(handlers::achievements))
    .route("/api/achievements/claim", post(handlers::claim))
    .route("/api/redeem", post(handlers::redeem))
    .route("/api/redeem/info", get(handlers::redeem_info))
    .route("/api/location/setting", get(handlers::location_setting))
    .route("/api/location/checkins", get(handlers::checkins))
    .route("/api/locations", get(handlers::locations))
    .layer(
      ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(app.clone(), extract::throttle))
        .layer(
          CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        ),
    )
    .with_state(app)
}

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));
    let router = router(app)
      .into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP server listening on {addr}");

    axum::serve(listener, router).await.context("Axum server error")
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
  };
  use tower::ServiceExt;

  use super::*;
  use crate::{
    auth::{self, Jwt},
    governor::Quota,
    state::Config,
    sv::fixtures,
  };

  const SECRET: &str = "test-secret";

  async fn app(config: Config) -> Router {
    let db = fixtures::db().await;
    fixtures::items(&db, &["common"], 3).await;
    let state = AppState::with_db(db, config, Arc::new(Jwt::new(SECRET)));
    router(Arc::new(state))
  }

  fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut req =
      Request::builder().uri(uri).header("x-forwarded-for", "10.0.0.1");
    if let Some(token) = token {
      req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    req.body(Body::empty()).unwrap()
  }

  fn post(uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
      .method("POST")
      .uri(uri)
      .header("x-forwarded-for", "10.0.0.1")
      .header(header::AUTHORIZATION, format!("Bearer {token}"))
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_owned()))
      .unwrap()
  }

  async fn body(res: axum::response::Response) -> json::Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn test_health() {
    let router = app(Config::default()).await;

    let res = router.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body(res).await["status"], "ok");
  }

  #[tokio::test]
  async fn test_requires_token() {
    let router = app(Config::default()).await;

    let res =
      router.clone().oneshot(get("/api/user/profile", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(res).await["success"], false);

    let forged = auth::token("other-secret", 1, 60);
    let res =
      router.oneshot(get("/api/user/profile", Some(&forged))).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn test_draw_flow() {
    let router = app(Config::default()).await;
    let token = auth::token(SECRET, 7, 60);

    let draw = || post("/api/draw", &token, "{}");
    let res = router.clone().oneshot(draw()).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let first = body(res).await;
    assert_eq!(first["data"]["replayed"], false);

    let res = router.clone().oneshot(draw()).await.unwrap();
    let again = body(res).await;
    assert_eq!(again["data"]["replayed"], true);
    assert_eq!(again["data"]["item"]["id"], first["data"]["item"]["id"]);

    let res =
      router.oneshot(get("/api/user/profile", Some(&token))).await.unwrap();
    assert_eq!(body(res).await["data"]["draw_count"], 1);
  }

  #[tokio::test]
  async fn test_geofence_requires_location() {
    let router = app(Config { geofence: true, ..Config::default() }).await;
    let token = auth::token(SECRET, 7, 60);

    let res = router.oneshot(post("/api/draw", &token, "{}")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn test_redeem_insufficient_points() {
    let router = app(Config::default()).await;
    let token = auth::token(SECRET, 7, 60);

    let res = router
      .oneshot(post("/api/redeem", &token, r#"{"tier":"premium"}"#))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(body(res).await["success"], false);
  }

  #[tokio::test]
  async fn test_rate_limit() {
    let quota = Quota { per_second: 0.001, burst: 2, ..Quota::default() };
    let router = app(Config { quota, ..Config::default() }).await;

    for _ in 0..2 {
      let res = router.clone().oneshot(get("/health", None)).await.unwrap();
      assert_eq!(res.status(), StatusCode::OK);
    }
    let res = router.clone().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

    let other = Request::builder()
      .uri("/health")
      .header("x-forwarded-for", "10.0.0.2")
      .body(Body::empty())
      .unwrap();
    let res = router.oneshot(other).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
  }
}
