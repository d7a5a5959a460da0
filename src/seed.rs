//! Initial catalog data.
//!
//! Applied once at startup: items are only inserted into an empty catalog and
//! zones into an empty zone table, so restarts never duplicate anything.

use std::path::Path;

use serde::Deserialize;

use crate::{
  entity::achievement,
  prelude::*,
  state::AppState,
  sv::{catalog::NewItem, zone::NewZone},
};

#[derive(Debug, Default, Deserialize)]
pub struct Seed {
  #[serde(default)]
  pub items: Vec<NewItem>,
  #[serde(default)]
  pub zones: Vec<NewZone>,
}

impl Seed {
  /// Starter catalog used when no seed file is configured.
  pub fn builtin() -> Self {
    let items = (1..=3)
      .map(|n| NewItem {
        name: format!("Card {n}"),
        image_url: format!("/images/image{n}.jpg"),
        series: String::from("common"),
        description: None,
      })
      .collect();

    Self { items, zones: Vec::new() }
  }

  pub async fn load(path: Option<&Path>) -> anyhow::Result<Self> {
    let Some(path) = path else {
      return Ok(Self::builtin());
    };

    let raw = tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    let seed = json::from_str(&raw)
      .with_context(|| format!("Invalid seed file {}", path.display()))?;
    Ok(seed)
  }

  pub async fn apply(self, app: &AppState) -> anyhow::Result<()> {
    let sv = app.sv();

    if sv.catalog.count().await? == 0 {
      let count = self.items.len();
      for item in self.items {
        sv.catalog.add(item).await?;
      }
      info!("Seeded {count} items");
    }

    if sv.zone.count().await? == 0 && !self.zones.is_empty() {
      let codes: Vec<String> = achievement::Entity::find()
        .select_only()
        .column(achievement::Column::Code)
        .into_tuple()
        .all(&app.db)
        .await?;

      let count = self.zones.len();
      for zone in self.zones {
        if let Some(code) = &zone.achievement_code
          && !codes.contains(code)
        {
          warn!("Zone `{}` links unknown achievement `{code}`", zone.name);
        }
        sv.zone.add(zone).await?;
      }
      info!("Seeded {count} zones");
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::{io::Write, sync::Arc};

  use super::*;
  use crate::{
    auth::Jwt,
    state::Config,
    sv::fixtures,
  };

  async fn app() -> AppState {
    let db = fixtures::db().await;
    AppState::with_db(db, Config::default(), Arc::new(Jwt::new("secret")))
  }

  #[tokio::test]
  async fn test_seed_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
      file,
      r#"{{
        "items": [
          {{"name": "Bell", "image_url": "/images/bell.jpg", "series": "temple"}},
          {{"name": "Torii", "image_url": "/images/torii.jpg", "series": "temple"}}
        ],
        "zones": [
          {{"name": "Shrine", "latitude": 35.0, "longitude": 135.0,
            "achievement_code": "zone_a_15"}}
        ]
      }}"#
    )
    .unwrap();

    let app = app().await;
    let seed = Seed::load(Some(file.path())).await.unwrap();
    seed.apply(&app).await.unwrap();

    let items = app.sv().catalog.all().await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item.series == "temple"));

    let zones = app.sv().zone.all().await.unwrap();
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].radius_meters, 100.0);
  }

  #[tokio::test]
  async fn test_seed_is_idempotent() {
    let app = app().await;

    Seed::load(None).await.unwrap().apply(&app).await.unwrap();
    Seed::load(None).await.unwrap().apply(&app).await.unwrap();

    assert_eq!(app.sv().catalog.count().await.unwrap(), 3);
  }

  #[tokio::test]
  async fn test_missing_seed_file() {
    let path = Path::new("/nonexistent/pilgrim-seed.json");
    assert!(Seed::load(Some(path)).await.is_err());
  }
}
