//! Great-circle distance and zone matching.

use crate::entity::zone;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coords {
  pub latitude: f64,
  pub longitude: f64,
}

impl Coords {
  pub fn new(latitude: f64, longitude: f64) -> Self {
    Self { latitude, longitude }
  }
}

/// Haversine distance in meters.
pub fn distance(a: Coords, b: Coords) -> f64 {
  let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
  let d_lat = lat2 - lat1;
  let d_lon = (b.longitude - a.longitude).to_radians();

  let h = (d_lat / 2.0).sin().powi(2)
    + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

  2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Closest zone whose radius contains `point`.
///
/// Zones are expected in catalog order; on equal distance the earlier one
/// wins.
pub fn nearest<'a>(
  zones: &'a [zone::Model],
  point: Coords,
) -> Option<(&'a zone::Model, f64)> {
  let mut best: Option<(&zone::Model, f64)> = None;

  for zone in zones {
    let center = Coords::new(zone.latitude, zone.longitude);
    let dist = distance(point, center);

    if dist > zone.radius_meters {
      continue;
    }
    if best.is_none_or(|(_, best)| dist < best) {
      best = Some((zone, dist));
    }
  }

  best
}
