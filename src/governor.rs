//! Per-client token bucket shared by every request path.
//!
//! Buckets refill lazily on access. A periodic sweep drops clients that have
//! been idle for longer than the sweep interval, so memory stays bounded by
//! the number of recently active clients.

use std::time::Instant;

use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct Quota {
  /// Tokens restored per second
  pub per_second: f64,
  /// Bucket capacity
  pub burst: u32,
  /// Sweep period, also the idle cutoff
  pub sweep: Duration,
}

impl Default for Quota {
  fn default() -> Self {
    Self { per_second: 10.0, burst: 20, sweep: Duration::from_secs(300) }
  }
}

#[derive(Debug)]
struct Bucket {
  tokens: f64,
  last_seen: Instant,
}

#[derive(Debug)]
pub struct Governor {
  // shard locks guard the key set; each entry is mutated under its own guard
  buckets: DashMap<String, Bucket>,
  quota: Quota,
}

impl Governor {
  pub fn new(quota: Quota) -> Self {
    Self { buckets: DashMap::new(), quota }
  }

  pub fn quota(&self) -> &Quota {
    &self.quota
  }

  pub fn check(&self, key: &str) -> bool {
    self.check_at(key, Instant::now())
  }

  pub(crate) fn check_at(&self, key: &str, now: Instant) -> bool {
    if let Some(mut bucket) = self.buckets.get_mut(key) {
      return self.take(&mut bucket, now);
    }

    let burst = f64::from(self.quota.burst);
    let mut bucket = self
      .buckets
      .entry(key.to_owned())
      .or_insert_with(|| Bucket { tokens: burst, last_seen: now });
    self.take(&mut bucket, now)
  }

  fn take(&self, bucket: &mut Bucket, now: Instant) -> bool {
    let elapsed = now.saturating_duration_since(bucket.last_seen);
    let refill = elapsed.as_secs_f64() * self.quota.per_second;

    bucket.tokens = (bucket.tokens + refill).min(f64::from(self.quota.burst));
    bucket.last_seen = now;

    if bucket.tokens >= 1.0 {
      bucket.tokens -= 1.0;
      true
    } else {
      false
    }
  }

  /// Drops clients idle for longer than the sweep interval.
  pub fn retain_recent(&self) -> usize {
    self.retain_at(Instant::now())
  }

  pub(crate) fn retain_at(&self, now: Instant) -> usize {
    let idle = self.quota.sweep;
    let before = self.buckets.len();

    self
      .buckets
      .retain(|_, bucket| now.saturating_duration_since(bucket.last_seen) <= idle);

    before.saturating_sub(self.buckets.len())
  }

  pub fn len(&self) -> usize {
    self.buckets.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn governor(per_second: f64, burst: u32) -> Governor {
    Governor::new(Quota { per_second, burst, sweep: Duration::from_secs(60) })
  }

  #[test]
  fn test_burst_then_refill() {
    let gov = governor(2.0, 5);
    let start = Instant::now();

    let allowed = (0..6).filter(|_| gov.check_at("1.2.3.4", start)).count();
    assert_eq!(allowed, 5);

    // one token comes back after 1/R seconds
    let later = start + Duration::from_millis(500);
    assert!(gov.check_at("1.2.3.4", later));
    assert!(!gov.check_at("1.2.3.4", later));
  }

  #[test]
  fn test_refill_is_capped_at_burst() {
    let gov = governor(100.0, 3);
    let start = Instant::now();

    assert!(gov.check_at("a", start));

    let later = start + Duration::from_secs(3600);
    let allowed = (0..10).filter(|_| gov.check_at("a", later)).count();
    assert_eq!(allowed, 3);
  }

  #[test]
  fn test_keys_are_independent() {
    let gov = governor(1.0, 1);
    let now = Instant::now();

    assert!(gov.check_at("a", now));
    assert!(!gov.check_at("a", now));
    assert!(gov.check_at("b", now));
  }

  #[test]
  fn test_sweep_drops_idle_clients() {
    let gov = governor(1.0, 2);
    let start = Instant::now();

    gov.check_at("old", start);
    gov.check_at("fresh", start + Duration::from_secs(90));

    let removed = gov.retain_at(start + Duration::from_secs(100));

    assert_eq!(removed, 1);
    assert_eq!(gov.len(), 1);

    // a swept client starts over with a full bucket
    let now = start + Duration::from_secs(100);
    assert!(gov.check_at("old", now));
    assert!(gov.check_at("old", now));
    assert!(!gov.check_at("old", now));
  }

  #[test]
  fn test_concurrent_clients() {
    let gov = std::sync::Arc::new(governor(0.0, 50));
    let now = Instant::now();

    let handles: Vec<_> = (0..4)
      .map(|_| {
        let gov = gov.clone();
        std::thread::spawn(move || {
          (0..25).filter(|_| gov.check_at("shared", now)).count()
        })
      })
      .collect();

    let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(allowed, 50);
  }
}
