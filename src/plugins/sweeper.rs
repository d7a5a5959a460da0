//! Periodic eviction of idle rate-limit buckets.

use std::sync::Arc;

use crate::{plugins::Plugin, prelude::*, state::AppState};

pub struct Sweeper;

#[async_trait]
impl Plugin for Sweeper {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let mut interval = time::interval(app.governor.quota().sweep);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
      interval.tick().await;

      let evicted = app.governor.retain_recent();
      if evicted > 0 {
        debug!(
          "Evicted {evicted} idle rate-limit buckets, {} left",
          app.governor.len()
        );
      }
    }
  }
}
