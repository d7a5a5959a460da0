//! Maps wall-clock instants onto the draw cycle.
//!
//! The cycle turns over at a fixed hour in a fixed zone instead of at
//! midnight, and never looks at the host's local time zone.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy)]
pub struct Clock {
  tz: Tz,
  cutoff_hour: u32,
}

impl Clock {
  pub fn new(tz: Tz, cutoff_hour: u32) -> Self {
    Self { tz, cutoff_hour: cutoff_hour.min(23) }
  }

  pub fn tz(&self) -> Tz {
    self.tz
  }

  /// Before the cutoff hour the draw day is still yesterday's date.
  pub fn logical_day(&self, now: DateTime<Utc>) -> NaiveDate {
    let local = now.with_timezone(&self.tz);
    let date = local.date_naive();

    if local.hour() < self.cutoff_hour {
      date.pred_opt().unwrap_or(date)
    } else {
      date
    }
  }

  /// Calendar month in the clock's zone, `YYYY-MM`.
  pub fn month(&self, now: DateTime<Utc>) -> String {
    now.with_timezone(&self.tz).format("%Y-%m").to_string()
  }
}

impl Default for Clock {
  fn default() -> Self {
    Self::new(chrono_tz::Asia::Shanghai, 16)
  }
}
