//! Upcoming review forecast, bucketed by local day and hour.
//!
//! Every day in the window carries all 24 hour keys, even when empty, and
//! the cumulative count keeps running across midnight.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SrsError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastBucket {
    /// Reviews falling due in this hour
    pub count: u32,
    /// Reviews due from now through the end of this hour
    pub cumulative: u32,
}

/// `"YYYY-MM-DD" -> "HH" -> bucket`, in the caller's timezone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewForecast {
    pub days: BTreeMap<String, BTreeMap<String, ForecastBucket>>,
}

impl ReviewForecast {
    pub fn bucket(&self, day: &str, hour: u32) -> Option<ForecastBucket> {
        self.days
            .get(day)
            .and_then(|hours| hours.get(&hour_key(hour)))
            .copied()
    }

    /// Reviews counted anywhere in the window
    pub fn total(&self) -> u32 {
        self.days
            .values()
            .flat_map(|hours| hours.values())
            .map(|bucket| bucket.count)
            .sum()
    }
}

/// Parse an IANA zone name such as `America/Los_Angeles`
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| SrsError::InvalidTimezone(name.to_string()))
}

/// Upper bound on review times that can land in a `days`-day forecast.
/// Anything past the last local day is dropped by `build_forecast`.
pub fn window_end(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now + Duration::days(i64::from(days) + 1)
}

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn hour_key(hour: u32) -> String {
    format!("{:02}", hour)
}

/// Bucket `review_times` into `days` local days starting today
pub fn build_forecast(
    review_times: &[DateTime<Utc>],
    now: DateTime<Utc>,
    tz: Tz,
    days: u32,
) -> ReviewForecast {
    let today = now.with_timezone(&tz).date_naive();
    let day_keys: Vec<String> = (0..days)
        .map(|offset| day_key(today + Duration::days(i64::from(offset))))
        .collect();

    let mut counts: BTreeMap<(String, u32), u32> = BTreeMap::new();
    for at in review_times.iter().filter(|at| **at > now) {
        let local = at.with_timezone(&tz);
        *counts
            .entry((day_key(local.date_naive()), local.hour()))
            .or_insert(0) += 1;
    }

    let mut forecast = ReviewForecast::default();
    let mut cumulative = 0;
    for day in day_keys {
        let mut hours = BTreeMap::new();
        for hour in 0..24 {
            let count = counts.get(&(day.clone(), hour)).copied().unwrap_or(0);
            cumulative += count;
            hours.insert(hour_key(hour), ForecastBucket { count, cumulative });
        }
        forecast.days.insert(day, hours);
    }
    forecast
}
