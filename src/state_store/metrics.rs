//! Request counters bucketed by day, month, year and total

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// path -> hit count
pub type Counter = BTreeMap<String, u64>;

/// Persisted counters; each bucket is cleared when its calendar marker changes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsCounters {
    pub today_is: String,
    pub month_is: String,
    pub year_is: String,
    pub today: Counter,
    pub month: Counter,
    pub year: Counter,
    pub total: Counter,
}

impl MetricsCounters {
    /// Reset every bucket whose period has ended at `now`
    pub fn roll_over(&mut self, now: &DateTime<Tz>) {
        let today = now.format("%Y-%m-%d").to_string();
        let month = now.format("%Y-%m").to_string();
        let year = now.format("%Y").to_string();

        if self.today_is != today {
            self.today.clear();
            self.today_is = today;
        }
        if self.month_is != month {
            self.month.clear();
            self.month_is = month;
        }
        if self.year_is != year {
            self.year.clear();
            self.year_is = year;
        }
    }

    /// Count one hit on `path`
    pub fn record(&mut self, path: &str, now: &DateTime<Tz>) {
        self.roll_over(now);
        for bucket in [&mut self.today, &mut self.month, &mut self.year, &mut self.total] {
            *bucket.entry(path.to_string()).or_insert(0) += 1;
        }
    }
}

/// `/metrics` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub time: String,
    pub timezone: String,
    pub today_is: String,
    pub month_is: String,
    pub year_is: String,
    pub today: Counter,
    pub month: Counter,
    pub year: Counter,
    pub total: Counter,
}
