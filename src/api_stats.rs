use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::telemetry::{ApiStats, ApiTrend, DashboardPayload};

pub const DEFAULT_HISTORY_HOURS: usize = 48;
const SNAPSHOT_VERSION: u32 = 1;
const KEPT_RESPONSE_TIMES: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct HourBucket {
    calls: u64,
    errors: u64,
    success_rate: f64,
    // Seconds, latest sample in the hour.
    response_time: f64,
}

impl Default for HourBucket {
    fn default() -> Self {
        Self {
            calls: 0,
            errors: 0,
            success_rate: 100.0,
            response_time: 0.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    newest_hour: i64,
    started_at: i64,
    calls_total: u64,
    errors_total: u64,
    response_times: Vec<f64>,
    buckets: Vec<HourBucket>,
}

/// Counts API calls into hour-aligned buckets, newest on the right.
#[derive(Debug, Clone)]
pub struct ApiStatsTracker {
    history_hours: usize,
    buckets: VecDeque<HourBucket>,
    newest_hour: NaiveDateTime,
    started_at: NaiveDateTime,
    calls_total: u64,
    errors_total: u64,
    response_times: VecDeque<f64>,
}

impl ApiStatsTracker {
    pub fn new(history_hours: usize, now: NaiveDateTime) -> Self {
        let history_hours = history_hours.max(1);
        Self {
            history_hours,
            buckets: (0..history_hours).map(|_| HourBucket::default()).collect(),
            newest_hour: truncate_to_hour(now),
            started_at: now,
            calls_total: 0,
            errors_total: 0,
            response_times: VecDeque::with_capacity(KEPT_RESPONSE_TIMES),
        }
    }

    pub fn history_hours(&self) -> usize {
        self.history_hours
    }

    pub fn track_call(&mut self, success: bool, response_time_secs: f64, now: NaiveDateTime) {
        self.roll_to(now);

        self.calls_total += 1;
        if !success {
            self.errors_total += 1;
        }
        if self.response_times.len() == KEPT_RESPONSE_TIMES {
            self.response_times.pop_front();
        }
        self.response_times.push_back(response_time_secs.max(0.0));

        let Some(bucket) = self.buckets.back_mut() else {
            return;
        };
        bucket.calls += 1;
        if !success {
            bucket.errors += 1;
        }
        bucket.success_rate =
            (((bucket.calls - bucket.errors) as f64 / bucket.calls as f64) * 100.0).round();
        bucket.response_time = response_time_secs.max(0.0);
    }

    /// Shifts the ring forward so its newest bucket is the hour containing `now`.
    fn roll_to(&mut self, now: NaiveDateTime) {
        let hour = truncate_to_hour(now);
        if hour <= self.newest_hour {
            return;
        }
        let elapsed = (hour - self.newest_hour).num_hours().max(0) as usize;
        for _ in 0..elapsed.min(self.history_hours) {
            self.buckets.pop_front();
            self.buckets.push_back(HourBucket::default());
        }
        self.newest_hour = hour;
    }

    pub fn stats(&self, now: NaiveDateTime) -> ApiStats {
        let response_time = if self.response_times.is_empty() {
            0.0
        } else {
            self.response_times.iter().sum::<f64>() / self.response_times.len() as f64
        };
        let success_rate = if self.calls_total == 0 {
            100.0
        } else {
            100.0 - (self.errors_total as f64 / self.calls_total as f64) * 100.0
        };
        ApiStats {
            calls: self.calls_total,
            success_rate,
            response_time,
            errors: self.errors_total,
            uptime_secs: (now - self.started_at).num_seconds().max(0) as u64,
        }
    }

    pub fn hours(&self) -> Vec<String> {
        let n = self.buckets.len() as i64;
        (0..n)
            .map(|i| {
                let at = self.newest_hour - ChronoDuration::hours(n - 1 - i);
                at.format("%H:%M").to_string()
            })
            .collect()
    }

    pub fn trend(&self) -> ApiTrend {
        ApiTrend {
            calls: self.buckets.iter().map(|b| b.calls as f64).collect(),
            success_rate: self.buckets.iter().map(|b| b.success_rate).collect(),
            response_time: self.buckets.iter().map(|b| b.response_time).collect(),
            errors: self.buckets.iter().map(|b| b.errors as f64).collect(),
        }
    }

    /// Payload in the shape served to the dashboard, rolled forward to `now`.
    pub fn dashboard_payload(&mut self, now: NaiveDateTime) -> DashboardPayload {
        self.roll_to(now);
        DashboardPayload {
            api_stats: self.stats(now),
            api_trend: self.trend(),
            hours: self.hours(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            newest_hour: self.newest_hour.and_utc().timestamp(),
            started_at: self.started_at.and_utc().timestamp(),
            calls_total: self.calls_total,
            errors_total: self.errors_total,
            response_times: self.response_times.iter().copied().collect(),
            buckets: self.buckets.iter().cloned().collect(),
        };
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&snapshot).context("serialize api stats")?;
        fs::write(&tmp, json).context("write api stats")?;
        fs::rename(&tmp, path).context("swap api stats")?;
        Ok(())
    }

    /// Loads a saved snapshot, or starts fresh when the file is missing or unreadable.
    pub fn load_or_new(path: &Path, history_hours: usize, now: NaiveDateTime) -> Self {
        let mut fresh = Self::new(history_hours, now);
        let Ok(raw) = fs::read_to_string(path) else {
            return fresh;
        };
        let Ok(snapshot) = serde_json::from_str::<Snapshot>(&raw) else {
            return fresh;
        };
        if snapshot.version != SNAPSHOT_VERSION {
            return fresh;
        }
        let (Some(newest_hour), Some(started_at)) = (
            from_timestamp(snapshot.newest_hour),
            from_timestamp(snapshot.started_at),
        ) else {
            return fresh;
        };

        // Right-align the saved buckets into the configured history length.
        let keep = snapshot.buckets.len().min(fresh.history_hours);
        let skip = snapshot.buckets.len() - keep;
        let pad = fresh.history_hours - keep;
        fresh.buckets = std::iter::repeat_with(HourBucket::default)
            .take(pad)
            .chain(snapshot.buckets.into_iter().skip(skip))
            .collect();
        fresh.newest_hour = newest_hour;
        fresh.started_at = started_at;
        fresh.calls_total = snapshot.calls_total;
        fresh.errors_total = snapshot.errors_total;
        fresh.response_times = snapshot
            .response_times
            .into_iter()
            .rev()
            .take(KEPT_RESPONSE_TIMES)
            .rev()
            .collect();
        fresh.roll_to(now);
        fresh
    }
}

fn truncate_to_hour(at: NaiveDateTime) -> NaiveDateTime {
    at.date().and_hms_opt(at.hour(), 0, 0).unwrap_or(at)
}

fn from_timestamp(secs: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}
