use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::chart_window::{ChartSettings, ResponseTimeUnit};

const CACHE_DIR: &str = "league_dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetrySource {
    Demo,
    Http,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub telemetry_source: TelemetrySource,
    pub telemetry_url: String,
    pub fixtures_url: String,
    pub standings_url: String,
    pub livescores_url: String,
    pub results_url: String,
    pub history_url: String,
    pub metrics_url: String,
    pub charts: ChartSettings,
    pub telemetry_poll: Duration,
    pub fixtures_poll: Duration,
    pub live_poll: Duration,
    pub kickoff_utc_offset_hours: i32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            telemetry_source: TelemetrySource::Demo,
            telemetry_url: "http://127.0.0.1:5000/api/dashboard".to_string(),
            fixtures_url: "http://127.0.0.1:5000/api/fixtures".to_string(),
            standings_url: "http://127.0.0.1:5000/api/standings".to_string(),
            livescores_url: "http://127.0.0.1:5000/api/livescores".to_string(),
            results_url: "http://127.0.0.1:5000/api/results".to_string(),
            history_url: "http://127.0.0.1:5000/api/history".to_string(),
            metrics_url: "http://127.0.0.1:5000/api/metrics".to_string(),
            charts: ChartSettings::compact(),
            telemetry_poll: Duration::from_secs(30),
            fixtures_poll: Duration::from_secs(120),
            live_poll: Duration::from_secs(60),
            kickoff_utc_offset_hours: -6,
        }
    }
}

impl DashboardConfig {
    /// Reads the environment; `.env` files are expected to be loaded already.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telemetry_source = match var("TELEMETRY_SOURCE")
            .map(|v| v.trim().to_lowercase())
            .as_deref()
        {
            Some("http") => TelemetrySource::Http,
            _ => TelemetrySource::Demo,
        };

        let mut charts = match var("TELEMETRY_PRESET")
            .map(|v| v.trim().to_lowercase())
            .as_deref()
        {
            Some("extended") => ChartSettings::extended(),
            _ => ChartSettings::compact(),
        };
        if let Some(hours) = var("TELEMETRY_WINDOW_HOURS").and_then(|v| v.trim().parse::<usize>().ok()) {
            charts.window_hours = hours.clamp(1, 168);
        }
        if let Some(count) = var("TELEMETRY_LABEL_COUNT").and_then(|v| v.trim().parse::<usize>().ok()) {
            charts.label_count = count.clamp(1, 48);
        }
        if let Some(unit) = var("TELEMETRY_RESPONSE_UNIT").and_then(|v| ResponseTimeUnit::parse(&v)) {
            charts.response_unit = unit;
        }

        let telemetry_poll = var("TELEMETRY_POLL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(30)
            .max(5);
        let fixtures_poll = var("FIXTURES_POLL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(120)
            .max(30);
        let live_poll = var("LIVE_POLL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(60)
            .max(15);
        let kickoff_utc_offset_hours = var("KICKOFF_UTC_OFFSET_HOURS")
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or(defaults.kickoff_utc_offset_hours)
            .clamp(-12, 14);

        Self {
            telemetry_source,
            telemetry_url: var("TELEMETRY_URL").unwrap_or(defaults.telemetry_url),
            fixtures_url: var("FIXTURES_URL").unwrap_or(defaults.fixtures_url),
            standings_url: var("STANDINGS_URL").unwrap_or(defaults.standings_url),
            livescores_url: var("LIVESCORES_URL").unwrap_or(defaults.livescores_url),
            results_url: var("RESULTS_URL").unwrap_or(defaults.results_url),
            history_url: var("HISTORY_URL").unwrap_or(defaults.history_url),
            metrics_url: var("METRICS_URL").unwrap_or(defaults.metrics_url),
            charts,
            telemetry_poll: Duration::from_secs(telemetry_poll),
            fixtures_poll: Duration::from_secs(fixtures_poll),
            live_poll: Duration::from_secs(live_poll),
            kickoff_utc_offset_hours,
        }
    }
}

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}
