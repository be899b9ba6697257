use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use rand::Rng;
use tracing::debug;

use crate::api_stats::{ApiStatsTracker, DEFAULT_HISTORY_HOURS};
use crate::config::{DashboardConfig, TelemetrySource, app_cache_dir};
use crate::fixtures::Fixture;
use crate::http;
use crate::state::{Delta, ProviderCommand};

const STATS_FILE: &str = "api_stats.json";

/// Background provider: answers fetch commands and keeps the demo source ticking.
pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>, config: DashboardConfig) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        let stats_path = app_cache_dir().map(|dir| dir.join(STATS_FILE));
        let mut demo = match config.telemetry_source {
            TelemetrySource::Demo => Some(seed_demo_tracker(&mut rng, stats_path.as_deref())),
            TelemetrySource::Http => None,
        };

        let demo_tick = Duration::from_secs(3);
        let mut last_demo_tick = Instant::now();
        let save_interval = Duration::from_secs(60);
        let mut last_save = Instant::now();

        loop {
            match cmd_rx.recv_timeout(Duration::from_millis(500)) {
                Ok(cmd) => handle_command(cmd, &tx, &config, demo.as_mut()),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let Some(tracker) = demo.as_mut() else {
                continue;
            };
            if last_demo_tick.elapsed() >= demo_tick {
                simulate_call(tracker, &mut rng, now());
                last_demo_tick = Instant::now();
            }
            if last_save.elapsed() >= save_interval {
                if let Some(path) = stats_path.as_deref()
                    && let Err(err) = tracker.save(path)
                {
                    let _ = tx.send(Delta::Log(format!("[WARN] Saving api stats failed: {err}")));
                }
                last_save = Instant::now();
            }
        }

        if let (Some(tracker), Some(path)) = (demo.as_ref(), stats_path.as_deref()) {
            let _ = tracker.save(path);
        }
    });
}

fn handle_command(
    cmd: ProviderCommand,
    tx: &Sender<Delta>,
    config: &DashboardConfig,
    demo: Option<&mut ApiStatsTracker>,
) {
    match cmd {
        ProviderCommand::FetchTelemetry { generation } => {
            let fetched = match demo {
                Some(tracker) => Ok(tracker.dashboard_payload(now())),
                None => http::fetch_dashboard(&config.telemetry_url),
            };
            let delta = match fetched {
                Ok(payload) => Delta::Telemetry {
                    generation,
                    payload,
                },
                Err(err) => Delta::TelemetryUnavailable {
                    generation,
                    message: format!("{err:#}"),
                },
            };
            let _ = tx.send(delta);
        }
        ProviderCommand::FetchFixtures => send_matches(
            tx,
            "fixtures",
            http::fetch_fixtures(&config.fixtures_url),
            Delta::SetFixtures,
        ),
        ProviderCommand::FetchLiveScores => send_matches(
            tx,
            "live scores",
            http::fetch_fixtures(&config.livescores_url),
            Delta::SetLiveScores,
        ),
        ProviderCommand::FetchResults => send_matches(
            tx,
            "results",
            results_or_history(
                || http::fetch_fixtures(&config.results_url),
                || http::fetch_fixtures(&config.history_url),
            ),
            Delta::SetResults,
        ),
        ProviderCommand::FetchStandings => match http::fetch_standings(&config.standings_url) {
            Ok(table) => {
                let _ = tx.send(Delta::Log(format!("[INFO] Loaded {} standings rows", table.len())));
                let _ = tx.send(Delta::SetStandings(table));
            }
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Standings fetch error: {err:#}")));
            }
        },
        ProviderCommand::FetchMetrics => match http::fetch_metrics(&config.metrics_url) {
            Ok(metrics) => {
                let _ = tx.send(Delta::SetMetrics(metrics));
            }
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Metrics fetch error: {err:#}")));
            }
        },
    }
}

fn send_matches(
    tx: &Sender<Delta>,
    what: &str,
    fetched: Result<Vec<Fixture>>,
    wrap: fn(Vec<Fixture>) -> Delta,
) {
    match fetched {
        Ok(matches) => {
            let _ = tx.send(Delta::Log(format!("[INFO] Loaded {} {what}", matches.len())));
            let _ = tx.send(wrap(matches));
        }
        Err(err) => {
            let _ = tx.send(Delta::Log(format!("[WARN] {what} fetch error: {err:#}")));
        }
    }
}

/// Recent results first; an empty or failed answer falls back to the full history.
pub(crate) fn results_or_history(
    recent: impl FnOnce() -> Result<Vec<Fixture>>,
    history: impl FnOnce() -> Result<Vec<Fixture>>,
) -> Result<Vec<Fixture>> {
    match recent() {
        Ok(matches) if !matches.is_empty() => Ok(matches),
        Ok(_) => history(),
        Err(err) => {
            debug!(%err, "recent results unavailable, using history");
            history()
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

// Loads the saved tracker, or backfills a fresh one so the charts start populated.
fn seed_demo_tracker(rng: &mut impl Rng, path: Option<&std::path::Path>) -> ApiStatsTracker {
    let now = now();
    if let Some(path) = path
        && path.exists()
    {
        return ApiStatsTracker::load_or_new(path, DEFAULT_HISTORY_HOURS, now);
    }

    let start = now - ChronoDuration::hours(DEFAULT_HISTORY_HOURS as i64 - 1);
    let mut tracker = ApiStatsTracker::new(DEFAULT_HISTORY_HOURS, start);
    for hour in 0..DEFAULT_HISTORY_HOURS as i64 {
        let at = start + ChronoDuration::hours(hour);
        for _ in 0..rng.gen_range(2..12) {
            let jitter = ChronoDuration::minutes(rng.gen_range(0..50));
            simulate_call(&mut tracker, rng, (at + jitter).min(now));
        }
    }
    tracker
}

fn simulate_call(tracker: &mut ApiStatsTracker, rng: &mut impl Rng, at: NaiveDateTime) {
    let success = rng.gen_bool(0.92);
    let response_time = rng.gen_range(0.05..0.9);
    tracker.track_call(success, response_time, at);
}
