use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, USER_AGENT};

use crate::fixtures::{Fixture, parse_fixtures_json};
use crate::league::{LeagueMetrics, StandingRow, parse_metrics_json, parse_standings_json};
use crate::telemetry::{DashboardPayload, parse_dashboard_json};

const REQUEST_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();
static VALIDATORS: Mutex<Option<HashMap<String, CachedBody>>> = Mutex::new(None);

#[derive(Debug, Clone)]
struct CachedBody {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
}

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// GET with ETag / Last-Modified revalidation; a 304 returns the remembered body.
pub fn get_revalidated(client: &Client, url: &str) -> Result<String> {
    let cached = {
        let guard = VALIDATORS.lock().expect("http validator lock poisoned");
        guard.as_ref().and_then(|map| map.get(url).cloned())
    };

    let mut req = client.get(url).header(USER_AGENT, "league-dashboard/0.1");
    if let Some(entry) = cached.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().context("request failed")?;
    let status = resp.status();
    if status == StatusCode::NOT_MODIFIED {
        return cached
            .map(|entry| entry.body)
            .ok_or_else(|| anyhow::anyhow!("received 304 without cached body"));
    }

    let header = |name: HeaderName| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    };
    let etag = header(ETAG);
    let last_modified = header(LAST_MODIFIED);

    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {status}: {body}"));
    }

    if etag.is_some() || last_modified.is_some() {
        let mut guard = VALIDATORS.lock().expect("http validator lock poisoned");
        guard.get_or_insert_with(HashMap::new).insert(
            url.to_string(),
            CachedBody {
                body: body.clone(),
                etag,
                last_modified,
            },
        );
    }
    Ok(body)
}

pub fn fetch_dashboard(url: &str) -> Result<DashboardPayload> {
    let client = http_client()?;
    let body = get_revalidated(client, url).context("dashboard request failed")?;
    parse_dashboard_json(&body)
}

/// Fixtures, live scores, results and history share one envelope.
pub fn fetch_fixtures(url: &str) -> Result<Vec<Fixture>> {
    let client = http_client()?;
    let body = get_revalidated(client, url).context("matches request failed")?;
    parse_fixtures_json(&body)
}

pub fn fetch_standings(url: &str) -> Result<Vec<StandingRow>> {
    let client = http_client()?;
    let body = get_revalidated(client, url).context("standings request failed")?;
    parse_standings_json(&body)
}

pub fn fetch_metrics(url: &str) -> Result<LeagueMetrics> {
    let client = http_client()?;
    let body = get_revalidated(client, url).context("metrics request failed")?;
    parse_metrics_json(&body)
}
