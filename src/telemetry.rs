use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// Aggregate counters shown above the charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ApiStats {
    #[serde(default)]
    pub calls: u64,
    #[serde(default)]
    pub success_rate: f64,
    // Mean response time in seconds.
    #[serde(default)]
    pub response_time: f64,
    #[serde(default)]
    pub errors: u64,
    #[serde(default, rename = "uptime")]
    pub uptime_secs: u64,
}

/// Hourly buckets as the backend ships them, one array per metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ApiTrend {
    #[serde(default)]
    pub calls: Vec<f64>,
    #[serde(default)]
    pub success_rate: Vec<f64>,
    #[serde(default)]
    pub response_time: Vec<f64>,
    #[serde(default)]
    pub errors: Vec<f64>,
}

/// The `/api/dashboard` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DashboardPayload {
    #[serde(default)]
    pub api_stats: ApiStats,
    #[serde(default)]
    pub api_trend: ApiTrend,
    #[serde(default)]
    pub hours: Vec<String>,
}

/// Validated telemetry: five parallel arrays of identical length.
///
/// Index `i` in every array describes the same hour. The fields are private
/// so the only way to build one is through [`TelemetrySeries::new`] or
/// [`TelemetrySeries::from_payload`], both of which check the lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySeries {
    hours: Vec<String>,
    calls: Vec<f64>,
    success_rate: Vec<f64>,
    response_time: Vec<f64>,
    errors: Vec<f64>,
}

impl TelemetrySeries {
    pub fn new(
        hours: Vec<String>,
        calls: Vec<f64>,
        success_rate: Vec<f64>,
        response_time: Vec<f64>,
        errors: Vec<f64>,
    ) -> Result<Self, DashboardError> {
        let len = hours.len();
        let lengths = [
            ("calls", calls.len()),
            ("success_rate", success_rate.len()),
            ("response_time", response_time.len()),
            ("errors", errors.len()),
        ];
        if let Some((name, got)) = lengths.iter().find(|(_, got)| *got != len) {
            return Err(DashboardError::invalid(format!(
                "{name} has {got} entries but hours has {len}"
            )));
        }
        Ok(Self {
            hours,
            calls,
            success_rate,
            response_time,
            errors,
        })
    }

    pub fn from_payload(payload: &DashboardPayload) -> Result<Self, DashboardError> {
        let trend = &payload.api_trend;
        Self::new(
            payload.hours.clone(),
            trend.calls.clone(),
            trend.success_rate.clone(),
            trend.response_time.clone(),
            trend.errors.clone(),
        )
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    pub fn hours(&self) -> &[String] {
        &self.hours
    }

    pub fn calls(&self) -> &[f64] {
        &self.calls
    }

    pub fn success_rate(&self) -> &[f64] {
        &self.success_rate
    }

    pub fn response_time(&self) -> &[f64] {
        &self.response_time
    }

    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    /// Keeps the entries from `start` onwards in every array.
    pub(crate) fn tail_from(&self, start: usize) -> Self {
        Self {
            hours: self.hours[start..].to_vec(),
            calls: self.calls[start..].to_vec(),
            success_rate: self.success_rate[start..].to_vec(),
            response_time: self.response_time[start..].to_vec(),
            errors: self.errors[start..].to_vec(),
        }
    }

    pub(crate) fn with_response_time(mut self, response_time: Vec<f64>) -> Self {
        debug_assert_eq!(response_time.len(), self.hours.len());
        self.response_time = response_time;
        self
    }
}

pub fn parse_dashboard_json(raw: &str) -> Result<DashboardPayload> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow::anyhow!("empty dashboard response"));
    }
    serde_json::from_str::<DashboardPayload>(trimmed).context("invalid dashboard json")
}
