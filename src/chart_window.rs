use crate::error::DashboardError;
use crate::telemetry::TelemetrySeries;

/// The most recent hours of a [`TelemetrySeries`], right-aligned to the newest bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedSeries {
    series: TelemetrySeries,
}

impl WindowedSeries {
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn series(&self) -> &TelemetrySeries {
        &self.series
    }

    pub fn hours(&self) -> &[String] {
        self.series.hours()
    }

    /// Returns a copy whose response times are scaled by `unit`.
    pub fn with_response_unit(&self, unit: ResponseTimeUnit) -> Self {
        let converted = convert_units(self.series.response_time(), unit.factor());
        Self {
            series: self.series.clone().with_response_time(converted),
        }
    }
}

/// Keeps the last `min(max_hours, len)` entries of every array.
pub fn window(series: &TelemetrySeries, max_hours: usize) -> Result<WindowedSeries, DashboardError> {
    if max_hours == 0 {
        return Err(DashboardError::invalid("window size must be positive"));
    }
    let start = series.len().saturating_sub(max_hours);
    Ok(WindowedSeries {
        series: series.tail_from(start),
    })
}

/// Sparse x-axis labelling: every `stride`-th hour is shown, the rest are blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisLabelPolicy {
    stride: usize,
    hours: Vec<String>,
}

impl AxisLabelPolicy {
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    pub fn label(&self, index: usize) -> &str {
        if index % self.stride != 0 {
            return "";
        }
        self.hours.get(index).map(String::as_str).unwrap_or("")
    }

    /// One entry per hour, blank where the stride skips.
    pub fn tick_labels(&self) -> Vec<String> {
        (0..self.hours.len())
            .map(|idx| self.label(idx).to_string())
            .collect()
    }

    /// Only the labels that are shown, in order.
    pub fn shown_labels(&self) -> Vec<&str> {
        self.hours
            .iter()
            .step_by(self.stride)
            .map(String::as_str)
            .collect()
    }

    pub fn as_fn(&self) -> impl Fn(usize) -> String + '_ {
        move |idx| self.label(idx).to_string()
    }
}

pub fn derive_axis_labels(
    windowed: &WindowedSeries,
    target_label_count: usize,
) -> Result<AxisLabelPolicy, DashboardError> {
    if target_label_count == 0 {
        return Err(DashboardError::invalid("target label count must be at least 1"));
    }
    let stride = windowed.len().div_ceil(target_label_count).max(1);
    Ok(AxisLabelPolicy {
        stride,
        hours: windowed.hours().to_vec(),
    })
}

pub fn convert_units(values: &[f64], factor: f64) -> Vec<f64> {
    values.iter().map(|v| v * factor).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseTimeUnit {
    Seconds,
    Milliseconds,
}

impl ResponseTimeUnit {
    pub fn factor(self) -> f64 {
        match self {
            ResponseTimeUnit::Seconds => 1.0,
            ResponseTimeUnit::Milliseconds => 1000.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            ResponseTimeUnit::Seconds => "s",
            ResponseTimeUnit::Milliseconds => "ms",
        }
    }

    /// Formats a response time given in seconds, e.g. `250.0 ms` or `0.25 s`.
    pub fn format(self, seconds: f64) -> String {
        match self {
            ResponseTimeUnit::Seconds => format!("{:.2} {}", seconds * self.factor(), self.suffix()),
            ResponseTimeUnit::Milliseconds => format!("{:.1} {}", seconds * self.factor(), self.suffix()),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "seconds" => Some(ResponseTimeUnit::Seconds),
            "ms" | "millis" | "milliseconds" => Some(ResponseTimeUnit::Milliseconds),
            _ => None,
        }
    }
}

/// Window size, label density and response-time unit for one presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSettings {
    pub window_hours: usize,
    pub label_count: usize,
    pub response_unit: ResponseTimeUnit,
}

impl ChartSettings {
    /// Last 12 hours, about 6 labels, milliseconds.
    pub fn compact() -> Self {
        Self {
            window_hours: 12,
            label_count: 6,
            response_unit: ResponseTimeUnit::Milliseconds,
        }
    }

    /// Last 48 hours, about 12 labels, raw seconds.
    pub fn extended() -> Self {
        Self {
            window_hours: 48,
            label_count: 12,
            response_unit: ResponseTimeUnit::Seconds,
        }
    }

    pub fn window_title(&self) -> String {
        format!("last {} hours", self.window_hours)
    }
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self::compact()
    }
}

/// Windowed, unit-converted series plus the labelling derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSeries {
    pub windowed: WindowedSeries,
    pub axis: AxisLabelPolicy,
}

pub fn prepare(
    series: &TelemetrySeries,
    settings: &ChartSettings,
) -> Result<PreparedSeries, DashboardError> {
    let windowed = window(series, settings.window_hours)?.with_response_unit(settings.response_unit);
    let axis = derive_axis_labels(&windowed, settings.label_count)?;
    Ok(PreparedSeries { windowed, axis })
}
