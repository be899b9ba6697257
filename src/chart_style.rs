use ratatui::style::Color;

use crate::chart_lifecycle::ChartSlot;
use crate::chart_window::{ChartSettings, ResponseTimeUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
}

/// Declarative presentation for one chart.
///
/// The first five fields are the ones that change how a chart behaves
/// (shape, axis range, value formatting). The rest are presentation
/// constants that never branch.
#[derive(Debug, Clone)]
pub struct StyleConfig {
    pub kind: ChartKind,
    pub fill_under_curve: bool,
    pub begin_at_zero: bool,
    pub axis_max: Option<f64>,
    pub tooltip_value_formatter: fn(f64) -> String,

    pub tooltip_title_formatter: fn(&str) -> String,
    pub dataset_label: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub color: Color,
    pub show_points: bool,
}

impl StyleConfig {
    pub fn tooltip(&self, hour: &str, value: f64) -> String {
        format!(
            "{}  {}",
            (self.tooltip_title_formatter)(hour),
            (self.tooltip_value_formatter)(value)
        )
    }
}

fn hour_title(hour: &str) -> String {
    format!("Hour: {hour}")
}

fn format_calls(value: f64) -> String {
    format!("Calls: {}", value.round() as i64)
}

fn format_success_rate(value: f64) -> String {
    format!("Success rate: {value:.1}%")
}

fn format_millis(value: f64) -> String {
    format!("Time: {value:.1} ms")
}

fn format_seconds(value: f64) -> String {
    format!("Time: {value:.3} s")
}

fn format_errors(value: f64) -> String {
    format!("Errors: {}", value.round() as i64)
}

/// Styles used by the telemetry panel for each slot.
pub fn default_style(slot: ChartSlot, settings: &ChartSettings) -> StyleConfig {
    let x_axis_title = settings.window_title();
    match slot {
        ChartSlot::Calls => StyleConfig {
            kind: ChartKind::Line,
            fill_under_curve: true,
            begin_at_zero: true,
            axis_max: None,
            tooltip_value_formatter: format_calls,
            tooltip_title_formatter: hour_title,
            dataset_label: "API calls".to_string(),
            x_axis_title,
            y_axis_title: "Calls".to_string(),
            color: Color::Rgb(54, 162, 235),
            show_points: true,
        },
        ChartSlot::SuccessRate => StyleConfig {
            kind: ChartKind::Bar,
            fill_under_curve: false,
            begin_at_zero: true,
            axis_max: Some(100.0),
            tooltip_value_formatter: format_success_rate,
            tooltip_title_formatter: hour_title,
            dataset_label: "Success rate (%)".to_string(),
            x_axis_title,
            y_axis_title: "Percent".to_string(),
            color: Color::Rgb(75, 192, 192),
            show_points: false,
        },
        ChartSlot::ResponseTime => {
            let (formatter, y_axis_title): (fn(f64) -> String, &str) = match settings.response_unit
            {
                ResponseTimeUnit::Milliseconds => (format_millis, "Milliseconds"),
                ResponseTimeUnit::Seconds => (format_seconds, "Seconds"),
            };
            StyleConfig {
                kind: ChartKind::Line,
                fill_under_curve: true,
                begin_at_zero: true,
                axis_max: None,
                tooltip_value_formatter: formatter,
                tooltip_title_formatter: hour_title,
                dataset_label: format!("Response time ({})", settings.response_unit.suffix()),
                x_axis_title,
                y_axis_title: y_axis_title.to_string(),
                color: Color::Rgb(255, 206, 86),
                show_points: true,
            }
        }
        ChartSlot::Errors => StyleConfig {
            kind: ChartKind::Bar,
            fill_under_curve: false,
            begin_at_zero: true,
            axis_max: None,
            tooltip_value_formatter: format_errors,
            tooltip_title_formatter: hour_title,
            dataset_label: "Errors".to_string(),
            x_axis_title,
            y_axis_title: "Errors".to_string(),
            color: Color::Rgb(255, 99, 132),
            show_points: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_time_formatter_follows_unit() {
        let ms = default_style(ChartSlot::ResponseTime, &ChartSettings::compact());
        let s = default_style(ChartSlot::ResponseTime, &ChartSettings::extended());
        assert_eq!((ms.tooltip_value_formatter)(123.45), "Time: 123.5 ms");
        assert_eq!((s.tooltip_value_formatter)(0.1234), "Time: 0.123 s");
        assert_eq!(ms.y_axis_title, "Milliseconds");
    }

    #[test]
    fn success_rate_axis_is_capped() {
        let style = default_style(ChartSlot::SuccessRate, &ChartSettings::compact());
        assert_eq!(style.kind, ChartKind::Bar);
        assert_eq!(style.axis_max, Some(100.0));
        assert_eq!(style.tooltip("10:00", 97.0), "Hour: 10:00  Success rate: 97.0%");
    }

    #[test]
    fn x_axis_title_names_the_window() {
        let style = default_style(ChartSlot::Calls, &ChartSettings::extended());
        assert_eq!(style.x_axis_title, "last 48 hours");
    }
}
