pub mod api_stats;
pub mod chart_lifecycle;
pub mod chart_style;
pub mod chart_window;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod fixtures;
pub mod http;
pub mod league;
pub mod state;
pub mod telemetry;
pub mod tui_charts;
