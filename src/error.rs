use thiserror::Error;

use crate::chart_lifecycle::ChartSlot;

/// Failures of the telemetry chart core.
///
/// Only `InvalidInput` is meant to reach the user (as a single "metrics
/// unavailable" fallback). The per-slot variants are isolated to the slot
/// that produced them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    #[error("invalid telemetry input: {0}")]
    InvalidInput(String),

    #[error("render target `{canvas}` for {slot} chart is missing")]
    RenderTargetMissing { slot: ChartSlot, canvas: String },

    #[error("stale generation {got} (current {current})")]
    StaleGeneration { got: u64, current: u64 },

    #[error("canvas `{0}` is already bound to a live chart")]
    CanvasInUse(String),

    #[error("unknown chart handle {0}")]
    UnknownHandle(u64),
}

impl DashboardError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
