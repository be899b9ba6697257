use tracing::debug;

use crate::chart_lifecycle::{ChartLifecycleManager, ChartSlot, Generation, RenderReport, SlotPlan};
use crate::chart_style::default_style;
use crate::chart_window::{ChartSettings, prepare};
use crate::error::DashboardError;
use crate::telemetry::{ApiStats, DashboardPayload, TelemetrySeries};
use crate::tui_charts::{CanvasRegistry, ChartInstance, TerminalCharts};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewStatus {
    Unmounted,
    Waiting,
    Ready,
    Unavailable(String),
}

/// The telemetry panel: four charts, their canvases and the view generation.
pub struct TelemetryView {
    manager: ChartLifecycleManager<TerminalCharts>,
    canvases: CanvasRegistry,
    settings: ChartSettings,
    plans: Vec<SlotPlan>,
    stats: Option<ApiStats>,
    status: ViewStatus,
}

impl TelemetryView {
    pub fn new(settings: ChartSettings) -> Self {
        let plans = ChartSlot::ALL
            .iter()
            .map(|slot| SlotPlan {
                slot: *slot,
                canvas: slot.default_canvas().to_string(),
                style: default_style(*slot, &settings),
            })
            .collect();
        Self {
            manager: ChartLifecycleManager::new(TerminalCharts::new()),
            canvases: CanvasRegistry::default(),
            settings,
            plans,
            stats: None,
            status: ViewStatus::Unmounted,
        }
    }

    pub fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn stats(&self) -> Option<&ApiStats> {
        self.stats.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.manager.generation()
    }

    pub fn manager(&self) -> &ChartLifecycleManager<TerminalCharts> {
        &self.manager
    }

    pub fn canvases_mut(&mut self) -> &mut CanvasRegistry {
        &mut self.canvases
    }

    pub fn is_mounted(&self) -> bool {
        self.status != ViewStatus::Unmounted
    }

    /// Lays out the canvases and returns the generation new payloads must carry.
    pub fn mount(&mut self) -> Generation {
        for plan in &self.plans {
            self.canvases.mount(&plan.canvas);
        }
        if self.status == ViewStatus::Unmounted {
            self.status = ViewStatus::Waiting;
        }
        self.manager.generation()
    }

    /// Destroys every chart, removes the canvases and invalidates in-flight payloads.
    pub fn teardown(&mut self) -> Generation {
        self.manager.destroy_all();
        self.canvases.unmount_all();
        self.status = ViewStatus::Unmounted;
        self.manager.advance_generation()
    }

    pub fn ingest(
        &mut self,
        generation: Generation,
        payload: &DashboardPayload,
    ) -> Result<RenderReport, DashboardError> {
        if let Err(err) = self.manager.check_generation(generation) {
            debug!(%err, "telemetry payload arrived for a torn-down view");
            return Err(err);
        }

        let prepared = TelemetrySeries::from_payload(payload)
            .and_then(|series| prepare(&series, &self.settings));
        let prepared = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                self.status = ViewStatus::Unavailable(err.to_string());
                return Err(err);
            }
        };

        let report = self
            .manager
            .render_all(&self.canvases, &prepared, &self.plans, generation)?;
        self.stats = Some(payload.api_stats.clone());
        self.status = ViewStatus::Ready;
        Ok(report)
    }

    /// Marks the panel unavailable when the source could not be reached.
    pub fn mark_unavailable(&mut self, generation: Generation, message: &str) -> bool {
        if self.manager.check_generation(generation).is_err() {
            return false;
        }
        self.status = ViewStatus::Unavailable(message.to_string());
        true
    }

    pub fn chart(&self, slot: ChartSlot) -> Option<&ChartInstance> {
        let plan = self.plans.iter().find(|p| p.slot == slot)?;
        self.manager.backend().instance_on(&plan.canvas)
    }
}
