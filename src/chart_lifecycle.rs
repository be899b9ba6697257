use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::chart_style::{ChartKind, StyleConfig};
use crate::chart_window::{AxisLabelPolicy, PreparedSeries, WindowedSeries};
use crate::error::DashboardError;
use crate::telemetry::TelemetrySeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChartSlot {
    Calls,
    SuccessRate,
    ResponseTime,
    Errors,
}

impl ChartSlot {
    pub const ALL: [ChartSlot; 4] = [
        ChartSlot::Calls,
        ChartSlot::SuccessRate,
        ChartSlot::ResponseTime,
        ChartSlot::Errors,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ChartSlot::Calls => "calls",
            ChartSlot::SuccessRate => "success-rate",
            ChartSlot::ResponseTime => "response-time",
            ChartSlot::Errors => "errors",
        }
    }

    pub fn default_canvas(self) -> &'static str {
        match self {
            ChartSlot::Calls => "calls-chart",
            ChartSlot::SuccessRate => "success-rate-chart",
            ChartSlot::ResponseTime => "response-time-chart",
            ChartSlot::Errors => "errors-chart",
        }
    }

    pub fn values(self, series: &TelemetrySeries) -> &[f64] {
        match self {
            ChartSlot::Calls => series.calls(),
            ChartSlot::SuccessRate => series.success_rate(),
            ChartSlot::ResponseTime => series.response_time(),
            ChartSlot::Errors => series.errors(),
        }
    }
}

impl fmt::Display for ChartSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Monotonic view generation. Payloads tagged with an older generation are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

/// The data handed to the chart library for one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub hours: Vec<String>,
    pub tick_labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartData {
    pub fn for_slot(slot: ChartSlot, windowed: &WindowedSeries, axis: &AxisLabelPolicy) -> Self {
        Self {
            hours: windowed.hours().to_vec(),
            tick_labels: axis.tick_labels(),
            values: slot.values(windowed.series()).to_vec(),
        }
    }
}

/// Resolves a canvas id to something a [`ChartBackend`] can draw into.
pub trait RenderTargets {
    type Target;

    fn resolve(&self, canvas_id: &str) -> Option<Self::Target>;
}

/// Minimal contract of the charting library.
pub trait ChartBackend {
    type Target;
    type Handle: Copy + fmt::Debug + PartialEq;

    fn construct(
        &mut self,
        target: &Self::Target,
        kind: ChartKind,
        data: ChartData,
        style: &StyleConfig,
    ) -> Result<Self::Handle, DashboardError>;

    fn destroy(&mut self, handle: Self::Handle);

    /// Replaces the data of a live instance without rebinding its canvas.
    fn update(&mut self, handle: Self::Handle, data: ChartData) -> Result<(), DashboardError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Created,
    Replaced,
    Updated,
}

// Everything that fixes how an instance is laid out; data can change, this cannot.
#[derive(Debug, Clone, PartialEq)]
struct ChartShape {
    kind: ChartKind,
    begin_at_zero: bool,
    axis_max: Option<f64>,
    stride: usize,
}

impl ChartShape {
    fn of(style: &StyleConfig, axis: &AxisLabelPolicy) -> Self {
        Self {
            kind: style.kind,
            begin_at_zero: style.begin_at_zero,
            axis_max: style.axis_max,
            stride: axis.stride(),
        }
    }
}

#[derive(Debug)]
struct LiveChart<H> {
    handle: H,
    canvas: String,
    shape: ChartShape,
}

/// One slot of a batch render: where it goes and how it looks.
#[derive(Debug, Clone)]
pub struct SlotPlan {
    pub slot: ChartSlot,
    pub canvas: String,
    pub style: StyleConfig,
}

#[derive(Debug, Default)]
pub struct RenderReport {
    pub outcomes: Vec<(ChartSlot, Result<RenderOutcome, DashboardError>)>,
}

impl RenderReport {
    pub fn rendered(&self) -> usize {
        self.outcomes.iter().filter(|(_, res)| res.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (ChartSlot, &DashboardError)> {
        self.outcomes
            .iter()
            .filter_map(|(slot, res)| res.as_ref().err().map(|err| (*slot, err)))
    }

    pub fn outcome(&self, slot: ChartSlot) -> Option<&Result<RenderOutcome, DashboardError>> {
        self.outcomes
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, res)| res)
    }
}

/// Owns the slot → live instance map and keeps at most one instance per slot.
///
/// Every replacement destroys the previous instance before the new one is
/// constructed, inside the same call. All operations check the caller's
/// generation first, so a payload that was in flight across a teardown can
/// never reach the backend.
pub struct ChartLifecycleManager<B: ChartBackend> {
    backend: B,
    slots: HashMap<ChartSlot, LiveChart<B::Handle>>,
    generation: Generation,
}

impl<B: ChartBackend> ChartLifecycleManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            slots: HashMap::with_capacity(ChartSlot::ALL.len()),
            generation: Generation::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn advance_generation(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }

    pub fn is_live(&self, slot: ChartSlot) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn live_count(&self) -> usize {
        self.slots.len()
    }

    pub fn handle(&self, slot: ChartSlot) -> Option<B::Handle> {
        self.slots.get(&slot).map(|live| live.handle)
    }

    pub fn check_generation(&self, generation: Generation) -> Result<(), DashboardError> {
        if generation != self.generation {
            return Err(DashboardError::StaleGeneration {
                got: generation.value(),
                current: self.generation.value(),
            });
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render<T>(
        &mut self,
        targets: &T,
        slot: ChartSlot,
        canvas: &str,
        windowed: &WindowedSeries,
        axis: &AxisLabelPolicy,
        style: &StyleConfig,
        generation: Generation,
    ) -> Result<RenderOutcome, DashboardError>
    where
        T: RenderTargets<Target = B::Target>,
    {
        self.check_generation(generation)?;
        // Resolve before touching the slot so a missing canvas leaves it as it was.
        let target = targets
            .resolve(canvas)
            .ok_or_else(|| DashboardError::RenderTargetMissing {
                slot,
                canvas: canvas.to_string(),
            })?;

        let replaced = match self.slots.remove(&slot) {
            Some(previous) => {
                self.backend.destroy(previous.handle);
                true
            }
            None => false,
        };

        let data = ChartData::for_slot(slot, windowed, axis);
        let handle = self.backend.construct(&target, style.kind, data, style)?;
        self.slots.insert(
            slot,
            LiveChart {
                handle,
                canvas: canvas.to_string(),
                shape: ChartShape::of(style, axis),
            },
        );

        Ok(if replaced {
            RenderOutcome::Replaced
        } else {
            RenderOutcome::Created
        })
    }

    /// Pushes new data into the live instance when its shape is unchanged,
    /// otherwise does a full [`render`](Self::render).
    #[allow(clippy::too_many_arguments)]
    pub fn update<T>(
        &mut self,
        targets: &T,
        slot: ChartSlot,
        canvas: &str,
        windowed: &WindowedSeries,
        axis: &AxisLabelPolicy,
        style: &StyleConfig,
        generation: Generation,
    ) -> Result<RenderOutcome, DashboardError>
    where
        T: RenderTargets<Target = B::Target>,
    {
        self.check_generation(generation)?;
        if targets.resolve(canvas).is_none() {
            return Err(DashboardError::RenderTargetMissing {
                slot,
                canvas: canvas.to_string(),
            });
        }
        let in_place = self.slots.get(&slot).and_then(|live| {
            (live.canvas == canvas && live.shape == ChartShape::of(style, axis)).then_some(live.handle)
        });

        if let Some(handle) = in_place {
            let data = ChartData::for_slot(slot, windowed, axis);
            match self.backend.update(handle, data) {
                Ok(()) => return Ok(RenderOutcome::Updated),
                Err(err) => debug!(%slot, %err, "in-place update refused, re-rendering"),
            }
        }
        self.render(targets, slot, canvas, windowed, axis, style, generation)
    }

    /// Renders every planned slot independently. A failing slot is logged and
    /// recorded in the report; the others still render.
    pub fn render_all<T>(
        &mut self,
        targets: &T,
        prepared: &PreparedSeries,
        plans: &[SlotPlan],
        generation: Generation,
    ) -> Result<RenderReport, DashboardError>
    where
        T: RenderTargets<Target = B::Target>,
    {
        if let Err(err) = self.check_generation(generation) {
            debug!(%err, "dropping stale telemetry batch");
            return Err(err);
        }

        let mut report = RenderReport::default();
        for plan in plans {
            let res = self.render(
                targets,
                plan.slot,
                &plan.canvas,
                &prepared.windowed,
                &prepared.axis,
                &plan.style,
                generation,
            );
            if let Err(err) = &res {
                warn!(slot = %plan.slot, %err, "chart render skipped");
            }
            report.outcomes.push((plan.slot, res));
        }
        info!(
            rendered = report.rendered(),
            planned = plans.len(),
            points = prepared.windowed.len(),
            "telemetry charts rendered"
        );
        Ok(report)
    }

    pub fn destroy_slot(&mut self, slot: ChartSlot) -> bool {
        match self.slots.remove(&slot) {
            Some(live) => {
                self.backend.destroy(live.handle);
                true
            }
            None => false,
        }
    }

    pub fn destroy_all(&mut self) {
        for (_, live) in self.slots.drain() {
            self.backend.destroy(live.handle);
        }
    }
}

impl<B: ChartBackend> Drop for ChartLifecycleManager<B> {
    fn drop(&mut self) {
        self.destroy_all();
    }
}
