use std::collections::{HashMap, HashSet};

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph};

use crate::chart_lifecycle::{ChartBackend, ChartData, RenderTargets};
use crate::chart_style::{ChartKind, StyleConfig};
use crate::error::DashboardError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanvasId(String);

impl CanvasId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The canvases currently laid out on screen.
#[derive(Debug, Clone, Default)]
pub struct CanvasRegistry {
    mounted: HashSet<String>,
}

impl CanvasRegistry {
    pub fn mount(&mut self, canvas_id: &str) {
        self.mounted.insert(canvas_id.to_string());
    }

    pub fn unmount(&mut self, canvas_id: &str) -> bool {
        self.mounted.remove(canvas_id)
    }

    pub fn unmount_all(&mut self) {
        self.mounted.clear();
    }

    pub fn is_mounted(&self, canvas_id: &str) -> bool {
        self.mounted.contains(canvas_id)
    }
}

impl RenderTargets for CanvasRegistry {
    type Target = CanvasId;

    fn resolve(&self, canvas_id: &str) -> Option<CanvasId> {
        self.mounted
            .contains(canvas_id)
            .then(|| CanvasId(canvas_id.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartHandle(u64);

#[derive(Debug, Clone)]
pub struct ChartInstance {
    pub canvas: CanvasId,
    pub kind: ChartKind,
    pub data: ChartData,
    pub style: StyleConfig,
}

/// Chart instances drawn with ratatui widgets.
///
/// Like a browser canvas, a terminal canvas can be bound to only one chart
/// at a time; constructing onto a bound canvas fails with `CanvasInUse`.
#[derive(Debug, Default)]
pub struct TerminalCharts {
    instances: HashMap<ChartHandle, ChartInstance>,
    bound: HashMap<CanvasId, ChartHandle>,
    next_handle: u64,
    constructed: u64,
    destroyed: u64,
}

impl TerminalCharts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance(&self, handle: ChartHandle) -> Option<&ChartInstance> {
        self.instances.get(&handle)
    }

    pub fn instance_on(&self, canvas_id: &str) -> Option<&ChartInstance> {
        let handle = self.bound.get(&CanvasId(canvas_id.to_string()))?;
        self.instances.get(handle)
    }

    pub fn live_instances(&self) -> usize {
        self.instances.len()
    }

    pub fn constructed(&self) -> u64 {
        self.constructed
    }

    pub fn destroyed(&self) -> u64 {
        self.destroyed
    }
}

impl ChartBackend for TerminalCharts {
    type Target = CanvasId;
    type Handle = ChartHandle;

    fn construct(
        &mut self,
        target: &CanvasId,
        kind: ChartKind,
        data: ChartData,
        style: &StyleConfig,
    ) -> Result<ChartHandle, DashboardError> {
        if self.bound.contains_key(target) {
            return Err(DashboardError::CanvasInUse(target.0.clone()));
        }
        self.next_handle += 1;
        let handle = ChartHandle(self.next_handle);
        self.bound.insert(target.clone(), handle);
        self.instances.insert(
            handle,
            ChartInstance {
                canvas: target.clone(),
                kind,
                data,
                style: style.clone(),
            },
        );
        self.constructed += 1;
        Ok(handle)
    }

    fn destroy(&mut self, handle: ChartHandle) {
        if let Some(instance) = self.instances.remove(&handle) {
            self.bound.remove(&instance.canvas);
            self.destroyed += 1;
        }
    }

    fn update(&mut self, handle: ChartHandle, data: ChartData) -> Result<(), DashboardError> {
        let instance = self
            .instances
            .get_mut(&handle)
            .ok_or(DashboardError::UnknownHandle(handle.0))?;
        instance.data = data;
        Ok(())
    }
}

/// Draws one chart instance into `area`, with its tooltip line underneath.
pub fn draw_chart(frame: &mut Frame, area: Rect, instance: &ChartInstance) {
    let style = &instance.style;
    let block = Block::default()
        .title(style.dataset_label.clone())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(style.color));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 || inner.width < 4 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    match instance.kind {
        ChartKind::Line => draw_line(frame, rows[0], instance),
        ChartKind::Bar => draw_bars(frame, rows[0], instance),
    }

    let tooltip = latest_tooltip(instance).unwrap_or_else(|| "No data yet".to_string());
    let tooltip = Paragraph::new(tooltip).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(tooltip, rows[1]);
}

/// Tooltip text for the newest point, if any.
pub fn latest_tooltip(instance: &ChartInstance) -> Option<String> {
    let value = *instance.data.values.last()?;
    let hour = instance.data.hours.last()?;
    Some(instance.style.tooltip(hour, value))
}

/// Lower and upper y bounds for a value set under `style`.
pub fn y_bounds(values: &[f64], style: &StyleConfig) -> [f64; 2] {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lower = if style.begin_at_zero || !min.is_finite() {
        0.0
    } else {
        min
    };
    let upper = match style.axis_max {
        Some(cap) => cap,
        None if max.is_finite() => max * 1.1,
        None => 1.0,
    };
    [lower, upper.max(lower + 1.0)]
}

/// Vertical columns of points from `floor` up to each value, `rows` steps
/// per full column. Drawn dimmed under a line to shade the area.
pub fn fill_points(points: &[(f64, f64)], floor: f64, rows: usize) -> Vec<(f64, f64)> {
    let rows = rows.max(1);
    let mut fill = Vec::with_capacity(points.len() * rows);
    for &(x, y) in points {
        if y <= floor {
            continue;
        }
        let step = (y - floor) / rows as f64;
        fill.extend((0..rows).map(|k| (x, floor + step * k as f64)));
    }
    fill
}

fn draw_line(frame: &mut Frame, area: Rect, instance: &ChartInstance) {
    let style = &instance.style;
    let points: Vec<(f64, f64)> = instance
        .data
        .values
        .iter()
        .enumerate()
        .map(|(idx, v)| (idx as f64, *v))
        .collect();

    let [y_min, y_max] = y_bounds(&instance.data.values, style);
    let line_style = Style::default().fg(style.color);
    // Braille cells are four dots tall.
    let fill = if style.fill_under_curve {
        fill_points(&points, y_min, usize::from(area.height) * 4)
    } else {
        Vec::new()
    };

    let mut datasets = Vec::with_capacity(3);
    if !fill.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Scatter)
                .style(line_style.add_modifier(Modifier::DIM))
                .data(&fill),
        );
    }
    datasets.push(
        Dataset::default()
            .name(style.dataset_label.clone())
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(line_style)
            .data(&points),
    );
    if style.show_points {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(line_style.add_modifier(Modifier::BOLD))
                .data(&points),
        );
    }

    let x_max = points.len().saturating_sub(1).max(1) as f64;
    let x_labels: Vec<Span<'static>> = instance
        .data
        .tick_labels
        .iter()
        .filter(|label| !label.is_empty())
        .map(|label| Span::raw(label.clone()))
        .collect();
    let y_labels = vec![
        Span::raw(format!("{y_min:.0}")),
        Span::raw(format!("{:.0}", (y_min + y_max) / 2.0)),
        Span::raw(format!("{y_max:.0}")),
    ];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title(style.x_axis_title.clone())
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(style.y_axis_title.clone())
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(y_labels),
        );
    frame.render_widget(chart, area);
}

fn draw_bars(frame: &mut Frame, area: Rect, instance: &ChartInstance) {
    let style = &instance.style;
    let count = instance.data.values.len();
    if count == 0 {
        frame.render_widget(Paragraph::new(style.y_axis_title.clone()), area);
        return;
    }

    let bar_style = Style::default().fg(style.color);
    let bars: Vec<Bar> = instance
        .data
        .values
        .iter()
        .enumerate()
        .map(|(idx, v)| {
            let label = instance.data.tick_labels.get(idx).cloned().unwrap_or_default();
            Bar::default()
                .value((*v).max(0.0).round() as u64)
                .text_value(String::new())
                .label(Line::from(label))
                .style(bar_style)
        })
        .collect();

    let gap = 1u16;
    let slots = u16::try_from(count).unwrap_or(u16::MAX);
    let width = (area.width.saturating_sub(gap.saturating_mul(slots)) / slots).max(1);
    let [_, y_max] = y_bounds(&instance.data.values, style);

    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(width)
        .bar_gap(gap)
        .max(y_max.ceil() as u64);
    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_lifecycle::ChartSlot;
    use crate::chart_style::default_style;
    use crate::chart_window::ChartSettings;

    fn data(values: &[f64]) -> ChartData {
        ChartData {
            hours: (0..values.len()).map(|h| format!("{h:02}:00")).collect(),
            tick_labels: (0..values.len()).map(|h| format!("{h:02}:00")).collect(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn second_construct_on_bound_canvas_fails() {
        let style = default_style(ChartSlot::Calls, &ChartSettings::compact());
        let mut charts = TerminalCharts::new();
        let canvas = CanvasId("calls-chart".to_string());
        let first = charts
            .construct(&canvas, ChartKind::Line, data(&[1.0]), &style)
            .expect("canvas is free");
        let err = charts
            .construct(&canvas, ChartKind::Line, data(&[2.0]), &style)
            .unwrap_err();
        assert_eq!(err, DashboardError::CanvasInUse("calls-chart".to_string()));

        charts.destroy(first);
        assert!(charts.construct(&canvas, ChartKind::Line, data(&[2.0]), &style).is_ok());
        assert_eq!(charts.live_instances(), 1);
    }

    #[test]
    fn registry_resolves_only_mounted_canvases() {
        let mut registry = CanvasRegistry::default();
        registry.mount("errors-chart");
        assert!(registry.resolve("errors-chart").is_some());
        assert!(registry.resolve("calls-chart").is_none());
        assert!(registry.unmount("errors-chart"));
        assert!(registry.resolve("errors-chart").is_none());
    }

    #[test]
    fn y_bounds_respect_axis_cap_and_zero_floor() {
        let rate = default_style(ChartSlot::SuccessRate, &ChartSettings::compact());
        assert_eq!(y_bounds(&[80.0, 95.0], &rate), [0.0, 100.0]);

        let calls = default_style(ChartSlot::Calls, &ChartSettings::compact());
        assert_eq!(y_bounds(&[], &calls), [0.0, 1.0]);
        let [lo, hi] = y_bounds(&[10.0, 20.0], &calls);
        assert_eq!(lo, 0.0);
        assert!((hi - 22.0).abs() < 1e-9);
    }

    #[test]
    fn tooltip_reports_newest_point() {
        let style = default_style(ChartSlot::Errors, &ChartSettings::compact());
        let instance = ChartInstance {
            canvas: CanvasId("errors-chart".to_string()),
            kind: ChartKind::Bar,
            data: data(&[0.0, 3.0]),
            style,
        };
        assert_eq!(latest_tooltip(&instance).as_deref(), Some("Hour: 01:00  Errors: 3"));
    }

    #[test]
    fn fill_columns_stop_below_each_value() {
        let fill = fill_points(&[(0.0, 10.0), (1.0, 0.0), (2.0, 4.0)], 0.0, 4);
        assert_eq!(
            fill,
            vec![
                (0.0, 0.0),
                (0.0, 2.5),
                (0.0, 5.0),
                (0.0, 7.5),
                (2.0, 0.0),
                (2.0, 1.0),
                (2.0, 2.0),
                (2.0, 3.0),
            ]
        );
        assert!(fill_points(&[(0.0, 3.0)], 5.0, 8).is_empty());
    }

    #[test]
    fn filled_line_and_long_bar_series_draw() {
        use ratatui::Terminal;
        use ratatui::backend::TestBackend;

        let settings = ChartSettings::compact();
        let line = ChartInstance {
            canvas: CanvasId("calls-chart".to_string()),
            kind: ChartKind::Line,
            data: data(&[1.0, 4.0, 2.0, 8.0]),
            style: default_style(ChartSlot::Calls, &settings),
        };
        let many: Vec<f64> = (0..70_000).map(|i| (i % 5) as f64).collect();
        let bars = ChartInstance {
            canvas: CanvasId("errors-chart".to_string()),
            kind: ChartKind::Bar,
            data: data(&many),
            style: default_style(ChartSlot::Errors, &settings),
        };

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).expect("test terminal");
        terminal
            .draw(|f| {
                let area = f.size();
                let halves = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .split(area);
                draw_chart(f, halves[0], &line);
                draw_chart(f, halves[1], &bars);
            })
            .expect("draw succeeds");
    }
}
