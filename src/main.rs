use std::fs;
use std::io;
use std::sync::Mutex;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, Paragraph, Row, Table};
use tracing_subscriber::EnvFilter;

use league_dashboard::chart_lifecycle::ChartSlot;
use league_dashboard::config::{DashboardConfig, TelemetrySource, app_cache_dir};
use league_dashboard::dashboard::ViewStatus;
use league_dashboard::feed;
use league_dashboard::fixtures::{MatchStatus, score_display};
use league_dashboard::league::{PositionBand, format_goal_diff};
use league_dashboard::state::{self, AppState, MatchList, ProviderCommand, Screen, apply_delta};
use league_dashboard::tui_charts::draw_chart;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    telemetry_refresh: Duration,
    league_refresh: Duration,
    live_refresh: Duration,
    last_refresh: Instant,
}

impl App {
    fn new(config: &DashboardConfig, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(config),
            should_quit: false,
            cmd_tx,
            telemetry_refresh: config.telemetry_poll,
            league_refresh: config.fixtures_poll,
            live_refresh: config.live_poll,
            last_refresh: Instant::now(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_current(true),
            KeyCode::Char('j') | KeyCode::Down => self.state.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.state.scroll_up(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Char(c) => {
                if let Some(screen) = Screen::from_hotkey(c) {
                    self.switch_screen(screen);
                }
            }
            _ => {}
        }
    }

    fn switch_screen(&mut self, screen: Screen) {
        if self.state.screen == screen {
            return;
        }
        if let Some(generation) = self.state.set_screen(screen) {
            self.send(ProviderCommand::FetchTelemetry { generation }, false);
            return;
        }
        // Live scores go stale fast; other screens keep what they loaded.
        if screen == Screen::Live || !self.state.is_loaded(screen) {
            self.request_current(false);
        }
    }

    fn request_current(&mut self, announce: bool) {
        let cmd = match ProviderCommand::for_screen(self.state.screen) {
            Some(cmd) => cmd,
            None => ProviderCommand::FetchTelemetry {
                generation: self.state.telemetry.generation(),
            },
        };
        self.send(cmd, announce);
    }

    fn send(&mut self, cmd: ProviderCommand, announce: bool) {
        let what = self.state.screen.title();
        let Some(tx) = &self.cmd_tx else {
            if announce {
                self.state.push_log(format!("[INFO] {what} fetch unavailable"));
            }
            return;
        };
        if tx.send(cmd).is_err() {
            if announce {
                self.state.push_log(format!("[WARN] {what} request failed"));
            }
        } else {
            if announce {
                self.state.push_log(format!("[INFO] {what} request sent"));
            }
            self.last_refresh = Instant::now();
        }
    }

    fn maybe_refresh(&mut self) {
        let interval = match self.state.screen {
            Screen::Telemetry => self.telemetry_refresh,
            Screen::Live => self.live_refresh,
            _ => self.league_refresh,
        };
        if self.last_refresh.elapsed() >= interval {
            self.request_current(false);
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing();

    let config = DashboardConfig::from_env();
    tracing::info!(
        source = ?config.telemetry_source,
        window_hours = config.charts.window_hours,
        label_count = config.charts.label_count,
        "starting league dashboard"
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    feed::spawn_provider(tx, cmd_rx, config.clone());

    let mut app = App::new(&config, Some(cmd_tx));
    app.request_current(false);
    if config.telemetry_source == TelemetrySource::Http {
        app.state.push_log(format!("[INFO] Telemetry from {}", config.telemetry_url));
    }
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

// Logs go to a file: the terminal belongs to the alternate screen.
fn init_tracing() {
    let Some(dir) = app_cache_dir() else {
        return;
    };
    let _ = fs::create_dir_all(&dir);
    let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("dashboard.log"))
    else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.maybe_refresh();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let state = &app.state;
    match state.screen {
        Screen::Telemetry => render_telemetry(frame, chunks[1], state),
        Screen::Fixtures => render_matches(frame, chunks[1], state, &state.fixtures, "Fixtures"),
        Screen::Live => render_matches(frame, chunks[1], state, &state.live, "Live scores"),
        Screen::Results => render_matches(frame, chunks[1], state, &state.results, "Results"),
        Screen::Standings => render_standings(frame, chunks[1], state),
        Screen::Metrics => render_metrics(frame, chunks[1], state),
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let title = match state.screen {
        Screen::Telemetry => format!(
            "LEAGUE DASHBOARD | API TELEMETRY | {}",
            state.telemetry.settings().window_title()
        ),
        other => format!("LEAGUE DASHBOARD | {}", other.title()),
    };
    let unit = state.telemetry.settings().response_unit;
    let stats = match state.telemetry.stats() {
        Some(s) => format!(
            "Calls {} | Success {:.1}% | Avg {} | Errors {} | Uptime {}",
            s.calls,
            s.success_rate,
            unit.format(s.response_time),
            s.errors,
            format_uptime(s.uptime_secs)
        ),
        None => "Waiting for telemetry".to_string(),
    };
    format!("{title}\n{stats}")
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    format!("{hours}h {minutes:02}m")
}

fn footer_text(state: &AppState) -> String {
    let tabs = Screen::ALL
        .iter()
        .map(|screen| {
            let marker = if *screen == state.screen { "*" } else { "" };
            format!("{} {}{marker}", screen.hotkey(), screen.title().to_lowercase())
        })
        .collect::<Vec<_>>()
        .join(" | ");
    match state.screen {
        Screen::Telemetry => format!("{tabs} | r Refresh | ? Help | q Quit"),
        _ => format!("{tabs} | j/k Scroll | r Refresh | ? Help | q Quit"),
    }
}

fn render_telemetry(frame: &mut Frame, area: Rect, state: &AppState) {
    let view = &state.telemetry;
    if let ViewStatus::Unavailable(reason) = view.status() {
        let text = format!("Metrics unavailable\n\n{reason}");
        let msg = Paragraph::new(text)
            .style(Style::default().fg(Color::Red))
            .block(Block::default().title("Telemetry").borders(Borders::ALL));
        frame.render_widget(msg, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    let cells = [top[0], top[1], bottom[0], bottom[1]];

    for (slot, cell) in ChartSlot::ALL.iter().zip(cells) {
        match view.chart(*slot) {
            Some(instance) => draw_chart(frame, cell, instance),
            None => {
                let empty = Paragraph::new("Loading…")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(Block::default().title(slot.key()).borders(Borders::ALL));
                frame.render_widget(empty, cell);
            }
        }
    }
}

fn render_matches(frame: &mut Frame, area: Rect, state: &AppState, list: &MatchList, title: &str) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    if list.days.is_empty() {
        let text = if list.updated.is_some() {
            format!("No {} available", title.to_lowercase())
        } else {
            "Loading…".to_string()
        };
        let empty = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for day in &list.days {
        lines.push(Line::styled(
            state.clock.format_date(day.date),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        for fixture in &day.fixtures {
            let (status_style, status) = match fixture.status {
                MatchStatus::Live => (Style::default().fg(Color::Green), "LIVE"),
                MatchStatus::Finished => (Style::default().fg(Color::Gray), "FT"),
                MatchStatus::Scheduled => (Style::default().fg(Color::Yellow), "SCH"),
            };
            let kickoff = fixture
                .time
                .as_deref()
                .map(|t| state.clock.format_time(t))
                .unwrap_or_default();
            lines.push(Line::from(vec![
                Span::styled(format!("  {status:<4}"), status_style),
                Span::raw(format!("{kickoff:>9}  ")),
                Span::raw(format!(
                    "[{}] {} {} {} [{}]",
                    state.logos.stem(&fixture.home),
                    fixture.home,
                    score_display(fixture),
                    fixture.away,
                    state.logos.stem(&fixture.away)
                )),
            ]));
        }
        lines.push(Line::raw(""));
    }

    let paragraph = Paragraph::new(lines).block(block).scroll((state.scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_standings(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Standings").borders(Borders::ALL);
    if state.standings.is_empty() {
        let text = if state.standings_updated.is_some() {
            "No standings available"
        } else {
            "Loading…"
        };
        let empty = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(["#", "Team", "MP", "W", "D", "L", "GF", "GA", "GD", "Pts"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = state
        .standings
        .iter()
        .enumerate()
        .skip(state.scroll as usize)
        .map(|(idx, row)| {
            let band = match PositionBand::for_index(idx) {
                PositionBand::Liguilla => Style::default().fg(Color::Green),
                PositionBand::PlayIn => Style::default().fg(Color::Yellow),
                PositionBand::Out => Style::default(),
            };
            Row::new(vec![
                Cell::from(row.rank.to_string()).style(band),
                Cell::from(format!("[{}] {}", state.logos.stem(&row.name), row.name)),
                Cell::from(row.matches.to_string()),
                Cell::from(row.won.to_string()),
                Cell::from(row.drawn.to_string()),
                Cell::from(row.lost.to_string()),
                Cell::from(row.goals_scored.to_string()),
                Cell::from(row.goals_conceded.to_string()),
                Cell::from(format_goal_diff(row.goal_diff)),
                Cell::from(row.points.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(3),
        Constraint::Min(20),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(4),
        Constraint::Length(4),
    ];
    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn render_metrics(frame: &mut Frame, area: Rect, state: &AppState) {
    let metrics = &state.metrics;
    if metrics.is_empty() {
        let text = if state.metrics_updated.is_some() {
            "No league metrics available"
        } else {
            "Loading…"
        };
        let empty = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title("League metrics").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let scorer_bars: Vec<Bar> = metrics
        .top_scorers
        .iter()
        .map(|scorer| {
            Bar::default()
                .value(u64::from(scorer.goals))
                .label(Line::from(format!("{} ({})", scorer.name, scorer.team)))
                .style(Style::default().fg(Color::Rgb(54, 162, 235)))
        })
        .collect();
    let scorers = BarChart::default()
        .block(Block::default().title("Top scorers").borders(Borders::ALL))
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&scorer_bars))
        .bar_width(1)
        .bar_gap(0);
    frame.render_widget(scorers, halves[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(halves[1]);

    let groups: Vec<BarGroup> = metrics
        .goals_by_team
        .iter()
        .map(|team| {
            BarGroup::default()
                .label(Line::from(state.logos.stem(&team.team)))
                .bars(&[
                    Bar::default()
                        .value(u64::from(team.scored))
                        .style(Style::default().fg(Color::Rgb(147, 112, 219))),
                    Bar::default()
                        .value(u64::from(team.conceded))
                        .style(Style::default().fg(Color::Rgb(135, 206, 250))),
                ])
        })
        .collect();
    let mut goals_chart = BarChart::default()
        .block(
            Block::default()
                .title("Goals scored / conceded")
                .borders(Borders::ALL),
        )
        .bar_width(3)
        .bar_gap(0)
        .group_gap(2);
    for group in groups {
        goals_chart = goals_chart.data(group);
    }
    frame.render_widget(goals_chart, right[0]);

    let rows: Vec<Row> = metrics
        .goals_by_team
        .iter()
        .map(|team| {
            Row::new(vec![
                Cell::from(format!("[{}] {}", state.logos.stem(&team.team), team.team)),
                Cell::from(team.scored.to_string()).style(Style::default().fg(Color::Green)),
                Cell::from(team.conceded.to_string()).style(Style::default().fg(Color::Red)),
                Cell::from(format_goal_diff(team.diff())),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(4),
        ],
    )
    .header(Row::new(["Team", "GF", "GA", "GD"]).style(Style::default().add_modifier(Modifier::BOLD)))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(table, right[1]);
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let start = state.logs.len().saturating_sub(1);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 50, area);
    frame.render_widget(Clear, popup_area);

    let mut lines = vec!["League Dashboard - Help".to_string(), String::new(), "Screens:".to_string()];
    lines.extend(
        Screen::ALL
            .iter()
            .map(|screen| format!("  {}            {}", screen.hotkey(), screen.title().to_lowercase())),
    );
    lines.extend(
        [
            "",
            "Global:",
            "  r            Refresh current screen",
            "  j/k or ↑/↓   Scroll",
            "  ?            Toggle help",
            "  q            Quit",
        ]
        .map(str::to_string),
    );
    let text = lines.join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
