use std::collections::VecDeque;
use std::time::SystemTime;

use chrono::Weekday;

use crate::chart_lifecycle::Generation;
use crate::config::DashboardConfig;
use crate::dashboard::TelemetryView;
use crate::error::DashboardError;
use crate::fixtures::{DateShiftRule, Fixture, FixtureDay, KickoffClock, TeamLogoTable, group_by_date};
use crate::league::{LeagueMetrics, StandingRow, goals_from_standings};
use crate::telemetry::DashboardPayload;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Telemetry,
    Fixtures,
    Standings,
    Live,
    Results,
    Metrics,
}

impl Screen {
    pub const ALL: [Screen; 6] = [
        Screen::Telemetry,
        Screen::Fixtures,
        Screen::Standings,
        Screen::Live,
        Screen::Results,
        Screen::Metrics,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Screen::Telemetry => "API TELEMETRY",
            Screen::Fixtures => "FIXTURES",
            Screen::Standings => "STANDINGS",
            Screen::Live => "LIVE SCORES",
            Screen::Results => "RESULTS",
            Screen::Metrics => "LEAGUE METRICS",
        }
    }

    pub fn hotkey(self) -> char {
        match self {
            Screen::Telemetry => '1',
            Screen::Fixtures => '2',
            Screen::Standings => '3',
            Screen::Live => '4',
            Screen::Results => '5',
            Screen::Metrics => '6',
        }
    }

    pub fn from_hotkey(key: char) -> Option<Self> {
        Self::ALL.into_iter().find(|screen| screen.hotkey() == key)
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    Telemetry {
        generation: Generation,
        payload: DashboardPayload,
    },
    TelemetryUnavailable {
        generation: Generation,
        message: String,
    },
    SetFixtures(Vec<Fixture>),
    SetLiveScores(Vec<Fixture>),
    SetResults(Vec<Fixture>),
    SetStandings(Vec<StandingRow>),
    SetMetrics(LeagueMetrics),
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchTelemetry { generation: Generation },
    FetchFixtures,
    FetchLiveScores,
    FetchResults,
    FetchStandings,
    FetchMetrics,
}

impl ProviderCommand {
    /// The fetch that fills a league screen; telemetry needs a generation instead.
    pub fn for_screen(screen: Screen) -> Option<Self> {
        match screen {
            Screen::Telemetry => None,
            Screen::Fixtures => Some(ProviderCommand::FetchFixtures),
            Screen::Standings => Some(ProviderCommand::FetchStandings),
            Screen::Live => Some(ProviderCommand::FetchLiveScores),
            Screen::Results => Some(ProviderCommand::FetchResults),
            Screen::Metrics => Some(ProviderCommand::FetchMetrics),
        }
    }
}

/// One list of matches plus its date grouping.
#[derive(Debug, Clone, Default)]
pub struct MatchList {
    pub matches: Vec<Fixture>,
    pub days: Vec<FixtureDay>,
    pub updated: Option<SystemTime>,
}

impl MatchList {
    fn replace(&mut self, matches: Vec<Fixture>, rules: &[DateShiftRule], logos: &TeamLogoTable) {
        self.days = group_by_date(&matches, rules, logos);
        self.matches = matches;
        self.updated = Some(SystemTime::now());
    }

    /// Rendered lines: a heading per day plus one per match.
    pub fn line_count(&self) -> usize {
        self.matches.len() + self.days.len()
    }
}

pub struct AppState {
    pub screen: Screen,
    pub telemetry: TelemetryView,
    pub fixtures: MatchList,
    pub live: MatchList,
    pub results: MatchList,
    pub standings: Vec<StandingRow>,
    pub standings_updated: Option<SystemTime>,
    pub metrics: LeagueMetrics,
    pub metrics_updated: Option<SystemTime>,
    pub scroll: u16,
    pub logos: TeamLogoTable,
    pub shift_rules: Vec<DateShiftRule>,
    pub clock: KickoffClock,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl AppState {
    pub fn new(config: &DashboardConfig) -> Self {
        let mut telemetry = TelemetryView::new(config.charts);
        telemetry.mount();
        Self {
            screen: Screen::Telemetry,
            telemetry,
            fixtures: MatchList::default(),
            live: MatchList::default(),
            results: MatchList::default(),
            standings: Vec::new(),
            standings_updated: None,
            metrics: LeagueMetrics::default(),
            metrics_updated: None,
            scroll: 0,
            logos: TeamLogoTable::liga_mx(),
            shift_rules: vec![DateShiftRule::new(
                "Santos Laguna",
                "Atlético San Luis",
                Weekday::Sun,
            )],
            clock: KickoffClock::new(config.kickoff_utc_offset_hours),
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        if self.logs.len() == MAX_LOGS {
            self.logs.pop_front();
        }
        self.logs.push_back(msg.into());
    }

    /// Switches screens. Returns the generation to fetch telemetry for when
    /// the telemetry panel has just been mounted.
    pub fn set_screen(&mut self, screen: Screen) -> Option<Generation> {
        if self.screen == screen {
            return None;
        }
        let leaving_telemetry = self.screen == Screen::Telemetry;
        self.screen = screen;
        self.scroll = 0;
        if leaving_telemetry {
            self.telemetry.teardown();
        }
        if screen == Screen::Telemetry {
            return Some(self.telemetry.mount());
        }
        None
    }

    pub fn is_loaded(&self, screen: Screen) -> bool {
        match screen {
            Screen::Telemetry => self.telemetry.stats().is_some(),
            Screen::Fixtures => self.fixtures.updated.is_some(),
            Screen::Live => self.live.updated.is_some(),
            Screen::Results => self.results.updated.is_some(),
            Screen::Standings => self.standings_updated.is_some(),
            Screen::Metrics => self.metrics_updated.is_some(),
        }
    }

    /// Scrollable line count of the active screen.
    pub fn content_lines(&self) -> usize {
        match self.screen {
            Screen::Telemetry => 0,
            Screen::Fixtures => self.fixtures.line_count(),
            Screen::Live => self.live.line_count(),
            Screen::Results => self.results.line_count(),
            Screen::Standings => self.standings.len(),
            Screen::Metrics => self.metrics.top_scorers.len() + self.metrics.goals_by_team.len(),
        }
    }

    pub fn scroll_down(&mut self) {
        let max = u16::try_from(self.content_lines()).unwrap_or(u16::MAX);
        self.scroll = self.scroll.saturating_add(1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    fn clamp_scroll(&mut self) {
        let max = u16::try_from(self.content_lines()).unwrap_or(u16::MAX);
        self.scroll = self.scroll.min(max);
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Telemetry {
            generation,
            payload,
        } => match state.telemetry.ingest(generation, &payload) {
            Ok(report) => {
                for (slot, err) in report.failures() {
                    state.push_log(format!("[WARN] {slot} chart not rendered: {err}"));
                }
            }
            Err(DashboardError::StaleGeneration { .. }) => {}
            Err(err) => state.push_log(format!("[WARN] Metrics unavailable: {err}")),
        },
        Delta::TelemetryUnavailable {
            generation,
            message,
        } => {
            if state.telemetry.mark_unavailable(generation, &message) {
                state.push_log(format!("[WARN] Telemetry fetch error: {message}"));
            }
        }
        Delta::SetFixtures(matches) => {
            state.fixtures.replace(matches, &state.shift_rules, &state.logos);
            state.clamp_scroll();
        }
        Delta::SetLiveScores(matches) => {
            state.live.replace(matches, &state.shift_rules, &state.logos);
            state.clamp_scroll();
        }
        Delta::SetResults(matches) => {
            state.results.replace(matches, &state.shift_rules, &state.logos);
            state.clamp_scroll();
        }
        Delta::SetStandings(table) => {
            state.standings = table;
            state.standings_updated = Some(SystemTime::now());
            state.clamp_scroll();
        }
        Delta::SetMetrics(mut metrics) => {
            if metrics.goals_by_team.is_empty() && !state.standings.is_empty() {
                metrics.goals_by_team = goals_from_standings(&state.standings);
            }
            state.metrics = metrics;
            state.metrics_updated = Some(SystemTime::now());
            state.clamp_scroll();
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
