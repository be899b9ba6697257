use league_dashboard::chart_lifecycle::ChartSlot;
use league_dashboard::config::DashboardConfig;
use league_dashboard::dashboard::ViewStatus;
use league_dashboard::fixtures::{Fixture, MatchStatus};
use league_dashboard::league::{LeagueMetrics, Scorer, StandingRow, TeamGoals};
use league_dashboard::state::{AppState, Delta, ProviderCommand, Screen, apply_delta};
use league_dashboard::telemetry::{ApiStats, ApiTrend, DashboardPayload};

use chrono::NaiveDate;

fn payload(len: usize) -> DashboardPayload {
    DashboardPayload {
        api_stats: ApiStats {
            calls: 120,
            success_rate: 97.5,
            response_time: 0.21,
            errors: 3,
            uptime_secs: 7200,
        },
        api_trend: ApiTrend {
            calls: (0..len).map(|i| i as f64).collect(),
            success_rate: vec![100.0; len],
            response_time: vec![0.2; len],
            errors: vec![0.0; len],
        },
        hours: (0..len).map(|h| format!("{:02}:00", h % 24)).collect(),
    }
}

fn fixture(id: &str, date: Option<(i32, u32, u32)>, home: &str, away: &str) -> Fixture {
    Fixture {
        id: id.to_string(),
        date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        time: Some("19:00:00".to_string()),
        home: home.to_string(),
        away: away.to_string(),
        score: None,
        ft_score: None,
        status: MatchStatus::Scheduled,
    }
}

#[test]
fn telemetry_payload_renders_all_four_charts() {
    let mut state = AppState::new(&DashboardConfig::default());
    let generation = state.telemetry.generation();

    apply_delta(
        &mut state,
        Delta::Telemetry {
            generation,
            payload: payload(24),
        },
    );

    assert_eq!(state.telemetry.status(), &ViewStatus::Ready);
    assert_eq!(state.telemetry.manager().live_count(), 4);
    for slot in ChartSlot::ALL {
        let chart = state.telemetry.chart(slot).expect("chart rendered");
        assert_eq!(chart.data.values.len(), 12);
    }
    let response = state.telemetry.chart(ChartSlot::ResponseTime).unwrap();
    assert!((response.data.values[0] - 200.0).abs() < 1e-9);
    assert_eq!(state.telemetry.stats().map(|s| s.calls), Some(120));
}

#[test]
fn payload_for_a_torn_down_view_is_dropped() {
    let mut state = AppState::new(&DashboardConfig::default());
    let in_flight = state.telemetry.generation();

    assert_eq!(state.set_screen(Screen::Fixtures), None);
    let remounted = state.set_screen(Screen::Telemetry).expect("telemetry remounted");
    assert_ne!(remounted, in_flight);

    apply_delta(
        &mut state,
        Delta::Telemetry {
            generation: in_flight,
            payload: payload(12),
        },
    );
    assert_eq!(state.telemetry.manager().live_count(), 0);
    assert_eq!(state.telemetry.status(), &ViewStatus::Waiting);
    assert!(state.logs.is_empty());

    apply_delta(
        &mut state,
        Delta::Telemetry {
            generation: remounted,
            payload: payload(12),
        },
    );
    assert_eq!(state.telemetry.manager().live_count(), 4);
}

#[test]
fn leaving_the_panel_destroys_its_charts() {
    let mut state = AppState::new(&DashboardConfig::default());
    let generation = state.telemetry.generation();
    apply_delta(
        &mut state,
        Delta::Telemetry {
            generation,
            payload: payload(6),
        },
    );
    assert_eq!(state.telemetry.manager().backend().live_instances(), 4);

    state.set_screen(Screen::Fixtures);
    assert_eq!(state.telemetry.manager().backend().live_instances(), 0);
    assert_eq!(state.telemetry.manager().backend().destroyed(), 4);
    assert!(!state.telemetry.is_mounted());
}

#[test]
fn invalid_payload_marks_metrics_unavailable() {
    let mut state = AppState::new(&DashboardConfig::default());
    let generation = state.telemetry.generation();
    let mut bad = payload(6);
    bad.api_trend.errors.pop();

    apply_delta(
        &mut state,
        Delta::Telemetry {
            generation,
            payload: bad,
        },
    );

    assert!(matches!(state.telemetry.status(), ViewStatus::Unavailable(_)));
    assert_eq!(state.telemetry.manager().live_count(), 0);
    let last = state.logs.back().expect("warning logged");
    assert!(last.starts_with("[WARN] Metrics unavailable"));
    assert!(last.contains("errors"));
}

#[test]
fn fetch_error_is_ignored_once_the_view_moved_on() {
    let mut state = AppState::new(&DashboardConfig::default());
    let stale = state.telemetry.generation();
    state.set_screen(Screen::Fixtures);

    apply_delta(
        &mut state,
        Delta::TelemetryUnavailable {
            generation: stale,
            message: "connection refused".to_string(),
        },
    );
    assert!(state.logs.is_empty());
    assert_eq!(state.telemetry.status(), &ViewStatus::Unmounted);
}

#[test]
fn fixtures_are_grouped_with_the_sunday_shift() {
    let mut state = AppState::new(&DashboardConfig::default());
    state.set_screen(Screen::Fixtures);
    state.scroll = 40;

    apply_delta(
        &mut state,
        Delta::SetFixtures(vec![
            fixture("1", Some((2025, 3, 15)), "Club América", "Toluca"),
            fixture("2", Some((2025, 3, 14)), "Santos Laguna", "Atlético San Luis"),
            fixture("3", None, "Pumas", "Atlas"),
            fixture("4", Some((2025, 3, 15)), "León", "Necaxa"),
        ]),
    );

    let dates: Vec<_> = state.fixtures.days.iter().map(|d| d.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2025, 3, 15),
            NaiveDate::from_ymd_opt(2025, 3, 16),
            None,
        ]
    );
    assert_eq!(state.fixtures.days[0].fixtures.len(), 2);
    assert!(state.fixtures.updated.is_some());
    assert_eq!(state.scroll, 7);
}

fn standing(rank: u32, name: &str, scored: u32, conceded: u32) -> StandingRow {
    StandingRow {
        rank,
        name: name.to_string(),
        matches: 10,
        won: 5,
        drawn: 3,
        lost: 2,
        goals_scored: scored,
        goals_conceded: conceded,
        goal_diff: scored as i32 - conceded as i32,
        points: 18,
    }
}

#[test]
fn live_and_result_lists_are_kept_apart() {
    let mut state = AppState::new(&DashboardConfig::default());
    let mut live = fixture("10", Some((2025, 3, 15)), "Club América", "Toluca");
    live.status = MatchStatus::Live;
    live.score = Some("1 - 0".to_string());

    apply_delta(&mut state, Delta::SetLiveScores(vec![live]));
    apply_delta(
        &mut state,
        Delta::SetResults(vec![
            fixture("11", Some((2025, 3, 8)), "Pumas", "Atlas"),
            fixture("12", Some((2025, 3, 9)), "León", "Necaxa"),
        ]),
    );

    assert_eq!(state.live.matches.len(), 1);
    assert_eq!(state.live.days.len(), 1);
    assert_eq!(state.results.days.len(), 2);
    assert!(state.fixtures.updated.is_none());
    assert!(state.is_loaded(Screen::Live));
    assert!(state.is_loaded(Screen::Results));
    assert!(!state.is_loaded(Screen::Fixtures));
}

#[test]
fn standings_replace_the_table_and_clamp_scroll() {
    let mut state = AppState::new(&DashboardConfig::default());
    state.set_screen(Screen::Standings);
    state.scroll = 30;

    let table: Vec<_> = (1..=18)
        .map(|rank| standing(rank, &format!("Equipo {rank}"), 20 - rank, rank))
        .collect();
    apply_delta(&mut state, Delta::SetStandings(table));

    assert_eq!(state.standings.len(), 18);
    assert!(state.standings_updated.is_some());
    assert_eq!(state.scroll, 18);

    state.scroll_down();
    assert_eq!(state.scroll, 18);
}

#[test]
fn metrics_without_team_goals_fall_back_to_standings() {
    let mut state = AppState::new(&DashboardConfig::default());
    apply_delta(
        &mut state,
        Delta::SetStandings(vec![
            standing(1, "Toluca", 20, 8),
            standing(2, "Club América", 25, 10),
            standing(3, "Pumas", 20, 5),
        ]),
    );

    apply_delta(
        &mut state,
        Delta::SetMetrics(LeagueMetrics {
            top_scorers: vec![Scorer {
                name: "Paulinho".to_string(),
                team: "Toluca".to_string(),
                goals: 9,
            }],
            goals_by_team: Vec::new(),
        }),
    );

    let teams: Vec<_> = state.metrics.goals_by_team.iter().map(|t| t.team.as_str()).collect();
    assert_eq!(teams, vec!["Club América", "Pumas", "Toluca"]);
    assert!(state.is_loaded(Screen::Metrics));
}

#[test]
fn metrics_with_team_goals_are_kept() {
    let mut state = AppState::new(&DashboardConfig::default());
    apply_delta(&mut state, Delta::SetStandings(vec![standing(1, "Toluca", 20, 8)]));

    let own = vec![TeamGoals {
        team: "Monterrey".to_string(),
        scored: 18,
        conceded: 7,
    }];
    apply_delta(
        &mut state,
        Delta::SetMetrics(LeagueMetrics {
            top_scorers: Vec::new(),
            goals_by_team: own.clone(),
        }),
    );
    assert_eq!(state.metrics.goals_by_team, own);
}

#[test]
fn switching_screens_resets_scroll_and_maps_hotkeys() {
    let mut state = AppState::new(&DashboardConfig::default());
    apply_delta(
        &mut state,
        Delta::SetFixtures(vec![fixture("1", Some((2025, 3, 15)), "Pumas", "Atlas")]),
    );
    state.set_screen(Screen::Fixtures);
    state.scroll_down();
    assert_eq!(state.scroll, 1);

    assert_eq!(state.set_screen(Screen::Standings), None);
    assert_eq!(state.scroll, 0);
    assert!(!state.telemetry.is_mounted());

    for screen in Screen::ALL {
        assert_eq!(Screen::from_hotkey(screen.hotkey()), Some(screen));
    }
    assert_eq!(Screen::from_hotkey('7'), None);
    assert!(ProviderCommand::for_screen(Screen::Telemetry).is_none());
    assert!(matches!(
        ProviderCommand::for_screen(Screen::Results),
        Some(ProviderCommand::FetchResults)
    ));
}

#[test]
fn console_keeps_the_newest_two_hundred_lines() {
    let mut state = AppState::new(&DashboardConfig::default());
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("[INFO] line {i}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] line 50"));
}

#[test]
fn missing_canvas_is_logged_and_siblings_render() {
    let mut state = AppState::new(&DashboardConfig::default());
    let generation = state.telemetry.generation();
    assert!(state.telemetry.canvases_mut().unmount("success-rate-chart"));

    apply_delta(
        &mut state,
        Delta::Telemetry {
            generation,
            payload: payload(12),
        },
    );

    assert_eq!(state.telemetry.manager().live_count(), 3);
    assert!(state.telemetry.chart(ChartSlot::SuccessRate).is_none());
    assert_eq!(state.telemetry.status(), &ViewStatus::Ready);
    assert_eq!(
        state.logs.back().map(String::as_str),
        Some("[WARN] success-rate chart not rendered: render target `success-rate-chart` for success-rate chart is missing")
    );
}
