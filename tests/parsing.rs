use league_dashboard::fixtures::{MatchStatus, parse_fixtures_json, score_display};
use league_dashboard::league::{PositionBand, parse_metrics_json, parse_standings_json};
use league_dashboard::telemetry::{TelemetrySeries, parse_dashboard_json};

const DASHBOARD_JSON: &str = r#"{
    "api_stats": {"calls": 42, "success_rate": 95.2, "response_time": 0.183, "errors": 2, "uptime": 3725},
    "api_trend": {
        "calls": [4, 7, 0],
        "success_rate": [100, 86, 100],
        "response_time": [0.12, 0.25, 0.0],
        "errors": [0, 1, 0]
    },
    "hours": ["13:00", "14:00", "15:00"]
}"#;

const FIXTURES_JSON: &str = r#"{
    "success": true,
    "data": {
        "fixtures": [
            {"id": "101", "date": "2025-03-15", "time": "19:00:00", "home_name": "Cruz Azul", "away_name": "Pumas UNAM", "status": "NOT STARTED"},
            {"id": 102, "date": "2025-03-15T02:00:00Z", "time": "02:00:00", "home_name": "Tigres UANL", "away_name": "Monterrey", "score": "1 - 1", "status": "IN PLAY"},
            {"id": "103", "date": "2025-03-14", "home_name": "Atlas", "away_name": "Puebla", "ft_score": "3 - 0"},
            {"id": "104", "date": "2025-03-14", "home_name": "", "away_name": "Puebla"}
        ]
    }
}"#;

#[test]
fn dashboard_payload_parses_into_a_valid_series() {
    let payload = parse_dashboard_json(DASHBOARD_JSON).expect("dashboard json");
    assert_eq!(payload.api_stats.calls, 42);
    assert_eq!(payload.api_stats.uptime_secs, 3725);

    let series = TelemetrySeries::from_payload(&payload).expect("parallel arrays");
    assert_eq!(series.len(), 3);
    assert_eq!(series.hours()[2], "15:00");
    assert_eq!(series.success_rate(), &[100.0, 86.0, 100.0]);
}

#[test]
fn dashboard_missing_fields_default_to_empty() {
    let payload = parse_dashboard_json(r#"{"api_stats": {"calls": 1}}"#).expect("partial json");
    let series = TelemetrySeries::from_payload(&payload).expect("all empty");
    assert!(series.is_empty());
}

#[test]
fn dashboard_garbage_is_an_error() {
    assert!(parse_dashboard_json("<html>502</html>").is_err());
}

#[test]
fn fixtures_envelope_parses_and_classifies() {
    let fixtures = parse_fixtures_json(FIXTURES_JSON).expect("fixtures json");
    assert_eq!(fixtures.len(), 3);

    assert_eq!(fixtures[0].status, MatchStatus::Scheduled);
    assert_eq!(score_display(&fixtures[0]), "-");

    assert_eq!(fixtures[1].id, "102");
    assert_eq!(fixtures[1].status, MatchStatus::Live);
    assert_eq!(fixtures[1].date.map(|d| d.to_string()).as_deref(), Some("2025-03-15"));
    assert_eq!(score_display(&fixtures[1]), "1 - 1");

    assert_eq!(fixtures[2].status, MatchStatus::Finished);
    assert_eq!(fixtures[2].time, None);
    assert_eq!(score_display(&fixtures[2]), "3 - 0");
}

#[test]
fn live_score_envelope_uses_match_key() {
    let raw = r#"{"success": true, "data": {"match": [
        {"id": "9", "home_name": "Toluca", "away_name": "León", "score": "0 - 2", "status": "HALF TIME BREAK"}
    ]}}"#;
    let fixtures = parse_fixtures_json(raw).expect("live json");
    assert_eq!(fixtures.len(), 1);
    assert_eq!(fixtures[0].status, MatchStatus::Live);
    assert_eq!(fixtures[0].date, None);
}

#[test]
fn backend_failure_is_reported() {
    let raw = r#"{"success": false, "error": "quota exceeded"}"#;
    let err = parse_fixtures_json(raw).unwrap_err();
    assert!(err.to_string().contains("quota exceeded"));
}

#[test]
fn empty_fixtures_body_yields_nothing() {
    assert!(parse_fixtures_json("").unwrap().is_empty());
    assert!(parse_fixtures_json(r#"{"success": true, "data": {}}"#).unwrap().is_empty());
}

const STANDINGS_JSON: &str = r#"{
    "success": true,
    "data": {
        "table": [
            {"rank": "1", "name": "Toluca", "matches": "17", "won": "12", "drawn": "3", "lost": "2",
             "goals_scored": "40", "goals_conceded": "18", "goal_diff": "+22", "points": "39"},
            {"rank": 2, "name": "Tigres UANL", "matches": 17, "wins": 11, "draws": 4, "losses": 2,
             "goals_scored": 33, "goals_conceded": 15, "points": 37},
            {"rank": 3, "name": "", "points": 30}
        ]
    }
}"#;

#[test]
fn standings_table_parses_with_mixed_number_types() {
    let table = parse_standings_json(STANDINGS_JSON).expect("standings json");
    assert_eq!(table.len(), 2);

    assert_eq!(table[0].name, "Toluca");
    assert_eq!(table[0].goal_diff, 22);
    assert_eq!(table[0].points, 39);
    assert_eq!((table[1].won, table[1].drawn, table[1].lost), (11, 4, 2));
    assert_eq!(table[1].goal_diff, 18);
    assert_eq!(PositionBand::for_index(1), PositionBand::Liguilla);
}

#[test]
fn standings_failure_and_empty_bodies() {
    let err = parse_standings_json(r#"{"success": false, "error": "quota"}"#).unwrap_err();
    assert!(err.to_string().contains("quota"));
    assert!(parse_standings_json("null").unwrap().is_empty());
    assert!(parse_standings_json(r#"{"success": true, "data": {}}"#).unwrap().is_empty());
}

#[test]
fn metrics_keep_ten_scorers_and_six_teams() {
    let scorers: Vec<String> = (0..14)
        .map(|i| {
            if i % 2 == 0 {
                format!(r#"{{"name": "Jugador {i}", "team_name": "Equipo {i}", "goals": "{}"}}"#, 20 - i)
            } else {
                format!(r#"{{"player": {{"name": "Jugador {i}"}}, "team": {{"name": "Equipo {i}"}}, "goals": {}}}"#, 20 - i)
            }
        })
        .collect();
    let teams: Vec<String> = (0..8)
        .map(|i| format!(r#"{{"team": "Equipo {i}", "scored": {}, "conceded": {i}}}"#, 30 - i))
        .collect();
    let raw = format!(
        r#"{{"success": true, "data": {{"top_scorers": [{}], "goals_by_team": [{}]}}}}"#,
        scorers.join(","),
        teams.join(",")
    );

    let metrics = parse_metrics_json(&raw).expect("metrics json");
    assert_eq!(metrics.top_scorers.len(), 10);
    assert_eq!(metrics.top_scorers[0].name, "Jugador 0");
    assert_eq!(metrics.top_scorers[0].goals, 20);
    assert_eq!(metrics.top_scorers[1].name, "Jugador 1");
    assert_eq!(metrics.top_scorers[1].team, "Equipo 1");
    assert_eq!(metrics.goals_by_team.len(), 6);
    assert_eq!(metrics.goals_by_team[2].diff(), 26);
}
