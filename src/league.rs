use anyhow::{Context, Result};
use serde_json::Value;

const TOP_SCORERS: usize = 10;
const TOP_SCORING_TEAMS: usize = 6;

/// Table zone a position falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionBand {
    /// Places 1-4 go straight to the knockout stage.
    Liguilla,
    /// Places 5-12 play the play-in round.
    PlayIn,
    Out,
}

impl PositionBand {
    /// `index` is the zero-based row in table order.
    pub fn for_index(index: usize) -> Self {
        match index {
            0..=3 => PositionBand::Liguilla,
            4..=11 => PositionBand::PlayIn,
            _ => PositionBand::Out,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingRow {
    pub rank: u32,
    pub name: String,
    pub matches: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_scored: u32,
    pub goals_conceded: u32,
    pub goal_diff: i32,
    pub points: u32,
}

/// Parses the `data.table` standings envelope. Counts may arrive as strings.
pub fn parse_standings_json(raw: &str) -> Result<Vec<StandingRow>> {
    let data = envelope_data(raw, "standings")?;
    let Some(rows) = data.get("table").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    Ok(rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| parse_standing_row(idx, row))
        .collect())
}

fn parse_standing_row(idx: usize, row: &Value) -> Option<StandingRow> {
    let name = pick_string(row, &["name", "team_name"])?;
    let goals_scored = pick_u32(row, &["goals_scored"]).unwrap_or(0);
    let goals_conceded = pick_u32(row, &["goals_conceded"]).unwrap_or(0);
    Some(StandingRow {
        rank: pick_u32(row, &["rank"]).unwrap_or(idx as u32 + 1),
        name,
        matches: pick_u32(row, &["matches"]).unwrap_or(0),
        won: pick_u32(row, &["won", "wins"]).unwrap_or(0),
        drawn: pick_u32(row, &["drawn", "draws"]).unwrap_or(0),
        lost: pick_u32(row, &["lost", "losses"]).unwrap_or(0),
        goals_scored,
        goals_conceded,
        goal_diff: pick_i32(row, &["goal_diff"])
            .unwrap_or(goals_scored as i32 - goals_conceded as i32),
        points: pick_u32(row, &["points"]).unwrap_or(0),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scorer {
    pub name: String,
    pub team: String,
    pub goals: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamGoals {
    pub team: String,
    pub scored: u32,
    pub conceded: u32,
}

impl TeamGoals {
    pub fn diff(&self) -> i32 {
        self.scored as i32 - self.conceded as i32
    }
}

/// Signed goal difference, `+3` / `0` / `-2`.
pub fn format_goal_diff(diff: i32) -> String {
    if diff > 0 {
        format!("+{diff}")
    } else {
        diff.to_string()
    }
}

/// Top scorers and the best-scoring teams, already cut to display size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeagueMetrics {
    pub top_scorers: Vec<Scorer>,
    pub goals_by_team: Vec<TeamGoals>,
}

impl LeagueMetrics {
    pub fn is_empty(&self) -> bool {
        self.top_scorers.is_empty() && self.goals_by_team.is_empty()
    }
}

pub fn parse_metrics_json(raw: &str) -> Result<LeagueMetrics> {
    let data = envelope_data(raw, "metrics")?;
    let top_scorers = data
        .get("top_scorers")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(parse_scorer)
                .take(TOP_SCORERS)
                .collect()
        })
        .unwrap_or_default();
    let goals_by_team = data
        .get("goals_by_team")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some(TeamGoals {
                        team: pick_string(row, &["team", "name"])?,
                        scored: pick_u32(row, &["scored", "goals_scored"]).unwrap_or(0),
                        conceded: pick_u32(row, &["conceded", "goals_conceded"]).unwrap_or(0),
                    })
                })
                .take(TOP_SCORING_TEAMS)
                .collect()
        })
        .unwrap_or_default();
    Ok(LeagueMetrics {
        top_scorers,
        goals_by_team,
    })
}

// Player and team arrive either flat (`name`, `team_name`) or nested objects.
fn parse_scorer(row: &Value) -> Option<Scorer> {
    let name = pick_string(row, &["name"])
        .or_else(|| row.get("player").and_then(|p| pick_string(p, &["name"])))
        .or_else(|| pick_string(row, &["player"]))?;
    let team = pick_string(row, &["team_name"])
        .or_else(|| row.get("team").and_then(|t| pick_string(t, &["name"])))
        .or_else(|| pick_string(row, &["team"]))
        .unwrap_or_default();
    Some(Scorer {
        name,
        team,
        goals: pick_u32(row, &["goals"]).unwrap_or(0),
    })
}

/// Derives goals by team from a standings table when the backend has no
/// metrics endpoint: best attack first, ties broken by fewer conceded.
pub fn goals_from_standings(table: &[StandingRow]) -> Vec<TeamGoals> {
    let mut goals: Vec<TeamGoals> = table
        .iter()
        .map(|row| TeamGoals {
            team: row.name.clone(),
            scored: row.goals_scored,
            conceded: row.goals_conceded,
        })
        .collect();
    goals.sort_by(|a, b| b.scored.cmp(&a.scored).then(a.conceded.cmp(&b.conceded)));
    goals.truncate(TOP_SCORING_TEAMS);
    goals
}

fn envelope_data(raw: &str, what: &str) -> Result<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Value::Null);
    }
    let mut root: Value =
        serde_json::from_str(trimmed).with_context(|| format!("invalid {what} json"))?;
    if root.get("success").and_then(Value::as_bool) == Some(false) {
        let msg = pick_string(&root, &["error"]).unwrap_or_else(|| "unknown error".to_string());
        return Err(anyhow::anyhow!("backend reported failure: {msg}"));
    }
    Ok(root.get_mut("data").map(Value::take).unwrap_or(Value::Null))
}

fn pick_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn pick_i32(value: &Value, keys: &[&str]) -> Option<i32> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::Number(n) => n.as_i64().map(|n| n as i32),
        Value::String(s) => s.trim().trim_start_matches('+').parse().ok(),
        _ => None,
    })
}

fn pick_u32(value: &Value, keys: &[&str]) -> Option<u32> {
    pick_i32(value, keys).map(|n| n.max(0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_table_position() {
        assert_eq!(PositionBand::for_index(0), PositionBand::Liguilla);
        assert_eq!(PositionBand::for_index(3), PositionBand::Liguilla);
        assert_eq!(PositionBand::for_index(4), PositionBand::PlayIn);
        assert_eq!(PositionBand::for_index(11), PositionBand::PlayIn);
        assert_eq!(PositionBand::for_index(12), PositionBand::Out);
    }

    #[test]
    fn string_counts_and_alternate_keys_parse() {
        let raw = r#"{"success": true, "data": {"table": [
            {"name": "Equipo 1", "rank": "1", "points": "25", "matches": "10",
             "wins": "8", "draws": "1", "losses": "1", "goals_scored": "20", "goals_conceded": "5"}
        ]}}"#;
        let table = parse_standings_json(raw).expect("standings json");
        assert_eq!(table.len(), 1);
        let row = &table[0];
        assert_eq!((row.won, row.drawn, row.lost), (8, 1, 1));
        assert_eq!(row.goal_diff, 15);
        assert_eq!(row.points, 25);
    }

    #[test]
    fn goal_diff_is_signed() {
        assert_eq!(format_goal_diff(3), "+3");
        assert_eq!(format_goal_diff(0), "0");
        assert_eq!(format_goal_diff(-2), "-2");
    }

    #[test]
    fn goals_from_standings_keeps_best_six() {
        let table: Vec<StandingRow> = (0..9)
            .map(|i| StandingRow {
                rank: i + 1,
                name: format!("T{i}"),
                matches: 10,
                won: 0,
                drawn: 0,
                lost: 0,
                goals_scored: 10 + (i % 4),
                goals_conceded: i,
                goal_diff: 0,
                points: 0,
            })
            .collect();
        let goals = goals_from_standings(&table);
        assert_eq!(goals.len(), 6);
        assert_eq!(goals[0].team, "T3");
        assert_eq!(goals[1].team, "T7");
        assert!(goals.windows(2).all(|w| w[0].scored >= w[1].scored));
    }
}
