use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, NaiveTime, Weekday};
use serde_json::Value;

/// Match state, decided once when a row is ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
}

impl MatchStatus {
    pub fn classify(status: Option<&str>, ft_score: Option<&str>) -> Self {
        let status = status.map(|s| s.trim().to_ascii_uppercase()).unwrap_or_default();
        match status.as_str() {
            "IN PLAY" | "LIVE" | "HALF TIME BREAK" | "ADDED TIME" => MatchStatus::Live,
            "FINISHED" => MatchStatus::Finished,
            _ if ft_score.is_some_and(|s| !s.trim().is_empty()) => MatchStatus::Finished,
            _ => MatchStatus::Scheduled,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "Scheduled",
            MatchStatus::Live => "Live",
            MatchStatus::Finished => "Finished",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub home: String,
    pub away: String,
    pub score: Option<String>,
    pub ft_score: Option<String>,
    pub status: MatchStatus,
}

pub fn score_display(fixture: &Fixture) -> String {
    let pick = |s: &Option<String>| s.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
    match fixture.status {
        MatchStatus::Live => pick(&fixture.score),
        MatchStatus::Finished => pick(&fixture.ft_score).or_else(|| pick(&fixture.score)),
        MatchStatus::Scheduled => None,
    }
    .unwrap_or_else(|| "-".to_string())
}

/// Parses fixtures, live scores or history from the backend envelope.
pub fn parse_fixtures_json(raw: &str) -> Result<Vec<Fixture>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid fixtures json")?;
    if root.get("success").and_then(Value::as_bool) == Some(false) {
        let msg = pick_string(&root, &["error"]).unwrap_or_else(|| "unknown error".to_string());
        return Err(anyhow::anyhow!("backend reported failure: {msg}"));
    }
    let data = root.get("data").unwrap_or(&Value::Null);
    let rows = ["fixtures", "match"]
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    Ok(rows.iter().filter_map(parse_fixture_row).collect())
}

fn parse_fixture_row(row: &Value) -> Option<Fixture> {
    let home = pick_string(row, &["home_name", "home"])?;
    let away = pick_string(row, &["away_name", "away"])?;
    let id = pick_string(row, &["id", "fixture_id"]).unwrap_or_default();
    let date = pick_string(row, &["date", "scheduled"])
        .and_then(|d| NaiveDate::parse_from_str(d.get(..10).unwrap_or(d.as_str()), "%Y-%m-%d").ok());
    let status = pick_string(row, &["status"]);
    let ft_score = pick_string(row, &["ft_score"]);
    Some(Fixture {
        id,
        date,
        time: pick_string(row, &["time"]),
        home,
        away,
        score: pick_string(row, &["score"]),
        status: MatchStatus::classify(status.as_deref(), ft_score.as_deref()),
        ft_score,
    })
}

fn pick_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Team name → logo file stem, owned by the view and passed where needed.
#[derive(Debug, Clone, Default)]
pub struct TeamLogoTable {
    aliases: HashMap<String, String>,
    // Folded substrings that win over the alias table.
    overrides: Vec<(Vec<String>, String)>,
}

impl TeamLogoTable {
    pub fn new<'a>(
        aliases: impl IntoIterator<Item = (&'a str, &'a str)>,
        overrides: impl IntoIterator<Item = (&'a [&'a str], &'a str)>,
    ) -> Self {
        Self {
            aliases: aliases
                .into_iter()
                .map(|(name, stem)| (fold(name), stem.to_string()))
                .collect(),
            overrides: overrides
                .into_iter()
                .map(|(needles, stem)| (needles.iter().map(|n| fold(n)).collect(), stem.to_string()))
                .collect(),
        }
    }

    pub fn liga_mx() -> Self {
        const ALIASES: &[(&str, &str)] = &[
            ("América", "america"),
            ("Club America", "america"),
            ("León", "leon"),
            ("Club Leon", "leon"),
            ("Tigres UANL", "tigres"),
            ("Tigres", "tigres"),
            ("Toluca", "toluca"),
            ("Deportivo Toluca", "toluca"),
            ("Cruz Azul", "cruzazul"),
            ("Necaxa", "necaxa"),
            ("Club Necaxa", "necaxa"),
            ("Pachuca", "pachuca"),
            ("CF Pachuca", "pachuca"),
            ("Monterrey", "monterrey"),
            ("CF Monterrey", "monterrey"),
            ("Juárez", "juarez"),
            ("FC Juárez", "juarez"),
            ("Guadalajara", "guadalajara"),
            ("Chivas", "guadalajara"),
            ("CD Guadalajara", "guadalajara"),
            ("Pumas UNAM", "pumas"),
            ("Pumas", "pumas"),
            ("Mazatlán", "mazatlan"),
            ("FC Mazatlan", "mazatlan"),
            ("Atlas", "atlas"),
            ("Atlas FC", "atlas"),
            ("Querétaro", "queretaro"),
            ("Atlético San Luis", "atleticosl"),
            ("San Luis", "atleticosl"),
            ("Puebla", "puebla"),
            ("Club Puebla", "puebla"),
            ("Santos Laguna", "santos"),
            ("Santos", "santos"),
            ("Tijuana", "tijuana"),
            ("Club Tijuana", "tijuana"),
            ("Xolos", "tijuana"),
        ];
        const OVERRIDES: &[(&[&str], &str)] = &[
            (&["juarez"], "juarez"),
            (&["guadalajara", "chivas"], "guadalajara"),
            (&["america"], "america"),
            (&["queretaro"], "queretaro"),
        ];
        Self::new(ALIASES.iter().copied(), OVERRIDES.iter().copied())
    }

    pub fn stem(&self, team: &str) -> String {
        let folded = fold(team);
        if let Some((_, stem)) = self
            .overrides
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| folded.contains(n.as_str())))
        {
            return stem.clone();
        }
        if let Some(stem) = self.aliases.get(&folded) {
            return stem.clone();
        }
        team.to_lowercase().replace(' ', "")
    }

    pub fn logo_path(&self, team: &str) -> String {
        format!("static/img/logos/{}.png", self.stem(team))
    }
}

// Lowercase with Spanish accents stripped.
fn fold(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            'á' | 'Á' => 'a',
            'é' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'Ú' | 'ü' | 'Ü' => 'u',
            'ñ' | 'Ñ' => 'n',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Moves a fixture between two clubs forward to a fixed weekday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateShiftRule {
    pub team_a: String,
    pub team_b: String,
    pub weekday: Weekday,
}

impl DateShiftRule {
    pub fn new(team_a: &str, team_b: &str, weekday: Weekday) -> Self {
        Self {
            team_a: team_a.to_string(),
            team_b: team_b.to_string(),
            weekday,
        }
    }

    fn applies(&self, fixture: &Fixture, logos: &TeamLogoTable) -> bool {
        let home = logos.stem(&fixture.home);
        let away = logos.stem(&fixture.away);
        let a = logos.stem(&self.team_a);
        let b = logos.stem(&self.team_b);
        (home == a && away == b) || (home == b && away == a)
    }

    fn shift(&self, date: NaiveDate) -> NaiveDate {
        let target = self.weekday.num_days_from_sunday() as i64;
        let current = date.weekday().num_days_from_sunday() as i64;
        let days = (target - current).rem_euclid(7);
        date + ChronoDuration::days(days)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixtureDay {
    pub date: Option<NaiveDate>,
    pub fixtures: Vec<Fixture>,
}

/// Groups fixtures by (possibly shifted) date, in first-seen order.
/// Rows without a date land in one trailing group.
pub fn group_by_date(
    fixtures: &[Fixture],
    rules: &[DateShiftRule],
    logos: &TeamLogoTable,
) -> Vec<FixtureDay> {
    let mut days: Vec<FixtureDay> = Vec::new();
    let mut undated: Vec<Fixture> = Vec::new();

    for fixture in fixtures {
        let Some(mut date) = fixture.date else {
            undated.push(fixture.clone());
            continue;
        };
        if let Some(rule) = rules.iter().find(|r| r.applies(fixture, logos)) {
            date = rule.shift(date);
        }
        let mut fixture = fixture.clone();
        fixture.date = Some(date);
        match days.iter_mut().find(|d| d.date == Some(date)) {
            Some(day) => day.fixtures.push(fixture),
            None => days.push(FixtureDay {
                date: Some(date),
                fixtures: vec![fixture],
            }),
        }
    }

    if !undated.is_empty() {
        days.push(FixtureDay {
            date: None,
            fixtures: undated,
        });
    }
    days
}

/// Shows UTC kickoff data in a local zone with a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KickoffClock {
    pub utc_offset_hours: i32,
}

impl KickoffClock {
    pub fn new(utc_offset_hours: i32) -> Self {
        Self { utc_offset_hours }
    }

    /// `"19:00"` with a -6 offset → `"1:00 PM"`. Unparseable input is returned as-is.
    pub fn format_time(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let parsed = NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"));
        let Ok(time) = parsed else {
            return trimmed.to_string();
        };
        let local = time + ChronoDuration::hours(self.utc_offset_hours as i64);
        local.format("%-I:%M %p").to_string()
    }

    pub fn format_date(&self, date: Option<NaiveDate>) -> String {
        let Some(date) = date else {
            return "Date unavailable".to_string();
        };
        let shifted = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| (dt + ChronoDuration::hours(self.utc_offset_hours as i64)).date())
            .unwrap_or(date);
        shifted.format("%A, %B %-d, %Y").to_string()
    }
}

impl Default for KickoffClock {
    fn default() -> Self {
        Self::new(-6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_decided_from_raw_strings() {
        assert_eq!(MatchStatus::classify(Some("IN PLAY"), None), MatchStatus::Live);
        assert_eq!(MatchStatus::classify(Some("live"), None), MatchStatus::Live);
        assert_eq!(MatchStatus::classify(Some("FINISHED"), None), MatchStatus::Finished);
        assert_eq!(MatchStatus::classify(None, Some("2 - 1")), MatchStatus::Finished);
        assert_eq!(MatchStatus::classify(Some("NOT STARTED"), Some("")), MatchStatus::Scheduled);
    }

    #[test]
    fn logo_overrides_win_over_aliases() {
        let logos = TeamLogoTable::liga_mx();
        assert_eq!(logos.stem("Club América"), "america");
        assert_eq!(logos.stem("CD Chivas Femenil"), "guadalajara");
        assert_eq!(logos.stem("Atletico San Luis"), "atleticosl");
        assert_eq!(logos.stem("Real Madrid"), "realmadrid");
        assert_eq!(logos.logo_path("Xolos"), "static/img/logos/tijuana.png");
    }

    #[test]
    fn kickoff_time_shifts_and_wraps() {
        let clock = KickoffClock::default();
        assert_eq!(clock.format_time("19:00:00"), "1:00 PM");
        assert_eq!(clock.format_time("03:05"), "9:05 PM");
        assert_eq!(clock.format_time("06:30"), "12:30 AM");
        assert_eq!(clock.format_time("TBD"), "TBD");
    }

    #[test]
    fn kickoff_date_lands_on_previous_day_for_negative_offset() {
        let clock = KickoffClock::default();
        let date = NaiveDate::from_ymd_opt(2025, 3, 15);
        assert_eq!(clock.format_date(date), "Friday, March 14, 2025");
        assert_eq!(KickoffClock::new(0).format_date(date), "Saturday, March 15, 2025");
        assert_eq!(clock.format_date(None), "Date unavailable");
    }

    #[test]
    fn score_display_prefers_full_time() {
        let mut fixture = Fixture {
            id: "1".to_string(),
            date: None,
            time: None,
            home: "A".to_string(),
            away: "B".to_string(),
            score: Some("1 - 0".to_string()),
            ft_score: Some("2 - 0".to_string()),
            status: MatchStatus::Finished,
        };
        assert_eq!(score_display(&fixture), "2 - 0");
        fixture.status = MatchStatus::Live;
        assert_eq!(score_display(&fixture), "1 - 0");
        fixture.status = MatchStatus::Scheduled;
        assert_eq!(score_display(&fixture), "-");
    }
}
