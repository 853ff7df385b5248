use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::{Dataset, MatchRecord, Outcome, Roster, Side, Slot, ROSTER_SIZE};

// Header aliases, compared after trimming and lowercasing.
// The group's sheet is German, the English names are accepted as well.
const MATCH_ID: &[&str] = &["match id"];
const DATE: &[&str] = &["datum", "date"];
const SEASON: &[&str] = &["season"];
const YEAR: &[&str] = &["jahr", "year"];
const MONTH: &[&str] = &["monat", "month"];
const MAP: &[&str] = &["map"];
const GAMEMODE: &[&str] = &["gamemode"];
const SIDE: &[&str] = &["attack def", "side"];
const OUTCOME: &[&str] = &["win lose", "outcome"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y"];

#[derive(Debug, Default)]
struct ColumnMap {
    match_id: Option<usize>,
    date: Option<usize>,
    season: Option<usize>,
    year: Option<usize>,
    month: Option<usize>,
    map: Option<usize>,
    gamemode: Option<usize>,
    side: Option<usize>,
    outcome: Option<usize>,
    roles: [Option<usize>; ROSTER_SIZE],
    heroes: [Option<usize>; ROSTER_SIZE],
}

impl ColumnMap {
    fn resolve(headers: &StringRecord, roster: &Roster) -> Self {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |aliases: &[&str]| {
            normalized
                .iter()
                .position(|h| aliases.iter().any(|a| h == a))
        };

        let mut map = ColumnMap {
            match_id: find(MATCH_ID),
            date: find(DATE),
            season: find(SEASON),
            year: find(YEAR),
            month: find(MONTH),
            map: find(MAP),
            gamemode: find(GAMEMODE),
            side: find(SIDE),
            outcome: find(OUTCOME),
            ..Default::default()
        };

        for (player, name) in roster.iter() {
            let name = name.to_lowercase();
            let role_aliases = [format!("{} role", name), format!("{} rolle", name)];
            let hero_alias = format!("{} hero", name);

            map.roles[player.get()] = normalized
                .iter()
                .position(|h| role_aliases.iter().any(|a| h == a));
            map.heroes[player.get()] = normalized.iter().position(|h| *h == hero_alias);

            if map.roles[player.get()].is_none() || map.heroes[player.get()].is_none() {
                warn!(player = %name, "role/hero columns missing, player will have no games");
            }
        }

        map
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn cell(row: &StringRecord, column: Option<usize>) -> Option<&str> {
    column
        .and_then(|i| row.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Parse a sheet date, tolerating the formats the sheet has used over time.
/// Unparseable values are treated as missing.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Numeric coercion for id/year cells; `12.0` counts as 12.
pub fn parse_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

fn parse_row(row: &StringRecord, columns: &ColumnMap) -> Option<MatchRecord> {
    if row.iter().all(|c| c.trim().is_empty()) {
        return None;
    }

    let text = |column| cell(row, column).map(str::to_string);
    let slots = std::array::from_fn(|i| {
        Slot::from_fields(cell(row, columns.roles[i]), cell(row, columns.heroes[i]))
    });

    Some(MatchRecord {
        match_id: cell(row, columns.match_id).and_then(parse_integer),
        date: cell(row, columns.date).and_then(parse_date),
        season: text(columns.season),
        year: cell(row, columns.year)
            .and_then(parse_integer)
            .and_then(|y| i32::try_from(y).ok()),
        month: text(columns.month),
        map: text(columns.map),
        gamemode: text(columns.gamemode),
        side: cell(row, columns.side).and_then(Side::parse),
        outcome: cell(row, columns.outcome).and_then(Outcome::parse),
        slots,
    })
}

/// Parse a CSV export of the match sheet into a [`Dataset`].
///
/// Individual cells never fail the parse: bad dates, ids and outcomes become
/// missing values. The sheet as a whole must at least carry a result column,
/// otherwise it is not the match sheet (e.g. a login page) and is rejected.
pub fn parse_csv(text: &str, roster: &Roster) -> Result<Dataset, AppError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::ParseError(e.to_string()))?
        .clone();
    let columns = ColumnMap::resolve(&headers, roster);

    if columns.outcome.is_none() {
        return Err(AppError::ParseError(
            "no 'Win Lose' column found in sheet".to_string(),
        ));
    }
    if columns.match_id.is_none() {
        warn!("'Match ID' column not found, history keeps sheet order");
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| AppError::ParseError(e.to_string()))?;
        if let Some(record) = parse_row(&row, &columns) {
            records.push(record);
        }
    }

    debug!(rows = records.len(), "parsed match sheet");
    Ok(Dataset::new(roster.clone(), records))
}
