use std::cmp::Reverse;
use std::collections::BTreeSet;

use super::history::season_number;

use crate::models::{Dataset, MatchRecord, Outcome, PlayerIndex};

/// Time window for the statistics views. A season overrides year/month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Period {
    #[default]
    All,
    Season(String),
    Calendar {
        year: Option<i32>,
        month: Option<String>,
    },
}

impl Period {
    pub fn from_filters(season: Option<String>, year: Option<i32>, month: Option<String>) -> Self {
        match season.filter(|s| !s.trim().is_empty()) {
            Some(season) => Period::Season(season),
            None if year.is_none() && month.is_none() => Period::All,
            None => Period::Calendar { year, month },
        }
    }

    pub fn contains(&self, record: &MatchRecord) -> bool {
        match self {
            Period::All => true,
            Period::Season(season) => record.season.as_deref() == Some(season.as_str()),
            Period::Calendar { year, month } => {
                year.map_or(true, |y| record.year == Some(y))
                    && month
                        .as_deref()
                        .map_or(true, |m| record.month.as_deref() == Some(m))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Period::All => "all time".to_string(),
            Period::Season(season) => season.clone(),
            Period::Calendar { year, month } => match (year, month) {
                (Some(y), Some(m)) => format!("{}/{}", m, y),
                (Some(y), None) => y.to_string(),
                (None, Some(m)) => format!("month {}", m),
                (None, None) => "all time".to_string(),
            },
        }
    }
}

/// A decided match seen from one player's seat.
#[derive(Debug, Clone, Copy)]
pub struct PlayerGame<'a> {
    pub record: &'a MatchRecord,
    pub hero: &'a str,
    pub role: &'a str,
    pub outcome: Outcome,
}

impl PlayerGame<'_> {
    pub fn won(&self) -> bool {
        self.outcome.is_win()
    }
}

/// Games `player` took part in within `period`, Win/Lose rows only,
/// in dataset order (most recent first).
pub fn filter_player<'a>(
    dataset: &'a Dataset,
    player: PlayerIndex,
    period: &Period,
) -> Vec<PlayerGame<'a>> {
    dataset
        .records()
        .iter()
        .filter(|r| period.contains(r))
        .filter_map(|record| {
            let outcome = record.outcome?;
            let slot = record.slot(player);
            let hero = slot.hero()?.trim();
            let role = slot.role()?.trim();
            if hero.is_empty() {
                return None;
            }
            Some(PlayerGame {
                record,
                hero,
                role,
                outcome,
            })
        })
        .collect()
}

/// Name-based entry point. No player, or one outside the roster, gives no games.
pub fn filter<'a>(dataset: &'a Dataset, player: Option<&str>, period: &Period) -> Vec<PlayerGame<'a>> {
    match player.and_then(|name| dataset.roster().index_of(name)) {
        Some(index) => filter_player(dataset, index, period),
        None => Vec::new(),
    }
}

/// Values offered by the period filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Highest season number first; labels without a number last.
    pub seasons: Vec<String>,
    pub months: Vec<String>,
    pub years: Vec<i32>,
}

pub fn filter_options(dataset: &Dataset) -> FilterOptions {
    let records = dataset.records();

    let mut seasons: Vec<&str> = records
        .iter()
        .filter_map(|r| r.season.as_deref())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    seasons.sort_by_key(|s| (season_number(s).is_none(), Reverse(season_number(s)), *s));
    let years: BTreeSet<i32> = records.iter().filter_map(|r| r.year).collect();
    let mut months: Vec<String> = records
        .iter()
        .filter_map(|r| r.month.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    // numeric months in calendar order, named months after
    months.sort_by_key(|m| (m.parse::<u32>().unwrap_or(u32::MAX), m.clone()));

    FilterOptions {
        seasons: seasons.into_iter().map(str::to_string).collect(),
        months,
        years: years.into_iter().collect(),
    }
}
