use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::AppError;

/// Number of tracked players per match.
pub const ROSTER_SIZE: usize = 5;

// Win Lose column; any other value means the match was not finished or not recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Lose,
}

impl Outcome {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Win" => Some(Outcome::Win),
            "Lose" => Some(Outcome::Lose),
            _ => None,
        }
    }

    pub fn is_win(self) -> bool {
        self == Outcome::Win
    }
}

/// Attack Def column.
///
/// The sheet records `Attack Attack` for maps where the group played both
/// halves (the value is entered by hand, it is not derived from separate
/// Attack and Defense rows). It maps to [`Side::Both`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Attack,
    Defense,
    Both,
    Other(String),
}

impl Side {
    pub const BOTH_SENTINEL: &'static str = "Attack Attack";

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" => None,
            "Attack" => Some(Side::Attack),
            "Defense" => Some(Side::Defense),
            Self::BOTH_SENTINEL => Some(Side::Both),
            other => Some(Side::Other(other.to_string())),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Side::Attack => "Attack",
            Side::Defense => "Defense",
            Side::Both => "Both Sides",
            Side::Other(raw) => raw,
        }
    }

    /// Attack, Defense or Both; everything else is a mode without sides.
    pub fn is_recorded_side(&self) -> bool {
        !matches!(self, Side::Other(_))
    }
}

/// One roster member's participation in a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    #[default]
    NotPresent,
    Played { role: String, hero: String },
}

impl Slot {
    /// Values the sheet uses to mark a player as not part of the match.
    pub const ABSENT_SENTINELS: [&'static str; 2] = ["not present", "nicht dabei"];

    pub fn from_fields(role: Option<&str>, hero: Option<&str>) -> Self {
        let clean = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .filter(|v| !Self::is_absent_sentinel(v))
                .map(str::to_string)
        };

        match (clean(role), clean(hero)) {
            (Some(role), Some(hero)) => Slot::Played { role, hero },
            _ => Slot::NotPresent,
        }
    }

    pub fn is_absent_sentinel(value: &str) -> bool {
        Self::ABSENT_SENTINELS
            .iter()
            .any(|s| s.eq_ignore_ascii_case(value.trim()))
    }

    pub fn hero(&self) -> Option<&str> {
        match self {
            Slot::Played { hero, .. } => Some(hero),
            Slot::NotPresent => None,
        }
    }

    pub fn role(&self) -> Option<&str> {
        match self {
            Slot::Played { role, .. } => Some(role),
            Slot::NotPresent => None,
        }
    }

    pub fn played(&self) -> bool {
        matches!(self, Slot::Played { .. })
    }
}

/// Position of a player inside the [`Roster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerIndex(usize);

impl PlayerIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    names: [String; ROSTER_SIZE],
}

impl Roster {
    pub fn new(names: [String; ROSTER_SIZE]) -> Self {
        Roster { names }
    }

    /// Parse a comma separated list of exactly five distinct names.
    pub fn parse(list: &str) -> Result<Self, AppError> {
        let names: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();

        for (i, name) in names.iter().enumerate() {
            if names[..i].iter().any(|n| n.eq_ignore_ascii_case(name)) {
                return Err(AppError::ConfigError(format!(
                    "player '{}' appears twice in the roster",
                    name
                )));
            }
        }

        let names: [String; ROSTER_SIZE] = names.try_into().map_err(|names: Vec<String>| {
            AppError::ConfigError(format!(
                "roster needs exactly {} players, got {}",
                ROSTER_SIZE,
                names.len()
            ))
        })?;

        Ok(Roster::new(names))
    }

    pub fn index_of(&self, name: &str) -> Option<PlayerIndex> {
        let name = name.trim();
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .map(PlayerIndex)
    }

    pub fn resolve(&self, name: &str) -> Result<PlayerIndex, AppError> {
        self.index_of(name)
            .ok_or_else(|| AppError::UnknownPlayer(name.to_string()))
    }

    pub fn name(&self, player: PlayerIndex) -> &str {
        &self.names[player.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerIndex, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (PlayerIndex(i), n.as_str()))
    }
}

/// One row of the match sheet after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: Option<i64>,
    pub date: Option<NaiveDateTime>,
    pub season: Option<String>,
    pub year: Option<i32>,
    pub month: Option<String>,
    pub map: Option<String>,
    pub gamemode: Option<String>,
    pub side: Option<Side>,
    pub outcome: Option<Outcome>,
    pub slots: [Slot; ROSTER_SIZE],
}

impl MatchRecord {
    pub fn slot(&self, player: PlayerIndex) -> &Slot {
        &self.slots[player.0]
    }

    pub fn any_player_on(&self, hero: &str) -> bool {
        self.slots.iter().any(|s| s.hero() == Some(hero))
    }
}

/// The full match table, always ordered most recent first.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    roster: Roster,
    records: Vec<MatchRecord>,
}

impl Dataset {
    pub fn new(roster: Roster, mut records: Vec<MatchRecord>) -> Self {
        // stable: rows without an id keep their sheet order at the end
        records.sort_by(|a, b| match (a.match_id, b.match_id) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        Dataset { roster, records }
    }

    pub fn empty(roster: Roster) -> Self {
        Dataset {
            roster,
            records: Vec::new(),
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
