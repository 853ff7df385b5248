use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use clap::ValueEnum;

use super::filter::{filter_player, Period, PlayerGame};
use crate::models::{Dataset, Outcome, PlayerIndex, Side};

/// Categorical column a statistic is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum GroupBy {
    Hero,
    Role,
    Map,
    Gamemode,
    Side,
}

impl GroupBy {
    pub fn label(self) -> &'static str {
        match self {
            GroupBy::Hero => "Hero",
            GroupBy::Role => "Role",
            GroupBy::Map => "Map",
            GroupBy::Gamemode => "Gamemode",
            GroupBy::Side => "Side",
        }
    }

    /// Trimmed group value; blanks are not a group.
    pub fn key<'a>(self, game: &PlayerGame<'a>) -> Option<&'a str> {
        let record = game.record;
        let raw = match self {
            GroupBy::Hero => Some(game.hero),
            GroupBy::Role => Some(game.role),
            GroupBy::Map => record.map.as_deref(),
            GroupBy::Gamemode => record.gamemode.as_deref(),
            GroupBy::Side => record.side.as_ref().map(Side::label),
        };
        raw.map(str::trim).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupStats {
    pub wins: usize,
    pub losses: usize,
}

impl GroupStats {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Lose => self.losses += 1,
        }
    }

    pub fn games(&self) -> usize {
        self.wins + self.losses
    }

    pub fn win_rate(&self) -> f64 {
        if self.games() == 0 {
            0.0
        } else {
            self.wins as f64 / self.games() as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WinrateRow {
    pub group: String,
    pub wins: usize,
    pub losses: usize,
    pub games: usize,
    pub winrate: f64,
}

impl WinrateRow {
    fn new(group: String, stats: &GroupStats) -> Self {
        WinrateRow {
            group,
            wins: stats.wins,
            losses: stats.losses,
            games: stats.games(),
            winrate: stats.win_rate(),
        }
    }
}

/// Highest win rate first; ties go to the larger sample, then by name.
fn by_winrate(a: &WinrateRow, b: &WinrateRow) -> Ordering {
    b.winrate
        .partial_cmp(&a.winrate)
        .unwrap_or(Ordering::Equal)
        .then(b.games.cmp(&a.games))
        .then_with(|| a.group.cmp(&b.group))
}

pub struct WinrateTracker {
    stats: HashMap<String, GroupStats>,
}

impl WinrateTracker {
    pub fn new() -> Self {
        WinrateTracker {
            stats: HashMap::new(),
        }
    }

    pub fn add_game(&mut self, group: &str, outcome: Outcome) {
        self.stats
            .entry(group.to_string())
            .or_default()
            .record(outcome);
    }

    pub fn rows(&self) -> Vec<WinrateRow> {
        let mut rows: Vec<WinrateRow> = self
            .stats
            .iter()
            .map(|(group, stats)| WinrateRow::new(group.clone(), stats))
            .collect();
        rows.sort_by(by_winrate);
        rows
    }
}

/// Wins, losses and win rate per group, best win rate first.
pub fn aggregate_winrate(games: &[PlayerGame], by: GroupBy) -> Vec<WinrateRow> {
    let mut tracker = WinrateTracker::new();
    for game in games {
        if let Some(group) = by.key(game) {
            tracker.add_game(group, game.outcome);
        }
    }
    tracker.rows()
}

/// Drop groups with fewer than `min_games` games.
pub fn with_min_games(rows: Vec<WinrateRow>, min_games: usize) -> Vec<WinrateRow> {
    rows.into_iter().filter(|r| r.games >= min_games).collect()
}

/// Best win rate among groups with at least `min_games` games.
pub fn best_winrate(rows: &[WinrateRow], min_games: usize) -> Option<WinrateRow> {
    rows.iter()
        .filter(|r| r.games >= min_games)
        .min_by(|a, b| by_winrate(a, b))
        .cloned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayCount {
    pub group: String,
    pub games: usize,
}

/// Games per group, most played first, ties alphabetical.
pub fn play_counts(games: &[PlayerGame], by: GroupBy) -> Vec<PlayCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for game in games {
        if let Some(group) = by.key(game) {
            *counts.entry(group).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<PlayCount> = counts
        .into_iter()
        .map(|(group, games)| PlayCount {
            group: group.to_string(),
            games,
        })
        .collect();
    // stable sort keeps the alphabetical order from the map for equal counts
    rows.sort_by(|a, b| b.games.cmp(&a.games));
    rows
}

pub fn most_played(games: &[PlayerGame], by: GroupBy) -> Option<PlayCount> {
    play_counts(games, by).into_iter().next()
}

/// Play counts for Attack / Defense / Both only.
pub fn side_distribution(games: &[PlayerGame]) -> Vec<PlayCount> {
    let sided: Vec<PlayerGame> = games
        .iter()
        .filter(|g| g.record.side.as_ref().is_some_and(Side::is_recorded_side))
        .copied()
        .collect();
    play_counts(&sided, GroupBy::Side)
}

/// Games on one map split by side. Modes without sides land in `other`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapPlays {
    pub map: String,
    pub both: usize,
    pub attack: usize,
    pub defense: usize,
    pub other: usize,
}

impl MapPlays {
    pub fn total(&self) -> usize {
        self.both + self.attack + self.defense + self.other
    }
}

/// Per-map play counts by side, most played map first.
pub fn map_side_play_counts(games: &[PlayerGame]) -> Vec<MapPlays> {
    let mut per_map: HashMap<&str, MapPlays> = HashMap::new();
    for game in games {
        let Some(map) = GroupBy::Map.key(game) else {
            continue;
        };
        let plays = per_map.entry(map).or_insert_with(|| MapPlays {
            map: map.to_string(),
            ..Default::default()
        });
        match game.record.side {
            Some(Side::Both) => plays.both += 1,
            Some(Side::Attack) => plays.attack += 1,
            Some(Side::Defense) => plays.defense += 1,
            Some(Side::Other(_)) | None => plays.other += 1,
        }
    }

    play_counts(games, GroupBy::Map)
        .into_iter()
        .filter_map(|c| per_map.remove(c.group.as_str()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub games: usize,
    pub wins: usize,
    pub losses: usize,
    pub winrate: f64,
}

/// Totals for a filtered view; `None` when there is nothing to summarize.
pub fn summary(games: &[PlayerGame]) -> Option<Summary> {
    if games.is_empty() {
        return None;
    }
    let mut stats = GroupStats::default();
    for game in games {
        stats.record(game.outcome);
    }
    Some(Summary {
        games: stats.games(),
        wins: stats.wins,
        losses: stats.losses,
        winrate: stats.win_rate(),
    })
}

/// The four headline cards of the stats view. Each is `None` when no group qualifies.
#[derive(Debug, Clone, PartialEq)]
pub struct BestOf {
    pub most_played_hero: Option<PlayCount>,
    pub best_hero: Option<WinrateRow>,
    pub most_played_map: Option<PlayCount>,
    pub best_map: Option<WinrateRow>,
}

pub fn best_of(games: &[PlayerGame], min_games: usize) -> BestOf {
    BestOf {
        most_played_hero: most_played(games, GroupBy::Hero),
        best_hero: best_winrate(&aggregate_winrate(games, GroupBy::Hero), min_games),
        most_played_map: most_played(games, GroupBy::Map),
        best_map: best_winrate(&aggregate_winrate(games, GroupBy::Map), min_games),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapSideRow {
    pub map: String,
    pub side: Side,
    pub stats: WinrateRow,
}

/// Per-side win rate for every map that clears `min_games` overall.
/// Maps keep the order of the overall map ranking; sides go Both, Attack, Defense.
pub fn map_side_breakdown(games: &[PlayerGame], min_games: usize) -> Vec<MapSideRow> {
    let maps = with_min_games(aggregate_winrate(games, GroupBy::Map), min_games);

    let mut cells: HashMap<(&str, &Side), GroupStats> = HashMap::new();
    for game in games {
        let (Some(map), Some(side)) = (GroupBy::Map.key(game), game.record.side.as_ref()) else {
            continue;
        };
        if side.is_recorded_side() {
            cells.entry((map, side)).or_default().record(game.outcome);
        }
    }

    let mut rows = Vec::new();
    for map in &maps {
        for side in [Side::Both, Side::Attack, Side::Defense] {
            if let Some(stats) = cells.get(&(map.group.as_str(), &side)) {
                rows.push(MapSideRow {
                    map: map.group.clone(),
                    stats: WinrateRow::new(side.label().to_string(), stats),
                    side,
                });
            }
        }
    }
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatCell {
    pub role: String,
    pub map: String,
    pub games: usize,
    pub winrate: f64,
}

/// Win rate per (role, map) pair, ordered by role then map.
pub fn role_map_heatmap(games: &[PlayerGame]) -> Vec<HeatCell> {
    let mut cells: BTreeMap<(&str, &str), GroupStats> = BTreeMap::new();
    for game in games {
        if let (Some(role), Some(map)) = (GroupBy::Role.key(game), GroupBy::Map.key(game)) {
            cells.entry((role, map)).or_default().record(game.outcome);
        }
    }

    cells
        .into_iter()
        .map(|((role, map), stats)| HeatCell {
            role: role.to_string(),
            map: map.to_string(),
            games: stats.games(),
            winrate: stats.win_rate(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSeries<T> {
    pub player: String,
    pub values: Vec<T>,
}

/// Grouped win rate for several players over the same period.
pub fn compare_winrates(
    dataset: &Dataset,
    players: &[PlayerIndex],
    period: &Period,
    by: GroupBy,
    min_games: usize,
) -> Vec<PlayerSeries<WinrateRow>> {
    players
        .iter()
        .map(|&player| {
            let games = filter_player(dataset, player, period);
            PlayerSeries {
                player: dataset.roster().name(player).to_string(),
                values: with_min_games(aggregate_winrate(&games, by), min_games),
            }
        })
        .collect()
}

/// Play counts for several players over the same period.
pub fn compare_play_counts(
    dataset: &Dataset,
    players: &[PlayerIndex],
    period: &Period,
    by: GroupBy,
) -> Vec<PlayerSeries<PlayCount>> {
    players
        .iter()
        .map(|&player| {
            let games = filter_player(dataset, player, period);
            PlayerSeries {
                player: dataset.roster().name(player).to_string(),
                values: play_counts(&games, by),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{played, record, roster};
    use crate::models::MatchRecord;
    use pretty_assertions::assert_eq;

    fn alice_games(dataset: &Dataset) -> Vec<PlayerGame<'_>> {
        filter_player(dataset, roster().index_of("Alice").unwrap(), &Period::All)
    }

    fn on_map(mut record: MatchRecord, map: &str, side: Side) -> MatchRecord {
        record.map = Some(map.to_string());
        record.side = Some(side);
        record
    }

    #[test]
    fn test_winrate_by_hero_scenario() {
        let dataset = Dataset::new(
            roster(),
            vec![
                record(1, "Win", "Ana"),
                record(2, "Lose", "Ana"),
                record(3, "Win", "Mercy"),
            ],
        );
        let rows = aggregate_winrate(&alice_games(&dataset), GroupBy::Hero);

        assert_eq!(
            rows,
            vec![
                WinrateRow { group: "Mercy".into(), wins: 1, losses: 0, games: 1, winrate: 1.0 },
                WinrateRow { group: "Ana".into(), wins: 1, losses: 1, games: 2, winrate: 0.5 },
            ]
        );
    }

    #[test]
    fn test_rows_are_consistent_and_order_independent() {
        let records = vec![
            on_map(record(1, "Win", "Ana"), "Ilios", Side::Both),
            on_map(record(2, "Lose", "Kiriko"), "Busan", Side::Both),
            on_map(record(3, "Win", "Ana"), "Busan", Side::Attack),
            on_map(record(4, "Lose", "Ana"), "Ilios", Side::Defense),
            on_map(record(5, "Win", "Kiriko"), "Dorado", Side::Attack),
        ];
        let mut reversed = records.clone();
        reversed.reverse();
        for r in reversed.iter_mut() {
            r.match_id = r.match_id.map(|id| 100 - id);
        }

        let forward = Dataset::new(roster(), records);
        let backward = Dataset::new(roster(), reversed);
        for by in [GroupBy::Hero, GroupBy::Map, GroupBy::Side, GroupBy::Role] {
            let rows = aggregate_winrate(&alice_games(&forward), by);
            assert_eq!(rows, aggregate_winrate(&alice_games(&backward), by));
            for row in &rows {
                assert!(row.games > 0);
                assert_eq!(row.wins + row.losses, row.games);
                assert_eq!(row.winrate, row.wins as f64 / row.games as f64);
            }
        }
    }

    #[test]
    fn test_blank_groups_are_excluded() {
        let mut blank_map = record(1, "Win", "Ana");
        blank_map.map = Some("   ".to_string());
        let mut no_map = record(2, "Win", "Ana");
        no_map.map = None;
        let dataset = Dataset::new(roster(), vec![blank_map, no_map, record(3, "Lose", "Ana")]);

        let rows = aggregate_winrate(&alice_games(&dataset), GroupBy::Map);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].games, 1);
    }

    #[test]
    fn test_empty_input_gives_no_rows() {
        let dataset = Dataset::empty(roster());
        let games = alice_games(&dataset);
        assert!(aggregate_winrate(&games, GroupBy::Hero).is_empty());
        assert!(play_counts(&games, GroupBy::Map).is_empty());
        assert!(summary(&games).is_none());

        let best = best_of(&games, 1);
        assert!(best.most_played_hero.is_none());
        assert!(best.best_hero.is_none());
        assert!(best.most_played_map.is_none());
        assert!(best.best_map.is_none());
    }

    #[test]
    fn test_min_games_keeps_small_samples_off_the_top() {
        let dataset = Dataset::new(
            roster(),
            vec![
                record(1, "Win", "Mercy"),
                record(2, "Win", "Ana"),
                record(3, "Win", "Ana"),
                record(4, "Lose", "Ana"),
            ],
        );
        let rows = aggregate_winrate(&alice_games(&dataset), GroupBy::Hero);

        assert_eq!(best_winrate(&rows, 1).map(|r| r.group), Some("Mercy".to_string()));
        assert_eq!(best_winrate(&rows, 2).map(|r| r.group), Some("Ana".to_string()));
        assert!(best_winrate(&rows, 4).is_none());
        assert_eq!(with_min_games(rows, 2).len(), 1);
    }

    #[test]
    fn test_summary_and_most_played() {
        let dataset = Dataset::new(
            roster(),
            vec![
                record(1, "Win", "Mercy"),
                record(2, "Lose", "Ana"),
                record(3, "Win", "Ana"),
                record(4, "Lose", "Mercy"),
                record(5, "Win", "Lucio"),
            ],
        );
        let games = alice_games(&dataset);

        let totals = summary(&games).unwrap();
        assert_eq!((totals.games, totals.wins, totals.losses), (5, 3, 2));
        assert!((totals.winrate - 0.6).abs() < 1e-9);

        // Ana and Mercy tie on two games; alphabetical first wins
        assert_eq!(
            most_played(&games, GroupBy::Hero),
            Some(PlayCount { group: "Ana".into(), games: 2 })
        );
        assert_eq!(play_counts(&games, GroupBy::Hero).last().map(|c| c.games), Some(1));
    }

    #[test]
    fn test_map_side_breakdown() {
        let dataset = Dataset::new(
            roster(),
            vec![
                on_map(record(1, "Win", "Ana"), "Ilios", Side::Both),
                on_map(record(2, "Win", "Ana"), "King's Row", Side::Attack),
                on_map(record(3, "Lose", "Ana"), "King's Row", Side::Defense),
                on_map(record(4, "Win", "Ana"), "King's Row", Side::Defense),
                on_map(record(5, "Lose", "Ana"), "Busan", Side::Other("Push".into())),
            ],
        );
        let games = alice_games(&dataset);

        let rows = map_side_breakdown(&games, 2);
        let cells: Vec<_> = rows
            .iter()
            .map(|r| (r.map.as_str(), r.side.clone(), r.stats.games, r.stats.wins))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("King's Row", Side::Attack, 1, 1),
                ("King's Row", Side::Defense, 2, 1),
            ]
        );

        let sides: Vec<_> = side_distribution(&games)
            .into_iter()
            .map(|c| (c.group, c.games))
            .collect();
        assert_eq!(
            sides,
            vec![
                ("Defense".to_string(), 2),
                ("Attack".to_string(), 1),
                ("Both Sides".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_map_side_play_counts() {
        let mut unsided = on_map(record(6, "Win", "Ana"), "Busan", Side::Attack);
        unsided.side = None;
        let dataset = Dataset::new(
            roster(),
            vec![
                on_map(record(1, "Win", "Ana"), "Ilios", Side::Both),
                on_map(record(2, "Win", "Ana"), "King's Row", Side::Attack),
                on_map(record(3, "Lose", "Ana"), "King's Row", Side::Defense),
                on_map(record(4, "Win", "Ana"), "King's Row", Side::Defense),
                on_map(record(5, "Lose", "Ana"), "Busan", Side::Other("Push".into())),
                unsided,
            ],
        );

        let plays = map_side_play_counts(&alice_games(&dataset));
        assert_eq!(
            plays,
            vec![
                MapPlays { map: "King's Row".into(), attack: 1, defense: 2, ..Default::default() },
                MapPlays { map: "Busan".into(), other: 2, ..Default::default() },
                MapPlays { map: "Ilios".into(), both: 1, ..Default::default() },
            ]
        );
        assert_eq!(plays.iter().map(MapPlays::total).sum::<usize>(), 6);
    }

    #[test]
    fn test_role_map_heatmap() {
        let mut tank = on_map(record(3, "Lose", "Sigma"), "Ilios", Side::Both);
        tank.slots[0] = played("Tank", "Sigma");
        let dataset = Dataset::new(
            roster(),
            vec![
                on_map(record(1, "Win", "Ana"), "Ilios", Side::Both),
                on_map(record(2, "Lose", "Ana"), "Ilios", Side::Both),
                tank,
            ],
        );

        let cells = role_map_heatmap(&alice_games(&dataset));
        assert_eq!(
            cells,
            vec![
                HeatCell { role: "Support".into(), map: "Ilios".into(), games: 2, winrate: 0.5 },
                HeatCell { role: "Tank".into(), map: "Ilios".into(), games: 1, winrate: 0.0 },
            ]
        );
    }

    #[test]
    fn test_compare_players() {
        let mut shared = record(1, "Win", "Ana");
        shared.slots[1] = played("Tank", "Orisa");
        let dataset = Dataset::new(roster(), vec![shared, record(2, "Lose", "Ana")]);
        let roster = roster();
        let players = [roster.index_of("Alice").unwrap(), roster.index_of("Bob").unwrap()];

        let series = compare_winrates(&dataset, &players, &Period::All, GroupBy::Hero, 1);
        assert_eq!(series[0].player, "Alice");
        assert_eq!(series[0].values[0].games, 2);
        assert_eq!(series[1].player, "Bob");
        assert_eq!(series[1].values[0].group, "Orisa");

        let counts = compare_play_counts(&dataset, &players, &Period::All, GroupBy::Role);
        assert_eq!(counts[1].values, vec![PlayCount { group: "Tank".into(), games: 1 }]);
    }
}
