use chrono::NaiveDateTime;

use super::filter::{filter_player, Period, PlayerGame};
use super::winrate::PlayerSeries;
use crate::models::{Dataset, PlayerIndex};

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    /// 1-based position in chronological order.
    pub game_number: usize,
    pub date: NaiveDateTime,
    pub match_id: Option<i64>,
    pub hero: String,
    pub won: bool,
    pub cumulative_winrate: f64,
}

/// Running win rate over a player's games, oldest first.
///
/// Games without a date are left out. With `hero` set, only games on that
/// hero count, so the line reads "win rate while playing X".
pub fn cumulative_winrate(games: &[PlayerGame], hero: Option<&str>) -> Vec<TrendPoint> {
    let mut dated: Vec<(NaiveDateTime, &PlayerGame)> = games
        .iter()
        .filter_map(|g| g.record.date.map(|d| (d, g)))
        .filter(|(_, g)| hero.map_or(true, |h| g.hero == h))
        .collect();
    dated.sort_by(|(a_date, a), (b_date, b)| {
        a_date
            .cmp(b_date)
            .then(a.record.match_id.cmp(&b.record.match_id))
    });

    let mut wins = 0usize;
    dated
        .into_iter()
        .enumerate()
        .map(|(i, (date, game))| {
            if game.won() {
                wins += 1;
            }
            let game_number = i + 1;
            TrendPoint {
                game_number,
                date,
                match_id: game.record.match_id,
                hero: game.hero.to_string(),
                won: game.won(),
                cumulative_winrate: wins as f64 / game_number as f64,
            }
        })
        .collect()
}

/// Trend lines for several players over the same period.
pub fn compare_trends(
    dataset: &Dataset,
    players: &[PlayerIndex],
    period: &Period,
    hero: Option<&str>,
) -> Vec<PlayerSeries<TrendPoint>> {
    players
        .iter()
        .map(|&player| PlayerSeries {
            player: dataset.roster().name(player).to_string(),
            values: cumulative_winrate(&filter_player(dataset, player, period), hero),
        })
        .collect()
}
