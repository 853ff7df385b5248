use std::collections::BTreeSet;

use crate::error::AppError;
use crate::models::{Dataset, MatchRecord, PlayerIndex, Roster};

/// Records shown after any filter change.
pub const DEFAULT_SHOWN: usize = 10;

/// What caused the history view to be recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTrigger {
    /// Player or hero selection changed, or the data was reloaded.
    FilterChanged,
    LoadMore,
}

pub fn next_shown_count(previous: usize, page_size: usize, trigger: PageTrigger) -> usize {
    match trigger {
        PageTrigger::FilterChanged => DEFAULT_SHOWN,
        PageTrigger::LoadMore => previous.saturating_add(page_size),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSelector {
    All,
    Player(PlayerIndex),
}

impl PlayerSelector {
    pub const ALL_SENTINEL: &'static str = "ALL";

    /// `None` and `ALL` select every player; other names must be in the roster.
    pub fn parse(roster: &Roster, raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(PlayerSelector::All),
            Some(name) if name.eq_ignore_ascii_case(Self::ALL_SENTINEL) => Ok(PlayerSelector::All),
            Some(name) => roster.resolve(name).map(PlayerSelector::Player),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub player: PlayerSelector,
    pub hero: Option<String>,
}

impl HistoryQuery {
    pub fn matches(&self, record: &MatchRecord) -> bool {
        match (self.player, self.hero.as_deref()) {
            (PlayerSelector::Player(p), hero) => {
                let slot = record.slot(p);
                slot.played() && hero.map_or(true, |h| slot.hero() == Some(h))
            }
            (PlayerSelector::All, Some(hero)) => record.any_player_on(hero),
            (PlayerSelector::All, None) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryPage<'a> {
    /// Nothing loaded at all.
    DatasetEmpty,
    /// Data exists, the filters exclude all of it.
    NoMatches,
    Records(Vec<&'a MatchRecord>),
}

impl<'a> HistoryPage<'a> {
    pub fn records(&self) -> &[&'a MatchRecord] {
        match self {
            HistoryPage::Records(records) => records,
            _ => &[],
        }
    }
}

/// Every record matching `query`, most recent first.
pub fn select<'a>(dataset: &'a Dataset, query: &HistoryQuery) -> Vec<&'a MatchRecord> {
    dataset.records().iter().filter(|r| query.matches(r)).collect()
}

/// Recompute the history feed. Returns the page and the new shown count.
pub fn page<'a>(
    dataset: &'a Dataset,
    query: &HistoryQuery,
    previous_shown: usize,
    page_size: usize,
    trigger: PageTrigger,
) -> (HistoryPage<'a>, usize) {
    let shown = next_shown_count(previous_shown, page_size, trigger);
    if dataset.is_empty() {
        return (HistoryPage::DatasetEmpty, shown);
    }

    let mut records = select(dataset, query);
    if records.is_empty() {
        return (HistoryPage::NoMatches, shown);
    }
    records.truncate(shown);
    (HistoryPage::Records(records), shown)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonSection<'a> {
    /// `None` only for leading records before any season is known.
    pub header: Option<String>,
    pub records: Vec<&'a MatchRecord>,
}

/// First run of digits in a season cell, e.g. 12 for "S12" or "Season 12".
pub fn season_number(raw: &str) -> Option<u32> {
    let digits: String = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// "Season 12" style label from whatever the sheet wrote.
pub fn season_label(raw: &str) -> String {
    match season_number(raw) {
        Some(number) => format!("Season {}", number),
        None => raw.to_string(),
    }
}

/// Split a page into runs that share a season. A new header starts whenever
/// the season changes; records without a map are not shown.
pub fn group_by_season<'a>(records: &[&'a MatchRecord]) -> Vec<SeasonSection<'a>> {
    let mut sections: Vec<SeasonSection<'a>> = Vec::new();
    let mut last_season: Option<&str> = None;

    for &record in records {
        if record.map.is_none() {
            continue;
        }

        match record.season.as_deref() {
            Some(season) if last_season != Some(season) => {
                sections.push(SeasonSection {
                    header: Some(season_label(season)),
                    records: Vec::new(),
                });
                last_season = Some(season);
            }
            _ if sections.is_empty() => sections.push(SeasonSection {
                header: None,
                records: Vec::new(),
            }),
            _ => {}
        }

        if let Some(section) = sections.last_mut() {
            section.records.push(record);
        }
    }

    sections
}

/// Heroes offered by the history hero filter, sorted.
pub fn hero_options(dataset: &Dataset, player: PlayerSelector) -> Vec<String> {
    let mut heroes = BTreeSet::new();
    for record in dataset.records() {
        match player {
            PlayerSelector::Player(p) => heroes.extend(record.slot(p).hero()),
            PlayerSelector::All => heroes.extend(record.slots.iter().filter_map(|s| s.hero())),
        }
    }
    heroes.into_iter().map(str::to_string).collect()
}

/// Keep the current hero selection only if it is still offered.
pub fn reconcile_hero(options: &[String], current: Option<&str>) -> Option<String> {
    current
        .filter(|hero| options.iter().any(|o| o == hero))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{played, record, roster};
    use crate::models::Slot;
    use pretty_assertions::assert_eq;

    fn dataset(n: i64) -> Dataset {
        Dataset::new(roster(), (1..=n).map(|id| record(id, "Win", "Ana")).collect())
    }

    fn all() -> HistoryQuery {
        HistoryQuery {
            player: PlayerSelector::All,
            hero: None,
        }
    }

    fn ids(page: &HistoryPage) -> Vec<i64> {
        page.records().iter().filter_map(|r| r.match_id).collect()
    }

    #[test]
    fn test_shown_count_transitions() {
        assert_eq!(next_shown_count(10, 10, PageTrigger::LoadMore), 20);
        assert_eq!(next_shown_count(40, 25, PageTrigger::LoadMore), 65);
        assert_eq!(next_shown_count(40, 25, PageTrigger::FilterChanged), DEFAULT_SHOWN);
        assert_eq!(next_shown_count(3, 10, PageTrigger::FilterChanged), 10);
    }

    #[test]
    fn test_page_returns_most_recent_first() {
        let dataset = dataset(25);

        let (first, shown) = page(&dataset, &all(), 0, 10, PageTrigger::FilterChanged);
        assert_eq!(shown, 10);
        assert_eq!(ids(&first), (16..=25).rev().collect::<Vec<_>>());

        let (more, shown) = page(&dataset, &all(), shown, 10, PageTrigger::LoadMore);
        assert_eq!(shown, 20);
        assert_eq!(ids(&more).len(), 20);

        let (rest, shown) = page(&dataset, &all(), shown, 10, PageTrigger::LoadMore);
        assert_eq!(shown, 30);
        assert_eq!(ids(&rest).len(), 25);
        assert_eq!(ids(&rest).last(), Some(&1));
    }

    #[test]
    fn test_empty_dataset_and_no_matches_are_distinct() {
        let empty = Dataset::empty(roster());
        let (result, shown) = page(&empty, &all(), 10, 10, PageTrigger::LoadMore);
        assert_eq!(result, HistoryPage::DatasetEmpty);
        assert_eq!(shown, 20);

        let query = HistoryQuery {
            player: PlayerSelector::All,
            hero: Some("Zarya".to_string()),
        };
        let three = dataset(3);
        let (result, _) = page(&three, &query, 10, 10, PageTrigger::FilterChanged);
        assert_eq!(result, HistoryPage::NoMatches);
        assert!(result.records().is_empty());
    }

    #[test]
    fn test_zero_shown_still_reports_matches() {
        let dataset = dataset(3);
        let (result, shown) = page(&dataset, &all(), 0, 0, PageTrigger::LoadMore);
        assert_eq!(shown, 0);
        assert_eq!(result, HistoryPage::Records(Vec::new()));
        assert_ne!(result, HistoryPage::NoMatches);
    }

    #[test]
    fn test_player_and_hero_selection() {
        let roster = roster();
        let bob = roster.index_of("Bob").unwrap();

        let mut with_bob = record(1, "Win", "Ana");
        with_bob.slots[1] = played("Tank", "Orisa");
        let mut bob_on_ana = record(2, "Lose", "Mercy");
        bob_on_ana.slots[1] = played("Support", "Ana");
        bob_on_ana.slots[0] = Slot::NotPresent;
        let dataset = Dataset::new(roster.clone(), vec![with_bob, bob_on_ana, record(3, "Win", "Kiriko")]);

        let bob_games = HistoryQuery { player: PlayerSelector::Player(bob), hero: None };
        let matched: Vec<_> = select(&dataset, &bob_games).iter().filter_map(|r| r.match_id).collect();
        assert_eq!(matched, vec![2, 1]);

        let bob_orisa = HistoryQuery { player: PlayerSelector::Player(bob), hero: Some("Orisa".into()) };
        assert_eq!(select(&dataset, &bob_orisa).len(), 1);

        let anyone_ana = HistoryQuery { player: PlayerSelector::All, hero: Some("Ana".into()) };
        let matched: Vec<_> = select(&dataset, &anyone_ana).iter().filter_map(|r| r.match_id).collect();
        assert_eq!(matched, vec![2, 1]);
    }

    #[test]
    fn test_player_selector_parse() {
        let roster = roster();
        assert_eq!(PlayerSelector::parse(&roster, None).unwrap(), PlayerSelector::All);
        assert_eq!(PlayerSelector::parse(&roster, Some("ALL")).unwrap(), PlayerSelector::All);
        assert_eq!(
            PlayerSelector::parse(&roster, Some("dana")).unwrap(),
            PlayerSelector::Player(roster.index_of("Dana").unwrap())
        );
        assert!(matches!(
            PlayerSelector::parse(&roster, Some("Mallory")),
            Err(AppError::UnknownPlayer(_))
        ));
    }

    #[test]
    fn test_group_by_season_emits_header_per_boundary() {
        let season = |id: i64, season: Option<&str>| {
            let mut r = record(id, "Win", "Ana");
            r.season = season.map(str::to_string);
            r
        };
        let mut no_map = season(4, Some("Season 11"));
        no_map.map = None;
        let records = vec![
            season(8, None),
            season(7, Some("Season 12")),
            season(6, Some("Season 12")),
            season(5, None),
            no_map,
            season(3, Some("Season 11")),
            season(2, Some("S10")),
            season(1, Some("Preseason")),
        ];
        let refs: Vec<&MatchRecord> = records.iter().collect();

        let sections: Vec<(Option<String>, Vec<i64>)> = group_by_season(&refs)
            .into_iter()
            .map(|s| (s.header, s.records.iter().filter_map(|r| r.match_id).collect()))
            .collect();

        assert_eq!(
            sections,
            vec![
                (None, vec![8]),
                (Some("Season 12".to_string()), vec![7, 6, 5]),
                (Some("Season 11".to_string()), vec![3]),
                (Some("Season 10".to_string()), vec![2]),
                (Some("Preseason".to_string()), vec![1]),
            ]
        );
    }

    #[test]
    fn test_hero_options_and_reconcile() {
        let roster = roster();
        let mut shared = record(1, "Win", "Ana");
        shared.slots[1] = played("Tank", "Orisa");
        let dataset = Dataset::new(roster.clone(), vec![shared, record(2, "Lose", "Mercy")]);

        let alice = PlayerSelector::Player(roster.index_of("Alice").unwrap());
        assert_eq!(hero_options(&dataset, alice), vec!["Ana".to_string(), "Mercy".to_string()]);

        let everyone = hero_options(&dataset, PlayerSelector::All);
        assert_eq!(everyone, vec!["Ana".to_string(), "Mercy".to_string(), "Orisa".to_string()]);

        assert_eq!(reconcile_hero(&everyone, Some("Orisa")), Some("Orisa".to_string()));
        assert_eq!(reconcile_hero(&everyone, Some("Zarya")), None);
        assert_eq!(reconcile_hero(&everyone, None), None);
    }
}
