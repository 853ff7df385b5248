use crate::analysis::filter::FilterOptions;
use crate::analysis::history::{group_by_season, HistoryPage};
use crate::analysis::trend::TrendPoint;
use crate::analysis::winrate::{BestOf, GroupBy, HeatCell, MapPlays, MapSideRow, PlayCount, PlayerSeries, Summary, WinrateRow};
use crate::models::{MatchRecord, Outcome, Roster, Side};
use colored::*;
use tabled::{settings::Style, Table, Tabled};

const NO_DATA: &str = "No data available for this selection";

#[derive(Tabled)]
struct WinrateTableRow {
    #[tabled(rename = "#")]
    rank: String,
    group: String,
    games: String,
    record: String,
    win_rate: String,
}

#[derive(Tabled)]
struct PlayCountRow {
    #[tabled(rename = "#")]
    rank: String,
    group: String,
    games: String,
}

#[derive(Tabled)]
struct MapSideTableRow {
    map: String,
    side: String,
    games: String,
    win_rate: String,
}

#[derive(Tabled)]
struct MapPlaysRow {
    map: String,
    both: String,
    attack: String,
    defense: String,
    #[tabled(rename = "other modes")]
    other: String,
    total: String,
}

#[derive(Tabled)]
struct HeatRow {
    role: String,
    map: String,
    games: String,
    win_rate: String,
}

#[derive(Tabled)]
struct TrendRow {
    game: String,
    #[tabled(rename = "ID")]
    id: String,
    date: String,
    hero: String,
    result: String,
    win_rate: String,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "ID")]
    id: String,
    date: String,
    map: String,
    mode: String,
    result: String,
    players: String,
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn heading(title: &str) {
    println!("\n{}", title.bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
}

fn print_table(table: &mut Table) {
    table.with(Style::rounded());
    println!("{}", table);
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_warning(message: &str) {
    eprintln!("{} {}", "⚠️".yellow(), message);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn display_summary(player: &str, period: &str, summary: Option<&Summary>, best: &BestOf, min_games: usize) {
    heading(&format!("📊 Overall stats for {} ({})", player, period));

    let Some(summary) = summary else {
        println!("{}", NO_DATA.yellow());
        return;
    };

    println!(
        "{} {}   {} {}   {} {}   {} {}\n",
        "Games:".bold(),
        summary.games,
        "Won:".bold(),
        summary.wins.to_string().green(),
        "Lost:".bold(),
        summary.losses.to_string().red(),
        "Win rate:".bold(),
        percent(summary.winrate).blue()
    );

    let played = |label: &str, count: &Option<PlayCount>| match count {
        Some(c) => println!("  {:<22} {} ({} games)", label, c.group.bold(), c.games),
        None => println!("  {:<22} {}", label, "N/A (no data)".dimmed()),
    };
    let best_rate = |label: &str, row: &Option<WinrateRow>| match row {
        Some(r) => println!(
            "  {:<22} {} ({} over {} games)",
            label,
            r.group.bold(),
            percent(r.winrate),
            r.games
        ),
        None => println!("  {:<22} {}", label, format!("N/A (min. {} games)", min_games).dimmed()),
    };

    played("Most played hero", &best.most_played_hero);
    best_rate("Best hero win rate", &best.best_hero);
    played("Most played map", &best.most_played_map);
    best_rate("Best map win rate", &best.best_map);
}

pub fn display_winrates(series: &[PlayerSeries<WinrateRow>], by: GroupBy, period: &str) {
    for s in series {
        heading(&format!("🏆 Win rate by {} - {} ({})", by.label(), s.player, period));
        if s.values.is_empty() {
            println!("{}", NO_DATA.yellow());
            continue;
        }

        let rows: Vec<WinrateTableRow> = s
            .values
            .iter()
            .enumerate()
            .map(|(idx, r)| {
                let win_rate = if r.winrate >= 0.5 {
                    percent(r.winrate).green().to_string()
                } else {
                    percent(r.winrate).red().to_string()
                };
                WinrateTableRow {
                    rank: format!("#{}", idx + 1),
                    group: r.group.clone(),
                    games: r.games.to_string(),
                    record: format!("{}W / {}L", r.wins, r.losses),
                    win_rate,
                }
            })
            .collect();
        print_table(&mut Table::new(rows));
    }
}

pub fn display_play_counts(series: &[PlayerSeries<PlayCount>], by: GroupBy, period: &str) {
    for s in series {
        heading(&format!("🎮 Games per {} - {} ({})", by.label(), s.player, period));
        if s.values.is_empty() {
            println!("{}", NO_DATA.yellow());
            continue;
        }

        let rows: Vec<PlayCountRow> = s
            .values
            .iter()
            .enumerate()
            .map(|(idx, c)| PlayCountRow {
                rank: format!("#{}", idx + 1),
                group: c.group.clone(),
                games: c.games.to_string(),
            })
            .collect();
        print_table(&mut Table::new(rows));
    }
}

pub fn display_map_breakdown(
    player: &str,
    rows: &[MapSideRow],
    plays: &[MapPlays],
    sides: &[PlayCount],
    heat: &[HeatCell],
) {
    heading(&format!("🗺️  Map win rate by side - {}", player));
    if rows.is_empty() {
        println!("{}", NO_DATA.yellow());
    } else {
        let table_rows: Vec<MapSideTableRow> = rows
            .iter()
            .map(|r| MapSideTableRow {
                map: r.map.clone(),
                side: match r.side {
                    Side::Attack => r.side.label().red().to_string(),
                    Side::Defense => r.side.label().blue().to_string(),
                    _ => r.side.label().to_string(),
                },
                games: r.stats.games.to_string(),
                win_rate: percent(r.stats.winrate),
            })
            .collect();
        print_table(&mut Table::new(table_rows));
    }

    heading(&format!("🎮 Games per map by side - {}", player));
    if plays.is_empty() {
        println!("{}", NO_DATA.yellow());
    } else {
        let count = |n: usize| if n == 0 { "-".to_string() } else { n.to_string() };
        let play_rows: Vec<MapPlaysRow> = plays
            .iter()
            .map(|p| MapPlaysRow {
                map: p.map.clone(),
                both: count(p.both),
                attack: count(p.attack),
                defense: count(p.defense),
                other: count(p.other),
                total: p.total().to_string(),
            })
            .collect();
        print_table(&mut Table::new(play_rows));
    }

    if !sides.is_empty() {
        let total: usize = sides.iter().map(|s| s.games).sum();
        println!("\n{}", "Side distribution".bold().yellow());
        for side in sides {
            println!(
                "  {:<12} {:>4} games ({})",
                side.group,
                side.games,
                percent(side.games as f64 / total as f64)
            );
        }
    }

    heading(&format!("🔥 Win rate heatmap (role × map) - {}", player));
    if heat.is_empty() {
        println!("{}", NO_DATA.yellow());
        return;
    }
    let heat_rows: Vec<HeatRow> = heat
        .iter()
        .map(|c| HeatRow {
            role: c.role.clone(),
            map: c.map.clone(),
            games: c.games.to_string(),
            win_rate: percent(c.winrate),
        })
        .collect();
    print_table(&mut Table::new(heat_rows));
}

pub fn display_trend(series: &[PlayerSeries<TrendPoint>], hero: Option<&str>) {
    let suffix = hero.map(|h| format!(" on {}", h)).unwrap_or_default();
    for s in series {
        heading(&format!("📈 Win rate over time - {}{}", s.player, suffix));
        let Some(last) = s.values.last() else {
            println!("{}", NO_DATA.yellow());
            continue;
        };

        let rows: Vec<TrendRow> = s
            .values
            .iter()
            .map(|p| TrendRow {
                game: p.game_number.to_string(),
                id: p.match_id.map(|id| id.to_string()).unwrap_or_default(),
                date: p.date.format("%d.%m.%Y").to_string(),
                hero: p.hero.clone(),
                result: if p.won {
                    "WIN".green().to_string()
                } else {
                    "LOSS".red().to_string()
                },
                win_rate: percent(p.cumulative_winrate),
            })
            .collect();
        print_table(&mut Table::new(rows));
        println!(
            "{} {} after {} games\n",
            "Current:".bold(),
            percent(last.cumulative_winrate),
            last.game_number
        );
    }
}

fn history_row(record: &MatchRecord, roster: &Roster) -> HistoryRow {
    let date = record
        .date
        .map(|d| d.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| "Invalid Date".to_string());
    let mode = match &record.side {
        Some(side) if *side != Side::Both => {
            format!("{} • {}", record.gamemode.as_deref().unwrap_or(""), side.label())
        }
        _ => record.gamemode.clone().unwrap_or_default(),
    };
    let result = match record.outcome {
        Some(Outcome::Win) => "VICTORY".green().to_string(),
        _ => "DEFEAT".red().to_string(),
    };
    let players = roster
        .iter()
        .filter_map(|(p, name)| {
            let slot = record.slot(p);
            Some(format!("{} ({}): {}", name, slot.role()?, slot.hero()?))
        })
        .collect::<Vec<_>>()
        .join("\n");

    HistoryRow {
        id: record.match_id.map(|id| id.to_string()).unwrap_or_default(),
        date,
        map: record.map.clone().unwrap_or_default(),
        mode,
        result,
        players,
    }
}

pub fn display_history(page: &HistoryPage, roster: &Roster, shown: usize) {
    heading("🕑 Match history");

    match page {
        HistoryPage::DatasetEmpty => {
            println!("{}", "No match history available.".red());
            return;
        }
        HistoryPage::NoMatches => {
            println!("{}", "No games found for this filter combination.".yellow());
            return;
        }
        HistoryPage::Records(_) => {}
    }
    let records = page.records();

    for section in group_by_season(records) {
        if let Some(header) = &section.header {
            println!("\n{}", format!("── {} ──", header).bold().white());
        }
        let rows: Vec<HistoryRow> = section.records.iter().map(|r| history_row(r, roster)).collect();
        print_table(&mut Table::new(rows));
    }

    println!(
        "\n{}",
        format!("Showing {} of up to {} requested games", records.len(), shown).dimmed()
    );
}

pub fn display_options(options: &FilterOptions, heroes: &[String], player: &str) {
    heading("🔎 Available filters");
    let list = |values: Vec<String>| {
        if values.is_empty() {
            "-".dimmed().to_string()
        } else {
            values.join(", ")
        }
    };

    println!("{} {}", "Seasons:".bold(), list(options.seasons.clone()));
    println!("{} {}", "Years:".bold(), list(options.years.iter().map(|y| y.to_string()).collect()));
    println!("{} {}", "Months:".bold(), list(options.months.clone()));
    println!("{} {}", format!("Heroes ({}):", player).bold(), list(heroes.to_vec()));
    println!();
}
