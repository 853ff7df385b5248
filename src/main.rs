mod analysis;
mod cache;
mod config;
mod display;
mod error;
mod models;
mod source;
mod store;

use analysis::filter::{filter, filter_options, filter_player, Period};
use analysis::history::{hero_options, page, reconcile_hero, HistoryQuery, PageTrigger, PlayerSelector, DEFAULT_SHOWN};
use analysis::trend::compare_trends;
use analysis::winrate::{
    best_of, compare_play_counts, compare_winrates, map_side_breakdown, map_side_play_counts, role_map_heatmap,
    side_distribution, summary, GroupBy,
};
use anyhow::Context;
use cache::SnapshotCache;
use clap::{Parser, Subcommand};
use config::Config;
use display::output::{
    display_error, display_history, display_info, display_map_breakdown, display_options, display_play_counts,
    display_success, display_summary, display_trend, display_warning, display_winrates,
};
use error::AppError;
use indicatif::ProgressBar;
use models::{Dataset, PlayerIndex};
use source::client::SheetClient;
use std::path::PathBuf;
use std::time::Duration;
use store::DatasetStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ow-squad")]
#[command(about = "Win rates and match history for a five-player Overwatch squad", long_about = None)]
#[command(version)]
struct Args {
    /// Snapshot directory (default: OW_DATA_DIR or ~/.ow_squad)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct PeriodArgs {
    /// Season label, overrides --year and --month
    #[arg(long)]
    season: Option<String>,

    #[arg(long)]
    year: Option<i32>,

    #[arg(long)]
    month: Option<String>,
}

impl PeriodArgs {
    fn period(&self) -> Period {
        Period::from_filters(self.season.clone(), self.year, self.month.clone())
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the sheet and replace the local snapshot
    Refresh,

    /// Totals, best-of cards and win rate per group
    Stats {
        player: String,

        #[command(flatten)]
        period: PeriodArgs,

        /// Column to group by
        #[arg(short, long, value_enum, default_value = "hero")]
        by: GroupBy,

        /// Show games played per group instead of win rate
        #[arg(long)]
        plays: bool,

        /// Minimum games for a group to count in win rate rankings
        #[arg(short, long, default_value = "5")]
        min_games: usize,

        /// Other roster players to compare against (repeatable)
        #[arg(short, long)]
        compare: Vec<String>,
    },

    /// Map win rate by side and the role × map heatmap
    Maps {
        player: String,

        #[command(flatten)]
        period: PeriodArgs,

        #[arg(short, long, default_value = "5")]
        min_games: usize,
    },

    /// Cumulative win rate, oldest game first
    Trend {
        player: String,

        #[command(flatten)]
        period: PeriodArgs,

        /// Only count games on this hero
        #[arg(long)]
        hero: Option<String>,

        #[arg(short, long)]
        compare: Vec<String>,
    },

    /// Recent matches grouped by season
    History {
        /// Roster player or ALL
        #[arg(short, long)]
        player: Option<String>,

        #[arg(long)]
        hero: Option<String>,

        /// Games added per "load more"
        #[arg(long, default_value = "10")]
        page_size: usize,

        /// Number of "load more" steps after the first page
        #[arg(long, default_value = "0")]
        pages: usize,
    },

    /// List seasons, years, months and heroes present in the data
    Options {
        /// Roster player or ALL
        #[arg(short, long)]
        player: Option<String>,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);

    if let Err(e) = run(args) {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let data_dir = args.data_dir.unwrap_or_else(|| config.data_dir.clone());
    let cache = SnapshotCache::new(&data_dir);

    let mut store = DatasetStore::new(config.roster.clone());
    if let Err(e) = store.load_local(&cache) {
        display_warning(&format!("Could not load local snapshot: {}", e));
    }

    let dataset = store.current();
    let refreshing = matches!(args.command, Command::Refresh);
    if dataset.is_empty() && !refreshing {
        display_warning("No local data yet, run `ow-squad refresh` first");
    } else if let Some(at) = store.refreshed_at() {
        tracing::debug!(matches = dataset.len(), refreshed_at = %at, "using snapshot");
    }

    match args.command {
        Command::Refresh => refresh(&mut store, &config, &cache)?,
        Command::Stats {
            player,
            period,
            by,
            plays,
            min_games,
            compare,
        } => {
            let period = period.period();
            let main = dataset.roster().resolve(&player)?;
            let games = filter_player(&dataset, main, &period);

            display_summary(
                dataset.roster().name(main),
                &period.describe(),
                summary(&games).as_ref(),
                &best_of(&games, min_games),
                min_games,
            );

            let players = with_compared(&dataset, main, &compare)?;
            if plays {
                display_play_counts(&compare_play_counts(&dataset, &players, &period, by), by, &period.describe());
            } else {
                display_winrates(
                    &compare_winrates(&dataset, &players, &period, by, min_games),
                    by,
                    &period.describe(),
                );
            }
        }
        Command::Maps {
            player,
            period,
            min_games,
        } => {
            let period = period.period();
            let main = dataset.roster().resolve(&player)?;
            let games = filter(&dataset, Some(player.as_str()), &period);

            display_map_breakdown(
                dataset.roster().name(main),
                &map_side_breakdown(&games, min_games),
                &map_side_play_counts(&games),
                &side_distribution(&games),
                &role_map_heatmap(&games),
            );
        }
        Command::Trend {
            player,
            period,
            hero,
            compare,
        } => {
            let main = dataset.roster().resolve(&player)?;
            let players = with_compared(&dataset, main, &compare)?;
            let series = compare_trends(&dataset, &players, &period.period(), hero.as_deref());
            display_trend(&series, hero.as_deref());
        }
        Command::History {
            player,
            hero,
            page_size,
            pages,
        } => {
            let selector = PlayerSelector::parse(dataset.roster(), player.as_deref())?;
            let offered = hero_options(&dataset, selector);
            let hero = match (hero.as_deref(), reconcile_hero(&offered, hero.as_deref())) {
                (Some(requested), None) => {
                    display_warning(&format!("{} was never played by this selection, showing all heroes", requested));
                    None
                }
                (_, kept) => kept,
            };
            let query = HistoryQuery { player: selector, hero };

            let (mut feed, mut shown) = page(&dataset, &query, DEFAULT_SHOWN, page_size, PageTrigger::FilterChanged);
            for _ in 0..pages {
                (feed, shown) = page(&dataset, &query, shown, page_size, PageTrigger::LoadMore);
            }
            display_history(&feed, dataset.roster(), shown);
        }
        Command::Options { player } => {
            let selector = PlayerSelector::parse(dataset.roster(), player.as_deref())?;
            let label = match selector {
                PlayerSelector::All => PlayerSelector::ALL_SENTINEL.to_string(),
                PlayerSelector::Player(p) => dataset.roster().name(p).to_string(),
            };
            display_options(&filter_options(&dataset), &hero_options(&dataset, selector), &label);
        }
    }

    Ok(())
}

fn refresh(store: &mut DatasetStore, config: &Config, cache: &SnapshotCache) -> anyhow::Result<()> {
    let url = config.sheet_url.as_deref().ok_or(AppError::NoRemoteSource)?;
    let client = SheetClient::new(url);
    display_info(&format!("Downloading match sheet from {}", client.url()));

    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Fetching sheet");
    let result = store.refresh(&client, cache);
    pb.finish_and_clear();

    let summary = result.context("refresh failed, local data left unchanged")?;
    display_success(&format!(
        "Loaded {} matches (previously {}) at {}, snapshot saved to {}",
        summary.matches,
        summary.previous_matches,
        summary.fetched_at.format("%d.%m.%Y %H:%M UTC"),
        cache.path().display()
    ));
    Ok(())
}

/// The main player followed by any comparison players, without duplicates.
fn with_compared(dataset: &Dataset, main: PlayerIndex, others: &[String]) -> Result<Vec<PlayerIndex>, AppError> {
    let mut players = vec![main];
    for name in others {
        let player = dataset.roster().resolve(name)?;
        if !players.contains(&player) {
            players.push(player);
        }
    }
    Ok(players)
}
