//! srl - spaced repetition scheduler
//!
//! Command-line front end over the SM-2 engine: manage decks, answer
//! reviews, and print due statistics and forecasts.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use srl_engine::config::Config;
use srl_engine::sm2::format_interval;
use srl_engine::stats::{self, CollectionStats, WeeklyWorkload};
use srl_engine::status::{due_status, learned_status};
use srl_engine::storage::{DeckStore, JsonDeckStore};
use srl_engine::{
    Clock, Deck, ResponseQuality, ReviewItem, Scheduler, SessionSelector, StudyMode, SystemClock,
};

// ══════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ══════════════════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(name = "srl")]
#[command(author, version, about = "SM-2 spaced repetition scheduler", long_about = None)]
struct Args {
    /// Directory containing deck files
    #[arg(short, long, global = true)]
    decks_dir: Option<PathBuf>,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List decks
    List,
    /// Create an empty deck
    New { name: String },
    /// Add an item to a deck
    Add {
        deck: String,
        front: String,
        back: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// Import a CSV file (front,back[,category]) as a new deck
    Import {
        csv: PathBuf,
        #[arg(long, default_value = "Imported Deck")]
        name: String,
    },
    /// Learned and due counts for a deck
    Stats { deck: String },
    /// Per-day due forecast
    Forecast {
        deck: String,
        #[arg(long)]
        days: Option<u32>,
    },
    /// Show the working set for a study session
    Study {
        deck: String,
        #[arg(long, value_enum, default_value_t = ModeArg::Daily)]
        mode: ModeArg,
        /// Category or tag, for `--mode category`
        #[arg(long)]
        category: Option<String>,
        /// Daily cap on new items
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Record an answer for one item
    Review {
        deck: String,
        item: String,
        /// again, hard, good, easy (or 1-4)
        quality: ResponseQuality,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Review,
    New,
    All,
    Mistakes,
    Category,
    Daily,
}

// ══════════════════════════════════════════════════════════════════════════
// Main Entry Point
// ══════════════════════════════════════════════════════════════════════════

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "srl_engine=info,srl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable config: {:#}", e);
            Config::default()
        }),
    };

    // Determine decks directory
    let decks_dir = args
        .decks_dir
        .or_else(|| config.decks_dir.clone())
        .unwrap_or_else(JsonDeckStore::default_path);
    let store = JsonDeckStore::new(decks_dir)?;

    run(args.command, &store, &config, &SystemClock)
}

fn run(command: Command, store: &JsonDeckStore, config: &Config, clock: &dyn Clock) -> Result<()> {
    let now = clock.now();

    match command {
        Command::List => {
            let decks = store.list()?;
            if decks.is_empty() {
                println!("No decks in {:?}", store.decks_dir());
            }
            for info in decks {
                println!("{}  {} ({} items)", info.id, info.name, info.item_count);
            }
        }

        Command::New { name } => {
            let deck = Deck::new(name, now);
            store.save(&deck)?;
            println!("✓ Created '{}' ({})", deck.name, deck.id);
        }

        Command::Add {
            deck,
            front,
            back,
            category,
        } => {
            let mut deck = open_deck(store, &deck)?;
            let mut item = ReviewItem::new(front, back, now);
            item.category = category.unwrap_or_default();
            let id = item.id.clone();
            if !deck.insert(item) {
                return Err(anyhow!("Item id {} already exists in '{}'", id, deck.name));
            }
            store.save(&deck)?;
            println!("✓ Added {} to '{}'", id, deck.name);
        }

        Command::Import { csv, name } => {
            let deck = store.import_csv(&csv, &name, now)?;
            store.save(&deck)?;
            println!("✓ Imported {} items into '{}'", deck.len(), deck.name);
        }

        Command::Stats { deck } => {
            let deck = open_deck(store, &deck)?;
            print_stats(&deck, now);
        }

        Command::Forecast { deck, days } => {
            let deck = open_deck(store, &deck)?;
            let days = stats::forecast(&deck.items, now, days.unwrap_or(config.forecast_days));
            for day in &days {
                println!("{}  {:>4}  {}", day.date, day.count, day.intensity().name());
            }
            let week = WeeklyWorkload::from_forecast(&days);
            println!(
                "this week {}, next week {}, following {}",
                week.this_week, week.next_week, week.following
            );
        }

        Command::Study {
            deck,
            mode,
            category,
            limit,
        } => {
            let deck = open_deck(store, &deck)?;
            let mode = match mode {
                ModeArg::Review => StudyMode::Review,
                ModeArg::New => StudyMode::New,
                ModeArg::All => StudyMode::All,
                ModeArg::Mistakes => StudyMode::Mistakes,
                ModeArg::Daily => StudyMode::Daily,
                ModeArg::Category => StudyMode::Category(
                    category.ok_or_else(|| anyhow!("--mode category needs --category"))?,
                ),
            };
            let selector = SessionSelector::new(limit.unwrap_or(config.new_cards_per_day));
            let picked = selector.select_deck(&deck, &mode, now);

            println!("{} items ({} mode)", picked.len(), mode.name());
            for item in picked {
                println!(
                    "{}  {:<10} {:<9} {}",
                    item.id,
                    due_status(item, now).state.name(),
                    learned_status(item).state.name(),
                    item.front
                );
            }
        }

        Command::Review {
            deck,
            item,
            quality,
        } => {
            let mut deck = open_deck(store, &deck)?;
            let scheduler = Scheduler::new();
            let updated = deck.apply_review(&scheduler, &item, quality, now).cloned();
            let updated =
                updated.ok_or_else(|| anyhow!("No item '{}' in deck '{}'", item, deck.name))?;
            store.save(&deck)?;
            println!(
                "✓ {} → next in {} (ease {:.2}, due {})",
                quality,
                format_interval(updated.interval),
                updated.ease_factor,
                updated.next_review.format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}

fn open_deck(store: &JsonDeckStore, id_or_name: &str) -> Result<Deck> {
    store
        .find(id_or_name)?
        .ok_or_else(|| anyhow!("No deck named '{}'", id_or_name))
}

fn print_stats(deck: &Deck, now: chrono::DateTime<chrono::Local>) {
    let s = CollectionStats::compute(&deck.items, now);
    let due = stats::due_counts(&deck.items, now);

    println!("{} ({} items)", deck.name, s.total);
    println!(
        "  new {}  learning {}  learned {}  mastered {}",
        s.new, s.learning, s.learned, s.mastered
    );
    println!(
        "  overdue {}  due today {}  due soon {}  this week {}",
        s.overdue, s.due_today, s.due_soon, s.due_this_week
    );
    println!("  waiting now: {} new, {} review", due.new, due.review);
    println!(
        "  average success {:.0}%  retention {:.0}%",
        s.average_success_rate * 100.0,
        stats::retention_rate(&deck.items)
    );

    let streak = stats::study_streak(
        deck.history.iter().map(|log| log.reviewed_at.date_naive()),
        now.date_naive(),
    );
    println!("  streak {} days", streak);
}
