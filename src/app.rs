//! Command line front end.
//! Handles deck and card management, reviews and practice sessions.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use study_tool::config::Config;
use study_tool::database::{CardStore, SqliteStore};
use study_tool::export::json::{export_deck_to_path, import_deck_from_path};
use study_tool::models::sm2::{format_interval, preview_intervals};
use study_tool::models::{
    CardFilter, CardId, CardUpdate, DeckId, LearningSession, NewCard, Rating, ReviewCard,
};
use study_tool::scheduler::{
    LimitPolicy, PracticePool, count_due, next_review_card, reset_progress, start_practice_session,
    submit_review,
};
use study_tool::SchedulerError;

#[derive(Parser)]
#[command(name = "study", version, about = "Flashcards with spaced repetition")]
pub struct Cli {
    /// Database file (overrides STUDY_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage decks
    #[command(subcommand)]
    Deck(DeckCommand),
    /// Manage cards
    #[command(subcommand)]
    Card(CardCommand),
    /// Review due cards
    #[command(subcommand)]
    Review(ReviewCommand),
    /// Show how many cards are due
    Due,
    /// Practise a deck without touching the schedule
    Practice(PracticeArgs),
    /// Export a deck to JSON
    Export {
        #[arg(long)]
        deck: DeckId,
        path: PathBuf,
    },
    /// Import a deck from JSON
    Import { path: PathBuf },
}

#[derive(Subcommand)]
enum DeckCommand {
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    List,
}

#[derive(Subcommand)]
enum CardCommand {
    Add {
        #[arg(long)]
        deck: DeckId,
        #[arg(long)]
        front: String,
        #[arg(long)]
        back: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, default_value = "basic")]
        card_type: String,
        #[arg(long)]
        source_id: Option<i64>,
        #[arg(long)]
        source_chunk_id: Option<i64>,
    },
    List {
        #[arg(long)]
        deck: Option<DeckId>,
        /// Only cards generated from this source
        #[arg(long)]
        source_id: Option<i64>,
    },
    /// Change the content of a card or move it to another deck
    Edit {
        id: CardId,
        #[arg(long)]
        front: Option<String>,
        #[arg(long)]
        back: Option<String>,
        #[arg(long)]
        card_type: Option<String>,
        /// Replaces all tags; repeat for several
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,
        /// Move the card to this deck
        #[arg(long)]
        deck: Option<DeckId>,
    },
    Delete {
        id: CardId,
    },
    /// Show the review log of a card
    History {
        id: CardId,
    },
}

#[derive(Subcommand)]
enum ReviewCommand {
    /// Record one review and print the new schedule as JSON
    Submit {
        card_id: CardId,
        /// 1 = again, 2 = hard, 3 = good, 4 = easy
        #[arg(allow_hyphen_values = true)]
        rating: i64,
        #[arg(long, default_value_t = 0)]
        duration_ms: u64,
    },
    /// Show the next due card
    Next,
    /// Review due cards one at a time
    Session,
    /// Put a card back to the initial schedule
    Reset { card_id: CardId },
}

#[derive(Args)]
struct PracticeArgs {
    #[arg(long)]
    deck: DeckId,
    #[arg(long, default_value_t = PracticePool::DueRecent)]
    pool: PracticePool,
    #[arg(long)]
    limit: Option<usize>,
    /// Seed for sampling the `all` pool
    #[arg(long, conflicts_with = "truncate")]
    seed: Option<u64>,
    /// Keep the first cards of the `all` pool instead of sampling
    #[arg(long)]
    truncate: bool,
    /// Run the practice session instead of listing card ids
    #[arg(long)]
    interactive: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env().context("invalid configuration")?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    let now = match cli.today {
        Some(day) => day.and_time(Utc::now().time()).and_utc(),
        None => Utc::now(),
    };
    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("cannot open {}", config.db_path.display()))?;

    match cli.command {
        Command::Deck(DeckCommand::Add { name, description }) => {
            let deck = store.create_deck(&name, &description)?;
            println!("Deck '{}' created with id {}.", deck.name, deck.id);
        }
        Command::Deck(DeckCommand::List) => {
            for deck in store.list_decks()? {
                let count = store.card_ids_in_deck(deck.id)?.len();
                println!("{:>4}  {} ({} cards)", deck.id, deck.name, count);
            }
        }
        Command::Card(CardCommand::Add {
            deck,
            front,
            back,
            tags,
            card_type,
            source_id,
            source_chunk_id,
        }) => {
            let new_card = NewCard {
                front,
                back,
                card_type,
                tags,
                source_id,
                source_chunk_id,
            };
            let (card, state) = store.add_card(deck, &new_card, now)?;
            println!("Card {} added, due {}.", card.id, state.due);
        }
        Command::Card(CardCommand::List { deck, source_id }) => {
            let filter = CardFilter {
                deck_id: deck,
                source_id,
            };
            for card in store.list_cards(filter)? {
                println!("{:>4}  {}  ->  {}", card.id, card.front, card.back);
            }
        }
        Command::Card(CardCommand::Edit {
            id,
            front,
            back,
            card_type,
            tags,
            deck,
        }) => {
            let update = CardUpdate {
                front,
                back,
                card_type,
                tags,
                deck_id: deck,
            };
            if update.is_empty() {
                bail!("nothing to change for card {}", id);
            }
            let card = store.update_card(id, &update, now)?;
            println!("Card {} updated (deck {}).", card.id, card.deck_id);
        }
        Command::Card(CardCommand::Delete { id }) => {
            store.delete_card(id)?;
            println!("Card {} deleted.", id);
        }
        Command::Card(CardCommand::History { id }) => {
            for entry in store.review_history(id)? {
                println!(
                    "{}  {:<5}  {}ms",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.rating,
                    entry.duration_ms
                );
            }
        }
        Command::Review(ReviewCommand::Submit {
            card_id,
            rating,
            duration_ms,
        }) => {
            let outcome = submit_review(&store, card_id, rating, duration_ms, now, &config.review_options())?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Review(ReviewCommand::Next) => match next_review_card(&store, now.date_naive()) {
            Ok(review) => print_review_card(&review, now, config.min_ease),
            Err(SchedulerError::NoDueCards) => println!("No cards are due."),
            Err(err) => return Err(err.into()),
        },
        Command::Review(ReviewCommand::Session) => review_session(&store, &config, now)?,
        Command::Review(ReviewCommand::Reset { card_id }) => {
            let state = reset_progress(&store, card_id, now.date_naive(), &config.review_options())?;
            println!("Card {} reset, due {}.", card_id, state.due);
        }
        Command::Due => {
            let summary = count_due(&store, now.date_naive())?;
            println!("{}", serde_json::to_string(&summary)?);
        }
        Command::Practice(args) => practice(&store, &config, args, now.date_naive())?,
        Command::Export { deck, path } => {
            let export = export_deck_to_path(&store, deck, &path)?;
            println!("Exported {} cards to {}.", export.cards.len(), path.display());
        }
        Command::Import { path } => {
            let (deck, added) = import_deck_from_path(&store, &path, now)?;
            println!("Imported {} cards into '{}'.", added, deck.name);
        }
    }
    Ok(())
}

fn print_review_card(review: &ReviewCard, now: DateTime<Utc>, min_ease: f64) {
    let state = &review.state;
    println!("Card {} (deck {})", review.card.id, review.card.deck_id);
    println!("  front: {}", review.card.front);
    println!("  back:  {}", review.card.back);
    println!(
        "  due {}, interval {}, ease {:.2}, repetitions {}, lapses {}",
        state.due,
        format_interval(state.interval),
        state.ease_factor,
        state.repetitions,
        state.lapses
    );
    let [again, hard, good, easy] = preview_intervals(state, now, min_ease);
    println!(
        "  next: again {}, hard {}, good {}, easy {}",
        format_interval(again),
        format_interval(hard),
        format_interval(good),
        format_interval(easy)
    );
}

/// Reviews due cards until none are left or input ends.
fn review_session(store: &SqliteStore, config: &Config, now: DateTime<Utc>) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut reviewed = 0;

    loop {
        let review = match next_review_card(store, now.date_naive()) {
            Ok(review) => review,
            Err(SchedulerError::NoDueCards) => break,
            Err(err) => return Err(err.into()),
        };

        println!("\n{}", review.card.front);
        prompt("[enter] show answer")?;
        if lines.next().transpose()?.is_none() {
            break;
        }
        println!("{}", review.card.back);

        let started = std::time::Instant::now();
        let Some(rating) = read_rating(&mut lines)? else {
            break;
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        let outcome = submit_review(
            store,
            review.card.id,
            i64::from(rating.value()),
            duration_ms,
            now,
            &config.review_options(),
        )?;
        println!("Next review in {}.", format_interval(outcome.interval));
        reviewed += 1;
    }

    println!("Reviewed {} cards. {}", reviewed, due_message(store, now)?);
    Ok(())
}

fn practice(store: &SqliteStore, config: &Config, args: PracticeArgs, today: NaiveDate) -> Result<()> {
    let policy = if args.truncate {
        LimitPolicy::Truncate
    } else if let Some(seed) = args.seed {
        LimitPolicy::Sample { seed: Some(seed) }
    } else {
        config.limit_policy
    };

    let session = start_practice_session(store, args.deck, args.pool, args.limit, today, policy)?;
    if !args.interactive {
        for learning_card in &session.all_cards {
            println!("{:>4}  {}", learning_card.card.id, learning_card.card.front);
        }
        return Ok(());
    }
    run_practice(session)
}

fn run_practice(mut session: LearningSession) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    println!("Practice - {} (schedule is not changed)", session.deck_name);

    let mut last_round = 0;
    while let Some(current) = session.current_card() {
        let front = current.card.front.clone();
        let back = current.card.back.clone();
        if session.round_number != last_round {
            println!("\n{}", session.phase_message());
            last_round = session.round_number;
        }

        println!("\n{}", front);
        prompt("[enter] show answer")?;
        if lines.next().transpose()?.is_none() {
            break;
        }
        session.reveal();
        println!("{}", back);

        let Some(rating) = read_rating(&mut lines)? else {
            break;
        };
        session.grade_current_card(rating);
    }

    println!(
        "\nPractice finished: {} of {} cards learned, {} answers.",
        session.learned_count(),
        session.total_count(),
        session.seen_count()
    );
    Ok(())
}

/// Prompts until a valid rating is entered. `None` on end of input.
fn read_rating(lines: &mut impl Iterator<Item = io::Result<String>>) -> Result<Option<Rating>> {
    loop {
        prompt("rating [1 again, 2 hard, 3 good, 4 easy]")?;
        let Some(line) = lines.next().transpose()? else {
            return Ok(None);
        };
        match line.trim().parse::<i64>().map(Rating::try_from) {
            Ok(Ok(rating)) => return Ok(Some(rating)),
            _ => println!("Please enter a number from 1 to 4."),
        }
    }
}

fn prompt(text: &str) -> Result<()> {
    print!("{}: ", text);
    io::stdout().flush()?;
    Ok(())
}

fn due_message(store: &SqliteStore, now: DateTime<Utc>) -> Result<String> {
    let due = count_due(store, now.date_naive())?.due_count;
    if due == 0 {
        Ok("Nothing left for today.".to_string())
    } else {
        Ok(format!("{} cards still due.", due))
    }
}
