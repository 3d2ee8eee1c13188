//! SQLite persistence for decks, cards, scheduling states and the review log.
//!
//! The free functions work on any `&Connection` (transactions included);
//! [`SqliteStore`] owns a connection and implements the store contracts.

use crate::database::store::{CardStore, DueRange, ReviewLogStore, ReviewStore, SchedulingStore};
use crate::error::{Result, SchedulerError};
use crate::models::card::{normalize_tags, tags_from_column, tags_to_column};
use crate::models::{CardFilter, CardUpdate};
use crate::models::{
    Card, CardId, Deck, DeckId, NewCard, Rating, ReviewLogEntry, SchedulingState, sm2,
};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use rusqlite::types::Type;
use rusqlite::{
    Connection, ErrorCode, OptionalExtension, Row, ToSql, TransactionBehavior, params,
    params_from_iter,
};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS decks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT ''
    );

    CREATE TABLE IF NOT EXISTS cards (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        deck_id INTEGER NOT NULL REFERENCES decks(id),
        front TEXT NOT NULL,
        back TEXT NOT NULL,
        card_type TEXT NOT NULL DEFAULT 'basic',
        tags TEXT NOT NULL DEFAULT '',
        source_id INTEGER,
        source_chunk_id INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(deck_id);

    CREATE TABLE IF NOT EXISTS scheduling_states (
        card_id INTEGER PRIMARY KEY REFERENCES cards(id) ON DELETE CASCADE,
        due TEXT NOT NULL,
        interval_days INTEGER NOT NULL CHECK (interval_days >= 0),
        ease_factor REAL NOT NULL,
        repetitions INTEGER NOT NULL CHECK (repetitions >= 0),
        lapses INTEGER NOT NULL CHECK (lapses >= 0)
    );
    CREATE INDEX IF NOT EXISTS idx_scheduling_due ON scheduling_states(due, card_id);

    CREATE TABLE IF NOT EXISTS review_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        card_id INTEGER NOT NULL,
        timestamp TEXT NOT NULL,
        rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 4),
        duration_ms INTEGER NOT NULL CHECK (duration_ms >= 0)
    );
    CREATE INDEX IF NOT EXISTS idx_review_logs_card ON review_logs(card_id);
";

const STATE_COLUMNS: &str = "s.card_id, s.due, s.interval_days, s.ease_factor, s.repetitions, s.lapses";

const CARD_COLUMNS: &str = "id, deck_id, front, back, card_type, tags, source_id, source_chunk_id, created_at, updated_at";

/// Opens (or creates) the database file and makes sure the schema exists.
pub fn init_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    info!("opening database at {}", path.display());
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Creates the tables if needed. Safe to run on every start.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

// ==================== Decks ====================

pub fn new_deck(conn: &Connection, name: &str, description: &str) -> Result<Deck> {
    let inserted = conn.execute(
        "INSERT INTO decks (name, description) VALUES (?1, ?2)",
        params![name, description],
    );
    match inserted {
        Ok(_) => {}
        Err(err) if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
            return Err(SchedulerError::DuplicateDeck(name.to_string()));
        }
        Err(err) => return Err(err.into()),
    }

    let deck = Deck {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        description: description.to_string(),
    };
    info!("deck '{}' created with id {}", deck.name, deck.id);
    Ok(deck)
}

pub fn get_deck(conn: &Connection, deck_id: DeckId) -> Result<Option<Deck>> {
    let deck = conn
        .query_row(
            "SELECT id, name, description FROM decks WHERE id = ?1",
            params![deck_id],
            deck_from_row,
        )
        .optional()?;
    Ok(deck)
}

pub fn get_deck_by_name(conn: &Connection, name: &str) -> Result<Option<Deck>> {
    let deck = conn
        .query_row(
            "SELECT id, name, description FROM decks WHERE name = ?1",
            params![name],
            deck_from_row,
        )
        .optional()?;
    Ok(deck)
}

pub fn get_all_decks(conn: &Connection) -> Result<Vec<Deck>> {
    let mut stmt = conn.prepare("SELECT id, name, description FROM decks ORDER BY id")?;
    let decks = stmt
        .query_map([], deck_from_row)?
        .collect::<rusqlite::Result<Vec<Deck>>>()?;
    Ok(decks)
}

// ==================== Cards ====================

/// Adds a card and its initial scheduling state in one transaction, so a
/// card is never visible without a state.
pub fn add_card(
    conn: &mut Connection,
    deck_id: DeckId,
    card: &NewCard,
    now: DateTime<Utc>,
) -> Result<(Card, SchedulingState)> {
    let mut created = add_cards(conn, deck_id, std::slice::from_ref(card), now)?;
    created
        .pop()
        .ok_or_else(|| SchedulerError::StoreUnavailable("card insert returned nothing".to_string()))
}

/// Bulk variant of [`add_card`]. Either every card is created or none is.
pub fn add_cards(
    conn: &mut Connection,
    deck_id: DeckId,
    cards: &[NewCard],
    now: DateTime<Utc>,
) -> Result<Vec<(Card, SchedulingState)>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if get_deck(&tx, deck_id)?.is_none() {
        return Err(SchedulerError::DeckNotFound(deck_id));
    }
    let created = insert_cards(&tx, deck_id, cards, now)?;
    tx.commit()?;
    debug!("added {} cards to deck {}", created.len(), deck_id);
    Ok(created)
}

/// Finds the deck called `name` (creating it when missing) and adds `cards`
/// to it, all in one transaction.
pub fn import_deck(
    conn: &mut Connection,
    name: &str,
    description: &str,
    cards: &[NewCard],
    now: DateTime<Utc>,
) -> Result<(Deck, Vec<(Card, SchedulingState)>)> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let deck = match get_deck_by_name(&tx, name)? {
        Some(deck) => deck,
        None => new_deck(&tx, name, description)?,
    };
    let created = insert_cards(&tx, deck.id, cards, now)?;
    tx.commit()?;
    Ok((deck, created))
}

/// Inserts cards with their initial states. The caller owns the transaction
/// and has checked the deck.
fn insert_cards(
    tx: &Connection,
    deck_id: DeckId,
    cards: &[NewCard],
    now: DateTime<Utc>,
) -> Result<Vec<(Card, SchedulingState)>> {
    let mut created = Vec::with_capacity(cards.len());
    for new_card in cards {
        tx.execute(
            "INSERT INTO cards (deck_id, front, back, card_type, tags, source_id, source_chunk_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                deck_id,
                new_card.front,
                new_card.back,
                new_card.card_type,
                tags_to_column(&new_card.tags),
                new_card.source_id,
                new_card.source_chunk_id,
                now,
            ],
        )?;
        let card_id = tx.last_insert_rowid();

        let state = sm2::initialize(card_id, now.date_naive());
        insert_state(&tx, &state)?;

        created.push((
            Card {
                id: card_id,
                deck_id,
                front: new_card.front.clone(),
                back: new_card.back.clone(),
                card_type: new_card.card_type.clone(),
                tags: normalize_tags(&new_card.tags),
                source_id: new_card.source_id,
                source_chunk_id: new_card.source_chunk_id,
                created_at: now,
                updated_at: now,
            },
            state,
        ));
    }
    Ok(created)
}

pub fn get_card(conn: &Connection, card_id: CardId) -> Result<Option<Card>> {
    let card = conn
        .query_row(
            &format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1"),
            params![card_id],
            card_from_row,
        )
        .optional()?;
    Ok(card)
}

/// Cards matching `filter`, ordered by id. Filtering on a deck that does not
/// exist is an error rather than an empty list.
pub fn get_cards(conn: &Connection, filter: CardFilter) -> Result<Vec<Card>> {
    let mut sql = format!("SELECT {CARD_COLUMNS} FROM cards WHERE 1 = 1");
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();
    if let Some(deck_id) = filter.deck_id {
        if get_deck(conn, deck_id)?.is_none() {
            return Err(SchedulerError::DeckNotFound(deck_id));
        }
        values.push(Box::new(deck_id));
        sql.push_str(&format!(" AND deck_id = ?{}", values.len()));
    }
    if let Some(source_id) = filter.source_id {
        values.push(Box::new(source_id));
        sql.push_str(&format!(" AND source_id = ?{}", values.len()));
    }
    sql.push_str(" ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let cards = stmt
        .query_map(params_from_iter(values.iter()), card_from_row)?
        .collect::<rusqlite::Result<Vec<Card>>>()?;
    Ok(cards)
}

/// Edits card content or moves the card to another deck. The scheduling
/// state is left alone.
pub fn update_card(
    conn: &mut Connection,
    card_id: CardId,
    update: &CardUpdate,
    now: DateTime<Utc>,
) -> Result<Card> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut card = get_card(&tx, card_id)?.ok_or(SchedulerError::CardNotFound(card_id))?;
    if let Some(deck_id) = update.deck_id {
        if get_deck(&tx, deck_id)?.is_none() {
            return Err(SchedulerError::DeckNotFound(deck_id));
        }
    }
    update.apply_to(&mut card, now);

    tx.execute(
        "UPDATE cards SET deck_id = ?1, front = ?2, back = ?3, card_type = ?4, tags = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            card.deck_id,
            card.front,
            card.back,
            card.card_type,
            tags_to_column(&card.tags),
            card.updated_at,
            card_id
        ],
    )?;
    tx.commit()?;
    info!("card {} updated", card_id);
    Ok(card)
}

/// Deletes a card together with its scheduling state. Review log rows are
/// history and are left in place.
pub fn delete_card(conn: &mut Connection, card_id: CardId) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    delete_state(&tx, card_id)?;
    let removed = tx.execute("DELETE FROM cards WHERE id = ?1", params![card_id])?;
    if removed == 0 {
        return Err(SchedulerError::CardNotFound(card_id));
    }
    tx.commit()?;
    info!("card {} deleted", card_id);
    Ok(())
}

// ==================== Scheduling states ====================

pub fn get_state(conn: &Connection, card_id: CardId) -> Result<Option<SchedulingState>> {
    select_state(conn, card_id).map_err(|err| SchedulerError::from_sqlite(err, Some(card_id)))
}

fn select_state(conn: &Connection, card_id: CardId) -> rusqlite::Result<Option<SchedulingState>> {
    conn.query_row(
        &format!("SELECT {STATE_COLUMNS} FROM scheduling_states s WHERE s.card_id = ?1"),
        params![card_id],
        state_from_row,
    )
    .optional()
}

fn insert_state(conn: &Connection, state: &SchedulingState) -> Result<()> {
    conn.execute(
        "INSERT INTO scheduling_states (card_id, due, interval_days, ease_factor, repetitions, lapses)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            state.card_id,
            state.due,
            state.interval,
            state.ease_factor,
            state.repetitions,
            state.lapses
        ],
    )?;
    Ok(())
}

/// Upserts the state of an existing card.
pub fn put_state(conn: &Connection, state: &SchedulingState) -> Result<()> {
    if get_card(conn, state.card_id)?.is_none() {
        return Err(SchedulerError::CardNotFound(state.card_id));
    }
    conn.execute(
        "INSERT INTO scheduling_states (card_id, due, interval_days, ease_factor, repetitions, lapses)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(card_id) DO UPDATE SET
            due = excluded.due,
            interval_days = excluded.interval_days,
            ease_factor = excluded.ease_factor,
            repetitions = excluded.repetitions,
            lapses = excluded.lapses",
        params![
            state.card_id,
            state.due,
            state.interval,
            state.ease_factor,
            state.repetitions,
            state.lapses
        ],
    )?;
    Ok(())
}

pub fn delete_state(conn: &Connection, card_id: CardId) -> Result<()> {
    conn.execute(
        "DELETE FROM scheduling_states WHERE card_id = ?1",
        params![card_id],
    )?;
    Ok(())
}

/// States within `range`, ordered by due date (oldest first) then card id.
pub fn query_due(
    conn: &Connection,
    deck_id: Option<DeckId>,
    range: DueRange,
) -> Result<Vec<SchedulingState>> {
    let mut sql = format!(
        "SELECT {STATE_COLUMNS} FROM scheduling_states s JOIN cards c ON c.id = s.card_id WHERE 1 = 1"
    );
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();
    if let Some(deck_id) = deck_id {
        values.push(Box::new(deck_id));
        sql.push_str(&format!(" AND c.deck_id = ?{}", values.len()));
    }
    if let Some(after) = range.after {
        values.push(Box::new(after));
        sql.push_str(&format!(" AND s.due > ?{}", values.len()));
    }
    if let Some(through) = range.through {
        values.push(Box::new(through));
        sql.push_str(&format!(" AND s.due <= ?{}", values.len()));
    }
    sql.push_str(" ORDER BY s.due ASC, s.card_id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let states = stmt
        .query_map(params_from_iter(values.iter()), state_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(states)
}

pub fn query_by_repetitions(
    conn: &Connection,
    deck_id: DeckId,
    repetitions: u32,
) -> Result<Vec<SchedulingState>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STATE_COLUMNS} FROM scheduling_states s JOIN cards c ON c.id = s.card_id
         WHERE c.deck_id = ?1 AND s.repetitions = ?2
         ORDER BY s.card_id ASC"
    ))?;
    let states = stmt
        .query_map(params![deck_id, repetitions], state_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(states)
}

pub fn count_due(conn: &Connection, today: NaiveDate) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM scheduling_states WHERE due <= ?1",
        params![today],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

pub fn first_due(conn: &Connection, today: NaiveDate) -> Result<Option<SchedulingState>> {
    let state = conn
        .query_row(
            &format!(
                "SELECT {STATE_COLUMNS} FROM scheduling_states s WHERE s.due <= ?1
                 ORDER BY s.due ASC, s.card_id ASC LIMIT 1"
            ),
            params![today],
            state_from_row,
        )
        .optional()?;
    Ok(state)
}

/// Compare-and-swap of a scheduling state plus the optional log append, in
/// one immediate transaction.
pub fn commit_review(
    conn: &mut Connection,
    expected: &SchedulingState,
    updated: &SchedulingState,
    entry: Option<&ReviewLogEntry>,
) -> Result<()> {
    let card_id = expected.card_id;
    let classify = |err: rusqlite::Error| SchedulerError::from_sqlite(err, Some(card_id));

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(classify)?;

    let changed = tx
        .execute(
            "UPDATE scheduling_states
             SET due = ?1, interval_days = ?2, ease_factor = ?3, repetitions = ?4, lapses = ?5
             WHERE card_id = ?6 AND due = ?7 AND interval_days = ?8 AND ease_factor = ?9
               AND repetitions = ?10 AND lapses = ?11",
            params![
                updated.due,
                updated.interval,
                updated.ease_factor,
                updated.repetitions,
                updated.lapses,
                card_id,
                expected.due,
                expected.interval,
                expected.ease_factor,
                expected.repetitions,
                expected.lapses
            ],
        )
        .map_err(classify)?;

    if changed == 0 {
        // Dropping the transaction rolls it back
        return match select_state(&tx, card_id).map_err(classify)? {
            Some(_) => Err(SchedulerError::PersistenceConflict(card_id)),
            None => Err(SchedulerError::CardNotFound(card_id)),
        };
    }

    if let Some(entry) = entry {
        insert_review_log(&tx, entry, log_duration(entry)?).map_err(classify)?;
    }

    tx.commit().map_err(classify)?;
    debug!(
        "card {} rescheduled to {} (interval {})",
        card_id, updated.due, updated.interval
    );
    Ok(())
}

// ==================== Review log ====================

pub fn append_review_log(conn: &Connection, entry: &ReviewLogEntry) -> Result<()> {
    insert_review_log(conn, entry, log_duration(entry)?)
        .map_err(|err| SchedulerError::from_sqlite(err, Some(entry.card_id)))
}

fn log_duration(entry: &ReviewLogEntry) -> Result<i64> {
    i64::try_from(entry.duration_ms).map_err(|_| {
        SchedulerError::StoreUnavailable(format!("duration {}ms out of range", entry.duration_ms))
    })
}

fn insert_review_log(conn: &Connection, entry: &ReviewLogEntry, duration_ms: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO review_logs (card_id, timestamp, rating, duration_ms) VALUES (?1, ?2, ?3, ?4)",
        params![
            entry.card_id,
            entry.timestamp,
            i64::from(entry.rating),
            duration_ms
        ],
    )?;
    Ok(())
}

/// Review history of a card, oldest first. For display only.
pub fn get_review_logs(conn: &Connection, card_id: CardId) -> Result<Vec<ReviewLogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT card_id, timestamp, rating, duration_ms FROM review_logs WHERE card_id = ?1 ORDER BY id",
    )?;
    let entries = stmt
        .query_map(params![card_id], |row| {
            let rating: i64 = row.get(2)?;
            let duration_ms: i64 = row.get(3)?;
            Ok(ReviewLogEntry {
                card_id: row.get(0)?,
                timestamp: row.get(1)?,
                rating: Rating::try_from(rating).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(2, Type::Integer, Box::new(e))
                })?,
                duration_ms: duration_ms.max(0) as u64,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

// ==================== Row mapping ====================

fn deck_from_row(row: &Row<'_>) -> rusqlite::Result<Deck> {
    Ok(Deck {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    let tags: String = row.get(5)?;
    Ok(Card {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        card_type: row.get(4)?,
        tags: tags_from_column(&tags),
        source_id: row.get(6)?,
        source_chunk_id: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn state_from_row(row: &Row<'_>) -> rusqlite::Result<SchedulingState> {
    Ok(SchedulingState {
        card_id: row.get(0)?,
        due: row.get(1)?,
        interval: row.get(2)?,
        ease_factor: row.get(3)?,
        repetitions: row.get(4)?,
        lapses: row.get(5)?,
    })
}

// ==================== Store handle ====================

/// Thread-safe handle to the SQLite database. Writers are serialised through
/// the connection mutex and `BEGIN IMMEDIATE`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_connection(init_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        debug!("opening in-memory database");
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SchedulerError::StoreUnavailable(format!("connection mutex poisoned: {e}")))
    }

    pub fn create_deck(&self, name: &str, description: &str) -> Result<Deck> {
        new_deck(&*self.lock()?, name, description)
    }

    pub fn list_decks(&self) -> Result<Vec<Deck>> {
        get_all_decks(&*self.lock()?)
    }

    pub fn add_card(
        &self,
        deck_id: DeckId,
        card: &NewCard,
        now: DateTime<Utc>,
    ) -> Result<(Card, SchedulingState)> {
        add_card(&mut *self.lock()?, deck_id, card, now)
    }

    pub fn add_cards(
        &self,
        deck_id: DeckId,
        cards: &[NewCard],
        now: DateTime<Utc>,
    ) -> Result<Vec<(Card, SchedulingState)>> {
        add_cards(&mut *self.lock()?, deck_id, cards, now)
    }

    pub fn list_cards(&self, filter: CardFilter) -> Result<Vec<Card>> {
        get_cards(&*self.lock()?, filter)
    }

    pub fn update_card(&self, card_id: CardId, update: &CardUpdate, now: DateTime<Utc>) -> Result<Card> {
        update_card(&mut *self.lock()?, card_id, update, now)
    }

    pub fn import_deck(
        &self,
        name: &str,
        description: &str,
        cards: &[NewCard],
        now: DateTime<Utc>,
    ) -> Result<(Deck, Vec<(Card, SchedulingState)>)> {
        import_deck(&mut *self.lock()?, name, description, cards, now)
    }

    pub fn delete_card(&self, card_id: CardId) -> Result<()> {
        delete_card(&mut *self.lock()?, card_id)
    }

    pub fn review_history(&self, card_id: CardId) -> Result<Vec<ReviewLogEntry>> {
        get_review_logs(&*self.lock()?, card_id)
    }
}

impl CardStore for SqliteStore {
    fn card_exists(&self, card_id: CardId) -> Result<bool> {
        Ok(get_card(&*self.lock()?, card_id)?.is_some())
    }

    fn get_card(&self, card_id: CardId) -> Result<Option<Card>> {
        get_card(&*self.lock()?, card_id)
    }

    fn get_deck(&self, deck_id: DeckId) -> Result<Option<Deck>> {
        get_deck(&*self.lock()?, deck_id)
    }

    fn card_ids_in_deck(&self, deck_id: DeckId) -> Result<Vec<CardId>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id FROM cards WHERE deck_id = ?1 ORDER BY id")?;
        let ids = stmt
            .query_map(params![deck_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<CardId>>>()?;
        Ok(ids)
    }
}

impl SchedulingStore for SqliteStore {
    fn get(&self, card_id: CardId) -> Result<Option<SchedulingState>> {
        get_state(&*self.lock()?, card_id)
    }

    fn put(&self, state: &SchedulingState) -> Result<()> {
        put_state(&*self.lock()?, state)
    }

    fn delete(&self, card_id: CardId) -> Result<()> {
        delete_state(&*self.lock()?, card_id)
    }

    fn query_due(&self, deck_id: Option<DeckId>, range: DueRange) -> Result<Vec<SchedulingState>> {
        query_due(&*self.lock()?, deck_id, range)
    }

    fn query_by_repetitions(&self, deck_id: DeckId, repetitions: u32) -> Result<Vec<SchedulingState>> {
        query_by_repetitions(&*self.lock()?, deck_id, repetitions)
    }

    fn count_due(&self, today: NaiveDate) -> Result<u64> {
        count_due(&*self.lock()?, today)
    }

    fn first_due(&self, today: NaiveDate) -> Result<Option<SchedulingState>> {
        first_due(&*self.lock()?, today)
    }
}

impl ReviewLogStore for SqliteStore {
    fn append(&self, entry: &ReviewLogEntry) -> Result<()> {
        append_review_log(&*self.lock()?, entry)
    }
}

impl ReviewStore for SqliteStore {
    fn commit(
        &self,
        expected: &SchedulingState,
        updated: &SchedulingState,
        entry: Option<&ReviewLogEntry>,
    ) -> Result<()> {
        commit_review(&mut *self.lock()?, expected, updated, entry)
    }
}
