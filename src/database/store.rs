//! Contracts between the scheduling core and its persistence collaborators.
//!
//! Workflows in [`crate::scheduler`] only see these traits, so the SQLite
//! store and the in-memory store are interchangeable.

use crate::error::Result;
use crate::models::{Card, CardId, Deck, DeckId, ReviewLogEntry, SchedulingState};
use chrono::NaiveDate;

/// Window of due dates: `after < due <= through`, each bound optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DueRange {
    pub after: Option<NaiveDate>,
    pub through: Option<NaiveDate>,
}

impl DueRange {
    /// Everything due on or before `date`.
    pub fn through(date: NaiveDate) -> Self {
        Self {
            after: None,
            through: Some(date),
        }
    }

    /// Due strictly after `after`, up to and including `through`.
    pub fn between(after: NaiveDate, through: NaiveDate) -> Self {
        Self {
            after: Some(after),
            through: Some(through),
        }
    }

    pub fn contains(&self, due: NaiveDate) -> bool {
        self.after.is_none_or(|after| due > after) && self.through.is_none_or(|through| due <= through)
    }
}

/// Card store: content and deck membership. Authority for card-to-deck mapping.
pub trait CardStore: Send + Sync {
    fn card_exists(&self, card_id: CardId) -> Result<bool>;

    fn get_card(&self, card_id: CardId) -> Result<Option<Card>>;

    fn get_deck(&self, deck_id: DeckId) -> Result<Option<Deck>>;

    /// Ids of every card in the deck, ascending.
    fn card_ids_in_deck(&self, deck_id: DeckId) -> Result<Vec<CardId>>;

    fn deck_exists(&self, deck_id: DeckId) -> Result<bool> {
        Ok(self.get_deck(deck_id)?.is_some())
    }
}

/// Scheduling state store. Holds at most one state per card.
pub trait SchedulingStore: Send + Sync {
    fn get(&self, card_id: CardId) -> Result<Option<SchedulingState>>;

    /// Inserts or replaces the state of an existing card.
    fn put(&self, state: &SchedulingState) -> Result<()>;

    /// Removes a card's state. Only card deletion calls this.
    fn delete(&self, card_id: CardId) -> Result<()>;

    /// States in `range`, optionally limited to one deck, ordered by due date
    /// then card id.
    fn query_due(&self, deck_id: Option<DeckId>, range: DueRange) -> Result<Vec<SchedulingState>>;

    /// States of a deck with exactly `repetitions`, ordered by card id.
    fn query_by_repetitions(&self, deck_id: DeckId, repetitions: u32) -> Result<Vec<SchedulingState>>;

    /// Number of states due on or before `today`, across all decks.
    fn count_due(&self, today: NaiveDate) -> Result<u64> {
        Ok(self.query_due(None, DueRange::through(today))?.len() as u64)
    }

    /// Earliest due state on or before `today`, lowest card id first on ties.
    fn first_due(&self, today: NaiveDate) -> Result<Option<SchedulingState>> {
        Ok(self.query_due(None, DueRange::through(today))?.into_iter().next())
    }
}

/// Review log. Append only: entries are never updated or removed.
pub trait ReviewLogStore: Send + Sync {
    fn append(&self, entry: &ReviewLogEntry) -> Result<()>;
}

/// Stores able to commit a state change and its log entry as one unit.
pub trait ReviewStore: CardStore + SchedulingStore + ReviewLogStore {
    /// Replaces `expected` with `updated` and appends `entry`, atomically.
    ///
    /// Fails with `PersistenceConflict` when the stored state no longer
    /// equals `expected`, and with `CardNotFound` when it is gone. Nothing
    /// is committed in either case.
    fn commit(
        &self,
        expected: &SchedulingState,
        updated: &SchedulingState,
        entry: Option<&ReviewLogEntry>,
    ) -> Result<()>;
}
