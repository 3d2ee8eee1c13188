//! In-memory implementation of the store contracts.
//!
//! Rows live in id-keyed maps behind one `RwLock`, so every operation sees a
//! consistent snapshot and `commit` is atomic.

use crate::database::store::{CardStore, DueRange, ReviewLogStore, ReviewStore, SchedulingStore};
use crate::error::{Result, SchedulerError};
use crate::models::card::normalize_tags;
use crate::models::{
    Card, CardFilter, CardId, CardUpdate, Deck, DeckId, NewCard, ReviewLogEntry, SchedulingState,
    sm2,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    decks: BTreeMap<DeckId, Deck>,
    cards: BTreeMap<CardId, Card>,
    states: BTreeMap<CardId, SchedulingState>,
    review_log: Vec<ReviewLogEntry>,
    last_deck_id: DeckId,
    last_card_id: CardId,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| SchedulerError::StoreUnavailable(format!("store lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| SchedulerError::StoreUnavailable(format!("store lock poisoned: {e}")))
    }

    pub fn create_deck(&self, name: &str, description: &str) -> Result<Deck> {
        let mut tables = self.write()?;
        if tables.decks.values().any(|d| d.name == name) {
            return Err(SchedulerError::DuplicateDeck(name.to_string()));
        }
        tables.last_deck_id += 1;
        let deck = Deck {
            id: tables.last_deck_id,
            name: name.to_string(),
            description: description.to_string(),
        };
        tables.decks.insert(deck.id, deck.clone());
        Ok(deck)
    }

    /// Inserts the card and its initial state under one write lock.
    pub fn add_card(
        &self,
        deck_id: DeckId,
        new_card: &NewCard,
        now: DateTime<Utc>,
    ) -> Result<(Card, SchedulingState)> {
        let mut tables = self.write()?;
        if !tables.decks.contains_key(&deck_id) {
            return Err(SchedulerError::DeckNotFound(deck_id));
        }
        tables.last_card_id += 1;
        let card = Card {
            id: tables.last_card_id,
            deck_id,
            front: new_card.front.clone(),
            back: new_card.back.clone(),
            card_type: new_card.card_type.clone(),
            tags: normalize_tags(&new_card.tags),
            source_id: new_card.source_id,
            source_chunk_id: new_card.source_chunk_id,
            created_at: now,
            updated_at: now,
        };
        let state = sm2::initialize(card.id, now.date_naive());
        tables.cards.insert(card.id, card.clone());
        tables.states.insert(card.id, state.clone());
        Ok((card, state))
    }

    pub fn list_cards(&self, filter: CardFilter) -> Result<Vec<Card>> {
        let tables = self.read()?;
        if let Some(deck_id) = filter.deck_id {
            if !tables.decks.contains_key(&deck_id) {
                return Err(SchedulerError::DeckNotFound(deck_id));
            }
        }
        Ok(tables.cards.values().filter(|c| filter.matches(c)).cloned().collect())
    }

    pub fn update_card(&self, card_id: CardId, update: &CardUpdate, now: DateTime<Utc>) -> Result<Card> {
        let mut tables = self.write()?;
        let mut card = tables
            .cards
            .get(&card_id)
            .cloned()
            .ok_or(SchedulerError::CardNotFound(card_id))?;
        if let Some(deck_id) = update.deck_id {
            if !tables.decks.contains_key(&deck_id) {
                return Err(SchedulerError::DeckNotFound(deck_id));
            }
        }
        update.apply_to(&mut card, now);
        tables.cards.insert(card_id, card.clone());
        Ok(card)
    }

    pub fn delete_card(&self, card_id: CardId) -> Result<()> {
        let mut tables = self.write()?;
        if tables.cards.remove(&card_id).is_none() {
            return Err(SchedulerError::CardNotFound(card_id));
        }
        tables.states.remove(&card_id);
        Ok(())
    }

    pub fn review_history(&self, card_id: CardId) -> Result<Vec<ReviewLogEntry>> {
        Ok(self
            .read()?
            .review_log
            .iter()
            .filter(|e| e.card_id == card_id)
            .cloned()
            .collect())
    }
}

impl CardStore for MemoryStore {
    fn card_exists(&self, card_id: CardId) -> Result<bool> {
        Ok(self.read()?.cards.contains_key(&card_id))
    }

    fn get_card(&self, card_id: CardId) -> Result<Option<Card>> {
        Ok(self.read()?.cards.get(&card_id).cloned())
    }

    fn get_deck(&self, deck_id: DeckId) -> Result<Option<Deck>> {
        Ok(self.read()?.decks.get(&deck_id).cloned())
    }

    fn card_ids_in_deck(&self, deck_id: DeckId) -> Result<Vec<CardId>> {
        Ok(self
            .read()?
            .cards
            .values()
            .filter(|c| c.deck_id == deck_id)
            .map(|c| c.id)
            .collect())
    }
}

impl SchedulingStore for MemoryStore {
    fn get(&self, card_id: CardId) -> Result<Option<SchedulingState>> {
        Ok(self.read()?.states.get(&card_id).cloned())
    }

    fn put(&self, state: &SchedulingState) -> Result<()> {
        let mut tables = self.write()?;
        if !tables.cards.contains_key(&state.card_id) {
            return Err(SchedulerError::CardNotFound(state.card_id));
        }
        tables.states.insert(state.card_id, state.clone());
        Ok(())
    }

    fn delete(&self, card_id: CardId) -> Result<()> {
        self.write()?.states.remove(&card_id);
        Ok(())
    }

    fn query_due(&self, deck_id: Option<DeckId>, range: DueRange) -> Result<Vec<SchedulingState>> {
        let tables = self.read()?;
        let mut states: Vec<SchedulingState> = tables
            .states
            .values()
            .filter(|s| range.contains(s.due))
            .filter(|s| {
                deck_id.is_none_or(|deck| tables.cards.get(&s.card_id).is_some_and(|c| c.deck_id == deck))
            })
            .cloned()
            .collect();
        states.sort_by_key(|s| (s.due, s.card_id));
        Ok(states)
    }

    fn query_by_repetitions(&self, deck_id: DeckId, repetitions: u32) -> Result<Vec<SchedulingState>> {
        let tables = self.read()?;
        Ok(tables
            .states
            .values()
            .filter(|s| s.repetitions == repetitions)
            .filter(|s| tables.cards.get(&s.card_id).is_some_and(|c| c.deck_id == deck_id))
            .cloned()
            .collect())
    }
}

impl ReviewLogStore for MemoryStore {
    fn append(&self, entry: &ReviewLogEntry) -> Result<()> {
        self.write()?.review_log.push(entry.clone());
        Ok(())
    }
}

impl ReviewStore for MemoryStore {
    fn commit(
        &self,
        expected: &SchedulingState,
        updated: &SchedulingState,
        entry: Option<&ReviewLogEntry>,
    ) -> Result<()> {
        let mut tables = self.write()?;
        match tables.states.get(&expected.card_id) {
            None => return Err(SchedulerError::CardNotFound(expected.card_id)),
            Some(current) if current != expected => {
                return Err(SchedulerError::PersistenceConflict(expected.card_id));
            }
            Some(_) => {}
        }
        tables.states.insert(updated.card_id, updated.clone());
        if let Some(entry) = entry {
            tables.review_log.push(entry.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_card_and_state_created_together() {
        let store = MemoryStore::new();
        let deck = store.create_deck("Deck", "").unwrap();
        let (card, state) = store.add_card(deck.id, &NewCard::basic("a", "b"), now()).unwrap();

        assert_eq!(store.get(card.id).unwrap(), Some(state));
        assert_eq!(store.card_ids_in_deck(deck.id).unwrap(), vec![card.id]);
    }

    #[test]
    fn test_commit_conflict_leaves_state_untouched() {
        let store = MemoryStore::new();
        let deck = store.create_deck("Deck", "").unwrap();
        let (card, state) = store.add_card(deck.id, &NewCard::basic("a", "b"), now()).unwrap();

        let good = sm2::apply_review(&state, Rating::Good, now(), 1.3);
        store.commit(&state, &good, None).unwrap();

        let again = sm2::apply_review(&state, Rating::Again, now(), 1.3);
        let entry = ReviewLogEntry::new(card.id, now(), Rating::Again, 10);
        assert!(matches!(
            store.commit(&state, &again, Some(&entry)),
            Err(SchedulerError::PersistenceConflict(_))
        ));
        assert_eq!(store.get(card.id).unwrap(), Some(good));
        assert!(store.review_history(card.id).unwrap().is_empty());
    }

    #[test]
    fn test_update_card_leaves_state_alone() {
        let store = MemoryStore::new();
        let deck = store.create_deck("Deck", "").unwrap();
        let other = store.create_deck("Other", "").unwrap();
        let (card, state) = store.add_card(deck.id, &NewCard::basic("a", "b"), now()).unwrap();

        let update = CardUpdate {
            front: Some("A".to_string()),
            deck_id: Some(other.id),
            ..CardUpdate::default()
        };
        let edited = store.update_card(card.id, &update, now()).unwrap();

        assert_eq!(edited.front, "A");
        assert_eq!(store.get(card.id).unwrap(), Some(state));
        assert_eq!(store.list_cards(CardFilter::deck(other.id)).unwrap(), vec![edited]);
        assert!(store.list_cards(CardFilter::deck(deck.id)).unwrap().is_empty());
        assert!(matches!(
            store.list_cards(CardFilter::deck(9)),
            Err(SchedulerError::DeckNotFound(9))
        ));
        assert!(matches!(
            store.update_card(77, &update, now()),
            Err(SchedulerError::CardNotFound(77))
        ));
    }

    #[test]
    fn test_delete_card_drops_state() {
        let store = MemoryStore::new();
        let deck = store.create_deck("Deck", "").unwrap();
        let (card, _) = store.add_card(deck.id, &NewCard::basic("a", "b"), now()).unwrap();

        store.delete_card(card.id).unwrap();
        assert_eq!(store.get(card.id).unwrap(), None);
        assert_eq!(store.count_due(now().date_naive()).unwrap(), 0);
    }
}
