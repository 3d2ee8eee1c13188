//! Practice selector: picks the cards of a deck to practise from a named
//! pool. Read only, so practice never moves the review schedule.

use crate::database::store::{CardStore, DueRange, SchedulingStore};
use crate::error::{Result, SchedulerError};
use crate::models::{CardId, DeckId, LearningSession};
use chrono::{Days, NaiveDate};
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Days after today still counted as "recent" by [`PracticePool::DueRecent`].
pub const RECENT_WINDOW_DAYS: u64 = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticePool {
    /// Due now or within the next few days, earliest first.
    #[default]
    DueRecent,
    /// Never successfully reviewed since creation or the last lapse.
    NewOnly,
    /// Every card in the deck.
    All,
}

impl FromStr for PracticePool {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "due_recent" => Ok(PracticePool::DueRecent),
            "new_only" => Ok(PracticePool::NewOnly),
            "all" => Ok(PracticePool::All),
            other => Err(format!(
                "unknown pool {other:?}, expected due_recent, new_only or all"
            )),
        }
    }
}

impl fmt::Display for PracticePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PracticePool::DueRecent => "due_recent",
            PracticePool::NewOnly => "new_only",
            PracticePool::All => "all",
        })
    }
}

/// How the `All` pool is reduced to a limit. The other pools always keep
/// their leading cards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitPolicy {
    /// Keep the first `limit` cards by id.
    Truncate,
    /// Uniform random subset, returned in id order. A seed makes it
    /// reproducible.
    Sample { seed: Option<u64> },
}

/// Ordered candidate cards of `deck_id` for a practice session.
pub fn select_practice_cards<S>(
    store: &S,
    deck_id: DeckId,
    pool: PracticePool,
    limit: Option<usize>,
    today: NaiveDate,
    policy: LimitPolicy,
) -> Result<Vec<CardId>>
where
    S: CardStore + SchedulingStore + ?Sized,
{
    if !store.deck_exists(deck_id)? {
        return Err(SchedulerError::DeckNotFound(deck_id));
    }

    let candidates: Vec<CardId> = match pool {
        PracticePool::DueRecent => {
            // due <= today, plus today < due <= today + window
            let horizon = today
                .checked_add_days(Days::new(RECENT_WINDOW_DAYS))
                .unwrap_or(NaiveDate::MAX);
            store
                .query_due(Some(deck_id), DueRange::through(horizon))?
                .into_iter()
                .map(|s| s.card_id)
                .collect()
        }
        PracticePool::NewOnly => store
            .query_by_repetitions(deck_id, 0)?
            .into_iter()
            .map(|s| s.card_id)
            .collect(),
        PracticePool::All => store.card_ids_in_deck(deck_id)?,
    };
    debug!(
        "deck {} pool {}: {} candidates",
        deck_id,
        pool,
        candidates.len()
    );

    let selected = match limit {
        Some(limit) if candidates.len() > limit => match (pool, policy) {
            (PracticePool::All, LimitPolicy::Sample { seed }) => sample_in_order(&candidates, limit, seed),
            _ => candidates.into_iter().take(limit).collect(),
        },
        _ => candidates,
    };
    Ok(selected)
}

/// Loads the selected cards into a practice session.
pub fn start_practice_session<S>(
    store: &S,
    deck_id: DeckId,
    pool: PracticePool,
    limit: Option<usize>,
    today: NaiveDate,
    policy: LimitPolicy,
) -> Result<LearningSession>
where
    S: CardStore + SchedulingStore + ?Sized,
{
    let ids = select_practice_cards(store, deck_id, pool, limit, today, policy)?;
    let deck = store
        .get_deck(deck_id)?
        .ok_or(SchedulerError::DeckNotFound(deck_id))?;

    let mut cards = Vec::with_capacity(ids.len());
    for id in ids {
        // A card deleted since selection simply drops out
        if let Some(card) = store.get_card(id)? {
            cards.push(card);
        }
    }
    Ok(LearningSession::new(deck.name, cards))
}

fn sample_in_order(candidates: &[CardId], limit: usize, seed: Option<u64>) -> Vec<CardId> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut picked = rand::seq::index::sample(&mut rng, candidates.len(), limit).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| candidates[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::SqliteStore;
    use crate::database::memory::MemoryStore;
    use crate::models::{NewCard, Rating, SchedulingState, sm2};
    use crate::database::store::ReviewStore;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

    /// Deck whose card i is due `offsets[i]` days from today.
    fn deck_with_due_offsets(offsets: &[i64]) -> (MemoryStore, DeckId, Vec<CardId>) {
        let store = MemoryStore::new();
        let deck = store.create_deck("Deck", "").unwrap();
        let mut ids = Vec::new();
        for (i, offset) in offsets.iter().enumerate() {
            let (card, state) = store
                .add_card(deck.id, &NewCard::basic(format!("q{i}"), "a"), now())
                .unwrap();
            let moved = SchedulingState {
                due: today() + Duration::days(*offset),
                ..state
            };
            store.put(&moved).unwrap();
            ids.push(card.id);
        }
        (store, deck.id, ids)
    }

    fn select(store: &MemoryStore, deck_id: DeckId, pool: PracticePool, limit: Option<usize>) -> Vec<CardId> {
        select_practice_cards(store, deck_id, pool, limit, today(), LimitPolicy::Truncate).unwrap()
    }

    #[test]
    fn test_due_recent_window() {
        let (store, deck_id, ids) = deck_with_due_offsets(&[4, 3, -2, 0, 1, 0]);
        let selected = select(&store, deck_id, PracticePool::DueRecent, None);

        // Sorted by due then id; the card due in 4 days never appears
        assert_eq!(selected, vec![ids[2], ids[3], ids[5], ids[4], ids[1]]);
        assert!(!selected.contains(&ids[0]));
    }

    #[test]
    fn test_due_recent_limit_keeps_earliest() {
        let (store, deck_id, ids) = deck_with_due_offsets(&[2, -1, 0]);
        assert_eq!(
            select(&store, deck_id, PracticePool::DueRecent, Some(2)),
            vec![ids[1], ids[2]]
        );
    }

    #[test]
    fn test_new_only_by_id() {
        let (store, deck_id, ids) = deck_with_due_offsets(&[0, 0, 0]);
        let state = store.get(ids[1]).unwrap().unwrap();
        let reviewed = sm2::apply_review(&state, Rating::Good, now(), 1.3);
        store.commit(&state, &reviewed, None).unwrap();

        assert_eq!(
            select(&store, deck_id, PracticePool::NewOnly, None),
            vec![ids[0], ids[2]]
        );
        assert_eq!(select(&store, deck_id, PracticePool::NewOnly, Some(1)), vec![ids[0]]);
    }

    #[test]
    fn test_all_ignores_schedule() {
        let (store, deck_id, ids) = deck_with_due_offsets(&[30, -5, 100]);
        assert_eq!(select(&store, deck_id, PracticePool::All, None), ids);
        assert_eq!(select(&store, deck_id, PracticePool::All, Some(2)), ids[..2].to_vec());
    }

    #[test]
    fn test_other_decks_excluded() {
        let (store, deck_id, ids) = deck_with_due_offsets(&[0]);
        let other = store.create_deck("Other", "").unwrap();
        store.add_card(other.id, &NewCard::basic("x", "y"), now()).unwrap();

        for pool in [PracticePool::DueRecent, PracticePool::NewOnly, PracticePool::All] {
            assert_eq!(select(&store, deck_id, pool, None), ids);
        }
    }

    #[test]
    fn test_seeded_sample_is_reproducible_subset() {
        let (store, deck_id, ids) = deck_with_due_offsets(&[0; 10]);
        let policy = LimitPolicy::Sample { seed: Some(42) };
        let first =
            select_practice_cards(&store, deck_id, PracticePool::All, Some(4), today(), policy).unwrap();
        let second =
            select_practice_cards(&store, deck_id, PracticePool::All, Some(4), today(), policy).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
        assert!(first.iter().all(|id| ids.contains(id)));
    }

    #[test]
    fn test_sample_not_applied_to_ordered_pools() {
        let (store, deck_id, ids) = deck_with_due_offsets(&[0; 6]);
        let policy = LimitPolicy::Sample { seed: Some(1) };
        let selected =
            select_practice_cards(&store, deck_id, PracticePool::DueRecent, Some(3), today(), policy).unwrap();
        assert_eq!(selected, ids[..3].to_vec());
    }

    #[test]
    fn test_limit_zero() {
        let (store, deck_id, _) = deck_with_due_offsets(&[0, 0]);
        assert!(select(&store, deck_id, PracticePool::All, Some(0)).is_empty());
    }

    #[test]
    fn test_unknown_deck() {
        let store = MemoryStore::new();
        let result =
            select_practice_cards(&store, 9, PracticePool::All, None, today(), LimitPolicy::Truncate);
        assert!(matches!(result, Err(SchedulerError::DeckNotFound(9))));
    }

    #[test]
    fn test_selection_is_read_only() {
        let (store, deck_id, ids) = deck_with_due_offsets(&[0, 1]);
        let before: Vec<_> = ids.iter().map(|id| store.get(*id).unwrap()).collect();
        for pool in [PracticePool::DueRecent, PracticePool::NewOnly, PracticePool::All] {
            select(&store, deck_id, pool, Some(1));
        }
        let after: Vec<_> = ids.iter().map(|id| store.get(*id).unwrap()).collect();
        assert_eq!(before, after);
        assert!(store.review_history(ids[0]).unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_store_matches_memory_store() {
        let sqlite = SqliteStore::open_in_memory().unwrap();
        let deck = sqlite.create_deck("Deck", "").unwrap();
        let mut ids = Vec::new();
        for (i, offset) in [5, 0, 3, -1].iter().enumerate() {
            let (card, state) = sqlite
                .add_card(deck.id, &NewCard::basic(format!("q{i}"), "a"), now())
                .unwrap();
            sqlite
                .put(&SchedulingState {
                    due: today() + Duration::days(*offset),
                    ..state
                })
                .unwrap();
            ids.push(card.id);
        }

        let selected = select_practice_cards(
            &sqlite,
            deck.id,
            PracticePool::DueRecent,
            None,
            today(),
            LimitPolicy::Truncate,
        )
        .unwrap();
        assert_eq!(selected, vec![ids[3], ids[1], ids[2]]);
    }

    #[test]
    fn test_start_practice_session() {
        let (store, deck_id, ids) = deck_with_due_offsets(&[0, 10]);
        let session = start_practice_session(
            &store,
            deck_id,
            PracticePool::DueRecent,
            None,
            today(),
            LimitPolicy::Truncate,
        )
        .unwrap();

        assert_eq!(session.deck_name, "Deck");
        assert_eq!(session.total_count(), 1);
        assert_eq!(session.current_card().unwrap().card.id, ids[0]);
    }

    #[test]
    fn test_pool_parsing() {
        for pool in [PracticePool::DueRecent, PracticePool::NewOnly, PracticePool::All] {
            assert_eq!(pool.to_string().parse::<PracticePool>().unwrap(), pool);
        }
        assert!("recent".parse::<PracticePool>().is_err());
        assert_eq!(PracticePool::default(), PracticePool::DueRecent);
    }
}
