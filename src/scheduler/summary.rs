//! Due summary across all decks, driving one-card-at-a-time review.

use crate::database::store::{CardStore, SchedulingStore};
use crate::error::{Result, SchedulerError};
use crate::models::{CardId, ReviewCard, SchedulingState};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueSummary {
    pub due_count: u64,
}

/// Number of cards due on or before `today`.
pub fn count_due<S: SchedulingStore + ?Sized>(store: &S, today: NaiveDate) -> Result<DueSummary> {
    Ok(DueSummary {
        due_count: store.count_due(today)?,
    })
}

/// Earliest-due card (lowest id on ties) due on or before `today`.
pub fn next_due_card<S: SchedulingStore + ?Sized>(
    store: &S,
    today: NaiveDate,
) -> Result<(CardId, SchedulingState)> {
    store
        .first_due(today)?
        .map(|state| (state.card_id, state))
        .ok_or(SchedulerError::NoDueCards)
}

/// Same as [`next_due_card`], merged with the card's content.
pub fn next_review_card<S>(store: &S, today: NaiveDate) -> Result<ReviewCard>
where
    S: CardStore + SchedulingStore + ?Sized,
{
    let (card_id, state) = next_due_card(store, today)?;
    let card = store
        .get_card(card_id)?
        .ok_or(SchedulerError::CardNotFound(card_id))?;
    Ok(ReviewCard { card, state })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::SqliteStore;
    use crate::database::memory::MemoryStore;
    use crate::database::store::DueRange;
    use crate::models::NewCard;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

    fn move_due(store: &impl SchedulingStore, card_id: CardId, days: i64) {
        let state = store.get(card_id).unwrap().unwrap();
        store
            .put(&SchedulingState {
                due: today() + Duration::days(days),
                ..state
            })
            .unwrap();
    }

    #[test]
    fn test_empty_store() {
        let store = MemoryStore::new();
        assert_eq!(count_due(&store, today()).unwrap().due_count, 0);
        assert!(matches!(next_due_card(&store, today()), Err(SchedulerError::NoDueCards)));
        assert!(matches!(next_review_card(&store, today()), Err(SchedulerError::NoDueCards)));
    }

    #[test]
    fn test_counts_across_decks() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store.create_deck("A", "").unwrap();
        let b = store.create_deck("B", "").unwrap();
        let first = store.add_card(a.id, &NewCard::basic("1", "1"), now()).unwrap().0.id;
        let second = store.add_card(b.id, &NewCard::basic("2", "2"), now()).unwrap().0.id;
        let third = store.add_card(b.id, &NewCard::basic("3", "3"), now()).unwrap().0.id;
        move_due(&store, first, 1);
        move_due(&store, third, -3);

        let summary = count_due(&store, today()).unwrap();
        assert_eq!(summary.due_count, 2);
        assert_eq!(
            summary.due_count as usize,
            store.query_due(None, DueRange::through(today())).unwrap().len()
        );

        let (card_id, state) = next_due_card(&store, today()).unwrap();
        assert_eq!(card_id, third);
        assert_eq!(state.due, today() - Duration::days(3));

        move_due(&store, third, 0);
        // Same due date: lowest id wins
        assert_eq!(next_due_card(&store, today()).unwrap().0, second);
    }

    #[test]
    fn test_next_review_card_merges_content() {
        let store = MemoryStore::new();
        let deck = store.create_deck("Deck", "").unwrap();
        let (card, state) = store.add_card(deck.id, &NewCard::basic("dziękuję", "thank you"), now()).unwrap();

        let review = next_review_card(&store, today()).unwrap();
        assert_eq!(review.card, card);
        assert_eq!(review.state, state);
    }

    #[test]
    fn test_summary_json() {
        let json = serde_json::to_string(&DueSummary { due_count: 3 }).unwrap();
        assert_eq!(json, r#"{"dueCount":3}"#);
    }
}
