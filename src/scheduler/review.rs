//! Review submission: validate, compute, then commit the new state and the
//! log entry as one unit, retrying when another review got there first.

use crate::database::store::ReviewStore;
use crate::error::{Result, SchedulerError};
use crate::models::scheduling_state::DEFAULT_MIN_EASE;
use crate::models::{CardId, Rating, ReviewLogEntry, SchedulingState, sm2};
use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReviewOptions {
    pub min_ease: f64,
    /// Attempts before a `PersistenceConflict` is handed back to the caller.
    pub max_attempts: u32,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            min_ease: DEFAULT_MIN_EASE,
            max_attempts: 3,
        }
    }
}

/// Result of a review as reported back to the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub card_id: CardId,
    pub due: NaiveDate,
    pub interval: u32,
    pub ease_factor: f64,
    pub repetitions: u32,
    pub lapses: u32,
}

impl From<SchedulingState> for ReviewOutcome {
    fn from(state: SchedulingState) -> Self {
        Self {
            card_id: state.card_id,
            due: state.due,
            interval: state.interval,
            ease_factor: state.ease_factor,
            repetitions: state.repetitions,
            lapses: state.lapses,
        }
    }
}

/// Records a review of `card_id` at `now`.
///
/// The rating is checked before the store is touched. The state update and
/// the log entry commit together or not at all.
pub fn submit_review<S: ReviewStore + ?Sized>(
    store: &S,
    card_id: CardId,
    rating: i64,
    duration_ms: u64,
    now: DateTime<Utc>,
    options: &ReviewOptions,
) -> Result<ReviewOutcome> {
    let rating = Rating::try_from(rating)?;
    let entry = ReviewLogEntry::new(card_id, now, rating, duration_ms);

    let updated = update_with_retry(store, card_id, options, Some(&entry), |current| {
        sm2::apply_review(current, rating, now, options.min_ease)
    })?;

    info!(
        "card {} rated {}: next due {} (interval {}d, ease {:.2})",
        card_id, rating, updated.due, updated.interval, updated.ease_factor
    );
    Ok(updated.into())
}

/// Puts a card back to the initial schedule, due `today`. The review log is
/// not touched and lapses are kept.
pub fn reset_progress<S: ReviewStore + ?Sized>(
    store: &S,
    card_id: CardId,
    today: NaiveDate,
    options: &ReviewOptions,
) -> Result<SchedulingState> {
    let updated = update_with_retry(store, card_id, options, None, |current| {
        sm2::reset(current, today)
    })?;
    info!("card {} progress reset", card_id);
    Ok(updated)
}

fn update_with_retry<S, F>(
    store: &S,
    card_id: CardId,
    options: &ReviewOptions,
    entry: Option<&ReviewLogEntry>,
    compute: F,
) -> Result<SchedulingState>
where
    S: ReviewStore + ?Sized,
    F: Fn(&SchedulingState) -> SchedulingState,
{
    let max_attempts = options.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        // A busy store can surface on the read as well as on the commit
        let committed = load_state(store, card_id).and_then(|current| {
            let updated = compute(&current);
            store.commit(&current, &updated, entry).map(|()| updated)
        });

        match committed {
            Ok(updated) => return Ok(updated),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                warn!(
                    "card {} changed during review (attempt {}/{}), retrying",
                    card_id, attempt, max_attempts
                );
            }
            Err(err) => return Err(err),
        }
    }
}

fn load_state<S: ReviewStore + ?Sized>(store: &S, card_id: CardId) -> Result<SchedulingState> {
    match store.get(card_id)? {
        Some(state) => Ok(state),
        None if store.card_exists(card_id)? => Err(SchedulerError::StoreUnavailable(format!(
            "card {card_id} has no scheduling state"
        ))),
        None => Err(SchedulerError::CardNotFound(card_id)),
    }
}
