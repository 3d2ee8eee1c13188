//! SM-2 (SuperMemo 2) derived spaced repetition engine.
//!
//! Ratings run from 1 to 4 (Again, Hard, Good, Easy):
//! - The ease factor (EF) is updated first, on every review, and never drops below `min_ease`
//! - Again/Hard: lapse, the streak resets and the card comes back tomorrow
//! - Good/Easy: the interval grows 1 day → 6 days → previous interval × new EF
//! - The due date is always the review date plus the new interval
//!
//! Every function here is pure: the same inputs always give the same state,
//! so a failed commit can simply be recomputed and retried.

use super::{CardId, Rating, SchedulingState};
use super::scheduling_state::INITIAL_EASE;
use chrono::{DateTime, Days, NaiveDate, Utc};

/// Intervals are capped so that due dates stay representable.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Scheduling state for a freshly created card, due on `today`.
pub fn initialize(card_id: CardId, today: NaiveDate) -> SchedulingState {
    SchedulingState {
        card_id,
        due: today,
        interval: 0,
        ease_factor: INITIAL_EASE,
        repetitions: 0,
        lapses: 0,
    }
}

/// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at `min_ease`.
pub fn next_ease_factor(ease_factor: f64, rating: Rating, min_ease: f64) -> f64 {
    let q = f64::from(rating.value());
    let ef = ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
    ef.max(min_ease)
}

/// Computes the state after reviewing a card at `now`.
pub fn apply_review(
    state: &SchedulingState,
    rating: Rating,
    now: DateTime<Utc>,
    min_ease: f64,
) -> SchedulingState {
    let ease_factor = next_ease_factor(state.ease_factor, rating, min_ease);

    let (interval, repetitions, lapses) = if rating.is_lapse() {
        (1, 0, state.lapses.saturating_add(1))
    } else {
        let repetitions = state.repetitions.saturating_add(1);
        let interval = match repetitions {
            1 => 1,
            2 => 6,
            // Grows from the previous interval using the updated EF
            _ => grow_interval(state.interval, ease_factor),
        };
        (interval, repetitions, state.lapses)
    };

    SchedulingState {
        card_id: state.card_id,
        due: due_after(now.date_naive(), interval),
        interval,
        ease_factor,
        repetitions,
        lapses,
    }
}

/// Explicit "reset progress": back to the initial schedule, due today.
/// Lapses are kept since they never decrease.
pub fn reset(state: &SchedulingState, today: NaiveDate) -> SchedulingState {
    SchedulingState {
        lapses: state.lapses,
        ..initialize(state.card_id, today)
    }
}

/// Intervals each rating would produce, ordered Again, Hard, Good, Easy.
pub fn preview_intervals(state: &SchedulingState, now: DateTime<Utc>, min_ease: f64) -> [u32; 4] {
    Rating::ALL.map(|rating| apply_review(state, rating, now, min_ease).interval)
}

/// Rounds half away from zero (`f64::round`). A reviewed card is never due
/// again on the same day, so the result is at least one day.
fn grow_interval(interval: u32, ease_factor: f64) -> u32 {
    let grown = (f64::from(interval) * ease_factor).round();
    if grown >= f64::from(MAX_INTERVAL_DAYS) {
        MAX_INTERVAL_DAYS
    } else {
        (grown as u32).max(1)
    }
}

fn due_after(date: NaiveDate, interval: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(interval)))
        .unwrap_or(NaiveDate::MAX)
}

/// Formats an interval in days for display
pub fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=6 => format!("{}d", days),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}
