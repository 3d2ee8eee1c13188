//! Per-card scheduling record consumed and produced by the SM-2 engine.
use super::CardId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ease factor given to every new card.
pub const INITIAL_EASE: f64 = 2.5;

/// Default lower bound for the ease factor.
pub const DEFAULT_MIN_EASE: f64 = 1.3;

/// Scheduling state of one card. Exactly one exists per card, created
/// together with the card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingState {
    pub card_id: CardId,
    /// Date on which the card becomes eligible for review.
    pub due: NaiveDate,
    /// Days between the last review and `due`. Zero only before the first review.
    pub interval: u32,
    pub ease_factor: f64,
    /// Consecutive successful reviews since the last lapse.
    pub repetitions: u32,
    /// Reviews rated below Good. Never decreases.
    pub lapses: u32,
}

/// Coarse lifecycle phase derived from `repetitions`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Learning,
    Maturing,
}

impl SchedulingState {
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.due <= today
    }

    pub fn is_new(&self) -> bool {
        self.repetitions == 0
    }

    pub fn phase(&self) -> Phase {
        if self.repetitions < 2 {
            Phase::Learning
        } else {
            Phase::Maturing
        }
    }
}
