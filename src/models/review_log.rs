//! Append-only history of reviews. Never read back by the scheduler.
use super::{CardId, Rating};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogEntry {
    pub card_id: CardId,
    pub timestamp: DateTime<Utc>,
    pub rating: Rating,
    pub duration_ms: u64,
}

impl ReviewLogEntry {
    pub fn new(card_id: CardId, timestamp: DateTime<Utc>, rating: Rating, duration_ms: u64) -> Self {
        Self {
            card_id,
            timestamp,
            rating,
            duration_ms,
        }
    }
}
