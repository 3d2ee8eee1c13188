//! Error taxonomy shared by the engine, the stores and the workflows.

use crate::models::{CardId, DeckId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchedulerError>;

#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Rating outside 1..=4. Raised before anything is read or written.
    #[error("invalid rating {0}: expected 1 (again), 2 (hard), 3 (good) or 4 (easy)")]
    InvalidRating(i64),

    #[error("card not found: {0}")]
    CardNotFound(CardId),

    #[error("deck not found: {0}")]
    DeckNotFound(DeckId),

    #[error("deck already exists: {0}")]
    DuplicateDeck(String),

    /// Empty due set. A normal outcome, not a failure worth logging.
    #[error("no cards are due")]
    NoDueCards,

    /// The stored row changed underneath a read-modify-write. Retry.
    #[error("concurrent update of card {0}")]
    PersistenceConflict(CardId),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchedulerError {
    /// Classifies a SQLite failure. Busy and locked databases are contention,
    /// so they surface as a retryable conflict on `card_id`.
    pub fn from_sqlite(err: rusqlite::Error, card_id: Option<CardId>) -> Self {
        use rusqlite::ErrorCode;

        match (err.sqlite_error_code(), card_id) {
            (Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked), Some(id)) => {
                SchedulerError::PersistenceConflict(id)
            }
            _ => SchedulerError::StoreUnavailable(err.to_string()),
        }
    }

    /// True for errors the caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SchedulerError::PersistenceConflict(_))
    }
}

impl From<rusqlite::Error> for SchedulerError {
    fn from(err: rusqlite::Error) -> Self {
        SchedulerError::from_sqlite(err, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    #[test]
    fn test_busy_is_conflict_when_card_known() {
        let err = rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_BUSY), None);
        let classified = SchedulerError::from_sqlite(err, Some(7));
        assert!(matches!(classified, SchedulerError::PersistenceConflict(7)));
        assert!(classified.is_retryable());
    }

    #[test]
    fn test_other_sqlite_errors_are_unavailable() {
        let err = rusqlite::Error::QueryReturnedNoRows;
        let classified = SchedulerError::from(err);
        assert!(matches!(classified, SchedulerError::StoreUnavailable(_)));
        assert!(!classified.is_retryable());
    }
}
