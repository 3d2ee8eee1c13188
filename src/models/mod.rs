pub mod card;
pub mod deck;
pub mod learning_card;
pub mod learning_session;
pub mod rating;
pub mod review_log;
pub mod scheduling_state;
pub mod sm2;

/// Opaque card identifier assigned by the card store.
pub type CardId = i64;
pub type DeckId = i64;

pub use card::{Card, CardFilter, CardUpdate, NewCard, ReviewCard};
pub use deck::Deck;
pub use learning_card::LearningCard;
pub use learning_session::LearningSession;
pub use rating::Rating;
pub use review_log::ReviewLogEntry;
pub use scheduling_state::{Phase, SchedulingState};
