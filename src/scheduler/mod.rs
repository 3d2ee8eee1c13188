//! Workflows built on the SM-2 engine and the store contracts.

pub mod practice;
pub mod review;
pub mod summary;

pub use practice::{LimitPolicy, PracticePool, select_practice_cards, start_practice_session};
pub use review::{ReviewOptions, ReviewOutcome, reset_progress, submit_review};
pub use summary::{DueSummary, count_due, next_due_card, next_review_card};
