pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod scheduler;

pub use config::Config;
pub use database::{MemoryStore, SqliteStore};
pub use error::{Result, SchedulerError};
pub use models::{Card, Deck, NewCard, Rating, ReviewLogEntry, SchedulingState};
