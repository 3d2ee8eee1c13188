//! Wrapper for a practice card that tracks progress within one session.
use super::{Card, Rating};

#[derive(Clone, Debug)]
pub struct LearningCard {
    pub card: Card,
    pub is_learned: bool,
    pub attempts: u32,
    pub last_rating: Option<Rating>,
}

impl LearningCard {
    pub fn new(card: Card) -> Self {
        Self {
            card,
            is_learned: false,
            attempts: 0,
            last_rating: None,
        }
    }

    /// Again keeps the card in play; any other grade retires it.
    pub fn grade(&mut self, rating: Rating) {
        self.attempts += 1;
        self.last_rating = Some(rating);
        self.is_learned = rating != Rating::Again;
    }
}
