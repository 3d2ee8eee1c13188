//! Practice session over cards chosen by the practice selector.
//! Handles multi-round practice without touching the review schedule.

use super::{Card, LearningCard, Rating};

/// Manages a practice session with multiple rounds.
/// Cards graded Again are repeated in the following round.
pub struct LearningSession {
    pub deck_name: String,
    pub all_cards: Vec<LearningCard>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_back: bool,
    pub round_number: usize,
}

impl LearningSession {
    /// Creates a session from cards in selector order.
    pub fn new(deck_name: String, cards: Vec<Card>) -> Self {
        let all_cards: Vec<_> = cards.into_iter().map(LearningCard::new).collect();
        let indices: Vec<usize> = (0..all_cards.len()).collect();

        Self {
            deck_name,
            all_cards,
            current_round_cards: indices,
            current_index: 0,
            show_back: false,
            round_number: 1,
        }
    }

    pub fn current_card(&self) -> Option<&LearningCard> {
        if self.is_completed() {
            return None;
        }
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.all_cards.get(idx))
    }

    pub fn reveal(&mut self) {
        self.show_back = true;
    }

    /// Grades the current card and moves on. Returns false when there was
    /// no card to grade.
    pub fn grade_current_card(&mut self, rating: Rating) -> bool {
        if self.is_completed() {
            return false;
        }
        let Some(&idx) = self.current_round_cards.get(self.current_index) else {
            return false;
        };
        let Some(card) = self.all_cards.get_mut(idx) else {
            return false;
        };
        card.grade(rating);
        self.next_card();
        true
    }

    fn next_card(&mut self) {
        self.show_back = false;
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards graded Again.
    /// If none remain, the session is complete.
    fn start_next_round(&mut self) {
        let failed: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| self.all_cards.get(idx).is_some_and(|c| !c.is_learned))
            .collect();

        self.current_round_cards = failed;
        self.current_index = 0;
        if !self.current_round_cards.is_empty() {
            self.round_number += 1;
        }
    }

    pub fn learned_count(&self) -> usize {
        self.all_cards.iter().filter(|c| c.is_learned).count()
    }

    pub fn total_count(&self) -> usize {
        self.all_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.learned_count()
    }

    /// Number of grades given so far, repeats included.
    pub fn seen_count(&self) -> u32 {
        self.all_cards.iter().map(|c| c.attempts).sum()
    }

    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.current_round_cards.len())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.current_round_cards.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn card(id: i64) -> Card {
        let now = Utc::now();
        Card {
            id,
            deck_id: 1,
            front: format!("front {id}"),
            back: format!("back {id}"),
            card_type: "basic".to_string(),
            tags: Vec::new(),
            source_id: None,
            source_chunk_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_session_is_completed() {
        let session = LearningSession::new("Empty".to_string(), Vec::new());
        assert!(session.is_completed());
        assert!(session.current_card().is_none());
    }

    #[test]
    fn test_again_cards_repeat_next_round() {
        let mut session = LearningSession::new("Deck".to_string(), vec![card(1), card(2), card(3)]);

        assert!(session.grade_current_card(Rating::Good));
        assert!(session.grade_current_card(Rating::Again));
        assert!(session.grade_current_card(Rating::Hard));

        assert!(!session.is_completed());
        assert_eq!(session.round_number, 2);
        assert_eq!(session.current_card().unwrap().card.id, 2);
        assert_eq!(session.remaining_count(), 1);

        assert!(session.grade_current_card(Rating::Easy));
        assert!(session.is_completed());
        assert_eq!(session.learned_count(), 3);
        assert_eq!(session.seen_count(), 4);
        assert!(!session.grade_current_card(Rating::Good));
    }

    #[test]
    fn test_grading_hides_back() {
        let mut session = LearningSession::new("Deck".to_string(), vec![card(1), card(2)]);
        session.reveal();
        assert!(session.show_back);
        session.grade_current_card(Rating::Good);
        assert!(!session.show_back);
        assert_eq!(session.phase_message(), "Round 1: 2 cards");
    }
}
