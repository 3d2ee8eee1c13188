//! Card is a front/back pair belonging to a deck, optionally traced back to
//! the source material it was generated from.
use super::{CardId, DeckId, SchedulingState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub deck_id: DeckId,
    pub front: String,
    pub back: String,
    pub card_type: String,
    pub tags: Vec<String>,
    /// Opaque reference into the ingestion collaborator.
    pub source_id: Option<i64>,
    pub source_chunk_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Card content before it has an id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    pub front: String,
    pub back: String,
    #[serde(default = "default_card_type")]
    pub card_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source_id: Option<i64>,
    #[serde(default)]
    pub source_chunk_id: Option<i64>,
}

fn default_card_type() -> String {
    "basic".to_string()
}

impl NewCard {
    pub fn basic(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            card_type: default_card_type(),
            tags: Vec::new(),
            source_id: None,
            source_chunk_id: None,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Partial edit of a card. `None` leaves the field as it is. Scheduling is
/// never part of an edit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardUpdate {
    pub front: Option<String>,
    pub back: Option<String>,
    pub card_type: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Moves the card to another deck.
    pub deck_id: Option<DeckId>,
}

impl CardUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the edit and bumps `updated_at`. Deck existence is checked by
    /// the store.
    pub fn apply_to(&self, card: &mut Card, now: DateTime<Utc>) {
        if let Some(front) = &self.front {
            card.front = front.clone();
        }
        if let Some(back) = &self.back {
            card.back = back.clone();
        }
        if let Some(card_type) = &self.card_type {
            card.card_type = card_type.clone();
        }
        if let Some(tags) = &self.tags {
            card.tags = normalize_tags(tags);
        }
        if let Some(deck_id) = self.deck_id {
            card.deck_id = deck_id;
        }
        card.updated_at = now;
    }
}

/// Card listing filter. Both conditions must hold when set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CardFilter {
    pub deck_id: Option<DeckId>,
    pub source_id: Option<i64>,
}

impl CardFilter {
    pub fn deck(deck_id: DeckId) -> Self {
        Self {
            deck_id: Some(deck_id),
            source_id: None,
        }
    }

    pub fn matches(&self, card: &Card) -> bool {
        self.deck_id.is_none_or(|deck| card.deck_id == deck)
            && self.source_id.is_none_or(|source| card.source_id == Some(source))
    }
}

/// Card merged with its scheduling state, as shown by "next due card".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
    pub card: Card,
    pub state: SchedulingState,
}

/// Joins tags for storage. Blank tags are dropped.
pub fn tags_to_column(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Trimmed tags with blanks removed, as they come back from storage.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags_from_column(&tags_to_column(tags))
}

pub fn tags_from_column(column: &str) -> Vec<String> {
    column
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
