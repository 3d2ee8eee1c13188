//! JSON import/export of decks.
//! Exports carry card content only; imported cards start with a fresh schedule.

use crate::database::db::SqliteStore;
use crate::database::store::CardStore;
use crate::error::{Result, SchedulerError};
use crate::models::{CardFilter, Deck, DeckId, NewCard};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckExport {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cards: Vec<NewCard>,
}

/// Exports a deck to a JSON file at the specified path.
pub fn export_deck_to_path(store: &SqliteStore, deck_id: DeckId, path: impl AsRef<Path>) -> Result<DeckExport> {
    let deck = store
        .get_deck(deck_id)?
        .ok_or(SchedulerError::DeckNotFound(deck_id))?;
    let cards = store
        .list_cards(CardFilter::deck(deck_id))?
        .into_iter()
        .map(|card| NewCard {
            front: card.front,
            back: card.back,
            card_type: card.card_type,
            tags: card.tags,
            source_id: card.source_id,
            source_chunk_id: card.source_chunk_id,
        })
        .collect();

    let export = DeckExport {
        name: deck.name,
        description: deck.description,
        cards,
    };
    fs::write(path.as_ref(), serde_json::to_string_pretty(&export)?)?;
    info!(
        "deck '{}' exported to '{}'",
        export.name,
        path.as_ref().display()
    );
    Ok(export)
}

/// Imports a deck from a JSON file. Cards are added to the deck of the same
/// name, which is created when missing; nothing is kept if any card fails.
/// Returns the deck and the number of cards added.
pub fn import_deck_from_path(
    store: &SqliteStore,
    path: impl AsRef<Path>,
    now: DateTime<Utc>,
) -> Result<(Deck, usize)> {
    let contents = fs::read_to_string(path.as_ref())?;
    let export: DeckExport = serde_json::from_str(&contents)?;

    let (deck, created) = store.import_deck(&export.name, &export.description, &export.cards, now)?;
    let added = created.len();

    info!(
        "deck '{}' imported from '{}' ({} cards)",
        deck.name,
        path.as_ref().display(),
        added
    );
    Ok((deck, added))
}
