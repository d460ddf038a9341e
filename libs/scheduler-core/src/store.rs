//! Persistence boundary the scheduler runs against.
//!
//! The scheduler never talks to a database directly. A store owns the
//! transaction boundaries; the scheduler brackets every mutating operation
//! with [`CollectionStore::begin`] and [`CollectionStore::commit`].

use crate::config::{CollectionConfig, DeckConfig, DEFAULT_DECK_CONFIG_ID};
use crate::deck::{self, Deck};
use crate::types::{Card, CardId, CardQueue, DeckConfigId, DeckId, NoteId, RevlogEntry};
use tracing::warn;

/// Sort order for [`CardQuery`] results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CardOrder {
    /// Raw due value, then id.
    #[default]
    Due,
    Id,
}

/// Card selection understood by every store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardQuery {
    /// Empty matches every deck.
    pub deck_ids: Vec<DeckId>,
    /// Empty matches every queue.
    pub queues: Vec<CardQueue>,
    /// Exclusive upper bound on the raw due value.
    pub due_before: Option<i64>,
    pub min_lapses: Option<u32>,
    /// Skip cards currently parked in a filtered deck.
    pub exclude_filtered: bool,
    pub order: CardOrder,
    pub limit: Option<usize>,
}

impl CardQuery {
    pub fn in_decks(deck_ids: impl Into<Vec<DeckId>>) -> Self {
        Self {
            deck_ids: deck_ids.into(),
            ..Self::default()
        }
    }

    pub fn deck(deck_id: DeckId) -> Self {
        Self::in_decks(vec![deck_id])
    }

    pub fn queues(mut self, queues: impl Into<Vec<CardQueue>>) -> Self {
        self.queues = queues.into();
        self
    }

    pub fn due_before(mut self, raw: i64) -> Self {
        self.due_before = Some(raw);
        self
    }

    pub fn min_lapses(mut self, lapses: u32) -> Self {
        self.min_lapses = Some(lapses);
        self
    }

    pub fn exclude_filtered(mut self) -> Self {
        self.exclude_filtered = true;
        self
    }

    pub fn order(mut self, order: CardOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Card, deck, note and revlog storage.
pub trait CollectionStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn begin(&mut self) -> Result<(), Self::Error>;
    fn commit(&mut self) -> Result<(), Self::Error>;
    fn rollback(&mut self) -> Result<(), Self::Error>;

    fn collection_config(&self) -> Result<CollectionConfig, Self::Error>;
    fn set_collection_config(&mut self, config: &CollectionConfig) -> Result<(), Self::Error>;

    fn get_card(&self, id: CardId) -> Result<Option<Card>, Self::Error>;
    fn update_card(&mut self, card: &Card) -> Result<(), Self::Error>;
    fn query_cards(&self, query: &CardQuery) -> Result<Vec<Card>, Self::Error>;
    fn count_cards(&self, query: &CardQuery) -> Result<usize, Self::Error>;
    fn cards_of_note(&self, note_id: NoteId) -> Result<Vec<Card>, Self::Error>;
    /// Highest position among new cards, or 0 if there are none.
    fn max_new_position(&self) -> Result<i32, Self::Error>;

    /// Insert a revlog row, returning the id it was stored under. Ids are
    /// unique; a colliding id is bumped.
    fn insert_revlog(&mut self, entry: &RevlogEntry) -> Result<i64, Self::Error>;
    fn delete_last_revlog_for_card(
        &mut self,
        card_id: CardId,
    ) -> Result<Option<RevlogEntry>, Self::Error>;

    fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, Self::Error>;
    fn all_decks(&self) -> Result<Vec<Deck>, Self::Error>;
    fn update_deck(&mut self, deck: &Deck) -> Result<(), Self::Error>;
    fn remove_deck(&mut self, id: DeckId) -> Result<(), Self::Error>;
    fn get_deck_config(&self, id: DeckConfigId) -> Result<Option<DeckConfig>, Self::Error>;

    /// Returns true if the tag was not already present.
    fn note_add_tag(&mut self, note_id: NoteId, tag: &str) -> Result<bool, Self::Error>;
    fn note_remove_tag(&mut self, note_id: NoteId, tag: &str) -> Result<(), Self::Error>;
    fn note_has_tag(&self, note_id: NoteId, tag: &str) -> Result<bool, Self::Error>;

    /// Config attached to a normal deck. Missing decks and configs fall back
    /// to the default config.
    fn deck_config_for(&self, deck_id: DeckId) -> Result<DeckConfig, Self::Error> {
        let config_id = match self.get_deck(deck_id)? {
            Some(deck) => deck.config_id().unwrap_or(DEFAULT_DECK_CONFIG_ID),
            None => {
                warn!(deck_id, "deck missing, using default config");
                DEFAULT_DECK_CONFIG_ID
            }
        };
        if let Some(config) = self.get_deck_config(config_id)? {
            return Ok(config);
        }
        warn!(deck_id, config_id, "deck config missing, using default");
        Ok(self
            .get_deck_config(DEFAULT_DECK_CONFIG_ID)?
            .unwrap_or_default())
    }

    /// Ancestors of a deck, nearest first.
    fn ancestor_decks(&self, deck_id: DeckId) -> Result<Vec<Deck>, Self::Error> {
        let decks = self.all_decks()?;
        Ok(deck::ancestors(&decks, deck_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// The root deck followed by its descendants in name order.
    fn active_deck_ids(&self, root: DeckId) -> Result<Vec<DeckId>, Self::Error> {
        Ok(deck::active_deck_ids(&self.all_decks()?, root))
    }
}
