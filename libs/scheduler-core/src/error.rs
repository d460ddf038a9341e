//! Error types for scheduler-core.

use crate::types::{CardId, CardQueue, DeckId};
use thiserror::Error;

/// Result type alias using SchedulerError.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors surfaced by scheduling operations.
///
/// Configuration problems and queue/count disagreements are recovered
/// internally and never show up here.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("ease {ease} is outside 1..={buttons}")]
    InvalidEase { ease: u8, buttons: u8 },

    #[error("no card has been fetched for answering")]
    NoCurrentCard,

    #[error("card {answered} is not the card being studied ({current})")]
    CardMismatch { answered: CardId, current: CardId },

    #[error("card {card_id} cannot be answered from queue {queue:?}")]
    InvalidQueue { card_id: CardId, queue: CardQueue },

    #[error("card not found: {0}")]
    CardNotFound(CardId),

    #[error("deck not found: {0}")]
    DeckNotFound(DeckId),

    #[error("deck {0} is not a filtered deck")]
    NotFilteredDeck(DeckId),

    #[error("invalid due date: {0}")]
    InvalidDueDate(String),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SchedulerError {
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage(Box::new(err))
    }
}
