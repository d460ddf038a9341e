//! Spaced-repetition scheduling engine.
//!
//! Provides:
//! - Card, deck and deck config types
//! - The SM-2 derived scheduler with learning steps and relearning
//! - Study session queues with per-day limits across a deck tree
//! - Sibling burying, suspension, filtered decks and manual rescheduling
//! - A storage trait so the engine runs against any backend

pub mod algorithm;
pub mod config;
pub mod deck;
pub mod error;
pub mod leech;
pub mod limits;
pub mod scheduler;
pub mod store;
pub mod timing;
pub mod types;

pub use algorithm::{AnswerOutcome, SchedulingContext, SpacedRepetitionAlgorithm};
pub use config::{CollectionConfig, DeckConfig, EffectiveConfig};
pub use deck::{Deck, DeckKind, FilteredDeck};
pub use error::{Result, SchedulerError};
pub use scheduler::{QueueCounts, Scheduler, UnburyMode};
pub use store::{CardOrder, CardQuery, CollectionStore};
pub use timing::{Clock, ManualClock, SchedTimingToday, SystemClock};
pub use types::{Card, CardId, CardQueue, CardType, DeckId, Due, NoteId, Rating, RevlogEntry};
