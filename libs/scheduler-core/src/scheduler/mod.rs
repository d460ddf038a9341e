//! The study scheduler.
//!
//! A [`Scheduler`] owns a store, a clock and an algorithm, and keeps an
//! in-memory session of queues for the selected deck. The session is rebuilt
//! lazily: after [`Scheduler::reset`], on day rollover, and after any
//! operation that moves cards around outside of answering.

mod answering;
mod bury;
mod filtered;
mod queues;
mod reschedule;
mod selector;

pub use bury::UnburyMode;
pub use filtered::order_filtered_cards;
pub use queues::QueueCounts;
pub use reschedule::{parse_due_date, DueDateSpec, RescheduleAsNewOptions};
pub use selector::{new_card_modulus, time_for_new_card};

use crate::algorithm::{sm2::Sm2, SchedulingContext, SpacedRepetitionAlgorithm};
use crate::config::EffectiveConfig;
use crate::error::{Result, SchedulerError};
use crate::store::CollectionStore;
use crate::timing::{Clock, SchedTimingToday, SystemClock};
use crate::types::{Card, CardId, DeckId, Rating};
use answering::UndoEntry;
use queues::SchedulerSession;
use tracing::warn;

/// Cards fetched into a queue at a time.
pub const DEFAULT_QUEUE_LIMIT: usize = 50;

/// The card handed out by the last `get_next_card` call.
#[derive(Debug, Clone, Copy)]
struct StudyCard {
    card_id: CardId,
    shown_at_ms: i64,
}

pub struct Scheduler<S> {
    store: S,
    clock: Box<dyn Clock>,
    algorithm: Box<dyn SpacedRepetitionAlgorithm>,
    root_deck: DeckId,
    session: Option<SchedulerSession>,
    current: Option<StudyCard>,
    undo: Option<UndoEntry>,
    /// Answers given since the scheduler was created.
    reps: u32,
    queue_limit: usize,
}

impl<S> Scheduler<S> {
    /// Study `root_deck` and its children using the wall clock and the
    /// default algorithm.
    pub fn new(store: S, root_deck: DeckId) -> Self {
        Self {
            store,
            clock: Box::new(SystemClock),
            algorithm: Box::new(Sm2),
            root_deck,
            session: None,
            current: None,
            undo: None,
            reps: 0,
            queue_limit: DEFAULT_QUEUE_LIMIT,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self.reset();
        self
    }

    pub fn with_queue_limit(mut self, limit: usize) -> Self {
        self.queue_limit = limit.max(1);
        self.reset();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct store access. Call [`Scheduler::reset`] after changing cards
    /// or decks through it.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn root_deck(&self) -> DeckId {
        self.root_deck
    }

    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm.name()
    }

    /// Study a different deck tree.
    pub fn select_deck(&mut self, deck_id: DeckId) {
        self.root_deck = deck_id;
        self.reset();
    }

    /// Drop the session; it is rebuilt on next use. A card handed out but
    /// not yet answered is abandoned.
    pub fn reset(&mut self) {
        self.session = None;
        self.current = None;
    }

    /// Reset and forget the last answer, after cards were changed other
    /// than by answering.
    fn invalidate(&mut self) {
        self.reset();
        self.undo = None;
    }

    pub fn can_undo(&self) -> bool {
        self.undo.is_some()
    }
}

impl<S> Scheduler<S>
where
    S: CollectionStore,
    SchedulerError: From<S::Error>,
{
    /// Run `op` inside a store transaction. On failure the transaction is
    /// rolled back and the session dropped.
    fn transact<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.store.begin()?;
        match op(self) {
            Ok(value) => {
                if let Err(err) = self.store.commit() {
                    self.session = None;
                    return Err(err.into());
                }
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.store.rollback() {
                    warn!(error = %rollback, "rollback failed");
                }
                self.session = None;
                Err(err)
            }
        }
    }

    /// Today's position in the collection calendar.
    pub fn timing(&self) -> Result<SchedTimingToday> {
        let config = self.store.collection_config()?;
        Ok(SchedTimingToday::now(
            self.clock.as_ref(),
            config.created_secs,
            config.rollover_hour,
        ))
    }

    fn scheduling_context(&self, timing: SchedTimingToday) -> SchedulingContext {
        SchedulingContext {
            today: timing.days_elapsed,
            day_cutoff: timing.next_day_at,
            now: self.clock.now_secs(),
        }
    }

    /// The config a card is scheduled with, taking a filtered deck it sits
    /// in into account.
    pub fn effective_config(&self, card: &Card) -> Result<EffectiveConfig> {
        let home = self.store.deck_config_for(card.home_deck_id())?;
        let filtered = if card.is_filtered() {
            self.store
                .get_deck(card.deck_id)?
                .and_then(|deck| deck.filtered().cloned())
        } else {
            None
        };
        Ok(EffectiveConfig::resolve(&home, filtered.as_ref()))
    }

    /// 2 for cards being previewed in a filtered deck, otherwise 4.
    pub fn answer_buttons(&self, card: &Card) -> Result<u8> {
        Ok(button_count(&self.effective_config(card)?))
    }

    /// Seconds until `card` would be shown again if answered with `ease`.
    /// Changes nothing.
    pub fn next_interval_preview(&self, card: &Card, ease: u8) -> Result<u64> {
        let config = self.effective_config(card)?;
        let rating = validate_ease(ease, button_count(&config))?;
        let ctx = self.scheduling_context(self.timing()?);
        Ok(self
            .algorithm
            .next_interval_secs(card, rating, &config, &ctx))
    }

    /// Remaining (new, learning, review) counts for the session.
    pub fn counts(&mut self) -> Result<QueueCounts> {
        Ok(self.session()?.counts)
    }

    /// Counts as if `card` had not been taken out of its queue yet.
    pub fn counts_with(&mut self, card: &Card) -> Result<QueueCounts> {
        let mut counts = self.counts()?;
        counts.include(card.queue);
        Ok(counts)
    }

    /// True if the card is waiting in one of the session's queues.
    pub fn is_card_queued(&self, card_id: CardId) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.is_queued(card_id))
    }

    fn session(&mut self) -> Result<&mut SchedulerSession> {
        self.ensure_session()?;
        self.session
            .as_mut()
            .ok_or(SchedulerError::DeckNotFound(self.root_deck))
    }
}

fn button_count(config: &EffectiveConfig) -> u8 {
    if config.is_previewing() {
        2
    } else {
        4
    }
}

fn validate_ease(ease: u8, buttons: u8) -> Result<Rating> {
    if !(1..=buttons).contains(&ease) {
        return Err(SchedulerError::InvalidEase { ease, buttons });
    }
    Rating::from_value(ease).ok_or(SchedulerError::InvalidEase { ease, buttons })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ease_must_fit_button_count() {
        assert_eq!(validate_ease(1, 4).unwrap(), Rating::Again);
        assert_eq!(validate_ease(4, 4).unwrap(), Rating::Easy);
        assert_eq!(validate_ease(2, 2).unwrap(), Rating::Hard);
        assert!(matches!(
            validate_ease(3, 2),
            Err(SchedulerError::InvalidEase { ease: 3, buttons: 2 })
        ));
        assert!(matches!(
            validate_ease(0, 4),
            Err(SchedulerError::InvalidEase { ease: 0, buttons: 4 })
        ));
    }
}
