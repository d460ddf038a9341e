//! Burying, suspending and restoring cards.

use super::Scheduler;
use crate::error::{Result, SchedulerError};
use crate::store::{CardQuery, CollectionStore};
use crate::types::{Card, CardId, CardQueue, Due, NoteId};
use tracing::{debug, info};

/// Which buried cards `unbury_deck` restores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnburyMode {
    #[default]
    All,
    /// Cards buried by hand.
    Manual,
    /// Cards buried automatically as siblings of an answered card.
    Siblings,
}

impl UnburyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Manual => "manual",
            Self::Siblings => "siblings",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "manual" => Some(Self::Manual),
            "siblings" => Some(Self::Siblings),
            _ => None,
        }
    }

    fn queues(self) -> Vec<CardQueue> {
        match self {
            Self::All => vec![CardQueue::SchedulerBuried, CardQueue::UserBuried],
            Self::Manual => vec![CardQueue::UserBuried],
            Self::Siblings => vec![CardQueue::SchedulerBuried],
        }
    }
}

impl<S> Scheduler<S>
where
    S: CollectionStore,
    SchedulerError: From<S::Error>,
{
    /// Take the new and due review siblings of `card` out of today's
    /// session, burying them when the home config asks for it. Returns the
    /// buried siblings as they were before.
    ///
    /// Must run inside a transaction.
    pub(crate) fn bury_siblings(&mut self, card: &Card) -> Result<Vec<Card>> {
        let config = self.effective_config(card)?;
        let today = match &self.session {
            Some(session) => session.today(),
            None => self.timing()?.days_elapsed,
        };
        let now = self.clock.now_secs();

        let mut buried = Vec::new();
        for sibling in self.store.cards_of_note(card.note_id)? {
            if sibling.id == card.id {
                continue;
            }
            let bury = match sibling.queue {
                CardQueue::New => config.new.bury,
                CardQueue::Review => match sibling.due {
                    Due::Day(day) if day <= today as i32 => config.review.bury,
                    _ => continue,
                },
                _ => continue,
            };
            if let Some(session) = self.session.as_mut() {
                session.discard(sibling.id);
            }
            if bury {
                let mut updated = sibling.clone();
                updated.queue = CardQueue::SchedulerBuried;
                updated.modified = now;
                self.store.update_card(&updated)?;
                buried.push(sibling);
            }
        }
        if !buried.is_empty() {
            debug!(card_id = card.id, count = buried.len(), "buried siblings");
        }
        Ok(buried)
    }

    /// Suspend cards. Cards in a filtered deck stay there. Returns how many
    /// cards changed.
    pub fn suspend_cards(&mut self, card_ids: &[CardId]) -> Result<usize> {
        let changed = self.transact(|sched| {
            sched.update_each(card_ids, |card| {
                if card.queue == CardQueue::Suspended {
                    return false;
                }
                card.queue = CardQueue::Suspended;
                true
            })
        })?;
        info!(count = changed, "suspended cards");
        self.invalidate();
        Ok(changed)
    }

    pub fn unsuspend_cards(&mut self, card_ids: &[CardId]) -> Result<usize> {
        let changed = self.transact(|sched| {
            sched.update_each(card_ids, |card| {
                if card.queue != CardQueue::Suspended {
                    return false;
                }
                card.restore_queue_after_bury_or_suspend();
                true
            })
        })?;
        info!(count = changed, "unsuspended cards");
        self.invalidate();
        Ok(changed)
    }

    /// Bury cards by hand until the next day. Suspended cards are left
    /// alone.
    pub fn bury_cards(&mut self, card_ids: &[CardId]) -> Result<usize> {
        let changed = self.transact(|sched| {
            sched.update_each(card_ids, |card| {
                if !card.queue.is_active() {
                    return false;
                }
                card.queue = CardQueue::UserBuried;
                true
            })
        })?;
        info!(count = changed, "buried cards");
        self.invalidate();
        Ok(changed)
    }

    /// Bury every studyable card of the given notes.
    pub fn bury_notes(&mut self, note_ids: &[NoteId]) -> Result<usize> {
        let mut card_ids = Vec::new();
        for &note_id in note_ids {
            card_ids.extend(
                self.store
                    .cards_of_note(note_id)?
                    .into_iter()
                    .filter(|card| card.queue.is_active())
                    .map(|card| card.id),
            );
        }
        self.bury_cards(&card_ids)
    }

    /// Restore buried cards in a deck and its children.
    pub fn unbury_deck(&mut self, deck_id: crate::types::DeckId, mode: UnburyMode) -> Result<usize> {
        let decks = self.store.active_deck_ids(deck_id)?;
        if decks.is_empty() {
            return Err(SchedulerError::DeckNotFound(deck_id));
        }
        let changed =
            self.transact(|sched| sched.unbury_matching(CardQuery::in_decks(decks).queues(mode.queues())))?;
        info!(deck_id, mode = mode.as_str(), count = changed, "unburied cards");
        self.invalidate();
        Ok(changed)
    }

    /// Restore every buried card in the collection. Runs at the start of
    /// each study day; must run inside a transaction.
    pub(crate) fn unbury_all(&mut self) -> Result<usize> {
        let changed = self.unbury_matching(CardQuery::default().queues(UnburyMode::All.queues()))?;
        if changed > 0 {
            debug!(count = changed, "unburied cards for new day");
        }
        Ok(changed)
    }

    fn unbury_matching(&mut self, query: CardQuery) -> Result<usize> {
        let now = self.clock.now_secs();
        let cards = self.store.query_cards(&query)?;
        for mut card in cards.iter().cloned() {
            card.restore_queue_after_bury_or_suspend();
            card.modified = now;
            self.store.update_card(&card)?;
        }
        Ok(cards.len())
    }

    /// Apply `change` to each existing card, saving those it reports as
    /// changed. Missing ids are skipped.
    fn update_each(
        &mut self,
        card_ids: &[CardId],
        mut change: impl FnMut(&mut Card) -> bool,
    ) -> Result<usize> {
        let now = self.clock.now_secs();
        let mut changed = 0;
        for &card_id in card_ids {
            let Some(mut card) = self.store.get_card(card_id)? else {
                debug!(card_id, "skipping missing card");
                continue;
            };
            if change(&mut card) {
                card.modified = now;
                self.store.update_card(&card)?;
                changed += 1;
            }
        }
        Ok(changed)
    }
}
