//! Picking the next card.

use super::queues::QueueSource;
use super::{Scheduler, StudyCard};
use crate::config::NewCardSpread;
use crate::error::{Result, SchedulerError};
use crate::store::CollectionStore;
use crate::types::{Card, CardId};
use tracing::debug;

/// How often a new card is mixed in when spreading them across reviews:
/// every `modulus`th answer. 0 disables interleaving.
pub fn new_card_modulus(spread: NewCardSpread, new_count: u32, review_count: u32) -> u32 {
    if spread != NewCardSpread::Distribute || new_count == 0 {
        return 0;
    }
    let modulus = (new_count + review_count) / new_count;
    if review_count > 0 {
        modulus.max(2)
    } else {
        modulus
    }
}

pub fn time_for_new_card(spread: NewCardSpread, modulus: u32, reps: u32, new_count: u32) -> bool {
    if new_count == 0 {
        return false;
    }
    match spread {
        NewCardSpread::Last => false,
        NewCardSpread::First => true,
        NewCardSpread::Distribute => modulus != 0 && reps != 0 && reps % modulus == 0,
    }
}

impl<S> Scheduler<S>
where
    S: CollectionStore,
    SchedulerError: From<S::Error>,
{
    /// The next card to study, or `None` when the session is finished.
    ///
    /// A card fetched earlier but not answered is abandoned. Queue entries
    /// whose card has left that queue in the store are skipped.
    pub fn get_next_card(&mut self) -> Result<Option<Card>> {
        self.ensure_session()?;
        self.current = None;

        let card = loop {
            let Some((card_id, source)) = self.next_queued_card()? else {
                return Ok(None);
            };
            match self.store.get_card(card_id)? {
                Some(card)
                    if self
                        .session
                        .as_ref()
                        .is_some_and(|session| session.still_holds(&card, source)) =>
                {
                    break card
                }
                Some(card) => debug!(
                    card_id,
                    queue = card.queue.as_str(),
                    ?source,
                    "card left its queue, skipping"
                ),
                None => debug!(card_id, "queued card no longer exists, skipping"),
            }
        };

        let bury_on_answer = self
            .session
            .as_ref()
            .map(|session| session.config.bury_siblings_on_answer)
            .unwrap_or(true);
        if !bury_on_answer {
            self.transact(|sched| sched.bury_siblings(&card).map(|_| ()))?;
        }
        self.current = Some(StudyCard {
            card_id: card.id,
            shown_at_ms: self.clock.now_millis(),
        });
        Ok(Some(card))
    }

    /// Pop the next queued id. When every queue is dry but the counts say
    /// otherwise, recount from the store once and retry; a second miss
    /// zeroes the counts.
    fn next_queued_card(&mut self) -> Result<Option<(CardId, QueueSource)>> {
        let mut selected = self.select_card()?;
        if selected.is_none() && self.session_counts_total() > 0 {
            debug!("queues empty but counts are not, recounting");
            let now = self.clock.now_secs();
            let Self { store, session, .. } = self;
            if let Some(session) = session.as_mut() {
                session.recount(store, now)?;
            }
            selected = self.select_card()?;
            if selected.is_none() {
                if let Some(session) = self.session.as_mut() {
                    session.counts = Default::default();
                }
            }
        }
        Ok(selected)
    }

    fn session_counts_total(&self) -> u32 {
        self.session
            .as_ref()
            .map(|session| session.counts.total())
            .unwrap_or_default()
    }

    /// Queue priority: learning due now, a new card if one is due by the
    /// spread setting, day learning (when configured first), reviews, day
    /// learning, new cards, then learning cards due within the learn-ahead
    /// window.
    fn select_card(&mut self) -> Result<Option<(CardId, QueueSource)>> {
        let now = self.clock.now_secs();
        let reps = self.reps;
        let Self { store, session, .. } = self;
        let Some(session) = session.as_mut() else {
            return Ok(None);
        };
        let store = &*store;

        if let Some(id) = session.pop_learning(store, now, false)? {
            return Ok(Some((id, QueueSource::Learning)));
        }

        let spread = session.config.new_spread;
        if time_for_new_card(spread, session.new_card_modulus, reps, session.counts.new) {
            if let Some(id) = session.pop_new(store)? {
                return Ok(Some((id, QueueSource::New)));
            }
        }

        let day_learn_first = session.config.day_learn_first;
        if day_learn_first {
            if let Some(id) = session.pop_day_learning(store)? {
                return Ok(Some((id, QueueSource::DayLearn)));
            }
        }

        if let Some(id) = session.pop_review(store)? {
            return Ok(Some((id, QueueSource::Review)));
        }

        if !day_learn_first {
            if let Some(id) = session.pop_day_learning(store)? {
                return Ok(Some((id, QueueSource::DayLearn)));
            }
        }

        if let Some(id) = session.pop_new(store)? {
            return Ok(Some((id, QueueSource::New)));
        }

        Ok(session
            .pop_learning(store, now, true)?
            .map(|id| (id, QueueSource::Learning)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn modulus_without_reviews_is_plain_ratio() {
        assert_eq!(new_card_modulus(NewCardSpread::Distribute, 5, 0), 1);
        assert_eq!(new_card_modulus(NewCardSpread::Distribute, 1, 0), 1);
    }

    #[test]
    fn modulus_with_reviews_is_at_least_two() {
        assert_eq!(new_card_modulus(NewCardSpread::Distribute, 10, 1), 2);
        assert_eq!(new_card_modulus(NewCardSpread::Distribute, 10, 10), 2);
        assert_eq!(new_card_modulus(NewCardSpread::Distribute, 10, 25), 3);
        assert_eq!(new_card_modulus(NewCardSpread::Distribute, 1, 100), 101);
    }

    #[test]
    fn modulus_disabled_without_new_cards_or_when_not_distributing() {
        assert_eq!(new_card_modulus(NewCardSpread::Distribute, 0, 50), 0);
        assert_eq!(new_card_modulus(NewCardSpread::Last, 10, 10), 0);
        assert_eq!(new_card_modulus(NewCardSpread::First, 10, 10), 0);
    }

    #[test]
    fn new_cards_interleave_on_modulus_boundaries() {
        let modulus = new_card_modulus(NewCardSpread::Distribute, 5, 10);
        assert_eq!(modulus, 3);
        let shown: Vec<u32> = (0..10)
            .filter(|reps| time_for_new_card(NewCardSpread::Distribute, modulus, *reps, 5))
            .collect();
        assert_eq!(shown, vec![3, 6, 9]);
    }

    #[test]
    fn spread_modes_override_modulus() {
        assert!(time_for_new_card(NewCardSpread::First, 0, 0, 1));
        assert!(!time_for_new_card(NewCardSpread::Last, 2, 2, 1));
        assert!(!time_for_new_card(NewCardSpread::First, 0, 0, 0));
        assert!(!time_for_new_card(NewCardSpread::Distribute, 0, 4, 3));
    }
}
