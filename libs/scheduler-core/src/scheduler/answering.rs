//! Answering cards, the review log and single-step undo.

use super::{validate_ease, button_count, Scheduler};
use crate::deck::Deck;
use crate::error::{Result, SchedulerError};
use crate::leech::LEECH_TAG;
use crate::store::CollectionStore;
use crate::types::{Card, CardQueue, DeckId, Due, RevlogEntry};
use tracing::{debug, info};

/// State needed to take back the last answer.
#[derive(Debug, Clone)]
pub(crate) struct UndoEntry {
    card: Card,
    siblings: Vec<Card>,
    /// Decks whose daily counters were bumped, before the bump. Restored in
    /// reverse order.
    decks: Vec<Deck>,
    leech_tagged: bool,
    reps: u32,
}

impl<S> Scheduler<S>
where
    S: CollectionStore,
    SchedulerError: From<S::Error>,
{
    /// Answer the card returned by the last `get_next_card` call with an
    /// ease of 1 (again) to 4 (easy), or 1-2 for cards being previewed.
    ///
    /// The card update, revlog row and daily counters are written in one
    /// transaction. Returns the updated card.
    pub fn answer_card(&mut self, card_id: crate::types::CardId, ease: u8) -> Result<Card> {
        let current = self.current.ok_or(SchedulerError::NoCurrentCard)?;
        if current.card_id != card_id {
            return Err(SchedulerError::CardMismatch {
                answered: card_id,
                current: current.card_id,
            });
        }
        let card = self
            .store
            .get_card(card_id)?
            .ok_or(SchedulerError::CardNotFound(card_id))?;
        let config = self.effective_config(&card)?;
        let rating = validate_ease(ease, button_count(&config))?;

        self.ensure_session()?;
        let timing = match &self.session {
            Some(session) => session.timing,
            None => self.timing()?,
        };
        let ctx = self.scheduling_context(timing);
        let outcome = self.algorithm.answer(&card, rating, &config, &ctx)?;

        let now_ms = self.clock.now_millis();
        let max_ms = config.review.max_answer_secs as i64 * 1000;
        let time_taken_ms = (now_ms - current.shown_at_ms).clamp(0, max_ms) as u32;
        self.current = None;

        let updated = self.transact(|sched| {
            let bury_on_answer = sched
                .session
                .as_ref()
                .map(|session| session.config.bury_siblings_on_answer)
                .unwrap_or(true);
            let siblings = if bury_on_answer {
                sched.bury_siblings(&card)?
            } else {
                Vec::new()
            };

            let mut updated = outcome.card.clone();
            updated.modified = ctx.now;
            sched.requeue_learning(&mut updated, ctx.now);

            let leech_tagged = if outcome.leech.is_leech() {
                info!(
                    card_id,
                    lapses = updated.lapses,
                    suspended = outcome.leech.suspends(),
                    "card became a leech"
                );
                sched.store.note_add_tag(updated.note_id, LEECH_TAG)?
            } else {
                false
            };

            sched.store.update_card(&updated)?;
            sched.store.insert_revlog(&RevlogEntry {
                id: now_ms,
                card_id,
                usn: -1,
                ease: outcome.revlog.ease,
                interval: outcome.revlog.interval,
                last_interval: outcome.revlog.last_interval,
                ease_factor: outcome.revlog.ease_factor,
                time_taken_ms,
                kind: outcome.revlog.kind,
            })?;

            // New cards count against the deck they were studied in; reviews
            // against the deck the card ends up in.
            let today = ctx.today;
            let new = outcome.introduced_new as i32;
            let review = outcome.counted_review as i32;
            let mut decks = Vec::new();
            if card.deck_id == updated.deck_id {
                decks.extend(sched.record_study(card.deck_id, today, new, review, time_taken_ms)?);
            } else {
                decks.extend(sched.record_study(card.deck_id, today, new, 0, time_taken_ms)?);
                decks.extend(sched.record_study(updated.deck_id, today, 0, review, 0)?);
            }

            sched.undo = Some(UndoEntry {
                card: card.clone(),
                siblings,
                decks,
                leech_tagged,
                reps: sched.reps,
            });
            sched.reps += 1;
            Ok(updated)
        })?;

        debug!(
            card_id,
            ease,
            queue = updated.queue.as_str(),
            due = updated.due.raw(),
            interval = updated.interval,
            "answered card"
        );
        Ok(updated)
    }

    /// Return a freshly answered (re)learning card to the session, keeping
    /// it behind cards already waiting when nothing else is left to study.
    fn requeue_learning(&mut self, card: &mut Card, now: i64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !matches!(card.queue, CardQueue::Learning | CardQueue::PreviewRepeat) {
            return;
        }
        let Due::Deadline(due) = card.due else {
            return;
        };
        if due >= session.learn_ahead_cutoff(now) {
            return;
        }
        let mut due = due;
        if card.queue == CardQueue::Learning
            && session.counts.review == 0
            && session.counts.new == 0
        {
            if let Some(earliest) = session.next_learning_due() {
                due = due.max(earliest + 1);
                card.due = Due::Deadline(due);
            }
        }
        session.push_learning(due, card.id);
    }

    /// Bump today's counters on a deck and its ancestors, returning their
    /// previous state.
    fn record_study(
        &mut self,
        deck_id: DeckId,
        today: u32,
        new: i32,
        review: i32,
        millis: u32,
    ) -> Result<Vec<Deck>> {
        let mut decks: Vec<Deck> = self.store.get_deck(deck_id)?.into_iter().collect();
        decks.extend(self.store.ancestor_decks(deck_id)?);
        for deck in &decks {
            let mut deck = deck.clone();
            deck.today.record(today, new, review, millis as i64);
            self.store.update_deck(&deck)?;
        }
        Ok(decks)
    }

    /// Take back the last answer: the card and any siblings it buried are
    /// restored, its revlog row deleted, the daily counters rolled back and
    /// a leech tag it added removed. Returns the restored card.
    pub fn undo_last_answer(&mut self) -> Result<Card> {
        let entry = self.undo.take().ok_or(SchedulerError::NothingToUndo)?;
        self.transact(|sched| {
            sched.store.update_card(&entry.card)?;
            for sibling in &entry.siblings {
                sched.store.update_card(sibling)?;
            }
            sched.store.delete_last_revlog_for_card(entry.card.id)?;
            for snapshot in entry.decks.iter().rev() {
                if let Some(mut deck) = sched.store.get_deck(snapshot.id)? {
                    deck.today = snapshot.today;
                    sched.store.update_deck(&deck)?;
                }
            }
            if entry.leech_tagged {
                sched
                    .store
                    .note_remove_tag(entry.card.note_id, LEECH_TAG)?;
            }
            sched.reps = entry.reps;
            Ok(())
        })?;
        debug!(card_id = entry.card.id, "undid answer");
        self.reset();
        Ok(entry.card)
    }
}
