//! Building and emptying filtered decks.

use super::Scheduler;
use crate::algorithm::fuzz::day_rng;
use crate::deck::{CardFilter, FilterKind, FilteredDeck, FilteredOrder};
use crate::error::{Result, SchedulerError};
use crate::store::{CardQuery, CollectionStore};
use crate::types::{Card, CardId, CardQueue, DeckId, Due};
use rand::seq::SliceRandom;
use std::cmp::{Ordering, Reverse};
use std::collections::HashSet;
use tracing::{debug, info};

/// Cards moved into a filtered deck are positioned from here upwards, ahead
/// of every home deck position.
const FILTERED_POSITION_BASE: i32 = -100_000;

/// Sort candidate cards into the order a filtered deck term pulls them in.
///
/// Ties are broken by card id, so the result is stable for a given day.
pub fn order_filtered_cards(cards: &mut Vec<Card>, order: FilteredOrder, today: u32) {
    match order {
        FilteredOrder::OldestSeenFirst => cards.sort_by_key(|card| (card.modified, card.id)),
        FilteredOrder::Random => {
            cards.sort_by_key(|card| card.id);
            cards.shuffle(&mut day_rng(today));
        }
        FilteredOrder::IntervalsAscending => cards.sort_by_key(|card| (card.interval, card.id)),
        FilteredOrder::IntervalsDescending => {
            cards.sort_by_key(|card| (Reverse(card.interval), card.id))
        }
        FilteredOrder::MostLapses => cards.sort_by_key(|card| (Reverse(card.lapses), card.id)),
        FilteredOrder::Added => cards.sort_by_key(|card| (card.note_id, card.ordinal, card.id)),
        FilteredOrder::ReverseAdded => {
            cards.sort_by_key(|card| (Reverse(card.note_id), card.ordinal, card.id))
        }
        FilteredOrder::Due => cards.sort_by_key(|card| (card.due.raw(), card.id)),
        FilteredOrder::DuePriority => cards.sort_by(|a, b| {
            due_priority(a, today)
                .partial_cmp(&due_priority(b, today))
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        }),
    }
}

/// Overdue reviews first, weighted by how overdue they are relative to
/// their interval; everything else after, by due.
fn due_priority(card: &Card, today: u32) -> f64 {
    match card.due {
        Due::Day(day) if card.queue == CardQueue::Review && day as i64 <= today as i64 => {
            let overdue = today as f64 - day as f64 + 0.001;
            card.interval as f64 / overdue
        }
        due => 100_000.0 + due.raw() as f64,
    }
}

impl<S> Scheduler<S>
where
    S: CollectionStore,
    SchedulerError: From<S::Error>,
{
    /// Return the deck's cards home, then pull in fresh ones per its terms.
    /// Returns how many cards were moved in.
    pub fn rebuild_filtered_deck(&mut self, deck_id: DeckId) -> Result<usize> {
        let deck = self
            .store
            .get_deck(deck_id)?
            .ok_or(SchedulerError::DeckNotFound(deck_id))?;
        let filtered = deck
            .filtered()
            .cloned()
            .ok_or(SchedulerError::NotFilteredDeck(deck_id))?;
        let timing = self.timing()?;

        let moved = self.transact(|sched| {
            sched.return_cards_home(deck_id)?;
            sched.fill_filtered_deck(deck_id, &filtered, timing.days_elapsed, timing.next_day_at)
        })?;
        info!(deck_id, name = %deck.name, count = moved, "rebuilt filtered deck");
        self.invalidate();
        Ok(moved)
    }

    /// Send every card in the deck back to its home deck. Returns how many
    /// cards were returned.
    pub fn empty_filtered_deck(&mut self, deck_id: DeckId) -> Result<usize> {
        self.filtered_deck(deck_id)?;
        let returned = self.transact(|sched| sched.return_cards_home(deck_id))?;
        info!(deck_id, count = returned, "emptied filtered deck");
        self.invalidate();
        Ok(returned)
    }

    /// Empty the deck and delete it.
    pub fn remove_filtered_deck(&mut self, deck_id: DeckId) -> Result<usize> {
        self.filtered_deck(deck_id)?;
        let returned = self.transact(|sched| {
            let returned = sched.return_cards_home(deck_id)?;
            sched.store.remove_deck(deck_id)?;
            Ok(returned)
        })?;
        info!(deck_id, count = returned, "removed filtered deck");
        self.invalidate();
        Ok(returned)
    }

    fn filtered_deck(&self, deck_id: DeckId) -> Result<FilteredDeck> {
        self.store
            .get_deck(deck_id)?
            .ok_or(SchedulerError::DeckNotFound(deck_id))?
            .filtered()
            .cloned()
            .ok_or(SchedulerError::NotFilteredDeck(deck_id))
    }

    fn return_cards_home(&mut self, deck_id: DeckId) -> Result<usize> {
        let now = self.clock.now_secs();
        let cards = self.store.query_cards(&CardQuery::deck(deck_id))?;
        for mut card in cards.iter().cloned() {
            card.remove_from_filtered_deck_restoring_due();
            card.modified = now;
            self.store.update_card(&card)?;
        }
        Ok(cards.len())
    }

    fn fill_filtered_deck(
        &mut self,
        deck_id: DeckId,
        filtered: &FilteredDeck,
        today: u32,
        day_cutoff: i64,
    ) -> Result<usize> {
        let now = self.clock.now_secs();
        let mut taken: HashSet<CardId> = HashSet::new();
        let mut position = FILTERED_POSITION_BASE;

        for (index, term) in filtered.terms.iter().enumerate() {
            let mut candidates: Vec<Card> = self
                .term_candidates(&term.filter, today, day_cutoff)?
                .into_iter()
                .filter(|card| !taken.contains(&card.id))
                .collect();
            order_filtered_cards(&mut candidates, term.order, today);
            candidates.truncate(term.limit);
            debug!(deck_id, term = index, count = candidates.len(), "filled term");

            for mut card in candidates {
                taken.insert(card.id);
                move_into_filtered(&mut card, deck_id, position, filtered.reschedule);
                card.modified = now;
                self.store.update_card(&card)?;
                position += 1;
            }
        }
        Ok(taken.len())
    }

    fn term_candidates(&self, filter: &CardFilter, today: u32, day_cutoff: i64) -> Result<Vec<Card>> {
        let decks = self.source_decks(filter)?;
        if decks.is_empty() {
            return Ok(Vec::new());
        }
        let base = CardQuery::in_decks(decks).exclude_filtered();
        let tomorrow = today as i64 + 1;
        let cards = match filter.kind {
            FilterKind::All => self.store.query_cards(&base.queues([
                CardQueue::New,
                CardQueue::Learning,
                CardQueue::Review,
                CardQueue::DayLearn,
            ]))?,
            FilterKind::New => self.store.query_cards(&base.queues([CardQueue::New]))?,
            FilterKind::Due => {
                let mut cards = self.store.query_cards(
                    &base
                        .clone()
                        .queues([CardQueue::Review, CardQueue::DayLearn])
                        .due_before(tomorrow),
                )?;
                cards.extend(
                    self.store.query_cards(
                        &base.queues([CardQueue::Learning]).due_before(day_cutoff),
                    )?,
                );
                cards
            }
            FilterKind::Learning => self
                .store
                .query_cards(&base.queues([CardQueue::Learning, CardQueue::DayLearn]))?,
            FilterKind::Lapsed { min_lapses } => self.store.query_cards(
                &base
                    .queues([
                        CardQueue::Learning,
                        CardQueue::Review,
                        CardQueue::DayLearn,
                    ])
                    .min_lapses(min_lapses.max(1)),
            )?,
        };
        Ok(cards)
    }

    /// Normal decks a term searches: the listed decks with their children,
    /// or every normal deck.
    fn source_decks(&self, filter: &CardFilter) -> Result<Vec<DeckId>> {
        let decks = self.store.all_decks()?;
        let normal: HashSet<DeckId> = decks
            .iter()
            .filter(|deck| !deck.is_filtered())
            .map(|deck| deck.id)
            .collect();
        let mut ids = Vec::new();
        if filter.decks.is_empty() {
            ids.extend(decks.iter().filter(|d| normal.contains(&d.id)).map(|d| d.id));
        } else {
            for &root in &filter.decks {
                for id in crate::deck::active_deck_ids(&decks, root) {
                    if normal.contains(&id) && !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
        Ok(ids)
    }
}

/// Park a card in a filtered deck, remembering where it came from.
///
/// Previewing decks show every card from the review queue. Otherwise new
/// and review cards take a position in the deck while learning cards keep
/// their timing.
fn move_into_filtered(card: &mut Card, deck_id: DeckId, position: i32, reschedule: bool) {
    card.original_deck_id = Some(card.deck_id);
    card.original_due = Some(card.due);
    card.deck_id = deck_id;
    if !reschedule {
        card.queue = CardQueue::Review;
        card.due = Due::Position(position);
    } else if matches!(card.queue, CardQueue::New | CardQueue::Review) {
        card.due = Due::Position(position);
    }
}
