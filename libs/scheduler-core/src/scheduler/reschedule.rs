//! Manual rescheduling: due dates, forgetting, new card positions and
//! daily limit extensions.

use super::Scheduler;
use crate::algorithm::fuzz::{card_rng, day_rng};
use crate::error::{Result, SchedulerError};
use crate::store::{CardQuery, CollectionStore};
use crate::types::{
    Card, CardId, CardQueue, CardType, DeckId, Due, LearningProgress, NoteId, RevlogEntry,
    RevlogKind,
};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// A parsed due date: a number of days from today, or a range to pick
/// from at random. `set_interval` comes from a trailing `!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueDateSpec {
    pub min_days: u32,
    pub max_days: u32,
    pub set_interval: bool,
}

/// Parse `"N"`, `"A..B"` and either form followed by `!`.
pub fn parse_due_date(input: &str) -> Result<DueDateSpec> {
    let invalid = || SchedulerError::InvalidDueDate(input.to_string());
    let trimmed = input.trim();
    let (body, set_interval) = match trimmed.strip_suffix('!') {
        Some(body) => (body, true),
        None => (trimmed, false),
    };
    let number = |s: &str| -> Result<u32> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        s.parse().map_err(|_| invalid())
    };
    let (min_days, max_days) = match body.split_once("..") {
        Some((a, b)) => {
            let (a, b) = (number(a)?, number(b)?);
            (a.min(b), a.max(b))
        }
        None => {
            let n = number(body)?;
            (n, n)
        }
    };
    Ok(DueDateSpec {
        min_days,
        max_days,
        set_interval,
    })
}

/// Make `card` a review due `days` from today.
///
/// Review cards keep their interval shifted by however much earlier or later
/// they now come due. Relearning cards keep the larger of their interval and
/// `days`; anything else, or any card when `set_interval` is given, gets
/// `days` as its interval.
fn set_card_due_date(card: &mut Card, today: u32, days: u32, set_interval: bool, initial_ease: u32) {
    let new_due = today as i64 + days as i64;
    let current_review_due = match (card.card_type, card.original_or_current_due()) {
        (CardType::Review, Due::Day(day)) => Some(day as i64),
        _ => None,
    };
    let interval = if set_interval {
        days
    } else if let Some(old_due) = current_review_due {
        (card.interval as i64 - (old_due - new_due)).max(0) as u32
    } else if card.card_type == CardType::Relearning {
        card.interval.max(days)
    } else {
        days
    };

    card.remove_from_filtered_deck();
    card.interval = interval.max(1);
    card.due = Due::Day(new_due as i32);
    card.card_type = CardType::Review;
    card.queue = CardQueue::Review;
    card.remaining_steps = LearningProgress::default();
    if card.ease_factor == 0 {
        card.ease_factor = initial_ease;
    }
}

/// Options for [`Scheduler::reschedule_as_new`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescheduleAsNewOptions {
    /// Also zero the review and lapse counts.
    pub reset_counts: bool,
}

impl<S> Scheduler<S>
where
    S: CollectionStore,
    SchedulerError: From<S::Error>,
{
    /// Turn cards into reviews due in the given number of days, e.g. `"3"`,
    /// `"1..7"` or `"0!"`. Each card in a range gets its own random day.
    pub fn set_due_date(&mut self, card_ids: &[CardId], spec: &str) -> Result<usize> {
        let spec = parse_due_date(spec)?;
        let today = self.timing()?.days_elapsed;
        let now = self.clock.now_secs();
        let now_ms = self.clock.now_millis();

        let changed = self.transact(|sched| {
            let mut changed = 0;
            for &card_id in card_ids {
                let Some(original) = sched.store.get_card(card_id)? else {
                    continue;
                };
                let initial_ease = sched
                    .store
                    .deck_config_for(original.home_deck_id())?
                    .new
                    .initial_ease;
                let days = card_rng(card_id, today).gen_range(spec.min_days..=spec.max_days);

                let mut card = original.clone();
                set_card_due_date(&mut card, today, days, spec.set_interval, initial_ease);
                card.modified = now;
                sched.store.update_card(&card)?;
                sched.log_manual(now_ms, &original, &card)?;
                changed += 1;
            }
            Ok(changed)
        })?;
        info!(
            count = changed,
            min_days = spec.min_days,
            max_days = spec.max_days,
            "set due date"
        );
        self.invalidate();
        Ok(changed)
    }

    /// Forget cards: they become new again, placed at the end of the new
    /// queue with one position per note.
    pub fn reschedule_as_new(
        &mut self,
        card_ids: &[CardId],
        options: RescheduleAsNewOptions,
    ) -> Result<usize> {
        let now = self.clock.now_secs();
        let now_ms = self.clock.now_millis();

        let changed = self.transact(|sched| {
            let mut next_position = sched.store.max_new_position()? + 1;
            let mut note_positions: HashMap<NoteId, i32> = HashMap::new();
            let mut changed = 0;
            for &card_id in card_ids {
                let Some(original) = sched.store.get_card(card_id)? else {
                    continue;
                };
                let position = *note_positions.entry(original.note_id).or_insert_with(|| {
                    next_position += 1;
                    next_position - 1
                });

                let mut card = original.clone();
                card.remove_from_filtered_deck();
                card.card_type = CardType::New;
                card.queue = CardQueue::New;
                card.due = Due::Position(position);
                card.interval = 0;
                card.ease_factor = 0;
                card.remaining_steps = LearningProgress::default();
                if options.reset_counts {
                    card.reps = 0;
                    card.lapses = 0;
                }
                card.modified = now;
                sched.store.update_card(&card)?;
                sched.log_manual(now_ms, &original, &card)?;
                changed += 1;
            }
            Ok(changed)
        })?;
        info!(count = changed, "rescheduled cards as new");
        self.invalidate();
        Ok(changed)
    }

    /// Give new cards positions `start`, `start + step`, ... one per note,
    /// in the order given or shuffled. With `shift`, other new cards at or
    /// after `start` move back to make room.
    pub fn reposition_new_cards(
        &mut self,
        card_ids: &[CardId],
        start: i32,
        step: i32,
        shuffle: bool,
        shift: bool,
    ) -> Result<usize> {
        let today = self.timing()?.days_elapsed;
        let now = self.clock.now_secs();

        let changed = self.transact(|sched| {
            let mut cards = Vec::new();
            for &card_id in card_ids {
                if let Some(card) = sched.store.get_card(card_id)? {
                    if card.card_type == CardType::New {
                        cards.push(card);
                    }
                }
            }
            let mut notes: Vec<NoteId> = Vec::new();
            for card in &cards {
                if !notes.contains(&card.note_id) {
                    notes.push(card.note_id);
                }
            }
            if notes.is_empty() {
                return Ok(0);
            }
            if shuffle {
                notes.shuffle(&mut day_rng(today));
            }
            let positions: HashMap<NoteId, i32> = notes
                .iter()
                .enumerate()
                .map(|(index, &note)| (note, start + index as i32 * step))
                .collect();
            let high = start + (notes.len() as i32 - 1) * step;

            if shift {
                let moving: HashSet<CardId> = cards.iter().map(|card| card.id).collect();
                let others: Vec<Card> = sched
                    .store
                    .query_cards(&CardQuery::default().queues([CardQueue::New]))?
                    .into_iter()
                    .filter(|card| !moving.contains(&card.id) && card.due.raw() >= start as i64)
                    .collect();
                if let Some(low) = others.iter().map(|card| card.due.raw()).min() {
                    let shift_by = high as i64 - low + 1;
                    for mut card in others {
                        card.due = Due::Position((card.due.raw() + shift_by) as i32);
                        card.modified = now;
                        sched.store.update_card(&card)?;
                    }
                }
            }

            let changed = cards.len();
            for mut card in cards {
                let position = positions[&card.note_id];
                if card.is_filtered() {
                    card.original_due = Some(Due::Position(position));
                } else {
                    card.due = Due::Position(position);
                }
                card.modified = now;
                sched.store.update_card(&card)?;
            }
            Ok(changed)
        })?;
        info!(count = changed, start, step, shuffle, shift, "repositioned new cards");
        self.invalidate();
        Ok(changed)
    }

    /// Allow `new` more new cards and `review` more reviews today in a deck,
    /// its ancestors and its children.
    pub fn extend_limits(&mut self, deck_id: DeckId, new: i32, review: i32) -> Result<()> {
        let today = self.timing()?.days_elapsed;
        let mut targets = self.store.active_deck_ids(deck_id)?;
        if targets.is_empty() {
            return Err(SchedulerError::DeckNotFound(deck_id));
        }
        targets.extend(self.store.ancestor_decks(deck_id)?.iter().map(|deck| deck.id));

        self.transact(|sched| {
            for id in &targets {
                if let Some(mut deck) = sched.store.get_deck(*id)? {
                    deck.today.record(today, -new, -review, 0);
                    sched.store.update_deck(&deck)?;
                }
            }
            Ok(())
        })?;
        info!(deck_id, new, review, "extended today's limits");
        self.invalidate();
        Ok(())
    }

    fn log_manual(&mut self, now_ms: i64, original: &Card, card: &Card) -> Result<()> {
        self.store.insert_revlog(&RevlogEntry {
            id: now_ms,
            card_id: card.id,
            usn: -1,
            ease: 0,
            interval: card.interval as i32,
            last_interval: original.interval as i32,
            ease_factor: card.ease_factor,
            time_taken_ms: 0,
            kind: RevlogKind::Manual,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::INITIAL_EASE_FACTOR;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_single_days_and_ranges() {
        let spec = parse_due_date("5").unwrap();
        assert_eq!((spec.min_days, spec.max_days, spec.set_interval), (5, 5, false));
        let spec = parse_due_date("50..70").unwrap();
        assert_eq!((spec.min_days, spec.max_days), (50, 70));
        let spec = parse_due_date("70..50").unwrap();
        assert_eq!((spec.min_days, spec.max_days), (50, 70));
        let spec = parse_due_date("0!").unwrap();
        assert_eq!((spec.min_days, spec.max_days, spec.set_interval), (0, 0, true));
        let spec = parse_due_date(" 3..4! ").unwrap();
        assert_eq!((spec.min_days, spec.max_days, spec.set_interval), (3, 4, true));
    }

    #[test]
    fn rejects_malformed_due_dates() {
        for input in ["", "x", "-5", "1..", "..3", "1...3", "1..x", "!", "5!!"] {
            assert!(
                matches!(parse_due_date(input), Err(SchedulerError::InvalidDueDate(_))),
                "{input:?} should not parse"
            );
        }
    }

    #[test]
    fn due_date_converts_and_shifts_reviews() {
        let mut card = Card::new(1, 1, 1, 0, 3);

        set_card_due_date(&mut card, 5, 2, false, INITIAL_EASE_FACTOR);
        assert_eq!(card.card_type, CardType::Review);
        assert_eq!(card.queue, CardQueue::Review);
        assert_eq!(card.due, Due::Day(7));
        assert_eq!(card.interval, 2);
        assert_eq!(card.ease_factor, INITIAL_EASE_FACTOR);

        // day 7 moved to day 9: two days later than planned
        set_card_due_date(&mut card, 6, 3, false, INITIAL_EASE_FACTOR);
        assert_eq!(card.due, Due::Day(9));
        assert_eq!(card.interval, 4);

        // and back again
        set_card_due_date(&mut card, 6, 1, false, INITIAL_EASE_FACTOR);
        assert_eq!(card.due, Due::Day(7));
        assert_eq!(card.interval, 2);
    }

    #[test]
    fn due_date_leaves_filtered_decks() {
        let mut card = Card::new(1, 1, 1, 0, 3);
        set_card_due_date(&mut card, 5, 2, false, INITIAL_EASE_FACTOR);
        card.original_due = Some(Due::Day(7));
        card.original_deck_id = Some(1);
        card.deck_id = 2;
        card.due = Due::Position(-10_000);
        card.queue = CardQueue::New;

        set_card_due_date(&mut card, 6, 1, false, INITIAL_EASE_FACTOR);
        assert_eq!(card.due, Due::Day(7));
        assert_eq!(card.interval, 2);
        assert_eq!(card.queue, CardQueue::Review);
        assert_eq!(card.deck_id, 1);
        assert_eq!(card.original_due, None);
        assert_eq!(card.original_deck_id, None);
    }

    #[test]
    fn relearning_keeps_the_longer_interval() {
        let mut card = Card::new(1, 1, 1, 0, 3);
        card.card_type = CardType::Relearning;
        card.queue = CardQueue::Learning;
        card.due = Due::Deadline(1_700_000_000);
        card.interval = 2;
        card.ease_factor = 2100;

        set_card_due_date(&mut card, 6, 10, false, INITIAL_EASE_FACTOR);
        assert_eq!(card.due, Due::Day(16));
        assert_eq!(card.interval, 10);

        card.card_type = CardType::Relearning;
        set_card_due_date(&mut card, 6, 1, false, INITIAL_EASE_FACTOR);
        assert_eq!(card.due, Due::Day(7));
        assert_eq!(card.interval, 10);
        assert_eq!(card.ease_factor, 2100);
    }

    #[test]
    fn bang_sets_the_interval_outright() {
        let mut card = Card::new(1, 1, 1, 0, 3);
        set_card_due_date(&mut card, 5, 30, false, INITIAL_EASE_FACTOR);
        set_card_due_date(&mut card, 10, 3, true, INITIAL_EASE_FACTOR);
        assert_eq!(card.due, Due::Day(13));
        assert_eq!(card.interval, 3);

        set_card_due_date(&mut card, 10, 0, true, INITIAL_EASE_FACTOR);
        assert_eq!(card.due, Due::Day(10));
        assert_eq!(card.interval, 1);
    }
}
