//! Daily new/review allowances across the deck tree.

use crate::deck::{ancestors, Deck};
use crate::types::DeckId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    New,
    Review,
}

/// Allowance left for a single deck, ignoring its ancestors.
pub fn remaining_single(per_day: u32, studied_today: i32) -> u32 {
    (per_day as i64 - studied_today as i64).max(0) as u32
}

/// Remaining allowance for every deck, where a deck can never exceed the
/// allowance of any of its ancestors.
#[derive(Debug, Clone, Default)]
pub struct LimitTracker {
    remaining: HashMap<DeckId, u32>,
    ancestors: HashMap<DeckId, Vec<DeckId>>,
}

impl LimitTracker {
    /// `per_day` supplies each deck's configured limit.
    pub fn build<F>(decks: &[Deck], today: u32, kind: LimitKind, per_day: F) -> Self
    where
        F: Fn(&Deck) -> u32,
    {
        let mut tracker = Self::default();
        for deck in decks {
            let counts = deck.today.for_day(today);
            let studied = match kind {
                LimitKind::New => counts.new_studied,
                LimitKind::Review => counts.review_studied,
            };
            tracker
                .remaining
                .insert(deck.id, remaining_single(per_day(deck), studied));
            tracker.ancestors.insert(
                deck.id,
                ancestors(decks, deck.id).iter().map(|d| d.id).collect(),
            );
        }
        tracker
    }

    /// Minimum of the deck's own allowance and those of its ancestors.
    /// Unknown decks have no allowance.
    pub fn remaining(&self, deck_id: DeckId) -> u32 {
        let Some(own) = self.remaining.get(&deck_id) else {
            return 0;
        };
        self.ancestors
            .get(&deck_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.remaining.get(id))
            .fold(*own, |acc, limit| acc.min(*limit))
    }

    /// Consume up to `n` from the deck and all of its ancestors, returning
    /// how many were granted.
    pub fn take(&mut self, deck_id: DeckId, n: u32) -> u32 {
        let granted = self.remaining(deck_id).min(n);
        if granted == 0 {
            return 0;
        }
        let chain: Vec<DeckId> = std::iter::once(deck_id)
            .chain(self.ancestors.get(&deck_id).into_iter().flatten().copied())
            .collect();
        for id in chain {
            if let Some(left) = self.remaining.get_mut(&id) {
                *left = left.saturating_sub(granted);
            }
        }
        granted
    }

    pub fn try_take_one(&mut self, deck_id: DeckId) -> bool {
        self.take(deck_id, 1) == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::DailyCounts;
    use pretty_assertions::assert_eq;

    fn tree() -> Vec<Deck> {
        let mut parent = Deck::new_normal(1, "Parent", 1);
        parent.today = DailyCounts {
            day: 10,
            new_studied: 2,
            ..DailyCounts::default()
        };
        vec![
            parent,
            Deck::new_normal(2, "Parent::Child", 2),
            Deck::new_normal(3, "Parent::Child::Leaf", 3),
            Deck::new_normal(4, "Other", 2),
        ]
    }

    fn per_day(deck: &Deck) -> u32 {
        match deck.config_id() {
            Some(1) => 5,
            Some(2) => 10,
            _ => 0,
        }
    }

    #[test]
    fn remaining_clamps_at_zero() {
        assert_eq!(remaining_single(5, 7), 0);
        assert_eq!(remaining_single(5, -3), 8);
        assert_eq!(remaining_single(0, 0), 0);
    }

    #[test]
    fn child_never_exceeds_ancestors() {
        let decks = tree();
        let tracker = LimitTracker::build(&decks, 10, LimitKind::New, per_day);
        assert_eq!(tracker.remaining(1), 3);
        assert_eq!(tracker.remaining(2), 3);
        assert_eq!(tracker.remaining(3), 0);
        assert_eq!(tracker.remaining(4), 10);
        for deck in &decks {
            for ancestor in ancestors(&decks, deck.id) {
                assert!(tracker.remaining(deck.id) <= tracker.remaining(ancestor.id));
            }
        }
    }

    #[test]
    fn stale_counts_are_ignored() {
        let decks = tree();
        let tracker = LimitTracker::build(&decks, 11, LimitKind::New, per_day);
        assert_eq!(tracker.remaining(1), 5);
    }

    #[test]
    fn taking_consumes_the_whole_chain() {
        let decks = tree();
        let mut tracker = LimitTracker::build(&decks, 10, LimitKind::New, per_day);
        assert_eq!(tracker.take(2, 2), 2);
        assert_eq!(tracker.remaining(1), 1);
        assert!(tracker.try_take_one(2));
        assert!(!tracker.try_take_one(2));
        assert!(!tracker.try_take_one(1));
        assert_eq!(tracker.remaining(4), 10);
    }
}
