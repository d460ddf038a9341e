//! Option presets and filtered deck definitions used across tests.

use scheduler_core::config::LeechAction;
use scheduler_core::deck::{CardFilter, FilterKind, FilteredOrder, FilteredTerm};
use scheduler_core::types::DeckId;
use scheduler_core::{DeckConfig, FilteredDeck};

/// Two new cards a day, steps of 1 and 10 minutes.
pub fn two_new_per_day(config: &mut DeckConfig) {
    config.new.per_day = 2;
    config.new.steps = vec![1.0, 10.0];
    config.new.graduating_interval = 1;
    config.new.easy_interval = 4;
}

/// Lapses go straight back to review with half the interval.
pub fn no_relearning(config: &mut DeckConfig) {
    config.lapse.steps = Vec::new();
    config.lapse.multiplier = 0.5;
    config.lapse.min_interval = 1;
}

/// Suspend leeches at `threshold` lapses, without relearning steps.
pub fn suspending_leeches(threshold: u32) -> impl FnOnce(&mut DeckConfig) {
    move |config| {
        no_relearning(config);
        config.lapse.leech_threshold = threshold;
        config.lapse.leech_action = LeechAction::Suspend;
    }
}

pub fn bury_new_siblings(config: &mut DeckConfig) {
    config.new.bury = true;
    config.review.bury = true;
}

pub fn term(kind: FilterKind, order: FilteredOrder, limit: usize, decks: &[DeckId]) -> FilteredTerm {
    FilteredTerm {
        filter: CardFilter {
            decks: decks.to_vec(),
            kind,
        },
        limit,
        order,
    }
}

/// A rescheduling filtered deck pulling every studyable card.
pub fn cram_everything(decks: &[DeckId]) -> FilteredDeck {
    FilteredDeck {
        terms: vec![term(FilterKind::All, FilteredOrder::Due, 100, decks)],
        reschedule: true,
        preview_delay_mins: 10,
    }
}

/// A preview deck; answers never change home scheduling.
pub fn preview_everything(decks: &[DeckId], delay_mins: u32) -> FilteredDeck {
    FilteredDeck {
        terms: vec![term(FilterKind::All, FilteredOrder::Added, 100, decks)],
        reschedule: false,
        preview_delay_mins: delay_mins,
    }
}
