//! Leech detection.

use crate::config::{LapseConfig, LeechAction};

/// Tag added to the note of a card that turns into a leech.
pub const LEECH_TAG: &str = "leech";

/// What a lapse triggers, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeechOutcome {
    NotLeech,
    Tag,
    TagAndSuspend,
}

impl LeechOutcome {
    pub fn is_leech(self) -> bool {
        !matches!(self, Self::NotLeech)
    }

    pub fn suspends(self) -> bool {
        matches!(self, Self::TagAndSuspend)
    }
}

/// True on the lapse that reaches the threshold, then again every half
/// threshold after that.
pub fn is_leech(lapses: u32, threshold: u32) -> bool {
    if threshold == 0 || lapses < threshold {
        return false;
    }
    let every = (threshold / 2).max(1);
    (lapses - threshold) % every == 0
}

/// Check a card that has just lapsed.
pub fn check_lapse(lapses: u32, config: &LapseConfig) -> LeechOutcome {
    if !is_leech(lapses, config.leech_threshold) {
        return LeechOutcome::NotLeech;
    }
    match config.leech_action {
        LeechAction::Suspend => LeechOutcome::TagAndSuspend,
        LeechAction::TagOnly => LeechOutcome::Tag,
    }
}
