//! Interval and ease calculation.

pub mod fuzz;
pub mod sm2;
pub mod steps;

use crate::config::EffectiveConfig;
use crate::error::Result;
use crate::leech::LeechOutcome;
use crate::types::{Card, Rating, RevlogKind};

/// Where "now" sits for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingContext {
    /// Collection day number.
    pub today: u32,
    /// Epoch seconds at which the next day starts.
    pub day_cutoff: i64,
    /// Epoch seconds.
    pub now: i64,
}

/// Revlog fields decided by the algorithm. Id, card and timing are filled
/// in by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevlogDraft {
    pub ease: u8,
    pub interval: i32,
    pub last_interval: i32,
    pub ease_factor: u32,
    pub kind: RevlogKind,
}

/// Result of answering a card.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub card: Card,
    pub revlog: RevlogDraft,
    /// The card was introduced from the new queue by this answer.
    pub introduced_new: bool,
    /// The answer counts against the daily review limit.
    pub counted_review: bool,
    pub leech: LeechOutcome,
}

/// Trait for spaced repetition algorithms.
pub trait SpacedRepetitionAlgorithm: Send + Sync {
    /// Algorithm identifier.
    fn name(&self) -> &'static str;

    /// Apply an answer to a card, returning the updated card and what to log.
    fn answer(
        &self,
        card: &Card,
        rating: Rating,
        config: &EffectiveConfig,
        ctx: &SchedulingContext,
    ) -> Result<AnswerOutcome>;

    /// Seconds until the card would next be shown after this answer,
    /// without fuzz. 0 means it leaves a preview deck.
    fn next_interval_secs(
        &self,
        card: &Card,
        rating: Rating,
        config: &EffectiveConfig,
        ctx: &SchedulingContext,
    ) -> u64;
}
