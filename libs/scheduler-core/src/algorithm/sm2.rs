//! SM-2 derived scheduler with learning steps, relearning, filtered deck
//! previews and early reviews.

use super::fuzz::{card_rng, fuzzed_interval, learning_jitter};
use super::steps::LearningSteps;
use super::{AnswerOutcome, RevlogDraft, SchedulingContext, SpacedRepetitionAlgorithm};
use crate::config::{EffectiveConfig, LapseConfig, ReviewConfig};
use crate::error::{Result, SchedulerError};
use crate::leech::{self, LeechOutcome};
use crate::types::{
    Card, CardQueue, CardType, Due, LearningProgress, Rating, RevlogKind, MINIMUM_EASE_FACTOR,
};
use rand::rngs::StdRng;

const SECS_PER_DAY: u64 = 86_400;

/// Ease lost on a lapse, in permille.
const LAPSE_EASE_PENALTY: u32 = 200;

#[derive(Debug, Clone, Copy, Default)]
pub struct Sm2;

impl SpacedRepetitionAlgorithm for Sm2 {
    fn name(&self) -> &'static str {
        "sm2"
    }

    fn answer(
        &self,
        card: &Card,
        rating: Rating,
        config: &EffectiveConfig,
        ctx: &SchedulingContext,
    ) -> Result<AnswerOutcome> {
        if config.is_previewing() {
            return Ok(Answering::new(card, config, ctx).answer_preview(rating));
        }

        let mut answering = Answering::new(card, config, ctx);
        answering.card.reps += 1;
        answering.rng = card_rng(card.id, answering.card.reps);

        let introduced_new = answering.card.queue == CardQueue::New;
        if introduced_new {
            answering.card.queue = CardQueue::Learning;
            answering.card.card_type = CardType::Learning;
            answering.card.remaining_steps = answering
                .ladder()
                .starting_progress(ctx.now, ctx.day_cutoff);
        }

        let (revlog, counted_review, leech) = match answering.card.queue {
            CardQueue::Learning | CardQueue::DayLearn => {
                (answering.answer_learning(rating), false, LeechOutcome::NotLeech)
            }
            CardQueue::Review => {
                let (revlog, leech) = answering.answer_review(rating);
                (revlog, true, leech)
            }
            queue => {
                return Err(SchedulerError::InvalidQueue {
                    card_id: card.id,
                    queue,
                })
            }
        };

        // Once answered, the due saved by a filtered deck no longer applies.
        answering.card.original_due = None;

        Ok(AnswerOutcome {
            card: answering.card,
            revlog,
            introduced_new,
            counted_review,
            leech,
        })
    }

    fn next_interval_secs(
        &self,
        card: &Card,
        rating: Rating,
        config: &EffectiveConfig,
        ctx: &SchedulingContext,
    ) -> u64 {
        if let Some(settings) = config.filtered.filter(|_| config.is_previewing()) {
            return match rating {
                Rating::Again => settings.preview_delay_secs as u64,
                _ => 0,
            };
        }

        match card.queue {
            CardQueue::New | CardQueue::Learning | CardQueue::DayLearn => {
                next_learning_secs(card, rating, config, ctx)
            }
            _ if rating == Rating::Again => {
                let steps = LearningSteps::new(&config.lapse.steps);
                if steps.is_empty() {
                    lapse_interval(card, &config.lapse) as u64 * SECS_PER_DAY
                } else {
                    steps.delay_for_remaining(steps.len()) as u64
                }
            }
            _ => {
                let days = if is_early_review(card, ctx.today) {
                    early_review_interval(card, rating, &config.review, ctx.today)
                } else {
                    next_review_interval(card, rating, &config.review, ctx.today, None)
                };
                days as u64 * SECS_PER_DAY
            }
        }
    }
}

/// Mutable state for a single answer.
struct Answering<'a> {
    card: Card,
    config: &'a EffectiveConfig,
    ctx: &'a SchedulingContext,
    rng: StdRng,
}

impl<'a> Answering<'a> {
    fn new(card: &Card, config: &'a EffectiveConfig, ctx: &'a SchedulingContext) -> Self {
        Self {
            card: card.clone(),
            config,
            ctx,
            rng: card_rng(card.id, card.reps),
        }
    }

    /// Steps for the ladder the card is on: relearning for cards that have
    /// graduated before, learning otherwise.
    fn ladder(&self) -> LearningSteps<'a> {
        let config = self.config;
        if self.card.card_type.is_review_or_relearning() {
            LearningSteps::new(&config.lapse.steps)
        } else {
            LearningSteps::new(&config.new.steps)
        }
    }

    fn answer_preview(mut self, rating: Rating) -> AnswerOutcome {
        let delay = self
            .config
            .filtered
            .map(|settings| settings.preview_delay_secs)
            .unwrap_or_default();
        let last_interval = self.card.interval as i32;
        let interval = if rating == Rating::Again {
            self.card.queue = CardQueue::PreviewRepeat;
            self.card.due = Due::Deadline(self.ctx.now + delay as i64);
            -(delay as i32)
        } else {
            self.card.remove_from_filtered_deck_restoring_due();
            self.card.interval as i32
        };

        AnswerOutcome {
            revlog: RevlogDraft {
                ease: rating.to_value(),
                interval,
                last_interval,
                ease_factor: self.card.ease_factor,
                kind: RevlogKind::Cram,
            },
            card: self.card,
            introduced_new: false,
            counted_review: false,
            leech: LeechOutcome::NotLeech,
        }
    }

    fn answer_learning(&mut self, rating: Rating) -> RevlogDraft {
        let kind = match self.card.card_type {
            CardType::New | CardType::Learning => RevlogKind::Learning,
            CardType::Review | CardType::Relearning => RevlogKind::Relearning,
        };
        let ladder = self.ladder();
        let last_left = self.card.remaining_steps;

        let leaving = match rating {
            Rating::Easy => {
                self.graduate(true);
                true
            }
            Rating::Good if last_left.total <= 1 => {
                self.graduate(false);
                true
            }
            Rating::Good => {
                self.card.remaining_steps =
                    ladder.advance(last_left, self.ctx.now, self.ctx.day_cutoff);
                self.reschedule_learning(None);
                false
            }
            Rating::Hard => {
                let delay = ladder.delay_for_repeat(last_left.total);
                self.reschedule_learning(Some(delay));
                false
            }
            Rating::Again => {
                self.move_to_first_step();
                false
            }
        };

        let interval = if leaving {
            self.card.interval as i32
        } else {
            -(ladder.delay_for_remaining(self.card.remaining_steps.total) as i32)
        };
        RevlogDraft {
            ease: rating.to_value(),
            interval,
            last_interval: -(ladder.delay_for_remaining(last_left.total) as i32),
            ease_factor: self.card.ease_factor,
            kind,
        }
    }

    fn answer_review(&mut self, rating: Rating) -> (RevlogDraft, LeechOutcome) {
        let early = is_early_review(&self.card, self.ctx.today);
        let last_interval = self.card.interval as i32;

        let (interval, leech) = if rating == Rating::Again {
            let (delay, leech) = self.reschedule_lapse();
            let interval = if delay > 0 {
                -(delay as i32)
            } else {
                self.card.interval as i32
            };
            (interval, leech)
        } else {
            self.reschedule_review(rating, early);
            (self.card.interval as i32, LeechOutcome::NotLeech)
        };

        let revlog = RevlogDraft {
            ease: rating.to_value(),
            interval,
            last_interval,
            ease_factor: self.card.ease_factor,
            kind: if early {
                RevlogKind::Cram
            } else {
                RevlogKind::Review
            },
        };
        (revlog, leech)
    }

    /// Returns the relearning delay in seconds, or 0 when the card went
    /// straight back to review.
    fn reschedule_lapse(&mut self) -> (u32, LeechOutcome) {
        let config = self.config;
        let lapse = &config.lapse;
        self.card.lapses += 1;
        self.card.ease_factor = self
            .card
            .ease_factor
            .saturating_sub(LAPSE_EASE_PENALTY)
            .max(MINIMUM_EASE_FACTOR);

        let leech = leech::check_lapse(self.card.lapses, lapse);
        if !lapse.steps.is_empty() && !leech.suspends() {
            self.card.card_type = CardType::Relearning;
            return (self.move_to_first_step(), leech);
        }

        self.card.interval = lapse_interval(&self.card, lapse);
        self.graduate(false);
        if leech.suspends() {
            self.card.queue = CardQueue::Suspended;
        }
        (0, leech)
    }

    fn reschedule_review(&mut self, rating: Rating, early: bool) {
        let config = self.config;
        let review = &config.review;
        self.card.interval = if early {
            early_review_interval(&self.card, rating, review, self.ctx.today)
        } else {
            next_review_interval(
                &self.card,
                rating,
                review,
                self.ctx.today,
                Some(&mut self.rng),
            )
        };
        let delta: i64 = match rating {
            Rating::Hard => -150,
            Rating::Easy => 150,
            Rating::Good | Rating::Again => 0,
        };
        self.card.ease_factor =
            (self.card.ease_factor as i64 + delta).max(MINIMUM_EASE_FACTOR as i64) as u32;
        self.card.due = Due::Day(self.ctx.today as i32 + self.card.interval as i32);
        self.card.remove_from_filtered_deck();
    }

    fn move_to_first_step(&mut self) -> u32 {
        self.card.remaining_steps = self
            .ladder()
            .starting_progress(self.ctx.now, self.ctx.day_cutoff);
        if self.card.card_type == CardType::Relearning {
            self.card.interval = lapse_interval(&self.card, &self.config.lapse);
        }
        self.reschedule_learning(None)
    }

    /// Place the card on its current step, or after `delay` seconds.
    /// Delays that end after the day cutoff move the card to the day
    /// learning queue.
    fn reschedule_learning(&mut self, delay: Option<u32>) -> u32 {
        let delay = delay.unwrap_or_else(|| {
            self.ladder()
                .delay_for_remaining(self.card.remaining_steps.total)
        });
        let due = self.ctx.now + delay as i64;
        if due < self.ctx.day_cutoff {
            let jitter = learning_jitter(delay, &mut self.rng) as i64;
            self.card.due = Due::Deadline((due + jitter).min(self.ctx.day_cutoff - 1));
            self.card.queue = CardQueue::Learning;
        } else {
            let ahead = (due - self.ctx.day_cutoff).div_euclid(SECS_PER_DAY as i64) + 1;
            self.card.due = Due::Day(self.ctx.today as i32 + ahead as i32);
            self.card.queue = CardQueue::DayLearn;
        }
        delay
    }

    /// Move a (re)learning card into review. `early` means it skipped its
    /// remaining steps.
    fn graduate(&mut self, early: bool) {
        if self.card.card_type.is_review_or_relearning() {
            if early {
                self.card.interval += 1;
            }
        } else {
            let new = &self.config.new;
            let ideal = if early {
                new.easy_interval
            } else {
                new.graduating_interval
            };
            self.card.interval = fuzzed_interval(ideal, &mut self.rng);
            self.card.ease_factor = new.initial_ease;
        }
        self.card.due = Due::Day(self.ctx.today as i32 + self.card.interval as i32);
        self.card.queue = CardQueue::Review;
        self.card.card_type = CardType::Review;
        self.card.remaining_steps = LearningProgress::default();
        self.card.remove_from_filtered_deck();
    }
}

/// A review answered from a filtered deck before its home due date.
fn is_early_review(card: &Card, today: u32) -> bool {
    card.is_filtered()
        && card.card_type == CardType::Review
        && matches!(card.original_due, Some(Due::Day(day)) if day > today as i32)
}

fn lapse_interval(card: &Card, lapse: &LapseConfig) -> u32 {
    let reduced = (card.interval as f64 * lapse.multiplier as f64) as u32;
    reduced.max(lapse.min_interval).max(1)
}

fn days_late(card: &Card, today: u32) -> u32 {
    match card.original_or_current_due() {
        Due::Day(day) => (today as i64 - day as i64).max(0) as u32,
        _ => 0,
    }
}

/// Apply the interval multiplier and optional fuzz, then keep the result
/// above `previous` and below the maximum interval.
fn constrained_interval(
    ivl: f64,
    review: &ReviewConfig,
    previous: u32,
    rng: Option<&mut StdRng>,
) -> u32 {
    let mut ivl = (ivl * review.interval_multiplier as f64) as u32;
    if let Some(rng) = rng {
        ivl = fuzzed_interval(ivl, rng);
    }
    ivl.max(previous + 1)
        .max(1)
        .min(review.max_interval.max(1))
}

fn next_review_interval(
    card: &Card,
    rating: Rating,
    review: &ReviewConfig,
    today: u32,
    mut rng: Option<&mut StdRng>,
) -> u32 {
    let late = days_late(card, today) as f64;
    let current = card.interval as f64;
    let ease = card.ease_factor as f64 / 1000.0;
    let hard_factor = review.hard_multiplier as f64;
    let hard_min = if hard_factor > 1.0 { card.interval } else { 0 };

    let hard = constrained_interval(current * hard_factor, review, hard_min, rng.as_deref_mut());
    if rating == Rating::Hard {
        return hard;
    }
    let good = constrained_interval(
        (current + (late / 2.0).floor()) * ease,
        review,
        hard,
        rng.as_deref_mut(),
    );
    if rating != Rating::Easy {
        return good;
    }
    constrained_interval(
        (current + late) * ease * review.easy_bonus as f64,
        review,
        good,
        rng,
    )
}

fn early_review_interval(card: &Card, rating: Rating, review: &ReviewConfig, today: u32) -> u32 {
    let original_due = card
        .original_due
        .and_then(Due::day)
        .unwrap_or(today as i32);
    let elapsed = card.interval as f64 - (original_due as f64 - today as f64);
    let ease = card.ease_factor as f64 / 1000.0;
    let easy_bonus = review.easy_bonus as f64;

    let (factor, min_new_interval, bonus) = match rating {
        // Hard may shrink the interval, but by no more than half the factor.
        Rating::Hard => {
            let hard = review.hard_multiplier as f64;
            (hard, hard / 2.0, 1.0)
        }
        Rating::Easy => (ease, 1.0, easy_bonus - (easy_bonus - 1.0) / 2.0),
        Rating::Good | Rating::Again => (ease, 1.0, 1.0),
    };
    let ivl = (elapsed * factor).max(1.0);
    let ivl = (card.interval as f64 * min_new_interval).max(ivl) * bonus;
    constrained_interval(ivl, review, 0, None)
}

fn next_learning_secs(
    card: &Card,
    rating: Rating,
    config: &EffectiveConfig,
    ctx: &SchedulingContext,
) -> u64 {
    let steps = if card.card_type.is_review_or_relearning() {
        LearningSteps::new(&config.lapse.steps)
    } else {
        LearningSteps::new(&config.new.steps)
    };
    let progress = if card.queue == CardQueue::New {
        steps.starting_progress(ctx.now, ctx.day_cutoff)
    } else {
        card.remaining_steps
    };
    let graduating_days = |early: bool| -> u64 {
        if card.card_type.is_review_or_relearning() {
            card.interval as u64 + early as u64
        } else if early {
            config.new.easy_interval as u64
        } else {
            config.new.graduating_interval as u64
        }
    };

    match rating {
        Rating::Again => steps.delay_for_remaining(steps.len()) as u64,
        Rating::Hard => steps.delay_for_repeat(progress.total) as u64,
        Rating::Easy => graduating_days(true) * SECS_PER_DAY,
        Rating::Good => {
            let left = progress.total.saturating_sub(1);
            if left == 0 {
                graduating_days(false) * SECS_PER_DAY
            } else {
                steps.delay_for_remaining(left) as u64
            }
        }
    }
}
