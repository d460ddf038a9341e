//! Learning and relearning step ladders.

use crate::types::LearningProgress;

/// Delay used when a ladder has no steps at all.
const FALLBACK_DELAY_SECS: u32 = 60;

/// A ladder of step delays, configured in minutes.
#[derive(Debug, Clone, Copy)]
pub struct LearningSteps<'a> {
    minutes: &'a [f32],
}

impl<'a> LearningSteps<'a> {
    pub fn new(minutes: &'a [f32]) -> Self {
        Self { minutes }
    }

    pub fn len(&self) -> u32 {
        self.minutes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
    }

    fn secs(minutes: f32) -> u32 {
        (minutes.max(0.0) * 60.0).round() as u32
    }

    /// Delay of the step a card with `remaining` steps left is on. Counts
    /// outside the ladder fall back to the first step.
    pub fn delay_for_remaining(&self, remaining: u32) -> u32 {
        let len = self.len();
        let index = if remaining >= 1 && remaining <= len {
            (len - remaining) as usize
        } else {
            0
        };
        self.minutes
            .get(index)
            .map(|m| Self::secs(*m))
            .unwrap_or(FALLBACK_DELAY_SECS)
    }

    /// Delay after answering Hard: halfway between the current step and the
    /// larger of it and the next one.
    pub fn delay_for_repeat(&self, remaining: u32) -> u32 {
        let current = self.delay_for_remaining(remaining);
        let next = if self.len() > 1 {
            self.delay_for_remaining(remaining.saturating_sub(1))
        } else {
            current * 2
        };
        (current + current.max(next)) / 2
    }

    /// How many of the last `remaining` steps fit before the day cutoff,
    /// counting the step about to be taken.
    pub fn remaining_today(&self, remaining: u32, now: i64, day_cutoff: i64) -> u32 {
        let skip = self.minutes.len().saturating_sub(remaining as usize);
        let mut at = now;
        let mut fitted = 0;
        for (i, minutes) in self.minutes[skip..].iter().enumerate() {
            at += Self::secs(*minutes) as i64;
            if at > day_cutoff {
                break;
            }
            fitted = i as u32;
        }
        fitted + 1
    }

    /// Progress of a card entering the ladder.
    pub fn starting_progress(&self, now: i64, day_cutoff: i64) -> LearningProgress {
        let total = self.len();
        LearningProgress::new(self.remaining_today(total, now, day_cutoff), total)
    }

    /// Progress after completing one step.
    pub fn advance(&self, progress: LearningProgress, now: i64, day_cutoff: i64) -> LearningProgress {
        let total = progress.total.saturating_sub(1);
        LearningProgress::new(self.remaining_today(total, now, day_cutoff), total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STEPS: [f32; 3] = [1.0, 10.0, 60.0];

    #[test]
    fn delay_follows_remaining_count() {
        let steps = LearningSteps::new(&STEPS);
        assert_eq!(steps.delay_for_remaining(3), 60);
        assert_eq!(steps.delay_for_remaining(2), 600);
        assert_eq!(steps.delay_for_remaining(1), 3600);
        assert_eq!(steps.delay_for_remaining(0), 60);
        assert_eq!(steps.delay_for_remaining(9), 60);
        assert_eq!(LearningSteps::new(&[]).delay_for_remaining(1), 60);
    }

    #[test]
    fn repeat_delay_averages_towards_next_step() {
        let steps = LearningSteps::new(&STEPS);
        assert_eq!(steps.delay_for_repeat(3), 330);
        assert_eq!(steps.delay_for_repeat(1), 3600);
        let single = [10.0];
        assert_eq!(LearningSteps::new(&single).delay_for_repeat(1), 900);
    }

    #[test]
    fn remaining_today_stops_at_cutoff() {
        let steps = LearningSteps::new(&STEPS);
        let now = 1_000_000;
        assert_eq!(steps.remaining_today(3, now, now + 100_000), 3);
        assert_eq!(steps.remaining_today(3, now, now + 700), 2);
        // Steps that cannot fit still count the one being taken.
        assert_eq!(steps.remaining_today(3, now, now + 10), 1);
        assert_eq!(steps.remaining_today(1, now, now + 100_000), 1);
    }

    #[test]
    fn starting_and_advancing() {
        let steps = LearningSteps::new(&STEPS);
        let now = 1_000_000;
        let start = steps.starting_progress(now, now + 100_000);
        assert_eq!(start, LearningProgress::new(3, 3));
        assert_eq!(start.raw(), 3003);
        let next = steps.advance(start, now, now + 100_000);
        assert_eq!(next, LearningProgress::new(2, 2));
    }
}
