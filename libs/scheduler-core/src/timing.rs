//! Study-day boundaries and the clock the scheduler reads time from.
//!
//! A study day starts at the collection's rollover hour in local time rather
//! than at midnight, so late-night reviews count towards the previous day.

use chrono::Local;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

const SECS_PER_DAY: i64 = 86_400;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Epoch milliseconds.
    fn now_millis(&self) -> i64;

    /// Offset of local time from UTC, in seconds.
    fn utc_offset_secs(&self) -> i32;

    fn now_secs(&self) -> i64 {
        self.now_millis().div_euclid(1000)
    }
}

/// Wall clock in the machine's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Local::now().timestamp_millis()
    }

    fn utc_offset_secs(&self) -> i32 {
        Local::now().offset().local_minus_utc()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
    offset_secs: i32,
}

impl ManualClock {
    pub fn new(now_secs: i64) -> Self {
        Self::with_offset(now_secs, 0)
    }

    pub fn with_offset(now_secs: i64, offset_secs: i32) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(now_secs * 1000)),
            offset_secs,
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.millis.fetch_add(secs * 1000, Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: i64) {
        self.advance_secs(days * SECS_PER_DAY);
    }

    pub fn set_secs(&self, secs: i64) {
        self.millis.store(secs * 1000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }

    fn utc_offset_secs(&self) -> i32 {
        self.offset_secs
    }
}

/// Where "now" falls in the collection's calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedTimingToday {
    /// Study days since the collection was created.
    pub days_elapsed: u32,
    /// Epoch seconds at which the next study day begins.
    pub next_day_at: i64,
}

impl SchedTimingToday {
    pub fn compute(
        created_secs: i64,
        now_secs: i64,
        utc_offset_secs: i32,
        rollover_hour: u32,
    ) -> Self {
        let shift = rollover_hour.min(23) as i64 * 3600 - utc_offset_secs as i64;
        let study_day = |secs: i64| (secs - shift).div_euclid(SECS_PER_DAY);

        let today = study_day(now_secs);
        let days_elapsed = (today - study_day(created_secs)).max(0) as u32;
        let next_day_at = (today + 1) * SECS_PER_DAY + shift;

        Self {
            days_elapsed,
            next_day_at,
        }
    }

    pub fn now(clock: &dyn Clock, created_secs: i64, rollover_hour: u32) -> Self {
        Self::compute(
            created_secs,
            clock.now_secs(),
            clock.utc_offset_secs(),
            rollover_hour,
        )
    }
}
