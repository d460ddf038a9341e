//! Command handlers. Each writes its report to `out`.

pub mod cards;
pub mod deck;
pub mod filtered;
pub mod study;

use crate::cli::Command;
use crate::db::SqliteRepository;
use anyhow::anyhow;
use scheduler_core::types::DeckId;
use scheduler_core::Scheduler;
use std::io::{BufRead, Write};

pub type StudyScheduler = Scheduler<SqliteRepository>;

/// Run one command against the collection.
pub fn dispatch(
    command: Command,
    repo: SqliteRepository,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut sched = Scheduler::new(repo, 1);
    match command {
        Command::Init {
            rollover_hour,
            new_spread,
            day_learn_first,
            bury_on_answer,
        } => deck::init(
            &mut sched,
            deck::CollectionChanges {
                rollover_hour,
                new_spread: new_spread.map(Into::into),
                day_learn_first,
                bury_on_answer,
            },
            out,
        ),
        Command::Deck(command) => deck::run(&mut sched, command, out),
        Command::Note(command) => deck::run_note(&mut sched, command, out),
        Command::Counts { deck } => study::counts(&mut sched, &deck, out),
        Command::Study { deck } => study::study(&mut sched, &deck, input, out),
        Command::PreviewIntervals { card } => study::preview_intervals(&sched, card, out),
        Command::Suspend { cards } => cards::suspend(&mut sched, &cards, out),
        Command::Unsuspend { cards } => cards::unsuspend(&mut sched, &cards, out),
        Command::Bury { ids, notes } => cards::bury(&mut sched, &ids, notes, out),
        Command::Unbury { deck, mode } => cards::unbury(&mut sched, &deck, mode.into(), out),
        Command::SetDue { spec, cards } => cards::set_due(&mut sched, &spec, &cards, out),
        Command::Forget {
            cards,
            reset_counts,
        } => cards::forget(&mut sched, &cards, reset_counts, out),
        Command::Reposition {
            cards,
            start,
            step,
            shuffle,
            shift,
        } => cards::reposition(&mut sched, &cards, start, step, shuffle, shift, out),
        Command::Filtered(command) => filtered::run(&mut sched, command, out),
        Command::ExtendLimits { deck, new, review } => {
            cards::extend_limits(&mut sched, &deck, new, review, out)
        }
    }
}

/// Look a deck up by its full name.
pub fn deck_id(sched: &StudyScheduler, name: &str) -> anyhow::Result<DeckId> {
    sched
        .store()
        .deck_by_name(name)?
        .map(|deck| deck.id)
        .ok_or_else(|| anyhow!("no such deck: {name}"))
}

/// Human readable interval, as shown on answer buttons.
pub fn format_interval(secs: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    match secs {
        0 => "end".to_string(),
        s if s < MINUTE => format!("{s}s"),
        s if s < HOUR => format!("{}m", s / MINUTE),
        s if s < DAY => format!("{}h", s / HOUR),
        s if s < 30 * DAY => format!("{}d", s / DAY),
        s if s < 365 * DAY => format!("{:.1}mo", s as f64 / (30.0 * DAY as f64)),
        s => format!("{:.1}y", s as f64 / (365.0 * DAY as f64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_intervals_by_magnitude() {
        assert_eq!(format_interval(0), "end");
        assert_eq!(format_interval(45), "45s");
        assert_eq!(format_interval(600), "10m");
        assert_eq!(format_interval(3 * 3600), "3h");
        assert_eq!(format_interval(4 * 86_400), "4d");
        assert_eq!(format_interval(45 * 86_400), "1.5mo");
        assert_eq!(format_interval(730 * 86_400), "2.0y");
    }
}
