//! Card state changes outside of studying.

use super::{deck_id, StudyScheduler};
use scheduler_core::scheduler::RescheduleAsNewOptions;
use scheduler_core::types::CardId;
use scheduler_core::UnburyMode;
use std::io::Write;

pub fn suspend(sched: &mut StudyScheduler, cards: &[CardId], out: &mut impl Write) -> anyhow::Result<()> {
    let count = sched.suspend_cards(cards)?;
    writeln!(out, "suspended {count} cards")?;
    Ok(())
}

pub fn unsuspend(
    sched: &mut StudyScheduler,
    cards: &[CardId],
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let count = sched.unsuspend_cards(cards)?;
    writeln!(out, "unsuspended {count} cards")?;
    Ok(())
}

/// Bury cards, or every card of the given notes.
pub fn bury(
    sched: &mut StudyScheduler,
    ids: &[i64],
    notes: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let count = if notes {
        sched.bury_notes(ids)?
    } else {
        sched.bury_cards(ids)?
    };
    writeln!(out, "buried {count} cards")?;
    Ok(())
}

pub fn unbury(
    sched: &mut StudyScheduler,
    deck: &str,
    mode: UnburyMode,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let id = deck_id(sched, deck)?;
    let count = sched.unbury_deck(id, mode)?;
    writeln!(out, "unburied {count} cards ({})", mode.as_str())?;
    Ok(())
}

pub fn set_due(
    sched: &mut StudyScheduler,
    spec: &str,
    cards: &[CardId],
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let count = sched.set_due_date(cards, spec)?;
    writeln!(out, "rescheduled {count} cards")?;
    Ok(())
}

pub fn forget(
    sched: &mut StudyScheduler,
    cards: &[CardId],
    reset_counts: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let count = sched.reschedule_as_new(cards, RescheduleAsNewOptions { reset_counts })?;
    writeln!(out, "reset {count} cards to new")?;
    Ok(())
}

pub fn reposition(
    sched: &mut StudyScheduler,
    cards: &[CardId],
    start: i32,
    step: i32,
    shuffle: bool,
    shift: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let count = sched.reposition_new_cards(cards, start, step, shuffle, shift)?;
    writeln!(out, "repositioned {count} cards")?;
    Ok(())
}

pub fn extend_limits(
    sched: &mut StudyScheduler,
    deck: &str,
    new: i32,
    review: i32,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let id = deck_id(sched, deck)?;
    sched.extend_limits(id, new, review)?;
    writeln!(out, "extended today's limits by {new} new and {review} reviews")?;
    Ok(())
}
