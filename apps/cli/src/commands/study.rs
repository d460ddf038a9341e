//! Counts, the interactive study loop and interval previews.

use super::{deck_id, format_interval, StudyScheduler};
use anyhow::anyhow;
use scheduler_core::types::{Card, CardId};
use scheduler_core::{CollectionStore, SchedulerError};
use std::io::{BufRead, Write};

const BUTTON_LABELS: [&str; 4] = ["Again", "Hard", "Good", "Easy"];
const PREVIEW_LABELS: [&str; 2] = ["Again", "Done"];

pub fn counts(sched: &mut StudyScheduler, deck: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let id = deck_id(sched, deck)?;
    sched.select_deck(id);
    let counts = sched.counts()?;
    writeln!(
        out,
        "new {}  learning {}  review {}",
        counts.new, counts.learning, counts.review
    )?;
    Ok(())
}

/// Study until the deck is done, input ends, or `q` is entered.
pub fn study(
    sched: &mut StudyScheduler,
    deck: &str,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let id = deck_id(sched, deck)?;
    sched.select_deck(id);
    writeln!(out, "Studying {deck} ({})", sched.algorithm_name())?;
    let mut answered = 0;

    'cards: loop {
        let Some(card) = sched.get_next_card()? else {
            writeln!(out, "Nothing left to study today. Answered {answered} cards.")?;
            return Ok(());
        };
        show_card(sched, &card, out)?;

        loop {
            write!(out, "> ")?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(());
            }
            match line.trim() {
                "q" => return Ok(()),
                "u" => {
                    match sched.undo_last_answer() {
                        Ok(card) => {
                            answered -= 1;
                            writeln!(out, "undid answer to card {}", card.id)?;
                        }
                        Err(SchedulerError::NothingToUndo) => writeln!(out, "nothing to undo")?,
                        Err(err) => return Err(err.into()),
                    }
                    continue 'cards;
                }
                answer => {
                    let Ok(ease) = answer.parse::<u8>() else {
                        writeln!(out, "enter a button number, u or q")?;
                        continue;
                    };
                    match sched.answer_card(card.id, ease) {
                        Ok(updated) => {
                            answered += 1;
                            writeln!(
                                out,
                                "card {} -> {} due {}",
                                updated.id,
                                updated.queue.as_str(),
                                updated.due.raw()
                            )?;
                            continue 'cards;
                        }
                        Err(SchedulerError::InvalidEase { buttons, .. }) => {
                            writeln!(out, "choose 1-{buttons}")?;
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }
    }
}

fn show_card(sched: &mut StudyScheduler, card: &Card, out: &mut impl Write) -> anyhow::Result<()> {
    let counts = sched.counts_with(card)?;
    let note = sched
        .store()
        .note(card.note_id)?
        .ok_or_else(|| anyhow!("card {} has no note", card.id))?;
    writeln!(out)?;
    writeln!(
        out,
        "[{} new, {} learning, {} review]",
        counts.new, counts.learning, counts.review
    )?;
    writeln!(out, "card {} ({})", card.id, card.queue.as_str())?;
    writeln!(out, "{}", note.fields)?;
    writeln!(out, "{}", button_line(sched, card)?)?;
    Ok(())
}

fn button_line(sched: &StudyScheduler, card: &Card) -> anyhow::Result<String> {
    let buttons = sched.answer_buttons(card)?;
    let mut parts = Vec::with_capacity(buttons as usize);
    for ease in 1..=buttons {
        let secs = sched.next_interval_preview(card, ease)?;
        let labels: &[&str] = if buttons == 2 {
            &PREVIEW_LABELS
        } else {
            &BUTTON_LABELS
        };
        parts.push(format!(
            "{ease}) {} {}",
            labels[ease as usize - 1],
            format_interval(secs)
        ));
    }
    Ok(parts.join("   "))
}

pub fn preview_intervals(
    sched: &StudyScheduler,
    card_id: CardId,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let card = sched
        .store()
        .get_card(card_id)?
        .ok_or_else(|| anyhow!("no such card: {card_id}"))?;
    writeln!(out, "{}", button_line(sched, &card)?)?;
    Ok(())
}
