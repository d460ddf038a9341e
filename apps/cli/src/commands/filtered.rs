//! Filtered deck commands.

use super::{deck_id, StudyScheduler};
use crate::cli::FilteredCommand;
use scheduler_core::deck::{CardFilter, FilteredTerm};
use scheduler_core::FilteredDeck;
use std::io::Write;

pub fn run(
    sched: &mut StudyScheduler,
    command: FilteredCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        FilteredCommand::Create {
            name,
            from,
            kind,
            min_lapses,
            limit,
            order,
            second_kind,
            second_limit,
            second_order,
            no_reschedule,
            preview_delay,
        } => {
            let decks = from
                .iter()
                .map(|name| deck_id(sched, name))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let mut terms = vec![FilteredTerm {
                filter: CardFilter {
                    decks: decks.clone(),
                    kind: kind.into_kind(min_lapses),
                },
                limit,
                order: order.into(),
            }];
            if let Some(second) = second_kind {
                terms.push(FilteredTerm {
                    filter: CardFilter {
                        decks,
                        kind: second.into_kind(min_lapses),
                    },
                    limit: second_limit,
                    order: second_order.into(),
                });
            }
            let filtered = FilteredDeck {
                terms,
                reschedule: !no_reschedule,
                preview_delay_mins: preview_delay,
            };
            let id = sched.store().add_filtered_deck(&name, filtered)?;
            let moved = sched.rebuild_filtered_deck(id)?;
            writeln!(out, "filtered deck {id}: {name} ({moved} cards)")?;
        }
        FilteredCommand::Rebuild { deck } => {
            let id = deck_id(sched, &deck)?;
            let moved = sched.rebuild_filtered_deck(id)?;
            writeln!(out, "rebuilt {deck} with {moved} cards")?;
        }
        FilteredCommand::Empty { deck } => {
            let id = deck_id(sched, &deck)?;
            let returned = sched.empty_filtered_deck(id)?;
            writeln!(out, "returned {returned} cards from {deck}")?;
        }
        FilteredCommand::Remove { deck } => {
            let id = deck_id(sched, &deck)?;
            let returned = sched.remove_filtered_deck(id)?;
            writeln!(out, "removed {deck}, returned {returned} cards")?;
        }
    }
    Ok(())
}
