//! Collection, deck and note management.

use super::{deck_id, StudyScheduler};
use crate::cli::{DeckCommand, NoteCommand};
use anyhow::{anyhow, bail, Context};
use scheduler_core::config::{DeckConfig, NewCardSpread};
use scheduler_core::deck::DECK_SEPARATOR;
use scheduler_core::CollectionStore;
use std::io::Write;

/// Collection-wide preferences to change; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct CollectionChanges {
    pub rollover_hour: Option<u32>,
    pub new_spread: Option<NewCardSpread>,
    pub day_learn_first: Option<bool>,
    pub bury_on_answer: Option<bool>,
}

pub fn init(
    sched: &mut StudyScheduler,
    changes: CollectionChanges,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut config = sched.store().collection_config()?;
    if let Some(hour) = changes.rollover_hour {
        if hour > 23 {
            bail!("rollover hour must be 0-23, got {hour}");
        }
        config.rollover_hour = hour;
    }
    if let Some(spread) = changes.new_spread {
        config.new_spread = spread;
    }
    if let Some(first) = changes.day_learn_first {
        config.day_learn_first = first;
    }
    if let Some(on_answer) = changes.bury_on_answer {
        config.bury_siblings_on_answer = on_answer;
    }
    sched.store_mut().set_collection_config(&config)?;
    sched.reset();
    writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?;
    Ok(())
}

pub fn run(
    sched: &mut StudyScheduler,
    command: DeckCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        DeckCommand::Add { name, config } => {
            if sched.store().get_deck_config(config)?.is_none() {
                bail!("no such options group: {config}");
            }
            let id = sched.store().add_deck(&name, config)?;
            writeln!(out, "deck {id}: {name}")?;
        }
        DeckCommand::List => list(sched, out)?,
        DeckCommand::Config {
            deck,
            new_group,
            new_per_day,
            review_per_day,
            steps,
            lapse_steps,
            graduating_interval,
            easy_interval,
            leech_threshold,
            leech_action,
            bury_new,
            bury_review,
        } => {
            let id = deck_id(sched, &deck)?;
            let deck = sched
                .store()
                .get_deck(id)?
                .ok_or_else(|| anyhow!("no such deck: {deck}"))?;
            if deck.is_filtered() {
                bail!("{} is a filtered deck and has no options", deck.name);
            }
            let mut config = sched.store().deck_config_for(id)?;
            if let Some(n) = new_per_day {
                config.new.per_day = n;
            }
            if let Some(n) = review_per_day {
                config.review.per_day = n;
            }
            if let Some(steps) = steps {
                config.new.steps = parse_steps(&steps)?;
            }
            if let Some(steps) = lapse_steps {
                config.lapse.steps = parse_steps(&steps)?;
            }
            if let Some(days) = graduating_interval {
                config.new.graduating_interval = days;
            }
            if let Some(days) = easy_interval {
                config.new.easy_interval = days;
            }
            if let Some(threshold) = leech_threshold {
                config.lapse.leech_threshold = threshold;
            }
            if let Some(action) = leech_action {
                config.lapse.leech_action = action.into();
            }
            if let Some(bury) = bury_new {
                config.new.bury = bury;
            }
            if let Some(bury) = bury_review {
                config.review.bury = bury;
            }

            if new_group {
                let group = DeckConfig {
                    name: deck.name.clone(),
                    ..config
                };
                let config_id = sched.store().add_deck_config(&group)?;
                sched.store().set_deck_config_id(id, config_id)?;
                config = DeckConfig {
                    id: config_id,
                    ..group
                };
            } else {
                sched.store().update_deck_config(&config)?;
            }
            sched.reset();
            writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?;
        }
    }
    Ok(())
}

fn list(sched: &mut StudyScheduler, out: &mut impl Write) -> anyhow::Result<()> {
    let decks = sched.store().all_decks()?;
    writeln!(out, "{:<40} {:>5} {:>5} {:>6}", "deck", "new", "learn", "review")?;
    for deck in &decks {
        sched.select_deck(deck.id);
        let counts = sched.counts()?;
        let depth = deck.name.matches(DECK_SEPARATOR).count();
        let mut label = format!("{}{}", "  ".repeat(depth), deck.base_name());
        if deck.is_filtered() {
            label.push_str(" (filtered)");
        }
        writeln!(
            out,
            "{:<40} {:>5} {:>5} {:>6}",
            label, counts.new, counts.learning, counts.review
        )?;
    }
    Ok(())
}

pub fn run_note(
    sched: &mut StudyScheduler,
    command: NoteCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        NoteCommand::Add {
            deck,
            fields,
            cards,
        } => {
            let id = deck_id(sched, &deck)?;
            let (note_id, card_ids) = sched.store().add_note(id, &fields, cards)?;
            sched.reset();
            writeln!(out, "note {note_id}: cards {card_ids:?}")?;
        }
    }
    Ok(())
}

/// Parse comma separated minutes; an empty string means no steps.
pub fn parse_steps(input: &str) -> anyhow::Result<Vec<f32>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .map(|step| {
            let minutes: f32 = step
                .parse()
                .with_context(|| format!("invalid step: {step:?}"))?;
            if minutes <= 0.0 || !minutes.is_finite() {
                bail!("steps must be positive, got {step}");
            }
            Ok(minutes)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_step_lists() {
        assert_eq!(parse_steps("1, 10").unwrap(), vec![1.0, 10.0]);
        assert_eq!(parse_steps("0.5").unwrap(), vec![0.5]);
        assert_eq!(parse_steps("").unwrap(), Vec::<f32>::new());
        assert!(parse_steps("1,x").is_err());
        assert!(parse_steps("-1").is_err());
    }
}
