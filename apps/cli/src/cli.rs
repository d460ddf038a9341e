//! Command-line arguments.

use clap::{Parser, Subcommand, ValueEnum};
use scheduler_core::config::{LeechAction, NewCardSpread};
use scheduler_core::deck::{FilterKind, FilteredOrder};
use scheduler_core::types::CardId;
use scheduler_core::UnburyMode;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "deckwise", about = "Spaced-repetition study from the command line", version)]
pub struct Cli {
    /// Collection database (default: $DECKWISE_DB, then the platform data dir)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the collection or change collection-wide preferences
    Init {
        /// Hour at which a new study day starts
        #[arg(long)]
        rollover_hour: Option<u32>,
        /// How new cards mix with reviews
        #[arg(long, value_enum)]
        new_spread: Option<SpreadArg>,
        /// Show day learning cards before reviews
        #[arg(long)]
        day_learn_first: Option<bool>,
        /// Bury siblings when a card is answered (true) or shown (false)
        #[arg(long)]
        bury_on_answer: Option<bool>,
    },

    /// Manage decks
    #[command(subcommand)]
    Deck(DeckCommand),

    /// Manage notes
    #[command(subcommand)]
    Note(NoteCommand),

    /// Show remaining new, learning and review counts
    Counts {
        /// Deck name; children are included
        deck: String,
    },

    /// Study a deck interactively: 1-4 to answer, u to undo, q to quit
    Study {
        deck: String,
    },

    /// Show when a card would come back for each answer
    PreviewIntervals {
        card: CardId,
    },

    /// Suspend cards
    Suspend {
        #[arg(required = true)]
        cards: Vec<CardId>,
    },

    /// Unsuspend cards
    Unsuspend {
        #[arg(required = true)]
        cards: Vec<CardId>,
    },

    /// Bury cards until tomorrow
    Bury {
        /// Card ids, or note ids with --notes
        #[arg(required = true)]
        ids: Vec<i64>,
        /// Treat ids as notes and bury all their cards
        #[arg(long)]
        notes: bool,
    },

    /// Restore buried cards in a deck
    Unbury {
        deck: String,
        #[arg(long, value_enum, default_value = "all")]
        mode: UnburyArg,
    },

    /// Make cards due in N days, a random day in A..B, with ! to also set the interval
    SetDue {
        spec: String,
        #[arg(required = true)]
        cards: Vec<CardId>,
    },

    /// Turn cards back into new cards
    Forget {
        #[arg(required = true)]
        cards: Vec<CardId>,
        /// Also reset review and lapse counts
        #[arg(long)]
        reset_counts: bool,
    },

    /// Change the order new cards are shown in
    Reposition {
        #[arg(required = true)]
        cards: Vec<CardId>,
        #[arg(long, default_value_t = 1)]
        start: i32,
        #[arg(long, default_value_t = 1)]
        step: i32,
        #[arg(long)]
        shuffle: bool,
        /// Move other new cards back to make room
        #[arg(long)]
        shift: bool,
    },

    /// Manage filtered decks
    #[command(subcommand)]
    Filtered(FilteredCommand),

    /// Allow more new cards or reviews today
    ExtendLimits {
        deck: String,
        #[arg(long, default_value_t = 0)]
        new: i32,
        #[arg(long, default_value_t = 0)]
        review: i32,
    },
}

#[derive(Debug, Subcommand)]
pub enum DeckCommand {
    /// Add a deck; "Parent::Child" creates missing parents
    Add {
        name: String,
        /// Options group id
        #[arg(long, default_value_t = 1)]
        config: i64,
    },

    /// List decks with today's counts
    List,

    /// Show or change a deck's options
    Config {
        deck: String,
        /// Copy the options into a new group for this deck first
        #[arg(long)]
        new_group: bool,
        #[arg(long)]
        new_per_day: Option<u32>,
        #[arg(long)]
        review_per_day: Option<u32>,
        /// Learning steps in minutes, e.g. "1,10"
        #[arg(long)]
        steps: Option<String>,
        /// Relearning steps in minutes; "" for none
        #[arg(long)]
        lapse_steps: Option<String>,
        #[arg(long)]
        graduating_interval: Option<u32>,
        #[arg(long)]
        easy_interval: Option<u32>,
        #[arg(long)]
        leech_threshold: Option<u32>,
        #[arg(long, value_enum)]
        leech_action: Option<LeechActionArg>,
        #[arg(long)]
        bury_new: Option<bool>,
        #[arg(long)]
        bury_review: Option<bool>,
    },
}

#[derive(Debug, Subcommand)]
pub enum NoteCommand {
    /// Add a note with one or more sibling cards
    Add {
        deck: String,
        fields: String,
        #[arg(long, default_value_t = 1)]
        cards: u16,
    },
}

#[derive(Debug, Subcommand)]
pub enum FilteredCommand {
    /// Create a filtered deck and fill it
    Create {
        name: String,
        /// Source decks; all normal decks when omitted
        #[arg(long = "from")]
        from: Vec<String>,
        #[arg(long, value_enum, default_value = "due")]
        kind: FilterKindArg,
        /// Lapse threshold for --kind lapsed
        #[arg(long, default_value_t = 1)]
        min_lapses: u32,
        #[arg(long, default_value_t = 100)]
        limit: usize,
        #[arg(long, value_enum, default_value = "random")]
        order: OrderArg,
        /// Second search term
        #[arg(long, value_enum)]
        second_kind: Option<FilterKindArg>,
        #[arg(long, default_value_t = 20)]
        second_limit: usize,
        #[arg(long, value_enum, default_value = "due")]
        second_order: OrderArg,
        /// Preview only; answers do not change scheduling
        #[arg(long)]
        no_reschedule: bool,
        /// Minutes before a previewed card failed with "again" comes back
        #[arg(long, default_value_t = 10)]
        preview_delay: u32,
    },

    /// Empty and refill a filtered deck
    Rebuild { deck: String },

    /// Return all cards to their home decks
    Empty { deck: String },

    /// Empty and delete a filtered deck
    Remove { deck: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SpreadArg {
    Distribute,
    Last,
    First,
}

impl From<SpreadArg> for NewCardSpread {
    fn from(arg: SpreadArg) -> Self {
        match arg {
            SpreadArg::Distribute => NewCardSpread::Distribute,
            SpreadArg::Last => NewCardSpread::Last,
            SpreadArg::First => NewCardSpread::First,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnburyArg {
    All,
    Manual,
    Siblings,
}

impl From<UnburyArg> for UnburyMode {
    fn from(arg: UnburyArg) -> Self {
        match arg {
            UnburyArg::All => UnburyMode::All,
            UnburyArg::Manual => UnburyMode::Manual,
            UnburyArg::Siblings => UnburyMode::Siblings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LeechActionArg {
    Suspend,
    Tag,
}

impl From<LeechActionArg> for LeechAction {
    fn from(arg: LeechActionArg) -> Self {
        match arg {
            LeechActionArg::Suspend => LeechAction::Suspend,
            LeechActionArg::Tag => LeechAction::TagOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterKindArg {
    All,
    New,
    Due,
    Learning,
    Lapsed,
}

impl FilterKindArg {
    pub fn into_kind(self, min_lapses: u32) -> FilterKind {
        match self {
            Self::All => FilterKind::All,
            Self::New => FilterKind::New,
            Self::Due => FilterKind::Due,
            Self::Learning => FilterKind::Learning,
            Self::Lapsed => FilterKind::Lapsed { min_lapses },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    OldestSeen,
    Random,
    IntervalsAsc,
    IntervalsDesc,
    MostLapses,
    Added,
    ReverseAdded,
    Due,
    DuePriority,
}

impl From<OrderArg> for FilteredOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::OldestSeen => FilteredOrder::OldestSeenFirst,
            OrderArg::Random => FilteredOrder::Random,
            OrderArg::IntervalsAsc => FilteredOrder::IntervalsAscending,
            OrderArg::IntervalsDesc => FilteredOrder::IntervalsDescending,
            OrderArg::MostLapses => FilteredOrder::MostLapses,
            OrderArg::Added => FilteredOrder::Added,
            OrderArg::ReverseAdded => FilteredOrder::ReverseAdded,
            OrderArg::Due => FilteredOrder::Due,
            OrderArg::DuePriority => FilteredOrder::DuePriority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn arguments_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_set_due_with_range() {
        let cli = Cli::try_parse_from(["deckwise", "set-due", "3..7!", "10", "11"]).unwrap();
        match cli.command {
            Command::SetDue { spec, cards } => {
                assert_eq!(spec, "3..7!");
                assert_eq!(cards, vec![10, 11]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_filtered_create() {
        let cli = Cli::try_parse_from([
            "deckwise",
            "filtered",
            "create",
            "Cram",
            "--from",
            "Japanese",
            "--kind",
            "lapsed",
            "--min-lapses",
            "3",
            "--order",
            "most-lapses",
            "--no-reschedule",
        ])
        .unwrap();
        let Command::Filtered(FilteredCommand::Create {
            name,
            from,
            kind,
            min_lapses,
            order,
            no_reschedule,
            ..
        }) = cli.command
        else {
            panic!("expected filtered create");
        };
        assert_eq!(name, "Cram");
        assert_eq!(from, vec!["Japanese".to_string()]);
        assert_eq!(kind.into_kind(min_lapses), FilterKind::Lapsed { min_lapses: 3 });
        assert_eq!(FilteredOrder::from(order), FilteredOrder::MostLapses);
        assert!(no_reschedule);
    }
}
