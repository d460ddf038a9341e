//! Decks, the deck hierarchy and filtered deck definitions.

use crate::types::{DeckConfigId, DeckId};
use serde::{Deserialize, Serialize};

/// Separator between deck name components ("Languages::Japanese").
pub const DECK_SEPARATOR: &str = "::";

/// Per-day study counters. Stale once `day` is not today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounts {
    pub day: u32,
    /// May go negative when limits are extended.
    pub new_studied: i32,
    pub review_studied: i32,
    pub millis_studied: i64,
}

impl DailyCounts {
    /// Counters as they apply on `today`.
    pub fn for_day(&self, today: u32) -> Self {
        if self.day == today {
            *self
        } else {
            Self {
                day: today,
                ..Self::default()
            }
        }
    }

    pub fn record(&mut self, today: u32, new: i32, review: i32, millis: i64) {
        *self = self.for_day(today);
        self.new_studied += new;
        self.review_studied += review;
        self.millis_studied += millis;
    }
}

/// Which cards a filtered deck term selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FilterKind {
    All,
    New,
    /// Reviews and (re)learning cards due today.
    Due,
    Learning,
    Lapsed { min_lapses: u32 },
}

/// Order in which a filtered deck term pulls cards in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilteredOrder {
    OldestSeenFirst,
    Random,
    IntervalsAscending,
    IntervalsDescending,
    MostLapses,
    Added,
    ReverseAdded,
    Due,
    DuePriority,
}

impl FilteredOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OldestSeenFirst => "oldest_seen_first",
            Self::Random => "random",
            Self::IntervalsAscending => "intervals_ascending",
            Self::IntervalsDescending => "intervals_descending",
            Self::MostLapses => "most_lapses",
            Self::Added => "added",
            Self::ReverseAdded => "reverse_added",
            Self::Due => "due",
            Self::DuePriority => "due_priority",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "oldest_seen_first" => Some(Self::OldestSeenFirst),
            "random" => Some(Self::Random),
            "intervals_ascending" => Some(Self::IntervalsAscending),
            "intervals_descending" => Some(Self::IntervalsDescending),
            "most_lapses" => Some(Self::MostLapses),
            "added" => Some(Self::Added),
            "reverse_added" => Some(Self::ReverseAdded),
            "due" => Some(Self::Due),
            "due_priority" => Some(Self::DuePriority),
            _ => None,
        }
    }
}

/// Search predicate of a filtered deck term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFilter {
    /// Source decks, children included. Empty means every normal deck.
    #[serde(default)]
    pub decks: Vec<DeckId>,
    pub kind: FilterKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredTerm {
    pub filter: CardFilter,
    pub limit: usize,
    pub order: FilteredOrder,
}

/// Definition of a filtered (cram) deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredDeck {
    pub terms: Vec<FilteredTerm>,
    /// When false the deck only previews cards and never changes their
    /// scheduling.
    pub reschedule: bool,
    pub preview_delay_mins: u32,
}

impl Default for FilteredDeck {
    fn default() -> Self {
        Self {
            terms: vec![FilteredTerm {
                filter: CardFilter {
                    decks: Vec::new(),
                    kind: FilterKind::Due,
                },
                limit: 100,
                order: FilteredOrder::Random,
            }],
            reschedule: true,
            preview_delay_mins: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DeckKind {
    Normal { config_id: DeckConfigId },
    Filtered(FilteredDeck),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub kind: DeckKind,
    pub today: DailyCounts,
}

impl Deck {
    pub fn new_normal(id: DeckId, name: impl Into<String>, config_id: DeckConfigId) -> Self {
        Self {
            id,
            name: name.into(),
            kind: DeckKind::Normal { config_id },
            today: DailyCounts::default(),
        }
    }

    pub fn new_filtered(id: DeckId, name: impl Into<String>, filtered: FilteredDeck) -> Self {
        Self {
            id,
            name: name.into(),
            kind: DeckKind::Filtered(filtered),
            today: DailyCounts::default(),
        }
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self.kind, DeckKind::Filtered(_))
    }

    pub fn filtered(&self) -> Option<&FilteredDeck> {
        match &self.kind {
            DeckKind::Filtered(filtered) => Some(filtered),
            DeckKind::Normal { .. } => None,
        }
    }

    pub fn config_id(&self) -> Option<DeckConfigId> {
        match self.kind {
            DeckKind::Normal { config_id } => Some(config_id),
            DeckKind::Filtered(_) => None,
        }
    }

    /// Name of the immediate parent, if any.
    pub fn parent_name(&self) -> Option<&str> {
        self.name
            .rsplit_once(DECK_SEPARATOR)
            .map(|(parent, _)| parent)
    }

    /// Last component of the name.
    pub fn base_name(&self) -> &str {
        self.name
            .rsplit(DECK_SEPARATOR)
            .next()
            .unwrap_or(&self.name)
    }

    pub fn is_descendant_of(&self, ancestor: &str) -> bool {
        self.name.len() > ancestor.len() + DECK_SEPARATOR.len()
            && self.name.starts_with(ancestor)
            && self.name[ancestor.len()..].starts_with(DECK_SEPARATOR)
    }
}

/// Ancestors of `deck_id`, nearest first.
pub fn ancestors<'a>(decks: &'a [Deck], deck_id: DeckId) -> Vec<&'a Deck> {
    let Some(deck) = decks.iter().find(|d| d.id == deck_id) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut name = deck.parent_name();
    while let Some(parent_name) = name {
        match decks.iter().find(|d| d.name == parent_name) {
            Some(parent) => {
                out.push(parent);
                name = parent.parent_name();
            }
            None => {
                name = parent_name
                    .rsplit_once(DECK_SEPARATOR)
                    .map(|(parent, _)| parent);
            }
        }
    }
    out
}

/// `root` followed by all of its descendants, in name order.
pub fn active_deck_ids(decks: &[Deck], root: DeckId) -> Vec<DeckId> {
    let Some(root_deck) = decks.iter().find(|d| d.id == root) else {
        return Vec::new();
    };
    let mut children: Vec<&Deck> = decks
        .iter()
        .filter(|d| d.is_descendant_of(&root_deck.name))
        .collect();
    children.sort_by(|a, b| {
        a.name
            .split(DECK_SEPARATOR)
            .cmp(b.name.split(DECK_SEPARATOR))
    });
    std::iter::once(root)
        .chain(children.into_iter().map(|d| d.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decks() -> Vec<Deck> {
        vec![
            Deck::new_normal(1, "Default", 1),
            Deck::new_normal(2, "Languages", 1),
            Deck::new_normal(3, "Languages::Japanese", 1),
            Deck::new_normal(4, "Languages::Japanese::Verbs", 1),
            Deck::new_normal(5, "Languages::German", 1),
            Deck::new_normal(6, "Languages2", 1),
        ]
    }

    #[test]
    fn ancestors_are_nearest_first() {
        let decks = decks();
        let ids: Vec<_> = ancestors(&decks, 4).iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![3, 2]);
        assert!(ancestors(&decks, 2).is_empty());
    }

    #[test]
    fn active_decks_include_descendants_only() {
        let decks = decks();
        assert_eq!(active_deck_ids(&decks, 2), vec![2, 5, 3, 4]);
        assert_eq!(active_deck_ids(&decks, 6), vec![6]);
        assert!(active_deck_ids(&decks, 99).is_empty());
    }

    #[test]
    fn stale_daily_counts_reset() {
        let mut counts = DailyCounts {
            day: 3,
            new_studied: 5,
            review_studied: 7,
            millis_studied: 100,
        };
        assert_eq!(counts.for_day(4).new_studied, 0);
        counts.record(4, 1, 0, 10);
        assert_eq!(counts.day, 4);
        assert_eq!(counts.new_studied, 1);
        assert_eq!(counts.review_studied, 0);
    }

    #[test]
    fn names_split_on_separator() {
        let deck = Deck::new_normal(1, "A::B::C", 1);
        assert_eq!(deck.parent_name(), Some("A::B"));
        assert_eq!(deck.base_name(), "C");
        assert!(deck.is_descendant_of("A"));
        assert!(!deck.is_descendant_of("A::B::C"));
    }
}
