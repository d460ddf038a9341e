//! Scheduling configuration: collection preferences, shared deck configs and
//! the effective config a card is scheduled with.

use crate::deck::FilteredDeck;
use crate::types::{DeckConfigId, INITIAL_EASE_FACTOR};
use serde::{Deserialize, Serialize};

/// Id of the config every collection starts with; used as the fallback when a
/// deck points at a config that no longer exists.
pub const DEFAULT_DECK_CONFIG_ID: DeckConfigId = 1;

/// Daily limit reported for filtered decks, which have no real limit.
pub const FILTERED_REPORT_LIMIT: u32 = 99_999;

/// How new cards are mixed in with reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewCardSpread {
    Distribute,
    Last,
    First,
}

impl NewCardSpread {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Distribute => "distribute",
            Self::Last => "last",
            Self::First => "first",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "distribute" => Some(Self::Distribute),
            "last" => Some(Self::Last),
            "first" => Some(Self::First),
            _ => None,
        }
    }
}

/// Collection-wide scheduling preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Epoch seconds at which the collection was created; day 0.
    pub created_secs: i64,
    /// Local hour at which a new study day begins.
    pub rollover_hour: u32,
    /// Learning cards due within this many seconds are shown early.
    pub collapse_secs: u32,
    pub new_spread: NewCardSpread,
    pub day_learn_first: bool,
    /// Bury siblings when a card is answered rather than when it is shown.
    pub bury_siblings_on_answer: bool,
    /// Day on which buried cards were last released.
    pub last_unburied: u32,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            created_secs: 0,
            rollover_hour: 4,
            collapse_secs: 1200,
            new_spread: NewCardSpread::Distribute,
            day_learn_first: false,
            bury_siblings_on_answer: true,
            last_unburied: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewCardOrder {
    Due,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeechAction {
    Suspend,
    TagOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewConfig {
    pub per_day: u32,
    /// Learning steps, in minutes.
    pub steps: Vec<f32>,
    pub initial_ease: u32,
    /// Days; `[graduating, easy]`.
    pub graduating_interval: u32,
    pub easy_interval: u32,
    pub order: NewCardOrder,
    pub bury: bool,
}

impl Default for NewConfig {
    fn default() -> Self {
        Self {
            per_day: 20,
            steps: vec![1.0, 10.0],
            initial_ease: INITIAL_EASE_FACTOR,
            graduating_interval: 1,
            easy_interval: 4,
            order: NewCardOrder::Due,
            bury: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub per_day: u32,
    pub easy_bonus: f32,
    pub interval_multiplier: f32,
    pub max_interval: u32,
    pub hard_multiplier: f32,
    pub bury: bool,
    /// Answer times are capped at this many seconds.
    pub max_answer_secs: u32,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            per_day: 200,
            easy_bonus: 1.3,
            interval_multiplier: 1.0,
            max_interval: 36_500,
            hard_multiplier: 1.2,
            bury: false,
            max_answer_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LapseConfig {
    /// Relearning steps, in minutes.
    pub steps: Vec<f32>,
    pub leech_threshold: u32,
    pub leech_action: LeechAction,
    /// Applied to the interval on a lapse.
    pub multiplier: f32,
    pub min_interval: u32,
}

impl Default for LapseConfig {
    fn default() -> Self {
        Self {
            steps: vec![10.0],
            leech_threshold: 8,
            leech_action: LeechAction::TagOnly,
            multiplier: 0.0,
            min_interval: 1,
        }
    }
}

/// Options group shared by any number of decks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckConfig {
    pub id: DeckConfigId,
    pub name: String,
    #[serde(default)]
    pub new: NewConfig,
    #[serde(default)]
    pub review: ReviewConfig,
    #[serde(default)]
    pub lapse: LapseConfig,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_DECK_CONFIG_ID,
            name: "Default".to_string(),
            new: NewConfig::default(),
            review: ReviewConfig::default(),
            lapse: LapseConfig::default(),
        }
    }
}

/// Filtered deck settings that apply while a card is parked in one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilteredSettings {
    pub reschedule: bool,
    pub preview_delay_secs: u32,
}

/// The configuration a card is actually scheduled with.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub new: NewConfig,
    pub review: ReviewConfig,
    pub lapse: LapseConfig,
    /// Present when the card sits in a filtered deck.
    pub filtered: Option<FilteredSettings>,
}

impl EffectiveConfig {
    /// Combine the home deck's config with the filtered deck the card is
    /// parked in, if any.
    ///
    /// Steps, ease and lapse handling always come from the home config.
    /// Filtered decks have no daily limits and show cards in due order.
    pub fn resolve(home: &DeckConfig, filtered: Option<&FilteredDeck>) -> Self {
        let mut new = home.new.clone();
        let mut review = home.review.clone();
        let filtered = filtered.map(|deck| {
            new.per_day = FILTERED_REPORT_LIMIT;
            new.order = NewCardOrder::Due;
            review.per_day = FILTERED_REPORT_LIMIT;
            FilteredSettings {
                reschedule: deck.reschedule,
                preview_delay_secs: deck.preview_delay_mins * 60,
            }
        });

        Self {
            new,
            review,
            lapse: home.lapse.clone(),
            filtered,
        }
    }

    /// True when answers must not change the card's home scheduling.
    pub fn is_previewing(&self) -> bool {
        matches!(self.filtered, Some(settings) if !settings.reschedule)
    }

    pub fn in_filtered_deck(&self) -> bool {
        self.filtered.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn home() -> DeckConfig {
        let mut config = DeckConfig::default();
        config.new.per_day = 5;
        config.new.order = NewCardOrder::Random;
        config.new.steps = vec![2.0];
        config.lapse.leech_threshold = 4;
        config
    }

    #[test]
    fn normal_deck_uses_home_config() {
        let home = home();
        let config = EffectiveConfig::resolve(&home, None);
        assert_eq!(config.new, home.new);
        assert_eq!(config.review, home.review);
        assert!(!config.in_filtered_deck());
        assert!(!config.is_previewing());
    }

    #[test]
    fn filtered_deck_lifts_limits_and_keeps_home_steps() {
        let home = home();
        let filtered = FilteredDeck {
            reschedule: false,
            preview_delay_mins: 5,
            ..FilteredDeck::default()
        };
        let config = EffectiveConfig::resolve(&home, Some(&filtered));

        assert_eq!(config.new.per_day, FILTERED_REPORT_LIMIT);
        assert_eq!(config.review.per_day, FILTERED_REPORT_LIMIT);
        assert_eq!(config.new.order, NewCardOrder::Due);
        assert_eq!(config.new.steps, vec![2.0]);
        assert_eq!(config.lapse.leech_threshold, 4);
        assert_eq!(
            config.filtered,
            Some(FilteredSettings {
                reschedule: false,
                preview_delay_secs: 300,
            })
        );
        assert!(config.is_previewing());
    }

    #[test]
    fn deck_config_deserializes_with_missing_sections() {
        let config: DeckConfig =
            serde_json::from_str(r#"{"id": 3, "name": "Sparse", "new": {"per_day": 2}}"#)
                .expect("valid json");
        assert_eq!(config.new.per_day, 2);
        assert_eq!(config.new.steps, vec![1.0, 10.0]);
        assert_eq!(config.review, ReviewConfig::default());
    }
}
