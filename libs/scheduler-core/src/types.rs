//! Core types for the scheduling engine.

use serde::{Deserialize, Serialize};

pub type CardId = i64;
pub type NoteId = i64;
pub type DeckId = i64;
pub type DeckConfigId = i64;

/// Raw due values above this are epoch seconds rather than day numbers.
pub const DEADLINE_THRESHOLD: i64 = 1_000_000_000;

/// Default ease factor, in permille.
pub const INITIAL_EASE_FACTOR: u32 = 2500;

/// Lowest ease factor a card can reach, in permille.
pub const MINIMUM_EASE_FACTOR: u32 = 1300;

/// Card learning lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    New,
    Learning,
    Review,
    Relearning,
}

impl Default for CardType {
    fn default() -> Self {
        Self::New
    }
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Review => "review",
            Self::Relearning => "relearning",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "learning" => Some(Self::Learning),
            "review" => Some(Self::Review),
            "relearning" => Some(Self::Relearning),
            _ => None,
        }
    }

    /// True for cards that have graduated at least once.
    pub fn is_review_or_relearning(self) -> bool {
        matches!(self, Self::Review | Self::Relearning)
    }
}

/// Queue a card currently sits in. Orthogonal to [`CardType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardQueue {
    New,
    /// Intraday (re)learning, due at an epoch-second deadline.
    Learning,
    Review,
    /// (Re)learning that crossed the day cutoff, due on a day number.
    DayLearn,
    PreviewRepeat,
    Suspended,
    SchedulerBuried,
    UserBuried,
}

impl Default for CardQueue {
    fn default() -> Self {
        Self::New
    }
}

impl CardQueue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Review => "review",
            Self::DayLearn => "day_learn",
            Self::PreviewRepeat => "preview",
            Self::Suspended => "suspended",
            Self::SchedulerBuried => "sched_buried",
            Self::UserBuried => "user_buried",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "learning" => Some(Self::Learning),
            "review" => Some(Self::Review),
            "day_learn" => Some(Self::DayLearn),
            "preview" => Some(Self::PreviewRepeat),
            "suspended" => Some(Self::Suspended),
            "sched_buried" => Some(Self::SchedulerBuried),
            "user_buried" => Some(Self::UserBuried),
            _ => None,
        }
    }

    /// Queues the scheduler may draw from.
    pub fn is_active(self) -> bool {
        !matches!(
            self,
            Self::Suspended | Self::SchedulerBuried | Self::UserBuried
        )
    }

    pub fn is_buried(self) -> bool {
        matches!(self, Self::SchedulerBuried | Self::UserBuried)
    }
}

/// When a card is due. The meaning depends on the queue it sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Due {
    /// Ordering position: new cards, or any card parked in a filtered deck.
    Position(i32),
    /// Epoch seconds, for intraday learning and preview repeats.
    Deadline(i64),
    /// Days since the collection was created.
    Day(i32),
}

impl Default for Due {
    fn default() -> Self {
        Self::Position(0)
    }
}

impl Due {
    /// Integer form used for storage and ordering.
    pub fn raw(self) -> i64 {
        match self {
            Self::Position(p) => p as i64,
            Self::Deadline(secs) => secs,
            Self::Day(day) => day as i64,
        }
    }

    /// Decode a stored due value using the queue the card sits in.
    pub fn from_raw(raw: i64, queue: CardQueue, card_type: CardType) -> Self {
        match queue {
            CardQueue::New => Self::Position(raw as i32),
            CardQueue::Learning | CardQueue::PreviewRepeat => {
                if raw < 0 {
                    Self::Position(raw as i32)
                } else {
                    Self::Deadline(raw)
                }
            }
            CardQueue::Review | CardQueue::DayLearn => {
                if raw < 0 {
                    Self::Position(raw as i32)
                } else {
                    Self::Day(raw as i32)
                }
            }
            CardQueue::Suspended | CardQueue::SchedulerBuried | CardQueue::UserBuried => {
                Self::for_card_type(raw, card_type)
            }
        }
    }

    /// Decode a due value that is not tied to a queue, such as a saved
    /// original due.
    pub fn for_card_type(raw: i64, card_type: CardType) -> Self {
        match card_type {
            CardType::New => Self::Position(raw as i32),
            _ if raw < 0 => Self::Position(raw as i32),
            CardType::Review => Self::Day(raw as i32),
            CardType::Learning | CardType::Relearning => {
                if raw > DEADLINE_THRESHOLD {
                    Self::Deadline(raw)
                } else {
                    Self::Day(raw as i32)
                }
            }
        }
    }

    pub fn day(self) -> Option<i32> {
        match self {
            Self::Day(day) => Some(day),
            _ => None,
        }
    }
}

/// Progress through a learning ladder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningProgress {
    /// Steps that can still be completed before the day cutoff.
    pub today: u32,
    /// Steps left until graduation.
    pub total: u32,
}

impl LearningProgress {
    pub fn new(today: u32, total: u32) -> Self {
        Self { today, total }
    }

    /// Packed `total + 1000 * today` form used for storage.
    pub fn raw(self) -> i64 {
        self.total as i64 + 1000 * self.today as i64
    }

    pub fn from_raw(raw: i64) -> Self {
        let raw = raw.max(0);
        Self {
            today: (raw / 1000) as u32,
            total: (raw % 1000) as u32,
        }
    }
}

/// Answer grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// Convert to 4-point numeric value (1-4).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }

    /// Create from 4-point numeric value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Again),
            2 => Some(Self::Hard),
            3 => Some(Self::Good),
            4 => Some(Self::Easy),
            _ => None,
        }
    }
}

/// A scheduled card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub note_id: NoteId,
    pub deck_id: DeckId,
    pub ordinal: u16,
    pub card_type: CardType,
    pub queue: CardQueue,
    pub due: Due,
    /// Days.
    pub interval: u32,
    /// Permille; 0 until the card first graduates.
    pub ease_factor: u32,
    pub reps: u32,
    pub lapses: u32,
    pub remaining_steps: LearningProgress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_due: Option<Due>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_deck_id: Option<DeckId>,
    pub flags: u8,
    pub modified: i64,
}

impl Card {
    /// A fresh new card at the given new-queue position.
    pub fn new(id: CardId, note_id: NoteId, deck_id: DeckId, ordinal: u16, position: i32) -> Self {
        Self {
            id,
            note_id,
            deck_id,
            ordinal,
            card_type: CardType::New,
            queue: CardQueue::New,
            due: Due::Position(position),
            interval: 0,
            ease_factor: 0,
            reps: 0,
            lapses: 0,
            remaining_steps: LearningProgress::default(),
            original_due: None,
            original_deck_id: None,
            flags: 0,
            modified: 0,
        }
    }

    pub fn is_filtered(&self) -> bool {
        self.original_deck_id.is_some()
    }

    /// The deck the card belongs to outside of any filtered deck.
    pub fn home_deck_id(&self) -> DeckId {
        self.original_deck_id.unwrap_or(self.deck_id)
    }

    pub fn original_or_current_due(&self) -> Due {
        match (self.original_deck_id, self.original_due) {
            (Some(_), Some(due)) => due,
            _ => self.due,
        }
    }

    /// Queue the card returns to once unsuspended or unburied.
    pub fn natural_queue(&self) -> CardQueue {
        match self.card_type {
            CardType::New => CardQueue::New,
            CardType::Review => CardQueue::Review,
            CardType::Learning | CardType::Relearning => {
                match self.original_due.unwrap_or(self.due) {
                    Due::Deadline(_) => CardQueue::Learning,
                    _ => CardQueue::DayLearn,
                }
            }
        }
    }

    pub fn restore_queue_after_bury_or_suspend(&mut self) {
        self.queue = self.natural_queue();
    }

    /// Return to the home deck, keeping the current due.
    pub fn remove_from_filtered_deck(&mut self) {
        if let Some(home) = self.original_deck_id.take() {
            self.deck_id = home;
            self.original_due = None;
        }
    }

    /// Return to the home deck, restoring the due value saved when the
    /// card was moved in.
    pub fn remove_from_filtered_deck_restoring_due(&mut self) {
        let Some(home) = self.original_deck_id.take() else {
            return;
        };
        if self.queue.is_active() {
            self.queue = self.natural_queue();
        }
        if let Some(due) = self.original_due.take() {
            self.due = due;
        }
        self.deck_id = home;
    }
}

/// What kind of answer a revlog row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevlogKind {
    Learning,
    Review,
    Relearning,
    /// Early reviews and preview answers from filtered decks.
    Cram,
    /// Set-due-date and reschedule-as-new.
    Manual,
}

impl RevlogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Review => "review",
            Self::Relearning => "relearning",
            Self::Cram => "cram",
            Self::Manual => "manual",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "learning" => Some(Self::Learning),
            "review" => Some(Self::Review),
            "relearning" => Some(Self::Relearning),
            "cram" => Some(Self::Cram),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// One append-only review log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevlogEntry {
    /// Epoch milliseconds.
    pub id: i64,
    pub card_id: CardId,
    pub usn: i32,
    /// 1-4; 0 for manual rescheduling.
    pub ease: u8,
    /// Negative = seconds, positive = days.
    pub interval: i32,
    pub last_interval: i32,
    pub ease_factor: u32,
    pub time_taken_ms: u32,
    pub kind: RevlogKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn learning_progress_packs_today_in_thousands() {
        let progress = LearningProgress::new(2, 3);
        assert_eq!(progress.raw(), 2003);
        assert_eq!(LearningProgress::from_raw(2003), progress);
    }

    #[test]
    fn due_decodes_by_queue() {
        assert_eq!(
            Due::from_raw(5, CardQueue::New, CardType::New),
            Due::Position(5)
        );
        assert_eq!(
            Due::from_raw(1_700_000_000, CardQueue::Learning, CardType::Learning),
            Due::Deadline(1_700_000_000)
        );
        assert_eq!(
            Due::from_raw(120, CardQueue::Review, CardType::Review),
            Due::Day(120)
        );
        assert_eq!(
            Due::from_raw(-99_998, CardQueue::Review, CardType::Review),
            Due::Position(-99_998)
        );
        assert_eq!(
            Due::from_raw(1_700_000_000, CardQueue::Suspended, CardType::Relearning),
            Due::Deadline(1_700_000_000)
        );
        assert_eq!(
            Due::from_raw(40, CardQueue::UserBuried, CardType::Learning),
            Due::Day(40)
        );
    }

    #[test]
    fn natural_queue_follows_due_kind_for_learning_cards() {
        let mut card = Card::new(1, 1, 1, 0, 1);
        card.card_type = CardType::Relearning;
        card.due = Due::Deadline(1_700_000_000);
        assert_eq!(card.natural_queue(), CardQueue::Learning);
        card.due = Due::Day(12);
        assert_eq!(card.natural_queue(), CardQueue::DayLearn);
    }

    #[test]
    fn removing_from_filtered_restores_home_placement() {
        let mut card = Card::new(1, 1, 10, 0, 7);
        card.card_type = CardType::Review;
        card.queue = CardQueue::Review;
        card.original_deck_id = Some(10);
        card.original_due = Some(Due::Day(30));
        card.deck_id = 99;
        card.due = Due::Position(-100_000);

        card.remove_from_filtered_deck_restoring_due();

        assert_eq!(card.deck_id, 10);
        assert_eq!(card.due, Due::Day(30));
        assert_eq!(card.queue, CardQueue::Review);
        assert!(!card.is_filtered());
        assert_eq!(card.original_due, None);
    }

    #[test]
    fn rating_round_trips_numeric_values() {
        assert_eq!(Rating::from_value(1), Some(Rating::Again));
        assert_eq!(Rating::from_value(4), Some(Rating::Easy));
        assert_eq!(Rating::from_value(5), None);
        assert_eq!(Rating::Hard.to_value(), 2);
    }
}
