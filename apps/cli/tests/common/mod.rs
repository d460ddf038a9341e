//! Common test utilities for integration tests.
//!
//! Every test gets its own in-memory collection and a manual clock that
//! starts at noon on the collection's first day.

#![allow(dead_code)]

pub mod fixtures;

use deckwise_cli::db::SqliteRepository;
use scheduler_core::types::{Card, CardId, CardQueue, CardType, DeckId, Due};
use scheduler_core::{CollectionStore, DeckConfig, ManualClock, Scheduler};

/// 2024-01-01 00:00:00 UTC
pub const JAN_1: i64 = 1_704_067_200;

/// Collection creation time; the first study day runs until 04:00 the next
/// morning.
pub const CREATED: i64 = JAN_1 + 12 * 3600;

pub const DEFAULT_DECK: DeckId = 1;

pub struct TestContext {
    pub sched: Scheduler<SqliteRepository>,
    pub clock: ManualClock,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a context whose default options group is edited first.
    pub fn with_config(edit: impl FnOnce(&mut DeckConfig)) -> Self {
        let repo = open_collection(edit);
        let clock = ManualClock::new(CREATED);
        let sched = Scheduler::new(repo, DEFAULT_DECK).with_clock(clock.clone());
        Self { sched, clock }
    }

    pub fn repo(&self) -> &SqliteRepository {
        self.sched.store()
    }

    /// Add single-card notes to a deck, returning the card ids in order.
    pub fn add_cards(&mut self, deck_id: DeckId, count: usize) -> Vec<CardId> {
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let (_, cards) = self
                .repo()
                .add_note(deck_id, &format!("front {i}\tback {i}"), 1)
                .expect("add note");
            ids.extend(cards);
        }
        self.sched.reset();
        ids
    }

    /// Add a card that is already in review.
    pub fn add_review_card(&mut self, interval: u32, ease_factor: u32, due_day: i32) -> CardId {
        let id = self.add_cards(DEFAULT_DECK, 1)[0];
        let mut card = self.card(id);
        card.card_type = CardType::Review;
        card.queue = CardQueue::Review;
        card.due = Due::Day(due_day);
        card.interval = interval;
        card.ease_factor = ease_factor;
        card.reps = 3;
        self.save(&card);
        id
    }

    pub fn card(&self, id: CardId) -> Card {
        self.repo()
            .get_card(id)
            .expect("read card")
            .expect("card exists")
    }

    /// Write a card directly and drop the session.
    pub fn save(&mut self, card: &Card) {
        self.sched
            .store_mut()
            .update_card(card)
            .expect("update card");
        self.sched.reset();
    }

    /// Fetch the next card and answer it.
    pub fn answer_next(&mut self, ease: u8) -> Card {
        let card = self
            .sched
            .get_next_card()
            .expect("next card")
            .expect("a card is due");
        self.sched.answer_card(card.id, ease).expect("answer card")
    }

    pub fn today(&self) -> u32 {
        self.sched.timing().expect("timing").days_elapsed
    }

    pub fn now(&self) -> i64 {
        use scheduler_core::Clock;
        self.clock.now_secs()
    }
}

/// An in-memory collection created at [`CREATED`] with a 04:00 rollover,
/// its default options group edited by `edit`.
pub fn open_collection(edit: impl FnOnce(&mut DeckConfig)) -> SqliteRepository {
    let mut repo = SqliteRepository::open_in_memory().expect("in-memory database");

    let mut collection = repo.collection_config().expect("collection config");
    collection.created_secs = CREATED;
    collection.rollover_hour = 4;
    repo.set_collection_config(&collection)
        .expect("store collection config");

    let mut config = repo
        .get_deck_config(1)
        .expect("read default config")
        .expect("default config exists");
    edit(&mut config);
    repo.update_deck_config(&config).expect("store default config");
    repo
}
