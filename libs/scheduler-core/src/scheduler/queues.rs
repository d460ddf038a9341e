//! Session queues and their counts.

use super::Scheduler;
use crate::algorithm::fuzz::day_rng;
use crate::config::{CollectionConfig, NewCardOrder, FILTERED_REPORT_LIMIT};
use crate::deck::Deck;
use crate::error::{Result, SchedulerError};
use crate::limits::{LimitKind, LimitTracker};
use crate::store::{CardOrder, CardQuery, CollectionStore};
use crate::timing::SchedTimingToday;
use crate::types::{Card, CardId, CardQueue, DeckId};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use tracing::debug;

/// Learning cards are re-scanned once the learn-ahead cutoff has moved this
/// far.
const LEARN_RESCAN_SECS: i64 = 60;

/// Cards left to study in the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub new: u32,
    pub learning: u32,
    pub review: u32,
}

impl QueueCounts {
    pub fn total(&self) -> u32 {
        self.new + self.learning + self.review
    }

    /// Add one for a card taken from `queue`.
    pub fn include(&mut self, queue: CardQueue) {
        match queue {
            CardQueue::New => self.new += 1,
            CardQueue::Learning | CardQueue::DayLearn | CardQueue::PreviewRepeat => {
                self.learning += 1
            }
            CardQueue::Review => self.review += 1,
            CardQueue::Suspended | CardQueue::SchedulerBuried | CardQueue::UserBuried => {}
        }
    }
}

/// The session queue a card was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueueSource {
    New,
    Learning,
    DayLearn,
    Review,
}

impl QueueSource {
    /// True if a card stored in `queue` belongs in this session queue.
    pub fn holds(self, queue: CardQueue) -> bool {
        match self {
            Self::New => queue == CardQueue::New,
            Self::Learning => matches!(queue, CardQueue::Learning | CardQueue::PreviewRepeat),
            Self::DayLearn => queue == CardQueue::DayLearn,
            Self::Review => queue == CardQueue::Review,
        }
    }
}

/// In-memory study state for the selected deck tree. Never persisted.
#[derive(Debug)]
pub(crate) struct SchedulerSession {
    pub timing: SchedTimingToday,
    pub config: CollectionConfig,
    pub active_decks: Vec<DeckId>,
    pub counts: QueueCounts,
    pub new_card_modulus: u32,
    queue_limit: usize,
    /// Reversed; the next card is at the end.
    new_queue: Vec<CardId>,
    new_decks: VecDeque<DeckId>,
    learn_queue: BinaryHeap<Reverse<(i64, CardId)>>,
    learn_cutoff: i64,
    day_learn_queue: Vec<CardId>,
    day_learn_decks: VecDeque<DeckId>,
    /// Reversed; the next card is at the end.
    review_queue: Vec<CardId>,
}

impl SchedulerSession {
    pub fn today(&self) -> u32 {
        self.timing.days_elapsed
    }

    fn collapse_secs(&self) -> i64 {
        self.config.collapse_secs as i64
    }

    pub fn build<S>(
        store: &S,
        root: DeckId,
        timing: SchedTimingToday,
        config: CollectionConfig,
        now: i64,
        queue_limit: usize,
    ) -> Result<Self>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        let active_decks = store.active_deck_ids(root)?;
        if active_decks.is_empty() {
            return Err(SchedulerError::DeckNotFound(root));
        }
        let mut session = Self {
            timing,
            config,
            active_decks,
            counts: QueueCounts::default(),
            new_card_modulus: 0,
            queue_limit,
            new_queue: Vec::new(),
            new_decks: VecDeque::new(),
            learn_queue: BinaryHeap::new(),
            learn_cutoff: 0,
            day_learn_queue: Vec::new(),
            day_learn_decks: VecDeque::new(),
            review_queue: Vec::new(),
        };
        session.reset_learning(store, now)?;
        session.reset_review(store)?;
        session.reset_new(store)?;
        session.update_new_card_modulus();
        debug!(
            root,
            today = session.today(),
            new = session.counts.new,
            learning = session.counts.learning,
            review = session.counts.review,
            "built study session"
        );
        Ok(session)
    }

    pub fn update_new_card_modulus(&mut self) {
        self.new_card_modulus = super::new_card_modulus(
            self.config.new_spread,
            self.counts.new,
            self.counts.review,
        );
    }

    /// Rebuild counts from the store and empty every queue.
    pub fn recount<S>(&mut self, store: &S, now: i64) -> Result<()>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        self.reset_learning(store, now)?;
        self.reset_review(store)?;
        self.reset_new(store)?;
        self.update_new_card_modulus();
        Ok(())
    }

    // New cards
    ////////////////////////////////////////////////////////////////////////

    fn reset_new<S>(&mut self, store: &S) -> Result<()>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        let mut tracker = limit_tracker(store, self.today(), LimitKind::New)?;
        let mut total = 0;
        for &deck_id in &self.active_decks {
            let available = store.count_cards(&CardQuery::deck(deck_id).queues([CardQueue::New]))?;
            total += tracker.take(deck_id, available as u32);
        }
        self.counts.new = total;
        self.new_queue.clear();
        self.new_decks = self.active_decks.iter().copied().collect();
        Ok(())
    }

    fn fill_new<S>(&mut self, store: &S, healing: bool) -> Result<bool>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        if !self.new_queue.is_empty() {
            return Ok(true);
        }
        if self.counts.new == 0 {
            return Ok(false);
        }
        let tracker = limit_tracker(store, self.today(), LimitKind::New)?;
        while let Some(&deck_id) = self.new_decks.front() {
            let limit = (self.queue_limit as u32).min(tracker.remaining(deck_id)) as usize;
            if limit > 0 {
                let mut cards = self.fetch_new(store, deck_id, limit)?;
                if !cards.is_empty() {
                    cards.reverse();
                    self.new_queue = cards;
                    return Ok(true);
                }
            }
            self.new_decks.pop_front();
        }
        if healing {
            debug!(count = self.counts.new, "no new cards despite count, treating as empty");
            self.counts.new = 0;
            return Ok(false);
        }
        debug!(count = self.counts.new, "new queue out of sync, recounting");
        self.reset_new(store)?;
        self.fill_new(store, true)
    }

    fn fetch_new<S>(&self, store: &S, deck_id: DeckId, limit: usize) -> Result<Vec<CardId>>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        let random = match store.get_deck(deck_id)? {
            Some(deck) if !deck.is_filtered() => {
                store.deck_config_for(deck_id)?.new.order == NewCardOrder::Random
            }
            _ => false,
        };
        let query = CardQuery::deck(deck_id)
            .queues([CardQueue::New])
            .order(CardOrder::Due);
        if !random {
            let cards = store.query_cards(&query.limit(limit))?;
            return Ok(cards.into_iter().map(|card| card.id).collect());
        }
        let mut ids: Vec<CardId> = store
            .query_cards(&query)?
            .into_iter()
            .map(|card| card.id)
            .collect();
        ids.shuffle(&mut day_rng(self.today()));
        ids.truncate(limit);
        Ok(ids)
    }

    pub fn pop_new<S>(&mut self, store: &S) -> Result<Option<CardId>>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        if !self.fill_new(store, false)? {
            return Ok(None);
        }
        let id = self.new_queue.pop();
        if id.is_some() {
            self.counts.new = self.counts.new.saturating_sub(1);
        }
        Ok(id)
    }

    // Learning cards
    ////////////////////////////////////////////////////////////////////////

    fn reset_learning<S>(&mut self, store: &S, now: i64) -> Result<()>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        self.learn_cutoff = now + self.collapse_secs();
        let intraday = store.count_cards(
            &CardQuery::in_decks(self.active_decks.clone())
                .queues([CardQueue::Learning, CardQueue::PreviewRepeat])
                .due_before(self.learn_cutoff),
        )?;
        let interday = store.count_cards(
            &CardQuery::in_decks(self.active_decks.clone())
                .queues([CardQueue::DayLearn])
                .due_before(self.today() as i64 + 1),
        )?;
        self.counts.learning = (intraday + interday) as u32;
        self.learn_queue.clear();
        self.day_learn_queue.clear();
        self.day_learn_decks = self.active_decks.iter().copied().collect();
        Ok(())
    }

    /// Re-scan learning cards when the learn-ahead window has moved on.
    fn maybe_reset_learning<S>(&mut self, store: &S, now: i64, force: bool) -> Result<()>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        let next_cutoff = now + self.collapse_secs();
        if force || next_cutoff - self.learn_cutoff > LEARN_RESCAN_SECS {
            self.reset_learning(store, now)?;
        }
        Ok(())
    }

    /// Learning counts cover both learning queues, so an empty fetch here
    /// says nothing about the day-learn share. A stale count is left for the
    /// recount in `get_next_card`, which runs once every queue comes up dry.
    fn fill_learning<S>(&mut self, store: &S, now: i64) -> Result<bool>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        if self.counts.learning == 0 {
            return Ok(false);
        }
        if !self.learn_queue.is_empty() {
            return Ok(true);
        }
        let cards = store.query_cards(
            &CardQuery::in_decks(self.active_decks.clone())
                .queues([CardQueue::Learning, CardQueue::PreviewRepeat])
                .due_before(now + self.collapse_secs())
                .limit(FILTERED_REPORT_LIMIT as usize),
        )?;
        self.learn_queue = cards
            .into_iter()
            .map(|card| Reverse((card.due.raw(), card.id)))
            .collect();
        Ok(!self.learn_queue.is_empty())
    }

    /// Next intraday learning card due by now, or within the learn-ahead
    /// window when `collapse` is set.
    pub fn pop_learning<S>(&mut self, store: &S, now: i64, collapse: bool) -> Result<Option<CardId>>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        self.maybe_reset_learning(store, now, collapse && self.counts.learning == 0)?;
        if !self.fill_learning(store, now)? {
            return Ok(None);
        }
        let cutoff = if collapse {
            now + self.collapse_secs()
        } else {
            now + 1
        };
        match self.learn_queue.peek() {
            Some(Reverse((due, _))) if *due < cutoff => {}
            _ => return Ok(None),
        }
        let id = self.learn_queue.pop().map(|Reverse((_, id))| id);
        self.counts.learning = self.counts.learning.saturating_sub(1);
        Ok(id)
    }

    /// Earliest queued learning deadline.
    pub fn next_learning_due(&self) -> Option<i64> {
        self.learn_queue.peek().map(|Reverse((due, _))| *due)
    }

    /// Put a card that was just answered back into the learning queue.
    pub fn push_learning(&mut self, due: i64, card_id: CardId) {
        self.counts.learning += 1;
        self.learn_queue.push(Reverse((due, card_id)));
    }

    pub fn learn_ahead_cutoff(&self, now: i64) -> i64 {
        now + self.collapse_secs()
    }

    /// Shares the learning count with `fill_learning`; see there for how a
    /// stale count is healed.
    fn fill_day_learning<S>(&mut self, store: &S) -> Result<bool>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        if self.counts.learning == 0 {
            return Ok(false);
        }
        if !self.day_learn_queue.is_empty() {
            return Ok(true);
        }
        while let Some(&deck_id) = self.day_learn_decks.front() {
            let cards = store.query_cards(
                &CardQuery::deck(deck_id)
                    .queues([CardQueue::DayLearn])
                    .due_before(self.today() as i64 + 1)
                    .order(CardOrder::Due)
                    .limit(self.queue_limit),
            )?;
            if !cards.is_empty() {
                let mut ids: Vec<CardId> = cards.into_iter().map(|card| card.id).collect();
                ids.shuffle(&mut day_rng(self.today()));
                if ids.len() < self.queue_limit {
                    self.day_learn_decks.pop_front();
                }
                self.day_learn_queue = ids;
                return Ok(true);
            }
            self.day_learn_decks.pop_front();
        }
        Ok(false)
    }

    pub fn pop_day_learning<S>(&mut self, store: &S) -> Result<Option<CardId>>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        if !self.fill_day_learning(store)? {
            return Ok(None);
        }
        let id = self.day_learn_queue.pop();
        if id.is_some() {
            self.counts.learning = self.counts.learning.saturating_sub(1);
        }
        Ok(id)
    }

    // Reviews
    ////////////////////////////////////////////////////////////////////////

    fn reset_review<S>(&mut self, store: &S) -> Result<()>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        let mut tracker = limit_tracker(store, self.today(), LimitKind::Review)?;
        let mut total = 0;
        for &deck_id in &self.active_decks {
            let due = store.count_cards(
                &CardQuery::deck(deck_id)
                    .queues([CardQueue::Review])
                    .due_before(self.today() as i64 + 1),
            )?;
            total += tracker.take(deck_id, due as u32);
        }
        self.counts.review = total;
        self.review_queue.clear();
        Ok(())
    }

    fn fill_review<S>(&mut self, store: &S, healing: bool) -> Result<bool>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        if !self.review_queue.is_empty() {
            return Ok(true);
        }
        if self.counts.review == 0 {
            return Ok(false);
        }
        let mut tracker = limit_tracker(store, self.today(), LimitKind::Review)?;
        let cards = store.query_cards(
            &CardQuery::in_decks(self.active_decks.clone())
                .queues([CardQueue::Review])
                .due_before(self.today() as i64 + 1)
                .order(CardOrder::Due),
        )?;
        // Ties on due are broken randomly, but the same way all day.
        let mut rng = day_rng(self.today());
        let mut keyed: Vec<(i64, u32, CardId, DeckId)> = cards
            .into_iter()
            .map(|card| (card.due.raw(), rng.gen(), card.id, card.deck_id))
            .collect();
        keyed.sort_unstable();

        let mut queue = Vec::new();
        for (_, _, card_id, deck_id) in keyed {
            if queue.len() >= self.queue_limit {
                break;
            }
            if tracker.try_take_one(deck_id) {
                queue.push(card_id);
            }
        }
        if !queue.is_empty() {
            queue.reverse();
            self.review_queue = queue;
            return Ok(true);
        }
        if healing {
            debug!(count = self.counts.review, "no reviews despite count, treating as empty");
            self.counts.review = 0;
            return Ok(false);
        }
        debug!(count = self.counts.review, "review queue out of sync, recounting");
        self.reset_review(store)?;
        self.fill_review(store, true)
    }

    pub fn pop_review<S>(&mut self, store: &S) -> Result<Option<CardId>>
    where
        S: CollectionStore,
        SchedulerError: From<S::Error>,
    {
        if !self.fill_review(store, false)? {
            return Ok(None);
        }
        let id = self.review_queue.pop();
        if id.is_some() {
            self.counts.review = self.counts.review.saturating_sub(1);
        }
        Ok(id)
    }

    /// Drop a card from the in-memory new and review queues. Returns true if
    /// it was queued.
    pub fn discard(&mut self, card_id: CardId) -> bool {
        let before = self.new_queue.len() + self.review_queue.len();
        self.new_queue.retain(|id| *id != card_id);
        self.review_queue.retain(|id| *id != card_id);
        before != self.new_queue.len() + self.review_queue.len()
    }

    /// True if a card popped from `source` still belongs to it in the store.
    /// Cards changed behind the session's back fail this.
    pub fn still_holds(&self, card: &Card, source: QueueSource) -> bool {
        source.holds(card.queue) && self.active_decks.contains(&card.deck_id)
    }

    /// True if the card sits in any in-memory queue.
    pub fn is_queued(&self, card_id: CardId) -> bool {
        self.new_queue.contains(&card_id)
            || self.review_queue.contains(&card_id)
            || self.day_learn_queue.contains(&card_id)
            || self
                .learn_queue
                .iter()
                .any(|Reverse((_, id))| *id == card_id)
    }
}

/// Per-day allowance of every deck in the collection, from the counters
/// stored on the decks.
fn limit_tracker<S>(store: &S, today: u32, kind: LimitKind) -> Result<LimitTracker>
where
    S: CollectionStore,
    SchedulerError: From<S::Error>,
{
    let decks = store.all_decks()?;
    let mut per_day: HashMap<DeckId, u32> = HashMap::with_capacity(decks.len());
    for deck in &decks {
        let limit = if deck.is_filtered() {
            FILTERED_REPORT_LIMIT
        } else {
            let config = store.deck_config_for(deck.id)?;
            match kind {
                LimitKind::New => config.new.per_day,
                LimitKind::Review => config.review.per_day,
            }
        };
        per_day.insert(deck.id, limit);
    }
    Ok(LimitTracker::build(&decks, today, kind, |deck: &Deck| {
        per_day.get(&deck.id).copied().unwrap_or_default()
    }))
}

impl<S> Scheduler<S>
where
    S: CollectionStore,
    SchedulerError: From<S::Error>,
{
    /// Build the session if missing or if the study day has rolled over.
    pub(super) fn ensure_session(&mut self) -> Result<()> {
        let now = self.clock.now_secs();
        match &self.session {
            Some(session) if now < session.timing.next_day_at => return Ok(()),
            Some(_) => debug!("study day rolled over, rebuilding session"),
            None => {}
        }
        self.session = None;
        let session = self.build_session()?;
        self.session = Some(session);
        Ok(())
    }

    fn build_session(&mut self) -> Result<SchedulerSession> {
        let mut config = self.store.collection_config()?;
        let timing = SchedTimingToday::now(
            self.clock.as_ref(),
            config.created_secs,
            config.rollover_hour,
        );
        if config.last_unburied < timing.days_elapsed {
            config.last_unburied = timing.days_elapsed;
            let updated = config.clone();
            self.transact(|sched| {
                sched.unbury_all()?;
                sched.store.set_collection_config(&updated)?;
                Ok(())
            })?;
        }
        SchedulerSession::build(
            &self.store,
            self.root_deck,
            timing,
            config,
            self.clock.now_secs(),
            self.queue_limit,
        )
    }
}
