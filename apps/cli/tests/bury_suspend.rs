//! Burying, sibling burying and suspension.

mod common;

use common::fixtures;
use common::{TestContext, DEFAULT_DECK};
use pretty_assertions::assert_eq;
use scheduler_core::deck::{FilterKind, FilteredOrder};
use scheduler_core::types::{CardQueue, CardType, Due};
use scheduler_core::{CollectionStore, FilteredDeck, UnburyMode};

#[test]
fn test_manual_bury_until_unburied() {
    let mut ctx = TestContext::new();
    let ids = ctx.add_cards(DEFAULT_DECK, 2);

    assert_eq!(ctx.sched.bury_cards(&ids[..1]).unwrap(), 1);
    assert_eq!(ctx.card(ids[0]).queue, CardQueue::UserBuried);
    assert_eq!(ctx.sched.counts().unwrap().new, 1);

    assert_eq!(ctx.sched.unbury_deck(DEFAULT_DECK, UnburyMode::Siblings).unwrap(), 0);
    assert_eq!(ctx.sched.unbury_deck(DEFAULT_DECK, UnburyMode::Manual).unwrap(), 1);
    assert_eq!(ctx.card(ids[0]).queue, CardQueue::New);
    assert_eq!(ctx.sched.counts().unwrap().new, 2);
}

#[test]
fn test_suspended_cards_cannot_be_buried() {
    let mut ctx = TestContext::new();
    let ids = ctx.add_cards(DEFAULT_DECK, 1);

    assert_eq!(ctx.sched.suspend_cards(&ids).unwrap(), 1);
    assert_eq!(ctx.sched.suspend_cards(&ids).unwrap(), 0);
    assert_eq!(ctx.sched.bury_cards(&ids).unwrap(), 0);
    assert_eq!(ctx.card(ids[0]).queue, CardQueue::Suspended);
}

#[test]
fn test_answering_buries_siblings_when_configured() {
    let mut ctx = TestContext::with_config(fixtures::bury_new_siblings);
    let (_, cards) = ctx.repo().add_note(DEFAULT_DECK, "front\tback", 2).unwrap();
    ctx.sched.reset();
    assert_eq!(ctx.sched.counts().unwrap().new, 2);

    let answered = ctx.answer_next(3);
    assert_eq!(answered.id, cards[0]);
    assert_eq!(ctx.card(cards[1]).queue, CardQueue::SchedulerBuried);

    // The buried sibling is gone from today's session; only the learning
    // card is left.
    let next = ctx.sched.get_next_card().unwrap().unwrap();
    assert_eq!(next.id, cards[0]);
    assert_eq!(ctx.sched.counts().unwrap().new, 0);

    ctx.clock.advance_days(1);
    assert_eq!(ctx.sched.counts().unwrap().new, 1);
    assert_eq!(ctx.card(cards[1]).queue, CardQueue::New);
}

#[test]
fn test_siblings_stay_unburied_by_default() {
    let mut ctx = TestContext::new();
    let (_, cards) = ctx.repo().add_note(DEFAULT_DECK, "front\tback", 2).unwrap();
    ctx.sched.reset();

    ctx.answer_next(3);
    assert_eq!(ctx.card(cards[1]).queue, CardQueue::New);
}

#[test]
fn test_siblings_can_be_buried_when_shown() {
    let mut ctx = TestContext::with_config(fixtures::bury_new_siblings);
    let mut collection = ctx.repo().collection_config().unwrap();
    collection.bury_siblings_on_answer = false;
    ctx.sched
        .store_mut()
        .set_collection_config(&collection)
        .unwrap();
    let (_, cards) = ctx.repo().add_note(DEFAULT_DECK, "front\tback", 2).unwrap();
    ctx.sched.reset();

    let shown = ctx.sched.get_next_card().unwrap().unwrap();
    assert_eq!(shown.id, cards[0]);
    assert_eq!(ctx.card(cards[1]).queue, CardQueue::SchedulerBuried);
}

#[test]
fn test_bury_notes_takes_every_card() {
    let mut ctx = TestContext::new();
    let (note, cards) = ctx.repo().add_note(DEFAULT_DECK, "front\tback", 3).unwrap();
    ctx.sched.suspend_cards(&cards[..1]).unwrap();

    assert_eq!(ctx.sched.bury_notes(&[note]).unwrap(), 2);
    assert_eq!(ctx.card(cards[0]).queue, CardQueue::Suspended);
    assert_eq!(ctx.card(cards[1]).queue, CardQueue::UserBuried);
    assert_eq!(ctx.card(cards[2]).queue, CardQueue::UserBuried);

    ctx.clock.advance_days(1);
    ctx.sched.counts().unwrap();
    assert_eq!(ctx.card(cards[1]).queue, CardQueue::New);
    assert_eq!(ctx.card(cards[0]).queue, CardQueue::Suspended);
}

#[test]
fn test_unsuspending_a_learning_card_restores_its_queue() {
    let mut ctx = TestContext::new();
    let id = ctx.add_cards(DEFAULT_DECK, 1)[0];
    let learning = ctx.answer_next(3);
    assert!(matches!(learning.due, Due::Deadline(_)));

    ctx.sched.suspend_cards(&[id]).unwrap();
    let suspended = ctx.card(id);
    assert_eq!(suspended.queue, CardQueue::Suspended);
    assert_eq!(suspended.due, learning.due);
    assert_eq!(ctx.sched.counts().unwrap().learning, 0);

    ctx.sched.unsuspend_cards(&[id]).unwrap();
    assert_eq!(ctx.card(id).queue, CardQueue::Learning);
    assert_eq!(ctx.sched.counts().unwrap().learning, 1);
}

#[test]
fn test_unburying_an_unknown_deck_fails() {
    let mut ctx = TestContext::new();
    assert!(ctx.sched.unbury_deck(999, UnburyMode::All).is_err());
}

#[test]
fn test_filtered_review_siblings_stay_unburied() {
    let mut ctx = TestContext::with_config(fixtures::bury_new_siblings);
    let (_, cards) = ctx.repo().add_note(DEFAULT_DECK, "front\tback", 2).unwrap();
    let mut review = ctx.card(cards[1]);
    review.card_type = CardType::Review;
    review.queue = CardQueue::Review;
    review.due = Due::Day(5);
    review.interval = 10;
    review.ease_factor = 2500;
    review.reps = 3;
    review.lapses = 1;
    ctx.save(&review);

    let lapsed = ctx
        .repo()
        .add_filtered_deck(
            "Lapsed",
            FilteredDeck {
                terms: vec![fixtures::term(
                    FilterKind::Lapsed { min_lapses: 1 },
                    FilteredOrder::Due,
                    10,
                    &[DEFAULT_DECK],
                )],
                reschedule: true,
                preview_delay_mins: 10,
            },
        )
        .unwrap();
    assert_eq!(ctx.sched.rebuild_filtered_deck(lapsed).unwrap(), 1);
    let moved = ctx.card(cards[1]);
    assert_eq!(moved.queue, CardQueue::Review);
    assert!(matches!(moved.due, Due::Position(p) if p < 0));

    let answered = ctx.answer_next(3);
    assert_eq!(answered.id, cards[0]);
    assert_eq!(ctx.card(cards[1]), moved);
}
