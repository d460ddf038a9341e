//! Review answers, lapses and relearning.

mod common;

use common::fixtures;
use common::{TestContext, DEFAULT_DECK};
use pretty_assertions::assert_eq;
use scheduler_core::types::{CardQueue, CardType, Due, RevlogKind};
use scheduler_core::CollectionStore;

#[test]
fn test_lapse_without_steps_shrinks_interval_and_ease() {
    let mut ctx = TestContext::with_config(fixtures::no_relearning);
    let id = ctx.add_review_card(100, 2500, 0);

    let card = ctx.answer_next(1);
    assert_eq!(card.id, id);
    assert_eq!(card.ease_factor, 2300);
    assert_eq!(card.interval, 50);
    assert_eq!(card.lapses, 1);
    assert_eq!(card.card_type, CardType::Review);
    assert_eq!(card.queue, CardQueue::Review);
    assert_eq!(card.due, Due::Day(50));

    let revlog = ctx.repo().revlog_for_card(id).unwrap();
    assert_eq!(revlog.len(), 1);
    assert_eq!(revlog[0].kind, RevlogKind::Review);
    assert_eq!(revlog[0].interval, 50);
    assert_eq!(revlog[0].last_interval, 100);
    assert_eq!(revlog[0].usn, -1);

    let deck = ctx.repo().get_deck(DEFAULT_DECK).unwrap().unwrap();
    assert_eq!(deck.today.review_studied, 1);
    assert_eq!(deck.today.new_studied, 0);
}

#[test]
fn test_ease_stops_at_the_minimum() {
    let mut ctx = TestContext::with_config(fixtures::no_relearning);
    ctx.add_review_card(10, 1400, 0);

    let card = ctx.answer_next(1);
    assert_eq!(card.ease_factor, 1300);
    assert_eq!(card.interval, 5);
}

#[test]
fn test_lapse_with_steps_relearns_then_returns_to_review() {
    let mut ctx = TestContext::new();
    let id = ctx.add_review_card(10, 2500, 0);

    let card = ctx.answer_next(1);
    assert_eq!(card.card_type, CardType::Relearning);
    assert_eq!(card.queue, CardQueue::Learning);
    assert_eq!(card.interval, 1);
    let now = ctx.now();
    match card.due {
        Due::Deadline(due) => assert!((now + 600..now + 750).contains(&due), "due {due}"),
        other => panic!("unexpected due {other:?}"),
    }
    assert_eq!(ctx.sched.counts().unwrap().learning, 1);

    ctx.clock.advance_secs(20 * 60);
    let card = ctx.answer_next(3);
    assert_eq!(card.id, id);
    assert_eq!(card.card_type, CardType::Review);
    assert_eq!(card.queue, CardQueue::Review);
    assert_eq!(card.interval, 1);
    assert_eq!(card.due, Due::Day(1));

    let kinds: Vec<RevlogKind> = ctx
        .repo()
        .revlog_for_card(id)
        .unwrap()
        .into_iter()
        .map(|entry| entry.kind)
        .collect();
    assert_eq!(kinds, vec![RevlogKind::Review, RevlogKind::Relearning]);
}

#[test]
fn test_good_grows_the_interval_by_ease() {
    let mut ctx = TestContext::new();
    ctx.add_review_card(10, 2500, 0);

    let card = ctx.answer_next(3);
    assert!((22..=28).contains(&card.interval), "interval {}", card.interval);
    assert_eq!(card.ease_factor, 2500);
    assert_eq!(card.due, Due::Day(card.interval as i32));
    assert_eq!(card.reps, 4);
}

#[test]
fn test_hard_and_easy_move_the_ease() {
    let mut ctx = TestContext::new();
    ctx.add_review_card(10, 2500, 0);
    let hard = ctx.answer_next(2);
    assert_eq!(hard.ease_factor, 2350);
    assert!((11..=14).contains(&hard.interval), "interval {}", hard.interval);

    let mut ctx = TestContext::new();
    ctx.add_review_card(10, 2500, 0);
    let easy = ctx.answer_next(4);
    assert_eq!(easy.ease_factor, 2650);
    assert!((28..=36).contains(&easy.interval), "interval {}", easy.interval);
}

#[test]
fn test_earliest_due_review_comes_first() {
    let mut ctx = TestContext::new();
    let later = ctx.add_review_card(10, 2500, 2);
    let earlier = ctx.add_review_card(10, 2500, 0);
    ctx.clock.advance_days(3);

    assert_eq!(ctx.sched.counts().unwrap().review, 2);
    let first = ctx.sched.get_next_card().unwrap().unwrap();
    assert_eq!(first.id, earlier);
    ctx.sched.answer_card(first.id, 3).unwrap();
    let second = ctx.sched.get_next_card().unwrap().unwrap();
    assert_eq!(second.id, later);
}

#[test]
fn test_review_previews_skip_fuzz() {
    let mut ctx = TestContext::new();
    let id = ctx.add_review_card(10, 2500, 0);
    let card = ctx.card(id);

    let days: Vec<u64> = (2..=4)
        .map(|ease| ctx.sched.next_interval_preview(&card, ease).unwrap() / 86_400)
        .collect();
    assert_eq!(days, vec![12, 25, 32]);
    assert_eq!(ctx.sched.next_interval_preview(&card, 1).unwrap(), 600);
}

#[test]
fn test_suspended_review_is_not_offered() {
    let mut ctx = TestContext::new();
    let id = ctx.add_review_card(10, 2500, 0);
    let mut card = ctx.card(id);
    card.queue = CardQueue::Suspended;
    ctx.save(&card);

    assert_eq!(ctx.sched.counts().unwrap().review, 0);
    assert!(ctx.sched.get_next_card().unwrap().is_none());
    // The due stays as it was so unsuspending restores the review.
    assert_eq!(ctx.card(id).due, Due::Day(0));

    assert_eq!(ctx.sched.unsuspend_cards(&[id]).unwrap(), 1);
    assert_eq!(ctx.card(id).queue, CardQueue::Review);
    assert_eq!(ctx.sched.counts().unwrap().review, 1);
}
