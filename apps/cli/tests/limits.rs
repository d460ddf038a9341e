//! Daily limits across the deck tree.

mod common;

use common::fixtures;
use common::{TestContext, DEFAULT_DECK};
use pretty_assertions::assert_eq;
use scheduler_core::types::DeckId;
use scheduler_core::{CardQueue, CollectionStore, DeckConfig};

fn add_deck_with_new_limit(ctx: &mut TestContext, name: &str, per_day: u32) -> DeckId {
    let mut config = DeckConfig {
        name: name.to_string(),
        ..DeckConfig::default()
    };
    config.new.per_day = per_day;
    let config_id = ctx.repo().add_deck_config(&config).unwrap();
    ctx.repo().add_deck(name, config_id).unwrap()
}

fn new_count(ctx: &mut TestContext, deck_id: DeckId) -> u32 {
    ctx.sched.select_deck(deck_id);
    ctx.sched.counts().unwrap().new
}

#[test]
fn test_children_never_exceed_their_parents() {
    let mut ctx = TestContext::new();
    let a = add_deck_with_new_limit(&mut ctx, "A", 3);
    let b = add_deck_with_new_limit(&mut ctx, "A::B", 5);
    let c = add_deck_with_new_limit(&mut ctx, "A::B::C", 10);
    ctx.add_cards(c, 4);
    ctx.add_cards(b, 2);

    let counts = [new_count(&mut ctx, c), new_count(&mut ctx, b), new_count(&mut ctx, a)];
    assert_eq!(counts, [3, 3, 3]);
    assert!(counts[0] <= counts[1] && counts[1] <= counts[2]);
}

#[test]
fn test_parent_limit_is_shared_between_children() {
    let mut ctx = TestContext::new();
    let lang = add_deck_with_new_limit(&mut ctx, "Lang", 4);
    let jp = add_deck_with_new_limit(&mut ctx, "Lang::Jp", 3);
    let de = add_deck_with_new_limit(&mut ctx, "Lang::De", 3);
    ctx.add_cards(jp, 5);
    ctx.add_cards(de, 5);

    assert_eq!(new_count(&mut ctx, jp), 3);
    assert_eq!(new_count(&mut ctx, de), 3);
    // "Lang::De" sorts first and takes 3; "Lang::Jp" gets what is left.
    assert_eq!(new_count(&mut ctx, lang), 4);
}

#[test]
fn test_studied_cards_use_up_the_limit_until_tomorrow() {
    let mut ctx = TestContext::with_config(fixtures::two_new_per_day);
    ctx.add_cards(DEFAULT_DECK, 3);

    ctx.answer_next(4);
    ctx.answer_next(4);
    assert_eq!(ctx.sched.counts().unwrap().new, 0);
    assert!(ctx.sched.get_next_card().unwrap().is_none());

    let deck = ctx.repo().get_deck(DEFAULT_DECK).unwrap().unwrap();
    assert_eq!(deck.today.new_studied, 2);
    assert_eq!(deck.today.day, 0);

    ctx.clock.advance_days(1);
    assert_eq!(ctx.sched.counts().unwrap().new, 1);
}

#[test]
fn test_extending_limits_allows_more_today() {
    let mut ctx = TestContext::with_config(fixtures::two_new_per_day);
    ctx.add_cards(DEFAULT_DECK, 3);
    ctx.answer_next(4);
    ctx.answer_next(4);
    assert_eq!(ctx.sched.counts().unwrap().new, 0);

    ctx.sched.extend_limits(DEFAULT_DECK, 1, 0).unwrap();
    assert_eq!(ctx.sched.counts().unwrap().new, 1);
    let card = ctx.sched.get_next_card().unwrap().unwrap();
    assert_eq!(card.queue, CardQueue::New);
}

#[test]
fn test_review_limit_caps_the_queue() {
    let mut ctx = TestContext::with_config(|config| config.review.per_day = 2);
    for _ in 0..3 {
        ctx.add_review_card(10, 2500, 0);
    }

    assert_eq!(ctx.sched.counts().unwrap().review, 2);
    ctx.answer_next(3);
    ctx.answer_next(3);
    assert!(ctx.sched.get_next_card().unwrap().is_none());

    ctx.sched.extend_limits(DEFAULT_DECK, 0, 1).unwrap();
    assert_eq!(ctx.sched.counts().unwrap().review, 1);
}
