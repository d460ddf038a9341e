//! Taking back the last answer.

mod common;

use common::fixtures;
use common::{TestContext, DEFAULT_DECK};
use pretty_assertions::assert_eq;
use scheduler_core::leech::LEECH_TAG;
use scheduler_core::types::CardQueue;
use scheduler_core::{CollectionStore, SchedulerError};

#[test]
fn test_undo_restores_card_revlog_and_counters() {
    let mut ctx = TestContext::new();
    let ids = ctx.add_cards(DEFAULT_DECK, 2);
    let before = ctx.card(ids[0]);

    let answered = ctx.answer_next(3);
    assert_eq!(answered.id, ids[0]);
    assert!(ctx.sched.can_undo());

    let restored = ctx.sched.undo_last_answer().unwrap();
    assert_eq!(restored, before);
    assert_eq!(ctx.card(ids[0]), before);
    assert!(ctx.repo().revlog_for_card(ids[0]).unwrap().is_empty());
    let deck = ctx.repo().get_deck(DEFAULT_DECK).unwrap().unwrap();
    assert_eq!(deck.today.new_studied, 0);
    assert_eq!(deck.today.millis_studied, 0);

    assert!(!ctx.sched.can_undo());
    assert!(matches!(
        ctx.sched.undo_last_answer(),
        Err(SchedulerError::NothingToUndo)
    ));

    assert_eq!(ctx.sched.counts().unwrap().new, 2);
    let next = ctx.sched.get_next_card().unwrap().unwrap();
    assert_eq!(next.id, ids[0]);
}

#[test]
fn test_undo_unburies_siblings() {
    let mut ctx = TestContext::with_config(fixtures::bury_new_siblings);
    let (_, cards) = ctx.repo().add_note(DEFAULT_DECK, "front\tback", 2).unwrap();
    ctx.sched.reset();

    ctx.answer_next(3);
    assert_eq!(ctx.card(cards[1]).queue, CardQueue::SchedulerBuried);

    ctx.sched.undo_last_answer().unwrap();
    assert_eq!(ctx.card(cards[0]).queue, CardQueue::New);
    assert_eq!(ctx.card(cards[1]).queue, CardQueue::New);
}

#[test]
fn test_undo_removes_a_leech_tag_it_added() {
    let mut ctx = TestContext::with_config(fixtures::suspending_leeches(1));
    let id = ctx.add_review_card(10, 2500, 0);
    let note_id = ctx.card(id).note_id;

    let card = ctx.answer_next(1);
    assert_eq!(card.queue, CardQueue::Suspended);
    assert!(ctx.repo().note_has_tag(note_id, LEECH_TAG).unwrap());

    ctx.sched.undo_last_answer().unwrap();
    assert!(!ctx.repo().note_has_tag(note_id, LEECH_TAG).unwrap());
    let card = ctx.card(id);
    assert_eq!(card.queue, CardQueue::Review);
    assert_eq!(card.lapses, 0);
}

#[test]
fn test_other_changes_clear_the_undo_entry() {
    let mut ctx = TestContext::new();
    let ids = ctx.add_cards(DEFAULT_DECK, 2);

    let answered = ctx.answer_next(3);
    let other = if answered.id == ids[0] { ids[1] } else { ids[0] };
    ctx.sched.suspend_cards(&[other]).unwrap();

    assert!(!ctx.sched.can_undo());
    assert!(matches!(
        ctx.sched.undo_last_answer(),
        Err(SchedulerError::NothingToUndo)
    ));
}
