//! End-to-end scenarios for the commitment ledger and both trigger engines

use cascade_common::CascadeError;
use cascade_integration_tests::{key, new_book, new_pledger, Hook, MockPayload};
use cascade_trigger::instructions::{process_commit, process_trigger, process_withdraw};

const USER: u8 = 1;
const CALLER: u8 = 9;

fn commit(
    book: &mut cascade_trigger::state::TriggerBook,
    pledger: &mut cascade_trigger::state::Pledger,
    payload: &mut MockPayload,
    level: u64,
    size: u64,
) -> u32 {
    let payment = payload.payment_for(size);
    process_commit(book, pledger, payload, &key(USER), level, size, payment).unwrap()
}

#[test]
fn unbounded_trigger_performs_each_commitment_once() {
    let mut book = new_book(0);
    let mut pledger = new_pledger(key(USER));
    let mut payload = MockPayload::new(1000, 0); // 10%

    commit(&mut book, &mut pledger, &mut payload, 5, 20);
    commit(&mut book, &mut pledger, &mut payload, 5, 40);

    let payout = process_trigger(&mut book, &mut payload, &key(CALLER), &[5]).unwrap();

    assert_eq!(payout, 6); // fee(20) + fee(40)
    assert_eq!(payload.raised, 60);
    assert!(book.bucket(5).is_none());
    assert_eq!(pledger.pending(&book).count(), 0);

    // Exactly one action per commitment, in insertion order
    let actions: Vec<_> = payload
        .calls
        .iter()
        .filter(|c| matches!(c, Hook::PerformAction { .. }))
        .collect();
    assert_eq!(
        actions,
        vec![
            &Hook::PerformAction { size: 20, total_before: 0, consumed: 20 },
            &Hook::PerformAction { size: 40, total_before: 20, consumed: 40 },
        ]
    );
}

#[test]
fn payout_transfer_is_the_last_hook_of_a_trigger() {
    let mut book = new_book(0);
    let mut pledger = new_pledger(key(USER));
    let mut payload = MockPayload::new(1000, 0);

    commit(&mut book, &mut pledger, &mut payload, 5, 50);
    process_trigger(&mut book, &mut payload, &key(CALLER), &[5]).unwrap();

    // All ledger mutation happens before the outward transfer: the payout
    // is the final hook invocation, exactly once
    let payouts = payload
        .calls
        .iter()
        .filter(|c| matches!(c, Hook::PayCaller { .. }))
        .count();
    assert_eq!(payouts, 1);
    assert_eq!(payload.calls.last(), Some(&Hook::PayCaller { amount: 5 }));
}

#[test]
fn withdrawing_twice_fails_and_never_double_refunds() {
    let mut book = new_book(0);
    let mut pledger = new_pledger(key(USER));
    let mut payload = MockPayload::new(500, 0);

    let id = commit(&mut book, &mut pledger, &mut payload, 5, 100);
    process_withdraw(&mut book, &mut pledger, &mut payload, &key(USER), id).unwrap();

    assert_eq!(
        process_withdraw(&mut book, &mut pledger, &mut payload, &key(USER), id),
        Err(CascadeError::BadId)
    );
    let refunds = payload
        .calls
        .iter()
        .filter(|c| matches!(c, Hook::Refund { .. }))
        .count();
    assert_eq!(refunds, 1);
    assert_eq!(payload.refunded, 105);
    assert!(payload.conserved());
}

#[test]
fn malformed_batches_are_rejected_before_any_mutation() {
    let mut book = new_book(0);
    let mut pledger = new_pledger(key(USER));
    let mut payload = MockPayload::new(0, 0);

    commit(&mut book, &mut pledger, &mut payload, 5, 10);
    let calls_before = payload.calls.len();
    let seqno_before = book.seqno;

    for batch in [&[5u64, 5][..], &[7, 5], &[0], &[5, 0]] {
        let err = process_trigger(&mut book, &mut payload, &key(CALLER), batch).unwrap_err();
        assert!(matches!(err, CascadeError::BadTrigger(_)));
    }

    assert_eq!(book.seqno, seqno_before);
    assert_eq!(book.bucket(5).unwrap().total_size, 10);
    assert_eq!(payload.calls.len(), calls_before);
}

#[test]
fn insufficient_aggregate_math_performs_no_action() {
    let mut book = new_book(0);
    let mut pledger = new_pledger(key(USER));
    let mut payload = MockPayload::new(0, 0);

    commit(&mut book, &mut pledger, &mut payload, 20, 10);
    assert_eq!(
        process_trigger(&mut book, &mut payload, &key(CALLER), &[20]),
        Err(CascadeError::BadTriggerMath)
    );

    assert_eq!(payload.raised, 0);
    assert!(payload
        .calls
        .iter()
        .all(|c| !matches!(c, Hook::PerformAction { .. })));
    assert_eq!(book.bucket(20).unwrap().total_size, 10);
}

#[test]
fn capped_engine_stops_exactly_at_capacity() {
    let mut book = new_book(10);
    let mut pledger = new_pledger(key(USER));
    let mut payload = MockPayload::new(0, 10);

    commit(&mut book, &mut pledger, &mut payload, 5, 6);
    commit(&mut book, &mut pledger, &mut payload, 5, 4);

    process_trigger(&mut book, &mut payload, &key(CALLER), &[5]).unwrap();

    assert!(book.is_stopped());
    assert_eq!(payload.raised, 10);
    assert_eq!(pledger.pending(&book).count(), 0);

    // Stopped is permanent: commits and triggers are refused, and there
    // is nothing left to withdraw
    assert_eq!(
        process_commit(&mut book, &mut pledger, &mut payload, &key(USER), 8, 1, 1),
        Err(CascadeError::Stopped)
    );
    assert_eq!(
        process_trigger(&mut book, &mut payload, &key(CALLER), &[8]),
        Err(CascadeError::Stopped)
    );
}

#[test]
fn capped_engine_freezes_partial_item_with_precomputed_reserve() {
    let mut book = new_book(1000);
    let mut pledger = new_pledger(key(USER));
    let mut payload = MockPayload::new(1000, 1000); // 10%

    commit(&mut book, &mut pledger, &mut payload, 500, 900);
    let id2 = commit(&mut book, &mut pledger, &mut payload, 500, 200);

    let payout = process_trigger(&mut book, &mut payload, &key(CALLER), &[500]).unwrap();

    // 900 consumed in full, then 100 of 200; the caller is paid for the
    // consumed sizes only: fee(900) + (fee(200) - fee(100))
    assert_eq!(payout, 100);
    assert!(book.is_stopped());
    assert_eq!(book.stop.level, 500);
    assert_eq!(book.stop.index, 1);
    assert_eq!(book.stop.leftover_fee, 10);

    // The remainder is still pending and withdrawable for exactly the
    // unconsumed size plus the precomputed leftover reserve
    let pending: Vec<_> = pledger.pending(&book).collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].size, 100);

    process_withdraw(&mut book, &mut pledger, &mut payload, &key(USER), id2).unwrap();
    assert_eq!(payload.calls.last(), Some(&Hook::Refund { size: 100, fee: 10 }));
    assert!(payload.conserved());
    assert_eq!(payload.balance, 0);
}

#[test]
fn fee_reserves_of_untriggered_buckets_are_untouched() {
    let mut book = new_book(0);
    let mut pledger = new_pledger(key(USER));
    let mut payload = MockPayload::new(1000, 0);

    commit(&mut book, &mut pledger, &mut payload, 5, 30);
    commit(&mut book, &mut pledger, &mut payload, 40, 20);

    let payout = process_trigger(&mut book, &mut payload, &key(CALLER), &[5]).unwrap();

    assert_eq!(payout, 3); // fee(30) only
    assert_eq!(book.bucket(40).unwrap().total_fee_reserve, 2);
    assert_eq!(book.bucket(40).unwrap().total_size, 20);
    assert!(payload.conserved());
}

#[test]
fn a_failing_action_hook_aborts_the_whole_trigger() {
    let mut book = new_book(0);
    let mut pledger = new_pledger(key(USER));
    let mut payload = MockPayload::new(0, 0);

    commit(&mut book, &mut pledger, &mut payload, 5, 10);
    commit(&mut book, &mut pledger, &mut payload, 5, 7);
    payload.fail_action_on_size = Some(7);

    assert_eq!(
        process_trigger(&mut book, &mut payload, &key(CALLER), &[5]),
        Err(CascadeError::ActionFailed)
    );
    // No payout was disbursed for the aborted call
    assert!(payload
        .calls
        .iter()
        .all(|c| !matches!(c, Hook::PayCaller { .. })));
}

#[test]
fn pending_listing_tracks_the_full_lifecycle() {
    let mut book = new_book(0);
    let mut pledger = new_pledger(key(USER));
    let mut payload = MockPayload::new(0, 0);

    let id0 = commit(&mut book, &mut pledger, &mut payload, 5, 10);
    commit(&mut book, &mut pledger, &mut payload, 8, 20);
    commit(&mut book, &mut pledger, &mut payload, 5, 30);

    let pending: Vec<_> = pledger.pending(&book).collect();
    assert_eq!(pending.len(), 3);
    assert_eq!(pending[0].id, id0);
    assert_eq!(pending[1].level, 8);

    process_withdraw(&mut book, &mut pledger, &mut payload, &key(USER), id0).unwrap();
    process_trigger(&mut book, &mut payload, &key(CALLER), &[5]).unwrap();

    // Only the level-8 commitment survives the withdrawal + trigger
    let pending: Vec<_> = pledger.pending(&book).collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].level, 8);
    assert_eq!(pending[0].size, 20);
}
