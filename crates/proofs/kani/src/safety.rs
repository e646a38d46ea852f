//! Kani safety proofs for the ledger invariants

use kani::any;
use model_safety::{helpers::*, state::*, transitions::*};

use crate::adversary::adversary_step;
use crate::generators::{any_level, any_reachable_state, any_size};

/// Bucket totals always equal the sum of their live entries, and fee
/// reserves track the stop-adjusted per-entry reserves
#[kani::proof]
#[kani::unwind(8)]
fn bucket_totals_conserved() {
    let s = any_reachable_state();
    kani::assert(
        bucket_totals_ok(&s),
        "bucket total_size must equal the sum of live entry sizes",
    );
    kani::assert(
        bucket_fees_ok(&s),
        "bucket total_fee must equal the stop-adjusted live reserves",
    );
}

/// Every unit that entered custody is held, forwarded, paid out, or
/// refunded - never minted or lost
#[kani::proof]
#[kani::unwind(8)]
fn custody_is_conserved() {
    let s = any_reachable_state();
    kani::assert(
        custody_conservation_ok(&s),
        "deposited must equal treasury + forwarded + fees_paid + refunded",
    );
}

/// A second withdrawal of the same id changes nothing
#[kani::proof]
#[kani::unwind(8)]
fn double_withdraw_is_noop() {
    let s = any_reachable_state();
    let id: usize = (any::<u8>() as usize) % MAX_REFS;
    let once = withdraw(s, id);
    let twice = withdraw(once.clone(), id);
    kani::assert(
        once == twice,
        "a spent commitment id must never pay out again",
    );
}

/// Malformed trigger batches leave the state untouched
#[kani::proof]
#[kani::unwind(8)]
fn invalid_batch_mutates_nothing() {
    let s = any_reachable_state();
    let level = any_level();

    let after = trigger(s.clone(), &[level, level]);
    kani::assert(after == s, "a repeated level must be rejected atomically");

    let after = trigger(s.clone(), &[0]);
    kani::assert(after == s, "a zero level must be rejected atomically");
}

/// The stop marker, once set, never unsets and never moves
#[kani::proof]
#[kani::unwind(8)]
fn stop_marker_is_monotone() {
    let s = any_reachable_state();
    let after = adversary_step(s.clone());
    kani::assert(
        stop_preserved(&s, &after),
        "the stop marker is a permanent halt, not a pause",
    );
}

/// A stopped engine refuses commits and triggers outright
#[kani::proof]
#[kani::unwind(8)]
fn stopped_engine_serves_withdrawals_only() {
    let s = any_reachable_state();
    if s.stopped() {
        let after = commit(s.clone(), any_level(), any_size());
        kani::assert(after == s, "commit must be refused after a stop");
        let after = trigger(s.clone(), &[any_level()]);
        kani::assert(after == s, "trigger must be refused after a stop");
    }
}
