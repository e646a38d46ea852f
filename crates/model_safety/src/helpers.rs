//! Invariant checking helpers

use crate::math::*;
use crate::state::*;

/// Bucket totals track their live entries exactly
pub fn bucket_totals_ok(s: &State) -> bool {
    s.buckets.iter().all(|b| {
        let live: u128 = b
            .entries
            .iter()
            .fold(0u128, |acc, e| add_u128(acc, e.size));
        b.total_size == live
    })
}

/// A bucket's fee reserve equals the reserves owed for its live entries,
/// with the stop item contributing its precomputed leftover instead of a
/// freshly priced reserve
pub fn bucket_fees_ok(s: &State) -> bool {
    s.buckets.iter().all(|b| {
        let mut expected = 0u128;
        for (i, e) in b.entries.iter().enumerate() {
            if e.size == 0 {
                continue;
            }
            let is_stop_item = s.stopped() && s.stop.level == b.level && s.stop.index == i;
            let fee = if is_stop_item {
                s.stop.leftover_fee
            } else {
                fee_u128(e.size, s.params.fee_bps)
            };
            expected = add_u128(expected, fee);
        }
        b.total_fee == expected
    })
}

/// Custody conservation: every unit that ever entered the treasury is
/// either still held, forwarded to the beneficiary, paid to a trigger
/// caller, or refunded
pub fn custody_conservation_ok(s: &State) -> bool {
    let out = add_u128(add_u128(s.forwarded, s.fees_paid), s.refunded);
    s.deposited == add_u128(s.treasury, out)
}

/// The stop marker never unsets and never moves
pub fn stop_preserved(before: &State, after: &State) -> bool {
    if before.stop.level == 0 {
        return true;
    }
    after.stop.level == before.stop.level && after.stop.index == before.stop.index
}

/// Ledger portion of the state is unchanged (buckets, refs, stop)
pub fn ledger_unchanged(before: &State, after: &State) -> bool {
    before.buckets == after.buckets && before.refs == after.refs && before.stop == after.stop
}

/// Balances unchanged between two states
pub fn balances_unchanged(before: &State, after: &State) -> bool {
    before.treasury == after.treasury
        && before.raised == after.raised
        && before.forwarded == after.forwarded
        && before.fees_paid == after.fees_paid
        && before.refunded == after.refunded
}

/// Number of references that still resolve to a live entry
pub fn pending_count(s: &State) -> usize {
    let mut count = 0;
    for r in s.refs.iter() {
        if r.level == 0 {
            continue;
        }
        if s.stopped() && s.stop.level == r.level && r.index < s.stop.index {
            continue;
        }
        let live = s
            .buckets
            .iter()
            .find(|b| b.level == r.level)
            .and_then(|b| b.entries.get(r.index))
            .map(|e| e.size != 0)
            .unwrap_or(false);
        if live {
            count += 1;
        }
    }
    count
}
