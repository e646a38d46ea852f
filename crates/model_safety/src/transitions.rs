//! State transition functions - all total, no panics
//!
//! Invalid input leaves the state unchanged, mirroring the program's
//! fail-fast-with-no-partial-effect contract.

use arrayvec::ArrayVec;

use crate::math::*;
use crate::state::*;

/// Register a commitment of `size` at `level`
pub fn commit(mut s: State, level: u128, size: u128) -> State {
    if s.stopped() || size == 0 || level == 0 {
        return s;
    }
    if level <= s.raised {
        return s;
    }
    if s.params.max_size != 0 {
        if level > s.params.max_size {
            return s;
        }
        if size > sub_u128(s.params.max_size, s.raised) {
            return s;
        }
    }
    if s.refs.is_full() {
        return s;
    }

    // Capacity must be checked before any balance moves
    let existing = s.buckets.iter().position(|b| b.level == level);
    match existing {
        Some(bi) => {
            if s.buckets[bi].entries.is_full() {
                return s;
            }
        }
        None => {
            if s.buckets.is_full() {
                return s;
            }
        }
    }

    let bi = match existing {
        Some(bi) => bi,
        None => {
            let _ = s.buckets.try_push(Bucket {
                level,
                total_size: 0,
                total_fee: 0,
                entries: ArrayVec::new(),
            });
            s.buckets.len() - 1
        }
    };

    let fee = fee_u128(size, s.params.fee_bps);
    let index = s.buckets[bi].entries.len();
    let _ = s.buckets[bi].entries.try_push(Entry { size });
    s.buckets[bi].total_size = add_u128(s.buckets[bi].total_size, size);
    s.buckets[bi].total_fee = add_u128(s.buckets[bi].total_fee, fee);

    let payment = add_u128(size, fee);
    s.treasury = add_u128(s.treasury, payment);
    s.deposited = add_u128(s.deposited, payment);
    let _ = s.refs.try_push(Ref { level, index });
    s
}

/// Withdraw the commitment behind reference `id`
pub fn withdraw(mut s: State, id: usize) -> State {
    if id >= s.refs.len() {
        return s;
    }
    let r = s.refs[id];
    if r.level == 0 {
        return s;
    }
    if s.stopped() && s.stop.level == r.level && r.index < s.stop.index {
        return s;
    }
    let was_stop_item = s.stopped() && s.stop.level == r.level && s.stop.index == r.index;

    let bi = match s.buckets.iter().position(|b| b.level == r.level) {
        Some(bi) => bi,
        None => return s,
    };
    if r.index >= s.buckets[bi].entries.len() {
        return s;
    }
    let size = s.buckets[bi].entries[r.index].size;
    if size == 0 {
        return s;
    }

    let fee = if was_stop_item {
        min_u128(s.stop.leftover_fee, s.buckets[bi].total_fee)
    } else {
        fee_u128(size, s.params.fee_bps)
    };

    s.buckets[bi].total_size = sub_u128(s.buckets[bi].total_size, size);
    s.buckets[bi].total_fee = sub_u128(s.buckets[bi].total_fee, fee);
    s.buckets[bi].entries[r.index].size = 0;
    if was_stop_item {
        s.stop.leftover_fee = 0;
    }
    s.refs[id] = Ref::default();

    let due = add_u128(size, fee);
    s.treasury = sub_u128(s.treasury, due);
    s.refunded = add_u128(s.refunded, due);
    s
}

/// Execute a trigger batch
pub fn trigger(mut s: State, levels: &[u128]) -> State {
    if s.stopped() || levels.is_empty() {
        return s;
    }
    let mut prev = 0u128;
    for &level in levels {
        if level == 0 || level <= prev {
            return s;
        }
        prev = level;
    }
    let last = prev;
    let capped = s.params.max_size != 0;

    let mut predicted = s.raised;
    for &level in levels {
        let bucket_total = s
            .buckets
            .iter()
            .find(|b| b.level == level)
            .map(|b| b.total_size)
            .unwrap_or(0);
        predicted = add_u128(predicted, bucket_total);
        if capped && predicted >= s.params.max_size {
            predicted = s.params.max_size;
            break;
        }
    }
    if predicted < last {
        return s;
    }

    let mut payout = 0u128;
    'levels: for &level in levels {
        let bi = match s.buckets.iter().position(|b| b.level == level) {
            Some(bi) => bi,
            None => continue,
        };
        let bucket_total = s.buckets[bi].total_size;

        if capped && add_u128(s.raised, bucket_total) >= s.params.max_size {
            let len = s.buckets[bi].entries.len();
            let mut i = 0;
            while i < len {
                let size = s.buckets[bi].entries[i].size;
                if size == 0 {
                    i += 1;
                    continue;
                }
                let item_fee = fee_u128(size, s.params.fee_bps);
                let consumed = min_u128(size, sub_u128(s.params.max_size, s.raised));
                s.raised = add_u128(s.raised, consumed);
                s.treasury = sub_u128(s.treasury, consumed);
                s.forwarded = add_u128(s.forwarded, consumed);

                if s.raised >= s.params.max_size {
                    let remainder = sub_u128(size, consumed);
                    if remainder == 0 {
                        payout = add_u128(payout, item_fee);
                        s.buckets[bi].total_size = sub_u128(s.buckets[bi].total_size, consumed);
                        s.buckets[bi].total_fee = sub_u128(s.buckets[bi].total_fee, item_fee);
                        s.buckets[bi].entries[i].size = 0;
                        let next = i + 1;
                        let next_size = if next < len {
                            s.buckets[bi].entries[next].size
                        } else {
                            0
                        };
                        s.stop = Stop {
                            level,
                            index: next,
                            leftover_fee: fee_u128(next_size, s.params.fee_bps),
                        };
                    } else {
                        let leftover = fee_u128(remainder, s.params.fee_bps);
                        let consumed_fee = sub_u128(item_fee, leftover);
                        payout = add_u128(payout, consumed_fee);
                        s.buckets[bi].total_size = sub_u128(s.buckets[bi].total_size, consumed);
                        s.buckets[bi].total_fee = sub_u128(s.buckets[bi].total_fee, consumed_fee);
                        s.buckets[bi].entries[i].size = remainder;
                        s.stop = Stop {
                            level,
                            index: i,
                            leftover_fee: leftover,
                        };
                    }
                    break 'levels;
                }

                payout = add_u128(payout, item_fee);
                s.buckets[bi].total_size = sub_u128(s.buckets[bi].total_size, consumed);
                s.buckets[bi].total_fee = sub_u128(s.buckets[bi].total_fee, item_fee);
                s.buckets[bi].entries[i].size = 0;
                i += 1;
            }
        } else {
            let len = s.buckets[bi].entries.len();
            let mut i = 0;
            while i < len {
                let size = s.buckets[bi].entries[i].size;
                if size != 0 {
                    s.raised = add_u128(s.raised, size);
                    s.treasury = sub_u128(s.treasury, size);
                    s.forwarded = add_u128(s.forwarded, size);
                }
                i += 1;
            }
            payout = add_u128(payout, s.buckets[bi].total_fee);
            s.buckets.remove(bi);
        }
    }

    s.treasury = sub_u128(s.treasury, payout);
    s.fees_paid = add_u128(s.fees_paid, payout);
    s
}
