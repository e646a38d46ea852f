//! Trigger instruction - execute a batch of reached levels
//!
//! The caller submits the levels it believes are reached; the engine
//! verifies the claim against stored bucket totals and executes the
//! batch in one atomic pass. A size-limited deployment additionally
//! predicts capacity overshoot per bucket and, when the prediction
//! fires, consumes that bucket item by item until capacity is met,
//! recording a permanent stop marker at the exact item reached.
//!
//! Ordering contract: every ledger write for a call is final before the
//! fee payout leaves through the payload, so a callback nested inside
//! the transfer observes fully updated state.

use cascade_common::{add_size, sub_size, CascadeError, Payload};
use pinocchio::{msg, pubkey::Pubkey};
use pinocchio_log::log;

use crate::state::{StopMarker, TriggerBook};

/// Execute `levels` (strictly increasing, no zero) and pay the
/// accumulated fee reserves to `caller`. Returns the payout amount.
pub fn process_trigger<P: Payload>(
    book: &mut TriggerBook,
    payload: &mut P,
    caller: &Pubkey,
    levels: &[u64],
) -> Result<u64, CascadeError> {
    if book.is_stopped() {
        return Err(CascadeError::Stopped);
    }
    if levels.is_empty() {
        return Err(CascadeError::InvalidInstruction);
    }

    // Batch shape: strictly increasing, no zero entries. Rejected at the
    // first violation, before any state changes.
    let mut prev = 0u64;
    for &level in levels {
        if level == 0 || level <= prev {
            log!("bad trigger entry {}", level);
            return Err(CascadeError::BadTrigger(level));
        }
        prev = level;
    }
    let last = prev;
    let capped = book.max_size != 0;

    // Aggregate-math check. Stored bucket totals fully determine the
    // outcome, so the claim is verified before any hook or mutation: an
    // insufficient batch has no partial effect.
    let mut predicted = payload.current_size();
    for &level in levels {
        let bucket_total = book.bucket(level).map(|b| b.total_size).unwrap_or(0);
        predicted = add_size(predicted, bucket_total)?;
        if capped && predicted >= book.max_size {
            predicted = book.max_size;
            break;
        }
    }
    if predicted < last {
        return Err(CascadeError::BadTriggerMath);
    }

    let mut total = payload.current_size();
    let mut payout: u64 = 0;

    'levels: for &level in levels {
        let slot = match book.bucket_slot(level) {
            Some(slot) => slot,
            None => {
                // Nothing registered at this level; contributes zero
                log!("triggered: level {}", level);
                continue;
            }
        };

        let bucket_total = book.buckets[slot].total_size;

        if capped && add_size(total, bucket_total)? >= book.max_size {
            // Size-limited path: consume item by item until capacity is
            // met, then freeze.
            let len = book.buckets[slot].len as usize;
            for i in 0..len {
                let entry = book.buckets[slot].entries[i];
                if entry.size == 0 {
                    continue;
                }
                let item_fee = payload.reserved_fee(entry.size)?;
                let consumed = payload.perform_action(&entry.committer, entry.size, total)?;
                if consumed > entry.size {
                    return Err(CascadeError::ActionFailed);
                }
                total = add_size(total, consumed)?;
                if total > book.max_size {
                    // A size-limited payload must clip, never overshoot
                    return Err(CascadeError::ActionFailed);
                }

                if total == book.max_size {
                    // Capacity met at this item
                    let remainder = entry.size - consumed;
                    let bucket = &mut book.buckets[slot];
                    if remainder == 0 {
                        // Consumed exactly: this item is fully processed
                        // and the marker advances past it. Snapshot the
                        // next item's full reserve while its context is
                        // still at hand.
                        payout = add_size(payout, item_fee)?;
                        bucket.total_size = sub_size(bucket.total_size, consumed)?;
                        bucket.total_fee_reserve =
                            sub_size(bucket.total_fee_reserve, item_fee)?;
                        bucket.entries[i].size = 0;
                        let next = i + 1;
                        let next_size = if next < len { bucket.entries[next].size } else { 0 };
                        let leftover = payload.reserved_fee(next_size)?;
                        book.stop = StopMarker {
                            level,
                            index: next as u32,
                            _padding: [0; 4],
                            leftover_fee: leftover,
                        };
                    } else {
                        // Partially consumed: shrink the stored size to
                        // the remainder and precompute its fee reserve so
                        // a later withdrawal never re-derives it from a
                        // since-destroyed context.
                        let leftover = payload.reserved_fee(remainder)?;
                        let consumed_fee = sub_size(item_fee, leftover)?;
                        payout = add_size(payout, consumed_fee)?;
                        bucket.total_size = sub_size(bucket.total_size, consumed)?;
                        bucket.total_fee_reserve =
                            sub_size(bucket.total_fee_reserve, consumed_fee)?;
                        bucket.entries[i].size = remainder;
                        book.stop = StopMarker {
                            level,
                            index: i as u32,
                            _padding: [0; 4],
                            leftover_fee: leftover,
                        };
                    }
                    msg!("stopped");
                    break 'levels;
                }

                // Below capacity the item must be consumed in full
                if consumed != entry.size {
                    return Err(CascadeError::ActionFailed);
                }
                let bucket = &mut book.buckets[slot];
                bucket.total_size = sub_size(bucket.total_size, consumed)?;
                bucket.total_fee_reserve = sub_size(bucket.total_fee_reserve, item_fee)?;
                bucket.entries[i].size = 0;
                payout = add_size(payout, item_fee)?;
            }
            // The prediction said this bucket meets capacity; live
            // entries failed to deliver it
            return Err(CascadeError::CorruptLedger);
        }

        // Whole-bucket fast path
        let len = book.buckets[slot].len as usize;
        for i in 0..len {
            let entry = book.buckets[slot].entries[i];
            if entry.size == 0 {
                continue;
            }
            let consumed = payload.perform_action(&entry.committer, entry.size, total)?;
            if consumed != entry.size {
                return Err(CascadeError::ActionFailed);
            }
            total = add_size(total, consumed)?;
        }
        payout = add_size(payout, book.buckets[slot].total_fee_reserve)?;
        book.buckets[slot].clear();
        log!("triggered: level {}", level);
    }

    if total != predicted {
        // The payload's reported consumption diverged from stored totals
        return Err(CascadeError::CorruptLedger);
    }
    book.bump_seqno();

    // All mutation is committed; only now does value leave
    if payout > 0 {
        payload.pay_caller(caller, payout)?;
    }
    Ok(payout)
}

#[cfg(all(test, not(target_os = "solana")))]
#[path = "trigger_test.rs"]
mod trigger_test;
