//! Withdraw instruction - take back a still-pending commitment

use cascade_common::{sub_size, CascadeError, Payload};
use pinocchio::pubkey::Pubkey;
use pinocchio_log::log;

use crate::state::{Pledger, TriggerBook};

/// Withdraw the commitment behind `id`, refunding its size and fee
/// reserve. Serves stopped deployments too: withdrawal is the only
/// operation that survives a permanent stop.
///
/// The reference and the bucket entry are both zeroed before the refund
/// hook runs, so a second withdrawal of the same id fails with `BadId`
/// and can never pay out twice.
pub fn process_withdraw<P: Payload>(
    book: &mut TriggerBook,
    pledger: &mut Pledger,
    payload: &mut P,
    committer: &Pubkey,
    id: u32,
) -> Result<(), CascadeError> {
    let r = *pledger.get(id)?;
    if !book.is_valid_ref(&r) {
        return Err(CascadeError::BadId);
    }

    let was_stop_item =
        book.is_stopped() && book.stop.level == r.level && book.stop.index == r.index;
    let stop_leftover = book.stop.leftover_fee;

    let bucket = match book.bucket_mut(r.level) {
        Some(bucket) => bucket,
        // Bucket destroyed by a full trigger: the commitment was consumed
        None => return Err(CascadeError::BadId),
    };
    if r.index >= bucket.len {
        return Err(CascadeError::CorruptLedger);
    }
    let entry = bucket.entries[r.index as usize];
    if entry.size == 0 {
        return Err(CascadeError::BadId);
    }
    if entry.committer != *committer {
        return Err(CascadeError::CorruptLedger);
    }

    // The stop item's reserve was precomputed when processing froze; a
    // live reference anywhere else prices its reserve fresh. The stored
    // snapshot is best-effort, so clamp it to what the bucket still owes.
    let fee_reserve = if was_stop_item {
        core::cmp::min(stop_leftover, bucket.total_fee_reserve)
    } else {
        payload.reserved_fee(entry.size)?
    };

    bucket.total_size = sub_size(bucket.total_size, entry.size)?;
    bucket.total_fee_reserve = sub_size(bucket.total_fee_reserve, fee_reserve)?;
    bucket.entries[r.index as usize].size = 0;
    let new_total = bucket.total_size;

    if was_stop_item {
        book.stop.leftover_fee = 0;
    }
    pledger.clear(id);
    book.bump_seqno();

    // All bookkeeping is final before funds move
    payload.refund(committer, entry.size, fee_reserve)?;

    log!("bucket {} size now {}", r.level, new_total);
    Ok(())
}

#[cfg(all(test, not(target_os = "solana")))]
#[path = "withdraw_test.rs"]
mod withdraw_test;
