//! Commit instruction - register a conditional commitment

use cascade_common::{CascadeError, Payload};
use pinocchio::pubkey::Pubkey;
use pinocchio_log::log;

use crate::state::{Pledger, TriggerBook};

/// Process a new commitment of `size` at `level`, backed by `payment`.
///
/// Validation runs strictly before the payment hook: a caller whose input
/// is rejected never has funds taken, and a caller whose payment is
/// rejected leaves no trace in the ledger. Returns the commitment id
/// (the position in the user's reference book).
pub fn process_commit<P: Payload>(
    book: &mut TriggerBook,
    pledger: &mut Pledger,
    payload: &mut P,
    committer: &Pubkey,
    level: u64,
    size: u64,
    payment: u128,
) -> Result<u32, CascadeError> {
    if book.is_stopped() {
        return Err(CascadeError::Stopped);
    }
    if size == 0 {
        return Err(CascadeError::BadSize);
    }

    let current = payload.current_size();
    if level <= current {
        // A level at or below the present aggregate is already unreachable
        return Err(CascadeError::AlreadyTriggered);
    }

    if book.max_size != 0 {
        if level > book.max_size {
            return Err(CascadeError::TriggerExceedsMax);
        }
        let remaining = book.max_size.saturating_sub(current);
        if size > remaining {
            log!("commit rejected: size {} exceeds remaining {}", size, remaining);
            return Err(CascadeError::SizeExceedsMax {
                requested: size,
                remaining,
            });
        }
    }

    // Reserve ledger room before taking custody of anything
    book.check_insert_capacity(level)?;
    pledger.check_capacity()?;

    let fee_reserve = payload.reserved_fee(size)?;
    payload.accept_payment(committer, size, fee_reserve, payment)?;

    let (index, new_total) = book.insert(level, *committer, size, fee_reserve)?;
    let id = pledger.push(level, index)?;
    book.bump_seqno();

    log!("bucket {} size now {}", level, new_total);
    Ok(id)
}

#[cfg(all(test, not(target_os = "solana")))]
#[path = "commit_test.rs"]
mod commit_test;
