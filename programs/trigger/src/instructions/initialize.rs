//! Initialize instructions - create the book, treasury, and pledger accounts

use cascade_common::{borrow_account_data_mut, CascadeError, BPS_SCALE};
use pinocchio::{account_info::AccountInfo, msg, pubkey::Pubkey};

use crate::pda::{derive_book_pda, derive_pledger_pda, derive_treasury_pda};
use crate::state::{Pledger, Treasury, TriggerBook};

/// Check the account is the expected PDA, sized for `expected_len`, and
/// not yet initialized (leading bytes still zero - the magic field of an
/// initialized account is never zero).
fn check_uninitialized(
    account: &AccountInfo,
    expected: &Pubkey,
    expected_len: usize,
) -> Result<(), CascadeError> {
    if account.key() != expected {
        return Err(CascadeError::InvalidAccount);
    }
    let data = account
        .try_borrow_data()
        .map_err(|_| CascadeError::InvalidAccount)?;
    if data.len() != expected_len {
        return Err(CascadeError::InvalidAccount);
    }
    if data[0] != 0 {
        msg!("Error: account already initialized");
        return Err(CascadeError::InvalidAccount);
    }
    Ok(())
}

/// Initialize a deployment: the trigger book plus its treasury.
///
/// `max_size == 0` deploys the unbounded engine; any other value deploys
/// the size-limited engine with that hard capacity.
pub fn process_initialize(
    program_id: &Pubkey,
    book_account: &AccountInfo,
    treasury_account: &AccountInfo,
    authority: &Pubkey,
    max_size: u64,
    fee_bps: u16,
) -> Result<(), CascadeError> {
    if fee_bps as u64 > BPS_SCALE {
        msg!("Error: fee rate above 100%");
        return Err(CascadeError::InvalidInstruction);
    }

    let (book_pda, book_bump) = derive_book_pda(program_id, authority);
    check_uninitialized(book_account, &book_pda, TriggerBook::LEN)?;

    let (treasury_pda, treasury_bump) = derive_treasury_pda(program_id, &book_pda);
    check_uninitialized(treasury_account, &treasury_pda, Treasury::LEN)?;

    // Initialize in place (avoids building either struct on the stack)
    let book = unsafe { borrow_account_data_mut::<TriggerBook>(book_account)? };
    book.initialize_in_place(*authority, treasury_pda, max_size, book_bump);

    let treasury = unsafe { borrow_account_data_mut::<Treasury>(treasury_account)? };
    treasury.initialize_in_place(book_pda, fee_bps, treasury_bump);

    msg!("book initialized");
    Ok(())
}

/// Initialize a user's reference book for an existing deployment
pub fn process_initialize_pledger(
    program_id: &Pubkey,
    pledger_account: &AccountInfo,
    book_account: &AccountInfo,
    user: &Pubkey,
) -> Result<(), CascadeError> {
    let (pledger_pda, bump) = derive_pledger_pda(program_id, book_account.key(), user);
    check_uninitialized(pledger_account, &pledger_pda, Pledger::LEN)?;

    let pledger = unsafe { borrow_account_data_mut::<Pledger>(pledger_account)? };
    pledger.initialize_in_place(*user, *book_account.key(), bump);

    msg!("pledger initialized");
    Ok(())
}

#[cfg(all(test, not(target_os = "solana")))]
#[path = "initialize_test.rs"]
mod initialize_test;
