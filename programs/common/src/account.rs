//! Account validation and zero-copy borrow helpers

use pinocchio::{account_info::AccountInfo, pubkey::Pubkey};

use crate::error::CascadeError;

/// Verify the account is owned by this program
pub fn validate_owner(account: &AccountInfo, program_id: &Pubkey) -> Result<(), CascadeError> {
    if !account.is_owned_by(program_id) {
        return Err(CascadeError::InvalidAccount);
    }
    Ok(())
}

/// Verify the account is writable
pub fn validate_writable(account: &AccountInfo) -> Result<(), CascadeError> {
    if !account.is_writable() {
        return Err(CascadeError::InvalidAccount);
    }
    Ok(())
}

/// Verify the account signed the transaction
pub fn validate_signer(account: &AccountInfo) -> Result<(), CascadeError> {
    if !account.is_signer() {
        return Err(CascadeError::Unauthorized);
    }
    Ok(())
}

/// Borrow account data as a mutable reference to `T`.
///
/// # Safety
///
/// `T` must be `#[repr(C)]` plain-old-data whose layout matches the
/// account contents, and no other borrow of this account's data may be
/// live. The length check guards against short accounts; alignment is
/// guaranteed by the runtime's 8-byte account data alignment, so `T` must
/// not require more unless the caller knows the account provides it.
pub unsafe fn borrow_account_data_mut<T>(account: &AccountInfo) -> Result<&mut T, CascadeError> {
    let data = account.borrow_mut_data_unchecked();
    if data.len() < core::mem::size_of::<T>() {
        return Err(CascadeError::InvalidAccount);
    }
    Ok(&mut *(data.as_mut_ptr() as *mut T))
}

/// Borrow account data as a shared reference to `T`.
///
/// # Safety
///
/// Same layout requirements as [`borrow_account_data_mut`]; no mutable
/// borrow of this account's data may be live.
pub unsafe fn borrow_account_data<T>(account: &AccountInfo) -> Result<&T, CascadeError> {
    let data = account.borrow_data_unchecked();
    if data.len() < core::mem::size_of::<T>() {
        return Err(CascadeError::InvalidAccount);
    }
    Ok(&*(data.as_ptr() as *const T))
}
