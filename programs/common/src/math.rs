//! Checked size and fee arithmetic
//!
//! Sizes and fee reserves are u64; funds custody is u128. Overflow on
//! accumulation is a hard failure (`Overflow`), never wrapped. Underflow
//! means the ledger subtracted more than it previously added, which is an
//! internal-consistency failure (`CorruptLedger`).

use crate::error::CascadeError;

/// Basis-points scale (10,000 bps = 100%)
pub const BPS_SCALE: u64 = 10_000;

#[inline]
pub fn add_size(a: u64, b: u64) -> Result<u64, CascadeError> {
    a.checked_add(b).ok_or(CascadeError::Overflow)
}

#[inline]
pub fn sub_size(a: u64, b: u64) -> Result<u64, CascadeError> {
    a.checked_sub(b).ok_or(CascadeError::CorruptLedger)
}

#[inline]
pub fn add_funds(a: u128, b: u128) -> Result<u128, CascadeError> {
    a.checked_add(b).ok_or(CascadeError::Overflow)
}

#[inline]
pub fn sub_funds(a: u128, b: u128) -> Result<u128, CascadeError> {
    a.checked_sub(b).ok_or(CascadeError::CorruptLedger)
}

/// Linear fee reserve: size * fee_bps / 10_000, computed in u128 so the
/// intermediate product cannot overflow.
pub fn fee_from_bps(size: u64, fee_bps: u16) -> Result<u64, CascadeError> {
    let wide = (size as u128)
        .checked_mul(fee_bps as u128)
        .ok_or(CascadeError::Overflow)?
        / BPS_SCALE as u128;
    u64::try_from(wide).map_err(|_| CascadeError::Overflow)
}
