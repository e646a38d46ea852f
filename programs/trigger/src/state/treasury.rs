//! Treasury - funds custody for the reference payload
//!
//! Holds the payments backing live commitments and performs the
//! bookkeeping side of the payload hooks: crediting accepted payments,
//! forwarding consumed value to the beneficiary, and debiting refunds
//! and trigger-fee payouts. The token/lamport movement mirroring these
//! balances happens at the outer boundary; this account is the single
//! source of truth the balances must reconcile against.

use cascade_common::{
    add_funds, add_size, fee_from_bps, sub_funds, CascadeError, Payload,
};
use pinocchio::pubkey::Pubkey;

/// Treasury account
/// PDA: ["treasury", book]
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Treasury {
    /// Magic bytes for validation
    pub magic: [u8; 8],
    /// Layout version
    pub version: u32,
    /// Linear fee-reserve rate in basis points
    pub fee_bps: u16,
    /// Bump seed
    pub bump: u8,
    /// Padding
    pub _padding: [u8; 1],
    /// Trigger book this treasury belongs to
    pub book: Pubkey,
    /// Aggregate size performed so far
    pub raised: u64,
    /// Padding for u128 alignment
    pub _padding2: [u8; 8],
    /// Funds currently in custody (live commitments + their reserves)
    pub balance: u128,
    /// Value forwarded to the beneficiary by performed actions
    pub forwarded: u128,
    /// Fee reserves paid out to trigger callers
    pub fees_paid: u128,
    /// Funds returned through withdrawals
    pub refunded: u128,
}

impl Treasury {
    pub const MAGIC: &'static [u8; 8] = b"CSCDTR1\0";
    pub const VERSION: u32 = 1;
    pub const LEN: usize = core::mem::size_of::<Self>();

    pub fn initialize_in_place(&mut self, book: Pubkey, fee_bps: u16, bump: u8) {
        unsafe {
            core::ptr::write_bytes(self as *mut Treasury, 0, 1);
        }
        self.magic = *Self::MAGIC;
        self.version = Self::VERSION;
        self.book = book;
        self.fee_bps = fee_bps;
        self.bump = bump;
    }

    pub fn validate(&self) -> bool {
        self.magic == *Self::MAGIC && self.version == Self::VERSION
    }
}

/// The treasury-backed payload the deployed program hands to the engine.
/// `max_size` is the book's capacity; the action hook clips consumption
/// to what remains below it.
pub struct TreasuryPayload<'a> {
    pub treasury: &'a mut Treasury,
    pub max_size: u64,
}

impl<'a> TreasuryPayload<'a> {
    pub fn new(treasury: &'a mut Treasury, max_size: u64) -> Self {
        Self { treasury, max_size }
    }
}

impl Payload for TreasuryPayload<'_> {
    fn current_size(&self) -> u64 {
        self.treasury.raised
    }

    fn reserved_fee(&self, size: u64) -> Result<u64, CascadeError> {
        fee_from_bps(size, self.treasury.fee_bps)
    }

    fn accept_payment(
        &mut self,
        _committer: &Pubkey,
        size: u64,
        fee_reserve: u64,
        payment: u128,
    ) -> Result<(), CascadeError> {
        let due = size as u128 + fee_reserve as u128;
        if payment != due {
            return Err(CascadeError::PaymentMismatch);
        }
        self.treasury.balance = add_funds(self.treasury.balance, due)?;
        Ok(())
    }

    fn perform_action(
        &mut self,
        _committer: &Pubkey,
        size: u64,
        total_before: u64,
    ) -> Result<u64, CascadeError> {
        let consumed = if self.max_size == 0 {
            size
        } else {
            core::cmp::min(size, self.max_size.saturating_sub(total_before))
        };
        self.treasury.raised = add_size(self.treasury.raised, consumed)?;
        self.treasury.balance = sub_funds(self.treasury.balance, consumed as u128)?;
        self.treasury.forwarded = add_funds(self.treasury.forwarded, consumed as u128)?;
        Ok(consumed)
    }

    fn refund(
        &mut self,
        _committer: &Pubkey,
        size: u64,
        fee_reserve: u64,
    ) -> Result<(), CascadeError> {
        let due = size as u128 + fee_reserve as u128;
        let balance = self
            .treasury
            .balance
            .checked_sub(due)
            .ok_or(CascadeError::PayoutFailed)?;
        self.treasury.balance = balance;
        self.treasury.refunded = add_funds(self.treasury.refunded, due)?;
        Ok(())
    }

    fn pay_caller(&mut self, _caller: &Pubkey, amount: u64) -> Result<(), CascadeError> {
        let balance = self
            .treasury
            .balance
            .checked_sub(amount as u128)
            .ok_or(CascadeError::PayoutFailed)?;
        self.treasury.balance = balance;
        self.treasury.fees_paid = add_funds(self.treasury.fees_paid, amount as u128)?;
        Ok(())
    }
}
