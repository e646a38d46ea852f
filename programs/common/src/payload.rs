//! Payload capability interface
//!
//! The trigger engine is generic over the behavior a commitment actually
//! performs (minting a batch, forwarding funds to a beneficiary,
//! transferring a token). The engine depends only on this trait, never on
//! a concrete payload, and calls every funds-moving hook strictly after
//! its own bookkeeping for that operation is final.

use pinocchio::pubkey::Pubkey;

use crate::error::CascadeError;

pub trait Payload {
    /// Aggregate size performed so far. Trigger totals start from here.
    fn current_size(&self) -> u64;

    /// Fee reserve required for `size`. Deterministic and pure in `size`;
    /// the engine calls it both when queuing and when refunding.
    fn reserved_fee(&self, size: u64) -> Result<u64, CascadeError>;

    /// Validate and take custody of the payment attached to a new
    /// commitment. `payment` must cover `size` plus `fee_reserve`.
    fn accept_payment(
        &mut self,
        committer: &Pubkey,
        size: u64,
        fee_reserve: u64,
        payment: u128,
    ) -> Result<(), CascadeError>;

    /// Carry out one committed action and report how much of `size` was
    /// actually consumed. A size-limited payload may clip the reported
    /// consumption to exactly fill remaining capacity; reporting more
    /// than `size` is a contract violation the engine rejects.
    fn perform_action(
        &mut self,
        committer: &Pubkey,
        size: u64,
        total_before: u64,
    ) -> Result<u64, CascadeError>;

    /// Return a withdrawn or stopped commitment's size and fee reserve to
    /// its committer. For the item frozen mid-processing the engine
    /// passes the precomputed leftover reserve instead of a freshly
    /// derived one.
    fn refund(&mut self, committer: &Pubkey, size: u64, fee_reserve: u64)
        -> Result<(), CascadeError>;

    /// Disburse the accumulated fee-reserve payout of a trigger call to
    /// the caller. Invoked once per call, after all ledger mutation.
    fn pay_caller(&mut self, caller: &Pubkey, amount: u64) -> Result<(), CascadeError>;
}
