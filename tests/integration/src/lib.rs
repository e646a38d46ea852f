//! Cascade integration tests
//!
//! End-to-end scenarios driven through the program's `process_*` handlers
//! in-process, with a recording mock payload standing in for the domain
//! action behind the hook interface. The mock records every hook
//! invocation so tests can assert the mutate-before-transfer ordering,
//! not just final balances.

use cascade_common::{CascadeError, Payload};
use cascade_trigger::state::{Pledger, Treasury, TriggerBook};
use pinocchio::pubkey::Pubkey;

/// One recorded hook invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    AcceptPayment { size: u64, fee: u64 },
    PerformAction { size: u64, total_before: u64, consumed: u64 },
    Refund { size: u64, fee: u64 },
    PayCaller { amount: u64 },
}

/// Recording payload with linear fees and optional capacity clipping
pub struct MockPayload {
    pub raised: u64,
    pub fee_bps: u16,
    /// Clip actions at this capacity (0 = consume fully)
    pub max_size: u64,
    pub balance: u128,
    pub deposited: u128,
    pub forwarded: u128,
    pub fees_paid: u128,
    pub refunded: u128,
    pub calls: Vec<Hook>,
    /// Fail `perform_action` for this exact size (hook-abort scenarios)
    pub fail_action_on_size: Option<u64>,
}

impl MockPayload {
    pub fn new(fee_bps: u16, max_size: u64) -> Self {
        Self {
            raised: 0,
            fee_bps,
            max_size,
            balance: 0,
            deposited: 0,
            forwarded: 0,
            fees_paid: 0,
            refunded: 0,
            calls: Vec::new(),
            fail_action_on_size: None,
        }
    }

    pub fn fee(&self, size: u64) -> u64 {
        (size as u128 * self.fee_bps as u128 / 10_000) as u64
    }

    /// Payment that exactly covers `size` plus its fee reserve
    pub fn payment_for(&self, size: u64) -> u128 {
        size as u128 + self.fee(size) as u128
    }

    /// Custody conservation: everything deposited is held, forwarded,
    /// paid out, or refunded
    pub fn conserved(&self) -> bool {
        self.deposited == self.balance + self.forwarded + self.fees_paid + self.refunded
    }
}

impl Payload for MockPayload {
    fn current_size(&self) -> u64 {
        self.raised
    }

    fn reserved_fee(&self, size: u64) -> Result<u64, CascadeError> {
        Ok(self.fee(size))
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
        self.balance += due;
        self.deposited += due;
        self.calls.push(Hook::AcceptPayment {
            size,
            fee: fee_reserve,
        });
        Ok(())
    }

    fn perform_action(
        &mut self,
        _committer: &Pubkey,
        size: u64,
        total_before: u64,
    ) -> Result<u64, CascadeError> {
        if self.fail_action_on_size == Some(size) {
            return Err(CascadeError::ActionFailed);
        }
        let consumed = if self.max_size == 0 {
            size
        } else {
            size.min(self.max_size.saturating_sub(total_before))
        };
        self.raised += consumed;
        self.balance -= consumed as u128;
        self.forwarded += consumed as u128;
        self.calls.push(Hook::PerformAction {
            size,
            total_before,
            consumed,
        });
        Ok(consumed)
    }

    fn refund(
        &mut self,
        _committer: &Pubkey,
        size: u64,
        fee_reserve: u64,
    ) -> Result<(), CascadeError> {
        let due = size as u128 + fee_reserve as u128;
        if due > self.balance {
            return Err(CascadeError::PayoutFailed);
        }
        self.balance -= due;
        self.refunded += due;
        self.calls.push(Hook::Refund {
            size,
            fee: fee_reserve,
        });
        Ok(())
    }

    fn pay_caller(&mut self, _caller: &Pubkey, amount: u64) -> Result<(), CascadeError> {
        if amount as u128 > self.balance {
            return Err(CascadeError::PayoutFailed);
        }
        self.balance -= amount as u128;
        self.fees_paid += amount as u128;
        self.calls.push(Hook::PayCaller { amount });
        Ok(())
    }
}

pub fn key(tag: u8) -> Pubkey {
    Pubkey::from([tag; 32])
}

pub fn new_book(max_size: u64) -> Box<TriggerBook> {
    let mut book: Box<TriggerBook> = unsafe { Box::new(std::mem::zeroed()) };
    book.initialize_in_place(key(0xA0), key(0xB0), max_size, 255);
    book
}

pub fn new_pledger(user: Pubkey) -> Box<Pledger> {
    let mut pledger: Box<Pledger> = unsafe { Box::new(std::mem::zeroed()) };
    pledger.initialize_in_place(user, key(0xA0), 254);
    pledger
}

pub fn new_treasury(fee_bps: u16) -> Treasury {
    let mut treasury: Treasury = unsafe { std::mem::zeroed() };
    treasury.initialize_in_place(key(0xA0), fee_bps, 253);
    treasury
}
