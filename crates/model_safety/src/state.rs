//! Pure state model for Kani verification

use arrayvec::ArrayVec;

/// Small fixed bounds for tractable verification
pub const MAX_BUCKETS: usize = 3;
pub const MAX_ENTRIES: usize = 6;
pub const MAX_REFS: usize = 6;

/// One pledge slot inside a bucket; `size == 0` is a tombstone
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub size: u128,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    pub level: u128,
    pub total_size: u128,
    pub total_fee: u128,
    pub entries: ArrayVec<Entry, MAX_ENTRIES>,
}

/// Commitment reference: `level == 0` is invalid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Ref {
    pub level: u128,
    pub index: usize,
}

/// Stop marker: `level == 0` means running
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Stop {
    pub level: u128,
    pub index: usize,
    pub leftover_fee: u128,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Params {
    /// Hard capacity (0 = unbounded engine)
    pub max_size: u128,
    /// Linear fee-reserve rate in basis points
    pub fee_bps: u128,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
    /// Aggregate size performed so far
    pub raised: u128,
    /// Funds custody balance
    pub treasury: u128,
    /// Lifetime sum of accepted payments
    pub deposited: u128,
    /// Value forwarded to the beneficiary
    pub forwarded: u128,
    /// Fee reserves paid to trigger callers
    pub fees_paid: u128,
    /// Funds returned through withdrawals
    pub refunded: u128,
    pub buckets: ArrayVec<Bucket, MAX_BUCKETS>,
    /// One committer's reference list; ids are positions
    pub refs: ArrayVec<Ref, MAX_REFS>,
    pub stop: Stop,
    pub params: Params,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_size: 0,
            fee_bps: 1_000,
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self {
            raised: 0,
            treasury: 0,
            deposited: 0,
            forwarded: 0,
            fees_paid: 0,
            refunded: 0,
            buckets: ArrayVec::new(),
            refs: ArrayVec::new(),
            stop: Stop::default(),
            params: Params::default(),
        }
    }
}

impl State {
    pub fn stopped(&self) -> bool {
        self.stop.level != 0
    }
}
