//! Trigger book - the commitment ledger
//!
//! One account per deployment. Commitments aggregate in per-level buckets
//! held in a fixed slot table; a bucket's entry list is append-only for
//! its whole lifetime, so stored indices stay stable. Dead entries are
//! zeroed in place, never compacted.
//!
//! Key invariants:
//! - `total_size` equals the sum of non-zero entry sizes in the bucket
//! - `total_fee_reserve` equals the fee reserves owed for those entries
//! - level 0 is the free-slot / does-not-exist sentinel and never holds
//!   a live commitment
//! - the stop marker, once set, never moves backward and is never unset

use cascade_common::{add_size, CascadeError};
use pinocchio::pubkey::Pubkey;

use super::pledger::PledgeRef;

/// Maximum number of live trigger-level buckets
pub const MAX_LEVELS: usize = 16;

/// Maximum entries ever appended to one bucket
pub const MAX_COMMITMENTS: usize = 32;

/// One party's pledge inside a bucket. `size == 0` marks a dead slot.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Commitment {
    pub committer: Pubkey,
    pub size: u64,
}

/// Aggregated commitments registered at one trigger level
#[repr(C)]
pub struct LevelBucket {
    /// Trigger level (0 = free slot)
    pub level: u64,
    /// Sum of live entry sizes
    pub total_size: u64,
    /// Sum of fee reserves owed for live entries
    pub total_fee_reserve: u64,
    /// Entries ever appended; never decreases while the bucket lives
    pub len: u32,
    /// Padding for alignment
    pub _padding: [u8; 4],
    /// Append-only entry slots
    pub entries: [Commitment; MAX_COMMITMENTS],
}

impl LevelBucket {
    /// Append a live entry, updating both running totals.
    pub fn append(
        &mut self,
        committer: Pubkey,
        size: u64,
        fee_reserve: u64,
    ) -> Result<u32, CascadeError> {
        let index = self.len;
        if index as usize >= MAX_COMMITMENTS {
            return Err(CascadeError::BucketFull);
        }
        self.entries[index as usize] = Commitment { committer, size };
        self.total_size = add_size(self.total_size, size)?;
        self.total_fee_reserve = add_size(self.total_fee_reserve, fee_reserve)?;
        self.len = index + 1;
        Ok(index)
    }

    /// Sum of live entry sizes (the value `total_size` must track)
    pub fn live_total(&self) -> u64 {
        self.entries[..self.len as usize]
            .iter()
            .map(|e| e.size)
            .sum()
    }

    /// Free the slot and erase all entries
    pub fn clear(&mut self) {
        unsafe {
            core::ptr::write_bytes(self as *mut LevelBucket, 0, 1);
        }
    }
}

/// Permanent record of where a size-limited deployment ran out of
/// capacity. While `level == 0` the engine is running; once set it stays
/// set and only withdrawals are served.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StopMarker {
    /// Level of the bucket that was being processed (0 = not stopped)
    pub level: u64,
    /// First entry index NOT fully processed
    pub index: u32,
    /// Padding for alignment
    pub _padding: [u8; 4],
    /// Fee reserve owed for the stop item's unconsumed remainder,
    /// precomputed at stop time
    pub leftover_fee: u64,
}

impl StopMarker {
    pub fn is_set(&self) -> bool {
        self.level != 0
    }
}

/// Main ledger account
/// PDA: ["book", authority]
#[repr(C)]
pub struct TriggerBook {
    /// Magic bytes for validation
    pub magic: [u8; 8],
    /// Layout version
    pub version: u32,
    /// Sequence number (incremented on any ledger change)
    pub seqno: u32,
    /// Deployment authority (set once at initialization)
    pub authority: Pubkey,
    /// Treasury account holding committed funds
    pub treasury: Pubkey,
    /// Hard capacity on the aggregate size (0 = unbounded engine)
    pub max_size: u64,
    /// Stop marker (size-limited engine only)
    pub stop: StopMarker,
    /// Bump seed
    pub bump: u8,
    /// Padding
    pub _padding: [u8; 7],
    /// Bucket slot table
    pub buckets: [LevelBucket; MAX_LEVELS],
}

impl TriggerBook {
    pub const MAGIC: &'static [u8; 8] = b"CSCDBK1\0";
    pub const VERSION: u32 = 1;
    pub const LEN: usize = core::mem::size_of::<Self>();

    /// Initialize in place without building the full struct on the stack
    pub fn initialize_in_place(
        &mut self,
        authority: Pubkey,
        treasury: Pubkey,
        max_size: u64,
        bump: u8,
    ) {
        unsafe {
            core::ptr::write_bytes(self as *mut TriggerBook, 0, 1);
        }
        self.magic = *Self::MAGIC;
        self.version = Self::VERSION;
        self.authority = authority;
        self.treasury = treasury;
        self.max_size = max_size;
        self.bump = bump;
    }

    pub fn validate(&self) -> bool {
        self.magic == *Self::MAGIC && self.version == Self::VERSION
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_set()
    }

    pub fn bump_seqno(&mut self) {
        self.seqno = self.seqno.wrapping_add(1);
    }

    /// Slot index of the bucket at `level`, if one exists
    pub fn bucket_slot(&self, level: u64) -> Option<usize> {
        if level == 0 {
            return None;
        }
        self.buckets.iter().position(|b| b.level == level)
    }

    pub fn bucket(&self, level: u64) -> Option<&LevelBucket> {
        self.bucket_slot(level).map(|i| &self.buckets[i])
    }

    pub fn bucket_mut(&mut self, level: u64) -> Option<&mut LevelBucket> {
        self.bucket_slot(level).map(move |i| &mut self.buckets[i])
    }

    /// Verify the ledger can take one more entry at `level` before any
    /// payment changes hands.
    pub fn check_insert_capacity(&self, level: u64) -> Result<(), CascadeError> {
        match self.bucket(level) {
            Some(bucket) => {
                if bucket.len as usize >= MAX_COMMITMENTS {
                    return Err(CascadeError::BucketFull);
                }
            }
            None => {
                if !self.buckets.iter().any(|b| b.level == 0) {
                    return Err(CascadeError::BucketTableFull);
                }
            }
        }
        Ok(())
    }

    /// Insert a live entry at `level`, opening the bucket if needed.
    /// Returns the entry index and the bucket's new total size.
    pub fn insert(
        &mut self,
        level: u64,
        committer: Pubkey,
        size: u64,
        fee_reserve: u64,
    ) -> Result<(u32, u64), CascadeError> {
        let slot = match self.bucket_slot(level) {
            Some(slot) => slot,
            None => {
                let slot = self
                    .buckets
                    .iter()
                    .position(|b| b.level == 0)
                    .ok_or(CascadeError::BucketTableFull)?;
                self.buckets[slot].level = level;
                slot
            }
        };
        let bucket = &mut self.buckets[slot];
        let index = bucket.append(committer, size, fee_reserve)?;
        Ok((index, bucket.total_size))
    }

    /// Destroy a fully-triggered bucket, freeing its slot
    pub fn release_bucket(&mut self, level: u64) {
        if let Some(slot) = self.bucket_slot(level) {
            self.buckets[slot].clear();
        }
    }

    /// Validity rule: a reference still denotes an unprocessed commitment
    /// iff its level is non-zero and its position has not been passed by
    /// the stop marker at the same level.
    pub fn is_valid_ref(&self, r: &PledgeRef) -> bool {
        if r.level == 0 {
            return false;
        }
        if self.stop.is_set() && self.stop.level == r.level && r.index < self.stop.index {
            return false;
        }
        true
    }

    /// Resolve a reference to its live entry. Returns `None` for invalid
    /// references, buckets destroyed by a full trigger, and zeroed
    /// (withdrawn) entries.
    pub fn live_entry(&self, r: &PledgeRef) -> Option<&Commitment> {
        if !self.is_valid_ref(r) {
            return None;
        }
        let bucket = self.bucket(r.level)?;
        if r.index >= bucket.len {
            return None;
        }
        let entry = &bucket.entries[r.index as usize];
        if entry.size == 0 {
            return None;
        }
        Some(entry)
    }
}
