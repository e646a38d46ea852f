//! Per-user commitment reference book
//!
//! Commitment ids handed back by `commit` are positions in this list.
//! Slots are append-only; a withdrawn or processed reference is zeroed,
//! never reused, so ids stay meaningful for the account's lifetime.

use cascade_common::CascadeError;
use pinocchio::pubkey::Pubkey;

use super::book::TriggerBook;

/// Maximum commitments one user can have registered over the account's
/// lifetime
pub const MAX_PLEDGES: usize = 64;

/// Pointer into a bucket's entry list. `level == 0` marks an invalid
/// reference (never written, or zeroed on withdrawal).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PledgeRef {
    pub level: u64,
    pub index: u32,
    pub _padding: [u8; 4],
}

/// A still-pending commitment as reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPledge {
    pub id: u32,
    pub level: u64,
    pub size: u64,
}

/// User reference book
/// PDA: ["pledger", book, user]
#[repr(C)]
pub struct Pledger {
    /// Magic bytes for validation
    pub magic: [u8; 8],
    /// Layout version
    pub version: u32,
    /// References ever allocated
    pub count: u32,
    /// Owning user
    pub user: Pubkey,
    /// Trigger book this account belongs to
    pub book: Pubkey,
    /// Bump seed
    pub bump: u8,
    /// Padding
    pub _padding: [u8; 7],
    /// Reference slots, indexed by commitment id
    pub refs: [PledgeRef; MAX_PLEDGES],
}

impl Pledger {
    pub const MAGIC: &'static [u8; 8] = b"CSCDPL1\0";
    pub const VERSION: u32 = 1;
    pub const LEN: usize = core::mem::size_of::<Self>();

    pub fn initialize_in_place(&mut self, user: Pubkey, book: Pubkey, bump: u8) {
        unsafe {
            core::ptr::write_bytes(self as *mut Pledger, 0, 1);
        }
        self.magic = *Self::MAGIC;
        self.version = Self::VERSION;
        self.user = user;
        self.book = book;
        self.bump = bump;
    }

    pub fn validate(&self) -> bool {
        self.magic == *Self::MAGIC && self.version == Self::VERSION
    }

    pub fn check_capacity(&self) -> Result<(), CascadeError> {
        if self.count as usize >= MAX_PLEDGES {
            return Err(CascadeError::PledgeBookFull);
        }
        Ok(())
    }

    /// Record a new reference; the returned position is the commitment id
    pub fn push(&mut self, level: u64, index: u32) -> Result<u32, CascadeError> {
        let id = self.count;
        if id as usize >= MAX_PLEDGES {
            return Err(CascadeError::PledgeBookFull);
        }
        self.refs[id as usize] = PledgeRef {
            level,
            index,
            _padding: [0; 4],
        };
        self.count = id + 1;
        Ok(id)
    }

    /// Look up an allocated reference. Ids that were never handed out
    /// fail with `UnknownId`; zeroed references are the caller's problem
    /// to detect through the validity rule.
    pub fn get(&self, id: u32) -> Result<&PledgeRef, CascadeError> {
        if id >= self.count {
            return Err(CascadeError::UnknownId);
        }
        Ok(&self.refs[id as usize])
    }

    /// Zero a reference after withdrawal or processing
    pub fn clear(&mut self, id: u32) {
        if id < self.count {
            self.refs[id as usize] = PledgeRef {
                level: 0,
                index: 0,
                _padding: [0; 4],
            };
        }
    }

    /// The user's still-pending commitments, in original insertion order.
    /// Walks this user's history only, filtering every reference through
    /// the book's validity rule and live-entry resolution.
    pub fn pending<'a>(
        &'a self,
        book: &'a TriggerBook,
    ) -> impl Iterator<Item = PendingPledge> + 'a {
        self.refs[..self.count as usize]
            .iter()
            .enumerate()
            .filter_map(move |(id, r)| {
                book.live_entry(r).map(|entry| PendingPledge {
                    id: id as u32,
                    level: r.level,
                    size: entry.size,
                })
            })
    }
}
