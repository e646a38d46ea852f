//! Cascade trigger program - threshold-activated commitment ledger
//!
//! Parties register conditional commitments ("contribute size S once the
//! aggregate reaches level L"). Commitments accumulate in per-level
//! buckets; anyone may submit a batch of reached levels and collect the
//! fee reserves set aside by the committers. A deployment with a hard
//! capacity executes the overflowing bucket item-by-item and then stops
//! permanently, leaving the unprocessed remainder withdrawable.

#![cfg_attr(target_os = "solana", no_std)]

pub mod entrypoint;
pub mod instructions;
pub mod pda;
pub mod state;

// Panic handler for no_std builds (only for Solana BPF)
#[cfg(all(target_os = "solana", not(test)))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

pub use instructions::*;
pub use state::*;

/// Program ID (will be set during deployment)
pub const ID: &str = "CSCD11111111111111111111111111111111111111";
