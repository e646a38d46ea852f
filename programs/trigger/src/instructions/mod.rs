/// Trigger program instruction handlers

pub mod commit;
pub mod initialize;
pub mod trigger;
pub mod withdraw;

pub use commit::*;
pub use initialize::*;
pub use trigger::*;
pub use withdraw::*;

/// Instruction discriminator
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerInstruction {
    /// Initialize the trigger book and treasury
    Initialize = 0,
    /// Initialize a user's reference book
    InitializePledger = 1,
    /// Register a conditional commitment
    Commit = 2,
    /// Withdraw a still-pending commitment
    Withdraw = 3,
    /// Execute a batch of reached levels
    Trigger = 4,
}

// Note: Instruction dispatching is handled in entrypoint.rs
// The functions in this module are called from the entrypoint after
// account deserialization and validation.
