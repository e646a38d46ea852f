//! Generators for arbitrary state (for Kani)

#[cfg(kani)]
use kani::any;
#[cfg(kani)]
use model_safety::state::*;

// Ultra-small bounds for fast verification
pub const MAX_STEPS: u8 = 4;

#[cfg(kani)]
pub fn any_params() -> Params {
    let max_raw: u8 = any();
    let fee_raw: u16 = any();
    Params {
        // 0 = unbounded engine, small caps otherwise
        max_size: (max_raw as u128) % 16,
        fee_bps: (fee_raw as u128) % 10_000,
    }
}

/// Levels deliberately include 0 so invalid input is exercised too
#[cfg(kani)]
pub fn any_level() -> u128 {
    (any::<u8>() as u128) % 8
}

#[cfg(kani)]
pub fn any_size() -> u128 {
    (any::<u8>() as u128) % 8
}

/// A reachable state: a bounded sequence of arbitrary operations applied
/// to the empty ledger. Every invariant holds by construction, so proofs
/// check preservation, not attainability.
#[cfg(kani)]
pub fn any_reachable_state() -> State {
    let mut s = State {
        params: any_params(),
        ..State::default()
    };
    let steps: u8 = any::<u8>() % MAX_STEPS;
    let mut i = 0u8;
    while i < steps {
        s = crate::adversary::adversary_step(s);
        i += 1;
    }
    s
}
