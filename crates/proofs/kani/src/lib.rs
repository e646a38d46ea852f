//! Kani safety proofs for the cascade ledger model

#![cfg_attr(kani, feature(register_tool), register_tool(kanitool))]

pub mod adversary;
pub mod generators;

#[cfg(kani)]
pub mod safety;
