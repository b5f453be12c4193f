//! Cross-crate scenarios for the ev-cosmos modules.
//!
//! Each scenario drives several crates together: the admission chain paying fees through the
//! conversion engine, the ICS-20 middleware converting received vouchers, and the bech32
//! system contract installed into a revm precompile map.

pub mod common;

#[cfg(test)]
mod admission;
#[cfg(test)]
mod ibc_conversion;
#[cfg(test)]
mod precompiles;

pub use common::*;
