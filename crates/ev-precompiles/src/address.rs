//! Deterministic addresses of the system contracts.

use alloy_primitives::Address;
use std::collections::HashSet;

/// First byte of every system contract address.
pub const PRECOMPILE_ADDRESS_PREFIX: u8 = 0xCC;

/// Address nonce of the bech32 contract. Nonce 1 is left unused, keeping the deployed address.
pub const BECH32_ADDRESS_NONCE: u8 = 2;

/// Address of the bech32 contract, `0xcc02000000000000000000000000000000000002`.
pub const BECH32_PRECOMPILE_ADDRESS: Address = precompile_address(BECH32_ADDRESS_NONCE);

/// Builds the address for `nonce`: [`PRECOMPILE_ADDRESS_PREFIX`] at byte 0 and the nonce at
/// bytes 1 and 19.
///
/// # Panics
///
/// Panics when `nonce` is zero.
pub const fn precompile_address(nonce: u8) -> Address {
    assert!(nonce != 0, "contract address nonce cannot be zero");
    let mut bytes = [0u8; 20];
    bytes[0] = PRECOMPILE_ADDRESS_PREFIX;
    bytes[1] = nonce;
    bytes[19] = nonce;
    Address::new(bytes)
}

/// Hands out system contract addresses during start-up, refusing to hand out one twice.
#[derive(Debug, Default)]
pub struct AddressGenerator {
    generated: HashSet<Address>,
}

impl AddressGenerator {
    /// Empty generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates the address for `nonce`.
    ///
    /// # Panics
    ///
    /// Panics when `nonce` is zero or its address was already generated.
    pub fn generate(&mut self, nonce: u8) -> Address {
        let address = precompile_address(nonce);
        assert!(self.generated.insert(address), "generated address {address} already exists");
        address
    }
}
